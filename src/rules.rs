use crate::models::Severity;
use lazy_static::lazy_static;
use regex::Regex;

pub const HARDCODED_DOMAIN: &str = "hardcoded";
pub const ARCHITECTURE_DOMAIN: &str = "architecture";
pub const PERFORMANCE_DOMAIN: &str = "performance";

/// A single detection rule: a textual pattern plus its classification.
///
/// The full catalog is fixed before any scan starts; enablement, severity and
/// auto-fix flags can be overridden per rule through the rules configuration
/// document without code changes.
pub struct Rule {
    /// Unique within its domain
    pub id: &'static str,

    pub pattern: Regex,
    pub severity: Severity,
    pub category: &'static str,
    pub description: &'static str,
    pub auto_fixable: bool,

    /// Lowercase substrings that mark a match as acceptable noise
    pub allow: &'static [&'static str],

    /// Suppress matches sitting on import/require lines
    pub skip_import_lines: bool,

    /// Suppress matches in files that also match this pattern
    /// (e.g. `setInterval` is fine when `clearInterval` appears too)
    pub counter_pattern: Option<Regex>,
}

fn rule(
    id: &'static str,
    pattern: &str,
    severity: Severity,
    category: &'static str,
    description: &'static str,
) -> Rule {
    Rule {
        id,
        pattern: Regex::new(pattern).expect("rule pattern must compile"),
        severity,
        category,
        description,
        auto_fixable: false,
        allow: &[],
        skip_import_lines: false,
        counter_pattern: None,
    }
}

fn counter(pattern: &str) -> Option<Regex> {
    Some(Regex::new(pattern).expect("counter pattern must compile"))
}

lazy_static! {
    /// Hardcoded-string and diagnostic-statement rules.
    pub static ref HARDCODED_RULES: Vec<Rule> = vec![
        Rule {
            allow: &["localhost", "127.0.0.1", "example.com", "test.com"],
            ..rule(
                "hardcoded-url",
                r#"["']https?://[^\s"']+["']"#,
                Severity::Medium,
                "urls",
                "Hardcoded URL should come from configuration",
            )
        },
        Rule {
            allow: &["/api", "/health", "/ping"],
            skip_import_lines: true,
            ..rule(
                "hardcoded-endpoint",
                r#"["']/[a-zA-Z0-9][a-zA-Z0-9/_-]*["']"#,
                Severity::Medium,
                "endpoints",
                "Hardcoded API endpoint should come from a route table",
            )
        },
        rule(
            "hardcoded-error-message",
            r#"(?:throw new Error|console\.error|logger\.error)\s*\(\s*["'][^"']{20,}["']"#,
            Severity::Low,
            "messages",
            "Hardcoded error message should live in a message catalog",
        ),
        rule(
            "hardcoded-user-message",
            r#"(?:alert|confirm|prompt)\s*\(\s*["'][^"']{10,}["']"#,
            Severity::High,
            "i18n",
            "Hardcoded user-facing message blocks internationalization",
        ),
        Rule {
            auto_fixable: true,
            allow: &["connection", "disconnect", "error"],
            ..rule(
                "hardcoded-socket-event",
                r#"\.(?:emit|on|once)\s*\(\s*["'][a-zA-Z_][a-zA-Z0-9_-]*["']"#,
                Severity::High,
                "events",
                "Hardcoded socket event name invites typo bugs",
            )
        },
        rule(
            "inline-sql",
            r#"["'](?:SELECT|INSERT|UPDATE|DELETE|CREATE|DROP|ALTER)\s+[^"']+["']"#,
            Severity::High,
            "sql",
            "Inline SQL query should go through the data layer",
        ),
        Rule {
            skip_import_lines: true,
            ..rule(
                "hardcoded-file-path",
                r#"["']\.{1,2}/[^"']+["']"#,
                Severity::Medium,
                "paths",
                "Hardcoded file path should come from configuration",
            )
        },
        Rule {
            auto_fixable: true,
            ..rule(
                "magic-number",
                r"(?i)\b(?:timeout|delay|limit|max|min|size|length|width|height)\s*[:=]\s*\d{3,}",
                Severity::Medium,
                "magic-numbers",
                "Magic number should be a named, configurable constant",
            )
        },
        Rule {
            auto_fixable: true,
            ..rule(
                "console-statement",
                r"console\.(?:log|debug|info)\s*\(",
                Severity::Medium,
                "console",
                "Diagnostic console statement left in source",
            )
        },
    ];
}

lazy_static! {
    /// Architecture-violation rules.
    pub static ref ARCHITECTURE_RULES: Vec<Rule> = vec![
        Rule {
            auto_fixable: true,
            ..rule(
                "deep-relative-import",
                r#"(?:from\s+|require\(\s*)["'](?:\.\./){2,}[^"']*["']"#,
                Severity::Medium,
                "imports",
                "Deep relative import chain should use the @/ alias",
            )
        },
        rule(
            "frontend-imports-backend",
            r#"(?:from\s+|require\(\s*)["'][^"']*\.\./backend/[^"']*["']"#,
            Severity::High,
            "architecture",
            "Frontend code must not import backend modules directly",
        ),
        rule(
            "backend-imports-frontend",
            r#"(?:from\s+|require\(\s*)["'][^"']*\.\./frontend/[^"']*["']"#,
            Severity::High,
            "architecture",
            "Backend code must not import frontend modules directly",
        ),
        rule(
            "shared-types-relative-import",
            r#"(?:from\s+|require\(\s*)["'][^"']*\.\./shared/types[^"']*["']"#,
            Severity::Low,
            "architecture",
            "Shared type imports should use the @shared/types alias",
        ),
    ];
}

lazy_static! {
    /// Performance anti-pattern rules.
    pub static ref PERFORMANCE_RULES: Vec<Rule> = vec![
        rule(
            "inline-jsx-handler",
            r"(?:onClick|onChange|onSubmit|onKeyDown|onKeyUp|onFocus|onBlur)\s*=\s*\{[^}]*=>",
            Severity::Medium,
            "react",
            "Inline closure in JSX prop forces child re-renders",
        ),
        rule(
            "fresh-state-initializer",
            r"useState\s*\(\s*(?:\{\s*\}|\[\s*\]|new\s+Date\(\))",
            Severity::Medium,
            "react",
            "Fresh object/array/date in useState causes re-renders",
        ),
        rule(
            "n-plus-one-query",
            r"for\s*\([^)]*\)\s*\{[^}]*(?:findUnique|findFirst|findMany)",
            Severity::Critical,
            "database",
            "Query inside a loop is a potential N+1 pattern",
        ),
        rule(
            "unbounded-query",
            r"\.findMany\(\)",
            Severity::Medium,
            "database",
            "Unbounded query is missing pagination",
        ),
        rule(
            "triple-nested-loop",
            r"for\s*\([^)]*\)\s*\{[^}]*for\s*\([^)]*\)\s*\{[^}]*for\s*\(",
            Severity::High,
            "algorithms",
            "Triple nested loop has O(n^3) complexity",
        ),
        rule(
            "chained-linear-search",
            r"\.(?:find|filter)\s*\([^)]*\)\s*\.find\s*\(",
            Severity::Medium,
            "algorithms",
            "Chained linear searches re-walk the same collection",
        ),
        Rule {
            skip_import_lines: true,
            ..rule(
                "sync-fs-call",
                r"fs\.(?:readFileSync|writeFileSync|appendFileSync|readdirSync)\s*\(",
                Severity::High,
                "async",
                "Synchronous file operation blocks the event loop",
            )
        },
        rule(
            "promise-timer-wrap",
            r"new\s+Promise\s*\([^)]*=>\s*\{[^}]*set(?:Timeout|Interval)",
            Severity::Medium,
            "async",
            "Manual Promise wrapping around timers; prefer async helpers",
        ),
        Rule {
            counter_pattern: counter(r"clearInterval"),
            ..rule(
                "interval-without-clear",
                r"setInterval\s*\(",
                Severity::High,
                "memory",
                "setInterval without clearInterval leaks the timer",
            )
        },
        Rule {
            counter_pattern: counter(r"removeEventListener"),
            ..rule(
                "listener-without-cleanup",
                r"addEventListener\s*\(",
                Severity::Medium,
                "memory",
                "Event listener registered without cleanup",
            )
        },
    ];
}

/// All analyzer domains, in registry order.
pub fn domains() -> [&'static str; 3] {
    [HARDCODED_DOMAIN, ARCHITECTURE_DOMAIN, PERFORMANCE_DOMAIN]
}

/// Catalog lookup by analyzer domain.
pub fn catalog(domain: &str) -> &'static [Rule] {
    match domain {
        HARDCODED_DOMAIN => &HARDCODED_RULES,
        ARCHITECTURE_DOMAIN => &ARCHITECTURE_RULES,
        PERFORMANCE_DOMAIN => &PERFORMANCE_RULES,
        _ => &[],
    }
}
