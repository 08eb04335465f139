use super::{build_output, run_rules, severity_weighted_score, Analyzer};
use crate::config::ConfigStore;
use crate::models::{AnalyzerOutput, AnalyzerSummary, MonitorError, Recommendation, Severity};
use crate::rules::{self, HARDCODED_DOMAIN};
use glob::Pattern;
use log::info;
use std::path::Path;

const EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "py"];

/// Finds strings that should be configurable (URLs, endpoints, socket event
/// names, SQL, magic numbers) plus leftover diagnostic statements.
pub struct HardcodedStringsAnalyzer;

impl Analyzer for HardcodedStringsAnalyzer {
    fn id(&self) -> &str {
        HARDCODED_DOMAIN
    }

    fn description(&self) -> &str {
        "Detects hardcoded strings, magic numbers and leftover diagnostic statements"
    }

    fn scan(
        &self,
        root: &Path,
        excludes: &[Pattern],
        config: &ConfigStore,
    ) -> Result<AnalyzerOutput, MonitorError> {
        let toggles = config.rules();
        let (findings, summary) = run_rules(
            HARDCODED_DOMAIN,
            root,
            excludes,
            &toggles,
            rules::catalog(HARDCODED_DOMAIN),
            EXTENSIONS,
        );
        info!(
            "hardcoded scan: {} findings over {} files",
            findings.len(),
            summary.files_scanned
        );
        let score = severity_weighted_score(&summary.findings_by_severity);
        let recommendations = recommendations(&summary, config);
        Ok(build_output(
            HARDCODED_DOMAIN,
            findings,
            summary,
            Some(score),
            recommendations,
        ))
    }
}

fn recommendations(summary: &AnalyzerSummary, config: &ConfigStore) -> Vec<Recommendation> {
    let count = |category: &str| summary.findings_by_category.get(category).copied().unwrap_or(0);
    let mut recs = Vec::new();

    let console = count("console");
    if console > 0 {
        recs.push(Recommendation {
            source: HARDCODED_DOMAIN.into(),
            category: "console".into(),
            priority: Severity::Medium,
            issue: format!("Found {console} diagnostic console statements"),
            action: "Strip console.log/debug/info output and route messages through the logger"
                .into(),
            auto_fixable: true,
        });
    }

    let events = count("events");
    if events > 0 {
        recs.push(Recommendation {
            source: HARDCODED_DOMAIN.into(),
            category: "imports".into(),
            priority: Severity::High,
            issue: format!("Found {events} hardcoded socket event names"),
            action: "Extract socket events to shared constants to prevent typo bugs".into(),
            auto_fixable: true,
        });
    }

    let user_messages = count("i18n");
    if user_messages > 0 {
        recs.push(Recommendation {
            source: HARDCODED_DOMAIN.into(),
            category: "i18n".into(),
            priority: Severity::Medium,
            issue: format!("Found {user_messages} hardcoded user-facing messages"),
            action: "Move user-facing text into an internationalization catalog".into(),
            auto_fixable: false,
        });
    }

    let severe = summary.findings_by_severity.critical + summary.findings_by_severity.high;
    if severe > 0 {
        recs.push(Recommendation {
            source: HARDCODED_DOMAIN.into(),
            category: "hardcoded".into(),
            priority: Severity::High,
            issue: format!("Found {severe} high-severity hardcoded strings"),
            action: "Move user-facing messages, socket events and SQL into configuration".into(),
            auto_fixable: false,
        });
    }

    let medium_limit = config
        .threshold("recommendations", "max_medium_findings")
        .and_then(|v| v.as_u64())
        .unwrap_or(10) as usize;
    if summary.findings_by_severity.medium > medium_limit {
        recs.push(Recommendation {
            source: HARDCODED_DOMAIN.into(),
            category: "maintainability".into(),
            priority: Severity::Medium,
            issue: format!(
                "Found {} medium-severity hardcoded strings",
                summary.findings_by_severity.medium
            ),
            action: "Extract URLs, file paths and magic numbers to named constants".into(),
            auto_fixable: false,
        });
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn console_statement_yields_auto_fixable_recommendation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.js"),
            "console.log(\"player joined lobby\");\n",
        )
        .unwrap();
        let config = ConfigStore::open(&dir.path().join(".codesweep/config"));

        let output = HardcodedStringsAnalyzer
            .scan(dir.path(), &[], &config)
            .unwrap();

        assert_eq!(output.findings.len(), 1);
        assert_eq!(output.findings[0].severity, Severity::Medium);
        assert_eq!(output.findings[0].category, "console");
        assert!(output.findings[0].fixable);

        let fixable: Vec<_> = output
            .recommendations
            .iter()
            .filter(|r| r.auto_fixable)
            .collect();
        assert_eq!(fixable.len(), 1);
        assert_eq!(fixable[0].category, "console");
        assert_eq!(output.score, Some(97.0));
    }

    #[test]
    fn socket_events_recommend_shared_constants() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("socket.ts"),
            "socket.emit(\"game-started\");\nsocket.on(\"question-answered\", cb);\n",
        )
        .unwrap();
        let config = ConfigStore::open(&dir.path().join(".codesweep/config"));

        let output = HardcodedStringsAnalyzer
            .scan(dir.path(), &[], &config)
            .unwrap();

        assert_eq!(output.summary.findings_by_category.get("events"), Some(&2));
        let events_rec = output
            .recommendations
            .iter()
            .find(|r| r.category == "imports")
            .expect("socket event recommendation");
        assert!(events_rec.issue.contains("hardcoded socket event"));
        assert!(events_rec.auto_fixable);
    }
}
