use crate::analyzers::IGNORED_DIRS;
use crate::config::AutoFixConfig;
use crate::models::{BackupRecord, FixResult, MonitorError, Recommendation};
use chrono::Local;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the backup directory kept at the project root.
pub const BACKUP_DIR: &str = ".codesweep-backups";

/// Source extensions eligible for text-level fixes.
const FIXABLE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs"];

/// Socket event literals with a shared-constant equivalent. Quoted literals
/// are rewritten to `EVENTS.<UPPER_SNAKE>` references.
const KNOWN_EVENTS: &[&str] = &[
    "user-joined",
    "user-left",
    "game-started",
    "game-ended",
    "round-started",
    "round-ended",
];

/// Manifest dependencies that belong under devDependencies.
const DEV_ONLY_PREFIXES: &[&str] = &["eslint", "typescript", "jest", "prettier", "@types/"];

lazy_static! {
    static ref CONSOLE_LINE: Regex =
        Regex::new(r#"(?m)^[ \t]*console\.(?:log|debug|info)\s*\([^)\n]*\)\s*;?[ \t]*\n?"#)
            .expect("fix pattern must compile");
    static ref DEEP_IMPORT: Regex =
        Regex::new(r#"from\s+["'](?:\.\./){2,}([^"']*)["']"#).expect("fix pattern must compile");
    static ref EMPTY_IMPORT: Regex =
        Regex::new(r#"(?m)^[ \t]*import\s*\{\s*\}\s*from\s*["'][^"']+["'];?[ \t]*\n?"#)
            .expect("fix pattern must compile");
    static ref BARE_IMPORT_LINE: Regex =
        Regex::new(r#"^\s*import\s+[\w$]+\s+from\s+["'][^"']+["'];?\s*$"#)
            .expect("fix pattern must compile");
    static ref TRAILING_WS: Regex = Regex::new(r"(?m)[ \t]+$").expect("fix pattern must compile");
    static ref EXTRA_BLANKS: Regex = Regex::new(r"\n{3,}").expect("fix pattern must compile");
    static ref SPACE_BEFORE_SEMI: Regex =
        Regex::new(r"[ \t]+;").expect("fix pattern must compile");
}

/// The closed set of remediations the fixer knows how to perform. Every
/// strategy is a pure text (or JSON) transform over candidate files; anything
/// a recommendation asks for outside this set is reported as unfixable
/// rather than improvised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStrategy {
    /// Rewrite deep relative import chains to the `@/` alias and known
    /// socket event literals to shared constants
    NormalizeImports,

    /// Remove console.log/debug/info statements
    StripDiagnostics,

    /// Drop empty and duplicate import lines
    RemoveDeadImports,

    /// Whitespace and semicolon hygiene
    NormalizeFormatting,

    /// Move tooling packages from dependencies to devDependencies
    ReorganizeManifest,
}

impl FixStrategy {
    /// Picks the strategy for a recommendation, if any. Matching is on the
    /// recommendation's category with the issue/action text as a tiebreaker.
    pub fn select(category: &str, issue: &str, action: &str) -> Option<FixStrategy> {
        let issue = issue.to_lowercase();
        let action = action.to_lowercase();
        match category {
            "console" => Some(FixStrategy::StripDiagnostics),
            "imports" if issue.contains("import") || issue.contains("hardcoded") => {
                Some(FixStrategy::NormalizeImports)
            }
            "unused" if issue.contains("unused") => Some(FixStrategy::RemoveDeadImports),
            "dependencies" => Some(FixStrategy::ReorganizeManifest),
            "formatting" => Some(FixStrategy::NormalizeFormatting),
            _ if action.contains("format") => Some(FixStrategy::NormalizeFormatting),
            _ => None,
        }
    }

    /// Safe strategies only delete or normalize; they cannot change what the
    /// code resolves to.
    pub fn is_safe(self) -> bool {
        matches!(
            self,
            FixStrategy::StripDiagnostics
                | FixStrategy::RemoveDeadImports
                | FixStrategy::NormalizeFormatting
        )
    }
}

/// Applies remediation strategies to a project tree, taking a backup of
/// every file before it is rewritten.
pub struct AutoFixer {
    project_root: PathBuf,
    backup_root: PathBuf,
    settings: AutoFixConfig,
}

impl AutoFixer {
    pub fn new(project_root: PathBuf) -> Self {
        Self::configured(project_root, AutoFixConfig::default())
    }

    pub fn configured(project_root: PathBuf, settings: AutoFixConfig) -> Self {
        let backup_root = project_root.join(BACKUP_DIR);
        Self {
            project_root,
            backup_root,
            settings,
        }
    }

    /// Applies the strategy selected for one recommendation. Never touches
    /// the filesystem when no strategy matches, and never rewrites a file
    /// before its backup is on disk.
    pub fn apply(&self, recommendation: &Recommendation) -> FixResult {
        let strategy =
            match FixStrategy::select(&recommendation.category, &recommendation.issue, &recommendation.action) {
                Some(strategy) => strategy,
                None => {
                    debug!("no fix strategy for {:?}", recommendation.issue);
                    return self.unapplied(recommendation, "no fix strategy for this recommendation");
                }
            };
        if self.settings.safe_fixes_only && !strategy.is_safe() {
            return self.unapplied(recommendation, "skipped: unsafe fixes disabled by configuration");
        }

        let mut files_modified = Vec::new();
        let mut backup_created = false;
        let mut error = None;
        for file in self.candidate_files(strategy) {
            if files_modified.len() >= self.settings.max_files_per_fix {
                warn!(
                    "fix stopped at the {}-file limit",
                    self.settings.max_files_per_fix
                );
                break;
            }
            match self.fix_file(&file, strategy) {
                Ok(true) => {
                    backup_created = self.settings.create_backups || backup_created;
                    files_modified.push(
                        file.strip_prefix(&self.project_root)
                            .unwrap_or(&file)
                            .to_path_buf(),
                    );
                }
                Ok(false) => {}
                Err(err) => {
                    warn!("could not fix {}: {err}", file.display());
                    error = Some(err.to_string());
                }
            }
        }

        let success = !files_modified.is_empty();
        if !success && error.is_none() {
            error = Some("no matching issues found".into());
        }
        FixResult {
            recommendation: recommendation.clone(),
            success,
            files_modified,
            backup_created,
            error,
        }
    }

    /// Copies a backup over its original. Returns whether the copy happened.
    pub fn restore(&self, backup: &Path, original: &Path) -> bool {
        match fs::copy(backup, original) {
            Ok(_) => {
                info!("restored {} from {}", original.display(), backup.display());
                true
            }
            Err(err) => {
                warn!("restore of {} failed: {err}", original.display());
                false
            }
        }
    }

    /// All backups under the backup root, newest first.
    pub fn list_backups(&self) -> Vec<BackupRecord> {
        let mut records = Vec::new();
        for entry in WalkDir::new(&self.backup_root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if let Some(record) = parse_backup_name(entry.path()) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    fn unapplied(&self, recommendation: &Recommendation, reason: &str) -> FixResult {
        FixResult {
            recommendation: recommendation.clone(),
            success: false,
            files_modified: Vec::new(),
            backup_created: false,
            error: Some(reason.into()),
        }
    }

    fn candidate_files(&self, strategy: FixStrategy) -> Vec<PathBuf> {
        if strategy == FixStrategy::ReorganizeManifest {
            let manifest = self.project_root.join("package.json");
            return if manifest.is_file() {
                vec![manifest]
            } else {
                Vec::new()
            };
        }
        let mut files: Vec<PathBuf> = WalkDir::new(&self.project_root)
            .into_iter()
            .filter_entry(|e| {
                !(e.depth() > 0
                    && e.file_type().is_dir()
                    && IGNORED_DIRS.contains(&e.file_name().to_string_lossy().as_ref()))
            })
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| FIXABLE_EXTENSIONS.contains(&ext))
            })
            .collect();
        files.sort();
        files
    }

    /// Transforms one file in place. Returns whether it was modified.
    fn fix_file(&self, path: &Path, strategy: FixStrategy) -> Result<bool, MonitorError> {
        let original = fs::read_to_string(path)
            .map_err(|err| MonitorError::Fix(format!("{}: {err}", path.display())))?;
        let fixed = match strategy {
            FixStrategy::NormalizeImports => normalize_imports(&original),
            FixStrategy::StripDiagnostics => strip_diagnostics(&original),
            FixStrategy::RemoveDeadImports => remove_dead_imports(&original),
            FixStrategy::NormalizeFormatting => normalize_formatting(&original),
            FixStrategy::ReorganizeManifest => reorganize_manifest(&original)?,
        };
        if fixed == original {
            return Ok(false);
        }
        if self.settings.create_backups {
            self.backup(path, &original)?;
        }
        fs::write(path, fixed)
            .map_err(|err| MonitorError::Fix(format!("{}: {err}", path.display())))?;
        Ok(true)
    }

    /// Writes a timestamped copy mirroring the file's path under the backup
    /// root. Millisecond stamps keep repeated fixes of one file distinct.
    fn backup(&self, path: &Path, content: &str) -> Result<PathBuf, MonitorError> {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        let name = relative
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MonitorError::Fix(format!("unusable path {}", path.display())))?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        let dir = match relative.parent() {
            Some(parent) if parent.as_os_str().is_empty() => self.backup_root.clone(),
            Some(parent) => self.backup_root.join(parent),
            None => self.backup_root.clone(),
        };
        fs::create_dir_all(&dir)
            .map_err(|err| MonitorError::Fix(format!("backup dir: {err}")))?;
        let backup_path = dir.join(format!("{name}.{stamp}.bak"));
        fs::write(&backup_path, content)
            .map_err(|err| MonitorError::Fix(format!("backup write: {err}")))?;
        debug!("backed up {} to {}", path.display(), backup_path.display());
        Ok(backup_path)
    }
}

fn strip_diagnostics(content: &str) -> String {
    let stripped = CONSOLE_LINE.replace_all(content, "");
    EXTRA_BLANKS.replace_all(&stripped, "\n\n").into_owned()
}

fn normalize_imports(content: &str) -> String {
    let mut fixed = DEEP_IMPORT.replace_all(content, "from \"@/$1\"").into_owned();
    for event in KNOWN_EVENTS {
        let constant = format!("EVENTS.{}", event.to_uppercase().replace('-', "_"));
        fixed = fixed.replace(&format!("\"{event}\""), &constant);
        fixed = fixed.replace(&format!("'{event}'"), &constant);
    }
    fixed
}

fn remove_dead_imports(content: &str) -> String {
    let no_empty = EMPTY_IMPORT.replace_all(content, "");
    let mut seen = Vec::new();
    let mut out = String::with_capacity(no_empty.len());
    for line in no_empty.lines() {
        if BARE_IMPORT_LINE.is_match(line) {
            let normalized = line.trim();
            if seen.iter().any(|s| s == normalized) {
                continue;
            }
            seen.push(normalized.to_string());
        }
        out.push_str(line);
        out.push('\n');
    }
    if !no_empty.ends_with('\n') {
        out.pop();
    }
    out
}

fn normalize_formatting(content: &str) -> String {
    let fixed = TRAILING_WS.replace_all(content, "");
    let fixed = EXTRA_BLANKS.replace_all(&fixed, "\n\n");
    let mut fixed = SPACE_BEFORE_SEMI.replace_all(&fixed, ";").into_owned();
    while fixed.ends_with("\n\n") {
        fixed.pop();
    }
    if !fixed.is_empty() && !fixed.ends_with('\n') {
        fixed.push('\n');
    }
    fixed
}

/// Moves tooling-only packages from dependencies to devDependencies inside a
/// package.json document.
fn reorganize_manifest(content: &str) -> Result<String, MonitorError> {
    let mut manifest: Value = serde_json::from_str(content)
        .map_err(|err| MonitorError::Fix(format!("invalid package.json: {err}")))?;
    let deps = match manifest.get("dependencies").and_then(Value::as_object) {
        Some(deps) => deps.clone(),
        None => return Ok(content.to_string()),
    };
    let misplaced: Vec<String> = deps
        .keys()
        .filter(|name| {
            DEV_ONLY_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
        })
        .cloned()
        .collect();
    if misplaced.is_empty() {
        return Ok(content.to_string());
    }
    let root = manifest
        .as_object_mut()
        .ok_or_else(|| MonitorError::Fix("package.json is not an object".into()))?;
    if !root.contains_key("devDependencies") {
        root.insert("devDependencies".into(), Value::Object(Default::default()));
    }
    for name in &misplaced {
        let version = root
            .get_mut("dependencies")
            .and_then(Value::as_object_mut)
            .and_then(|deps| deps.remove(name));
        if let (Some(version), Some(dev)) = (
            version,
            root.get_mut("devDependencies").and_then(Value::as_object_mut),
        ) {
            dev.insert(name.clone(), version);
        }
    }
    serde_json::to_string_pretty(&manifest)
        .map(|json| json + "\n")
        .map_err(|err| MonitorError::Fix(err.to_string()))
}

/// Recovers a backup record from `<name>.<stamp>.bak`.
fn parse_backup_name(path: &Path) -> Option<BackupRecord> {
    let file_name = path.file_name()?.to_str()?;
    let without_ext = file_name.strip_suffix(".bak")?;
    let (original_name, timestamp) = without_ext.rsplit_once('.')?;
    Some(BackupRecord {
        original_name: original_name.to_string(),
        backup_path: path.to_path_buf(),
        timestamp: timestamp.to_string(),
    })
}
