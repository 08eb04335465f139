pub mod architecture;
pub mod external;
pub mod hardcoded;
pub mod performance;

use crate::config::{ConfigStore, RulesDoc};
use crate::models::{
    AnalyzerOutput, AnalyzerSummary, Finding, MonitorError, Recommendation, SeverityCounts,
    Severity,
};
use crate::rules::Rule;
use crate::utils;
use chrono::Local;
use glob::Pattern;
use log::debug;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

/// A unit that scans a source subtree and emits findings plus a summary.
///
/// Analyzers are read-only over the scanned tree and independent of each
/// other, so the orchestrator may invoke them on worker threads.
pub trait Analyzer: Send + Sync {
    fn id(&self) -> &str;
    fn description(&self) -> &str;
    fn scan(
        &self,
        root: &Path,
        excludes: &[Pattern],
        config: &ConfigStore,
    ) -> Result<AnalyzerOutput, MonitorError>;
}

/// The three built-in rule-engine analyzers, in registry order.
pub fn built_in() -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(hardcoded::HardcodedStringsAnalyzer),
        Arc::new(architecture::ArchitectureAnalyzer),
        Arc::new(performance::PerformanceAnalyzer),
    ]
}

/// Directories never worth scanning: build artifacts, dependency caches,
/// version-control metadata and our own working directories.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".next",
    "dist",
    "build",
    "coverage",
    ".git",
    "target",
    ".codesweep",
    ".codesweep-backups",
];

/// Why one file was left out of a scan; skips never abort the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// I/O failure while reading
    Unreadable,
    /// Content is not valid UTF-8 text
    NotText,
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && IGNORED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
}

fn is_excluded(root: &Path, path: &Path, excludes: &[Pattern]) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    excludes.iter().any(|pattern| pattern.matches_path(rel))
}

/// Enumerates eligible files under `root`, sorted for determinism.
pub(crate) fn eligible_files(
    root: &Path,
    excludes: &[Pattern],
    extensions: &[&str],
) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| utils::has_any_extension(path, extensions))
        .filter(|path| !is_excluded(root, path, excludes))
        .collect();
    files.sort();
    files
}

/// Scans one file against one domain's enabled rules.
///
/// Failures are reported as a `SkipReason` instead of aborting the scan; a
/// single unreadable file never takes down the whole analyzer.
fn scan_file(
    domain: &str,
    root: &Path,
    path: &Path,
    rules: &[Rule],
    toggles: &RulesDoc,
) -> Result<Vec<Finding>, SkipReason> {
    let content = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::InvalidData => SkipReason::NotText,
        _ => SkipReason::Unreadable,
    })?;
    let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let test_file = utils::is_test_file(&rel);

    let mut findings = Vec::new();
    for rule in rules {
        if !toggles.enabled(domain, rule.id) {
            continue;
        }
        if let Some(counter) = &rule.counter_pattern {
            if counter.is_match(&content) {
                continue;
            }
        }
        let severity = toggles
            .severity_override(domain, rule.id)
            .unwrap_or(rule.severity);
        // test fixtures are full of deliberate noise; only high-impact rules
        // still report there
        if test_file && severity < Severity::High {
            continue;
        }
        let fixable = toggles
            .auto_fix_override(domain, rule.id)
            .unwrap_or(rule.auto_fixable);

        for found in rule.pattern.find_iter(&content) {
            let offset = found.start();
            if utils::in_comment(&content, offset) {
                continue;
            }
            if rule.skip_import_lines && utils::is_import_line(utils::line_at(&content, offset)) {
                continue;
            }
            let matched = found.as_str();
            let lowered = matched.to_lowercase();
            if rule.allow.iter().any(|safe| lowered.contains(safe)) {
                continue;
            }
            let (line, column) = utils::line_and_column(&content, offset);
            findings.push(Finding {
                file: rel.clone(),
                line,
                column,
                rule_id: rule.id.to_string(),
                category: rule.category.to_string(),
                severity,
                message: rule.description.to_string(),
                matched_text: matched.to_string(),
                fixable,
            });
        }
    }
    Ok(findings)
}

/// Shared scan loop for the built-in analyzers: enumerate, scan per file in
/// parallel, count skips, and order findings by (file, line, rule id).
pub(crate) fn run_rules(
    domain: &str,
    root: &Path,
    excludes: &[Pattern],
    toggles: &RulesDoc,
    rules: &[Rule],
    extensions: &[&str],
) -> (Vec<Finding>, AnalyzerSummary) {
    let files = eligible_files(root, excludes, extensions);
    let outcomes: Vec<Result<Vec<Finding>, SkipReason>> = files
        .par_iter()
        .map(|path| scan_file(domain, root, path, rules, toggles))
        .collect();

    let mut findings = Vec::new();
    let mut summary = AnalyzerSummary::default();
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(file_findings) => {
                summary.files_scanned += 1;
                findings.extend(file_findings);
            }
            Err(reason) => {
                summary.files_skipped += 1;
                debug!("skipping {path:?}: {reason:?}");
            }
        }
    }

    findings.sort_by(|a, b| {
        (&a.file, a.line, &a.rule_id).cmp(&(&b.file, b.line, &b.rule_id))
    });
    for finding in &findings {
        *summary
            .findings_by_category
            .entry(finding.category.clone())
            .or_insert(0) += 1;
        summary.findings_by_severity.bump(finding.severity);
    }
    (findings, summary)
}

/// Domain health score: 100 minus severity-weighted deductions, floored at 0.
pub(crate) fn severity_weighted_score(counts: &SeverityCounts) -> f64 {
    let penalty = counts.critical * 15 + counts.high * 7 + counts.medium * 3 + counts.low;
    (100.0 - penalty as f64).max(0.0)
}

pub(crate) fn build_output(
    analyzer_id: &str,
    findings: Vec<Finding>,
    summary: AnalyzerSummary,
    score: Option<f64>,
    recommendations: Vec<Recommendation>,
) -> AnalyzerOutput {
    AnalyzerOutput {
        analyzer_id: analyzer_id.to_string(),
        timestamp: Local::now().to_rfc3339(),
        findings,
        summary,
        score,
        recommendations,
    }
}
