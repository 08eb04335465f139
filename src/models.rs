use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// A single rule match at one location in one file.
///
/// Produced by an analyzer and never mutated afterwards; the orchestrator and
/// the report generator only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// File path relative to the scanned project root
    pub file: PathBuf,

    /// 1-based line of the match start
    pub line: usize,

    /// 0-based column of the match start
    pub column: usize,

    /// Identifier of the rule that matched
    pub rule_id: String,

    /// Rule category (console, imports, architecture, ...)
    pub category: String,

    /// Effective severity after configuration overrides
    pub severity: Severity,

    /// Human-readable description of the problem
    pub message: String,

    /// The exact text that matched the rule pattern
    pub matched_text: String,

    /// Whether the auto-fixer has a strategy for this category of issue
    pub fixable: bool,
}

/// Severity of a finding, ordered ascending by risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Sort rank for recommendations and report listings: critical first.
    pub fn priority_rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Finding counts broken down by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

/// Per-analyzer aggregate, derived deterministically from its finding set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSummary {
    pub files_scanned: usize,

    /// Files skipped because they could not be read as text
    pub files_skipped: usize,

    pub findings_by_category: BTreeMap<String, usize>,
    pub findings_by_severity: SeverityCounts,
}

/// Everything a single analyzer emits for one scan.
///
/// `serde(default)` keeps decoding lenient for external analyzers that omit
/// optional sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerOutput {
    pub analyzer_id: String,
    pub timestamp: String,
    pub findings: Vec<Finding>,
    pub summary: AnalyzerSummary,

    /// Domain health score 0-100, absent when the analyzer does not score
    pub score: Option<f64>,

    pub recommendations: Vec<Recommendation>,
}

/// A prioritized, human-actionable suggestion derived from an analyzer's
/// findings (or from orchestrator-level conditions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Analyzer id that produced the suggestion, or "system"
    pub source: String,
    pub category: String,
    pub priority: Severity,
    pub issue: String,
    pub action: String,
    pub auto_fixable: bool,
}

/// Why an analyzer could not be reduced to a valid output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Timeout,
    Parsing,
    Execution,
    System,
}

/// Recorded by the orchestrator when an analyzer fails; never aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub category: ErrorCategory,
    pub analyzer_id: Option<String>,
    pub message: String,
}

/// Result of applying one remediation strategy for one recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixResult {
    pub recommendation: Recommendation,
    pub success: bool,
    pub files_modified: Vec<PathBuf>,
    pub backup_created: bool,
    pub error: Option<String>,
}

/// A timestamped, path-mirrored copy taken before a mutating fix write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub original_name: String,
    pub backup_path: PathBuf,
    pub timestamp: String,
}

/// Cross-analyzer totals and scoring for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total_files_analyzed: usize,
    pub total_findings: usize,
    pub fixable_findings: usize,
    pub findings_by_severity: SeverityCounts,
    pub analyzers_run: Vec<String>,

    /// One 0-100 score per analyzer domain that reported one
    pub category_scores: BTreeMap<String, f64>,

    /// Mean of the reported category scores; `None` when nothing was scored
    pub overall_score: Option<f64>,
}

/// The top-level aggregate of one pipeline invocation. Created once per run
/// and handed read-only to the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub timestamp: String,
    pub project_root: PathBuf,
    pub analyzer_results: BTreeMap<String, AnalyzerOutput>,
    pub summary: AggregateSummary,
    pub recommendations: Vec<Recommendation>,
    pub fixes_applied: Vec<FixResult>,
    pub errors: Vec<RunError>,
}

/// Structured failure taxonomy. Per-analyzer and per-fix failures are
/// recovered inside the orchestrator and recorded as `RunError`/`FixResult`;
/// only `System` errors raised at setup abort a run.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("analyzer timed out after {0}s")]
    Timeout(u64),

    #[error("analyzer execution failed: {0}")]
    Execution(String),

    #[error("analyzer output could not be parsed: {0}")]
    Parsing(String),

    #[error("system error: {0}")]
    System(String),

    #[error("fix could not be applied: {0}")]
    Fix(String),
}

impl MonitorError {
    /// Maps an error onto the run-level error category recorded in reports.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MonitorError::Timeout(_) => ErrorCategory::Timeout,
            MonitorError::Parsing(_) => ErrorCategory::Parsing,
            MonitorError::Execution(_) | MonitorError::Fix(_) => ErrorCategory::Execution,
            MonitorError::System(_) => ErrorCategory::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_ascending_by_risk() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn priority_rank_puts_critical_first() {
        assert_eq!(Severity::Critical.priority_rank(), 0);
        assert_eq!(Severity::Low.priority_rank(), 3);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
        let parsed: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, Severity::Critical);
    }

    #[test]
    fn severity_counts_bump_per_tier() {
        let mut counts = SeverityCounts::default();
        counts.bump(Severity::High);
        counts.bump(Severity::High);
        counts.bump(Severity::Low);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.critical, 0);
    }

    #[test]
    fn monitor_error_maps_to_run_error_category() {
        assert_eq!(MonitorError::Timeout(300).category(), ErrorCategory::Timeout);
        assert_eq!(
            MonitorError::Parsing("bad json".into()).category(),
            ErrorCategory::Parsing
        );
        assert_eq!(
            MonitorError::Execution("exit 1".into()).category(),
            ErrorCategory::Execution
        );
        assert_eq!(
            MonitorError::System("missing root".into()).category(),
            ErrorCategory::System
        );
    }
}
