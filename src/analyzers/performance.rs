use super::{build_output, run_rules, severity_weighted_score, Analyzer};
use crate::config::ConfigStore;
use crate::models::{AnalyzerOutput, AnalyzerSummary, MonitorError, Recommendation, Severity};
use crate::rules::{self, PERFORMANCE_DOMAIN};
use glob::Pattern;
use log::info;
use std::path::Path;

const EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs"];

/// Flags performance anti-patterns: render churn, query patterns that will
/// not scale, event-loop blocking and timer/listener leaks.
pub struct PerformanceAnalyzer;

impl Analyzer for PerformanceAnalyzer {
    fn id(&self) -> &str {
        PERFORMANCE_DOMAIN
    }

    fn description(&self) -> &str {
        "Detects performance anti-patterns and resource leaks"
    }

    fn scan(
        &self,
        root: &Path,
        excludes: &[Pattern],
        config: &ConfigStore,
    ) -> Result<AnalyzerOutput, MonitorError> {
        let toggles = config.rules();
        let (findings, summary) = run_rules(
            PERFORMANCE_DOMAIN,
            root,
            excludes,
            &toggles,
            rules::catalog(PERFORMANCE_DOMAIN),
            EXTENSIONS,
        );
        info!(
            "performance scan: {} findings over {} files",
            findings.len(),
            summary.files_scanned
        );
        let score = severity_weighted_score(&summary.findings_by_severity);
        let recommendations = recommendations(&summary, config);
        Ok(build_output(
            PERFORMANCE_DOMAIN,
            findings,
            summary,
            Some(score),
            recommendations,
        ))
    }
}

fn recommendations(summary: &AnalyzerSummary, config: &ConfigStore) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let counts = summary.findings_by_severity;

    if counts.critical > 0 {
        recs.push(Recommendation {
            source: PERFORMANCE_DOMAIN.into(),
            category: "performance".into(),
            priority: Severity::Critical,
            issue: format!("Found {} critical performance issues", counts.critical),
            action: "Eliminate N+1 query patterns before they reach production".into(),
            auto_fixable: false,
        });
    }

    if counts.high > 0 {
        recs.push(Recommendation {
            source: PERFORMANCE_DOMAIN.into(),
            category: "performance".into(),
            priority: Severity::High,
            issue: format!("Found {} high-impact performance issues", counts.high),
            action: "Review O(n^3) loops, synchronous I/O and uncleared timers".into(),
            auto_fixable: false,
        });
    }

    let medium_limit = config
        .threshold("recommendations", "max_medium_findings")
        .and_then(|v| v.as_u64())
        .unwrap_or(10) as usize;
    if counts.medium > medium_limit {
        recs.push(Recommendation {
            source: PERFORMANCE_DOMAIN.into(),
            category: "performance".into(),
            priority: Severity::Medium,
            issue: format!("Found {} medium-impact performance issues", counts.medium),
            action: "Memoize render props and bound large queries".into(),
            auto_fixable: false,
        });
    }

    recs
}
