use super::{build_output, run_rules, severity_weighted_score, Analyzer};
use crate::config::ConfigStore;
use crate::models::{AnalyzerOutput, AnalyzerSummary, MonitorError, Recommendation, Severity};
use crate::rules::{self, ARCHITECTURE_DOMAIN};
use glob::Pattern;
use log::info;
use std::path::Path;

const EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs"];

/// Enforces module-boundary rules: no cross-module imports, no deep relative
/// import chains, shared types through the alias.
pub struct ArchitectureAnalyzer;

impl Analyzer for ArchitectureAnalyzer {
    fn id(&self) -> &str {
        ARCHITECTURE_DOMAIN
    }

    fn description(&self) -> &str {
        "Validates module boundaries and import-path conventions"
    }

    fn scan(
        &self,
        root: &Path,
        excludes: &[Pattern],
        config: &ConfigStore,
    ) -> Result<AnalyzerOutput, MonitorError> {
        let toggles = config.rules();
        let (findings, summary) = run_rules(
            ARCHITECTURE_DOMAIN,
            root,
            excludes,
            &toggles,
            rules::catalog(ARCHITECTURE_DOMAIN),
            EXTENSIONS,
        );
        info!(
            "architecture scan: {} findings over {} files",
            findings.len(),
            summary.files_scanned
        );
        let score = severity_weighted_score(&summary.findings_by_severity);
        let recommendations = recommendations(&summary);
        Ok(build_output(
            ARCHITECTURE_DOMAIN,
            findings,
            summary,
            Some(score),
            recommendations,
        ))
    }
}

fn recommendations(summary: &AnalyzerSummary) -> Vec<Recommendation> {
    let count = |category: &str| summary.findings_by_category.get(category).copied().unwrap_or(0);
    let mut recs = Vec::new();

    let deep_imports = count("imports");
    if deep_imports > 0 {
        recs.push(Recommendation {
            source: ARCHITECTURE_DOMAIN.into(),
            category: "imports".into(),
            priority: Severity::Medium,
            issue: format!("Found {deep_imports} deep relative import chains"),
            action: "Promote ../../ import paths to the @/ root alias".into(),
            auto_fixable: true,
        });
    }

    let boundary = count("architecture");
    if boundary > 0 {
        recs.push(Recommendation {
            source: ARCHITECTURE_DOMAIN.into(),
            category: "architecture".into(),
            priority: Severity::High,
            issue: format!("Found {boundary} module-boundary violations"),
            action: "Route cross-module access through shared interfaces".into(),
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
    fn deep_imports_are_flagged_and_fixable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("frontend/src")).unwrap();
        fs::write(
            dir.path().join("frontend/src/lobby.ts"),
            "import { score } from \"../../shared/scoring\";\n",
        )
        .unwrap();
        let config = ConfigStore::open(&dir.path().join(".codesweep/config"));

        let output = ArchitectureAnalyzer.scan(dir.path(), &[], &config).unwrap();

        assert_eq!(output.findings.len(), 1);
        assert_eq!(output.findings[0].rule_id, "deep-relative-import");
        let rec = &output.recommendations[0];
        assert_eq!(rec.category, "imports");
        assert!(rec.issue.contains("deep relative import"));
        assert!(rec.auto_fixable);
    }

    #[test]
    fn cross_module_imports_are_boundary_violations() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("frontend")).unwrap();
        fs::write(
            dir.path().join("frontend/leaderboard.ts"),
            "import { db } from \"../backend/db\";\n",
        )
        .unwrap();
        let config = ConfigStore::open(&dir.path().join(".codesweep/config"));

        let output = ArchitectureAnalyzer.scan(dir.path(), &[], &config).unwrap();

        assert!(output
            .findings
            .iter()
            .any(|f| f.rule_id == "frontend-imports-backend"));
        assert!(output
            .recommendations
            .iter()
            .any(|r| r.category == "architecture" && !r.auto_fixable));
    }
}
