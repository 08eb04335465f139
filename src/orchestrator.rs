use crate::analyzers::{self, external::ExternalAnalyzer, Analyzer};
use crate::config::ConfigStore;
use crate::fixer::AutoFixer;
use crate::models::{
    AggregateSummary, AnalyzerOutput, FixResult, MonitorError, Recommendation, RunError,
    RunResult, Severity,
};
use chrono::Local;
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Options for one full pipeline run.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub auto_fix: bool,

    /// Restrict the run to these analyzer ids; `None` runs everything enabled
    pub modules: Option<Vec<String>>,
}

/// Drives the pipeline: invokes analyzers in isolation, merges their outputs,
/// ranks recommendations and optionally hands them to the auto-fixer.
///
/// Every per-analyzer failure is recovered locally and recorded as a
/// `RunError`; a run always yields a `RunResult`. Only a missing project root
/// aborts, at construction time.
pub struct Orchestrator {
    project_root: PathBuf,
    config: Arc<ConfigStore>,
    registry: Vec<Arc<dyn Analyzer>>,
}

impl Orchestrator {
    pub fn new(project_root: PathBuf, config: Arc<ConfigStore>) -> Result<Self, MonitorError> {
        if !project_root.is_dir() {
            return Err(MonitorError::System(format!(
                "project root {} is not a directory",
                project_root.display()
            )));
        }
        let mut orchestrator = Self {
            project_root,
            config,
            registry: analyzers::built_in(),
        };
        for external in orchestrator.config.main().external {
            orchestrator.register(Arc::new(ExternalAnalyzer::new(external)));
        }
        Ok(orchestrator)
    }

    /// Adds an analyzer to the registry.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        self.registry.push(analyzer);
    }

    /// Registered analyzers with their descriptions, in registry order.
    pub fn list_analyzers(&self) -> Vec<(String, String)> {
        self.registry
            .iter()
            .map(|a| (a.id().to_string(), a.description().to_string()))
            .collect()
    }

    /// Runs the full pipeline and always returns a result, however degraded.
    pub fn run(&self, options: &RunOptions) -> RunResult {
        let timestamp = Local::now().to_rfc3339();
        info!("starting analysis of {}", self.project_root.display());

        let enabled = self.config.main().analysis.enabled_analyzers;
        if let Some(modules) = &options.modules {
            for module in modules {
                if !self.registry.iter().any(|a| a.id() == module) {
                    warn!("unknown analyzer module {module:?} requested");
                }
            }
        }
        let selected: Vec<Arc<dyn Analyzer>> = self
            .registry
            .iter()
            .filter(|a| enabled.iter().any(|id| id == a.id()))
            .filter(|a| {
                options
                    .modules
                    .as_ref()
                    .map_or(true, |modules| modules.iter().any(|id| id == a.id()))
            })
            .cloned()
            .collect();

        let mut analyzer_results = BTreeMap::new();
        let mut recommendations = Vec::new();
        let mut errors = Vec::new();
        for analyzer in selected {
            let id = analyzer.id().to_string();
            match self.invoke(Arc::clone(&analyzer)) {
                Ok(output) => {
                    info!(
                        "analyzer {id} completed with {} findings",
                        output.findings.len()
                    );
                    recommendations.extend(output.recommendations.clone());
                    analyzer_results.insert(id, output);
                }
                Err(err) => {
                    warn!("analyzer {id} failed: {err}");
                    errors.push(RunError {
                        category: err.category(),
                        analyzer_id: Some(id),
                        message: err.to_string(),
                    });
                }
            }
        }

        let summary = aggregate_summary(&analyzer_results);
        if !errors.is_empty() {
            recommendations.push(Recommendation {
                source: "system".into(),
                category: "configuration".into(),
                priority: Severity::High,
                issue: format!("{} analyzer(s) failed during this run", errors.len()),
                action: "Review execution errors and analyzer configuration".into(),
                auto_fixable: false,
            });
        }
        sort_recommendations(&mut recommendations);

        let fixes_applied = if options.auto_fix {
            self.apply_fixes(&recommendations)
        } else {
            Vec::new()
        };

        RunResult {
            timestamp,
            project_root: self.project_root.clone(),
            analyzer_results,
            summary,
            recommendations,
            fixes_applied,
            errors,
        }
    }

    /// Ad hoc invocation of one registered analyzer.
    pub fn run_single(&self, analyzer_id: &str) -> Result<AnalyzerOutput, MonitorError> {
        let analyzer = self
            .registry
            .iter()
            .find(|a| a.id() == analyzer_id)
            .ok_or_else(|| MonitorError::System(format!("unknown analyzer {analyzer_id:?}")))?;
        self.invoke(Arc::clone(analyzer))
    }

    /// Runs one analyzer on a worker thread with a wall-clock timeout.
    ///
    /// Analyzers are read-only over the tree and share no mutable state, so a
    /// timed-out worker is simply abandoned; its eventual result is dropped
    /// with the channel.
    fn invoke(&self, analyzer: Arc<dyn Analyzer>) -> Result<AnalyzerOutput, MonitorError> {
        let timeout_secs = self.config.main().analysis.timeout_secs;
        let excludes = self.config.exclude_patterns();
        let root = self.project_root.clone();
        let config = Arc::clone(&self.config);

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(analyzer.scan(&root, &excludes, &config));
        });
        match rx.recv_timeout(Duration::from_secs(timeout_secs)) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(MonitorError::Timeout(timeout_secs)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(MonitorError::Execution(
                "analyzer worker terminated unexpectedly".into(),
            )),
        }
    }

    fn apply_fixes(&self, recommendations: &[Recommendation]) -> Vec<FixResult> {
        let fixer =
            AutoFixer::configured(self.project_root.clone(), self.config.main().auto_fix);
        let fixable: Vec<&Recommendation> =
            recommendations.iter().filter(|r| r.auto_fixable).collect();
        if fixable.is_empty() {
            info!("no auto-fixable recommendations in this run");
            return Vec::new();
        }
        fixable
            .into_iter()
            .map(|rec| {
                let result = fixer.apply(rec);
                if result.success {
                    info!(
                        "applied fix for {:?} ({} file(s) modified)",
                        rec.issue,
                        result.files_modified.len()
                    );
                } else {
                    warn!(
                        "fix for {:?} not applied: {}",
                        rec.issue,
                        result.error.as_deref().unwrap_or("unknown")
                    );
                }
                result
            })
            .collect()
    }
}

/// Sums analyzer outputs into the run-level summary. Category scores come
/// only from analyzers that reported one; the overall score is their mean and
/// stays absent when nothing was scored.
pub fn aggregate_summary(results: &BTreeMap<String, AnalyzerOutput>) -> AggregateSummary {
    let mut summary = AggregateSummary::default();
    for (id, output) in results {
        summary.analyzers_run.push(id.clone());
        summary.total_files_analyzed += output.summary.files_scanned;
        summary.total_findings += output.findings.len();
        summary.fixable_findings += output.findings.iter().filter(|f| f.fixable).count();

        let counts = output.summary.findings_by_severity;
        summary.findings_by_severity.critical += counts.critical;
        summary.findings_by_severity.high += counts.high;
        summary.findings_by_severity.medium += counts.medium;
        summary.findings_by_severity.low += counts.low;

        if let Some(score) = output.score {
            summary.category_scores.insert(id.clone(), score);
        }
    }
    if !summary.category_scores.is_empty() {
        let total: f64 = summary.category_scores.values().sum();
        summary.overall_score = Some(total / summary.category_scores.len() as f64);
    }
    summary
}

/// Stable priority sort: critical first, encounter order preserved per tier.
pub fn sort_recommendations(recommendations: &mut [Recommendation]) {
    recommendations.sort_by_key(|rec| rec.priority.priority_rank());
}
