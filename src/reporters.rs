use crate::config::ScoreBands;
use crate::models::{Finding, RunResult, Severity};
use anyhow::{Context as _, Result};
use colored::{Color, Colorize};
use log::info;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Tera};

/// Paths of the three artifacts written for one run.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
    pub summary: PathBuf,
}

/// Renders one `RunResult` into the report directory as JSON, HTML and a
/// plain-text summary, and prints the CLI digest.
pub struct ReportGenerator {
    reports_dir: PathBuf,
    bands: ScoreBands,
}

impl ReportGenerator {
    pub fn new(reports_dir: PathBuf, bands: ScoreBands) -> Self {
        Self { reports_dir, bands }
    }

    /// Writes all three report formats. The run id keys the file names so
    /// repeated runs never overwrite each other.
    pub fn render(&self, run: &RunResult, run_id: &str) -> Result<ReportPaths> {
        fs::create_dir_all(&self.reports_dir).with_context(|| {
            format!("could not create report directory {}", self.reports_dir.display())
        })?;
        let paths = ReportPaths {
            json: self.reports_dir.join(format!("quality_report_{run_id}.json")),
            html: self.reports_dir.join(format!("quality_report_{run_id}.html")),
            summary: self.reports_dir.join(format!("quality_summary_{run_id}.txt")),
        };

        let json = serde_json::to_string_pretty(run)?;
        fs::write(&paths.json, json)
            .with_context(|| format!("could not write {}", paths.json.display()))?;

        let html = self.render_html(run)?;
        fs::write(&paths.html, html)
            .with_context(|| format!("could not write {}", paths.html.display()))?;

        let summary = self.render_summary(run);
        fs::write(&paths.summary, summary)
            .with_context(|| format!("could not write {}", paths.summary.display()))?;

        info!("reports written to {}", self.reports_dir.display());
        Ok(paths)
    }

    fn render_html(&self, run: &RunResult) -> Result<String> {
        let html_template = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Code Quality Report</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
        }
        h1, h2, h3 {
            color: #2c3e50;
        }
        .summary {
            background-color: #f8f9fa;
            border-radius: 5px;
            padding: 15px;
            margin-bottom: 20px;
        }
        .score {
            font-size: 2.5em;
            font-weight: bold;
        }
        .stats {
            display: flex;
            flex-wrap: wrap;
            gap: 20px;
            margin-bottom: 20px;
        }
        .stat-box {
            flex: 1;
            min-width: 200px;
            padding: 15px;
            background-color: #f8f9fa;
            border-radius: 5px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        .finding {
            background-color: #fff;
            border: 1px solid #ddd;
            border-radius: 5px;
            padding: 15px;
            margin-bottom: 20px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        .critical {
            border-left: 5px solid #d9534f;
        }
        .high {
            border-left: 5px solid #f0ad4e;
        }
        .medium {
            border-left: 5px solid #5bc0de;
        }
        .low {
            border-left: 5px solid #5cb85c;
        }
        .severity-badge {
            display: inline-block;
            padding: 5px 10px;
            border-radius: 3px;
            color: white;
            font-weight: bold;
        }
        .severity-critical {
            background-color: #d9534f;
        }
        .severity-high {
            background-color: #f0ad4e;
        }
        .severity-medium {
            background-color: #5bc0de;
        }
        .severity-low {
            background-color: #5cb85c;
        }
        pre {
            background-color: #f8f9fa;
            padding: 10px;
            border-radius: 5px;
            overflow-x: auto;
        }
        .recommendation {
            background-color: #eaf7ff;
            padding: 10px;
            border-radius: 5px;
            margin-top: 10px;
        }
        .fix {
            background-color: #f0fff0;
            padding: 10px;
            border-radius: 5px;
            margin-top: 10px;
        }
        .error {
            background-color: #fff0f0;
            padding: 10px;
            border-radius: 5px;
            margin-top: 10px;
        }
    </style>
</head>
<body>
    <h1>Code Quality Report</h1>

    <div class="summary">
        <h2>Summary</h2>
        <p class="score">{{ score_display }} <small>{{ band }}</small></p>
        <p><strong>Generated:</strong> {{ run.timestamp }}</p>
        <p><strong>Project:</strong> {{ run.project_root }}</p>
        <p><strong>Files analyzed:</strong> {{ run.summary.total_files_analyzed }}</p>
        <p><strong>Total findings:</strong> {{ run.summary.total_findings }}
           ({{ run.summary.fixable_findings }} auto-fixable)</p>
    </div>

    <div class="stats">
        <div class="stat-box">
            <h3>Findings by Severity</h3>
            <p><span class="severity-badge severity-critical">Critical</span> {{ run.summary.findings_by_severity.critical }}</p>
            <p><span class="severity-badge severity-high">High</span> {{ run.summary.findings_by_severity.high }}</p>
            <p><span class="severity-badge severity-medium">Medium</span> {{ run.summary.findings_by_severity.medium }}</p>
            <p><span class="severity-badge severity-low">Low</span> {{ run.summary.findings_by_severity.low }}</p>
        </div>
        {% for analyzer in analyzers %}
        <div class="stat-box">
            <h3>{{ analyzer.id }}</h3>
            <p class="score">{{ analyzer.score_display }}</p>
            <p>{{ analyzer.findings }} finding(s)</p>
        </div>
        {% endfor %}
    </div>

    <h2>Recommendations</h2>
    {% for rec in run.recommendations %}
    <div class="finding {{ rec.priority }}">
        <p>
            <span class="severity-badge severity-{{ rec.priority }}">{{ rec.priority }}</span>
            <strong>{{ rec.issue }}</strong>
        </p>
        <div class="recommendation">
            <p>{{ rec.action }}</p>
        </div>
    </div>
    {% endfor %}

    {% if run.fixes_applied %}
    <h2>Fixes Applied</h2>
    {% for fix in run.fixes_applied %}
    <div class="fix">
        <p><strong>{{ fix.recommendation.issue }}</strong> &mdash;
           {% if fix.success %}{{ fix.files_modified | length }} file(s) modified{% else %}not applied: {{ fix.error }}{% endif %}</p>
    </div>
    {% endfor %}
    {% endif %}

    {% if run.errors %}
    <h2>Execution Errors</h2>
    {% for error in run.errors %}
    <div class="error">
        <p><strong>{{ error.analyzer_id }}</strong> ({{ error.category }}): {{ error.message }}</p>
    </div>
    {% endfor %}
    {% endif %}

    <h2>Findings</h2>
    {% for finding in findings %}
    <div class="finding {{ finding.severity }}">
        <h3>Finding #{{ loop.index }}</h3>
        <p><strong>File:</strong> {{ finding.file }}:{{ finding.line }}</p>
        <p>
            <strong>Severity:</strong>
            <span class="severity-badge severity-{{ finding.severity }}">{{ finding.severity }}</span>
            <strong>Rule:</strong> {{ finding.rule_id }}
        </p>
        <p>{{ finding.message }}</p>
        <pre>{{ finding.matched_text }}</pre>
    </div>
    {% endfor %}
</body>
</html>
        "#;

        let mut tera = Tera::default();
        tera.add_raw_template("report", html_template)?;

        let mut context = Context::new();
        context.insert("run", run);
        context.insert("score_display", &score_display(run.summary.overall_score));
        let band = match run.summary.overall_score {
            Some(score) => self.bands.label(score),
            None => "unscored",
        };
        context.insert("band", band);

        let analyzers: Vec<serde_json::Value> = run
            .analyzer_results
            .iter()
            .map(|(id, output)| {
                serde_json::json!({
                    "id": id,
                    "score_display": score_display(output.score),
                    "findings": output.findings.len(),
                })
            })
            .collect();
        context.insert("analyzers", &analyzers);
        context.insert("findings", &sorted_findings(run));

        Ok(tera.render("report", &context)?)
    }

    fn render_summary(&self, run: &RunResult) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "CODE QUALITY SUMMARY");
        let _ = writeln!(out, "====================");
        let _ = writeln!(out, "Generated: {}", run.timestamp);
        let _ = writeln!(out, "Project:   {}", run.project_root.display());
        let _ = writeln!(out);
        match run.summary.overall_score {
            Some(score) => {
                let _ = writeln!(
                    out,
                    "Overall score: {score:.1}/100 ({})",
                    self.bands.label(score)
                );
            }
            None => {
                let _ = writeln!(out, "Overall score: not available (no analyzer reported one)");
            }
        }
        let _ = writeln!(
            out,
            "Files analyzed: {}  Findings: {} ({} auto-fixable)",
            run.summary.total_files_analyzed,
            run.summary.total_findings,
            run.summary.fixable_findings
        );
        let counts = run.summary.findings_by_severity;
        let _ = writeln!(
            out,
            "By severity: critical {}  high {}  medium {}  low {}",
            counts.critical, counts.high, counts.medium, counts.low
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Category scores:");
        for (category, score) in &run.summary.category_scores {
            let _ = writeln!(out, "  {category}: {score:.1} ({})", self.bands.label(*score));
        }
        if !run.recommendations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Top recommendations:");
            for rec in run.recommendations.iter().take(10) {
                let _ = writeln!(out, "  [{}] {} - {}", rec.priority.name(), rec.issue, rec.action);
            }
        }
        if !run.errors.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Execution errors:");
            for error in &run.errors {
                let _ = writeln!(
                    out,
                    "  {}: {}",
                    error.analyzer_id.as_deref().unwrap_or("-"),
                    error.message
                );
            }
        }
        out
    }

    /// Prints the colored terminal digest of a run.
    pub fn print_digest(&self, run: &RunResult) {
        println!("{}", "\nCode Quality Report".bold());
        println!("{}: {}", "Project".bold(), run.project_root.display());
        println!("{}: {}", "Generated".bold(), run.timestamp);
        match run.summary.overall_score {
            Some(score) => {
                let color = match self.bands.label(score) {
                    "excellent" | "good" => Color::Green,
                    "fair" => Color::Yellow,
                    _ => Color::Red,
                };
                println!(
                    "{}: {} ({})",
                    "Overall score".bold(),
                    format!("{score:.1}/100").color(color).bold(),
                    self.bands.label(score)
                );
            }
            None => println!("{}: {}", "Overall score".bold(), "not available".dimmed()),
        }
        println!(
            "{}: {} ({} auto-fixable)\n",
            "Findings".bold(),
            run.summary.total_findings,
            run.summary.fixable_findings
        );

        println!("{}", "Findings by Severity:".bold());
        let counts = run.summary.findings_by_severity;
        println!("  {} {}", "Critical:".color(Color::BrightRed).bold(), counts.critical);
        println!("  {} {}", "High:".color(Color::Red).bold(), counts.high);
        println!("  {} {}", "Medium:".color(Color::Yellow).bold(), counts.medium);
        println!("  {} {}\n", "Low:".color(Color::Green).bold(), counts.low);

        if !run.recommendations.is_empty() {
            println!("{}", "Recommendations:".bold());
            for rec in &run.recommendations {
                let color = match rec.priority {
                    Severity::Critical => Color::BrightRed,
                    Severity::High => Color::Red,
                    Severity::Medium => Color::Yellow,
                    Severity::Low => Color::Green,
                };
                println!(
                    "  [{}] {}",
                    rec.priority.name().color(color).bold(),
                    rec.issue
                );
                println!("      {}", rec.action.dimmed());
            }
            println!();
        }

        for fix in &run.fixes_applied {
            if fix.success {
                println!(
                    "  {} {} ({} file(s) modified)",
                    "fixed".color(Color::Green).bold(),
                    fix.recommendation.issue,
                    fix.files_modified.len()
                );
            } else {
                println!(
                    "  {} {} ({})",
                    "skipped".color(Color::Yellow).bold(),
                    fix.recommendation.issue,
                    fix.error.as_deref().unwrap_or("unknown")
                );
            }
        }
        for error in &run.errors {
            println!(
                "  {} {}: {}",
                "error".color(Color::Red).bold(),
                error.analyzer_id.as_deref().unwrap_or("-"),
                error.message
            );
        }
    }
}

fn score_display(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{score:.1}"),
        None => "n/a".to_string(),
    }
}

/// All findings across analyzers, critical first, stable per severity tier.
fn sorted_findings(run: &RunResult) -> Vec<Finding> {
    let mut findings: Vec<Finding> = run
        .analyzer_results
        .values()
        .flat_map(|output| output.findings.iter().cloned())
        .collect();
    findings.sort_by_key(|f| f.severity.priority_rank());
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AggregateSummary, AnalyzerOutput, Recommendation, SeverityCounts,
    };
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn bands() -> ScoreBands {
        ScoreBands {
            excellent: 90.0,
            good: 75.0,
            fair: 60.0,
            poor: 40.0,
        }
    }

    fn sample_run() -> RunResult {
        let mut analyzer_results = BTreeMap::new();
        analyzer_results.insert(
            "hardcoded".to_string(),
            AnalyzerOutput {
                analyzer_id: "hardcoded".into(),
                score: Some(82.0),
                ..AnalyzerOutput::default()
            },
        );
        RunResult {
            timestamp: "2026-01-01T00:00:00+00:00".into(),
            project_root: PathBuf::from("/tmp/project"),
            analyzer_results,
            summary: AggregateSummary {
                total_files_analyzed: 3,
                total_findings: 2,
                fixable_findings: 1,
                findings_by_severity: SeverityCounts {
                    medium: 2,
                    ..SeverityCounts::default()
                },
                analyzers_run: vec!["hardcoded".into()],
                category_scores: BTreeMap::from([("hardcoded".to_string(), 82.0)]),
                overall_score: Some(82.0),
            },
            recommendations: vec![Recommendation {
                source: "hardcoded".into(),
                category: "console".into(),
                priority: Severity::Medium,
                issue: "Found 2 diagnostic console statements".into(),
                action: "Replace console calls with the logging service".into(),
                auto_fixable: true,
            }],
            fixes_applied: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn render_writes_all_three_artifacts() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().join("reports"), bands());
        let paths = generator.render(&sample_run(), "20260101_000000").unwrap();

        assert!(paths.json.is_file());
        assert!(paths.html.is_file());
        assert!(paths.summary.is_file());
        assert!(paths
            .json
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("quality_report_"));

        let decoded: RunResult =
            serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(decoded.summary.total_findings, 2);

        let html = fs::read_to_string(&paths.html).unwrap();
        assert!(html.contains("82.0"));
        assert!(html.contains("severity-medium"));
    }

    #[test]
    fn summary_text_carries_score_band_and_recommendations() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), bands());
        let paths = generator.render(&sample_run(), "x").unwrap();

        let summary = fs::read_to_string(&paths.summary).unwrap();
        assert!(summary.contains("Overall score: 82.0/100 (good)"));
        assert!(summary.contains("hardcoded: 82.0"));
        assert!(summary.contains("[medium] Found 2 diagnostic console statements"));
    }

    #[test]
    fn unscored_run_renders_without_a_band() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), bands());
        let mut run = sample_run();
        run.summary.overall_score = None;
        run.summary.category_scores.clear();
        run.analyzer_results.clear();

        let paths = generator.render(&run, "y").unwrap();
        let summary = fs::read_to_string(&paths.summary).unwrap();
        assert!(summary.contains("not available"));
    }
}
