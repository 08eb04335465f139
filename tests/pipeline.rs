use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn codesweep() -> Command {
    Command::cargo_bin("codesweep").expect("binary builds")
}

fn report_json(project_root: &Path) -> Value {
    let reports_dir = project_root.join(".codesweep").join("reports");
    let report = fs::read_dir(&reports_dir)
        .expect("reports directory exists")
        .filter_map(Result::ok)
        .map(|e| e.path())
        .find(|p| {
            p.extension().map_or(false, |ext| ext == "json")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with("quality_report_"))
        })
        .expect("JSON report written");
    serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap()
}

fn backups_under(project_root: &Path) -> Vec<PathBuf> {
    let backup_root = project_root.join(".codesweep-backups");
    let mut found = Vec::new();
    if backup_root.is_dir() {
        let mut stack = vec![backup_root];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(dir).unwrap().filter_map(Result::ok) {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map_or(false, |ext| ext == "bak") {
                    found.push(path);
                }
            }
        }
    }
    found
}

#[test]
fn full_run_with_auto_fix_produces_reports_and_backups() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let console_source = "console.log(\"player joined lobby\");\n";
    fs::write(root.join("app.js"), console_source).unwrap();
    fs::write(
        root.join("loops.js"),
        "for (let i = 0; i < n; i++) { for (let j = 0; j < n; j++) { for (let k = 0; k < n; k++) { total += grid[i][j][k]; } } }\n",
    )
    .unwrap();

    codesweep()
        .args(["run", "-p"])
        .arg(root)
        .arg("--auto-fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reports:"));

    let report = report_json(root);
    assert_eq!(report["summary"]["total_findings"], 2);
    assert_eq!(report["summary"]["findings_by_severity"]["medium"], 1);
    assert_eq!(report["summary"]["findings_by_severity"]["high"], 1);
    assert_eq!(report["summary"]["findings_by_severity"]["critical"], 0);
    assert_eq!(report["summary"]["fixable_findings"], 1);
    assert!(report["summary"]["overall_score"].as_f64().is_some());

    // exactly one recommendation is auto-fixable, and it was applied
    let fixes = report["fixes_applied"].as_array().unwrap();
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0]["success"], true);
    assert_eq!(fixes[0]["files_modified"].as_array().unwrap().len(), 1);
    assert_eq!(fixes[0]["files_modified"][0], "app.js");

    // the console statement is gone from the source
    let fixed = fs::read_to_string(root.join("app.js")).unwrap();
    assert!(!fixed.contains("console.log"));

    // and the backup holds the original bytes
    let backups = backups_under(root);
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), console_source);
}

#[test]
fn critical_findings_fail_the_run() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(
        root.join("db.js"),
        "for (const item of items) { const row = await prisma.user.findUnique(item); rows.push(row); }\n",
    )
    .unwrap();

    codesweep().args(["run", "-p"]).arg(root).assert().code(1);

    let report = report_json(root);
    assert_eq!(report["summary"]["findings_by_severity"]["critical"], 1);
}

#[test]
fn clean_tree_exits_zero_with_full_scores() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("tidy.js"), "export const answer = 42;\n").unwrap();

    codesweep().args(["run", "-p"]).arg(root).assert().success();

    let report = report_json(root);
    assert_eq!(report["summary"]["total_findings"], 0);
    assert_eq!(report["summary"]["overall_score"], 100.0);
}

#[test]
fn module_filter_limits_the_run() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("app.js"), "console.log(\"x\");\n").unwrap();

    codesweep()
        .args(["run", "-m", "performance", "-p"])
        .arg(root)
        .assert()
        .success();

    let report = report_json(root);
    let analyzers = report["summary"]["analyzers_run"].as_array().unwrap();
    assert_eq!(analyzers.len(), 1);
    assert_eq!(analyzers[0], "performance");
    assert_eq!(report["summary"]["total_findings"], 0);
}

#[test]
fn list_names_the_built_in_analyzers() {
    let dir = TempDir::new().unwrap();
    codesweep()
        .args(["list", "-p"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("hardcoded")
                .and(predicate::str::contains("architecture"))
                .and(predicate::str::contains("performance")),
        );
}

#[test]
fn list_includes_configured_external_analyzers() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let config_dir = root.join(".codesweep/config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("main.json"),
        serde_json::to_string_pretty(&serde_json::json!({
            "external": [
                { "id": "bundle", "command": "bundle-analyzer", "args": [] }
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    codesweep()
        .args(["list", "-p"])
        .arg(root)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("bundle")
                .and(predicate::str::contains("hardcoded")),
        );
}

#[test]
fn single_prints_one_analyzer_output_as_json() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("app.js"), "console.log(\"x\");\n").unwrap();

    let output = codesweep()
        .args(["single", "hardcoded", "-p"])
        .arg(root)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let decoded: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(decoded["analyzer_id"], "hardcoded");
    assert_eq!(decoded["findings"].as_array().unwrap().len(), 1);
    assert_eq!(decoded["findings"][0]["rule_id"], "console-statement");
    assert_eq!(decoded["findings"][0]["line"], 1);
    assert_eq!(decoded["findings"][0]["column"], 0);
}

#[test]
fn backups_and_restore_round_trip_through_the_cli() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let original = "console.info(\"tick\");\nwork();\n";
    fs::write(root.join("app.js"), original).unwrap();

    codesweep()
        .args(["run", "--auto-fix", "-p"])
        .arg(root)
        .assert()
        .success();
    assert_ne!(fs::read_to_string(root.join("app.js")).unwrap(), original);

    codesweep()
        .args(["backups", "-p"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("app.js"));

    let backups = backups_under(root);
    assert_eq!(backups.len(), 1);
    codesweep()
        .arg("restore")
        .arg(&backups[0])
        .arg(root.join("app.js"))
        .assert()
        .success();
    assert_eq!(fs::read_to_string(root.join("app.js")).unwrap(), original);
}

#[test]
fn rule_overrides_in_the_config_store_are_honored() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("app.js"), "console.log(\"x\");\n").unwrap();

    // seed the config, then disable the console rule
    codesweep().args(["run", "-p"]).arg(root).assert().success();
    let rules_path = root.join(".codesweep/config/rules.yaml");
    let rules = fs::read_to_string(&rules_path).unwrap();
    let rules = rules.replace(
        "console-statement:\n    enabled: true",
        "console-statement:\n    enabled: false",
    );
    fs::write(&rules_path, rules).unwrap();

    // wipe previous reports so report_json sees only the new run
    fs::remove_dir_all(root.join(".codesweep/reports")).unwrap();
    codesweep().args(["run", "-p"]).arg(root).assert().success();

    let report = report_json(root);
    assert_eq!(report["summary"]["total_findings"], 0);
}
