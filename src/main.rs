use anyhow::Result;
use chrono::Local;
use clap::Parser;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod analyzers;
mod cli;
mod config;
mod fixer;
mod models;
mod orchestrator;
mod reporters;
mod rules;
mod utils;

use cli::{Args, Commands};
use config::ConfigStore;
use fixer::AutoFixer;
use orchestrator::{Orchestrator, RunOptions};
use reporters::ReportGenerator;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match &args.command {
        Commands::Run {
            project_root,
            auto_fix,
            modules,
            output_dir,
            config_dir,
        } => {
            run_pipeline(
                project_root,
                *auto_fix,
                modules.clone(),
                output_dir.as_deref(),
                config_dir.as_deref(),
            )?;
        }
        Commands::List {
            project_root,
            config_dir,
        } => {
            let config = open_config(project_root, config_dir.as_deref());
            let orchestrator = Orchestrator::new(project_root.clone(), config)?;
            for (id, description) in orchestrator.list_analyzers() {
                println!("{id:<14} {description}");
            }
        }
        Commands::Single {
            analyzer,
            project_root,
            config_dir,
        } => {
            let config = open_config(project_root, config_dir.as_deref());
            let orchestrator = Orchestrator::new(project_root.clone(), config)?;
            let output = orchestrator.run_single(analyzer)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Backups { project_root } => {
            let fixer = AutoFixer::new(project_root.clone());
            let backups = fixer.list_backups();
            if backups.is_empty() {
                println!("no backups found");
            }
            for backup in backups {
                println!(
                    "{:<24} {:<16} {}",
                    backup.original_name,
                    backup.timestamp,
                    backup.backup_path.display()
                );
            }
        }
        Commands::Restore { backup, original } => {
            let fixer = AutoFixer::new(PathBuf::from("."));
            if !fixer.restore(backup, original) {
                anyhow::bail!("restore failed");
            }
            println!("restored {}", original.display());
        }
    }

    Ok(())
}

fn open_config(project_root: &Path, config_dir: Option<&Path>) -> Arc<ConfigStore> {
    let dir = config_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_root.join(".codesweep").join("config"));
    Arc::new(ConfigStore::open(&dir))
}

fn run_pipeline(
    project_root: &Path,
    auto_fix: bool,
    modules: Option<Vec<String>>,
    output_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<()> {
    let config = open_config(project_root, config_dir);
    let orchestrator = Orchestrator::new(project_root.to_path_buf(), Arc::clone(&config))?;

    let run = orchestrator.run(&RunOptions { auto_fix, modules });

    let reports_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_root.join(".codesweep").join("reports"));
    let generator = ReportGenerator::new(reports_dir, config.score_bands());
    let run_id = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let paths = generator.render(&run, &run_id)?;

    generator.print_digest(&run);
    println!("\nReports:");
    println!("  {}", paths.json.display());
    println!("  {}", paths.html.display());
    println!("  {}", paths.summary.display());

    if run.summary.findings_by_severity.critical > 0 {
        info!("critical findings present, exiting non-zero");
        std::process::exit(1);
    }
    Ok(())
}
