use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codesweep",
    version,
    about = "Static code quality analysis with automated remediation",
    long_about = "Scans a project tree for hardcoded values, architecture violations and performance anti-patterns, scores each domain, generates reports and optionally applies safe automated fixes."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Runs the full analysis pipeline and writes reports
    Run {
        /// Project root to analyze
        #[arg(short = 'p', long, default_value = ".")]
        project_root: PathBuf,

        /// Apply automated fixes for fixable recommendations
        #[arg(long)]
        auto_fix: bool,

        /// Run only these analyzers (default: all enabled)
        #[arg(short, long, num_args = 1..)]
        modules: Option<Vec<String>>,

        /// Report directory (default: <root>/.codesweep/reports)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Config directory (default: <root>/.codesweep/config)
        #[arg(short, long)]
        config_dir: Option<PathBuf>,
    },

    /// Lists the registered analyzers
    List {
        /// Project root whose configuration registers external analyzers
        #[arg(short = 'p', long, default_value = ".")]
        project_root: PathBuf,

        /// Config directory (default: <root>/.codesweep/config)
        #[arg(short, long)]
        config_dir: Option<PathBuf>,
    },

    /// Runs a single analyzer and prints its output as JSON
    Single {
        /// Analyzer id to run
        #[arg(value_name = "ANALYZER")]
        analyzer: String,

        /// Project root to analyze
        #[arg(short = 'p', long, default_value = ".")]
        project_root: PathBuf,

        /// Config directory (default: <root>/.codesweep/config)
        #[arg(short, long)]
        config_dir: Option<PathBuf>,
    },

    /// Lists the backups taken by previous auto-fix runs
    Backups {
        /// Project root holding the backups
        #[arg(short = 'p', long, default_value = ".")]
        project_root: PathBuf,
    },

    /// Restores one file from a backup
    Restore {
        /// Backup file to restore from
        #[arg(value_name = "BACKUP")]
        backup: PathBuf,

        /// File to overwrite with the backup contents
        #[arg(value_name = "ORIGINAL")]
        original: PathBuf,
    },
}
