use super::Analyzer;
use crate::config::{ConfigStore, ExternalAnalyzerConfig};
use crate::models::{AnalyzerOutput, MonitorError};
use glob::Pattern;
use log::debug;
use std::path::Path;
use std::process::Command;

/// Adapter registering an external worker process as an analyzer.
///
/// The contract is strict: the command is invoked as
/// `<command> <args...> <root> --json`, must exit zero on success and must
/// emit exactly one JSON `AnalyzerOutput` document on stdout. Diagnostics
/// belong on stderr. Anything else is recorded as an execution or parsing
/// error for this analyzer only.
pub struct ExternalAnalyzer {
    id: String,
    description: String,
    command: String,
    args: Vec<String>,
}

impl ExternalAnalyzer {
    pub fn new(config: ExternalAnalyzerConfig) -> Self {
        Self {
            description: format!("External analyzer ({})", config.command),
            id: config.id,
            command: config.command,
            args: config.args,
        }
    }
}

impl Analyzer for ExternalAnalyzer {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn scan(
        &self,
        root: &Path,
        _excludes: &[Pattern],
        _config: &ConfigStore,
    ) -> Result<AnalyzerOutput, MonitorError> {
        debug!("spawning external analyzer {}: {}", self.id, self.command);
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(root)
            .arg("--json")
            .output()
            .map_err(|err| {
                MonitorError::Execution(format!("could not spawn {}: {err}", self.command))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MonitorError::Execution(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let mut parsed: AnalyzerOutput = serde_json::from_slice(&output.stdout)
            .map_err(|err| MonitorError::Parsing(err.to_string()))?;
        // the registered id wins over whatever the worker called itself
        parsed.analyzer_id = self.id.clone();
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCategory;
    use tempfile::TempDir;

    fn external(command: &str, args: &[&str]) -> ExternalAnalyzer {
        ExternalAnalyzer::new(ExternalAnalyzerConfig {
            id: "bundle".into(),
            command: command.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::open(&dir.path().join("config"))
    }

    #[test]
    fn valid_json_document_is_accepted() {
        let dir = TempDir::new().unwrap();
        let analyzer = external(
            "sh",
            &[
                "-c",
                "echo '{\"analyzer_id\":\"ignored\",\"timestamp\":\"t\",\"score\":88.0}'",
            ],
        );
        let output = analyzer.scan(dir.path(), &[], &store(&dir)).unwrap();
        assert_eq!(output.analyzer_id, "bundle");
        assert_eq!(output.score, Some(88.0));
        assert!(output.findings.is_empty());
    }

    #[test]
    fn garbage_stdout_is_a_parsing_error() {
        let dir = TempDir::new().unwrap();
        let analyzer = external("sh", &["-c", "echo running analysis..."]);
        let err = analyzer.scan(dir.path(), &[], &store(&dir)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Parsing);
    }

    #[test]
    fn nonzero_exit_is_an_execution_error() {
        let dir = TempDir::new().unwrap();
        let analyzer = external("sh", &["-c", "echo broken >&2; exit 3"]);
        let err = analyzer.scan(dir.path(), &[], &store(&dir)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Execution);
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn missing_command_is_an_execution_error() {
        let dir = TempDir::new().unwrap();
        let analyzer = external("codesweep-no-such-worker", &[]);
        let err = analyzer.scan(dir.path(), &[], &store(&dir)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Execution);
    }
}
