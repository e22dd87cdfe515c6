// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_MAX_CONCURRENCY;
use crate::errors::{ConfigError, FailureStrategy};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Runtime configuration for protocol execution.
///
/// Every section is optional; an empty file yields the defaults.
///
/// # Example
/// ```yaml
/// isolation:
///   enabled: true
///   worker: fork
/// batch:
///   max_concurrency: 8
///   failure_strategy: continue_on_error
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub isolation: IsolationConfig,
    #[serde(default)]
    pub batch: BatchOptions,
}

/// Whether runs are isolated by default, and in which kind of worker.
///
/// `enabled` is the value used when a caller passes `isolate: None`.
#[derive(Debug, Deserialize)]
pub struct IsolationConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub worker: WorkerKind,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            enabled: enabled_by_default(),
            worker: WorkerKind::default(),
        }
    }
}

/// Worker backend used for isolated runs.
///
/// # Variants
/// * `Fork` - a fresh child process per run (unix only)
/// * `Thread` - a fresh thread per run; contains panics only
/// * `Inline` - the calling thread; no containment
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Fork,
    Thread,
    Inline,
}

impl Default for WorkerKind {
    fn default() -> Self {
        if cfg!(unix) {
            WorkerKind::Fork
        } else {
            WorkerKind::Thread
        }
    }
}

/// Options for evaluating one protocol over many parameter sets.
#[derive(Debug, Default, Deserialize)]
pub struct BatchOptions {
    pub max_concurrency: Option<usize>,
    #[serde(default)]
    pub failure_strategy: FailureStrategy,
}

impl BatchOptions {
    /// Configured concurrency, or the platform's available parallelism.
    pub fn resolved_max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(DEFAULT_MAX_CONCURRENCY)
        })
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a config from YAML text. Empty text yields the defaults.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Load a config from a YAML file and reject settings that cannot run here.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Rejected)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
isolation:
  enabled: false
  worker: thread
batch:
  max_concurrency: 8
  failure_strategy: continue_on_error
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!cfg.isolation.enabled);
        assert_eq!(cfg.isolation.worker, WorkerKind::Thread);
        assert_eq!(cfg.batch.max_concurrency, Some(8));
        assert_eq!(cfg.batch.failure_strategy, FailureStrategy::ContinueOnError);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg = parse_config("batch:\n  max_concurrency: 2\n").unwrap();
        assert!(cfg.isolation.enabled);
        assert_eq!(cfg.isolation.worker, WorkerKind::default());
        assert_eq!(cfg.batch.failure_strategy, FailureStrategy::FailFast);
        assert_eq!(cfg.batch.resolved_max_concurrency(), 2);
    }

    #[test]
    fn empty_file_is_the_default_config() {
        let file = write_config("");
        let cfg = load_config(file.path()).unwrap();
        assert!(cfg.isolation.enabled);
        assert!(cfg.batch.max_concurrency.is_none());
        assert!(cfg.batch.resolved_max_concurrency() >= 1);
    }

    #[test]
    fn unknown_worker_is_a_parse_error() {
        let file = write_config("isolation:\n  worker: container\n");
        let error = load_config(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_config(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(error, ConfigError::Io(_)));
    }

    #[test]
    fn load_and_validate_accepts_valid_config() {
        let file = write_config("isolation:\n  worker: inline\nbatch:\n  max_concurrency: 3\n");
        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.isolation.worker, WorkerKind::Inline);
    }

    #[test]
    fn load_and_validate_rejects_zero_concurrency() {
        let file = write_config("batch:\n  max_concurrency: 0\n");
        let error = load_and_validate_config(file.path()).unwrap_err();
        assert!(error.to_string().contains("batch.max_concurrency"));
    }
}
