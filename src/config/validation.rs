// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Parsing already rejects unknown worker kinds and failure strategies. The
//! checks here cover values that parse but cannot run:
//!
//! 1. **Concurrency bounds**: `batch.max_concurrency` must be in `1..=1024`
//! 2. **Worker availability**: `fork` requires a unix target
//!
//! All violations are collected so a user sees every problem at once.

use crate::config::consts::MAX_CONCURRENCY_LIMIT;
use crate::config::{Config, WorkerKind};
use crate::errors::ConfigError;

/// Validate a parsed config, returning every violation found.
pub fn validate_config(config: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if let Err(error) = validate_concurrency(config) {
        errors.push(error);
    }
    if let Err(error) = validate_worker(config.isolation.worker) {
        errors.push(error);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_concurrency(config: &Config) -> Result<(), ConfigError> {
    match config.batch.max_concurrency {
        Some(0) => Err(ConfigError::Invalid {
            field: "batch.max_concurrency",
            reason: "must be at least 1".to_string(),
        }),
        Some(n) if n > MAX_CONCURRENCY_LIMIT => Err(ConfigError::Invalid {
            field: "batch.max_concurrency",
            reason: format!("{} exceeds the limit of {}", n, MAX_CONCURRENCY_LIMIT),
        }),
        _ => Ok(()),
    }
}

fn validate_worker(worker: WorkerKind) -> Result<(), ConfigError> {
    if worker == WorkerKind::Fork && !cfg!(unix) {
        return Err(ConfigError::Invalid {
            field: "isolation.worker",
            reason: "fork workers require a unix target".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cfg = parse_config("batch:\n  max_concurrency: 0\n").unwrap();
        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ConfigError::Invalid {
                field: "batch.max_concurrency",
                ..
            }
        ));
    }

    #[test]
    fn excessive_concurrency_is_rejected() {
        let cfg = parse_config("batch:\n  max_concurrency: 100000\n").unwrap();
        let errors = validate_config(&cfg).unwrap_err();
        assert!(errors[0].to_string().contains("exceeds the limit"));
    }

    #[cfg(unix)]
    #[test]
    fn fork_is_accepted_on_unix() {
        let cfg = parse_config("isolation:\n  worker: fork\n").unwrap();
        assert!(validate_config(&cfg).is_ok());
    }

    #[cfg(not(unix))]
    #[test]
    fn fork_is_rejected_off_unix() {
        let cfg = parse_config("isolation:\n  worker: fork\n").unwrap();
        let errors = validate_config(&cfg).unwrap_err();
        assert!(errors[0].to_string().contains("unix"));
    }
}
