// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::Config;
use crate::engine::{BatchEvaluator, WorkerFactory};
use crate::errors::ConfigError;
use crate::traits::Worker;

/// Builds the execution runtime described by a config.
///
/// # Examples
///
/// ```
/// use sweepwood::config::{parse_config, RuntimeBuilder};
/// use sweepwood::errors::FailureStrategy;
///
/// let config = parse_config("isolation:\n  worker: thread\nbatch:\n  max_concurrency: 2\n").unwrap();
/// let (worker, isolate_by_default, batch) = RuntimeBuilder::from_config(&config).unwrap();
///
/// assert_eq!(worker.name(), "thread");
/// assert!(isolate_by_default);
/// assert_eq!(batch.max_concurrency(), 2);
/// assert_eq!(batch.failure_strategy(), FailureStrategy::FailFast);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the runtime pieces from configuration.
    ///
    /// Returns:
    /// - the worker for isolated runs
    /// - the isolation flag to use when a caller passes `isolate: None`
    /// - a `BatchEvaluator` with the configured concurrency and failure strategy
    pub fn from_config(
        cfg: &Config,
    ) -> Result<(Arc<dyn Worker>, bool, BatchEvaluator), ConfigError> {
        let worker = WorkerFactory::from_config(cfg)?;
        let batch = BatchEvaluator::new(cfg.batch.resolved_max_concurrency())
            .with_failure_strategy(cfg.batch.failure_strategy);
        Ok((worker, cfg.isolation.enabled, batch))
    }
}
