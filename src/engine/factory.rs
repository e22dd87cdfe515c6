// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::{InlineWorker, ThreadWorker};
use crate::config::{Config, WorkerKind};
use crate::errors::ConfigError;
use crate::traits::Worker;

/// Factory for creating workers from configuration
pub struct WorkerFactory;

impl WorkerFactory {
    /// Create the worker named by `isolation.worker`
    pub fn from_config(cfg: &Config) -> Result<Arc<dyn Worker>, ConfigError> {
        Self::from_kind(cfg.isolation.worker)
    }

    pub fn from_kind(kind: WorkerKind) -> Result<Arc<dyn Worker>, ConfigError> {
        match kind {
            #[cfg(unix)]
            WorkerKind::Fork => Ok(Arc::new(crate::backends::ForkWorker)),
            #[cfg(not(unix))]
            WorkerKind::Fork => Err(ConfigError::Invalid {
                field: "isolation.worker",
                reason: "fork workers require a unix target".to_string(),
            }),
            WorkerKind::Thread => Ok(Arc::new(ThreadWorker)),
            WorkerKind::Inline => Ok(Arc::new(InlineWorker)),
        }
    }
}
