// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors surfaced by `Protocol::run` and the batch policy applied to them.
//!
//! A simulation that fails to converge is *not* an error at this level: it is
//! reported as `Response::Absent` for every recording. Everything here is the
//! loud kind of failure that a caller is expected to stop on or log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of a protocol run.
///
/// Serializable because an isolated worker sends the error back across the
/// process boundary in place of a response map.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProtocolError {
    /// The sweep has no stimuli, so its run length is undefined.
    #[error("Protocol '{protocol}' has no stimuli: total duration is undefined")]
    NoStimuli { protocol: String },

    /// Unexpected failure inside the run, with the captured diagnostic text.
    #[error("Execution of protocol '{protocol}' failed:\n{diagnostic}")]
    ExecutionFailed { protocol: String, diagnostic: String },

    /// The worker terminated without delivering a result.
    #[error("Worker '{worker}' running protocol '{protocol}' terminated abnormally: {reason}")]
    WorkerCrashed {
        protocol: String,
        worker: String,
        reason: String,
    },

    /// The worker could not be started at all.
    #[error("Worker '{worker}' could not be started: {reason}")]
    WorkerUnavailable { worker: String, reason: String },
}

impl ProtocolError {
    /// True when the process running the task failed, as opposed to the task itself.
    pub fn is_worker_failure(&self) -> bool {
        matches!(
            self,
            ProtocolError::WorkerCrashed { .. } | ProtocolError::WorkerUnavailable { .. }
        )
    }

    /// Wrap an unclassified error, keeping its full cause chain as text.
    pub fn execution_failed(protocol: &str, error: &anyhow::Error) -> Self {
        ProtocolError::ExecutionFailed {
            protocol: protocol.to_string(),
            diagnostic: format!("{:?}", error),
        }
    }
}

/// How a batch evaluation reacts to a failed parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    /// Return the first failure, in input order
    #[default]
    FailFast,
    /// Record the failure in its entry and keep going
    ContinueOnError,
}
