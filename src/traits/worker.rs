// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ProtocolError;
use crate::types::Responses;

/// One run-function invocation handed to a worker.
pub type RunTask<'a> = Box<dyn FnOnce() -> Result<Responses, ProtocolError> + Send + 'a>;

/// Task-execution boundary for protocol runs.
///
/// Contract: one task in, one response map (or error) out. A worker executes
/// exactly the task it is given and keeps nothing afterwards; a worker that
/// dies while running reports `ProtocolError::WorkerCrashed` rather than a
/// task result.
pub trait Worker: Send + Sync {
    /// Execute `task` for the protocol named `protocol`.
    fn execute<'a>(&self, protocol: &str, task: RunTask<'a>) -> Result<Responses, ProtocolError>;

    /// Short backend name used in logs and errors
    fn name(&self) -> &'static str;
}
