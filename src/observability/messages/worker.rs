// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for isolation worker events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A single-task worker was started.
///
/// # Log Level
/// `trace!` - One per isolated run
///
/// # Example
/// ```
/// use sweepwood::observability::messages::worker::WorkerSpawned;
///
/// let msg = WorkerSpawned {
///     worker: "fork",
///     protocol: "step_1",
///     pid: Some(4242),
/// };
///
/// tracing::trace!("{}", msg);
/// ```
pub struct WorkerSpawned<'a> {
    pub worker: &'a str,
    pub protocol: &'a str,
    pub pid: Option<i32>,
}

impl Display for WorkerSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.pid {
            Some(pid) => write!(
                f,
                "Spawned {} worker (pid {}) for protocol '{}'",
                self.worker, pid, self.protocol
            ),
            None => write!(
                f,
                "Spawned {} worker for protocol '{}'",
                self.worker, self.protocol
            ),
        }
    }
}

impl StructuredLog for WorkerSpawned<'_> {
    fn log(&self) {
        tracing::trace!(
            worker = self.worker,
            protocol = self.protocol,
            pid = ?self.pid,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "worker",
            span_name = name,
            worker = self.worker,
            protocol = self.protocol,
            pid = ?self.pid,
        )
    }
}

/// A worker delivered its result and was torn down.
///
/// # Log Level
/// `trace!` - One per isolated run
pub struct WorkerExited<'a> {
    pub worker: &'a str,
    pub protocol: &'a str,
    pub payload_bytes: usize,
    pub duration: std::time::Duration,
}

impl Display for WorkerExited<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} worker for protocol '{}' exited cleanly: payload={} bytes, duration={:?}",
            self.worker, self.protocol, self.payload_bytes, self.duration
        )
    }
}

impl StructuredLog for WorkerExited<'_> {
    fn log(&self) {
        tracing::trace!(
            worker = self.worker,
            protocol = self.protocol,
            payload_bytes = self.payload_bytes,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "worker_exited",
            span_name = name,
            worker = self.worker,
            protocol = self.protocol,
        )
    }
}

/// A worker died without delivering a result.
///
/// # Log Level
/// `error!` - The process, not just the numerics, failed
///
/// # Example
/// ```
/// use sweepwood::observability::messages::worker::WorkerCrashed;
///
/// let msg = WorkerCrashed {
///     worker: "fork",
///     protocol: "step_1",
///     reason: "killed by signal SIGSEGV",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct WorkerCrashed<'a> {
    pub worker: &'a str,
    pub protocol: &'a str,
    pub reason: &'a str,
}

impl Display for WorkerCrashed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} worker for protocol '{}' crashed: {}",
            self.worker, self.protocol, self.reason
        )
    }
}

impl StructuredLog for WorkerCrashed<'_> {
    fn log(&self) {
        tracing::error!(
            worker = self.worker,
            protocol = self.protocol,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "worker_crashed",
            span_name = name,
            worker = self.worker,
            protocol = self.protocol,
            reason = self.reason,
        )
    }
}
