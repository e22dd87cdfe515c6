// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for protocol run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Sweep runs starting and completing
//! * Simulation failures contained as absent responses
//! * Unexpected execution failures
//! * Response collisions while merging a sequence

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Sweep run started.
///
/// # Log Level
/// `debug!` - Emitted once per parameter set, too chatty for info
///
/// # Example
/// ```
/// use sweepwood::observability::messages::protocol::RunStarted;
///
/// let msg = RunStarted {
///     protocol: "step_1",
///     isolated: true,
///     total_duration: 300.0,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct RunStarted<'a> {
    pub protocol: &'a str,
    pub isolated: bool,
    pub total_duration: f64,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Protocol '{}' run started: isolated={}, total_duration={} ms",
            self.protocol, self.isolated, self.total_duration
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            protocol = self.protocol,
            isolated = self.isolated,
            total_duration = self.total_duration,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "protocol_run",
            span_name = name,
            protocol = self.protocol,
            isolated = self.isolated,
            total_duration = self.total_duration,
        )
    }
}

/// Sweep run completed and all resources were released.
///
/// # Log Level
/// `debug!` - Emitted once per parameter set
///
/// # Example
/// ```
/// use sweepwood::observability::messages::protocol::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     protocol: "step_1",
///     response_count: 2,
///     absent_count: 0,
///     duration: Duration::from_millis(40),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct RunCompleted<'a> {
    pub protocol: &'a str,
    pub response_count: usize,
    pub absent_count: usize,
    pub duration: std::time::Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Protocol '{}' run completed: {} responses ({} absent) in {:?}",
            self.protocol, self.response_count, self.absent_count, self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            protocol = self.protocol,
            response_count = self.response_count,
            absent_count = self.absent_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "protocol_run_completed",
            span_name = name,
            protocol = self.protocol,
            response_count = self.response_count,
            duration = ?self.duration,
        )
    }
}

/// The simulator failed for this parameter set; responses are reported absent.
///
/// # Log Level
/// `debug!` - Expected outcome for unstable parameter sets
///
/// # Example
/// ```
/// use sweepwood::observability::messages::protocol::SimulationFailureContained;
///
/// let msg = SimulationFailureContained {
///     protocol: "step_1",
///     params: "{gnabar_hh: 0.9}",
///     reason: "cvode failed to converge",
///     recording_count: 2,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct SimulationFailureContained<'a> {
    pub protocol: &'a str,
    pub params: &'a str,
    pub reason: &'a str,
    pub recording_count: usize,
}

impl Display for SimulationFailureContained<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Protocol '{}': running parameter set {} failed ({}), returning {} absent responses",
            self.protocol, self.params, self.reason, self.recording_count
        )
    }
}

impl StructuredLog for SimulationFailureContained<'_> {
    fn log(&self) {
        tracing::debug!(
            protocol = self.protocol,
            params = self.params,
            reason = self.reason,
            recording_count = self.recording_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "simulation_failure_contained",
            span_name = name,
            protocol = self.protocol,
            params = self.params,
        )
    }
}

/// The run failed for a reason other than the simulation itself.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use sweepwood::observability::messages::protocol::ExecutionFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "mechanism 'hh' not loaded");
/// let msg = ExecutionFailed {
///     protocol: "step_1",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ExecutionFailed<'a> {
    pub protocol: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Protocol '{}' failed: {}", self.protocol, self.error)
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            protocol = self.protocol,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "execution_failed",
            span_name = name,
            protocol = self.protocol,
            error = %self.error,
        )
    }
}

/// A sequence step replaced responses produced by an earlier step.
///
/// # Log Level
/// `warn!` - The earlier values are dropped
///
/// # Example
/// ```
/// use sweepwood::observability::messages::protocol::ResponseOverwritten;
///
/// let names = vec!["soma.v".to_string()];
/// let msg = ResponseOverwritten {
///     sequence: "steps",
///     protocol: "step_2",
///     names: &names,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct ResponseOverwritten<'a> {
    pub sequence: &'a str,
    pub protocol: &'a str,
    pub names: &'a [String],
}

impl Display for ResponseOverwritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Sequence '{}': protocol '{}' overwrote earlier responses [{}]",
            self.sequence,
            self.protocol,
            self.names.join(", ")
        )
    }
}

impl StructuredLog for ResponseOverwritten<'_> {
    fn log(&self) {
        tracing::warn!(
            sequence = self.sequence,
            protocol = self.protocol,
            overwritten = self.names.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "response_overwritten",
            span_name = name,
            sequence = self.sequence,
            protocol = self.protocol,
        )
    }
}
