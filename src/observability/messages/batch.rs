// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for batch evaluation events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Batch evaluation started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use sweepwood::observability::messages::batch::BatchStarted;
///
/// let msg = BatchStarted {
///     protocol: "steps",
///     param_set_count: 64,
///     max_concurrency: 8,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BatchStarted<'a> {
    pub protocol: &'a str,
    pub param_set_count: usize,
    pub max_concurrency: usize,
}

impl Display for BatchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluating protocol '{}' on {} parameter sets, max_concurrency={}",
            self.protocol, self.param_set_count, self.max_concurrency
        )
    }
}

impl StructuredLog for BatchStarted<'_> {
    fn log(&self) {
        tracing::info!(
            protocol = self.protocol,
            param_set_count = self.param_set_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch",
            span_name = name,
            protocol = self.protocol,
            param_set_count = self.param_set_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Batch evaluation finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BatchCompleted<'a> {
    pub protocol: &'a str,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: std::time::Duration,
}

impl Display for BatchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch for protocol '{}' completed: {} succeeded, {} failed in {:?}",
            self.protocol, self.succeeded, self.failed, self.duration
        )
    }
}

impl StructuredLog for BatchCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            protocol = self.protocol,
            succeeded = self.succeeded,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch_completed",
            span_name = name,
            protocol = self.protocol,
            succeeded = self.succeeded,
            failed = self.failed,
        )
    }
}

/// One parameter set of a batch failed and the batch continues.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct BatchEntryFailed<'a> {
    pub protocol: &'a str,
    pub index: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for BatchEntryFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Parameter set #{} for protocol '{}' failed: {}",
            self.index, self.protocol, self.error
        )
    }
}

impl StructuredLog for BatchEntryFailed<'_> {
    fn log(&self) {
        tracing::error!(
            protocol = self.protocol,
            index = self.index,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "batch_entry_failed",
            span_name = name,
            protocol = self.protocol,
            index = self.index,
        )
    }
}
