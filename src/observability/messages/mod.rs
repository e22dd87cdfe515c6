// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with structured fields at its own level.
//!
//! # Organization
//!
//! * `protocol` - Protocol run lifecycle and failure containment
//! * `worker` - Isolation worker events
//! * `batch` - Batch evaluation events
//!
//! # Usage Pattern
//!
//! ```rust
//! use sweepwood::observability::messages::StructuredLog;
//! use sweepwood::observability::messages::worker::WorkerSpawned;
//!
//! let msg = WorkerSpawned {
//!     worker: "fork",
//!     protocol: "step_1",
//!     pid: Some(4242),
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod batch;
pub mod protocol;
pub mod worker;

/// A log message that knows its level and structured fields.
pub trait StructuredLog {
    /// Emit the message as an event at its level
    fn log(&self);

    /// Build a span carrying the message fields
    fn span(&self, name: &str) -> Span;
}
