// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout the crate. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep one wording per event, whichever component emits it
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::protocol` - Protocol run lifecycle and failure containment
//! * `messages::worker` - Isolation worker spawn and exit events
//! * `messages::batch` - Batch evaluation progress
//!
//! The crate only emits events; installing a subscriber is up to the program
//! embedding it.
//!
//! # Usage
//!
//! ```rust
//! use sweepwood::observability::messages::StructuredLog;
//! use sweepwood::observability::messages::protocol::SimulationFailureContained;
//!
//! let msg = SimulationFailureContained {
//!     protocol: "step_1",
//!     params: "{gnabar_hh: 0.9}",
//!     reason: "cvode failed to converge",
//!     recording_count: 2,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
