// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Worker backends that execute one protocol run each.
//!
//! A worker is the fault boundary around a run. Each backend implements the
//! `Worker` trait and can be selected through configuration.
//!
//! # Available Backends
//!
//! ## Fork Worker (unix)
//! One freshly forked OS process per run:
//! - **Isolation**: the child owns a private copy of the engine's global state
//! - **Crash containment**: a segfault or abort in the engine kills only the child
//! - **Transport**: the result is bincode-encoded over a pipe
//! - **Use Case**: default for isolated runs
//!
//! ## Thread Worker
//! One fresh thread per run, holding the engine lease:
//! - **Crash containment**: panics only; native crashes still take the process down
//! - **Use Case**: targets without `fork`, debugging under a single process
//!
//! ## Inline Worker
//! Runs on the caller's thread, holding the engine lease:
//! - **Use Case**: the caller already isolates at a coarser granularity
//!
//! ## Stub Backend (Test-Only)
//! Capability doubles for tests (only available in test builds):
//! - **StubCellModel / StubStimulus / StubRecording**: count instantiate and destroy calls
//! - **StubSimulator**: succeeds, diverges, faults, panics or aborts on demand
//!
//! # Architecture
//!
//! ```text
//! SweepProtocol::run -> Worker::execute(task) -> task() -> Responses
//! ```

#[cfg(unix)]
mod fork;
mod inline;
#[cfg(test)]
pub mod stub;
mod thread;

#[cfg(unix)]
pub use fork::ForkWorker;
pub use inline::InlineWorker;
pub use thread::ThreadWorker;

use std::any::Any;
use std::sync::Arc;

use crate::traits::Worker;

/// Worker used for isolated runs unless one is configured.
pub fn default_worker() -> Arc<dyn Worker> {
    #[cfg(unix)]
    {
        Arc::new(ForkWorker)
    }
    #[cfg(not(unix))]
    {
        Arc::new(ThreadWorker)
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", message)
    } else {
        "task panicked".to_string()
    }
}
