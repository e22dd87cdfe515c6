// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::EngineLease;
use crate::errors::ProtocolError;
use crate::traits::{RunTask, Worker};
use crate::types::Responses;

/// Runs the task on the calling thread. No crash containment.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineWorker;

impl Worker for InlineWorker {
    fn execute<'a>(&self, _protocol: &str, task: RunTask<'a>) -> Result<Responses, ProtocolError> {
        let _lease = EngineLease::acquire();
        task()
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}
