// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::thread;

use crate::backends::panic_message;
use crate::engine::EngineLease;
use crate::errors::ProtocolError;
use crate::observability::messages::worker::{WorkerCrashed, WorkerSpawned};
use crate::observability::messages::StructuredLog;
use crate::traits::{RunTask, Worker};
use crate::types::Responses;

/// Runs each task on a fresh scoped thread while holding the engine lease.
///
/// A panic in the task is reported as `WorkerCrashed`; the task's resource
/// guards are released while the panic unwinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadWorker;

impl Worker for ThreadWorker {
    fn execute<'a>(&self, protocol: &str, task: RunTask<'a>) -> Result<Responses, ProtocolError> {
        let _lease = EngineLease::acquire();

        let joined = thread::scope(|scope| {
            thread::Builder::new()
                .name(format!("sweep-{}", protocol))
                .spawn_scoped(scope, task)
                .map(|handle| {
                    WorkerSpawned {
                        worker: self.name(),
                        protocol,
                        pid: None,
                    }
                    .log();
                    handle.join()
                })
        });

        match joined {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => {
                let reason = panic_message(payload.as_ref());
                WorkerCrashed {
                    worker: self.name(),
                    protocol,
                    reason: &reason,
                }
                .log();
                Err(ProtocolError::WorkerCrashed {
                    protocol: protocol.to_string(),
                    worker: self.name().to_string(),
                    reason,
                })
            }
            Err(error) => Err(ProtocolError::WorkerUnavailable {
                worker: self.name().to_string(),
                reason: error.to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "thread"
    }
}
