// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fork-per-run isolation.
//!
//! ## Protocol between parent and child
//!
//! 1. Parent creates a pipe and forks.
//! 2. Child runs the task under `catch_unwind`, writes the bincode-encoded
//!    `Result<Responses, ProtocolError>` to the pipe and calls `_exit`.
//! 3. Parent reads the pipe to EOF, then reaps the child with `waitpid`.
//!
//! The result is trusted only when the child exited with status 0 and the
//! payload decodes. Any other ending (signal, panic, write failure) is a
//! `WorkerCrashed`.
//!
//! The child never returns into the caller's stack and never runs the
//! parent's destructors: it leaves through `_exit` on every path.
//!
//! ## Concurrent runs
//!
//! Pipe creation, `fork` and closing the parent's write end happen under one
//! process-wide lock. A child forked for another run therefore never inherits
//! this run's write end, and EOF arrives as soon as this run's child exits.
//!
//! ## Fork safety
//!
//! Only the forking thread exists in the child. A lock that another parent
//! thread held at fork time stays locked forever, so the task must only run
//! fork-safe code. Before running it the child routes `tracing` events to the
//! no-op dispatcher and replaces the panic hook, so neither the crate's own
//! logging nor a panic message touches a subscriber or stderr lock.

use std::fs::File;
use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, pipe, ForkResult, Pid};

use crate::errors::ProtocolError;
use crate::observability::messages::worker::{WorkerCrashed, WorkerExited, WorkerSpawned};
use crate::observability::messages::StructuredLog;
use crate::traits::{RunTask, Worker};
use crate::types::Responses;

/// Exit status of a child whose task panicked
const EXIT_TASK_PANICKED: i32 = 101;
/// Exit status of a child that could not deliver its result
const EXIT_TRANSPORT_FAILED: i32 = 102;

/// Held from `pipe` until the parent has closed its write end.
static FORK_LOCK: Mutex<()> = Mutex::new(());

/// Runs each task in a freshly forked child process, never reused.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkWorker;

impl ForkWorker {
    fn unavailable(&self, error: Errno) -> ProtocolError {
        ProtocolError::WorkerUnavailable {
            worker: self.name().to_string(),
            reason: error.desc().to_string(),
        }
    }

    fn crashed(&self, protocol: &str, reason: String) -> ProtocolError {
        WorkerCrashed {
            worker: self.name(),
            protocol,
            reason: &reason,
        }
        .log();
        ProtocolError::WorkerCrashed {
            protocol: protocol.to_string(),
            worker: self.name().to_string(),
            reason,
        }
    }

    /// Child side: run, report, `_exit`.
    fn run_child(task: RunTask<'_>, mut channel: File) -> ! {
        // `Dispatch::none` is not registered, so installing it takes no global lock.
        let _silenced = tracing::dispatcher::set_default(&tracing::Dispatch::none());
        panic::set_hook(Box::new(|_| {}));

        let code = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(result) => match bincode::serialize(&result) {
                Ok(payload) if channel.write_all(&payload).is_ok() => 0,
                _ => EXIT_TRANSPORT_FAILED,
            },
            Err(_) => EXIT_TASK_PANICKED,
        };
        drop(channel);
        // SAFETY: `_exit` ends the process immediately; nothing after it runs.
        unsafe { libc::_exit(code) }
    }

    fn reap(child: Pid) -> Result<WaitStatus, Errno> {
        loop {
            match waitpid(child, None) {
                Err(Errno::EINTR) => continue,
                other => return other,
            }
        }
    }
}

impl Worker for ForkWorker {
    fn execute<'a>(&self, protocol: &str, task: RunTask<'a>) -> Result<Responses, ProtocolError> {
        let start = Instant::now();
        let forking = FORK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let (read_end, write_end) = pipe().map_err(|e| self.unavailable(e))?;

        // SAFETY: the child only runs the task, writes to its pipe and calls
        // `_exit`; it never returns into code that assumes the parent's threads.
        let fork_result = unsafe { fork() }.map_err(|e| self.unavailable(e))?;

        let child = match fork_result {
            ForkResult::Child => {
                drop(read_end);
                Self::run_child(task, File::from(write_end))
            }
            ForkResult::Parent { child } => child,
        };

        drop(write_end);
        drop(forking);
        drop(task);
        WorkerSpawned {
            worker: self.name(),
            protocol,
            pid: Some(child.as_raw()),
        }
        .log();

        let mut payload = Vec::new();
        let read = File::from(read_end).read_to_end(&mut payload);
        let status = Self::reap(child).map_err(|e| self.unavailable(e))?;

        match status {
            WaitStatus::Exited(_, 0) => {
                if let Err(error) = read {
                    return Err(self.crashed(protocol, format!("reading result failed: {}", error)));
                }
                let result: Result<Responses, ProtocolError> = bincode::deserialize(&payload)
                    .map_err(|error| self.crashed(protocol, format!("unreadable result: {}", error)))?;
                WorkerExited {
                    worker: self.name(),
                    protocol,
                    payload_bytes: payload.len(),
                    duration: start.elapsed(),
                }
                .log();
                result
            }
            WaitStatus::Exited(_, EXIT_TASK_PANICKED) => {
                Err(self.crashed(protocol, "task panicked".to_string()))
            }
            WaitStatus::Exited(_, EXIT_TRANSPORT_FAILED) => {
                Err(self.crashed(protocol, "result could not be sent to parent".to_string()))
            }
            WaitStatus::Exited(_, code) => {
                Err(self.crashed(protocol, format!("exited with status {}", code)))
            }
            WaitStatus::Signaled(_, signal, core_dumped) => Err(self.crashed(
                protocol,
                format!(
                    "killed by signal {:?}{}",
                    signal,
                    if core_dumped { " (core dumped)" } else { "" }
                ),
            )),
            other => Err(self.crashed(protocol, format!("unexpected wait status {:?}", other))),
        }
    }

    fn name(&self) -> &'static str {
        "fork"
    }
}
