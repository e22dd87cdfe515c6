// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Concurrent evaluation of one protocol over many parameter sets.
//!
//! Each parameter set gets its own cell model and simulator from a factory and
//! runs on tokio's blocking pool. A semaphore bounds how many run at once.
//!
//! ```text
//! param_sets ──► tokio::spawn ──► Semaphore permit ──► spawn_blocking(protocol.run)
//!                                                              │
//! Vec<BatchEntry> (input order) ◄──────────── await in order ◄─┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::backends::panic_message;
use crate::errors::{FailureStrategy, ProtocolError};
use crate::observability::messages::batch::{BatchCompleted, BatchEntryFailed, BatchStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::{CellModel, Protocol, Simulator};
use crate::types::{ParamValues, Responses};

/// A cell model and the simulator it is instantiated into, owned by one run.
pub struct SimulationContext {
    pub cell_model: Box<dyn CellModel>,
    pub simulator: Box<dyn Simulator>,
}

impl SimulationContext {
    pub fn new(cell_model: Box<dyn CellModel>, simulator: Box<dyn Simulator>) -> Self {
        Self {
            cell_model,
            simulator,
        }
    }
}

/// Outcome for one parameter set.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub params: ParamValues,
    pub outcome: Result<Responses, ProtocolError>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs a protocol over parameter sets with bounded concurrency.
#[derive(Debug, Clone)]
pub struct BatchEvaluator {
    max_concurrency: usize,
    failure_strategy: FailureStrategy,
    isolate: Option<bool>,
}

impl BatchEvaluator {
    /// `max_concurrency` below 1 is raised to 1.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            failure_strategy: FailureStrategy::default(),
            isolate: None,
        }
    }

    pub fn with_failure_strategy(mut self, failure_strategy: FailureStrategy) -> Self {
        self.failure_strategy = failure_strategy;
        self
    }

    /// Isolation flag passed to every run; `None` defers to the protocol.
    pub fn with_isolation(mut self, isolate: Option<bool>) -> Self {
        self.isolate = isolate;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn failure_strategy(&self) -> FailureStrategy {
        self.failure_strategy
    }

    pub fn isolate(&self) -> Option<bool> {
        self.isolate
    }

    /// Evaluate `protocol` once per parameter set.
    ///
    /// Entries come back in the order of `param_sets`. Under `FailFast` the
    /// first failed entry (in input order) is returned as the error and runs
    /// not yet started are cancelled. Under `ContinueOnError` every entry is
    /// returned and failures are logged.
    pub async fn evaluate<F>(
        &self,
        protocol: Arc<dyn Protocol>,
        factory: F,
        param_sets: Vec<ParamValues>,
    ) -> Result<Vec<BatchEntry>, ProtocolError>
    where
        F: Fn() -> anyhow::Result<SimulationContext> + Send + Sync + 'static,
    {
        let start = Instant::now();
        BatchStarted {
            protocol: protocol.name(),
            param_set_count: param_sets.len(),
            max_concurrency: self.max_concurrency,
        }
        .log();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let factory = Arc::new(factory);
        let mut tasks = Vec::with_capacity(param_sets.len());

        for params in param_sets {
            let semaphore = semaphore.clone();
            let factory = factory.clone();
            let protocol = protocol.clone();
            let isolate = self.isolate;

            let task = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(error) => {
                        let outcome = Err(ProtocolError::WorkerUnavailable {
                            worker: "batch".to_string(),
                            reason: error.to_string(),
                        });
                        return BatchEntry { params, outcome };
                    }
                };

                let name = protocol.name().to_string();
                let kept = params.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let outcome = run_one(protocol.as_ref(), factory.as_ref(), &params, isolate);
                    BatchEntry { params, outcome }
                })
                .await;

                joined.unwrap_or_else(|error| BatchEntry {
                    params: kept,
                    outcome: Err(join_failure(&name, error)),
                })
            });

            tasks.push(task);
        }

        let mut entries = Vec::with_capacity(tasks.len());
        let mut failed = 0;

        for index in 0..tasks.len() {
            let entry = match (&mut tasks[index]).await {
                Ok(entry) => entry,
                Err(error) => BatchEntry {
                    params: ParamValues::new(),
                    outcome: Err(join_failure(protocol.name(), error)),
                },
            };

            if let Err(error) = &entry.outcome {
                failed += 1;
                match self.failure_strategy {
                    FailureStrategy::FailFast => {
                        for pending in &tasks[index + 1..] {
                            pending.abort();
                        }
                        BatchCompleted {
                            protocol: protocol.name(),
                            succeeded: entries.len(),
                            failed,
                            duration: start.elapsed(),
                        }
                        .log();
                        return Err(error.clone());
                    }
                    FailureStrategy::ContinueOnError => {
                        BatchEntryFailed {
                            protocol: protocol.name(),
                            index,
                            error,
                        }
                        .log();
                    }
                }
            }

            entries.push(entry);
        }

        BatchCompleted {
            protocol: protocol.name(),
            succeeded: entries.len() - failed,
            failed,
            duration: start.elapsed(),
        }
        .log();

        Ok(entries)
    }
}

fn run_one<F>(
    protocol: &dyn Protocol,
    factory: &F,
    params: &ParamValues,
    isolate: Option<bool>,
) -> Result<Responses, ProtocolError>
where
    F: Fn() -> anyhow::Result<SimulationContext>,
{
    let mut context = factory()
        .map_err(|error| ProtocolError::execution_failed(protocol.name(), &error))?;
    protocol.run(
        context.cell_model.as_mut(),
        params,
        context.simulator.as_mut(),
        isolate,
    )
}

fn join_failure(protocol: &str, error: JoinError) -> ProtocolError {
    let reason = if error.is_panic() {
        panic_message(error.into_panic().as_ref())
    } else {
        "task cancelled".to_string()
    };
    ProtocolError::WorkerCrashed {
        protocol: protocol.to_string(),
        worker: "blocking_pool".to_string(),
        reason,
    }
}
