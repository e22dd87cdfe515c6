// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::backends::{default_worker, InlineWorker};
use crate::engine::lifecycle::{Attached, FrozenModel};
use crate::errors::{ProtocolError, SimulationError};
use crate::observability::messages::protocol::{
    ExecutionFailed, RunCompleted, RunStarted, SimulationFailureContained,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{CellModel, Protocol, Recording, RunTask, Simulator, Stimulus, Worker};
use crate::types::{ParamValues, Response, Responses};

/// One simulation run: a set of stimuli and recordings over a single time window.
///
/// ## Run lifecycle
///
/// ```text
/// Idle -> Frozen -> Instantiated -> Run-complete -> Unwound
/// ```
///
/// Every path from `Frozen` onward reaches `Unwound` before `run` returns:
/// recordings, stimuli and model geometry are destroyed and the parameters
/// unfrozen whether the simulator succeeded, diverged or failed outright.
///
/// ## Failure containment
///
/// - A classified simulation failure (`SimulationError::Runtime`) is expected
///   for unstable parameter sets and yields `Response::Absent` for every
///   recording instead of an error.
/// - Anything else becomes `ProtocolError::ExecutionFailed` carrying the full
///   diagnostic text, so nothing is lost when the run happens in a worker.
///
/// ## Isolation
///
/// With isolation (the default) the run is handed to a single-use worker,
/// by default a forked process per run. Only the response map crosses back.
pub struct SweepProtocol {
    name: String,
    stimuli: Vec<Box<dyn Stimulus>>,
    recordings: Vec<Box<dyn Recording>>,
    cvode_active: Option<bool>,
    worker: Arc<dyn Worker>,
    isolate_by_default: bool,
}

impl SweepProtocol {
    pub fn new(
        name: impl Into<String>,
        stimuli: Vec<Box<dyn Stimulus>>,
        recordings: Vec<Box<dyn Recording>>,
        cvode_active: Option<bool>,
    ) -> Self {
        Self {
            name: name.into(),
            stimuli,
            recordings,
            cvode_active,
            worker: default_worker(),
            isolate_by_default: true,
        }
    }

    /// Use `worker` for isolated runs
    pub fn with_worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.worker = worker;
        self
    }

    /// Whether `run(.., isolate: None)` isolates
    pub fn with_default_isolation(mut self, isolate: bool) -> Self {
        self.isolate_by_default = isolate;
        self
    }

    pub fn stimuli(&self) -> &[Box<dyn Stimulus>] {
        &self.stimuli
    }

    pub fn recordings(&self) -> &[Box<dyn Recording>] {
        &self.recordings
    }

    pub fn cvode_active(&self) -> Option<bool> {
        self.cvode_active
    }

    pub fn worker(&self) -> &Arc<dyn Worker> {
        &self.worker
    }

    /// Run length shared by all stimuli: the longest stimulus duration.
    pub fn total_duration(&self) -> Result<f64, ProtocolError> {
        self.stimuli
            .iter()
            .map(|stimulus| stimulus.total_duration())
            .reduce(f64::max)
            .ok_or_else(|| ProtocolError::NoStimuli {
                protocol: self.name.clone(),
            })
    }

    fn recording_names(&self) -> impl Iterator<Item = &str> {
        self.recordings.iter().map(|recording| recording.name())
    }

    /// The run-function: everything that happens inside the worker.
    fn run_func(
        &self,
        cell_model: &mut dyn CellModel,
        param_values: &ParamValues,
        simulator: &mut dyn Simulator,
        total_duration: f64,
    ) -> Result<Responses, ProtocolError> {
        self.instantiate_and_simulate(cell_model, param_values, simulator, total_duration)
            .map_err(|error| ProtocolError::execution_failed(&self.name, &error))
    }

    fn instantiate_and_simulate(
        &self,
        cell_model: &mut dyn CellModel,
        param_values: &ParamValues,
        simulator: &mut dyn Simulator,
        total_duration: f64,
    ) -> anyhow::Result<Responses> {
        let mut frozen = FrozenModel::freeze(cell_model, param_values)
            .with_context(|| format!("freezing parameters {}", param_values))?;
        let model = frozen
            .instantiate(simulator)
            .context("instantiating cell model")?;
        let cell = model.handle().clone();

        let mut stimuli = Vec::with_capacity(self.stimuli.len());
        for stimulus in &self.stimuli {
            let attachment = stimulus
                .instantiate(simulator, &cell)
                .with_context(|| format!("instantiating stimulus {}", stimulus))?;
            stimuli.push(Attached::new(attachment));
        }

        let mut probes = Vec::with_capacity(self.recordings.len());
        for recording in &self.recordings {
            let probe = recording
                .instantiate(simulator, &cell)
                .with_context(|| format!("instantiating recording {}", recording))?;
            probes.push(Attached::new(probe));
        }

        let responses = match simulator.run(total_duration, self.cvode_active) {
            Ok(()) => {
                let mut responses = Responses::new();
                for (recording, probe) in self.recordings.iter().zip(&probes) {
                    let trace = probe.response().with_context(|| {
                        format!("reading response of recording '{}'", recording.name())
                    })?;
                    responses.insert(recording.name().to_string(), Response::Trace(trace));
                }
                responses
            }
            Err(SimulationError::Runtime(reason)) => {
                let params = param_values.to_string();
                SimulationFailureContained {
                    protocol: &self.name,
                    params: &params,
                    reason: &reason,
                    recording_count: self.recordings.len(),
                }
                .log();
                Responses::absent(self.recording_names())
            }
            Err(SimulationError::Other(error)) => {
                return Err(error.context(format!("running simulation for {} ms", total_duration)));
            }
        };

        // Guards drop in reverse declaration order: probes, stimuli, model, frozen.
        Ok(responses)
    }
}

impl Protocol for SweepProtocol {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &self,
        cell_model: &mut dyn CellModel,
        param_values: &ParamValues,
        simulator: &mut dyn Simulator,
        isolate: Option<bool>,
    ) -> Result<Responses, ProtocolError> {
        let total_duration = self.total_duration()?;
        let isolate = isolate.unwrap_or(self.isolate_by_default);

        let start_msg = RunStarted {
            protocol: &self.name,
            isolated: isolate,
            total_duration,
        };
        let span = start_msg.span("sweep_run");
        let _guard = span.enter();
        start_msg.log();
        let start = Instant::now();

        let task: RunTask<'_> = Box::new(move || {
            self.run_func(cell_model, param_values, simulator, total_duration)
        });
        let result = if isolate {
            self.worker.execute(&self.name, task)
        } else {
            InlineWorker.execute(&self.name, task)
        };

        match &result {
            Ok(responses) => RunCompleted {
                protocol: &self.name,
                response_count: responses.len(),
                absent_count: responses.0.values().filter(|r| r.is_absent()).count(),
                duration: start.elapsed(),
            }
            .log(),
            Err(error) => ExecutionFailed {
                protocol: &self.name,
                error,
            }
            .log(),
        }

        result
    }
}

impl fmt::Display for SweepProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(f, "  stimuli:")?;
        for stimulus in &self.stimuli {
            writeln!(f, "    {}", stimulus)?;
        }
        writeln!(f, "  recordings:")?;
        for recording in &self.recordings {
            writeln!(f, "    {}", recording)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SweepProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepProtocol")
            .field("name", &self.name)
            .field("stimulus_count", &self.stimuli.len())
            .field("recordings", &self.recording_names().collect::<Vec<_>>())
            .field("cvode_active", &self.cvode_active)
            .field("worker", &self.worker.name())
            .field("isolate_by_default", &self.isolate_by_default)
            .finish()
    }
}
