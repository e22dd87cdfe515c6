// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for the simulation capabilities.
//!
//! Every double reports into a shared [`Counters`] so tests can check that
//! each instantiation was paired with a destroy, and in which order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::SimulationError;
use crate::traits::{Attachment, CellHandle, CellModel, Probe, Recording, Simulator, Stimulus};
use crate::types::{ParamValues, Trace};

/// Shared call counters and an ordered event log
#[derive(Clone, Default)]
pub struct Counters {
    pub freeze: Arc<AtomicUsize>,
    pub unfreeze: Arc<AtomicUsize>,
    pub model_instantiate: Arc<AtomicUsize>,
    pub model_destroy: Arc<AtomicUsize>,
    pub stimulus_instantiate: Arc<AtomicUsize>,
    pub stimulus_destroy: Arc<AtomicUsize>,
    pub recording_instantiate: Arc<AtomicUsize>,
    pub recording_destroy: Arc<AtomicUsize>,
    pub simulator_run: Arc<AtomicUsize>,
    events: Arc<Mutex<Vec<String>>>,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn get(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Every attachment and the model geometry were destroyed as often as created
    pub fn balanced(&self) -> bool {
        Self::get(&self.stimulus_instantiate) == Self::get(&self.stimulus_destroy)
            && Self::get(&self.recording_instantiate) == Self::get(&self.recording_destroy)
            && Self::get(&self.model_instantiate) == Self::get(&self.model_destroy)
            && Self::get(&self.freeze) == Self::get(&self.unfreeze)
    }
}

pub struct StubCellModel {
    counters: Counters,
    frozen: BTreeMap<String, f64>,
    handle: Option<CellHandle>,
    fail_freeze: bool,
    fail_instantiate: bool,
    instantiations: u64,
}

impl StubCellModel {
    pub fn new(counters: Counters) -> Self {
        Self {
            counters,
            frozen: BTreeMap::new(),
            handle: None,
            fail_freeze: false,
            fail_instantiate: false,
            instantiations: 0,
        }
    }

    pub fn failing_freeze(mut self) -> Self {
        self.fail_freeze = true;
        self
    }

    pub fn failing_instantiate(mut self) -> Self {
        self.fail_instantiate = true;
        self
    }

    /// No bound parameters and no live geometry
    pub fn is_pristine(&self) -> bool {
        self.frozen.is_empty() && self.handle.is_none()
    }
}

impl CellModel for StubCellModel {
    fn freeze(&mut self, param_values: &ParamValues) -> anyhow::Result<()> {
        Counters::bump(&self.counters.freeze);
        self.counters.record("freeze");
        for (name, value) in param_values.iter() {
            if self.fail_freeze {
                anyhow::bail!("parameter '{}' has no location", name);
            }
            self.frozen.insert(name.clone(), *value);
        }
        Ok(())
    }

    fn unfreeze(&mut self, param_names: &[String]) {
        Counters::bump(&self.counters.unfreeze);
        self.counters.record("unfreeze");
        for name in param_names {
            self.frozen.remove(name);
        }
    }

    fn instantiate(&mut self, _simulator: &mut dyn Simulator) -> anyhow::Result<CellHandle> {
        Counters::bump(&self.counters.model_instantiate);
        self.counters.record("model.instantiate");
        if self.fail_instantiate {
            anyhow::bail!("morphology file 'missing.swc' not found");
        }
        self.instantiations += 1;
        let handle = CellHandle::new(self.instantiations, "stub_cell");
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    fn destroy(&mut self) {
        Counters::bump(&self.counters.model_destroy);
        self.counters.record("model.destroy");
        self.handle = None;
    }

    fn instantiated_handle(&self) -> Option<&CellHandle> {
        self.handle.as_ref()
    }
}

/// Live attachment created by the stub stimulus and recording.
pub struct StubAttachment {
    label: String,
    destroy_counter: Arc<AtomicUsize>,
    counters: Counters,
    voltage: f64,
    fail_response: bool,
}

impl Attachment for StubAttachment {
    fn destroy(&mut self) {
        Counters::bump(&self.destroy_counter);
        self.counters.record(format!("{}.destroy", self.label));
    }
}

impl Probe for StubAttachment {
    fn response(&self) -> anyhow::Result<Trace> {
        if self.fail_response {
            anyhow::bail!("recording vector for '{}' is empty", self.label);
        }
        Ok(Trace::new(
            vec![0.0, 0.025, 0.05],
            vec![-65.0, self.voltage, self.voltage],
        ))
    }
}

pub struct StubStimulus {
    name: String,
    duration: f64,
    counters: Counters,
    fail: bool,
}

impl StubStimulus {
    pub fn new(name: &str, duration: f64, counters: Counters) -> Self {
        Self {
            name: name.to_string(),
            duration,
            counters,
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl fmt::Display for StubStimulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} ms)", self.name, self.duration)
    }
}

impl Stimulus for StubStimulus {
    fn total_duration(&self) -> f64 {
        self.duration
    }

    fn instantiate(
        &self,
        _simulator: &mut dyn Simulator,
        _cell: &CellHandle,
    ) -> anyhow::Result<Box<dyn Attachment>> {
        if self.fail {
            anyhow::bail!("no section at location of stimulus '{}'", self.name);
        }
        Counters::bump(&self.counters.stimulus_instantiate);
        let label = format!("stimulus:{}", self.name);
        self.counters.record(format!("{}.instantiate", label));
        Ok(Box::new(StubAttachment {
            label,
            destroy_counter: self.counters.stimulus_destroy.clone(),
            counters: self.counters.clone(),
            voltage: 0.0,
            fail_response: false,
        }))
    }
}

pub struct StubRecording {
    name: String,
    voltage: f64,
    counters: Counters,
    fail_response: bool,
}

impl StubRecording {
    pub fn new(name: &str, voltage: f64, counters: Counters) -> Self {
        Self {
            name: name.to_string(),
            voltage,
            counters,
            fail_response: false,
        }
    }

    pub fn failing_response(mut self) -> Self {
        self.fail_response = true;
        self
    }
}

impl fmt::Display for StubRecording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: soma[0](0.5) v", self.name)
    }
}

impl Recording for StubRecording {
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(
        &self,
        _simulator: &mut dyn Simulator,
        _cell: &CellHandle,
    ) -> anyhow::Result<Box<dyn Probe>> {
        Counters::bump(&self.counters.recording_instantiate);
        let label = format!("recording:{}", self.name);
        self.counters.record(format!("{}.instantiate", label));
        Ok(Box::new(StubAttachment {
            label,
            destroy_counter: self.counters.recording_destroy.clone(),
            counters: self.counters.clone(),
            voltage: self.voltage,
            fail_response: self.fail_response,
        }))
    }
}

/// What the stub simulator does when run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimOutcome {
    Succeed,
    /// Classified runtime failure
    Diverge,
    /// Unclassified failure
    Fault,
    Panic,
    /// Kill the process; only meaningful inside a forked worker
    Abort,
}

pub struct StubSimulator {
    outcome: SimOutcome,
    counters: Option<Counters>,
    pub runs: Vec<(f64, Option<bool>)>,
}

impl StubSimulator {
    pub fn new(outcome: SimOutcome) -> Self {
        Self {
            outcome,
            counters: None,
            runs: Vec::new(),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(SimOutcome::Succeed)
    }

    pub fn with_counters(mut self, counters: Counters) -> Self {
        self.counters = Some(counters);
        self
    }
}

impl Simulator for StubSimulator {
    fn run(&mut self, duration: f64, cvode_active: Option<bool>) -> Result<(), SimulationError> {
        self.runs.push((duration, cvode_active));
        if let Some(counters) = &self.counters {
            Counters::bump(&counters.simulator_run);
            counters.record("simulator.run");
        }
        match self.outcome {
            SimOutcome::Succeed => Ok(()),
            SimOutcome::Diverge => Err(SimulationError::runtime("cvode failed to converge")),
            SimOutcome::Fault => Err(anyhow::anyhow!("mechanism 'hh' is not loaded").into()),
            SimOutcome::Panic => panic!("engine assertion failed"),
            SimOutcome::Abort => std::process::abort(),
        }
    }
}
