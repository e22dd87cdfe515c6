// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capabilities a protocol run consumes from the simulation side.
//!
//! The protocol engine never looks inside a model, a waveform or a probe. It
//! only sequences these calls and guarantees that everything instantiated for
//! a run is destroyed before the run returns.
//!
//! Stimuli and recordings are immutable descriptions; instantiating one
//! against a cell yields a live [`Attachment`] that owns the engine objects
//! and is destroyed exactly once.

use std::fmt;

use crate::errors::SimulationError;
use crate::types::{ParamValues, Trace};

/// Handle to a cell model's instantiated geometry inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellHandle {
    id: u64,
    name: String,
}

impl CellHandle {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A reusable, parameterized neuron model.
///
/// Between runs the model is symbolic: parameters are named but unbound and
/// nothing is instantiated. A run binds values with `freeze`, builds geometry
/// with `instantiate`, and must undo both.
pub trait CellModel: Send {
    /// Bind concrete values to the named parameters.
    fn freeze(&mut self, param_values: &ParamValues) -> anyhow::Result<()>;

    /// Remove the bindings for the given parameter names.
    fn unfreeze(&mut self, param_names: &[String]);

    /// Build the simulatable geometry against the engine.
    fn instantiate(&mut self, simulator: &mut dyn Simulator) -> anyhow::Result<CellHandle>;

    /// Tear down the geometry built by `instantiate`.
    fn destroy(&mut self);

    /// The live geometry handle, if instantiated.
    fn instantiated_handle(&self) -> Option<&CellHandle>;
}

/// Live engine objects created for one run. Destroyed exactly once.
pub trait Attachment: Send {
    fn destroy(&mut self);
}

/// A live recording attachment that can report what it captured.
pub trait Probe: Attachment {
    /// Captured trace. Valid after a successful simulation and before `destroy`.
    fn response(&self) -> anyhow::Result<Trace>;
}

/// An injected waveform definition.
pub trait Stimulus: Send + Sync + fmt::Display {
    /// Time by which the stimulus has finished, in ms.
    fn total_duration(&self) -> f64;

    fn instantiate(
        &self,
        simulator: &mut dyn Simulator,
        cell: &CellHandle,
    ) -> anyhow::Result<Box<dyn Attachment>>;
}

/// A signal probe definition.
pub trait Recording: Send + Sync + fmt::Display {
    /// Key under which the captured response is reported.
    fn name(&self) -> &str;

    fn instantiate(
        &self,
        simulator: &mut dyn Simulator,
        cell: &CellHandle,
    ) -> anyhow::Result<Box<dyn Probe>>;
}

/// The time-stepping engine.
///
/// Engines of this kind keep process-global state; see
/// [`EngineLease`](crate::engine::EngineLease) for how in-process runs share one.
pub trait Simulator: Send {
    /// Advance the instantiated model for `duration` ms.
    ///
    /// `cvode_active` selects variable time stepping; `None` keeps the engine default.
    fn run(&mut self, duration: f64, cvode_active: Option<bool>) -> Result<(), SimulationError>;
}
