// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::errors::ProtocolError;
use crate::traits::capabilities::{CellModel, Simulator};
use crate::types::{ParamValues, Responses};

pub trait Protocol: Send + Sync + fmt::Display {
    fn name(&self) -> &str;

    /// Run the protocol against a cell model with the given parameter values.
    ///
    /// - `cell_model`: reusable model; returned unfrozen and uninstantiated
    /// - `param_values`: values bound onto the model for this run only
    /// - `simulator`: engine, held exclusively for the duration of the call
    /// - `isolate`: run inside a single-use worker; `None` lets the protocol decide
    ///
    /// Returns a Result containing either:
    /// - Ok(Responses): one entry per recording, `Absent` when the simulation failed
    /// - Err(ProtocolError): an unexpected failure or a dead worker
    fn run(
        &self,
        cell_model: &mut dyn CellModel,
        param_values: &ParamValues,
        simulator: &mut dyn Simulator,
        isolate: Option<bool>,
    ) -> Result<Responses, ProtocolError>;
}
