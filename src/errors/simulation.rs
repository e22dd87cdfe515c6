// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failure reported by `Simulator::run`.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// The engine could not complete the run for this parameter set
    /// (divergence, non-convergence). Contained by the protocol.
    #[error("Simulation runtime failure: {0}")]
    Runtime(String),

    /// Anything else: misconfiguration, missing mechanism, engine defect.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimulationError {
    pub fn runtime(message: impl Into<String>) -> Self {
        SimulationError::Runtime(message.into())
    }
}
