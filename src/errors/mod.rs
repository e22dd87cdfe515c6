// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod simulation;

pub use config::ConfigError;
pub use execution::{FailureStrategy, ProtocolError};
pub use simulation::SimulationError;
