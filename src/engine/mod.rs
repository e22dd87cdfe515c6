// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod batch;
pub mod factory;
mod lease;
pub(crate) mod lifecycle;
pub mod sequence;
pub mod sweep;

pub use batch::{BatchEntry, BatchEvaluator, SimulationContext};
pub use factory::WorkerFactory;
pub use lease::EngineLease;
pub use sequence::SequenceProtocol;
pub use sweep::SweepProtocol;
