// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod capabilities;
pub mod protocol;
pub mod worker;

pub use capabilities::{Attachment, CellHandle, CellModel, Probe, Recording, Simulator, Stimulus};
pub use protocol::Protocol;
pub use worker::{RunTask, Worker};
