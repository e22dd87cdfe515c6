// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Value types that flow in and out of a protocol run.

mod params;
mod response;

pub use params::ParamValues;
pub use response::{Response, Responses, Trace};
