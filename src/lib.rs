// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // worker backends
pub mod config;     // runtime config
pub mod engine;     // protocols and batch evaluation
pub mod errors;     // error handling
pub mod observability;
pub mod traits;     // capability and worker abstractions
pub mod types;      // parameter sets and responses
