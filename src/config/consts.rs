// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Batch concurrency when neither the config nor the platform says otherwise
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// Upper bound on concurrent runs in one batch
pub const MAX_CONCURRENCY_LIMIT: usize = 1024;
