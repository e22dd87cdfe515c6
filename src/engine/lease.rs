// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Mutex, MutexGuard, PoisonError};

/// The engine is process-global: one instantiated model per process.
static ENGINE: Mutex<()> = Mutex::new(());

/// Exclusive hold on the process-global simulation engine.
///
/// In-process runs (inline and thread workers) take a lease for the whole run,
/// so two runs in one process never interleave engine state. Forked workers
/// own a private copy of the process and do not take one.
///
/// Released on drop.
pub struct EngineLease {
    _guard: MutexGuard<'static, ()>,
}

impl EngineLease {
    /// Block until the engine is free.
    pub fn acquire() -> Self {
        // A run that panicked while holding the lease has already unwound its
        // resources; the engine is usable again.
        let guard = ENGINE.lock().unwrap_or_else(PoisonError::into_inner);
        Self { _guard: guard }
    }

    /// Take the engine if nobody holds it.
    pub fn try_acquire() -> Option<Self> {
        match ENGINE.try_lock() {
            Ok(guard) => Some(Self { _guard: guard }),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => Some(Self {
                _guard: poisoned.into_inner(),
            }),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_is_exclusive_until_dropped() {
        let lease = EngineLease::acquire();
        let contender = std::thread::spawn(|| EngineLease::try_acquire().is_some())
            .join()
            .unwrap();
        assert!(!contender);

        drop(lease);
        // Other tests may hold the engine briefly; blocking acquire always succeeds.
        let _again = EngineLease::acquire();
    }
}
