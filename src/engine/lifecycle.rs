// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scoped acquisition for everything a sweep run instantiates.
//!
//! Each guard releases its resource in `Drop`, so teardown happens on the
//! success path, on an early `?` return, and while a panic unwinds. Guards
//! are declared in acquisition order and therefore dropped in reverse:
//! recordings, stimuli, model geometry, parameter bindings.

use std::ops::{Deref, DerefMut};

use crate::traits::{Attachment, CellHandle, CellModel, Simulator};
use crate::types::ParamValues;

/// Parameter values bound onto a cell model. Unfreezes on drop.
pub(crate) struct FrozenModel<'m> {
    model: &'m mut dyn CellModel,
    names: Vec<String>,
}

impl<'m> FrozenModel<'m> {
    pub(crate) fn freeze(
        model: &'m mut dyn CellModel,
        param_values: &ParamValues,
    ) -> anyhow::Result<Self> {
        let names = param_values.names();
        if let Err(error) = model.freeze(param_values) {
            // A partial freeze may have bound some names.
            model.unfreeze(&names);
            return Err(error);
        }
        Ok(Self { model, names })
    }

    /// Build the model geometry. The returned guard borrows this one, so
    /// geometry is always destroyed before the parameters are unfrozen.
    pub(crate) fn instantiate(
        &mut self,
        simulator: &mut dyn Simulator,
    ) -> anyhow::Result<InstantiatedModel<'_>> {
        InstantiatedModel::new(&mut *self.model, simulator)
    }
}

impl Drop for FrozenModel<'_> {
    fn drop(&mut self) {
        self.model.unfreeze(&self.names);
    }
}

/// Instantiated cell geometry. Destroyed on drop.
pub(crate) struct InstantiatedModel<'f> {
    model: &'f mut dyn CellModel,
    handle: CellHandle,
}

impl<'f> InstantiatedModel<'f> {
    fn new(model: &'f mut dyn CellModel, simulator: &mut dyn Simulator) -> anyhow::Result<Self> {
        match model.instantiate(simulator) {
            Ok(handle) => Ok(Self { model, handle }),
            Err(error) => {
                // Geometry may be half built.
                model.destroy();
                Err(error)
            }
        }
    }

    pub(crate) fn handle(&self) -> &CellHandle {
        &self.handle
    }
}

impl Drop for InstantiatedModel<'_> {
    fn drop(&mut self) {
        self.model.destroy();
    }
}

/// A live stimulus or recording attachment. Destroyed on drop.
pub(crate) struct Attached<A: Attachment + ?Sized>(Box<A>);

impl<A: Attachment + ?Sized> Attached<A> {
    pub(crate) fn new(attachment: Box<A>) -> Self {
        Self(attachment)
    }
}

impl<A: Attachment + ?Sized> Deref for Attached<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.0
    }
}

impl<A: Attachment + ?Sized> DerefMut for Attached<A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut self.0
    }
}

impl<A: Attachment + ?Sized> Drop for Attached<A> {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{Counters, StubCellModel, StubSimulator};
    use std::sync::atomic::Ordering;

    #[test]
    fn guards_unwind_in_reverse_order() {
        let counters = Counters::default();
        let mut model = StubCellModel::new(counters.clone());
        let mut simulator = StubSimulator::succeeding();
        let params: ParamValues = [("g_pas", 1e-4)].into_iter().collect();

        {
            let mut frozen = FrozenModel::freeze(&mut model, &params).unwrap();
            let instantiated = frozen.instantiate(&mut simulator).unwrap();
            assert_eq!(instantiated.handle().name(), "stub_cell");
            assert_eq!(counters.model_instantiate.load(Ordering::SeqCst), 1);
            assert_eq!(counters.model_destroy.load(Ordering::SeqCst), 0);
        }

        assert_eq!(counters.model_destroy.load(Ordering::SeqCst), 1);
        assert_eq!(counters.unfreeze.load(Ordering::SeqCst), 1);
        assert_eq!(
            counters.events(),
            vec!["freeze", "model.instantiate", "model.destroy", "unfreeze"]
        );
        assert!(model.is_pristine());
    }

    #[test]
    fn failed_instantiate_still_unfreezes() {
        let counters = Counters::default();
        let mut model = StubCellModel::new(counters.clone()).failing_instantiate();
        let mut simulator = StubSimulator::succeeding();
        let params: ParamValues = [("g_pas", 1e-4)].into_iter().collect();

        {
            let mut frozen = FrozenModel::freeze(&mut model, &params).unwrap();
            assert!(frozen.instantiate(&mut simulator).is_err());
        }

        assert!(model.is_pristine());
        assert_eq!(counters.unfreeze.load(Ordering::SeqCst), 1);
    }
}
