use std::fmt::Debug;
use std::marker::PhantomData;

use super::Propagator;
use super::PropagatorId;
use crate::asserts::squash_assert_moderate;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;

/// A central store for propagators.
///
/// Removing a propagator leaves an empty slot behind. The engine hands the slot back with
/// [`PropagatorStore::free`] once nothing refers to the identifier anymore, after which it is
/// reused. Every removal bumps the generation of the slot, so handles to a removed propagator never
/// resolve to the propagator which later takes its place.
#[derive(Default)]
pub(crate) struct PropagatorStore {
    propagators: KeyedVec<PropagatorId, Option<Box<dyn Propagator>>>,
    generations: KeyedVec<PropagatorId, u32>,
    free_ids: Vec<PropagatorId>,
}

/// A typed wrapper around a [`PropagatorId`] that allows retrieving the concrete propagator.
///
/// A handle only resolves to the propagator it was created for, even when the identifier is reused
/// after that propagator was removed.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PropagatorHandle<P> {
    id: PropagatorId,
    generation: u32,
    propagator: PhantomData<P>,
}

impl<P> PropagatorHandle<P> {
    /// Get a type-erased handle to the propagator.
    pub fn id(&self) -> PropagatorId {
        self.id
    }
}

impl<P> Clone for PropagatorHandle<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for PropagatorHandle<P> {}

impl PropagatorStore {
    /// The number of propagators which have not been removed.
    pub(crate) fn num_propagators(&self) -> usize {
        self.propagators.iter().flatten().count()
    }

    /// The number of slots, including the empty ones.
    #[cfg(test)]
    pub(crate) fn num_slots(&self) -> usize {
        self.propagators.len()
    }

    pub(crate) fn iter_propagators(
        &self,
    ) -> impl Iterator<Item = (PropagatorId, &dyn Propagator)> + '_ {
        self.propagators
            .keys()
            .zip(self.propagators.iter())
            .filter_map(|(id, propagator)| propagator.as_deref().map(|propagator| (id, propagator)))
    }

    /// Reserves a slot for a new propagator, reusing a freed one if there is any.
    pub(crate) fn new_propagator<P>(&mut self) -> NewPropagator<'_, P> {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => {
                let _ = self.generations.push(0);
                self.propagators.push(None)
            }
        };

        NewPropagator {
            store: self,
            id,
            propagator: PhantomData,
        }
    }

    pub(crate) fn is_present(&self, id: PropagatorId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn get(&self, id: PropagatorId) -> Option<&dyn Propagator> {
        self.propagators.get(id).and_then(|propagator| propagator.as_deref())
    }

    pub(crate) fn get_mut(&mut self, id: PropagatorId) -> Option<&mut (dyn Propagator + 'static)> {
        self.propagators
            .get_mut(id)
            .and_then(|propagator| propagator.as_deref_mut())
    }

    /// Removes the propagator, returning it if it was present. Handles to it no longer resolve.
    pub(crate) fn remove(&mut self, id: PropagatorId) -> Option<Box<dyn Propagator>> {
        let removed = self.propagators.get_mut(id).and_then(Option::take)?;
        self.generations[id] = self.generations[id].wrapping_add(1);
        Some(removed)
    }

    /// Allows the slot of a removed propagator to be reused.
    pub(crate) fn free(&mut self, id: PropagatorId) {
        squash_assert_moderate!(
            !self.is_present(id) && !self.free_ids.contains(&id),
            "{id} is freed while in use"
        );
        self.free_ids.push(id);
    }

    fn resolve<P>(&self, handle: PropagatorHandle<P>) -> Option<PropagatorId> {
        (self.generations.get(handle.id) == Some(&handle.generation)).then_some(handle.id)
    }

    /// Get a reference to the propagator identified by the given handle, if it was not removed.
    pub(crate) fn get_propagator<P: Propagator>(&self, handle: PropagatorHandle<P>) -> Option<&P> {
        self.get(self.resolve(handle)?)?.downcast_ref()
    }

    /// Get an exclusive reference to the propagator identified by the given handle.
    pub(crate) fn get_propagator_mut<P: Propagator>(
        &mut self,
        handle: PropagatorHandle<P>,
    ) -> Option<&mut P> {
        let id = self.resolve(handle)?;
        self.get_mut(id)?.downcast_mut()
    }
}

/// A reserved slot for a propagator which still has to be created.
pub(crate) struct NewPropagator<'a, P> {
    store: &'a mut PropagatorStore,
    id: PropagatorId,
    propagator: PhantomData<P>,
}

impl<P> NewPropagator<'_, P> {
    /// The handle corresponding to this slot.
    pub(crate) fn key(&self) -> PropagatorHandle<P> {
        PropagatorHandle {
            id: self.id,
            generation: self.store.generations[self.id],
            propagator: PhantomData,
        }
    }

    /// Put a propagator into the slot.
    pub(crate) fn populate(self, propagator: Box<dyn Propagator>) -> PropagatorHandle<P> {
        let handle = self.key();
        self.store.propagators[self.id] = Some(propagator);
        handle
    }
}

impl Debug for PropagatorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.propagators
                    .iter()
                    .map(|propagator| propagator.as_ref().map(|propagator| propagator.name())),
            )
            .finish()
    }
}
