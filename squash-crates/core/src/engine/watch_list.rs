use enumset::EnumSet;

use crate::containers::KeyedVec;
use crate::propagation::PropagatorId;
use crate::propagation::PropagatorVarId;
use crate::variables::DomainEvent;
use crate::variables::DomainId;

/// A propagator subscribed to a variable, with the events it reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Watcher {
    pub(crate) propagator_var: PropagatorVarId,
    pub(crate) conditions: EnumSet<DomainEvent>,
}

/// For every variable, the propagators to wake up when its domain changes.
#[derive(Debug, Default)]
pub(crate) struct WatchLists {
    watchers: KeyedVec<DomainId, Vec<Watcher>>,
}

impl WatchLists {
    pub(crate) fn watch(
        &mut self,
        domain: DomainId,
        propagator_var: PropagatorVarId,
        conditions: EnumSet<DomainEvent>,
    ) {
        if conditions.is_empty() {
            return;
        }

        self.watchers.accomodate(domain, vec![]);
        self.watchers[domain].push(Watcher {
            propagator_var,
            conditions,
        });
    }

    pub(crate) fn unwatch(&mut self, domain: DomainId, propagator_var: PropagatorVarId) {
        if let Some(watchers) = self.watchers.get_mut(domain) {
            watchers.retain(|watcher| watcher.propagator_var != propagator_var);
        }
    }

    pub(crate) fn unwatch_propagator(&mut self, domain: DomainId, propagator: PropagatorId) {
        if let Some(watchers) = self.watchers.get_mut(domain) {
            watchers.retain(|watcher| watcher.propagator_var.propagator != propagator);
        }
    }

    pub(crate) fn get(&self, domain: DomainId) -> &[Watcher] {
        self.watchers
            .get(domain)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
