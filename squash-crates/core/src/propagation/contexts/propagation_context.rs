use enumset::EnumSet;

use super::Domains;
use super::ReadDomains;
use crate::basic_types::Cause;
use crate::basic_types::Contradiction;
use crate::basic_types::PropagatorContradiction;
use crate::containers::StorageKey;
use crate::environment::Environment;
use crate::environment::ReversibleInteger;
use crate::environment::ReversibleSet;
#[cfg(doc)]
use crate::propagation::Propagator;
use crate::propagation::LocalId;
use crate::propagation::PropagatorId;
use crate::variables::DomainEvent;
use crate::variables::DomainEvents;
use crate::variables::DomainId;
use crate::variables::DomainStore;

/// Requests a propagator made during a call, applied by the engine once the call returns.
#[derive(Debug, Default)]
pub(crate) struct PropagatorRequests {
    pub(crate) set_passive: bool,
    pub(crate) forced: Option<EnumSet<DomainEvent>>,
    pub(crate) added_to_scope: Vec<(LocalId, DomainId)>,
    pub(crate) removed_from_scope: Vec<LocalId>,
}

/// Provides information about the state of the solver to a propagator, and is the only way for a
/// propagator to modify domains.
///
/// Domains can be read through the implementation of [`ReadDomains`]. Every modification is
/// attributed to the running propagator, which is therefore not woken up by it.
#[derive(Debug)]
pub struct PropagationContext<'a> {
    pub(crate) environment: &'a mut Environment,
    pub(crate) domain_store: &'a mut DomainStore,
    pub(crate) propagator_id: PropagatorId,
    /// The scope as it was when the call started; updates are applied once the call succeeds.
    scope: &'a [Option<DomainId>],
    requests: &'a mut PropagatorRequests,
}

impl ReadDomains for PropagationContext<'_> {
    fn environment(&self) -> &Environment {
        self.environment
    }

    fn domain_store(&self) -> &DomainStore {
        self.domain_store
    }
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(
        environment: &'a mut Environment,
        domain_store: &'a mut DomainStore,
        propagator_id: PropagatorId,
        scope: &'a [Option<DomainId>],
        requests: &'a mut PropagatorRequests,
    ) -> Self {
        PropagationContext {
            environment,
            domain_store,
            propagator_id,
            scope,
            requests,
        }
    }

    /// Get the current domains.
    pub fn domains(&self) -> Domains<'_> {
        Domains::new(self.environment, self.domain_store)
    }

    pub fn propagator_id(&self) -> PropagatorId {
        self.propagator_id
    }

    /// Reborrow the context with a shorter lifetime, e.g. to hand it to a wrapped propagator.
    pub fn reborrow(&mut self) -> PropagationContext<'_> {
        PropagationContext {
            environment: self.environment,
            domain_store: self.domain_store,
            propagator_id: self.propagator_id,
            scope: self.scope,
            requests: self.requests,
        }
    }

    fn cause(&self) -> Cause {
        Cause::Propagator(self.propagator_id)
    }

    /// Removes `value` from the domain of `var`. Returns whether the domain changed.
    pub fn remove(&mut self, var: DomainId, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domain_store
            .remove(self.environment, var, value, cause)
            .map_err(|empty_domain| empty_domain.with_cause(cause))
    }

    /// Removes every value below `bound` from the domain of `var`.
    pub fn set_lower_bound(&mut self, var: DomainId, bound: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domain_store
            .set_lower_bound(self.environment, var, bound, cause)
            .map_err(|empty_domain| empty_domain.with_cause(cause))
    }

    /// Removes every value above `bound` from the domain of `var`.
    pub fn set_upper_bound(&mut self, var: DomainId, bound: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domain_store
            .set_upper_bound(self.environment, var, bound, cause)
            .map_err(|empty_domain| empty_domain.with_cause(cause))
    }

    /// Reduces the domain of `var` to `value`.
    pub fn instantiate(&mut self, var: DomainId, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domain_store
            .instantiate(self.environment, var, value, cause)
            .map_err(|empty_domain| empty_domain.with_cause(cause))
    }

    /// Builds the contradiction this propagator reports when its constraint cannot be satisfied.
    /// The message is only used for diagnostics.
    pub fn fail(&self, domain: Option<DomainId>, message: impl Into<String>) -> Contradiction {
        PropagatorContradiction {
            propagator: self.propagator_id,
            domain,
            message: message.into(),
        }
        .into()
    }

    /// Stops the propagator from reacting to events until the search backtracks above the current
    /// world.
    pub fn set_passive(&mut self) {
        self.requests.set_passive = true;
    }

    /// Schedules the propagator again with the given events once this call returns.
    pub fn force_propagate(&mut self, events: DomainEvents) {
        let forced = self.requests.forced.get_or_insert_with(EnumSet::empty);
        *forced |= events.events();
    }

    /// Writes a reversible integer owned by the propagator.
    pub fn assign_integer(&mut self, integer: ReversibleInteger, value: i64) -> bool {
        self.environment.assign(integer, value)
    }

    /// Adds `value` to a reversible set owned by the propagator. Returns whether the set changed.
    pub fn add_to_set(&mut self, set: ReversibleSet, value: i32) -> bool {
        self.environment.add_to_set(set, value)
    }

    /// Removes `value` from a reversible set owned by the propagator. Returns whether the set
    /// changed.
    ///
    /// A cursor which returned `value` last must be told with
    /// [`ReadDomains::notify_removed_from_set`].
    pub fn remove_from_set(&mut self, set: ReversibleSet, value: i32) -> bool {
        self.environment.remove_from_set(set, value)
    }

    /// Removes every member of a reversible set owned by the propagator.
    pub fn clear_set(&mut self, set: ReversibleSet) -> bool {
        self.environment.clear_set(set)
    }

    /// Adds `var` to the scope of the propagator once this call returns successfully. It is then
    /// subscribed to the events given by [`Propagator::propagation_conditions`] for the returned
    /// [`LocalId`].
    ///
    /// Scope updates are not undone on backtrack.
    pub fn add_to_scope(&mut self, var: DomainId) -> LocalId {
        let local_id =
            LocalId::create_from_index(self.scope.len() + self.requests.added_to_scope.len());
        self.requests.added_to_scope.push((local_id, var));
        local_id
    }

    /// Removes the variable registered under `local_id` from the scope once this call returns
    /// successfully. Returns the removed variable, if there was one.
    pub fn remove_from_scope(&mut self, local_id: LocalId) -> Option<DomainId> {
        if self.requests.removed_from_scope.contains(&local_id) {
            return None;
        }

        let var = self
            .scope
            .get(local_id.index())
            .copied()
            .flatten()
            .or_else(|| {
                self.requests
                    .added_to_scope
                    .iter()
                    .find(|&&(added, _)| added == local_id)
                    .map(|&(_, var)| var)
            })?;
        self.requests.removed_from_scope.push(local_id);
        Some(var)
    }
}
