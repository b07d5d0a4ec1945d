use std::mem;

use enumset::EnumSet;
use log::debug;
use log::trace;

use super::propagator_queue::PropagatorQueue;
use super::trigger::Population;
use super::trigger::PropagationTrigger;
use super::watch_list::WatchLists;
use crate::asserts::squash_assert_simple;
use crate::basic_types::Cause;
use crate::basic_types::PropagationStatus;
use crate::basic_types::PropagatorContradiction;
use crate::containers::KeyedVec;
use crate::create_statistics_struct;
use crate::environment::Environment;
use crate::environment::ReversibleInteger;
use crate::environment::UndoStrategy;
use crate::options::SolverOptions;
use crate::propagation::store::PropagatorStore;
use crate::propagation::Domains;
use crate::propagation::EnqueueDecision;
use crate::propagation::Entailment;
use crate::propagation::OwnedState;
use crate::propagation::PropagationContext;
use crate::propagation::PropagationMask;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::propagation::PropagatorHandle;
use crate::propagation::PropagatorId;
use crate::propagation::PropagatorRequests;
use crate::propagation::PropagatorState;
use crate::propagation::PropagatorVarId;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::variables::DomainEvent;
use crate::variables::DomainEventRecord;
use crate::variables::DomainId;
use crate::variables::DomainStore;

create_statistics_struct!(
    /// Counters of the propagation engine.
    EngineStatistics {
        /// The number of times a propagator was called.
        num_propagator_calls: usize,
        /// The number of times propagation ended at a fixpoint.
        num_fixpoints: usize,
        /// The number of times propagation ended with a contradiction.
        num_contradictions: usize,
        num_dynamic_additions: usize,
        num_dynamic_deletions: usize,
});

/// Runs propagators until none of them can remove a value, or one of them reports a
/// contradiction.
///
/// A propagator is scheduled when an event it subscribed to happens on one of the variables in its
/// scope, except when the propagator caused the event itself. Which propagators have to run
/// independently of events is decided by the [`PropagationTrigger`].
#[derive(Debug)]
pub(crate) struct PropagationEngine {
    store: PropagatorStore,
    queue: PropagatorQueue,
    watch_lists: WatchLists,
    /// The variables of every propagator, indexed by their [`LocalId`](crate::propagation::LocalId).
    scopes: KeyedVec<PropagatorId, Vec<Option<DomainId>>>,
    /// The reversible [`PropagatorState`] of every propagator.
    states: KeyedVec<PropagatorId, ReversibleInteger>,
    /// The reversible state allocated by every propagator, including its [`PropagatorState`].
    owned_state: KeyedVec<PropagatorId, OwnedState>,
    /// Whether popping the world a propagator was added in retracts it.
    retracted_on_pop: KeyedVec<PropagatorId, bool>,
    /// Deleted propagators whose identifier is freed once their world is popped.
    awaiting_retraction: Vec<PropagatorId>,
    /// Deleted propagators whose identifier is freed once the search is back at the root.
    awaiting_root: Vec<PropagatorId>,
    undo_strategy: UndoStrategy,
    trigger: PropagationTrigger,
    /// The propagator which reported the last contradiction, until the engine is flushed.
    in_flight: Option<PropagatorId>,
    is_initialized: bool,
    check_entailment_at_fixpoint: bool,
    event_buffer: Vec<DomainEventRecord>,
    statistics: EngineStatistics,
}

impl PropagationEngine {
    pub(crate) fn new(options: &SolverOptions) -> PropagationEngine {
        PropagationEngine {
            store: PropagatorStore::default(),
            queue: PropagatorQueue::new(options.queue_order, options.random_seed),
            watch_lists: WatchLists::default(),
            scopes: KeyedVec::default(),
            states: KeyedVec::default(),
            owned_state: KeyedVec::default(),
            retracted_on_pop: KeyedVec::default(),
            awaiting_retraction: vec![],
            awaiting_root: vec![],
            undo_strategy: options.undo_strategy,
            trigger: PropagationTrigger::default(),
            in_flight: None,
            is_initialized: false,
            check_entailment_at_fixpoint: options.check_entailment_at_fixpoint,
            event_buffer: vec![],
            statistics: EngineStatistics::default(),
        }
    }

    /// Creates the propagator and subscribes it to the variables it registered.
    fn post<Constructor: PropagatorConstructor>(
        &mut self,
        environment: &mut Environment,
        domains: &DomainStore,
        retracted_on_pop: bool,
        constructor: Constructor,
    ) -> PropagatorHandle<Constructor::PropagatorImpl> {
        let slot = self.store.new_propagator::<Constructor::PropagatorImpl>();
        let handle = slot.key();
        let id = handle.id();

        let mut registrations = vec![];
        let mut owned = OwnedState::default();
        let propagator = constructor.create(PropagatorConstructorContext::new(
            id,
            environment,
            domains,
            &mut registrations,
            &mut owned,
            self.undo_strategy,
        ));

        let scope_len = registrations
            .iter()
            .map(|&(local_id, _)| local_id.unpack() as usize + 1)
            .max()
            .unwrap_or(0);
        let mut scope = vec![None; scope_len];
        for &(local_id, domain) in registrations.iter() {
            scope[local_id.unpack() as usize] = Some(domain);
            self.watch_lists.watch(
                domain,
                PropagatorVarId {
                    propagator: id,
                    variable: local_id,
                },
                propagator.propagation_conditions(local_id).events(),
            );
        }

        let state = environment.new_integer(PropagatorState::StateLess.to_integer());
        owned.integers.push(state);

        insert_at(&mut self.scopes, id, scope);
        insert_at(&mut self.states, id, state);
        insert_at(&mut self.owned_state, id, owned);
        insert_at(&mut self.retracted_on_pop, id, retracted_on_pop);

        trace!("posted {} as {id}", propagator.name());
        slot.populate(Box::new(propagator))
    }

    /// Adds a propagator before search. It is propagated by the next call to
    /// [`PropagationEngine::propagate`].
    pub(crate) fn add_propagator<Constructor: PropagatorConstructor>(
        &mut self,
        environment: &mut Environment,
        domains: &DomainStore,
        constructor: Constructor,
    ) -> PropagatorHandle<Constructor::PropagatorImpl> {
        let handle = self.post(environment, domains, false, constructor);
        self.trigger.add_all([handle.id()]);
        handle
    }

    /// Adds a propagator during search and schedules it immediately. A temporary propagator is
    /// retracted when the current world is popped; a permanent one stays and is propagated again
    /// after backtracking past the world it last ran in.
    pub(crate) fn dynamic_addition<Constructor: PropagatorConstructor>(
        &mut self,
        environment: &mut Environment,
        domains: &DomainStore,
        permanent: bool,
        constructor: Constructor,
    ) -> PropagatorHandle<Constructor::PropagatorImpl> {
        // Retractions registered at the root are never undone.
        let retracted_on_pop = !permanent && environment.get_world_index() > 0;
        let handle = self.post(environment, domains, retracted_on_pop, constructor);
        let id = handle.id();
        self.trigger.dyn_add(id, permanent, environment);

        if let Some(propagator) = self.store.get(id) {
            self.queue
                .enqueue(id, propagator.priority(), PropagationMask::Full);
        }

        self.statistics.num_dynamic_additions += 1;
        debug!(
            "added {} propagator {id} at world {}",
            if permanent { "permanent" } else { "temporary" },
            environment.get_world_index()
        );
        handle
    }

    /// Removes propagators for good, whatever their population.
    ///
    /// The identifiers and reversible state of the deleted propagators are reused once no open
    /// world refers to them anymore.
    pub(crate) fn dynamic_deletion(
        &mut self,
        environment: &mut Environment,
        propagators: impl IntoIterator<Item = PropagatorId>,
    ) {
        for id in propagators {
            if self.remove_propagator(id) {
                if self.retracted_on_pop[id] {
                    self.awaiting_retraction.push(id);
                } else {
                    self.awaiting_root.push(id);
                }
                self.statistics.num_dynamic_deletions += 1;
                debug!("deleted propagator {id}");
            }
        }

        self.release_at_root(environment);
    }

    /// Removes a temporary propagator whose world was popped.
    pub(crate) fn retract(&mut self, environment: &mut Environment, id: PropagatorId) {
        if self.remove_propagator(id) {
            debug!("retracted temporary propagator {id}");
        } else {
            let Some(position) = self.awaiting_retraction.iter().position(|&other| other == id)
            else {
                return;
            };
            let _ = self.awaiting_retraction.swap_remove(position);
        }

        self.release(environment, id);
    }

    /// Releases the deleted propagators which waited for the search to return to the root.
    pub(crate) fn release_at_root(&mut self, environment: &mut Environment) {
        if environment.get_world_index() > 0 {
            return;
        }

        for id in mem::take(&mut self.awaiting_root) {
            self.release(environment, id);
        }
    }

    fn release(&mut self, environment: &mut Environment, id: PropagatorId) {
        mem::take(&mut self.owned_state[id]).release(environment);
        self.store.free(id);
        trace!("released {id}");
    }

    fn remove_propagator(&mut self, id: PropagatorId) -> bool {
        if self.store.remove(id).is_none() {
            return false;
        }

        for domain in self.scopes[id].drain(..).flatten() {
            self.watch_lists.unwatch_propagator(domain, id);
        }
        self.queue.remove(id);
        self.trigger.remove(id);
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }
        true
    }

    /// Marks the engine as ready; propagation before initialisation is a programming error.
    pub(crate) fn initialize(&mut self) {
        self.is_initialized = true;
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Runs propagators until the queue is empty.
    ///
    /// On a contradiction the queue is left as it is: the engine needs to be flushed before it can
    /// propagate again.
    pub(crate) fn propagate(
        &mut self,
        environment: &mut Environment,
        domains: &mut DomainStore,
    ) -> PropagationStatus {
        squash_assert_simple!(self.is_initialized, "the engine must be initialised first");
        squash_assert_simple!(
            self.in_flight.is_none(),
            "the engine must be flushed after a contradiction"
        );

        let PropagationEngine {
            store,
            queue,
            trigger,
            ..
        } = self;
        trigger.propagate(environment.get_world_index(), |id| {
            if let Some(propagator) = store.get(id) {
                queue.enqueue(id, propagator.priority(), PropagationMask::Full);
            }
        });

        self.process_events(environment, domains);

        while let Some((id, mask)) = self.queue.pop() {
            self.execute(environment, domains, id, mask)?;
        }

        if self.check_entailment_at_fixpoint {
            self.check_entailment(environment, domains)?;
        }

        self.statistics.num_fixpoints += 1;
        trace!("fixpoint reached at world {}", environment.get_world_index());
        Ok(())
    }

    fn execute(
        &mut self,
        environment: &mut Environment,
        domains: &mut DomainStore,
        id: PropagatorId,
        mask: PropagationMask,
    ) -> PropagationStatus {
        let Some(propagator) = self.store.get_mut(id) else {
            return Ok(());
        };

        let state = self.states[id];
        let mask = match PropagatorState::from_integer(environment.read(state)) {
            PropagatorState::Passive => return Ok(()),
            PropagatorState::StateLess => {
                let _ = environment.assign(state, PropagatorState::Active.to_integer());
                PropagationMask::Full
            }
            PropagatorState::Active => mask,
        };

        self.in_flight = Some(id);
        self.statistics.num_propagator_calls += 1;

        let mut requests = PropagatorRequests::default();
        let context = PropagationContext::new(
            environment,
            domains,
            id,
            &self.scopes[id],
            &mut requests,
        );

        if let Err(contradiction) = propagator.propagate(context, mask) {
            self.statistics.num_contradictions += 1;
            debug!("{contradiction}");
            return Err(contradiction);
        }

        self.in_flight = None;
        self.apply_requests(environment, id, requests);
        self.process_events(environment, domains);
        Ok(())
    }

    fn apply_requests(
        &mut self,
        environment: &mut Environment,
        id: PropagatorId,
        requests: PropagatorRequests,
    ) {
        let Some(propagator) = self.store.get(id) else {
            return;
        };

        for (local_id, domain) in requests.added_to_scope {
            let scope = &mut self.scopes[id];
            let index = local_id.unpack() as usize;
            if scope.len() <= index {
                scope.resize(index + 1, None);
            }
            scope[index] = Some(domain);

            self.watch_lists.watch(
                domain,
                PropagatorVarId {
                    propagator: id,
                    variable: local_id,
                },
                propagator.propagation_conditions(local_id).events(),
            );
        }

        for local_id in requests.removed_from_scope {
            let removed = self.scopes[id]
                .get_mut(local_id.unpack() as usize)
                .and_then(Option::take);
            if let Some(domain) = removed {
                self.watch_lists.unwatch(
                    domain,
                    PropagatorVarId {
                        propagator: id,
                        variable: local_id,
                    },
                );
            }
        }

        if requests.set_passive {
            let _ = environment.assign(self.states[id], PropagatorState::Passive.to_integer());
            trace!("{id} became passive at world {}", environment.get_world_index());
        } else if let Some(forced) = requests.forced {
            self.queue.enqueue(
                id,
                propagator.priority(),
                PropagationMask::Incremental(forced),
            );
        }
    }

    /// Schedules the watchers of every recorded domain modification.
    fn process_events(&mut self, environment: &Environment, domains: &mut DomainStore) {
        let mut buffer = mem::take(&mut self.event_buffer);
        domains.take_events(&mut buffer);

        for record in buffer.drain(..) {
            self.on_variable_update(
                environment,
                domains,
                record.domain,
                record.events,
                record.cause,
            );
        }

        self.event_buffer = buffer;
    }

    /// Schedules the propagators watching `domain` for any of `events`, except the one which
    /// caused them.
    fn on_variable_update(
        &mut self,
        environment: &Environment,
        domains: &DomainStore,
        domain: DomainId,
        events: EnumSet<DomainEvent>,
        cause: Cause,
    ) {
        for watcher in self.watch_lists.get(domain) {
            let id = watcher.propagator_var.propagator;
            if cause == Cause::Propagator(id) {
                continue;
            }

            let relevant = watcher.conditions & events;
            if relevant.is_empty() {
                continue;
            }

            let Some(propagator) = self.store.get_mut(id) else {
                continue;
            };
            if PropagatorState::from_integer(environment.read(self.states[id]))
                == PropagatorState::Passive
            {
                continue;
            }

            if propagator.reacts_to_fine_events()
                && propagator.notify(
                    Domains::new(environment, domains),
                    watcher.propagator_var.variable,
                    relevant,
                ) == EnqueueDecision::Skip
            {
                continue;
            }

            self.queue.enqueue(
                id,
                propagator.priority(),
                PropagationMask::Incremental(relevant),
            );
        }
    }

    fn check_entailment(
        &mut self,
        environment: &Environment,
        domains: &DomainStore,
    ) -> PropagationStatus {
        for (id, propagator) in self.store.iter_propagators() {
            if PropagatorState::from_integer(environment.read(self.states[id]))
                == PropagatorState::Passive
            {
                continue;
            }

            if propagator.is_entailed(Domains::new(environment, domains)) == Entailment::False {
                self.statistics.num_contradictions += 1;
                let contradiction = PropagatorContradiction {
                    propagator: id,
                    domain: None,
                    message: format!("{} is violated at the fixpoint", propagator.name()),
                };
                debug!("{contradiction}");
                return Err(contradiction.into());
            }
        }

        Ok(())
    }

    /// Discards every pending propagation, including the events which were not processed yet.
    pub(crate) fn flush(&mut self, domains: &mut DomainStore) {
        self.queue.clear();
        self.in_flight = None;
        domains.clear_events();
    }

    /// Whether no propagator is scheduled or in the middle of a failed call.
    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_none()
    }

    pub(crate) fn need_to_run(&self, world: usize) -> bool {
        !self.is_empty() || self.trigger.need_to_run(world)
    }

    pub(crate) fn propagator_state(
        &self,
        environment: &Environment,
        id: PropagatorId,
    ) -> Option<PropagatorState> {
        self.store
            .is_present(id)
            .then(|| PropagatorState::from_integer(environment.read(self.states[id])))
    }

    pub(crate) fn population(&self, id: PropagatorId) -> Option<Population> {
        self.trigger.population(id)
    }

    pub(crate) fn get_propagator<P: Propagator>(&self, handle: PropagatorHandle<P>) -> Option<&P> {
        self.store.get_propagator(handle)
    }

    pub(crate) fn get_propagator_mut<P: Propagator>(
        &mut self,
        handle: PropagatorHandle<P>,
    ) -> Option<&mut P> {
        self.store.get_propagator_mut(handle)
    }

    pub(crate) fn is_present(&self, id: PropagatorId) -> bool {
        self.store.is_present(id)
    }

    pub(crate) fn num_propagators(&self) -> usize {
        self.store.num_propagators()
    }
    pub(crate) fn statistics(&self) -> &EngineStatistics {
        &self.statistics
    }

    pub(crate) fn log_statistics(&self, statistic_logger: StatisticLogger, verbose: bool) {
        self.statistics.log(statistic_logger);

        if verbose {
            for (id, propagator) in self.store.iter_propagators() {
                propagator.log_statistics(StatisticLogger::new([
                    propagator.name(),
                    "number",
                    id.0.to_string().as_str(),
                ]));
            }
        }
    }
}

/// Stores `value` for `id`, which is either a reused identifier or the next new one.
fn insert_at<Value: Clone>(
    values: &mut KeyedVec<PropagatorId, Value>,
    id: PropagatorId,
    value: Value,
) {
    values.accomodate(id, value.clone());
    values[id] = value;
}
