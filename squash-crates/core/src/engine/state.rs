use log::debug;

use super::propagation_engine::EngineStatistics;
use super::propagation_engine::PropagationEngine;
use super::trigger::Population;
use crate::asserts::print_squash_assert_warning_message;
use crate::asserts::squash_assert_advanced;
use crate::asserts::squash_assert_extreme;
use crate::asserts::squash_assert_simple;
use crate::basic_types::Cause;
use crate::basic_types::Contradiction;
use crate::basic_types::PropagationStatus;
use crate::create_statistics_struct;
use crate::environment::Environment;
use crate::environment::SetKind;
use crate::environment::UndoAction;
use crate::options::SolverOptions;
use crate::propagation::Domains;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorHandle;
use crate::propagation::PropagatorId;
use crate::propagation::PropagatorState;
use crate::statistics::log_statistic;
use crate::statistics::log_statistic_postfix;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::variables::DomainId;
use crate::variables::DomainStore;

create_statistics_struct!(
    /// Counters of the search-facing state.
    StateStatistics {
        /// The number of worlds popped.
        num_backtracks: usize,
        /// The number of calls to [`State::propagate`] which ended in a contradiction.
        num_failures: usize,
});

/// The [`State`] is the container of the variables, their reversible domains and the propagators.
///
/// A search driver makes decisions through the `post_*` functions, calls [`State::propagate`] to
/// reach a fixpoint, and backtracks with [`State::pop`]. After a [`Contradiction`] the state must
/// be popped (or flushed) before it is used again.
#[derive(Debug)]
pub struct State {
    environment: Environment,
    domains: DomainStore,
    engine: PropagationEngine,
    options: SolverOptions,
    statistics: StateStatistics,
}

impl Default for State {
    fn default() -> Self {
        State::new(SolverOptions::default())
    }
}

impl State {
    pub fn new(options: SolverOptions) -> State {
        print_squash_assert_warning_message!();

        State {
            environment: Environment::default(),
            domains: DomainStore::default(),
            engine: PropagationEngine::new(&options),
            options,
            statistics: StateStatistics::default(),
        }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }
}

/// Variables.
impl State {
    /// Creates a variable with domain `[lower_bound, upper_bound]`, backed by the default set kind.
    pub fn new_interval_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.domains.new_interval_domain(
            &mut self.environment,
            self.options.default_set_kind,
            self.options.undo_strategy,
            lower_bound,
            upper_bound,
        )
    }

    /// Creates a variable with the given values, which may contain holes. The default set kind is
    /// used unless it is [`SetKind::Interval`], in which case a bitset is used instead.
    pub fn new_sparse_variable(&mut self, values: Vec<i32>) -> DomainId {
        let kind = match self.options.default_set_kind {
            SetKind::Interval => SetKind::Bitset,
            kind => kind,
        };
        self.new_variable(kind, values)
    }

    /// Creates a variable backed by a set of the given kind.
    pub fn new_variable(&mut self, kind: SetKind, values: Vec<i32>) -> DomainId {
        self.domains.new_domain(
            &mut self.environment,
            kind,
            self.options.undo_strategy,
            values,
        )
    }

    pub fn num_variables(&self) -> usize {
        self.domains.num_domains()
    }

    pub fn lower_bound(&self, var: DomainId) -> i32 {
        self.domains.lower_bound(&self.environment, var)
    }

    pub fn upper_bound(&self, var: DomainId) -> i32 {
        self.domains.upper_bound(&self.environment, var)
    }

    pub fn contains(&self, var: DomainId, value: i32) -> bool {
        self.domains.contains(&self.environment, var, value)
    }

    pub fn is_fixed(&self, var: DomainId) -> bool {
        self.domains.is_fixed(&self.environment, var)
    }

    /// The value of `var` if its domain is a singleton.
    pub fn fixed_value(&self, var: DomainId) -> Option<i32> {
        self.is_fixed(var).then(|| self.lower_bound(var))
    }

    pub fn size(&self, var: DomainId) -> usize {
        self.domains.size(&self.environment, var)
    }

    /// The values in the domain of `var`, in increasing order.
    pub fn values(&self, var: DomainId) -> Vec<i32> {
        self.domains.values(&self.environment, var)
    }

    pub fn domains(&self) -> Domains<'_> {
        Domains::new(&self.environment, &self.domains)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// The environment, for reversible state owned by the search driver.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }
}

/// External decisions. Modifications made here wake up every propagator watching the variable
/// once [`State::propagate`] is called.
impl State {
    pub fn post_remove(&mut self, var: DomainId, value: i32) -> Result<bool, Contradiction> {
        self.domains
            .remove(&mut self.environment, var, value, Cause::External)
            .map_err(|empty_domain| empty_domain.with_cause(Cause::External))
    }

    pub fn post_lower_bound(&mut self, var: DomainId, bound: i32) -> Result<bool, Contradiction> {
        self.domains
            .set_lower_bound(&mut self.environment, var, bound, Cause::External)
            .map_err(|empty_domain| empty_domain.with_cause(Cause::External))
    }

    pub fn post_upper_bound(&mut self, var: DomainId, bound: i32) -> Result<bool, Contradiction> {
        self.domains
            .set_upper_bound(&mut self.environment, var, bound, Cause::External)
            .map_err(|empty_domain| empty_domain.with_cause(Cause::External))
    }

    pub fn post_instantiate(&mut self, var: DomainId, value: i32) -> Result<bool, Contradiction> {
        self.domains
            .instantiate(&mut self.environment, var, value, Cause::External)
            .map_err(|empty_domain| empty_domain.with_cause(Cause::External))
    }
}

/// Worlds.
impl State {
    pub fn get_world_index(&self) -> usize {
        self.environment.get_world_index()
    }

    /// Enters a new world. The state must be at a fixpoint.
    pub fn push(&mut self) {
        squash_assert_simple!(
            self.engine.is_empty(),
            "cannot enter a new world while propagation is pending"
        );
        self.environment.push();
    }

    /// Returns to the previous world, discarding pending propagation and retracting the temporary
    /// propagators posted in the popped world.
    pub fn pop(&mut self) {
        self.engine.flush(&mut self.domains);
        self.environment.pop();

        for action in self.environment.take_undone_actions() {
            match action {
                UndoAction::RetractPropagator(id) => {
                    self.engine.retract(&mut self.environment, id)
                }
            }
        }
        self.engine.release_at_root(&mut self.environment);

        squash_assert_advanced!(self.engine.is_empty());
        self.statistics.num_backtracks += 1;
    }

    /// Pops worlds until `world` is the current one.
    pub fn pop_until(&mut self, world: usize) {
        squash_assert_simple!(
            world <= self.get_world_index(),
            "cannot pop until world {world} from world {}",
            self.get_world_index()
        );
        while self.get_world_index() > world {
            self.pop();
        }
    }
}

/// Propagation.
impl State {
    /// Allows propagation; called by the first [`State::propagate`] if it was not called before.
    pub fn initialize(&mut self) {
        self.engine.initialize();
    }

    /// Runs the propagators to a fixpoint.
    ///
    /// On a [`Contradiction`], the remaining propagation is kept until [`State::flush`] or
    /// [`State::pop`] is called.
    pub fn propagate(&mut self) -> PropagationStatus {
        if !self.engine.is_initialized() {
            self.initialize();
        }

        let result = self
            .engine
            .propagate(&mut self.environment, &mut self.domains);

        if result.is_err() {
            self.statistics.num_failures += 1;
        } else {
            squash_assert_extreme!(!self.domains.has_pending_events());
        }
        result
    }

    /// Discards every pending propagation.
    pub fn flush(&mut self) {
        self.engine.flush(&mut self.domains);
    }

    /// Whether [`State::propagate`] has any work to do.
    pub fn need_to_run(&self) -> bool {
        self.domains.has_pending_events() || self.engine.need_to_run(self.get_world_index())
    }
}

/// Propagators.
impl State {
    /// Adds a propagator which stays in the state forever. It is propagated by the next call to
    /// [`State::propagate`].
    ///
    /// Outside the root world this is the same as a permanent [`State::dynamic_addition`], so the
    /// propagator is propagated again after backtracking.
    pub fn add_propagator<Constructor: PropagatorConstructor>(
        &mut self,
        constructor: Constructor,
    ) -> PropagatorHandle<Constructor::PropagatorImpl> {
        if self.get_world_index() > 0 {
            debug!(
                "adding a propagator at world {} as a permanent one",
                self.get_world_index()
            );
            return self.dynamic_addition(true, constructor);
        }

        self.engine
            .add_propagator(&mut self.environment, &self.domains, constructor)
    }

    /// Adds a propagator during search.
    ///
    /// A permanent propagator stays in the state forever and is propagated again whenever the
    /// search backtracks past the world in which it last ran. A temporary propagator is removed
    /// when the current world is popped.
    pub fn dynamic_addition<Constructor: PropagatorConstructor>(
        &mut self,
        permanent: bool,
        constructor: Constructor,
    ) -> PropagatorHandle<Constructor::PropagatorImpl> {
        self.engine.dynamic_addition(
            &mut self.environment,
            &self.domains,
            permanent,
            constructor,
        )
    }

    /// Removes the given propagators; they are never called again.
    ///
    /// Handles to a deleted propagator stay invalid even when its identifier is given to a
    /// propagator added later.
    pub fn dynamic_deletion(&mut self, propagators: impl IntoIterator<Item = PropagatorId>) {
        self.engine.dynamic_deletion(&mut self.environment, propagators);
    }

    pub fn get_propagator<P: Propagator>(&self, handle: PropagatorHandle<P>) -> Option<&P> {
        self.engine.get_propagator(handle)
    }

    pub fn get_propagator_mut<P: Propagator>(
        &mut self,
        handle: PropagatorHandle<P>,
    ) -> Option<&mut P> {
        self.engine.get_propagator_mut(handle)
    }

    /// The state of the propagator, or `None` if it was removed.
    pub fn propagator_state(&self, id: PropagatorId) -> Option<PropagatorState> {
        self.engine.propagator_state(&self.environment, id)
    }

    /// How the propagator was added, or `None` if it was removed.
    pub fn propagator_population(&self, id: PropagatorId) -> Option<Population> {
        self.engine.population(id)
    }

    pub fn is_propagator_present(&self, id: PropagatorId) -> bool {
        self.engine.is_present(id)
    }

    pub fn num_propagators(&self) -> usize {
        self.engine.num_propagators()
    }
}

/// Statistics.
impl State {
    pub fn statistics(&self) -> &StateStatistics {
        &self.statistics
    }

    pub fn engine_statistics(&self) -> &EngineStatistics {
        self.engine.statistics()
    }

    /// Logs the counters of the environment, the engine and the state. With `verbose`, the
    /// statistics of every propagator are logged as well.
    pub fn log_statistics(&self, verbose: bool) {
        log_statistic("variables", self.domains.num_domains());
        log_statistic("propagators", self.engine.num_propagators());

        self.environment
            .log_statistics(StatisticLogger::new(["environment"]));
        self.engine
            .log_statistics(StatisticLogger::new(["engine"]), verbose);
        self.statistics.log(StatisticLogger::new(["state"]));

        log_statistic_postfix();
    }
}
