use super::Domains;
use super::LocalId;
use super::Propagator;
use super::PropagatorId;
use super::ReadDomains;
use crate::asserts::squash_assert_simple;
use crate::environment::Environment;
use crate::environment::ReversibleInteger;
use crate::environment::ReversibleSet;
use crate::environment::SetKind;
use crate::environment::UndoStrategy;
use crate::variables::DomainId;
use crate::variables::DomainStore;

/// A propagator constructor creates a fully initialized instance of a [`Propagator`].
///
/// The constructor registers the variables the propagator watches; which events wake the
/// propagator up is decided afterwards through [`Propagator::propagation_conditions`].
pub trait PropagatorConstructor {
    /// The propagator that is produced by this constructor.
    type PropagatorImpl: Propagator;

    /// Create the propagator instance from `Self`.
    fn create(self, context: PropagatorConstructorContext) -> Self::PropagatorImpl;
}

/// The reversible state allocated for one propagator.
#[derive(Clone, Debug, Default)]
pub(crate) struct OwnedState {
    pub(crate) integers: Vec<ReversibleInteger>,
    pub(crate) sets: Vec<ReversibleSet>,
}

impl OwnedState {
    /// Hands everything back to the environment. Only valid once no open world refers to it.
    pub(crate) fn release(self, environment: &mut Environment) {
        for integer in self.integers {
            environment.release_integer(integer);
        }
        for set in self.sets {
            environment.release_set(set);
        }
    }
}

/// The communication point between the solver and a propagator while it is being created.
///
/// Propagators use it to register the variables they watch, to read the current domains and to
/// allocate reversible state.
#[derive(Debug)]
pub struct PropagatorConstructorContext<'a> {
    environment: &'a mut Environment,
    domain_store: &'a DomainStore,
    pub(crate) propagator_id: PropagatorId,
    /// Shared with reborrowed contexts so every registration ends up with the engine.
    registrations: &'a mut Vec<(LocalId, DomainId)>,
    owned: &'a mut OwnedState,
    undo_strategy: UndoStrategy,
}

impl ReadDomains for PropagatorConstructorContext<'_> {
    fn environment(&self) -> &Environment {
        self.environment
    }

    fn domain_store(&self) -> &DomainStore {
        self.domain_store
    }
}

impl<'a> PropagatorConstructorContext<'a> {
    pub(crate) fn new(
        propagator_id: PropagatorId,
        environment: &'a mut Environment,
        domain_store: &'a DomainStore,
        registrations: &'a mut Vec<(LocalId, DomainId)>,
        owned: &'a mut OwnedState,
        undo_strategy: UndoStrategy,
    ) -> Self {
        PropagatorConstructorContext {
            environment,
            domain_store,
            propagator_id,
            registrations,
            owned,
            undo_strategy,
        }
    }

    /// Get domain information.
    pub fn domains(&self) -> Domains<'_> {
        Domains::new(self.environment, self.domain_store)
    }

    /// Subscribes the propagator to `var` under `local_id`.
    ///
    /// Each variable *must* have a unique [`LocalId`]; most often this is the index of the
    /// variable in the internal array of variables.
    pub fn register(&mut self, var: DomainId, local_id: LocalId) {
        squash_assert_simple!(
            self.registrations.iter().all(|&(other, _)| other != local_id),
            "local id {local_id} is registered twice"
        );
        self.registrations.push((local_id, var));
    }

    /// A [`LocalId`] which is guaranteed not to be registered yet.
    pub fn get_next_local_id(&self) -> LocalId {
        self.registrations
            .iter()
            .map(|&(local_id, _)| LocalId::from(local_id.unpack() + 1))
            .max()
            .unwrap_or(LocalId::from(0))
    }

    /// Creates reversible state for the propagator.
    pub fn new_reversible_integer(&mut self, initial_value: i64) -> ReversibleInteger {
        let integer = self.environment.new_integer(initial_value);
        self.owned.integers.push(integer);
        integer
    }

    /// Creates an empty reversible set over the universe `[offset, offset + capacity)`, restored
    /// with the undo strategy of the solver.
    pub fn new_reversible_set(
        &mut self,
        kind: SetKind,
        offset: i32,
        capacity: usize,
    ) -> ReversibleSet {
        let set = self
            .environment
            .new_set_with(kind, self.undo_strategy, offset, capacity, []);
        self.owned.sets.push(set);
        set
    }

    /// Creates a reversible set which initially contains its whole universe
    /// `[offset, offset + capacity)`.
    pub fn new_full_reversible_set(
        &mut self,
        kind: SetKind,
        offset: i32,
        capacity: usize,
    ) -> ReversibleSet {
        let set = self
            .environment
            .new_full_set(kind, self.undo_strategy, offset, capacity);
        self.owned.sets.push(set);
        set
    }

    /// Reborrow the context with a shorter lifetime. Registrations made through the reborrowed
    /// context are visible in `self`.
    pub fn reborrow(&mut self) -> PropagatorConstructorContext<'_> {
        PropagatorConstructorContext {
            environment: self.environment,
            domain_store: self.domain_store,
            propagator_id: self.propagator_id,
            registrations: self.registrations,
            owned: self.owned,
            undo_strategy: self.undo_strategy,
        }
    }
}
