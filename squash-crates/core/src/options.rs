//! Configuration of the solver state, passed explicitly to
//! [`State::new`](crate::state::State::new).
use crate::environment::SetKind;
use crate::environment::UndoStrategy;

/// The order in which propagators of the same priority tier are taken from the queue.
///
/// The fixpoint reached does not depend on it; only the number of propagator calls does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum QueueOrder {
    /// First scheduled, first called.
    #[default]
    Fifo,
    /// Uniformly at random, reproducible through [`SolverOptions::random_seed`].
    Random,
}

/// Options which determine how the solver state behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverOptions {
    /// The set representation of domains created without an explicit kind.
    pub default_set_kind: SetKind,
    /// How the sets backing the domains are restored on backtrack.
    pub undo_strategy: UndoStrategy,
    pub queue_order: QueueOrder,
    /// The seed of the random generator used by [`QueueOrder::Random`].
    pub random_seed: u64,
    /// After every fixpoint, ask every non-passive propagator whether its constraint is violated.
    pub check_entailment_at_fixpoint: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            default_set_kind: SetKind::default(),
            undo_strategy: UndoStrategy::default(),
            queue_order: QueueOrder::default(),
            random_seed: 42,
            check_entailment_at_fixpoint: false,
        }
    }
}
