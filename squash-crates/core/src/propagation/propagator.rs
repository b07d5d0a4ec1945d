use downcast_rs::impl_downcast;
use downcast_rs::Downcast;
use enumset::EnumSet;

use super::Domains;
use super::LocalId;
use super::PropagationContext;
use crate::basic_types::PropagationStatus;
#[cfg(doc)]
use crate::create_statistics_struct;
#[cfg(doc)]
use crate::propagation::PropagatorConstructorContext;
use crate::statistics::StatisticLogger;
use crate::variables::DomainEvent;
use crate::variables::DomainEvents;

// Allows retrieving the concrete propagator from a `Box<dyn Propagator>`.
impl_downcast!(Propagator);

/// A propagator removes values from domains which cannot be part of any solution of its
/// constraint, or reports a [`Contradiction`](crate::Contradiction).
///
/// The required functions are [`Propagator::name`], [`Propagator::propagate`] and
/// [`Propagator::is_entailed`]; the others have default implementations.
///
/// The engine never calls a propagator for the modifications it made itself during the same call.
/// A propagator which is not idempotent can ask to be called again through
/// [`PropagationContext::force_propagate`].
pub trait Propagator: Downcast {
    /// Return the name of the propagator, used for printing and statistics.
    fn name(&self) -> &str;

    /// The priority tier of the propagator; cheaper propagators should use lower tiers.
    fn priority(&self) -> Priority {
        Priority::VerySlow
    }

    /// The events on the variable registered under `local_id` which should wake up the
    /// propagator. Events outside of this set never cause the propagator to be scheduled.
    ///
    /// Asked once for every variable registered through
    /// [`PropagatorConstructorContext::register`] and for every variable added with
    /// [`PropagationContext::add_to_scope`].
    fn propagation_conditions(&self, _local_id: LocalId) -> DomainEvents {
        DomainEvents::ANY_INT
    }

    /// Removes inconsistent values. On the first call after the propagator was posted (or after a
    /// backtrack below the world it first ran in) `mask` is [`PropagationMask::Full`]; afterwards
    /// it is the union of the events which woke the propagator since its previous call.
    fn propagate(&mut self, context: PropagationContext, mask: PropagationMask)
        -> PropagationStatus;

    /// Whether the constraint holds for every, some or no completion of the current domains.
    fn is_entailed(&self, domains: Domains) -> Entailment;

    /// If true, [`Propagator::notify`] is called for every relevant event before the propagator
    /// is scheduled.
    fn reacts_to_fine_events(&self) -> bool {
        false
    }

    /// Decides whether an event on the variable `local_id` should schedule the propagator. Only
    /// called when [`Propagator::reacts_to_fine_events`] returns true.
    ///
    /// This should be cheap; expensive work belongs in [`Propagator::propagate`].
    fn notify(
        &mut self,
        _domains: Domains,
        _local_id: LocalId,
        _events: EnumSet<DomainEvent>,
    ) -> EnqueueDecision {
        EnqueueDecision::Enqueue
    }

    /// Logs statistics of the propagator using the provided [`StatisticLogger`].
    ///
    /// It is recommended to create a struct through the [`create_statistics_struct!`] macro.
    fn log_statistics(&self, _statistic_logger: StatisticLogger) {}
}

/// Indicator of what to do when a propagator is notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueDecision {
    /// The propagator should be enqueued.
    Enqueue,
    /// The propagator should not be enqueued.
    Skip,
}

/// The truth value of a constraint given the current domains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entailment {
    /// Satisfied by every completion of the domains.
    True,
    /// Satisfied by no completion of the domains.
    False,
    Undefined,
}

/// What a propagator is asked to do when it is called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagationMask {
    /// Propagate without relying on incremental information.
    Full,
    /// The events which happened since the previous call.
    Incremental(EnumSet<DomainEvent>),
}

impl PropagationMask {
    /// Combines two pending requests for the same propagator.
    pub fn merge(self, other: PropagationMask) -> PropagationMask {
        match (self, other) {
            (PropagationMask::Incremental(left), PropagationMask::Incremental(right)) => {
                PropagationMask::Incremental(left | right)
            }
            _ => PropagationMask::Full,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, PropagationMask::Full)
    }

    /// The events covered by this mask; [`PropagationMask::Full`] covers all of them.
    pub fn events(&self) -> EnumSet<DomainEvent> {
        match self {
            PropagationMask::Full => EnumSet::all(),
            PropagationMask::Incremental(events) => *events,
        }
    }
}

/// The lifecycle of a posted propagator.
///
/// The state is kept in a reversible integer, so a propagator becomes active again when the
/// search backtracks above the world in which it turned passive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropagatorState {
    /// Never called yet; the next call propagates fully.
    StateLess,
    /// Called at least once and reacting to events.
    Active,
    /// Entailed or otherwise done; ignores events.
    Passive,
}

impl PropagatorState {
    pub(crate) fn to_integer(self) -> i64 {
        match self {
            PropagatorState::StateLess => 0,
            PropagatorState::Active => 1,
            PropagatorState::Passive => 2,
        }
    }

    pub(crate) fn from_integer(value: i64) -> PropagatorState {
        match value {
            0 => PropagatorState::StateLess,
            1 => PropagatorState::Active,
            _ => PropagatorState::Passive,
        }
    }
}

/// The priority of a propagator, used for determining the order in which propagators will be
/// called.
///
/// Propagators in a lower tier are called before propagators in a higher tier. The order within a
/// tier is unspecified; the fixpoint does not depend on it.
#[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    Unary = 0,
    Binary = 1,
    Ternary = 2,
    Linear = 3,
    Quadratic = 4,
    Cubic = 5,
    #[default]
    VerySlow = 6,
}

impl Priority {
    pub(crate) const NUM_TIERS: usize = 7;

    pub(crate) fn tier(self) -> usize {
        self as usize
    }
}
