//! Contains the main building blocks for propagators.
//!
//! A propagator takes a set of variables with their domains and removes the values which cannot
//! be part of any solution of its constraint. It is at fixpoint when applying it removes nothing;
//! it is idempotent if a single call always leaves it at fixpoint. Propagators are not required to
//! be idempotent.
//!
//! # Practical
//!
//! A propagator implements [`Propagator`] and is created by a [`PropagatorConstructor`], which
//! registers the variables the propagator watches through the [`PropagatorConstructorContext`].
//! Once created, the engine asks [`Propagator::propagation_conditions`] for every registered
//! variable and only wakes the propagator for those events.
//!
//! While propagating, a propagator reads and modifies domains through the
//! [`PropagationContext`]. It can report a [`Contradiction`](crate::Contradiction), turn itself
//! passive, request to be called again, or change its scope.
//!
//! See the [`propagators`](crate::propagators) module for concrete propagators.
mod constructor;
mod contexts;
mod local_id;
mod propagator;
mod propagator_id;
mod propagator_var_id;
pub(crate) mod store;

pub use constructor::*;
pub(crate) use constructor::OwnedState;
pub use contexts::Domains;
pub use contexts::PropagationContext;
pub(crate) use contexts::PropagatorRequests;
pub use contexts::ReadDomains;
pub use local_id::LocalId;
pub use propagator::*;
pub use propagator_id::PropagatorId;
pub(crate) use propagator_var_id::PropagatorVarId;
pub use store::PropagatorHandle;

pub use crate::variables::DomainEvent;
pub use crate::variables::DomainEvents;
