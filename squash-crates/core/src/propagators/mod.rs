//! Propagators over integer variables.
//!
//! Each propagator comes with an `*Args` struct implementing
//! [`PropagatorConstructor`](crate::propagation::PropagatorConstructor), which is what gets posted
//! to the [`State`](crate::state::State).
mod less_or_equal;
mod not_equal;
mod reified;

pub use less_or_equal::*;
pub use not_equal::*;
pub use reified::*;
