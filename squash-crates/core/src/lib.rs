//! The reversible state and propagation engine of the Squash constraint solver.
//!
//! The crate is built from three layers:
//! - the [`environment`], which owns every piece of state that must be restored on backtrack
//!   (reversible integers and reversible sets in several representations);
//! - the [`propagation`] API, which describes what a propagator is and how it communicates with the
//!   solver;
//! - the engine, exposed through [`state::State`], which schedules propagators by priority and runs
//!   them until a fixpoint is reached or a [`Contradiction`] is detected.
//!
//! A search driver typically uses the crate as follows:
//! ```
//! use squash_core::state::State;
//! use squash_core::propagators::LessOrEqualArgs;
//!
//! let mut state = State::default();
//! let x = state.new_interval_variable(0, 10);
//! let y = state.new_interval_variable(0, 5);
//! let _ = state.add_propagator(LessOrEqualArgs { x, y, offset: 0 });
//!
//! state.propagate().expect("the root is consistent");
//! assert_eq!(state.upper_bound(x), 5);
//!
//! state.push();
//! let _ = state.post_upper_bound(y, 2).expect("2 is in the domain of y");
//! state.propagate().expect("x <= 2 is consistent");
//! assert_eq!(state.upper_bound(x), 2);
//!
//! state.pop();
//! assert_eq!(state.upper_bound(x), 5);
//! ```
pub(crate) mod asserts;
pub(crate) mod basic_types;
pub mod containers;
pub(crate) mod engine;
pub mod environment;
pub mod options;
pub mod propagation;
pub mod propagators;
pub mod statistics;
pub mod variables;

pub use rand;

pub use crate::basic_types::Cause;
pub use crate::basic_types::Contradiction;
pub use crate::basic_types::EmptyDomainContradiction;
pub use crate::basic_types::PropagationStatus;
pub use crate::basic_types::PropagatorContradiction;

/// The search-facing state: the environment, the variable domains and the propagation engine.
pub mod state {
    pub use crate::engine::EngineStatistics;
    pub use crate::engine::Population;
    pub use crate::engine::State;
    pub use crate::engine::StateStatistics;
    pub use crate::propagation::PropagatorHandle;
}
