//! The propagation engine and the search-facing [`State`].
mod propagation_engine;
mod propagator_queue;
mod state;
mod trigger;
mod watch_list;

pub use propagation_engine::EngineStatistics;
pub use state::State;
pub use state::StateStatistics;
pub use trigger::Population;
