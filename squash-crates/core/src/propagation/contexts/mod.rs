mod domains;
mod propagation_context;

pub use domains::*;
pub use propagation_context::*;
