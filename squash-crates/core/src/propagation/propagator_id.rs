use crate::containers::StorageKey;

/// An identifier to a propagator instance within the solver.
///
/// The identifier of a removed propagator may be given to a propagator posted later; use a
/// [`PropagatorHandle`](crate::propagation::PropagatorHandle) to refer to one propagator for good.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PropagatorId(pub(crate) u32);

impl std::fmt::Display for PropagatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl StorageKey for PropagatorId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        PropagatorId(index as u32)
    }
}
