use crate::containers::StorageKey;

/// A handle to an integer owned by the [`Environment`](super::Environment) whose value is
/// restored on backtrack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReversibleInteger {
    id: u32,
}

impl StorageKey for ReversibleInteger {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        Self { id: index as u32 }
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct IntegerCell {
    pub(super) value: i64,
    /// The world of the last write which saved the previous value; `None` if never written.
    pub(super) last_write_world: Option<usize>,
}

impl IntegerCell {
    pub(super) fn new(value: i64) -> Self {
        IntegerCell {
            value,
            last_write_world: None,
        }
    }
}
