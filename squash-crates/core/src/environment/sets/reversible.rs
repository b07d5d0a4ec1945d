use super::SetLike;
use crate::asserts::squash_assert_moderate;
use crate::environment::UndoStrategy;

/// Wraps a [`SetLike`] with the bookkeeping needed to restore it on backtrack.
///
/// With [`UndoStrategy::Trailing`] the environment logs every effective addition and removal and
/// replays the inverse operation on backtrack. With [`UndoStrategy::Copying`] the set keeps a stack
/// of snapshots labelled with the world they belong to.
#[derive(Clone, Debug)]
pub(crate) struct Reversible<S> {
    inner: S,
    strategy: UndoStrategy,
    /// The content at creation, restored when popping below every snapshot. Only kept by copying
    /// sets.
    initial: Option<S>,
    /// Snapshots taken on push, in increasing world order.
    snapshots: Vec<(usize, S)>,
    is_dirty: bool,
}

impl<S: SetLike> Reversible<S> {
    pub(crate) fn new(inner: S, strategy: UndoStrategy) -> Self {
        let initial = match strategy {
            UndoStrategy::Trailing => None,
            UndoStrategy::Copying => Some(inner.clone()),
        };
        Reversible {
            inner,
            strategy,
            initial,
            snapshots: vec![],
            is_dirty: false,
        }
    }

    pub(crate) fn inner(&self) -> &S {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub(crate) fn strategy(&self) -> UndoStrategy {
        self.strategy
    }

    /// Marks a copying set as modified since its last snapshot. Returns true if it was clean.
    pub(crate) fn mark_dirty(&mut self) -> bool {
        squash_assert_moderate!(self.strategy == UndoStrategy::Copying);
        !std::mem::replace(&mut self.is_dirty, true)
    }

    /// Records the current content as the state of `world`.
    pub(crate) fn take_snapshot(&mut self, world: usize) {
        match self.snapshots.last_mut() {
            Some((label, snapshot)) if *label == world => snapshot.clone_from(&self.inner),
            _ => self.snapshots.push((world, self.inner.clone())),
        }
        self.is_dirty = false;
    }

    /// Restores the content to the most recent snapshot taken at or below `world`, or to the
    /// content at creation if there is none.
    pub(crate) fn restore_snapshot(&mut self, world: usize) {
        while self
            .snapshots
            .last()
            .is_some_and(|&(label, _)| label > world)
        {
            let _ = self.snapshots.pop();
        }

        let restored = self
            .snapshots
            .last()
            .map(|(_, snapshot)| snapshot)
            .or(self.initial.as_ref());
        if let Some(restored) = restored {
            self.inner.clone_from(restored);
        }
        self.is_dirty = false;
    }

    #[cfg(test)]
    pub(crate) fn num_snapshots(&self) -> usize {
        self.snapshots.len()
    }
}
