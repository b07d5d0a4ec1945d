//! The set representations which can be made reversible by the
//! [`Environment`](crate::environment::Environment).
//!
//! Every representation stores integers of a fixed universe `[offset, offset + capacity)` and
//! implements [`SetLike`]. They differ in which operations are cheap:
//! - [`BitSet`]: O(1) membership and updates, ordered queries scan machine words;
//! - [`SwapList`]: O(1) membership and updates, unordered iteration over the members only;
//! - [`IntervalSet`]: a contiguous range, holes cannot be represented;
//! - [`LinkedListSet`]: an unordered list, membership walks the list.
mod bitset;
mod interval;
mod linked_list;
mod reversible;
mod swap_list;

pub use bitset::BitSet;
pub use interval::IntervalSet;
pub use linked_list::LinkedListSet;
pub(crate) use reversible::Reversible;
pub use swap_list::SwapList;

use crate::containers::StorageKey;

/// The behaviour shared by all set representations.
pub trait SetLike: Clone + std::fmt::Debug {
    /// Creates an empty set over the universe `[offset, offset + capacity)`.
    fn new(offset: i32, capacity: usize) -> Self;

    /// Creates a set containing every value of the universe `[offset, offset + capacity)`.
    fn new_full(offset: i32, capacity: usize) -> Self {
        let mut set = Self::new(offset, capacity);
        let mut value = offset;
        for _ in 0..capacity {
            let _ = set.add(value);
            value = value.saturating_add(1);
        }
        set
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, value: i32) -> bool;

    /// Adds `value`; returns whether the set changed.
    fn add(&mut self, value: i32) -> bool;

    /// Removes `value`; returns whether the set changed.
    fn remove(&mut self, value: i32) -> bool;

    fn min(&self) -> Option<i32>;

    fn max(&self) -> Option<i32>;

    /// The smallest member strictly greater than `value`.
    fn next_value(&self, value: i32) -> Option<i32>;

    /// The largest member strictly smaller than `value`.
    fn previous_value(&self, value: i32) -> Option<i32>;

    /// Advances the cursor, returning the next member not yet visited.
    fn cursor_next(&self, cursor: &mut SetCursor) -> Option<i32>;

    /// Informs the cursor that the member it returned last has just been removed, so iteration can
    /// continue with the remaining members.
    fn cursor_removed(&self, cursor: &mut SetCursor);
}

/// The largest value of the universe `[offset, offset + capacity)`.
///
/// # Panics
/// If the universe does not fit in an `i32`.
pub(crate) fn universe_max(offset: i32, capacity: usize) -> i32 {
    i64::try_from(capacity)
        .ok()
        .and_then(|capacity| i32::try_from(i64::from(offset) + capacity - 1).ok())
        .unwrap_or_else(|| {
            panic!("the universe of {capacity} values starting at {offset} does not fit in an i32")
        })
}

/// The representation used for a reversible set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SetKind {
    #[default]
    Bitset,
    SwapList,
    Interval,
    LinkedList,
}

/// A position in a set which stays valid when the member it last returned is removed.
///
/// Obtain one with [`SetCursor::default`] and advance it with
/// [`Environment::next_in_set`](crate::environment::Environment::next_in_set). Which fields are
/// used depends on the representation being iterated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetCursor {
    pub(crate) position: usize,
    pub(crate) last: Option<i32>,
    pub(crate) node: Option<u32>,
    pub(crate) previous_node: Option<u32>,
}

/// A handle to a set owned by the [`Environment`](crate::environment::Environment).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReversibleSet {
    id: u32,
}

impl StorageKey for ReversibleSet {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        ReversibleSet { id: index as u32 }
    }
}

/// A reversible set of any kind, dispatching on the representation.
#[derive(Clone, Debug)]
pub(crate) enum AnySet {
    Bitset(Reversible<BitSet>),
    SwapList(Reversible<SwapList>),
    Interval(Reversible<IntervalSet>),
    LinkedList(Reversible<LinkedListSet>),
}

macro_rules! dispatch {
    ($set:expr, $reversible:ident => $body:expr) => {
        match $set {
            AnySet::Bitset($reversible) => $body,
            AnySet::SwapList($reversible) => $body,
            AnySet::Interval($reversible) => $body,
            AnySet::LinkedList($reversible) => $body,
        }
    };
}

/// The members of a newly created set.
#[derive(Clone, Debug)]
pub(crate) enum InitialContent<Values> {
    /// Every value of the universe.
    Full,
    Values(Values),
}

impl AnySet {
    pub(crate) fn new<Values: IntoIterator<Item = i32>>(
        kind: SetKind,
        offset: i32,
        capacity: usize,
        strategy: crate::environment::UndoStrategy,
        content: InitialContent<Values>,
    ) -> AnySet {
        fn build<S: SetLike>(
            offset: i32,
            capacity: usize,
            strategy: crate::environment::UndoStrategy,
            content: InitialContent<impl IntoIterator<Item = i32>>,
        ) -> Reversible<S> {
            let set = match content {
                InitialContent::Full => S::new_full(offset, capacity),
                InitialContent::Values(values) => {
                    let mut set = S::new(offset, capacity);
                    for value in values {
                        let _ = set.add(value);
                    }
                    set
                }
            };
            Reversible::new(set, strategy)
        }

        match kind {
            SetKind::Bitset => AnySet::Bitset(build(offset, capacity, strategy, content)),
            SetKind::SwapList => AnySet::SwapList(build(offset, capacity, strategy, content)),
            SetKind::Interval => AnySet::Interval(build(offset, capacity, strategy, content)),
            SetKind::LinkedList => AnySet::LinkedList(build(offset, capacity, strategy, content)),
        }
    }

    pub(crate) fn kind(&self) -> SetKind {
        match self {
            AnySet::Bitset(_) => SetKind::Bitset,
            AnySet::SwapList(_) => SetKind::SwapList,
            AnySet::Interval(_) => SetKind::Interval,
            AnySet::LinkedList(_) => SetKind::LinkedList,
        }
    }

    pub(crate) fn strategy(&self) -> crate::environment::UndoStrategy {
        dispatch!(self, set => set.strategy())
    }

    pub(crate) fn len(&self) -> usize {
        dispatch!(self, set => set.inner().len())
    }

    pub(crate) fn contains(&self, value: i32) -> bool {
        dispatch!(self, set => set.inner().contains(value))
    }

    pub(crate) fn add(&mut self, value: i32) -> bool {
        dispatch!(self, set => set.inner_mut().add(value))
    }

    pub(crate) fn remove(&mut self, value: i32) -> bool {
        dispatch!(self, set => set.inner_mut().remove(value))
    }

    pub(crate) fn min(&self) -> Option<i32> {
        dispatch!(self, set => set.inner().min())
    }

    pub(crate) fn max(&self) -> Option<i32> {
        dispatch!(self, set => set.inner().max())
    }

    pub(crate) fn next_value(&self, value: i32) -> Option<i32> {
        dispatch!(self, set => set.inner().next_value(value))
    }

    pub(crate) fn previous_value(&self, value: i32) -> Option<i32> {
        dispatch!(self, set => set.inner().previous_value(value))
    }

    pub(crate) fn cursor_next(&self, cursor: &mut SetCursor) -> Option<i32> {
        dispatch!(self, set => set.inner().cursor_next(cursor))
    }

    pub(crate) fn cursor_removed(&self, cursor: &mut SetCursor) {
        dispatch!(self, set => set.inner().cursor_removed(cursor))
    }

    /// Restricts an interval set to its members within `[lower, upper]` in constant time,
    /// returning its previous bounds. Other kinds are left untouched and return `None`.
    pub(crate) fn restrict_interval(
        &mut self,
        lower: i32,
        upper: i32,
    ) -> Option<Option<(i32, i32)>> {
        let AnySet::Interval(set) = self else {
            return None;
        };

        let previous = set.inner().bounds();
        let restricted = previous.and_then(|(lower_bound, upper_bound)| {
            let bounds = (lower_bound.max(lower), upper_bound.min(upper));
            (bounds.0 <= bounds.1).then_some(bounds)
        });
        set.inner_mut().set_bounds(restricted);
        Some(previous)
    }

    pub(crate) fn restore_interval(&mut self, bounds: Option<(i32, i32)>) {
        if let AnySet::Interval(set) = self {
            set.inner_mut().set_bounds(bounds);
        }
    }

    pub(crate) fn mark_dirty(&mut self) -> bool {
        dispatch!(self, set => set.mark_dirty())
    }

    pub(crate) fn take_snapshot(&mut self, world: usize) {
        dispatch!(self, set => set.take_snapshot(world))
    }

    pub(crate) fn restore_snapshot(&mut self, world: usize) {
        dispatch!(self, set => set.restore_snapshot(world))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::Rng;
    use rand::SeedableRng;

    use super::*;

    fn members<S: SetLike>(set: &S) -> Vec<i32> {
        let mut cursor = SetCursor::default();
        let mut values = std::iter::from_fn(|| set.cursor_next(&mut cursor)).collect::<Vec<_>>();
        values.sort_unstable();
        values
    }

    /// Applies the same random script to every unrestricted representation and compares them.
    #[test]
    fn representations_agree_on_random_scripts() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut bitset = BitSet::new(-5, 70);
        let mut swap_list = SwapList::new(-5, 70);
        let mut linked_list = LinkedListSet::new(-5, 70);

        for _ in 0..2000 {
            let value = rng.gen_range(-5..65);
            if rng.gen_bool(0.5) {
                let changed = bitset.add(value);
                assert_eq!(changed, swap_list.add(value));
                assert_eq!(changed, linked_list.add(value));
            } else {
                let changed = bitset.remove(value);
                assert_eq!(changed, swap_list.remove(value));
                assert_eq!(changed, linked_list.remove(value));
            }

            let probe = rng.gen_range(-8..68);
            assert_eq!(bitset.len(), swap_list.len());
            assert_eq!(bitset.len(), linked_list.len());
            assert_eq!(bitset.contains(probe), swap_list.contains(probe));
            assert_eq!(bitset.contains(probe), linked_list.contains(probe));
            assert_eq!(bitset.next_value(probe), swap_list.next_value(probe));
            assert_eq!(bitset.next_value(probe), linked_list.next_value(probe));
            assert_eq!(bitset.previous_value(probe), swap_list.previous_value(probe));
            assert_eq!(bitset.previous_value(probe), linked_list.previous_value(probe));
            assert_eq!(bitset.min(), linked_list.min());
            assert_eq!(bitset.max(), swap_list.max());
        }

        assert_eq!(members(&bitset), members(&swap_list));
        assert_eq!(members(&bitset), members(&linked_list));
    }

    #[test]
    fn cursors_visit_remaining_members_despite_removals() {
        fn check<S: SetLike>() {
            let mut set = S::new(0, 10);
            for value in 0..10 {
                let _ = set.add(value);
            }

            let mut cursor = SetCursor::default();
            let mut visited = vec![];
            while let Some(value) = set.cursor_next(&mut cursor) {
                visited.push(value);
                if value % 3 == 0 {
                    assert!(set.remove(value));
                    set.cursor_removed(&mut cursor);
                }
            }

            visited.sort_unstable();
            assert_eq!(visited, (0..10).collect::<Vec<_>>());
            assert_eq!(members(&set), vec![1, 2, 4, 5, 7, 8]);
        }

        check::<BitSet>();
        check::<SwapList>();
        check::<LinkedListSet>();
    }

    #[test]
    fn full_sets_contain_their_whole_universe() {
        fn check<S: SetLike>() {
            for capacity in [0, 1, 63, 64, 65, 130] {
                let set = S::new_full(-3, capacity);
                let end = -3 + capacity as i32;

                assert_eq!(set.len(), capacity);
                assert_eq!(members(&set), (-3..end).collect::<Vec<_>>());
                assert!(!set.contains(-4));
                assert!(!set.contains(end));
            }
        }

        check::<BitSet>();
        check::<SwapList>();
        check::<IntervalSet>();
        check::<LinkedListSet>();
    }

    #[test]
    fn snapshots_restore_nearest_world_below() {
        let mut set = Reversible::new(BitSet::new(0, 8), crate::environment::UndoStrategy::Copying);
        let _ = set.inner_mut().add(1);
        set.take_snapshot(0);
        let _ = set.inner_mut().add(2);
        set.take_snapshot(2);
        let _ = set.inner_mut().add(3);

        set.restore_snapshot(1);

        assert_eq!(members(set.inner()), vec![1]);
        assert_eq!(set.num_snapshots(), 1);
    }
}
