//! The reversible state of the solver.
//!
//! The [`Environment`] owns a world counter and a trail. Entering a new world is done with
//! [`Environment::push`]; [`Environment::pop`] restores every reversible integer and every
//! reversible set to the value it had when the matching push happened.
//!
//! Integers are saved at most once per world: a write only logs the previous value if the integer
//! has not been written since the current world was entered. Sets are restored either by replaying
//! the inverse of every logged operation ([`UndoStrategy::Trailing`]) or from snapshots taken on
//! push ([`UndoStrategy::Copying`]).
mod reversible_integer;
mod sets;

use log::trace;
pub use reversible_integer::ReversibleInteger;
pub use sets::BitSet;
pub use sets::IntervalSet;
pub use sets::LinkedListSet;
pub use sets::ReversibleSet;
pub use sets::SetCursor;
pub use sets::SetKind;
pub use sets::SetLike;
pub use sets::SwapList;

use self::reversible_integer::IntegerCell;
use self::sets::AnySet;
use self::sets::InitialContent;
use crate::asserts::squash_assert_moderate;
use crate::asserts::squash_assert_simple;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::create_statistics_struct;
use crate::propagation::PropagatorId;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// How a reversible set is restored on backtrack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum UndoStrategy {
    /// Log every effective operation and replay its inverse.
    #[default]
    Trailing,
    /// Snapshot the whole set when a world is entered after a modification.
    Copying,
}

/// Operations registered by the owners of reversible state which are handed back when the world
/// they were registered in is popped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoAction {
    /// The propagator was added for the duration of a world and has to be removed from the engine.
    RetractPropagator(PropagatorId),
}

#[derive(Clone, Copy, Debug)]
enum UndoEntry {
    Integer {
        reference: ReversibleInteger,
        old_value: i64,
        old_stamp: Option<usize>,
    },
    SetAddition {
        set: ReversibleSet,
        value: i32,
    },
    SetRemoval {
        set: ReversibleSet,
        value: i32,
    },
    /// The bounds of an interval set before it was restricted.
    IntervalBounds {
        set: ReversibleSet,
        bounds: Option<(i32, i32)>,
    },
    /// A copying set was first modified in the world holding this entry.
    CopyRestore {
        set: ReversibleSet,
    },
    Action(UndoAction),
}

create_statistics_struct!(
    /// Counters describing how the [`Environment`] was used.
    EnvironmentStatistics {
    num_pushes: usize,
    num_pops: usize,
    /// The deepest world which was reached.
    max_world: usize,
    num_undo_entries_replayed: usize,
    num_snapshots_taken: usize,
});

#[derive(Debug, Default)]
pub struct Environment {
    trail: Trail<UndoEntry>,
    integers: KeyedVec<ReversibleInteger, IntegerCell>,
    /// Released integers whose handles can be handed out again.
    free_integers: Vec<ReversibleInteger>,
    sets: KeyedVec<ReversibleSet, AnySet>,
    free_sets: Vec<ReversibleSet>,
    /// Copying sets which were modified since the last push.
    dirty_sets: Vec<ReversibleSet>,
    undone_actions: Vec<UndoAction>,
    statistics: EnvironmentStatistics,
}

impl Environment {
    /// The current world; 0 is the root.
    pub fn get_world_index(&self) -> usize {
        self.trail.get_checkpoint()
    }

    /// The number of entries on the trail, across all worlds.
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn statistics(&self) -> &EnvironmentStatistics {
        &self.statistics
    }

    pub fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger);
    }

    /// Enters a new world.
    pub fn push(&mut self) {
        let world = self.get_world_index();

        for set in self.dirty_sets.drain(..) {
            self.sets[set].take_snapshot(world);
            self.statistics.num_snapshots_taken += 1;
        }
        self.trail.new_checkpoint();

        self.statistics.num_pushes += 1;
        self.statistics.max_world = self.statistics.max_world.max(world + 1);
        trace!("entered world {}", world + 1);
    }

    /// Leaves the current world, restoring all reversible state to its value at the matching
    /// [`Environment::push`].
    ///
    /// # Panics
    /// Popping the root world is a programming error.
    pub fn pop(&mut self) {
        squash_assert_simple!(self.get_world_index() > 0, "cannot pop the root world");
        let target = self.get_world_index() - 1;

        // Every dirty set has a restore entry in the world being popped.
        self.dirty_sets.clear();

        for entry in self.trail.synchronise(target) {
            self.statistics.num_undo_entries_replayed += 1;
            match entry {
                UndoEntry::Integer {
                    reference,
                    old_value,
                    old_stamp,
                } => {
                    let cell = &mut self.integers[reference];
                    cell.value = old_value;
                    cell.last_write_world = old_stamp;
                }
                UndoEntry::SetAddition { set, value } => {
                    let _ = self.sets[set].remove(value);
                }
                UndoEntry::SetRemoval { set, value } => {
                    let _ = self.sets[set].add(value);
                }
                UndoEntry::IntervalBounds { set, bounds } => {
                    self.sets[set].restore_interval(bounds)
                }
                UndoEntry::CopyRestore { set } => self.sets[set].restore_snapshot(target),
                UndoEntry::Action(action) => self.undone_actions.push(action),
            }
        }

        self.statistics.num_pops += 1;
        trace!("returned to world {target}");
    }

    /// Pops worlds until `world` is the current one.
    pub fn pop_until(&mut self, world: usize) {
        squash_assert_simple!(
            world <= self.get_world_index(),
            "cannot pop until world {world} from world {}",
            self.get_world_index()
        );
        while self.get_world_index() > world {
            self.pop();
        }
    }

    /// Registers an action which is returned by [`Environment::take_undone_actions`] once the
    /// current world is popped. Actions registered at the root are never undone and are dropped.
    pub fn save_action(&mut self, action: UndoAction) {
        self.log(UndoEntry::Action(action));
    }

    /// Returns the actions of the worlds popped since the last call, most recent first.
    pub fn take_undone_actions(&mut self) -> Vec<UndoAction> {
        std::mem::take(&mut self.undone_actions)
    }

    fn log(&mut self, entry: UndoEntry) {
        // Nothing below the root to restore to.
        if self.get_world_index() > 0 {
            self.trail.push(entry);
        }
    }
}

/// Reversible integers.
impl Environment {
    pub fn new_integer(&mut self, initial_value: i64) -> ReversibleInteger {
        match self.free_integers.pop() {
            Some(integer) => {
                self.integers[integer] = IntegerCell::new(initial_value);
                integer
            }
            None => self.integers.push(IntegerCell::new(initial_value)),
        }
    }

    /// Hands back an integer which is no longer used; its handle may be returned again by
    /// [`Environment::new_integer`].
    ///
    /// The integer must not have been written in a world which is still open, which holds for
    /// integers created in a world that has been popped since.
    pub fn release_integer(&mut self, integer: ReversibleInteger) {
        squash_assert_moderate!(
            !self.free_integers.contains(&integer),
            "{integer:?} is released twice"
        );
        self.free_integers.push(integer);
    }

    /// The number of integers which were created and not released.
    pub fn num_integers(&self) -> usize {
        self.integers.len() - self.free_integers.len()
    }

    pub fn read(&self, integer: ReversibleInteger) -> i64 {
        self.integers[integer].value
    }

    /// Writes `value`, returning whether the stored value changed.
    pub fn assign(&mut self, integer: ReversibleInteger, value: i64) -> bool {
        let world = self.get_world_index();
        let cell = &mut self.integers[integer];
        if cell.value == value {
            return false;
        }

        if !matches!(cell.last_write_world, Some(stamp) if stamp >= world) {
            if world > 0 {
                self.trail.push(UndoEntry::Integer {
                    reference: integer,
                    old_value: cell.value,
                    old_stamp: cell.last_write_world,
                });
            }
            cell.last_write_world = Some(world);
        }
        cell.value = value;
        true
    }

    pub fn add_assign(&mut self, integer: ReversibleInteger, addition: i64) -> bool {
        self.assign(integer, self.read(integer) + addition)
    }
}

/// Reversible sets.
impl Environment {
    /// Creates an empty trailing set over the universe `[offset, offset + capacity)`.
    pub fn new_set(&mut self, kind: SetKind, offset: i32, capacity: usize) -> ReversibleSet {
        self.new_set_with(kind, UndoStrategy::Trailing, offset, capacity, [])
    }

    /// Creates a set over the universe `[offset, offset + capacity)` which contains
    /// `initial_values` in every world, including the worlds below the current one.
    ///
    /// # Panics
    /// If the universe does not fit in an `i32`.
    pub fn new_set_with(
        &mut self,
        kind: SetKind,
        strategy: UndoStrategy,
        offset: i32,
        capacity: usize,
        initial_values: impl IntoIterator<Item = i32>,
    ) -> ReversibleSet {
        self.insert_set(AnySet::new(
            kind,
            offset,
            capacity,
            strategy,
            InitialContent::Values(initial_values),
        ))
    }

    /// Creates a set which contains its whole universe `[offset, offset + capacity)` in every
    /// world. Interval sets are built in constant time.
    ///
    /// # Panics
    /// If the universe does not fit in an `i32`.
    pub fn new_full_set(
        &mut self,
        kind: SetKind,
        strategy: UndoStrategy,
        offset: i32,
        capacity: usize,
    ) -> ReversibleSet {
        self.insert_set(AnySet::new(
            kind,
            offset,
            capacity,
            strategy,
            InitialContent::<[i32; 0]>::Full,
        ))
    }

    fn insert_set(&mut self, set: AnySet) -> ReversibleSet {
        match self.free_sets.pop() {
            Some(handle) => {
                self.sets[handle] = set;
                handle
            }
            None => self.sets.push(set),
        }
    }

    /// Hands back a set which is no longer used, dropping its content; its handle may be returned
    /// again when a set is created.
    ///
    /// The set must not have been modified in a world which is still open, which holds for sets
    /// created in a world that has been popped since.
    pub fn release_set(&mut self, set: ReversibleSet) {
        squash_assert_moderate!(!self.free_sets.contains(&set), "{set:?} is released twice");
        self.dirty_sets.retain(|&dirty| dirty != set);
        self.sets[set] = AnySet::new(
            SetKind::Interval,
            0,
            0,
            UndoStrategy::Trailing,
            InitialContent::<[i32; 0]>::Full,
        );
        self.free_sets.push(set);
    }

    /// The number of sets which were created and not released.
    pub fn num_sets(&self) -> usize {
        self.sets.len() - self.free_sets.len()
    }

    pub fn set_kind(&self, set: ReversibleSet) -> SetKind {
        self.sets[set].kind()
    }

    pub fn set_size(&self, set: ReversibleSet) -> usize {
        self.sets[set].len()
    }

    pub fn set_contains(&self, set: ReversibleSet, value: i32) -> bool {
        self.sets[set].contains(value)
    }

    pub fn set_min(&self, set: ReversibleSet) -> Option<i32> {
        self.sets[set].min()
    }

    pub fn set_max(&self, set: ReversibleSet) -> Option<i32> {
        self.sets[set].max()
    }

    /// The smallest member of `set` strictly greater than `value`.
    pub fn set_next_value(&self, set: ReversibleSet, value: i32) -> Option<i32> {
        self.sets[set].next_value(value)
    }

    /// The largest member of `set` strictly smaller than `value`.
    pub fn set_previous_value(&self, set: ReversibleSet, value: i32) -> Option<i32> {
        self.sets[set].previous_value(value)
    }

    /// Adds `value` to `set`, returning whether the set changed.
    pub fn add_to_set(&mut self, set: ReversibleSet, value: i32) -> bool {
        let changed = self.sets[set].add(value);
        if changed {
            self.record_set_change(set, UndoEntry::SetAddition { set, value });
        }
        changed
    }

    /// Removes `value` from `set`, returning whether the set changed.
    pub fn remove_from_set(&mut self, set: ReversibleSet, value: i32) -> bool {
        let changed = self.sets[set].remove(value);
        if changed {
            self.record_set_change(set, UndoEntry::SetRemoval { set, value });
        }
        changed
    }

    /// Removes every member of `set`, returning whether the set changed.
    pub fn clear_set(&mut self, set: ReversibleSet) -> bool {
        let members = self.set_values(set).collect::<Vec<_>>();
        members
            .into_iter()
            .fold(false, |changed, value| self.remove_from_set(set, value) || changed)
    }

    /// Removes every member of `set` outside `[lower, upper]`, returning whether the set changed.
    ///
    /// Interval sets are restricted in constant time; the other kinds remove the members one by
    /// one, starting from the extremes.
    pub fn restrict_set(&mut self, set: ReversibleSet, lower: i32, upper: i32) -> bool {
        let size = self.set_size(set);
        if let Some(previous) = self.sets[set].restrict_interval(lower, upper) {
            let changed = self.set_size(set) != size;
            if changed {
                self.record_set_change(
                    set,
                    UndoEntry::IntervalBounds {
                        set,
                        bounds: previous,
                    },
                );
            }
            return changed;
        }

        let mut member = self.set_min(set);
        while let Some(current) = member.filter(|&member| member < lower) {
            member = self.set_next_value(set, current);
            let _ = self.remove_from_set(set, current);
        }

        let mut member = self.set_max(set);
        while let Some(current) = member.filter(|&member| member > upper) {
            member = self.set_previous_value(set, current);
            let _ = self.remove_from_set(set, current);
        }

        self.set_size(set) != size
    }

    /// Returns the next member of `set` visited by `cursor`.
    pub fn next_in_set(&self, set: ReversibleSet, cursor: &mut SetCursor) -> Option<i32> {
        self.sets[set].cursor_next(cursor)
    }

    /// Must be called after removing the value last returned by `cursor` from `set`.
    pub fn notify_removed_from_set(&self, set: ReversibleSet, cursor: &mut SetCursor) {
        self.sets[set].cursor_removed(cursor)
    }

    /// Iterates over the members of `set`; the order depends on the representation.
    pub fn set_values(&self, set: ReversibleSet) -> impl Iterator<Item = i32> + '_ {
        let mut cursor = SetCursor::default();
        std::iter::from_fn(move || self.next_in_set(set, &mut cursor))
    }

    fn record_set_change(&mut self, set: ReversibleSet, entry: UndoEntry) {
        match self.sets[set].strategy() {
            UndoStrategy::Trailing => self.log(entry),
            UndoStrategy::Copying => {
                if self.sets[set].mark_dirty() {
                    self.dirty_sets.push(set);
                    self.log(UndoEntry::CopyRestore { set });
                }
            }
        }
    }
}
