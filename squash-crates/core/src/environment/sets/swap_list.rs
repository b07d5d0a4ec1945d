//! A sparse set over a fixed universe which allows O(1) insertion, removal and membership checks
//! and O(|S|) traversal.
//!
//! The structure keeps a permutation of the universe in which the first `size` values are the
//! members of the set, together with the inverse permutation. Removing a value swaps it with the
//! last member and shrinks `size`; adding a value swaps it with the first non-member and grows
//! `size`.
//!
//! # Bibliography
//! \[1\] V. le C. de Saint-Marcq, P. Schaus, C. Solnon, and C. Lecoutre, ‘Sparse-sets for domain
//! implementation’, in CP workshop on Techniques foR Implementing Constraint programming Systems
//! (TRICS), 2013, pp. 1–10.
use super::universe_max;
use super::SetCursor;
use super::SetLike;
use crate::asserts::squash_assert_moderate;
use crate::asserts::squash_assert_simple;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapList {
    offset: i32,
    /// The number of members; `values[..size]` are exactly the members of the set.
    size: usize,
    values: Vec<i32>,
    /// For every value of the universe (shifted by `offset`) its position in `values`.
    positions: Vec<usize>,
}

impl SwapList {
    fn index_of(&self, value: i32) -> Option<usize> {
        let index = i64::from(value) - i64::from(self.offset);
        (0..self.positions.len() as i64)
            .contains(&index)
            .then_some(index as usize)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.values.swap(a, b);
        let value_a = self.values[a];
        let value_b = self.values[b];
        self.positions[(value_a - self.offset) as usize] = a;
        self.positions[(value_b - self.offset) as usize] = b;
    }

    fn members(&self) -> &[i32] {
        &self.values[..self.size]
    }
}

impl SetLike for SwapList {
    fn new(offset: i32, capacity: usize) -> Self {
        let _ = universe_max(offset, capacity);
        SwapList {
            offset,
            size: 0,
            values: (0..capacity).map(|index| offset + index as i32).collect(),
            positions: (0..capacity).collect(),
        }
    }

    fn new_full(offset: i32, capacity: usize) -> Self {
        let mut set = SwapList::new(offset, capacity);
        set.size = capacity;
        set
    }

    fn len(&self) -> usize {
        self.size
    }

    fn contains(&self, value: i32) -> bool {
        self.index_of(value)
            .is_some_and(|index| self.positions[index] < self.size)
    }

    fn add(&mut self, value: i32) -> bool {
        let index = self.index_of(value);
        squash_assert_simple!(
            index.is_some(),
            "{value} is outside of the universe of the swap list"
        );
        let Some(index) = index else {
            return false;
        };

        let position = self.positions[index];
        if position < self.size {
            return false;
        }
        self.swap(position, self.size);
        self.size += 1;
        squash_assert_moderate!(self.values[self.size - 1] == value);
        true
    }

    fn remove(&mut self, value: i32) -> bool {
        let Some(index) = self.index_of(value) else {
            return false;
        };

        let position = self.positions[index];
        if position >= self.size {
            return false;
        }
        self.swap(position, self.size - 1);
        self.size -= 1;
        true
    }

    fn min(&self) -> Option<i32> {
        self.members().iter().copied().min()
    }

    fn max(&self) -> Option<i32> {
        self.members().iter().copied().max()
    }

    fn next_value(&self, value: i32) -> Option<i32> {
        self.members()
            .iter()
            .copied()
            .filter(|&member| member > value)
            .min()
    }

    fn previous_value(&self, value: i32) -> Option<i32> {
        self.members()
            .iter()
            .copied()
            .filter(|&member| member < value)
            .max()
    }

    fn cursor_next(&self, cursor: &mut SetCursor) -> Option<i32> {
        if cursor.position >= self.size {
            return None;
        }
        let value = self.values[cursor.position];
        cursor.position += 1;
        Some(value)
    }

    fn cursor_removed(&self, cursor: &mut SetCursor) {
        // The last member was swapped into the slot of the removed value.
        cursor.position = cursor.position.saturating_sub(1);
    }
}
