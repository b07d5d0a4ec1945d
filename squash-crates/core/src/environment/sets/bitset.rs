use super::universe_max;
use super::SetCursor;
use super::SetLike;
use crate::asserts::squash_assert_simple;

const WORD_SIZE: usize = u64::BITS as usize;

/// A set over the universe `[offset, offset + capacity)` stored as one bit per value.
///
/// Membership and updates are O(1); ordered queries scan words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitSet {
    offset: i32,
    capacity: usize,
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    fn index_of(&self, value: i32) -> Option<usize> {
        let index = i64::from(value) - i64::from(self.offset);
        (0..self.capacity as i64)
            .contains(&index)
            .then_some(index as usize)
    }

    fn value_at(&self, index: usize) -> i32 {
        self.offset + index as i32
    }

    /// The smallest index `>= from` whose bit is set.
    fn next_set_bit(&self, from: usize) -> Option<usize> {
        if from >= self.capacity {
            return None;
        }

        let mut word_index = from / WORD_SIZE;
        let mut word = self.words[word_index] & (u64::MAX << (from % WORD_SIZE));
        loop {
            if word != 0 {
                return Some(word_index * WORD_SIZE + word.trailing_zeros() as usize);
            }
            word_index += 1;
            if word_index >= self.words.len() {
                return None;
            }
            word = self.words[word_index];
        }
    }

    /// The largest index `<= to` whose bit is set.
    fn previous_set_bit(&self, to: usize) -> Option<usize> {
        if self.capacity == 0 {
            return None;
        }

        let to = to.min(self.capacity - 1);
        let mut word_index = to / WORD_SIZE;
        let mut word = self.words[word_index] & (u64::MAX >> (WORD_SIZE - 1 - to % WORD_SIZE));
        loop {
            if word != 0 {
                return Some(word_index * WORD_SIZE + WORD_SIZE - 1 - word.leading_zeros() as usize);
            }
            if word_index == 0 {
                return None;
            }
            word_index -= 1;
            word = self.words[word_index];
        }
    }
}

impl SetLike for BitSet {
    fn new(offset: i32, capacity: usize) -> Self {
        let _ = universe_max(offset, capacity);
        BitSet {
            offset,
            capacity,
            words: vec![0; capacity.div_ceil(WORD_SIZE)],
            len: 0,
        }
    }

    fn new_full(offset: i32, capacity: usize) -> Self {
        let mut set = BitSet::new(offset, capacity);
        set.words.fill(u64::MAX);
        if capacity % WORD_SIZE != 0 {
            if let Some(last) = set.words.last_mut() {
                *last = u64::MAX >> (WORD_SIZE - capacity % WORD_SIZE);
            }
        }
        set.len = capacity;
        set
    }

    fn len(&self) -> usize {
        self.len
    }

    fn contains(&self, value: i32) -> bool {
        self.index_of(value)
            .is_some_and(|index| self.words[index / WORD_SIZE] & (1 << (index % WORD_SIZE)) != 0)
    }

    fn add(&mut self, value: i32) -> bool {
        let index = self.index_of(value);
        squash_assert_simple!(
            index.is_some(),
            "{value} is outside of the universe of the bitset"
        );
        let Some(index) = index else {
            return false;
        };

        let mask = 1 << (index % WORD_SIZE);
        let word = &mut self.words[index / WORD_SIZE];
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.len += 1;
        true
    }

    fn remove(&mut self, value: i32) -> bool {
        let Some(index) = self.index_of(value) else {
            return false;
        };

        let mask = 1 << (index % WORD_SIZE);
        let word = &mut self.words[index / WORD_SIZE];
        if *word & mask == 0 {
            return false;
        }
        *word &= !mask;
        self.len -= 1;
        true
    }

    fn min(&self) -> Option<i32> {
        self.next_set_bit(0).map(|index| self.value_at(index))
    }

    fn max(&self) -> Option<i32> {
        self.previous_set_bit(self.capacity.saturating_sub(1))
            .map(|index| self.value_at(index))
    }

    fn next_value(&self, value: i32) -> Option<i32> {
        let from = i64::from(value) - i64::from(self.offset) + 1;
        if from >= self.capacity as i64 {
            return None;
        }
        self.next_set_bit(from.max(0) as usize)
            .map(|index| self.value_at(index))
    }

    fn previous_value(&self, value: i32) -> Option<i32> {
        let to = i64::from(value) - i64::from(self.offset) - 1;
        if to < 0 {
            return None;
        }
        self.previous_set_bit(to as usize)
            .map(|index| self.value_at(index))
    }

    fn cursor_next(&self, cursor: &mut SetCursor) -> Option<i32> {
        let next = match cursor.last {
            None => self.min(),
            Some(last) => self.next_value(last),
        };
        if next.is_some() {
            cursor.last = next;
        }
        next
    }

    fn cursor_removed(&self, _cursor: &mut SetCursor) {}
}
