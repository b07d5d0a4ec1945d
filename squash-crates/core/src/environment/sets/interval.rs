use super::universe_max;
use super::SetCursor;
use super::SetLike;

/// A set which only represents contiguous ranges `[lower_bound, upper_bound]`.
///
/// Only values at (or adjacent to) the bounds can be added or removed. Requests which would create
/// a hole are rejected and reported as "no change", leaving the set as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntervalSet {
    /// The inclusive bounds of the members; `None` if the set is empty.
    bounds: Option<(i32, i32)>,
    universe_min: i32,
    universe_max: i32,
}

impl IntervalSet {
    /// The inclusive bounds of the members; `None` if the set is empty.
    pub fn bounds(&self) -> Option<(i32, i32)> {
        self.bounds
    }

    pub(crate) fn set_bounds(&mut self, bounds: Option<(i32, i32)>) {
        self.bounds = bounds;
    }
}

impl SetLike for IntervalSet {
    fn new(offset: i32, capacity: usize) -> Self {
        IntervalSet {
            bounds: None,
            universe_min: offset,
            universe_max: universe_max(offset, capacity),
        }
    }

    fn new_full(offset: i32, capacity: usize) -> Self {
        let mut set = IntervalSet::new(offset, capacity);
        if capacity > 0 {
            set.bounds = Some((set.universe_min, set.universe_max));
        }
        set
    }

    fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    fn len(&self) -> usize {
        self.bounds.map_or(0, |(lower_bound, upper_bound)| {
            (i64::from(upper_bound) - i64::from(lower_bound) + 1) as usize
        })
    }

    fn contains(&self, value: i32) -> bool {
        self.bounds
            .is_some_and(|(lower_bound, upper_bound)| lower_bound <= value && value <= upper_bound)
    }

    fn add(&mut self, value: i32) -> bool {
        if value < self.universe_min || value > self.universe_max {
            return false;
        }

        match self.bounds {
            None => self.bounds = Some((value, value)),
            Some((lower_bound, upper_bound)) if lower_bound.checked_sub(1) == Some(value) => {
                self.bounds = Some((value, upper_bound))
            }
            Some((lower_bound, upper_bound)) if upper_bound.checked_add(1) == Some(value) => {
                self.bounds = Some((lower_bound, value))
            }
            Some(_) => return false,
        }
        true
    }

    fn remove(&mut self, value: i32) -> bool {
        let Some((lower_bound, upper_bound)) = self.bounds else {
            return false;
        };

        if lower_bound == upper_bound && value == lower_bound {
            self.bounds = None;
        } else if value == lower_bound {
            self.bounds = Some((lower_bound + 1, upper_bound));
        } else if value == upper_bound {
            self.bounds = Some((lower_bound, upper_bound - 1));
        } else {
            return false;
        }
        true
    }

    fn min(&self) -> Option<i32> {
        self.bounds.map(|(lower_bound, _)| lower_bound)
    }

    fn max(&self) -> Option<i32> {
        self.bounds.map(|(_, upper_bound)| upper_bound)
    }

    fn next_value(&self, value: i32) -> Option<i32> {
        let (lower_bound, upper_bound) = self.bounds?;
        (value < upper_bound).then(|| lower_bound.max(value + 1))
    }

    fn previous_value(&self, value: i32) -> Option<i32> {
        let (lower_bound, upper_bound) = self.bounds?;
        (value > lower_bound).then(|| upper_bound.min(value - 1))
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
