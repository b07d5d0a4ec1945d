use super::universe_max;
use super::SetCursor;
use super::SetLike;
use crate::asserts::squash_assert_simple;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Node {
    value: i32,
    next: Option<u32>,
}

/// An unordered singly-linked list of values, backed by a vector of nodes with a free list.
///
/// New values are inserted at the head. Membership and removal walk the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedListSet {
    universe_min: i32,
    universe_max: i32,
    nodes: Vec<Node>,
    head: Option<u32>,
    free_nodes: Vec<u32>,
    len: usize,
}

impl LinkedListSet {
    fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        std::iter::successors(self.head, |&node| self.nodes[node as usize].next)
            .map(|node| self.nodes[node as usize].value)
    }

    fn allocate(&mut self, node: Node) -> u32 {
        if let Some(index) = self.free_nodes.pop() {
            self.nodes[index as usize] = node;
            index
        } else {
            self.nodes.push(node);
            (self.nodes.len() - 1) as u32
        }
    }
}

impl SetLike for LinkedListSet {
    fn new(offset: i32, capacity: usize) -> Self {
        LinkedListSet {
            universe_min: offset,
            universe_max: universe_max(offset, capacity),
            nodes: Vec::new(),
            head: None,
            free_nodes: Vec::new(),
            len: 0,
        }
    }

    fn new_full(offset: i32, capacity: usize) -> Self {
        let mut set = LinkedListSet::new(offset, capacity);
        set.nodes = (0..capacity)
            .map(|index| Node {
                value: offset + index as i32,
                next: (index + 1 < capacity).then(|| (index + 1) as u32),
            })
            .collect();
        set.head = (capacity > 0).then_some(0);
        set.len = capacity;
        set
    }

    fn len(&self) -> usize {
        self.len
    }

    fn contains(&self, value: i32) -> bool {
        self.iter().any(|member| member == value)
    }

    fn add(&mut self, value: i32) -> bool {
        squash_assert_simple!(
            self.universe_min <= value && value <= self.universe_max,
            "{value} is outside of the universe of the linked list"
        );
        if self.contains(value) {
            return false;
        }

        let node = self.allocate(Node {
            value,
            next: self.head,
        });
        self.head = Some(node);
        self.len += 1;
        true
    }

    fn remove(&mut self, value: i32) -> bool {
        let mut previous: Option<u32> = None;
        let mut current = self.head;

        while let Some(node) = current {
            let Node { value: member, next } = self.nodes[node as usize];
            if member == value {
                match previous {
                    None => self.head = next,
                    Some(previous) => self.nodes[previous as usize].next = next,
                }
                self.free_nodes.push(node);
                self.len -= 1;
                return true;
            }
            previous = current;
            current = next;
        }

        false
    }

    fn min(&self) -> Option<i32> {
        self.iter().min()
    }

    fn max(&self) -> Option<i32> {
        self.iter().max()
    }

    fn next_value(&self, value: i32) -> Option<i32> {
        self.iter().filter(|&member| member > value).min()
    }

    fn previous_value(&self, value: i32) -> Option<i32> {
        self.iter().filter(|&member| member < value).max()
    }

    fn cursor_next(&self, cursor: &mut SetCursor) -> Option<i32> {
        let next = match cursor.node {
            None => self.head,
            Some(node) => self.nodes[node as usize].next,
        }?;
        cursor.previous_node = cursor.node;
        cursor.node = Some(next);
        Some(self.nodes[next as usize].value)
    }

    fn cursor_removed(&self, cursor: &mut SetCursor) {
        // The node of the removed value has been unlinked; continue from its predecessor.
        cursor.node = cursor.previous_node;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_nodes_are_reused() {
        let mut set = LinkedListSet::new(0, 10);
        assert!(set.add(1));
        assert!(set.add(2));
        assert!(set.remove(1));
        assert!(set.add(3));

        assert_eq!(set.nodes.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 2]);
    }

    #[test]
    fn cursor_survives_removal_of_current_element() {
        let mut set = LinkedListSet::new(0, 10);
        for value in [1, 2, 3, 4] {
            assert!(set.add(value));
        }

        let mut cursor = SetCursor::default();
        let mut seen = vec![];
        while let Some(value) = set.cursor_next(&mut cursor) {
            seen.push(value);
            if value % 2 == 0 {
                assert!(set.remove(value));
                set.cursor_removed(&mut cursor);
            }
        }

        assert_eq!(seen, vec![4, 3, 2, 1]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 1]);
    }
}
