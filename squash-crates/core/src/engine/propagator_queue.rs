use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::asserts::squash_assert_moderate;
use crate::containers::KeyedVec;
use crate::options::QueueOrder;
use crate::propagation::Priority;
use crate::propagation::PropagationMask;
use crate::propagation::PropagatorId;

/// The propagators waiting to be called, one queue per priority tier.
///
/// A propagator is in the queue at most once; scheduling it again merges the masks.
#[derive(Debug, Clone)]
pub(crate) struct PropagatorQueue {
    queues: Vec<VecDeque<PropagatorId>>,
    pending: KeyedVec<PropagatorId, Option<PropagationMask>>,
    num_enqueued: usize,
    present_priorities: BinaryHeap<Reverse<usize>>,
    order: QueueOrder,
    rng: SmallRng,
}

impl Default for PropagatorQueue {
    fn default() -> Self {
        Self::new(QueueOrder::Fifo, 0)
    }
}

impl PropagatorQueue {
    pub(crate) fn new(order: QueueOrder, seed: u64) -> PropagatorQueue {
        PropagatorQueue {
            queues: vec![VecDeque::new(); Priority::NUM_TIERS],
            pending: KeyedVec::default(),
            num_enqueued: 0,
            present_priorities: BinaryHeap::new(),
            order,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.num_enqueued == 0
    }

    pub(crate) fn enqueue(
        &mut self,
        propagator_id: PropagatorId,
        priority: Priority,
        mask: PropagationMask,
    ) {
        self.pending.accomodate(propagator_id, None);
        let pending = &mut self.pending[propagator_id];

        if let Some(existing) = pending {
            *existing = existing.merge(mask);
            return;
        }

        *pending = Some(mask);
        self.num_enqueued += 1;

        let tier = priority.tier();
        if self.queues[tier].is_empty() {
            self.present_priorities.push(Reverse(tier));
        }
        self.queues[tier].push_back(propagator_id);
    }

    /// Takes a propagator from the lowest non-empty tier together with its merged mask.
    pub(crate) fn pop(&mut self) -> Option<(PropagatorId, PropagationMask)> {
        let top_priority = self.present_priorities.peek()?.0;
        let queue = &mut self.queues[top_priority];
        squash_assert_moderate!(!queue.is_empty());

        let propagator_id = match self.order {
            QueueOrder::Fifo => queue.pop_front(),
            QueueOrder::Random => {
                let index = self.rng.gen_range(0..queue.len());
                queue.swap_remove_back(index)
            }
        }?;

        if queue.is_empty() {
            let _ = self.present_priorities.pop();
        }
        self.num_enqueued -= 1;

        let mask = self.pending[propagator_id].take()?;
        Some((propagator_id, mask))
    }

    /// Removes a propagator which is no longer part of the engine.
    pub(crate) fn remove(&mut self, propagator_id: PropagatorId) {
        let is_enqueued = self
            .pending
            .get_mut(propagator_id)
            .and_then(Option::take)
            .is_some();
        if !is_enqueued {
            return;
        }

        for queue in self.queues.iter_mut() {
            queue.retain(|&other| other != propagator_id);
        }
        self.num_enqueued -= 1;

        self.present_priorities = self
            .queues
            .iter()
            .enumerate()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(tier, _)| Reverse(tier))
            .collect();
    }

    pub(crate) fn clear(&mut self) {
        for queue in self.queues.iter_mut() {
            queue.clear();
        }
        for pending in self.pending.iter_mut() {
            *pending = None;
        }

        self.present_priorities.clear();
        self.num_enqueued = 0;
    }
}
