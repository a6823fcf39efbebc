//! Bounded top-k selection over (score, ordinal) pairs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::models::SearchResult;

/// Heap entry ordered so the WORST candidate is the maximum: a lower score
/// is worse, and at equal score a higher ordinal is worse. The heap root
/// is therefore always the eviction candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    score: f32,
    ordinal: usize,
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.ordinal.cmp(&other.ordinal))
    }
}

/// Capacity-k selector with pop-then-push admission
#[derive(Debug)]
pub struct TopKSelector {
    capacity: usize,
    heap: BinaryHeap<HeapEntry>,
}

impl TopKSelector {
    /// Selector keeping the `capacity` best candidates
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1)),
        }
    }

    /// Number of candidates currently held
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when no candidate has been admitted
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Admit a candidate, evicting the current worst when at capacity
    pub fn offer(&mut self, score: f32, ordinal: usize) {
        if self.capacity == 0 {
            return;
        }
        let entry = HeapEntry { score, ordinal };
        if self.heap.len() < self.capacity {
            self.heap.push(entry);
        } else if let Some(&worst) = self.heap.peek() {
            if entry.cmp(&worst) == Ordering::Less {
                self.heap.pop();
                self.heap.push(entry);
            }
        }
    }

    /// Drain into descending score order, ties broken by lower ordinal
    pub fn into_sorted_results(self) -> Vec<SearchResult> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| SearchResult {
                ordinal: entry.ordinal,
                score: entry.score,
            })
            .collect()
    }
}
