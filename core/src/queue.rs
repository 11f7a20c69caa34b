//! Indexed binary min-heap with decrease-key, used by Dijkstra.
//!
//! Each vertex position maps to its slot in the heap, so membership tests
//! are O(1) and decrease-key is O(log n) without duplicate entries.

use crate::graph::VertexId;

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: VertexId,
    key: f64,
}

#[derive(Debug, Clone)]
pub struct MutablePriorityQueue {
    heap: Vec<Entry>,
    /// vertex index → heap slot
    slots: Vec<Option<usize>>,
}

impl MutablePriorityQueue {
    /// Queue able to hold vertex positions `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            slots: vec![None; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.slots.get(id.0).copied().flatten().is_some()
    }

    /// Insert a vertex not already in the queue. Returns false if it was present.
    pub fn insert(&mut self, id: VertexId, key: f64) -> bool {
        if self.contains(id) {
            return false;
        }
        if id.0 >= self.slots.len() {
            self.slots.resize(id.0 + 1, None);
        }
        self.heap.push(Entry { id, key });
        let slot = self.heap.len() - 1;
        self.slots[id.0] = Some(slot);
        self.sift_up(slot);
        true
    }

    /// Remove and return the entry with the smallest key.
    pub fn extract_min(&mut self) -> Option<(VertexId, f64)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let top = self.heap.pop()?;
        self.slots[top.id.0] = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((top.id, top.key))
    }

    /// Lower the key of a queued vertex. Returns false if the vertex is not
    /// queued or `key` is not smaller than its current key.
    pub fn decrease_key(&mut self, id: VertexId, key: f64) -> bool {
        let Some(slot) = self.slots.get(id.0).copied().flatten() else {
            return false;
        };
        if key >= self.heap[slot].key {
            return false;
        }
        self.heap[slot].key = key;
        self.sift_up(slot);
        true
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.heap[slot].key >= self.heap[parent].key {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < n && self.heap[left].key < self.heap[smallest].key {
                smallest = left;
            }
            if right < n && self.heap[right].key < self.heap[smallest].key {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots[self.heap[a].id.0] = Some(a);
        self.slots[self.heap[b].id.0] = Some(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_in_key_order() {
        let mut q = MutablePriorityQueue::new(5);
        for (i, key) in [4.0, 1.0, 3.0, 0.5, 2.0].into_iter().enumerate() {
            assert!(q.insert(VertexId(i), key));
        }
        let order: Vec<usize> = std::iter::from_fn(|| q.extract_min()).map(|(id, _)| id.0).collect();
        assert_eq!(order, vec![3, 1, 4, 2, 0]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_decrease_key_reorders() {
        let mut q = MutablePriorityQueue::new(3);
        q.insert(VertexId(0), 5.0);
        q.insert(VertexId(1), 3.0);
        q.insert(VertexId(2), 4.0);

        assert!(q.decrease_key(VertexId(0), 1.0));
        assert_eq!(q.extract_min(), Some((VertexId(0), 1.0)));
        assert_eq!(q.extract_min(), Some((VertexId(1), 3.0)));
    }

    #[test]
    fn test_decrease_key_rejects_increase_and_absent() {
        let mut q = MutablePriorityQueue::new(2);
        q.insert(VertexId(0), 2.0);
        assert!(!q.decrease_key(VertexId(0), 5.0));
        assert!(!q.decrease_key(VertexId(1), 0.0));
    }

    #[test]
    fn test_membership_tracks_extraction() {
        let mut q = MutablePriorityQueue::new(2);
        q.insert(VertexId(1), 1.0);
        assert!(q.contains(VertexId(1)));
        assert!(!q.insert(VertexId(1), 0.0));
        q.extract_min();
        assert!(!q.contains(VertexId(1)));
        assert!(q.insert(VertexId(1), 0.0));
    }

    #[test]
    fn test_grows_past_capacity() {
        let mut q = MutablePriorityQueue::new(0);
        q.insert(VertexId(7), 1.0);
        assert_eq!(q.len(), 1);
        assert_eq!(q.extract_min(), Some((VertexId(7), 1.0)));
    }
}
