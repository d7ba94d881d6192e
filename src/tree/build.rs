// Frequency-driven tree construction.
//
// Classic two-smallest merge over a min-heap. The end-of-stream symbol is
// always present with weight 1. Ties are broken by insertion order (leaves
// in symbol order, then merged nodes in creation order) so the same
// frequencies always produce the same tree.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{HuffmanTree, Node, Symbol};
use crate::error::{CodecError, Result};

// ---------------------------------------------------------------------------
// FrequencyTable
// ---------------------------------------------------------------------------

/// Per-byte occurrence counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self { counts: [0; 256] }
    }
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut table = Self::new();
        table.update(data);
        table
    }

    /// Count every byte of `data`.
    pub fn update(&mut self, data: &[u8]) {
        for &b in data {
            self.counts[b as usize] += 1;
        }
    }

    /// Override the count of one byte.
    pub fn set(&mut self, byte: u8, count: u64) {
        self.counts[byte as usize] = count;
    }

    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// Number of bytes with a nonzero count.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Heap entry; ordered so that `BinaryHeap` pops the lightest, oldest node.
struct Weighted {
    weight: u64,
    seq: usize,
    node: Node,
}

impl PartialEq for Weighted {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Weighted {}

impl PartialOrd for Weighted {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weighted {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Build a tree covering every byte with a nonzero count plus end-of-stream.
///
/// When no byte has a nonzero count, a zero-weight leaf for byte 0 is added
/// so the root is still internal.
pub fn build_tree(freqs: &FrequencyTable) -> Result<HuffmanTree> {
    let mut heap = BinaryHeap::with_capacity(257);
    let mut seq = 0usize;
    let mut push = |heap: &mut BinaryHeap<Weighted>, weight: u64, node: Node| {
        heap.push(Weighted { weight, seq, node });
        seq += 1;
    };

    for byte in 0..=255u8 {
        let count = freqs.count(byte);
        if count > 0 {
            push(&mut heap, count, Node::leaf(byte));
        }
    }
    if heap.is_empty() {
        push(&mut heap, 0, Node::leaf(0u8));
    }
    push(&mut heap, 1, Node::Leaf(Symbol::EndOfStream));

    while heap.len() > 1 {
        let (Some(a), Some(b)) = (heap.pop(), heap.pop()) else {
            break;
        };
        let weight = a.weight.saturating_add(b.weight);
        push(&mut heap, weight, Node::internal(a.node, b.node));
    }

    let root = heap
        .pop()
        .map(|w| w.node)
        .ok_or_else(|| CodecError::InvalidTree("no leaves to build from".into()))?;
    HuffmanTree::new(root)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
