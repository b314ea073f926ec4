//! Batch-local sequence numbers

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe monotonically increasing counter
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: AtomicU64,
}

impl SequenceCounter {
    /// Create a counter starting at `start`
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Take the next single value
    pub fn next_value(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Reserve `len` consecutive values for one worker
    pub fn reserve(&self, len: usize) -> SequenceRange {
        let start = self.next.fetch_add(len as u64, Ordering::Relaxed);
        SequenceRange::from(start..start + len as u64)
    }

    /// Value the next call would return
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// A disjoint block of sequence numbers owned by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRange {
    range: Range<u64>,
}

impl SequenceRange {
    /// Values left in the block
    pub fn remaining(&self) -> usize {
        (self.range.end - self.range.start) as usize
    }
}

impl From<Range<u64>> for SequenceRange {
    fn from(range: Range<u64>) -> Self {
        Self { range }
    }
}

impl Iterator for SequenceRange {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.range.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}
