//! One-dimensional interval allocation.
//!
//! The 2D allocator carves rows out of an area and slots out of a row through
//! the [`RangeAllocator`] trait. [`BestFitRanges`] is the default implementation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A live interval `[start, start + size)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Alloc {
    pub start: u32,
    pub size: u32,
}

impl Alloc {
    pub const EMPTY: Alloc = Alloc { start: 0, size: 0 };

    pub const fn new(start: u32, size: u32) -> Self {
        Self { start, size }
    }
    /// Exclusive end offset, saturating at `u32::MAX`.
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.size)
    }
    /// Exclusive end offset, `None` if it does not fit in a `u32`.
    pub fn checked_end(&self) -> Option<u32> {
        self.start.checked_add(self.size)
    }
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Allocator of contiguous integer intervals inside `[0, capacity)`.
///
/// Implementations must never hand out overlapping intervals and must report a
/// high watermark of `0` exactly when nothing is allocated.
pub trait RangeAllocator {
    fn with_capacity(capacity: u32) -> Self
    where
        Self: Sized;

    /// Total length of the managed interval.
    fn capacity(&self) -> u32;

    /// Reserves `size` contiguous units. `None` when `size == 0` or nothing fits.
    fn allocate(&mut self, size: u32) -> Option<Alloc>;

    /// Releases an interval returned by [`allocate`](Self::allocate).
    /// Returns `false`, leaving the state untouched, if the interval is not live.
    fn free(&mut self, alloc: Alloc) -> bool;

    /// Highest offset still covered by a live allocation (exclusive); `0` when empty.
    fn high_watermark(&self) -> u32;

    /// Drops every allocation and re-targets the allocator to `capacity`.
    fn reset(&mut self, capacity: u32);

    fn is_empty(&self) -> bool {
        self.high_watermark() == 0
    }
}

/// Best-fit interval allocator.
///
/// Free blocks are indexed by offset for coalescing and by `(size, offset)` for
/// the best-fit lookup; ties go to the lowest offset.
#[derive(Debug, Clone)]
pub struct BestFitRanges {
    capacity: u32,
    // offset -> size of free block
    free_by_start: BTreeMap<u32, u32>,
    // (size, offset)
    free_by_size: BTreeSet<(u32, u32)>,
}

impl BestFitRanges {
    /// Number of disjoint free blocks.
    pub fn free_blocks(&self) -> usize {
        self.free_by_start.len()
    }

    /// Largest block that a single `allocate` could return.
    pub fn largest_free(&self) -> u32 {
        self.free_by_size.iter().next_back().map_or(0, |(s, _)| *s)
    }

    fn insert_free(&mut self, start: u32, size: u32) {
        self.free_by_start.insert(start, size);
        self.free_by_size.insert((size, start));
    }

    fn remove_free(&mut self, start: u32, size: u32) {
        self.free_by_start.remove(&start);
        self.free_by_size.remove(&(size, start));
    }

    fn overlaps_free(&self, alloc: Alloc) -> bool {
        if let Some((&s, &sz)) = self.free_by_start.range(..=alloc.start).next_back() {
            if s + sz > alloc.start {
                return true;
            }
        }
        if let Some((&s, _)) = self.free_by_start.range(alloc.start..).next() {
            if s < alloc.end() {
                return true;
            }
        }
        false
    }
}

impl RangeAllocator for BestFitRanges {
    fn with_capacity(capacity: u32) -> Self {
        let mut r = BestFitRanges {
            capacity: 0,
            free_by_start: BTreeMap::new(),
            free_by_size: BTreeSet::new(),
        };
        r.reset(capacity);
        r
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn allocate(&mut self, size: u32) -> Option<Alloc> {
        if size == 0 {
            return None;
        }
        let (block_size, start) = *self.free_by_size.range((size, 0)..).next()?;
        self.remove_free(start, block_size);
        let rest = block_size - size;
        if rest > 0 {
            self.insert_free(start + size, rest);
        }
        Some(Alloc::new(start, size))
    }

    fn free(&mut self, alloc: Alloc) -> bool {
        let Some(end) = alloc.checked_end() else {
            return false;
        };
        if alloc.size == 0 || end > self.capacity || self.overlaps_free(alloc) {
            return false;
        }
        let mut start = alloc.start;
        let mut size = alloc.size;
        // coalesce with prev
        if let Some((&ps, &psz)) = self.free_by_start.range(..start).next_back() {
            if ps + psz == start {
                self.remove_free(ps, psz);
                start = ps;
                size += psz;
            }
        }
        // coalesce with next
        let next = start + size;
        if let Some(&nsz) = self.free_by_start.get(&next) {
            self.remove_free(next, nsz);
            size += nsz;
        }
        self.insert_free(start, size);
        true
    }

    fn high_watermark(&self) -> u32 {
        match self.free_by_start.iter().next_back() {
            Some((&s, &sz)) if s + sz == self.capacity => s,
            _ => self.capacity,
        }
    }

    fn reset(&mut self, capacity: u32) {
        self.capacity = capacity;
        self.free_by_start.clear();
        self.free_by_size.clear();
        if capacity > 0 {
            self.insert_free(0, capacity);
        }
    }
}
