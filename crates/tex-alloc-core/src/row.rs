//! Rows and height quantization.
//!
//! A request of height `h` is served by a row of height `(1 << n) + bias`
//! where `n = ceil_log2(max(h - bias, 1))`. Rows sharing `n` are chained into
//! one singly-linked bucket list owned by the allocator.

use std::collections::BTreeMap;

use crate::model::{AreaId, Rect};
use crate::pool::Reset;
use crate::range::{Alloc, RangeAllocator};

/// `ceil(log2(v))` for `v >= 1`; `0` for `v <= 1`.
pub fn ceil_log2(v: u32) -> u32 {
    if v <= 1 {
        0
    } else {
        32 - (v - 1).leading_zeros()
    }
}

/// Largest power of two `<= v`; `0` for `v == 0`.
pub fn prev_pow2(v: u32) -> u32 {
    if v == 0 { 0 } else { 1 << (31 - v.leading_zeros()) }
}

/// Height bucket serving requests of `height` pixels.
pub fn bucket_index(height: u32, bias: u32) -> u32 {
    ceil_log2(height.saturating_sub(bias).max(1))
}

/// Height of every row in `bucket`.
pub fn row_height(bucket: u32, bias: u32) -> u32 {
    (1u32 << bucket) + bias
}

/// A horizontal strip of one area. Slots are carved left to right by `slots`.
#[derive(Debug)]
pub(crate) struct Row<R> {
    pub(crate) rect: Rect,
    pub(crate) area: Option<AreaId>,
    pub(crate) area_alloc: Alloc,
    pub(crate) bucket: u32,
    pub(crate) next: Option<u32>,
    pub(crate) slots: R,
    // slot start -> ticket of the placement holding it
    tickets: BTreeMap<u32, u32>,
    next_ticket: u32,
}

impl<R: RangeAllocator> Row<R> {
    /// A blank record, as parked in the pool.
    pub(crate) fn detached() -> Self {
        Self {
            rect: Rect::default(),
            area: None,
            area_alloc: Alloc::EMPTY,
            bucket: 0,
            next: None,
            slots: R::with_capacity(0),
            tickets: BTreeMap::new(),
            next_ticket: 0,
        }
    }

    /// Binds a blank record to the vertical interval `area_alloc` of `area`.
    pub(crate) fn attach(
        &mut self,
        area: AreaId,
        area_rect: Rect,
        area_alloc: Alloc,
        bucket: u32,
        next: Option<u32>,
    ) {
        self.rect = Rect::new(
            area_rect.x,
            area_rect.y + area_alloc.start,
            area_rect.w,
            area_alloc.size,
        );
        self.area = Some(area);
        self.area_alloc = area_alloc;
        self.bucket = bucket;
        self.next = next;
        self.slots.reset(area_rect.w);
    }

    /// Records a fresh ticket for the slot starting at `start`.
    pub(crate) fn issue_ticket(&mut self, start: u32) -> u32 {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.tickets.insert(start, ticket);
        ticket
    }

    /// True if the slot at `start` is still held under `ticket`.
    pub(crate) fn holds(&self, start: u32, ticket: u32) -> bool {
        self.tickets.get(&start) == Some(&ticket)
    }

    pub(crate) fn release_ticket(&mut self, start: u32) {
        self.tickets.remove(&start);
    }
}

impl<R: RangeAllocator> Default for Row<R> {
    fn default() -> Self {
        Self::detached()
    }
}

impl<R: RangeAllocator> Reset for Row<R> {
    fn reset(&mut self) {
        self.rect = Rect::default();
        self.area = None;
        self.area_alloc = Alloc::EMPTY;
        self.bucket = 0;
        self.next = None;
        self.slots.reset(0);
        self.tickets.clear();
        self.next_ticket = 0;
    }
}
