//! Growth model: the surface is split into areas up front, by doubling.
//!
//! Starting from a square of side `min(min_size)`, each step appends an area
//! to the right of the tracked rectangle (doubling its width) and then one
//! below it (doubling its height) until both axes reach `max_size`. Areas never
//! move or resize, so rows and placements stay valid while the surface grows.

use crate::model::{Rect, Size};
use crate::range::RangeAllocator;
use crate::row::prev_pow2;

/// A fixed region of the surface; `rows` hands out its vertical extent.
#[derive(Debug)]
pub(crate) struct Area<R> {
    pub(crate) rect: Rect,
    pub(crate) rows: R,
}

impl<R: RangeAllocator> Area<R> {
    pub(crate) fn new(rect: Rect) -> Self {
        Self {
            rect,
            rows: R::with_capacity(rect.h),
        }
    }

    /// Drops every row interval.
    pub(crate) fn reset(&mut self) {
        self.rows.reset(self.rect.h);
    }
}

/// Area rectangles in growth order for a surface growing from `min_size` to `max_size`.
///
/// Both sizes must be powers of two with `min_size <= max_size`.
pub fn growth_rects(min_size: Size, max_size: Size) -> Vec<Rect> {
    let side = min_size.width.min(min_size.height);
    let mut tracked = Rect::new(0, 0, side, side);
    let mut rects = vec![tracked];
    while tracked.w < max_size.width || tracked.h < max_size.height {
        if tracked.w < max_size.width {
            rects.push(Rect::new(tracked.x_max(), tracked.y, tracked.w, tracked.h));
            tracked.w *= 2;
        }
        if tracked.h < max_size.height {
            rects.push(Rect::new(tracked.x, tracked.y_max(), tracked.w, tracked.h));
            tracked.h *= 2;
        }
    }
    rects
}

/// Largest request any area can host: the widest area, and the tallest area
/// rounded down to a height a row bucket can produce.
pub fn max_alloc_size(rects: &[Rect], row_height_bias: u32) -> Size {
    let max_w = rects.iter().map(|r| r.w).max().unwrap_or(0);
    let max_h = rects.iter().map(|r| r.h).max().unwrap_or(0);
    let quantized = match max_h.checked_sub(row_height_bias) {
        Some(h) if h > 0 => prev_pow2(h) + row_height_bias,
        _ => 0,
    };
    Size::new(max_w, quantized)
}
