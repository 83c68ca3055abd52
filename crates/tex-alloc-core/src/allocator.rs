use tracing::{debug, instrument, trace, warn};

use crate::area::{Area, growth_rects, max_alloc_size};
use crate::config::AllocatorConfig;
use crate::error::Result;
use crate::model::{AllocatorStats, AreaId, Placement, Rect, RowId, RowInfo, Size};
use crate::pool::Pool;
use crate::range::{Alloc, BestFitRanges, RangeAllocator};
use crate::row::{Row, bucket_index, ceil_log2, row_height};

struct RowSlot<R> {
    generation: u32,
    row: Option<Row<R>>,
}

/// Runtime atlas allocator.
///
/// The surface is split into areas by the growth model (see [`growth_rects`]).
/// Each area hands out rows of quantized height; each row hands out slots.
/// Requests are served first-fit from the rows of the matching height bucket
/// and otherwise open a new row in the first area (growth order) with room.
///
/// ```
/// use tex_alloc_core::prelude::*;
///
/// let mut atlas: AtlasAllocator = AtlasAllocator::new(Size::splat(64), Size::splat(1024), 0);
/// let p = atlas.try_allocate(20, 12).expect("fits");
/// assert_eq!((p.rect.w, p.rect.h), (20, 12));
/// assert!(atlas.free(p));
/// assert!(atlas.is_empty());
/// ```
pub struct AtlasAllocator<R: RangeAllocator = BestFitRanges> {
    min_size: Size,
    max_size: Size,
    max_alloc_size: Size,
    row_height_bias: u32,
    areas: Vec<Area<R>>,
    // head row index per height bucket
    buckets: Vec<Option<u32>>,
    slots: Vec<RowSlot<R>>,
    free_slots: Vec<u32>,
    pool: Pool<Row<R>>,
    live_rows: usize,
    live_placements: usize,
    allocated_area: u64,
}

impl<R: RangeAllocator> AtlasAllocator<R> {
    /// Creates an allocator growing from `min_size` to `max_size`.
    ///
    /// # Panics
    ///
    /// Panics if the parameters violate the construction contract (see
    /// [`AllocatorConfig::validate`]). Use [`from_config`](Self::from_config)
    /// to get the violation as an error instead.
    pub fn new(min_size: Size, max_size: Size, row_height_bias: u32) -> Self {
        let cfg = AllocatorConfig {
            min_size,
            max_size,
            row_height_bias,
            ..Default::default()
        };
        if let Err(e) = cfg.validate() {
            panic!("invalid atlas allocator parameters: {e}");
        }
        Self::build(&cfg)
    }

    /// Validates `cfg` and creates an allocator from it.
    pub fn from_config(cfg: &AllocatorConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::build(cfg))
    }

    #[instrument(skip_all)]
    fn build(cfg: &AllocatorConfig) -> Self {
        let rects = growth_rects(cfg.min_size, cfg.max_size);
        let max_alloc_size = max_alloc_size(&rects, cfg.row_height_bias);
        let num_buckets = ceil_log2(max_alloc_size.height - cfg.row_height_bias) as usize + 1;
        debug!(
            areas = rects.len(),
            buckets = num_buckets,
            max_alloc_w = max_alloc_size.width,
            max_alloc_h = max_alloc_size.height,
            "built atlas areas"
        );
        Self {
            min_size: cfg.min_size,
            max_size: cfg.max_size,
            max_alloc_size,
            row_height_bias: cfg.row_height_bias,
            areas: rects.into_iter().map(Area::new).collect(),
            buckets: vec![None; num_buckets],
            slots: Vec::new(),
            free_slots: Vec::new(),
            pool: Pool::new(cfg.pool_limit),
            live_rows: 0,
            live_placements: 0,
            allocated_area: 0,
        }
    }

    /// Reserves a `width x height` rectangle.
    ///
    /// Returns `None` when either side is zero or exceeds
    /// [`max_alloc_size`](Self::max_alloc_size), or when no row or area has room.
    /// A failed attempt leaves the allocator untouched.
    pub fn try_allocate(&mut self, width: u32, height: u32) -> Option<Placement> {
        if width == 0
            || height == 0
            || width > self.max_alloc_size.width
            || height > self.max_alloc_size.height
        {
            trace!(width, height, "request outside allocatable bounds");
            return None;
        }
        let bucket = bucket_index(height, self.row_height_bias);

        if let Some((index, slot)) = self.allocate_in_bucket(bucket, width) {
            return Some(self.issue(index, slot, width, height));
        }

        let index = self.open_row(bucket, width)?;
        let allocated = self.slots[index as usize]
            .row
            .as_mut()
            .and_then(|row| row.slots.allocate(width));
        match allocated {
            Some(slot) => Some(self.issue(index, slot, width, height)),
            None => {
                // A fresh row spans the whole area width, which was checked above.
                self.close_row(index);
                None
            }
        }
    }

    /// Releases a placement returned by [`try_allocate`](Self::try_allocate).
    ///
    /// Returns `false` for the empty placement and for placements that are no
    /// longer live (double free, even after the slot was handed out again, or
    /// freed by [`clear`](Self::clear)); those leave the allocator untouched.
    pub fn free(&mut self, placement: Placement) -> bool {
        if placement.is_empty() {
            return false;
        }
        let RowId { index, generation } = placement.row;
        let Some(slot) = self.slots.get_mut(index as usize) else {
            warn!(row = index, "free: unknown row");
            return false;
        };
        if slot.generation != generation {
            warn!(row = index, generation, "free: stale placement");
            return false;
        }
        let Some(row) = slot.row.as_mut() else {
            warn!(row = index, "free: row already released");
            return false;
        };
        let start = placement.row_alloc.start;
        if !row.holds(start, placement.ticket) {
            warn!(
                row = index,
                start,
                ticket = placement.ticket,
                "free: slot no longer held by this placement"
            );
            return false;
        }
        if !row.slots.free(placement.row_alloc) {
            warn!(
                row = index,
                start = placement.row_alloc.start,
                size = placement.row_alloc.size,
                "free: interval not live"
            );
            return false;
        }
        row.release_ticket(start);
        let emptied = row.slots.is_empty();
        self.live_placements = self.live_placements.saturating_sub(1);
        self.allocated_area = self.allocated_area.saturating_sub(placement.rect.area());
        trace!(x = placement.rect.x, y = placement.rect.y, row = index, "freed");
        if emptied {
            self.close_row(index);
        }
        true
    }

    /// Releases every row and placement. Outstanding placements become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(row) = slot.row.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_slots.push(index as u32);
                self.pool.ret(row);
            }
        }
        for head in &mut self.buckets {
            *head = None;
        }
        for area in &mut self.areas {
            area.reset();
        }
        self.live_rows = 0;
        self.live_placements = 0;
        self.allocated_area = 0;
        debug!("cleared atlas allocator");
    }

    pub fn min_size(&self) -> Size {
        self.min_size
    }

    pub fn max_size(&self) -> Size {
        self.max_size
    }

    /// Largest request that can ever succeed.
    pub fn max_alloc_size(&self) -> Size {
        self.max_alloc_size
    }

    pub fn row_height_bias(&self) -> u32 {
        self.row_height_bias
    }

    /// Row records the pool keeps for reuse.
    pub fn pool_limit(&self) -> usize {
        self.pool.limit()
    }

    /// Drops every row record parked in the pool. Live rows are untouched.
    pub fn trim_pool(&mut self) {
        let parked = self.pool.len();
        self.pool.clear();
        debug!(parked, "trimmed row pool");
    }

    /// True when no placement is live.
    pub fn is_empty(&self) -> bool {
        self.live_placements == 0
    }

    /// Area rectangles in growth order.
    pub fn areas(&self) -> impl Iterator<Item = Rect> + '_ {
        self.areas.iter().map(|a| a.rect)
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of rows chained in `bucket`; `0` for an out-of-range bucket.
    pub fn bucket_len(&self, bucket: u32) -> usize {
        let mut len = 0;
        let mut cursor = self.buckets.get(bucket as usize).copied().flatten();
        while let Some(index) = cursor {
            len += 1;
            cursor = self.slots[index as usize]
                .row
                .as_ref()
                .and_then(|row| row.next);
        }
        len
    }

    /// Every live row, in arena order.
    pub fn rows(&self) -> impl Iterator<Item = RowInfo> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let row = slot.row.as_ref()?;
            Some(RowInfo {
                id: RowId {
                    index: index as u32,
                    generation: slot.generation,
                },
                rect: row.rect,
                bucket: row.bucket,
                area: row.area?,
            })
        })
    }

    /// The live row behind `id`, if any.
    pub fn row_info(&self, id: RowId) -> Option<RowInfo> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let row = slot.row.as_ref()?;
        Some(RowInfo {
            id,
            rect: row.rect,
            bucket: row.bucket,
            area: row.area?,
        })
    }

    pub fn stats(&self) -> AllocatorStats {
        let total_area = (self.max_size.width as u64) * (self.max_size.height as u64);
        let row_area: u64 = self.rows().map(|r| r.rect.area()).sum();
        AllocatorStats {
            num_areas: self.areas.len(),
            num_rows: self.live_rows,
            num_placements: self.live_placements,
            allocated_area: self.allocated_area,
            row_area,
            total_area,
            occupancy: if total_area > 0 {
                self.allocated_area as f64 / total_area as f64
            } else {
                0.0
            },
            pool_hits: self.pool.hits(),
            pool_misses: self.pool.misses(),
            pooled_rows: self.pool.len(),
        }
    }

    /// First-fit over the rows of `bucket`, most recently opened first.
    fn allocate_in_bucket(&mut self, bucket: u32, width: u32) -> Option<(u32, Alloc)> {
        let mut cursor = self.buckets[bucket as usize];
        while let Some(index) = cursor {
            let row = self.slots[index as usize].row.as_mut()?;
            cursor = row.next;
            if row.rect.w < width {
                continue;
            }
            if let Some(slot) = row.slots.allocate(width) {
                return Some((index, slot));
            }
        }
        None
    }

    /// Carves a row for `bucket` out of the first area with room and links it
    /// at the bucket head.
    fn open_row(&mut self, bucket: u32, width: u32) -> Option<u32> {
        let height = row_height(bucket, self.row_height_bias);
        let (area_index, area_rect, area_alloc) =
            self.areas.iter_mut().enumerate().find_map(|(i, area)| {
                if area.rect.w < width {
                    return None;
                }
                let alloc = area.rows.allocate(height)?;
                Some((i, area.rect, alloc))
            })?;

        let mut row = self.pool.get();
        let head = self.buckets[bucket as usize];
        row.attach(
            AreaId(area_index as u32),
            area_rect,
            area_alloc,
            bucket,
            head,
        );
        debug!(
            bucket,
            area = area_index,
            x = row.rect.x,
            y = row.rect.y,
            w = row.rect.w,
            h = row.rect.h,
            "opened row"
        );
        let index = match self.free_slots.pop() {
            Some(index) => {
                self.slots[index as usize].row = Some(row);
                index
            }
            None => {
                self.slots.push(RowSlot {
                    generation: 0,
                    row: Some(row),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.buckets[bucket as usize] = Some(index);
        self.live_rows += 1;
        Some(index)
    }

    /// Unlinks the row at `index`, returns its interval to its area and parks
    /// the record in the pool.
    fn close_row(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        let Some(row) = slot.row.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(index);

        let head = &mut self.buckets[row.bucket as usize];
        if *head == Some(index) {
            *head = row.next;
        } else {
            let mut cursor = *head;
            while let Some(i) = cursor {
                let Some(prev) = self.slots[i as usize].row.as_mut() else {
                    break;
                };
                if prev.next == Some(index) {
                    prev.next = row.next;
                    break;
                }
                cursor = prev.next;
            }
        }

        if let Some(area) = row.area.and_then(|a| self.areas.get_mut(a.index())) {
            area.rows.free(row.area_alloc);
        }
        self.live_rows = self.live_rows.saturating_sub(1);
        debug!(
            bucket = row.bucket,
            x = row.rect.x,
            y = row.rect.y,
            h = row.rect.h,
            "closed row"
        );
        self.pool.ret(row);
    }

    fn issue(&mut self, index: u32, slot: Alloc, width: u32, height: u32) -> Placement {
        let slot_entry = &mut self.slots[index as usize];
        let (origin, ticket) = match slot_entry.row.as_mut() {
            Some(row) => (row.rect, row.issue_ticket(slot.start)),
            None => (Rect::default(), 0),
        };
        let placement = Placement {
            rect: Rect::new(origin.x + slot.start, origin.y, width, height),
            row: RowId {
                index,
                generation: slot_entry.generation,
            },
            row_alloc: slot,
            ticket,
        };
        self.live_placements += 1;
        self.allocated_area += placement.rect.area();
        trace!(
            x = placement.rect.x,
            y = placement.rect.y,
            w = width,
            h = height,
            row = index,
            "allocated"
        );
        placement
    }
}

impl<R: RangeAllocator> std::fmt::Debug for AtlasAllocator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasAllocator")
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("max_alloc_size", &self.max_alloc_size)
            .field("row_height_bias", &self.row_height_bias)
            .field("areas", &self.areas.len())
            .field("rows", &self.live_rows)
            .field("placements", &self.live_placements)
            .finish()
    }
}
