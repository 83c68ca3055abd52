use serde::{Deserialize, Serialize};

use crate::range::Alloc;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn x_max(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn y_max(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.x_max() <= self.x_max() && r.y_max() <= self.y_max()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.is_empty()
            || r.is_empty()
            || self.x >= r.x_max()
            || r.x >= self.x_max()
            || self.y >= r.y_max()
            || r.y >= self.y_max())
    }
}

/// Integer 2D size in pixels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
    pub const fn splat(v: u32) -> Self {
        Self {
            width: v,
            height: v,
        }
    }
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
    /// Componentwise `self <= other`.
    pub fn fits_in(&self, other: Size) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Index of an area in growth order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaId(pub(crate) u32);

impl AreaId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Generational handle to a row record.
///
/// The generation changes every time the arena slot is recycled, so a handle
/// to a released row never resolves to the row that later reuses the slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RowId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl RowId {
    pub(crate) const INVALID: RowId = RowId {
        index: u32::MAX,
        generation: 0,
    };

    pub fn index(&self) -> usize {
        self.index as usize
    }
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A successful allocation: the absolute rectangle plus the handles needed to release it.
///
/// Placements are plain values; the allocator keeps no record of them. Hand the
/// value back to [`AtlasAllocator::free`](crate::AtlasAllocator::free) to release it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Absolute rectangle within `[0, max_size)`, exactly the requested size.
    pub rect: Rect,
    pub(crate) row: RowId,
    pub(crate) row_alloc: Alloc,
    // serial issued by the row; a reissued interval gets a new one
    pub(crate) ticket: u32,
}

impl Placement {
    /// The empty placement. Freeing it is a no-op.
    pub const fn empty() -> Self {
        Self {
            rect: Rect::new(0, 0, 0, 0),
            row: RowId::INVALID,
            row_alloc: Alloc::EMPTY,
            ticket: 0,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }
    /// Handle of the row this placement lives in.
    pub fn row(&self) -> RowId {
        self.row
    }
    /// Horizontal interval reserved in the row. May be wider than `rect.w`
    /// only if a custom range allocator rounds sizes up.
    pub fn row_alloc(&self) -> Alloc {
        self.row_alloc
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::empty()
    }
}

/// Read-only view of a live row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowInfo {
    pub id: RowId,
    pub rect: Rect,
    pub bucket: u32,
    pub area: AreaId,
}

/// Statistics about allocator occupancy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AllocatorStats {
    /// Number of areas produced by the growth model.
    pub num_areas: usize,
    /// Rows currently linked into a height bucket.
    pub num_rows: usize,
    /// Placements handed out and not yet freed.
    pub num_placements: usize,
    /// Sum of `w * h` over live placements.
    pub allocated_area: u64,
    /// Sum of `w * h` over live rows (includes unused row tails).
    pub row_area: u64,
    /// `max_size.width * max_size.height`.
    pub total_area: u64,
    /// allocated_area / total_area (0.0 to 1.0).
    pub occupancy: f64,
    /// Rows served from the pool.
    pub pool_hits: u64,
    /// Rows constructed because the pool was empty.
    pub pool_misses: u64,
    /// Row records currently parked in the pool.
    pub pooled_rows: usize,
}

impl AllocatorStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Areas: {}, Rows: {}, Placements: {}, Occupancy: {:.2}%, Used Area: {} px², Row Area: {} px², Pool: {} hits / {} misses ({} parked)",
            self.num_areas,
            self.num_rows,
            self.num_placements,
            self.occupancy * 100.0,
            self.allocated_area,
            self.row_area,
            self.pool_hits,
            self.pool_misses,
            self.pooled_rows,
        )
    }

    /// Returns unallocated surface in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_area.saturating_sub(self.allocated_area)
    }

    /// Pixels reserved by rows but not covered by a placement.
    pub fn row_slack(&self) -> u64 {
        self.row_area.saturating_sub(self.allocated_area)
    }
}
