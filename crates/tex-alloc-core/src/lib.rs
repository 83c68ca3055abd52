//! Runtime texture atlas allocation.
//!
//! - Growth model: the surface is split up front into power-of-two areas, so it can grow from
//!   `min_size` to `max_size` without moving anything already placed
//! - Rows: each area hands out horizontal strips whose heights are quantized into buckets
//!   (`(1 << n) + bias`); rows of a bucket are searched first-fit
//! - Slots: each row hands out horizontal intervals through a [`RangeAllocator`]
//! - Released rows are parked in a bounded [`Pool`](pool::Pool) and reused
//!
//! Quick example:
//! ```
//! use tex_alloc_core::prelude::*;
//!
//! let cfg = AllocatorConfig::builder()
//!     .with_min_size(64, 64)
//!     .with_max_size(1024, 1024)
//!     .row_height_bias(2)
//!     .build();
//! let mut atlas: AtlasAllocator = AtlasAllocator::from_config(&cfg).unwrap();
//! let glyph = atlas.try_allocate(14, 18).expect("room");
//! println!("{:?}", glyph.rect);
//! atlas.free(glyph);
//! ```

pub mod allocator;
pub mod area;
pub mod config;
pub mod error;
pub mod model;
pub mod pool;
pub mod range;
pub mod row;

pub use allocator::*;
pub use area::{growth_rects, max_alloc_size};
pub use config::*;
pub use error::*;
pub use model::*;
pub use range::*;
pub use row::{bucket_index, row_height};

/// Convenience prelude for common types and functions.
/// Importing `tex_alloc_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::allocator::AtlasAllocator;
    pub use crate::config::{AllocatorConfig, AllocatorConfigBuilder};
    pub use crate::error::TexAllocError;
    pub use crate::model::{AllocatorStats, AreaId, Placement, Rect, RowId, RowInfo, Size};
    pub use crate::range::{Alloc, BestFitRanges, RangeAllocator};
    pub use crate::row::{bucket_index, row_height};
}
