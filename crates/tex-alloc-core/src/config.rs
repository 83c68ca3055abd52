use serde::{Deserialize, Serialize};

use crate::area::growth_rects;
use crate::error::{Result, TexAllocError};
use crate::model::Size;

/// Construction parameters for [`AtlasAllocator`](crate::AtlasAllocator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Initial surface size. Only `min(width, height)` matters: growth starts from that square.
    pub min_size: Size,
    /// Final surface size; placements never leave `[0, max_size)`.
    pub max_size: Size,
    /// Added to every quantized row height (absorbs per-image borders).
    #[serde(default)]
    pub row_height_bias: u32,
    /// Released row records kept for reuse.
    #[serde(default = "default_pool_limit")]
    pub pool_limit: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_size: Size::splat(64),
            max_size: Size::splat(4096),
            row_height_bias: 0,
            pool_limit: default_pool_limit(),
        }
    }
}

impl AllocatorConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - A dimension is zero
    /// - `min_size` or `max_size` is not a power of two on both axes
    /// - `min_size` exceeds `max_size` on either axis
    /// - `row_height_bias` leaves no room for a row in the tallest area
    pub fn validate(&self) -> Result<()> {
        for size in [self.min_size, self.max_size] {
            if size.width == 0 || size.height == 0 {
                return Err(TexAllocError::InvalidDimensions {
                    width: size.width,
                    height: size.height,
                });
            }
        }
        if !self.min_size.is_power_of_two() {
            return Err(TexAllocError::NotPowerOfTwo {
                what: "min_size",
                width: self.min_size.width,
                height: self.min_size.height,
            });
        }
        if !self.max_size.is_power_of_two() {
            return Err(TexAllocError::NotPowerOfTwo {
                what: "max_size",
                width: self.max_size.width,
                height: self.max_size.height,
            });
        }
        if !self.min_size.fits_in(self.max_size) {
            return Err(TexAllocError::InvalidConfig(format!(
                "min_size ({}x{}) exceeds max_size ({}x{})",
                self.min_size.width, self.min_size.height, self.max_size.width, self.max_size.height
            )));
        }
        let tallest = growth_rects(self.min_size, self.max_size)
            .iter()
            .map(|r| r.h)
            .max()
            .unwrap_or(0);
        if self.row_height_bias >= tallest {
            return Err(TexAllocError::InvalidConfig(format!(
                "row_height_bias ({}) must be smaller than the tallest area ({})",
                self.row_height_bias, tallest
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `AllocatorConfig`.
    pub fn builder() -> AllocatorConfigBuilder {
        AllocatorConfigBuilder::new()
    }
}

fn default_pool_limit() -> usize {
    256
}

/// Builder for `AllocatorConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AllocatorConfigBuilder {
    cfg: AllocatorConfig,
}

impl AllocatorConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AllocatorConfig::default(),
        }
    }
    pub fn with_min_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.min_size = Size::new(w, h);
        self
    }
    pub fn with_max_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_size = Size::new(w, h);
        self
    }
    pub fn row_height_bias(mut self, v: u32) -> Self {
        self.cfg.row_height_bias = v;
        self
    }
    pub fn pool_limit(mut self, v: usize) -> Self {
        self.cfg.pool_limit = v;
        self
    }
    pub fn build(self) -> AllocatorConfig {
        self.cfg
    }
}
