//! Tile positions.
//!
//! A [`Position`] is a tile inside a region. Coordinates are region-local;
//! converting to a global grid is the world's business, since only the world
//! knows how regions are laid out.

use serde::{Deserialize, Serialize};

use crate::ids::RegionId;

/// A tile within a region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The region containing the tile.
    pub region: RegionId,
    /// Region-local column.
    pub x: i32,
    /// Region-local row.
    pub y: i32,
}

impl Position {
    /// Create a position in `region` at `(x, y)`.
    pub fn new(region: impl Into<RegionId>, x: i32, y: i32) -> Self {
        Self {
            region: region.into(),
            x,
            y,
        }
    }

    /// Return the position shifted by `(dx, dy)` within the same region.
    ///
    /// Returns `None` on coordinate overflow. Region bounds are not checked.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            region: self.region.clone(),
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Chebyshev (king-move) distance to `other`, if both share a region.
    pub fn range_to(&self, other: &Self) -> Option<u32> {
        if self.region != other.region {
            return None;
        }
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        Some(dx.max(dy))
    }

    /// Returns `true` if `other` is in the same region within `range` tiles.
    pub fn in_range_of(&self, other: &Self, range: u32) -> bool {
        self.range_to(other).is_some_and(|d| d <= range)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{} {},{}]", self.region, self.x, self.y)
    }
}
