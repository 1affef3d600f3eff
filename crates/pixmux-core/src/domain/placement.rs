//! Placement rectangles and partial placement updates.

/// A rectangle in layout (screen) coordinates.
///
/// `x` and `y` are the top-left corner and may be negative, in which case the
/// part of the plugin that lies off-screen is clipped during composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rightmost X coordinate (exclusive).
    ///
    /// Widened to `i64` so that any origin plus any size is representable.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns `true` if this rectangle shares at least one pixel with `other`.
    pub fn overlaps(&self, other: &Placement) -> bool {
        i64::from(self.x) < other.right()
            && self.right() > i64::from(other.x)
            && i64::from(self.y) < other.bottom()
            && self.bottom() > i64::from(other.y)
    }

    /// Grows the rectangle by `border` pixels on every side.
    ///
    /// Saturates at the coordinate limits instead of wrapping.
    pub fn inflate(&self, border: u32) -> Placement {
        let shift = i32::try_from(border).unwrap_or(i32::MAX);
        let grow = border.saturating_mul(2);
        Placement {
            x: self.x.saturating_sub(shift),
            y: self.y.saturating_sub(shift),
            width: self.width.saturating_add(grow),
            height: self.height.saturating_add(grow),
        }
    }

    /// Applies the geometric part of `update`.
    ///
    /// `x`/`y` move the origin and keep the current size; `width`/`height`
    /// are always anchored at the (possibly just moved) origin.
    pub fn apply(&self, update: &PlacementUpdate) -> Placement {
        Placement {
            x: update.x.unwrap_or(self.x),
            y: update.y.unwrap_or(self.y),
            width: update.width.unwrap_or(self.width),
            height: update.height.unwrap_or(self.height),
        }
    }
}

/// A partial change to a plugin's placement and stacking index.
///
/// Fields left as `None` keep their current value.
///
/// ```
/// use pixmux_core::PlacementUpdate;
///
/// let update = PlacementUpdate::new().size(48, 16).z_index(2);
/// assert_eq!(update.width, Some(48));
/// assert_eq!(update.x, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementUpdate {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub z_index: Option<i32>,
}

impl PlacementUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the origin to `(x, y)`.
    pub fn origin(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Changes the size, anchored at the origin.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }
}
