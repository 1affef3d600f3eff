//! Fixed-size raster buffer used for plugin output and frame composition.
//!
//! A [`Canvas`] is a thin wrapper around an [`image::RgbaImage`] that also
//! records whether its alpha channel is meaningful.  Plugins that produce
//! opaque content return canvases without alpha and are pasted as a plain
//! copy; plugins that produce translucent content (text over a background,
//! sprites) return canvases with alpha and are blended onto whatever lies
//! underneath.
//!
//! # Why track `has_alpha` separately? (for beginners)
//!
//! The underlying buffer always stores four channels.  Blending every pixel
//! of an opaque canvas would give the same result as copying it, only slower,
//! and a canvas created as "opaque" may still carry garbage alpha values left
//! by a decoder.  The flag makes the intent explicit.

use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;

use super::placement::Placement;

/// Errors raised by canvas operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    /// The canvas being pasted does not match the size of the target region.
    #[error("canvas size mismatch: region is {expected:?} but canvas is {actual:?}")]
    SizeMismatch {
        /// `(width, height)` of the destination region.
        expected: (u32, u32),
        /// `(width, height)` of the canvas that was supplied.
        actual: (u32, u32),
    },
}

/// An 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Creates a fully opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a colour with an explicit alpha value.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    fn to_pixel(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl From<Rgba<u8>> for Color {
    fn from(px: Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0;
        Self { r, g, b, a }
    }
}

/// A rectangular grid of pixels with immutable dimensions.
///
/// The only way to obtain a canvas of a different size is [`Canvas::resized`],
/// which returns a new canvas and leaves the original untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
    has_alpha: bool,
}

impl Canvas {
    /// Creates an opaque canvas filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::BLACK)
    }

    /// Creates a canvas with an alpha channel, fully transparent.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Color::TRANSPARENT.to_pixel()),
            has_alpha: true,
        }
    }

    /// Creates a canvas filled with `color`.
    ///
    /// The canvas carries an alpha channel only if `color` is not fully opaque.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, color.to_pixel()),
            has_alpha: color.a != 255,
        }
    }

    /// Wraps an existing RGBA buffer.
    pub fn from_image(image: RgbaImage, has_alpha: bool) -> Self {
        Self { image, has_alpha }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Returns `true` if this canvas should be alpha-blended when pasted.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Borrows the underlying pixel buffer.
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consumes the canvas and returns the underlying pixel buffer.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Returns the colour at `(x, y)`, or `None` if outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width() && y < self.height() {
            Some(Color::from(*self.image.get_pixel(x, y)))
        } else {
            None
        }
    }

    /// Sets the colour at `(x, y)`.  Writes outside the canvas are ignored.
    pub fn put_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x >= 0 && y >= 0 && (x as u64) < self.width() as u64 && (y as u64) < self.height() as u64
        {
            self.image.put_pixel(x as u32, y as u32, color.to_pixel());
        }
    }

    /// Fills the whole canvas with `color`.
    pub fn fill(&mut self, color: Color) {
        let px = color.to_pixel();
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    /// Fills `region` with `color`, clipped to the canvas bounds.
    pub fn fill_rect(&mut self, region: Placement, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(region) else {
            return;
        };
        let px = color.to_pixel();
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, px);
            }
        }
    }

    /// Draws a one-pixel outline along the inside edge of `region`.
    pub fn draw_border(&mut self, region: Placement, color: Color) {
        if region.width == 0 || region.height == 0 {
            return;
        }
        let left = i64::from(region.x);
        let top = i64::from(region.y);
        let right = region.right() - 1;
        let bottom = region.bottom() - 1;
        // Only the on-canvas span of each edge can be visible.
        let (w, h) = (i64::from(self.width()), i64::from(self.height()));
        for x in left.max(0)..=right.min(w - 1) {
            self.put_pixel(x, top, color);
            self.put_pixel(x, bottom, color);
        }
        for y in top.max(0)..=bottom.min(h - 1) {
            self.put_pixel(left, y, color);
            self.put_pixel(right, y, color);
        }
    }

    /// Copies `src` onto this canvas with its top-left corner at `(x, y)`.
    ///
    /// Uses alpha blending when `src` has an alpha channel and a plain copy
    /// otherwise.  Parts of `src` that fall outside this canvas are clipped.
    pub fn paste(&mut self, src: &Canvas, x: i64, y: i64) {
        if src.has_alpha {
            imageops::overlay(&mut self.image, &src.image, x, y);
        } else {
            imageops::replace(&mut self.image, &src.image, x, y);
        }
    }

    /// Pastes `src` into `region`, requiring `src` to be exactly the region's size.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SizeMismatch`] if the dimensions differ; nothing
    /// is written in that case.
    pub fn paste_into(&mut self, src: &Canvas, region: Placement) -> Result<(), CanvasError> {
        let expected = (region.width, region.height);
        if src.dimensions() != expected {
            return Err(CanvasError::SizeMismatch {
                expected,
                actual: src.dimensions(),
            });
        }
        self.paste(src, region.x as i64, region.y as i64);
        Ok(())
    }

    /// Returns a copy of this canvas scaled to `width` x `height`.
    ///
    /// Nearest-neighbour sampling keeps hard pixel edges, which is what a
    /// low-resolution LED panel wants.
    pub fn resized(&self, width: u32, height: u32) -> Canvas {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Canvas {
            image: imageops::resize(&self.image, width, height, imageops::FilterType::Nearest),
            has_alpha: self.has_alpha,
        }
    }

    /// Intersects `region` with the canvas bounds, returning pixel ranges.
    fn clip(&self, region: Placement) -> Option<(u32, u32, u32, u32)> {
        let x0 = (region.x as i64).max(0);
        let y0 = (region.y as i64).max(0);
        let x1 = region.right().min(self.width() as i64);
        let y1 = region.bottom().min(self.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    #[test]
    fn test_new_canvas_is_opaque_black() {
        let canvas = Canvas::new(4, 3);
        assert_eq!(canvas.dimensions(), (4, 3));
        assert!(!canvas.has_alpha());
        assert_eq!(canvas.pixel(3, 2), Some(Color::BLACK));
    }

    #[test]
    fn test_pixel_outside_bounds_is_none() {
        let canvas = Canvas::new(4, 4);
        assert_eq!(canvas.pixel(4, 0), None);
        assert_eq!(canvas.pixel(0, 4), None);
    }

    #[test]
    fn test_filled_with_translucent_color_has_alpha() {
        let canvas = Canvas::filled(2, 2, Color::rgba(10, 20, 30, 128));
        assert!(canvas.has_alpha());
    }

    #[test]
    fn test_fill_rect_is_clipped_to_bounds() {
        // Arrange
        let mut canvas = Canvas::new(4, 4);

        // Act
        canvas.fill_rect(Placement::new(-2, 2, 4, 10), RED);

        // Assert
        assert_eq!(canvas.pixel(0, 2), Some(RED));
        assert_eq!(canvas.pixel(1, 3), Some(RED));
        assert_eq!(canvas.pixel(2, 2), Some(Color::BLACK));
        assert_eq!(canvas.pixel(0, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_opaque_paste_replaces_pixels() {
        // Arrange
        let mut dst = Canvas::filled(4, 4, RED);
        let src = Canvas::filled(2, 2, BLUE);

        // Act
        dst.paste(&src, 1, 1);

        // Assert
        assert_eq!(dst.pixel(1, 1), Some(BLUE));
        assert_eq!(dst.pixel(2, 2), Some(BLUE));
        assert_eq!(dst.pixel(0, 0), Some(RED));
        assert_eq!(dst.pixel(3, 3), Some(RED));
    }

    #[test]
    fn test_alpha_paste_keeps_background_under_transparent_pixels() {
        // Arrange
        let mut dst = Canvas::filled(2, 1, RED);
        let mut src = Canvas::transparent(2, 1);
        src.put_pixel(1, 0, BLUE);

        // Act
        dst.paste(&src, 0, 0);

        // Assert
        assert_eq!(dst.pixel(0, 0), Some(RED));
        assert_eq!(dst.pixel(1, 0), Some(BLUE));
    }

    #[test]
    fn test_paste_into_rejects_size_mismatch() {
        // Arrange
        let mut dst = Canvas::new(8, 8);
        let src = Canvas::filled(3, 3, BLUE);

        // Act
        let result = dst.paste_into(&src, Placement::new(0, 0, 4, 4));

        // Assert
        assert_eq!(
            result,
            Err(CanvasError::SizeMismatch {
                expected: (4, 4),
                actual: (3, 3)
            })
        );
        assert_eq!(dst.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_draw_border_outlines_region_only() {
        // Arrange
        let mut canvas = Canvas::new(5, 5);

        // Act
        canvas.draw_border(Placement::new(0, 0, 5, 5), RED);

        // Assert
        assert_eq!(canvas.pixel(0, 0), Some(RED));
        assert_eq!(canvas.pixel(4, 4), Some(RED));
        assert_eq!(canvas.pixel(4, 2), Some(RED));
        assert_eq!(canvas.pixel(2, 2), Some(Color::BLACK));
    }

    #[test]
    fn test_draw_border_with_extreme_region_clips_without_overflow() {
        let mut canvas = Canvas::new(5, 5);

        canvas.draw_border(Placement::new(i32::MAX - 4, 0, 8, 8), RED);
        canvas.draw_border(Placement::new(-1, -1, u32::MAX, 3), BLUE);

        assert_eq!(canvas.pixel(4, 0), Some(Color::BLACK));
        assert_eq!(canvas.pixel(0, 1), Some(BLUE));
        assert_eq!(canvas.pixel(3, 1), Some(BLUE));
        assert_eq!(canvas.pixel(3, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_resized_returns_new_canvas_and_keeps_original() {
        let original = Canvas::filled(2, 2, BLUE);
        let bigger = original.resized(6, 4);
        assert_eq!(bigger.dimensions(), (6, 4));
        assert_eq!(bigger.pixel(5, 3), Some(BLUE));
        assert_eq!(original.dimensions(), (2, 2));
    }
}
