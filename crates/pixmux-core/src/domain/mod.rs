//! Domain types for the compositor.
//!
//! This module contains plain data with no async code and no knowledge of
//! plugins or layouts.
//!
//! # Coordinate system (for beginners)
//!
//! Every canvas uses the usual raster convention: the origin (0, 0) is the
//! top-left pixel, `x` grows to the right and `y` grows downwards.  A
//! [`placement::Placement`] describes a rectangle in the coordinate space of
//! a layout's composition canvas, which is always the size of the physical
//! screen.

/// Fixed-size RGBA raster buffer.
///
/// See [`canvas::Canvas`] for the main type.
pub mod canvas;

/// Rectangles occupied by plugins inside a layout.
pub mod placement;
