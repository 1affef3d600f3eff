//! # pixmux-core
//!
//! Compositing and layout-switching engine for small fixed-resolution raster
//! displays (LED matrices, tiny panels, virtual framebuffers).
//!
//! This crate is used by the `pixmux-host` application and by anyone who wants
//! to embed the engine with their own plugins and display sinks.  It has no
//! dependencies on display hardware, configuration files, or fonts.
//!
//! # Architecture overview (for beginners)
//!
//! A frame on the display is assembled from the output of many independent
//! content producers called **plugins** (a clock, a picture, a test pattern).
//! Each plugin is given a rectangle and is asked, once per frame, to produce a
//! [`Canvas`] of exactly that size.
//!
//! - **`domain`** – Plain data: the [`Canvas`] raster buffer and the
//!   [`Placement`] rectangle a plugin occupies.
//!
//! - **`plugin`** – The [`Plugin`] capability contract every content producer
//!   implements, the [`PluginHandle`] that lets one instance be shared by
//!   several layouts, and the [`PluginRegistry`] that builds plugins by name.
//!
//! - **`compositor`** – The engine.  A [`Layout`] composites its plugins into
//!   one frame, honouring stacking order and isolating slow or failing
//!   plugins.  The [`DisplayManager`] owns every layout, switches between them
//!   while firing plugin lifecycle callbacks in a strict order, and pushes
//!   finished frames to a [`DisplaySink`].

pub mod compositor;
pub mod domain;
pub mod plugin;

// Re-export the most-used types at the crate root so callers can write
// `pixmux_core::Layout` instead of `pixmux_core::compositor::layout::Layout`.
pub use compositor::display_manager::{DisplayConfig, DisplayError, DisplayManager};
pub use compositor::handle::{DisplayCommand, DisplayHandle};
pub use compositor::layout::{
    DefaultLayoutBehavior, Layout, LayoutBehavior, LayoutError, LayoutId, PLUGIN_DRAW_TIMEOUT,
};
pub use compositor::sink::{DisplaySink, MemorySink, SinkError};
pub use domain::canvas::{Canvas, CanvasError, Color};
pub use domain::placement::{Placement, PlacementUpdate};
pub use plugin::registry::{PluginFactory, PluginRegistry, RegistryError};
pub use plugin::{
    Plugin, PluginContext, PluginError, PluginHandle, PluginId, PluginOptions, PluginSource,
};
