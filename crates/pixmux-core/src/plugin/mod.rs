//! The plugin capability contract.
//!
//! A plugin is an independent content producer.  A [`Layout`] assigns it a
//! rectangle and, once per frame, asks it to [`draw`](Plugin::draw) a
//! [`Canvas`] of exactly that size.  Around the draw calls the engine fires
//! lifecycle callbacks so the plugin can start and stop background work.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//!            factory / PluginHandle::new
//!                        │
//!                        ▼
//!   resize_requested ◄── registered in a Layout ──► teardown (removed)
//!                        │
//!   switch to a layout   │   switch away from every
//!   that contains it     │   layout that contains it
//!         activated  ◄───┴───►  deactivated
//!                        │
//!          layout_switched (every switch it takes part in)
//!          draw            (every frame while visible)
//!          screen_updated  (every frame pushed while visible)
//! ```
//!
//! Every method may suspend.  None of them may assume the engine retries on
//! error: a failing `draw` leaves the plugin's region stale for one frame, and
//! a failing lifecycle hook is logged and otherwise ignored.
//!
//! # Sharing one instance between layouts
//!
//! A [`PluginHandle`] is a reference-counted pointer plus a stable
//! [`PluginId`].  Cloning the handle does **not** clone the plugin, so the
//! same clock can sit in two layouts and keep its state across a switch.
//!
//! [`Layout`]: crate::compositor::layout::Layout

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::compositor::handle::DisplayHandle;
use crate::compositor::layout::LayoutId;
use crate::domain::canvas::Canvas;

pub mod registry;

/// Free-form options handed to a plugin factory (usually read from a TOML config).
pub type PluginOptions = toml::Table;

/// Errors a plugin may report from any of its hooks.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Generic failure with a human-readable reason.
    #[error("{0}")]
    Failed(String),

    /// The options passed to the factory could not be interpreted.
    #[error("invalid plugin options: {0}")]
    InvalidOptions(String),

    /// A file system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Stable identity of a plugin instance.
///
/// Two handles refer to the same plugin exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(Uuid);

impl PluginId {
    /// Allocates a fresh, random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PluginId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The capability interface every content producer implements.
///
/// Only [`draw`](Plugin::draw) and [`resize_requested`](Plugin::resize_requested)
/// are mandatory; the lifecycle hooks default to doing nothing.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Produces this frame's content.
    ///
    /// The returned canvas must match the size most recently passed to
    /// [`resize_requested`](Plugin::resize_requested); otherwise the layout
    /// skips it for this frame.  `Ok(None)` means "nothing to composite".
    ///
    /// The canvas is handed off to the caller.  A plugin that keeps an internal
    /// canvas should return a clone of it.
    async fn draw(&self) -> Result<Option<Canvas>, PluginError>;

    /// Adapts the plugin to a new size chosen by the owning layout.
    ///
    /// This is the only way a plugin's size changes.  The plugin must have
    /// adapted its internal state by the time this returns.
    async fn resize_requested(&self, width: u32, height: u32) -> Result<(), PluginError>;

    /// The plugin became visible: it is part of the new current layout and
    /// was not part of the previous one.
    async fn activated(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// The plugin is no longer visible.
    ///
    /// Background tasks started in [`activated`](Plugin::activated) must be
    /// cancelled here; the engine does not track them.
    async fn deactivated(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Fired on every layout switch the plugin takes part in, after any
    /// activate/deactivate callback.
    async fn layout_switched(
        &self,
        _previous: Option<LayoutId>,
        _current: LayoutId,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// The plugin was permanently removed from a layout.
    async fn teardown(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// A frame containing this plugin is about to be pushed to the display.
    ///
    /// Must not request another draw: doing so re-enters the display update.
    async fn screen_updated(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Shared, identity-comparable handle to a plugin instance.
#[derive(Clone)]
pub struct PluginHandle {
    id: PluginId,
    plugin: Arc<dyn Plugin>,
}

impl PluginHandle {
    /// Wraps `plugin` under a freshly allocated id.
    pub fn new(plugin: impl Plugin + 'static) -> Self {
        Self::with_id(PluginId::new(), Arc::new(plugin))
    }

    /// Wraps an already shared plugin under a known id.
    ///
    /// Used when the plugin was built from a [`PluginContext`] and needs to
    /// address itself in draw requests.
    pub fn with_id(id: PluginId, plugin: Arc<dyn Plugin>) -> Self {
        Self { id, plugin }
    }

    pub fn id(&self) -> PluginId {
        self.id
    }
}

impl Deref for PluginHandle {
    type Target = dyn Plugin;

    fn deref(&self) -> &Self::Target {
        self.plugin.as_ref()
    }
}

impl PartialEq for PluginHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PluginHandle {}

impl std::hash::Hash for PluginHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle").field("id", &self.id).finish()
    }
}

/// Everything a plugin needs at construction time.
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Id the resulting [`PluginHandle`] will carry.
    pub id: PluginId,
    /// Initially assigned width.
    pub width: u32,
    /// Initially assigned height.
    pub height: u32,
    /// Back-channel to the display manager.
    pub display: DisplayHandle,
    /// Factory-specific options.
    pub options: PluginOptions,
}

impl PluginContext {
    /// Asks the display manager for an out-of-cycle redraw of this plugin.
    ///
    /// The request is queued; returns `false` if the display manager is gone.
    pub fn request_draw(&self) -> bool {
        self.display.request_draw(self.id)
    }

    /// Deserializes [`options`](Self::options) into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidOptions`] if the table does not match `T`.
    pub fn parse_options<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        toml::Value::Table(self.options.clone())
            .try_into()
            .map_err(|e: toml::de::Error| PluginError::InvalidOptions(e.to_string()))
    }
}

/// How a plugin is supplied to [`Layout::add_plugin`].
///
/// [`Layout::add_plugin`]: crate::compositor::layout::Layout::add_plugin
#[derive(Debug, Clone)]
pub enum PluginSource {
    /// An existing instance, possibly already registered in another layout.
    Instance(PluginHandle),
    /// Build a new instance through the named factory.
    Named {
        factory: String,
        options: PluginOptions,
    },
}

impl PluginSource {
    /// Refers to a factory by name with no options.
    pub fn named(factory: impl Into<String>) -> Self {
        PluginSource::Named {
            factory: factory.into(),
            options: PluginOptions::new(),
        }
    }

    /// Replaces the options of a [`PluginSource::Named`]; no-op for instances.
    pub fn with_options(self, options: PluginOptions) -> Self {
        match self {
            PluginSource::Named { factory, .. } => PluginSource::Named { factory, options },
            instance => instance,
        }
    }
}

impl From<PluginHandle> for PluginSource {
    fn from(handle: PluginHandle) -> Self {
        PluginSource::Instance(handle)
    }
}

impl From<&PluginHandle> for PluginSource {
    fn from(handle: &PluginHandle) -> Self {
        PluginSource::Instance(handle.clone())
    }
}

impl From<&str> for PluginSource {
    fn from(factory: &str) -> Self {
        PluginSource::named(factory)
    }
}
