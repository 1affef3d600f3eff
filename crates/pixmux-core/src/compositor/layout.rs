//! Layout: an arrangement of plugins composited into one frame.
//!
//! A layout keeps, for every registered plugin, exactly one [`Placement`] and
//! one z-index.  Both live in the same record, so registering or removing a
//! plugin updates them together.
//!
//! # How a frame is composited (for beginners)
//!
//! ```text
//!  1. clear the composition canvas to black
//!  2. sort plugins by z-index (stable: ties keep registration order)
//!  3. call draw() on all of them at once, each with a 100 ms deadline
//!  4. paste the results in the sorted order
//! ```
//!
//! Because pasting happens in step 4, after every draw has finished or timed
//! out, a higher z-index always ends up on top no matter which plugin
//! answered first.  A plugin that fails, times out, or returns a canvas of the
//! wrong size gets its last good frame pasted again, so its region goes stale
//! rather than blank; the error is logged and the rest of the frame is
//! unaffected.  A plugin that explicitly returns no canvas leaves its region
//! showing background.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::handle::DisplayHandle;
use crate::domain::canvas::{Canvas, Color};
use crate::domain::placement::{Placement, PlacementUpdate};
use crate::plugin::registry::{PluginRegistry, RegistryError};
use crate::plugin::{PluginContext, PluginError, PluginHandle, PluginId, PluginSource};

/// Deadline for a single plugin's `draw()` within one frame.
pub const PLUGIN_DRAW_TIMEOUT: Duration = Duration::from_millis(100);

/// Width of the debug outline drawn around each plugin region.
const DEBUG_BORDER_WIDTH: u32 = 1;

const BACKGROUND: Color = Color::BLACK;

/// Unique identifier of a layout within its display manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutId(Uuid);

impl LayoutId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors returned by layout registration operations.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The same plugin instance was added twice to one layout.
    #[error("plugin {0} is already registered in this layout")]
    PluginAlreadyRegistered(PluginId),

    /// The referenced plugin is not part of this layout.
    #[error("plugin {0} is not registered in this layout")]
    PluginNotRegistered(PluginId),

    /// A named plugin could not be built.
    #[error(transparent)]
    Factory(#[from] RegistryError),
}

/// Extension point for layout-level lifecycle hooks.
///
/// The layout toggles its own visibility flag before calling these; a
/// behaviour only adds work on top.  When a hook runs, every member plugin has
/// already received its activate/deactivate callback.
#[async_trait]
pub trait LayoutBehavior: Send + Sync {
    /// The layout became the current layout.
    async fn activated(&self, _layout: LayoutId, _previous: Option<LayoutId>) {}

    /// The layout stopped being the current layout.
    async fn deactivated(&self, _layout: LayoutId, _next: LayoutId) {}
}

/// Behaviour of a plain layout: nothing beyond the visibility flag.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLayoutBehavior;

impl LayoutBehavior for DefaultLayoutBehavior {}

/// A registered plugin with its placement metadata.
struct Member {
    plugin: PluginHandle,
    placement: Placement,
    z_index: i32,
    /// Last canvas successfully pasted at the current size.
    last_frame: Option<Canvas>,
}

/// An ordered arrangement of plugins composited into one canvas per frame.
pub struct Layout {
    id: LayoutId,
    name: Option<String>,
    /// Registration order; draw order is derived from it by a stable sort.
    members: Vec<Member>,
    canvas: Canvas,
    visible: bool,
    debug_borders: bool,
    display: DisplayHandle,
    registry: Arc<PluginRegistry>,
    behavior: Box<dyn LayoutBehavior>,
}

impl Layout {
    /// Creates a standalone layout of the given size.
    ///
    /// The layout has an empty plugin registry and a detached display handle,
    /// so only already constructed plugins can be added.  Layouts that belong
    /// to a display manager are created with [`DisplayManager::new_layout`].
    ///
    /// [`DisplayManager::new_layout`]: super::display_manager::DisplayManager::new_layout
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_parts(
            width,
            height,
            DisplayHandle::detached(),
            Arc::new(PluginRegistry::new()),
            Box::new(DefaultLayoutBehavior),
        )
    }

    pub(crate) fn with_parts(
        width: u32,
        height: u32,
        display: DisplayHandle,
        registry: Arc<PluginRegistry>,
        behavior: Box<dyn LayoutBehavior>,
    ) -> Self {
        Self {
            id: LayoutId::new(),
            name: None,
            members: Vec::new(),
            canvas: Canvas::new(width, height),
            visible: false,
            debug_borders: false,
            display,
            registry,
            behavior,
        }
    }

    pub fn id(&self) -> LayoutId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The composition canvas as of the last draw.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// `true` only while this is the display manager's current layout.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn debug_borders(&self) -> bool {
        self.debug_borders
    }

    /// Outlines every composited region with a randomly coloured border.
    pub fn set_debug_borders(&mut self, enabled: bool) {
        self.debug_borders = enabled;
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Registered plugins in registration order.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginHandle> {
        self.members.iter().map(|m| &m.plugin)
    }

    pub fn contains(&self, plugin: &PluginHandle) -> bool {
        self.position(plugin.id()).is_some()
    }

    /// Looks up a registered plugin by id.
    pub fn find(&self, id: PluginId) -> Option<&PluginHandle> {
        self.members
            .iter()
            .find(|m| m.plugin.id() == id)
            .map(|m| &m.plugin)
    }

    pub fn placement(&self, plugin: &PluginHandle) -> Option<Placement> {
        self.member(plugin).map(|m| m.placement)
    }

    pub fn z_index(&self, plugin: &PluginHandle) -> Option<i32> {
        self.member(plugin).map(|m| m.z_index)
    }

    /// Registers a plugin at `placement` with stacking index `z_index`.
    ///
    /// `source` is either an existing instance (which may also be registered
    /// in other layouts) or the name of a factory in the plugin registry.  A
    /// factory-built plugin receives the placement's size and a handle back to
    /// the display manager.
    ///
    /// Overlapping placements are allowed; they are logged at debug level.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PluginAlreadyRegistered`] if the instance is
    /// already part of this layout, or [`LayoutError::Factory`] if a named
    /// plugin cannot be built.
    pub fn add_plugin(
        &mut self,
        source: impl Into<PluginSource>,
        placement: Placement,
        z_index: i32,
    ) -> Result<PluginHandle, LayoutError> {
        let plugin = match source.into() {
            PluginSource::Instance(handle) => {
                if self.contains(&handle) {
                    return Err(LayoutError::PluginAlreadyRegistered(handle.id()));
                }
                handle
            }
            PluginSource::Named { factory, options } => {
                let ctx = PluginContext {
                    id: PluginId::new(),
                    width: placement.width,
                    height: placement.height,
                    display: self.display.clone(),
                    options,
                };
                self.registry.create(&factory, ctx)?
            }
        };

        for other in self.members.iter().filter(|m| m.placement.overlaps(&placement)) {
            debug!(
                layout = %self.id,
                plugin = %plugin.id(),
                other = %other.plugin.id(),
                "plugin placement overlaps an existing plugin"
            );
        }

        self.members.push(Member {
            plugin: plugin.clone(),
            placement,
            z_index,
            last_frame: None,
        });
        Ok(plugin)
    }

    /// Returns the plugins whose placement overlaps `plugin`'s placement.
    pub fn overlapping(&self, plugin: &PluginHandle) -> Vec<PluginHandle> {
        let Some(target) = self.placement(plugin) else {
            return Vec::new();
        };
        self.members
            .iter()
            .filter(|m| m.plugin != *plugin && m.placement.overlaps(&target))
            .map(|m| m.plugin.clone())
            .collect()
    }

    /// Tears down `plugin` and forgets its placement and z-index.
    ///
    /// A failing `teardown()` is logged; the plugin is removed regardless.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PluginNotRegistered`] if `plugin` is not part of
    /// this layout.
    pub async fn remove_plugin(&mut self, plugin: &PluginHandle) -> Result<(), LayoutError> {
        let index = self
            .position(plugin.id())
            .ok_or(LayoutError::PluginNotRegistered(plugin.id()))?;
        report_hook("teardown", plugin, plugin.teardown().await);
        self.members.remove(index);
        Ok(())
    }

    /// Partially updates a plugin's placement and/or z-index.
    ///
    /// The plugin is always told its final size through `resize_requested`,
    /// even if this call did not change it.  Returns the new placement.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PluginNotRegistered`] if `plugin` is not part of
    /// this layout.
    pub async fn change_plugin_coords(
        &mut self,
        plugin: &PluginHandle,
        update: PlacementUpdate,
    ) -> Result<Placement, LayoutError> {
        let index = self
            .position(plugin.id())
            .ok_or(LayoutError::PluginNotRegistered(plugin.id()))?;
        let member = &mut self.members[index];
        let placement = member.placement.apply(&update);
        if placement.size() != member.placement.size() {
            member.last_frame = None;
        }
        member.placement = placement;
        if let Some(z) = update.z_index {
            member.z_index = z;
        }
        let placement = member.placement;

        report_hook(
            "resize_requested",
            plugin,
            plugin
                .resize_requested(placement.width, placement.height)
                .await,
        );
        Ok(placement)
    }

    /// Resizes every plugin to its placement in this layout.
    ///
    /// Run once when the layout becomes current, so a plugin shared from a
    /// layout where it had a different size is corrected before it draws.
    pub async fn handle_plugin_changeover(&mut self) {
        for member in &mut self.members {
            member.last_frame = None;
        }
        let results = join_all(self.members.iter().map(|m| {
            m.plugin
                .resize_requested(m.placement.width, m.placement.height)
        }))
        .await;
        for (member, result) in self.members.iter().zip(results) {
            report_hook("resize_requested", &member.plugin, result);
        }
    }

    /// Composites a complete frame and returns the composition canvas.
    ///
    /// Always succeeds and always returns a canvas of the layout's size.
    pub async fn draw(&mut self) -> &Canvas {
        self.canvas.fill(BACKGROUND);

        let order = self.draw_order();
        let plugins: Vec<PluginHandle> = order
            .iter()
            .map(|&i| self.members[i].plugin.clone())
            .collect();
        let frames = join_all(plugins.iter().map(draw_with_deadline)).await;

        for (index, outcome) in order.into_iter().zip(frames) {
            match outcome {
                DrawOutcome::Frame(frame) => {
                    if self.composite(index, &frame) {
                        self.members[index].last_frame = Some(frame);
                    } else {
                        self.repaint_last_frame(index);
                    }
                }
                DrawOutcome::Empty => self.members[index].last_frame = None,
                DrawOutcome::Failed => self.repaint_last_frame(index),
            }
        }
        &self.canvas
    }

    /// Redraws only `plugin` and returns the updated composition canvas.
    ///
    /// The plugin's region is cleared and repainted; no other plugin is asked
    /// to draw.  A higher-z plugin overlapping that region is therefore
    /// painted over until the next full draw.
    ///
    /// Returns `Ok(None)` when the plugin produced nothing (error, timeout, or
    /// an explicit empty frame); the canvas is left untouched in that case.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::PluginNotRegistered`] if `plugin` is not part of
    /// this layout.
    pub async fn plugin_draw_requested(
        &mut self,
        plugin: &PluginHandle,
    ) -> Result<Option<&Canvas>, LayoutError> {
        let index = self
            .position(plugin.id())
            .ok_or(LayoutError::PluginNotRegistered(plugin.id()))?;
        let DrawOutcome::Frame(frame) = draw_with_deadline(plugin).await else {
            return Ok(None);
        };

        let region = self.painted_region(self.members[index].placement);
        self.canvas.fill_rect(region, BACKGROUND);
        if self.composite(index, &frame) {
            self.members[index].last_frame = Some(frame);
        } else {
            self.repaint_last_frame(index);
        }
        Ok(Some(&self.canvas))
    }

    /// Notifies every member plugin that a frame is about to be shown.
    pub async fn screen_updated(&self) {
        let results = join_all(self.members.iter().map(|m| m.plugin.screen_updated())).await;
        for (member, result) in self.members.iter().zip(results) {
            report_hook("screen_updated", &member.plugin, result);
        }
    }

    /// Layout-level hook: this layout became current.
    pub async fn activated(&mut self, previous: Option<LayoutId>) {
        self.visible = true;
        self.behavior.activated(self.id, previous).await;
    }

    /// Layout-level hook: `next` replaces this layout as current.
    pub async fn deactivated(&mut self, next: LayoutId) {
        self.visible = false;
        self.behavior.deactivated(self.id, next).await;
    }

    /// Member indices sorted by z-index, ties in registration order.
    fn draw_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.members.len()).collect();
        // `sort_by_key` is stable, which is what keeps the tie-break.
        order.sort_by_key(|&i| self.members[i].z_index);
        order
    }

    /// Pastes `frame` into the member's region; `false` if it was rejected.
    fn composite(&mut self, index: usize, frame: &Canvas) -> bool {
        let member = &self.members[index];
        let placement = member.placement;
        let id = member.plugin.id();

        if self.debug_borders {
            self.canvas
                .draw_border(placement.inflate(DEBUG_BORDER_WIDTH), random_color());
        }
        match self.canvas.paste_into(frame, placement) {
            Ok(()) => true,
            Err(e) => {
                warn!(layout = %self.id, plugin = %id, "skipping plugin frame: {e}");
                false
            }
        }
    }

    /// Re-pastes the member's last good frame, if it has one.
    fn repaint_last_frame(&mut self, index: usize) {
        if let Some(frame) = self.members[index].last_frame.take() {
            self.composite(index, &frame);
            self.members[index].last_frame = Some(frame);
        }
    }

    /// The area a plugin paints, including the debug border when enabled.
    fn painted_region(&self, placement: Placement) -> Placement {
        if self.debug_borders {
            placement.inflate(DEBUG_BORDER_WIDTH)
        } else {
            placement
        }
    }

    fn position(&self, id: PluginId) -> Option<usize> {
        self.members.iter().position(|m| m.plugin.id() == id)
    }

    fn member(&self, plugin: &PluginHandle) -> Option<&Member> {
        self.position(plugin.id()).map(|i| &self.members[i])
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("plugins", &self.members.len())
            .field("size", &self.canvas.dimensions())
            .field("visible", &self.visible)
            .finish()
    }
}

/// Result of asking one plugin for a frame.
enum DrawOutcome {
    Frame(Canvas),
    /// The plugin had nothing to show.
    Empty,
    /// The draw errored or missed the deadline.
    Failed,
}

/// Runs one plugin draw under [`PLUGIN_DRAW_TIMEOUT`], logging any failure.
async fn draw_with_deadline(plugin: &PluginHandle) -> DrawOutcome {
    match tokio::time::timeout(PLUGIN_DRAW_TIMEOUT, plugin.draw()).await {
        Ok(Ok(Some(frame))) => DrawOutcome::Frame(frame),
        Ok(Ok(None)) => DrawOutcome::Empty,
        Ok(Err(e)) => {
            warn!(plugin = %plugin.id(), "plugin draw failed: {e}");
            DrawOutcome::Failed
        }
        Err(_) => {
            warn!(
                plugin = %plugin.id(),
                "plugin draw exceeded {}ms deadline",
                PLUGIN_DRAW_TIMEOUT.as_millis()
            );
            DrawOutcome::Failed
        }
    }
}

/// Logs a failed lifecycle hook.  Hook failures never propagate.
pub(crate) fn report_hook(hook: &'static str, plugin: &PluginHandle, result: Result<(), PluginError>) {
    if let Err(e) = result {
        warn!(plugin = %plugin.id(), hook, "plugin hook failed: {e}");
    }
}

/// A fresh opaque colour for debug outlines.
///
/// The bytes come from the random source behind v4 UUIDs.
fn random_color() -> Color {
    let bytes = Uuid::new_v4().into_bytes();
    Color::rgb(bytes[0], bytes[1], bytes[2])
}
