//! DisplayManager: owns the layouts, switches between them, and feeds the sink.
//!
//! # Layout switch ordering
//!
//! [`DisplayManager::switch_layout`] fires callbacks in a fixed order:
//!
//! ```text
//! 1. partition plugins      shared / deactivating / activating
//! 2. deactivated()          on every deactivating plugin   (concurrently)
//! 3. activated()            on every activating plugin     (concurrently)
//! 4. layout_switched()      on all three groups            (concurrently)
//! 5. old layout hook        Layout::deactivated(target)
//! 6. current = target
//! 7. changeover             resize every plugin of the target layout
//! 8. new layout hook        Layout::activated(previous)
//! 9. full display update    draw + screen_updated + push
//! ```
//!
//! Plugin-level callbacks run before the layout-level hooks so a layout
//! behaviour can rely on its plugins' state being settled.  The resize runs
//! after the target is marked current, and the frame is drawn last so it
//! reflects the post-switch state.
//!
//! A plugin that fails any callback is logged and otherwise ignored; the
//! switch always completes.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::handle::{DisplayCommand, DisplayHandle};
use super::layout::{
    report_hook, DefaultLayoutBehavior, Layout, LayoutBehavior, LayoutError, LayoutId,
};
use super::sink::DisplaySink;
use crate::domain::canvas::Canvas;
use crate::domain::placement::{Placement, PlacementUpdate};
use crate::plugin::registry::PluginRegistry;
use crate::plugin::{PluginContext, PluginHandle, PluginId, PluginOptions};

/// Screen settings applied to every layout the manager creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Outline every plugin region (see [`Layout::set_debug_borders`]).
    pub debug_borders: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            debug_borders: false,
        }
    }
}

/// Errors returned by display manager operations.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The layout was not created by this display manager.
    #[error("layout {0} is not registered with this display manager")]
    LayoutNotRegistered(LayoutId),

    /// An operation needed a current layout before the first switch.
    #[error("no layout is currently selected")]
    NoCurrentLayout,

    /// A layout-level registration error.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Owns all layouts, tracks the current one, and pushes frames to the sink.
pub struct DisplayManager {
    config: DisplayConfig,
    layouts: HashMap<LayoutId, Layout>,
    /// Creation order, for stable iteration.
    order: Vec<LayoutId>,
    current: Option<LayoutId>,
    sink: Option<Arc<dyn DisplaySink>>,
    registry: Arc<PluginRegistry>,
    handle: DisplayHandle,
    commands: mpsc::UnboundedReceiver<DisplayCommand>,
}

impl DisplayManager {
    /// Creates a manager with no layouts and no sink (headless).
    pub fn new(config: DisplayConfig, registry: PluginRegistry) -> Self {
        let (handle, commands) = DisplayHandle::channel();
        Self {
            config,
            layouts: HashMap::new(),
            order: Vec::new(),
            current: None,
            sink: None,
            registry: Arc::new(registry),
            handle,
            commands,
        }
    }

    /// Sets the sink finished frames are pushed to.
    pub fn with_sink(mut self, sink: Arc<dyn DisplaySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replaces the sink; `None` switches to headless mode.
    pub fn set_sink(&mut self, sink: Option<Arc<dyn DisplaySink>>) {
        self.sink = sink;
    }

    pub fn config(&self) -> DisplayConfig {
        self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// A handle plugins can use to queue redraw requests.
    pub fn display_handle(&self) -> DisplayHandle {
        self.handle.clone()
    }

    /// Builds a construction context for a plugin created outside a factory.
    ///
    /// Wrap the resulting plugin with [`PluginHandle::with_id`] using
    /// `ctx.id` so its draw requests reach this manager.
    pub fn plugin_context(&self, width: u32, height: u32, options: PluginOptions) -> PluginContext {
        PluginContext {
            id: PluginId::new(),
            width,
            height,
            display: self.handle.clone(),
            options,
        }
    }

    /// Creates and registers a plain layout sized to the screen.
    pub fn new_layout(&mut self) -> &mut Layout {
        self.new_layout_with(DefaultLayoutBehavior)
    }

    /// Creates and registers a layout with custom layout-level hooks.
    pub fn new_layout_with(&mut self, behavior: impl LayoutBehavior + 'static) -> &mut Layout {
        let mut layout = Layout::with_parts(
            self.config.width,
            self.config.height,
            self.handle.clone(),
            Arc::clone(&self.registry),
            Box::new(behavior),
        );
        layout.set_debug_borders(self.config.debug_borders);
        let id = layout.id();
        self.order.push(id);
        self.layouts.entry(id).or_insert(layout)
    }

    /// All layouts in creation order.
    pub fn layouts(&self) -> impl Iterator<Item = &Layout> {
        self.order.iter().filter_map(|id| self.layouts.get(id))
    }

    pub fn layout(&self, id: LayoutId) -> Option<&Layout> {
        self.layouts.get(&id)
    }

    pub fn layout_mut(&mut self, id: LayoutId) -> Option<&mut Layout> {
        self.layouts.get_mut(&id)
    }

    /// Finds the first layout (in creation order) with the given name.
    pub fn layout_by_name(&self, name: &str) -> Option<&Layout> {
        self.layouts().find(|l| l.name() == Some(name))
    }

    pub fn current_layout_id(&self) -> Option<LayoutId> {
        self.current
    }

    pub fn current_layout(&self) -> Option<&Layout> {
        self.current.and_then(|id| self.layouts.get(&id))
    }

    /// Makes `target` the current layout, running all lifecycle callbacks.
    ///
    /// See the [module documentation](self) for the exact ordering.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::LayoutNotRegistered`] if `target` was not
    /// created by this manager.  Plugin callback failures are logged and never
    /// abort the switch.
    pub async fn switch_layout(&mut self, target: LayoutId) -> Result<(), DisplayError> {
        let incoming: Vec<PluginHandle> = self
            .layouts
            .get(&target)
            .ok_or(DisplayError::LayoutNotRegistered(target))?
            .plugins()
            .cloned()
            .collect();
        let previous = self.current;
        let outgoing: Vec<PluginHandle> = previous
            .and_then(|id| self.layouts.get(&id))
            .map(|l| l.plugins().cloned().collect())
            .unwrap_or_default();

        // 1. Partition
        let incoming_ids: HashSet<PluginId> = incoming.iter().map(PluginHandle::id).collect();
        let outgoing_ids: HashSet<PluginId> = outgoing.iter().map(PluginHandle::id).collect();
        let (shared, activating): (Vec<PluginHandle>, Vec<PluginHandle>) = incoming
            .into_iter()
            .partition(|p| outgoing_ids.contains(&p.id()));
        let deactivating: Vec<PluginHandle> = outgoing
            .into_iter()
            .filter(|p| !incoming_ids.contains(&p.id()))
            .collect();

        info!(
            from = ?previous.map(|id| id.to_string()),
            to = %target,
            shared = shared.len(),
            activating = activating.len(),
            deactivating = deactivating.len(),
            "switching layout"
        );

        // 2. Deactivate
        let results = join_all(deactivating.iter().map(|p| p.deactivated())).await;
        for (plugin, result) in deactivating.iter().zip(results) {
            report_hook("deactivated", plugin, result);
        }

        // 3. Activate
        let results = join_all(activating.iter().map(|p| p.activated())).await;
        for (plugin, result) in activating.iter().zip(results) {
            report_hook("activated", plugin, result);
        }

        // 4. Layout switched, for everyone involved
        let involved: Vec<&PluginHandle> = shared
            .iter()
            .chain(activating.iter())
            .chain(deactivating.iter())
            .collect();
        let results = join_all(involved.iter().map(|p| p.layout_switched(previous, target))).await;
        for (plugin, result) in involved.iter().zip(results) {
            report_hook("layout_switched", plugin, result);
        }

        // 5. Old layout hook
        if let Some(prev) = previous {
            if let Some(layout) = self.layouts.get_mut(&prev) {
                layout.deactivated(target).await;
            }
        }

        // 6. Mark current
        self.current = Some(target);

        // 7 + 8. Changeover, then new layout hook
        let layout = self
            .layouts
            .get_mut(&target)
            .ok_or(DisplayError::LayoutNotRegistered(target))?;
        layout.handle_plugin_changeover().await;
        layout.activated(previous).await;

        // 9. Full frame
        self.update_display(None).await?;
        debug!(layout = %target, "layout switch complete");
        Ok(())
    }

    /// Pushes a frame of the current layout to the sink.
    ///
    /// With `frame == None` the current layout is fully redrawn first.  In
    /// both cases the layout's plugins are told via `screen_updated()` before
    /// the frame is pushed.  Without a sink the frame is dropped silently.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::NoCurrentLayout`] before the first switch.
    pub async fn update_display(&mut self, frame: Option<Canvas>) -> Result<(), DisplayError> {
        let id = self.current.ok_or(DisplayError::NoCurrentLayout)?;
        let layout = self
            .layouts
            .get_mut(&id)
            .ok_or(DisplayError::LayoutNotRegistered(id))?;

        let frame = match frame {
            Some(frame) => frame,
            None => layout.draw().await.clone(),
        };
        layout.screen_updated().await;
        self.push(&frame).await;
        Ok(())
    }

    /// Redraws only `plugin` and pushes the result.
    ///
    /// Returns `Ok(true)` if a frame was pushed, and `Ok(false)` when the
    /// plugin is not part of the current layout or produced nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::NoCurrentLayout`] before the first switch.
    pub async fn request_plugin_immediate_draw(
        &mut self,
        plugin: &PluginHandle,
    ) -> Result<bool, DisplayError> {
        let id = self.current.ok_or(DisplayError::NoCurrentLayout)?;
        let layout = self
            .layouts
            .get_mut(&id)
            .ok_or(DisplayError::LayoutNotRegistered(id))?;

        if !layout.contains(plugin) {
            debug!(plugin = %plugin.id(), "draw requested by a plugin outside the current layout");
            return Ok(false);
        }
        let frame = match layout.plugin_draw_requested(plugin).await? {
            Some(canvas) => canvas.clone(),
            None => return Ok(false),
        };
        self.update_display(Some(frame)).await?;
        Ok(true)
    }

    /// Removes `plugin` from a layout, optionally refreshing the display.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::LayoutNotRegistered`] or the layout's
    /// [`LayoutError::PluginNotRegistered`].
    pub async fn remove_plugin(
        &mut self,
        layout: LayoutId,
        plugin: &PluginHandle,
        redraw: bool,
    ) -> Result<(), DisplayError> {
        self.layouts
            .get_mut(&layout)
            .ok_or(DisplayError::LayoutNotRegistered(layout))?
            .remove_plugin(plugin)
            .await?;
        self.redraw_if(redraw).await
    }

    /// Changes a plugin's placement in a layout, optionally refreshing the display.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::LayoutNotRegistered`] or the layout's
    /// [`LayoutError::PluginNotRegistered`].
    pub async fn change_plugin_coords(
        &mut self,
        layout: LayoutId,
        plugin: &PluginHandle,
        update: PlacementUpdate,
        redraw: bool,
    ) -> Result<Placement, DisplayError> {
        let placement = self
            .layouts
            .get_mut(&layout)
            .ok_or(DisplayError::LayoutNotRegistered(layout))?
            .change_plugin_coords(plugin, update)
            .await?;
        self.redraw_if(redraw).await?;
        Ok(placement)
    }

    /// Serves one queued request.
    ///
    /// Returns whether a frame was pushed.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::NoCurrentLayout`] if a request arrives before
    /// the first switch.
    pub async fn handle_command(&mut self, command: DisplayCommand) -> Result<bool, DisplayError> {
        match command {
            DisplayCommand::PluginDraw(id) => {
                let plugin = self
                    .current_layout()
                    .ok_or(DisplayError::NoCurrentLayout)?
                    .find(id)
                    .cloned();
                match plugin {
                    Some(plugin) => self.request_plugin_immediate_draw(&plugin).await,
                    None => {
                        debug!(plugin = %id, "dropping draw request from a plugin that is not visible");
                        Ok(false)
                    }
                }
            }
            DisplayCommand::Refresh => {
                self.update_display(None).await?;
                Ok(true)
            }
        }
    }

    /// Waits for the next queued request.
    pub async fn next_command(&mut self) -> Option<DisplayCommand> {
        self.commands.recv().await
    }

    /// Serves every request queued so far without waiting.
    ///
    /// Failures are logged.  Returns the number of requests served.
    pub async fn process_pending(&mut self) -> usize {
        let mut served = 0;
        while let Ok(command) = self.commands.try_recv() {
            if let Err(e) = self.handle_command(command).await {
                warn!("display request {command:?} failed: {e}");
            }
            served += 1;
        }
        served
    }

    /// Serves requests until `shutdown` resolves.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(command) = self.commands.recv() => {
                    if let Err(e) = self.handle_command(command).await {
                        warn!("display request {command:?} failed: {e}");
                    }
                }
            }
        }
        info!("display request loop stopped");
    }

    async fn redraw_if(&mut self, redraw: bool) -> Result<(), DisplayError> {
        if redraw && self.current.is_some() {
            self.update_display(None).await?;
        }
        Ok(())
    }

    async fn push(&self, frame: &Canvas) {
        match &self.sink {
            Some(sink) => {
                if let Err(e) = sink.push(frame).await {
                    warn!("display sink push failed: {e}");
                }
            }
            None => trace!("headless: frame dropped"),
        }
    }
}

impl std::fmt::Debug for DisplayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayManager")
            .field("config", &self.config)
            .field("layouts", &self.order)
            .field("current", &self.current)
            .field("headless", &self.sink.is_none())
            .finish()
    }
}
