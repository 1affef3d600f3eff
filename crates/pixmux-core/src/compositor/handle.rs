//! Plugin → display manager request channel.
//!
//! Plugins never hold a reference to the [`DisplayManager`]; doing so would
//! create an ownership cycle (the manager owns the layouts that own the
//! plugins) and would let a plugin re-enter the manager while it is in the
//! middle of a frame.  Instead each plugin gets a cheap, cloneable
//! [`DisplayHandle`] that queues a [`DisplayCommand`].  The manager drains the
//! queue in [`DisplayManager::run`] or [`DisplayManager::handle_command`].
//!
//! [`DisplayManager`]: super::display_manager::DisplayManager
//! [`DisplayManager::run`]: super::display_manager::DisplayManager::run
//! [`DisplayManager::handle_command`]: super::display_manager::DisplayManager::handle_command

use tokio::sync::mpsc;

use crate::plugin::PluginId;

/// A request queued for the display manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommand {
    /// Redraw only this plugin's region and push the frame.
    PluginDraw(PluginId),
    /// Redraw the whole current layout and push the frame.
    Refresh,
}

/// Cloneable sender half of the display manager's command queue.
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    tx: mpsc::UnboundedSender<DisplayCommand>,
}

impl DisplayHandle {
    /// Creates a connected handle / receiver pair.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DisplayCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Creates a handle whose requests go nowhere.
    ///
    /// Useful for plugins constructed outside a display manager, e.g. in tests.
    pub fn detached() -> Self {
        let (handle, _rx) = Self::channel();
        handle
    }

    /// Queues an out-of-cycle redraw of `plugin`.
    ///
    /// Returns `false` if the display manager has been dropped.
    pub fn request_draw(&self, plugin: PluginId) -> bool {
        self.tx.send(DisplayCommand::PluginDraw(plugin)).is_ok()
    }

    /// Queues a full redraw of the current layout.
    pub fn request_refresh(&self) -> bool {
        self.tx.send(DisplayCommand::Refresh).is_ok()
    }

    /// Returns `true` once the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
