//! `test`: four-quadrant colour pattern for checking placement and wiring.
//!
//! Top-left blue, top-right magenta, bottom-left yellow, bottom-right grey.
//! Takes no options.

use std::sync::Mutex;

use async_trait::async_trait;
use pixmux_core::{Canvas, Color, LayoutId, Placement, Plugin, PluginContext, PluginError, PluginId};
use tracing::{debug, info};

const TOP_LEFT: Color = Color::rgb(0, 0, 255);
const TOP_RIGHT: Color = Color::rgb(255, 0, 255);
const BOTTOM_LEFT: Color = Color::rgb(255, 255, 0);
const BOTTOM_RIGHT: Color = Color::rgb(127, 127, 127);

/// Quadrant test pattern.
#[derive(Debug)]
pub struct TestPattern {
    id: PluginId,
    size: Mutex<(u32, u32)>,
}

impl TestPattern {
    /// Factory registered as `"test"`.
    pub fn setup(ctx: PluginContext) -> Result<Self, PluginError> {
        Ok(Self {
            id: ctx.id,
            size: Mutex::new((ctx.width, ctx.height)),
        })
    }
}

/// Paints the quadrant pattern at `width` x `height`.
pub fn render_pattern(width: u32, height: u32) -> Canvas {
    let mut canvas = Canvas::new(width, height);
    let (hw, hh) = (width / 2, height / 2);
    canvas.fill_rect(Placement::new(0, 0, hw, hh), TOP_LEFT);
    canvas.fill_rect(Placement::new(hw as i32, 0, width - hw, hh), TOP_RIGHT);
    canvas.fill_rect(Placement::new(0, hh as i32, hw, height - hh), BOTTOM_LEFT);
    canvas.fill_rect(
        Placement::new(hw as i32, hh as i32, width - hw, height - hh),
        BOTTOM_RIGHT,
    );
    canvas
}

#[async_trait]
impl Plugin for TestPattern {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        let (w, h) = *self.size.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Some(render_pattern(w, h)))
    }

    async fn resize_requested(&self, width: u32, height: u32) -> Result<(), PluginError> {
        info!(plugin = %self.id, "test pattern resized to {width}x{height}");
        *self.size.lock().unwrap_or_else(|e| e.into_inner()) = (width, height);
        Ok(())
    }

    async fn activated(&self) -> Result<(), PluginError> {
        debug!(plugin = %self.id, "test pattern activated");
        Ok(())
    }

    async fn deactivated(&self) -> Result<(), PluginError> {
        debug!(plugin = %self.id, "test pattern deactivated");
        Ok(())
    }

    async fn layout_switched(
        &self,
        previous: Option<LayoutId>,
        current: LayoutId,
    ) -> Result<(), PluginError> {
        debug!(plugin = %self.id, ?previous, %current, "test pattern saw layout switch");
        Ok(())
    }

    async fn screen_updated(&self) -> Result<(), PluginError> {
        debug!(plugin = %self.id, "test pattern on screen");
        Ok(())
    }
}
