//! Integration tests for frame composition.
//!
//! These tests drive [`Layout::draw`] through the public API only, with
//! plugins that are slow, broken, or well-behaved.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pixmux_core::{
    Canvas, Color, Layout, Placement, Plugin, PluginError, PluginHandle, PLUGIN_DRAW_TIMEOUT,
};

const RED: Color = Color::rgb(200, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 200);

// ── Test plugins ──────────────────────────────────────────────────────────────

struct Solid {
    color: Color,
    size: Mutex<(u32, u32)>,
    draws: AtomicU32,
}

impl Solid {
    fn handle(color: Color, width: u32, height: u32) -> (PluginHandle, Arc<Solid>) {
        let plugin = Arc::new(Solid {
            color,
            size: Mutex::new((width, height)),
            draws: AtomicU32::new(0),
        });
        let handle = PluginHandle::with_id(
            pixmux_core::PluginId::new(),
            Arc::clone(&plugin) as Arc<dyn Plugin>,
        );
        (handle, plugin)
    }
}

#[async_trait]
impl Plugin for Solid {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        self.draws.fetch_add(1, Ordering::SeqCst);
        let (w, h) = *self.size.lock().unwrap();
        Ok(Some(Canvas::filled(w, h, self.color)))
    }

    async fn resize_requested(&self, width: u32, height: u32) -> Result<(), PluginError> {
        *self.size.lock().unwrap() = (width, height);
        Ok(())
    }
}

/// Never finishes drawing.
struct Hung;

#[async_trait]
impl Plugin for Hung {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        std::future::pending::<()>().await;
        Ok(None)
    }

    async fn resize_requested(&self, _width: u32, _height: u32) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Always fails to draw.
struct Broken;

#[async_trait]
impl Plugin for Broken {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        Err(PluginError::Failed("asset missing".into()))
    }

    async fn resize_requested(&self, _width: u32, _height: u32) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Finishes late but within the deadline, so it completes after faster plugins.
struct Sluggish {
    color: Color,
    size: (u32, u32),
}

#[async_trait]
impl Plugin for Sluggish {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(Some(Canvas::filled(self.size.0, self.size.1, self.color)))
    }

    async fn resize_requested(&self, _width: u32, _height: u32) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Has nothing to show.
struct Empty;

#[async_trait]
impl Plugin for Empty {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        Ok(None)
    }

    async fn resize_requested(&self, _width: u32, _height: u32) -> Result<(), PluginError> {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_overlapping_plugins_composite_by_z_index() {
    // Arrange: P at (0,0,32,32) z=0, Q at (16,16,32,32) z=1 on a 64x64 layout.
    let mut layout = Layout::new(64, 64);
    let (p, _) = Solid::handle(RED, 32, 32);
    let (q, _) = Solid::handle(BLUE, 32, 32);
    layout.add_plugin(&p, Placement::new(0, 0, 32, 32), 0).unwrap();
    layout.add_plugin(&q, Placement::new(16, 16, 32, 32), 1).unwrap();

    // Act
    let frame = layout.draw().await.clone();

    // Assert
    assert_eq!(frame.dimensions(), (64, 64));
    for (x, y) in [(16, 16), (24, 24), (31, 31)] {
        assert_eq!(frame.pixel(x, y), Some(BLUE), "overlap at ({x},{y})");
    }
    for (x, y) in [(0, 0), (15, 31), (31, 15)] {
        assert_eq!(frame.pixel(x, y), Some(RED), "P-only at ({x},{y})");
    }
    for (x, y) in [(47, 47), (32, 40), (40, 32)] {
        assert_eq!(frame.pixel(x, y), Some(BLUE), "Q-only at ({x},{y})");
    }
    assert_eq!(frame.pixel(63, 0), Some(Color::BLACK));
    assert_eq!(frame.pixel(0, 63), Some(Color::BLACK));
}

#[tokio::test]
async fn test_paste_order_does_not_depend_on_completion_order() {
    // Arrange: the lower plugin finishes last but must still be painted first.
    let mut layout = Layout::new(8, 8);
    layout
        .add_plugin(
            PluginHandle::new(Sluggish {
                color: RED,
                size: (8, 8),
            }),
            Placement::new(0, 0, 8, 8),
            0,
        )
        .unwrap();
    let (top, _) = Solid::handle(BLUE, 8, 8);
    layout.add_plugin(&top, Placement::new(0, 0, 8, 8), 1).unwrap();

    // Act
    let frame = layout.draw().await;

    // Assert
    assert_eq!(frame.pixel(4, 4), Some(BLUE));
}

#[tokio::test]
async fn test_hung_plugin_does_not_stall_frame() {
    // Arrange
    let mut layout = Layout::new(16, 8);
    layout
        .add_plugin(PluginHandle::new(Hung), Placement::new(0, 0, 8, 8), 0)
        .unwrap();
    let (ok, _) = Solid::handle(BLUE, 8, 8);
    layout.add_plugin(&ok, Placement::new(8, 0, 8, 8), 0).unwrap();

    // Act
    let started = Instant::now();
    let frame = layout.draw().await.clone();
    let elapsed = started.elapsed();

    // Assert
    assert!(
        elapsed < PLUGIN_DRAW_TIMEOUT + Duration::from_millis(400),
        "frame took {elapsed:?}"
    );
    assert_eq!(frame.dimensions(), (16, 8));
    assert_eq!(frame.pixel(0, 0), Some(Color::BLACK));
    assert_eq!(frame.pixel(8, 0), Some(BLUE));
}

#[tokio::test]
async fn test_frame_has_layout_size_when_every_plugin_fails() {
    let mut layout = Layout::new(20, 10);
    layout
        .add_plugin(PluginHandle::new(Broken), Placement::new(0, 0, 10, 10), 0)
        .unwrap();
    layout
        .add_plugin(PluginHandle::new(Empty), Placement::new(10, 0, 10, 10), 0)
        .unwrap();
    layout
        .add_plugin(PluginHandle::new(Hung), Placement::new(5, 5, 10, 10), 2)
        .unwrap();

    let frame = layout.draw().await;

    assert_eq!(frame.dimensions(), (20, 10));
    assert_eq!(frame.pixel(5, 5), Some(Color::BLACK));
}

#[tokio::test]
async fn test_removed_plugin_is_never_drawn_again() {
    // Arrange
    let mut layout = Layout::new(8, 8);
    let (p, probe) = Solid::handle(RED, 8, 8);
    layout.add_plugin(&p, Placement::new(0, 0, 8, 8), 0).unwrap();
    layout.draw().await;
    assert_eq!(probe.draws.load(Ordering::SeqCst), 1);

    // Act
    layout.remove_plugin(&p).await.unwrap();
    let frame = layout.draw().await.clone();
    layout.draw().await;

    // Assert
    assert_eq!(probe.draws.load(Ordering::SeqCst), 1);
    assert_eq!(frame.pixel(0, 0), Some(Color::BLACK));
}

#[tokio::test]
async fn test_translucent_plugin_blends_over_lower_plugin() {
    // Arrange
    let mut layout = Layout::new(4, 1);
    let (base, _) = Solid::handle(RED, 4, 1);
    layout.add_plugin(&base, Placement::new(0, 0, 4, 1), 0).unwrap();

    struct Dot;
    #[async_trait]
    impl Plugin for Dot {
        async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
            let mut c = Canvas::transparent(4, 1);
            c.put_pixel(3, 0, Color::rgb(0, 0, 200));
            Ok(Some(c))
        }

        async fn resize_requested(&self, _w: u32, _h: u32) -> Result<(), PluginError> {
            Ok(())
        }
    }
    layout
        .add_plugin(PluginHandle::new(Dot), Placement::new(0, 0, 4, 1), 1)
        .unwrap();

    // Act
    let frame = layout.draw().await;

    // Assert
    assert_eq!(frame.pixel(0, 0), Some(RED));
    assert_eq!(frame.pixel(3, 0), Some(BLUE));
}
