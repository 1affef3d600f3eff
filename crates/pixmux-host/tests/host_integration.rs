//! End-to-end tests: TOML configuration → layouts → main loop → sink.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use pixmux_core::{
    Canvas, Color, DisplaySink, MemorySink, Plugin, PluginContext, PluginError, SinkError,
};
use pixmux_host::application::build_display::build_display;
use pixmux_host::application::run_display::{run_display, RunOptions};
use pixmux_host::infrastructure::storage::config::AppConfig;
use pixmux_host::plugins::builtin_registry;

mock! {
    pub Sink {}

    #[async_trait]
    impl DisplaySink for Sink {
        async fn push(&self, frame: &Canvas) -> Result<(), SinkError>;
    }
}

const TWO_LAYOUTS: &str = r##"
[display]
width = 8
height = 8
refresh_interval_ms = 0

[sink]
kind = "headless"

[[plugins]]
id = "red"
factory = "solid"
options = { color = "#ff0000" }

[[layouts]]
name = "left"
plugins = [{ shared = "red", x = 0, y = 0, width = 4, height = 8 }]

[[layouts]]
name = "right"
plugins = [
    { shared = "red", x = 4, y = 0, width = 4, height = 8 },
    { factory = "solid", options = { color = "#0000ff" }, x = 0, y = 0, width = 2, height = 2, z_index = 1 },
]
"##;

fn after(ms: u64) -> impl std::future::Future<Output = ()> {
    tokio::time::sleep(Duration::from_millis(ms))
}

#[tokio::test]
async fn test_configured_start_layout_is_drawn_and_pushed() {
    // Arrange
    let mut config: AppConfig = toml::from_str(TWO_LAYOUTS).unwrap();
    config.rotation.start_layout = Some("right".into());
    let sink = Arc::new(MemorySink::new());
    let mut display = build_display(&config, builtin_registry()).unwrap();
    display
        .manager
        .set_sink(Some(Arc::clone(&sink) as Arc<dyn DisplaySink>));

    // Act
    run_display(&mut display, RunOptions::from_config(&config), after(20))
        .await
        .unwrap();

    // Assert
    assert_eq!(sink.frame_count(), 1);
    let frame = sink.last_frame().unwrap();
    assert_eq!(frame.dimensions(), (8, 8));
    assert_eq!(frame.pixel(0, 0), Some(Color::rgb(0, 0, 255)));
    assert_eq!(frame.pixel(3, 7), Some(Color::BLACK));
    assert_eq!(frame.pixel(6, 4), Some(Color::rgb(255, 0, 0)));
}

#[tokio::test]
async fn test_rotation_timer_cycles_through_layouts() {
    // Arrange
    let config: AppConfig = toml::from_str(TWO_LAYOUTS).unwrap();
    let sink = Arc::new(MemorySink::new());
    let mut display = build_display(&config, builtin_registry()).unwrap();
    display
        .manager
        .set_sink(Some(Arc::clone(&sink) as Arc<dyn DisplaySink>));
    let options = RunOptions {
        refresh: None,
        rotation: Some(Duration::from_millis(30)),
    };

    // Act
    run_display(&mut display, options, after(100)).await.unwrap();

    // Assert: the shared red plugin moved between the left and right halves.
    let frames = sink.take_frames();
    assert!(frames.len() >= 3, "only {} frames", frames.len());
    let red = Some(Color::rgb(255, 0, 0));
    assert_eq!(frames[0].pixel(1, 4), red);
    assert_eq!(frames[1].pixel(6, 4), red);
    assert_eq!(frames[1].pixel(1, 4), Some(Color::BLACK));
    assert_eq!(frames[2].pixel(1, 4), red);
}

#[tokio::test]
async fn test_periodic_refresh_pushes_full_frames() {
    let config: AppConfig = toml::from_str(TWO_LAYOUTS).unwrap();
    let sink = Arc::new(MemorySink::new());
    let mut display = build_display(&config, builtin_registry()).unwrap();
    display
        .manager
        .set_sink(Some(Arc::clone(&sink) as Arc<dyn DisplaySink>));
    let options = RunOptions {
        refresh: Some(Duration::from_millis(20)),
        rotation: None,
    };

    run_display(&mut display, options, after(90)).await.unwrap();

    assert!(sink.frame_count() >= 3, "only {} frames", sink.frame_count());
}

/// Asks for its own redraw as soon as it becomes visible.
struct Eager {
    ctx: PluginContext,
}

#[async_trait]
impl Plugin for Eager {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        Ok(Some(Canvas::filled(self.ctx.width, self.ctx.height, Color::WHITE)))
    }

    async fn resize_requested(&self, _width: u32, _height: u32) -> Result<(), PluginError> {
        Ok(())
    }

    async fn activated(&self) -> Result<(), PluginError> {
        self.ctx.request_draw();
        Ok(())
    }
}

#[tokio::test]
async fn test_plugin_draw_request_is_served_by_main_loop() {
    // Arrange: one push for the initial switch, one for the queued request.
    let config: AppConfig = toml::from_str(
        r#"
        [display]
        width = 4
        height = 4

        [[layouts]]
        name = "only"
        plugins = [{ factory = "eager", width = 4, height = 4 }]
        "#,
    )
    .unwrap();
    let mut registry = builtin_registry();
    registry.register("eager", |ctx: PluginContext| Ok(Eager { ctx }));
    let mut sink = MockSink::new();
    sink.expect_push()
        .times(2)
        .withf(|frame| frame.pixel(0, 0) == Some(Color::WHITE))
        .returning(|_| Ok(()));
    let mut display = build_display(&config, registry).unwrap();
    display.manager.set_sink(Some(Arc::new(sink)));

    // Act
    let options = RunOptions {
        refresh: None,
        rotation: None,
    };
    run_display(&mut display, options, after(50)).await.unwrap();

    // Assert: expectations are verified when the sink is dropped.
    drop(display);
}

#[tokio::test]
async fn test_failing_sink_does_not_stop_the_loop() {
    let config: AppConfig = toml::from_str(TWO_LAYOUTS).unwrap();
    let mut sink = MockSink::new();
    sink.expect_push()
        .returning(|_| Err(SinkError::Device("unplugged".into())));
    let mut display = build_display(&config, builtin_registry()).unwrap();
    display.manager.set_sink(Some(Arc::new(sink)));
    let options = RunOptions {
        refresh: Some(Duration::from_millis(10)),
        rotation: None,
    };

    let result = run_display(&mut display, options, after(40)).await;

    assert!(result.is_ok());
}
