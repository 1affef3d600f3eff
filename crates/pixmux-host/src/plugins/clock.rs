//! `clock`: digital clock drawn with a built-in 3x5 pixel font.
//!
//! Options:
//!
//! | Key                  | Type    | Default | Meaning                         |
//! |----------------------|---------|---------|---------------------------------|
//! | `show_seconds`       | bool    | `false` | draw `HH:MM:SS` instead of `HH:MM` |
//! | `utc_offset_minutes` | integer | `0`     | offset of the displayed time from UTC |
//! | `color`              | string  | none    | `#rrggbb`; overrides the default palette |
//!
//! The text is scaled up by the largest whole factor that still fits the
//! region.  When even the smallest single line is too wide, hours, minutes and
//! seconds are stacked on separate lines, each in its own colour.
//!
//! While visible the clock asks for a redraw of its own region once per second.

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use pixmux_core::{Canvas, Color, Placement, Plugin, PluginContext, PluginError};
use serde::Deserialize;
use tracing::debug;

use super::solid::parse_color;
use super::ticker::Ticker;

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
/// Horizontal distance between glyph origins, in unscaled pixels.
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;
/// Vertical distance between stacked lines, in unscaled pixels.
const LINE_ADVANCE: u32 = GLYPH_HEIGHT + 1;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClockOptions {
    show_seconds: bool,
    utc_offset_minutes: i32,
    color: Option<String>,
}

/// Wall-clock time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl TimeOfDay {
    /// Converts seconds since the Unix epoch, shifted by `offset_minutes`.
    pub fn from_unix(secs: i64, offset_minutes: i32) -> Self {
        let local = (secs + i64::from(offset_minutes) * 60).rem_euclid(SECONDS_PER_DAY);
        Self {
            hours: (local / 3600) as u8,
            minutes: (local / 60 % 60) as u8,
            seconds: (local % 60) as u8,
        }
    }

    fn fields(&self, show_seconds: bool) -> Vec<String> {
        let mut fields = vec![format!("{:02}", self.hours), format!("{:02}", self.minutes)];
        if show_seconds {
            fields.push(format!("{:02}", self.seconds));
        }
        fields
    }
}

/// Digital clock plugin.
#[derive(Debug)]
pub struct Clock {
    ctx: PluginContext,
    show_seconds: bool,
    utc_offset_minutes: i32,
    color: Option<Color>,
    size: Mutex<(u32, u32)>,
    ticker: Ticker,
}

impl Clock {
    /// Factory registered as `"clock"`.
    pub fn setup(ctx: PluginContext) -> Result<Self, PluginError> {
        let options: ClockOptions = ctx.parse_options()?;
        let color = options.color.as_deref().map(parse_color).transpose()?;
        Ok(Self {
            size: Mutex::new((ctx.width, ctx.height)),
            show_seconds: options.show_seconds,
            utc_offset_minutes: options.utc_offset_minutes,
            color,
            ticker: Ticker::new(),
            ctx,
        })
    }

    /// Whether the once-per-second redraw task is running.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    fn now(&self) -> TimeOfDay {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        TimeOfDay::from_unix(secs, self.utc_offset_minutes)
    }
}

#[async_trait]
impl Plugin for Clock {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        let (w, h) = *self.size.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Some(render_time(
            self.now(),
            self.show_seconds,
            self.color,
            w,
            h,
        )))
    }

    async fn resize_requested(&self, width: u32, height: u32) -> Result<(), PluginError> {
        *self.size.lock().unwrap_or_else(|e| e.into_inner()) = (width, height);
        Ok(())
    }

    async fn activated(&self) -> Result<(), PluginError> {
        let ctx = self.ctx.clone();
        self.ticker
            .start(Duration::from_secs(1), move || ctx.request_draw());
        debug!(plugin = %self.ctx.id, "clock ticking");
        Ok(())
    }

    async fn deactivated(&self) -> Result<(), PluginError> {
        self.ticker.stop();
        debug!(plugin = %self.ctx.id, "clock stopped");
        Ok(())
    }

    async fn teardown(&self) -> Result<(), PluginError> {
        self.ticker.stop();
        Ok(())
    }
}

/// Renders `time` onto a transparent `width` x `height` canvas.
pub fn render_time(
    time: TimeOfDay,
    show_seconds: bool,
    color: Option<Color>,
    width: u32,
    height: u32,
) -> Canvas {
    let mut canvas = Canvas::transparent(width, height);
    let fields = time.fields(show_seconds);

    let line = fields.join(":");
    let line_width = text_width(line.len() as u32);
    if let Some(scale) = fit_scale(line_width, GLYPH_HEIGHT, width, height) {
        draw_text(&mut canvas, &line, 0, 0, scale, color.unwrap_or(Color::WHITE));
        return canvas;
    }

    // Stacked: one field per line.
    let stack_height = fields.len() as u32 * LINE_ADVANCE - 1;
    let scale = fit_scale(text_width(2), stack_height, width, height).unwrap_or(1);
    for (index, field) in fields.iter().enumerate() {
        let y = (index as u32 * LINE_ADVANCE * scale) as i32;
        let fill = color.unwrap_or_else(|| line_color(index as u8));
        draw_text(&mut canvas, field, 0, y, scale, fill);
    }
    canvas
}

/// Palette for stacked lines: darker blue-green at the top, brighter below.
fn line_color(index: u8) -> Color {
    let i = index.min(2);
    Color::rgb(15 * i, 60 * (i + 1), 60 * (i + 2))
}

/// Unscaled width of `chars` glyphs.
fn text_width(chars: u32) -> u32 {
    (chars * GLYPH_ADVANCE).saturating_sub(1)
}

/// Largest whole scale at which a `w` x `h` block fits, if any.
fn fit_scale(w: u32, h: u32, max_w: u32, max_h: u32) -> Option<u32> {
    let scale = (max_w / w.max(1)).min(max_h / h.max(1));
    (scale > 0).then_some(scale)
}

fn draw_text(canvas: &mut Canvas, text: &str, x: i32, y: i32, scale: u32, color: Color) {
    let step = (GLYPH_ADVANCE * scale) as i32;
    for (index, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let gx = x + index as i32 * step;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0b100 >> col) != 0 {
                    canvas.fill_rect(
                        Placement::new(
                            gx + (col * scale) as i32,
                            y + (row as u32 * scale) as i32,
                            scale,
                            scale,
                        ),
                        color,
                    );
                }
            }
        }
    }
}

/// 3x5 bitmap, one row per entry, most significant of the low three bits leftmost.
fn glyph(ch: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    Some(match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixmux_core::{DisplayCommand, DisplayHandle, PluginId, PluginOptions};

    const NOON_ISH: TimeOfDay = TimeOfDay {
        hours: 12,
        minutes: 34,
        seconds: 56,
    };

    #[test]
    fn test_time_of_day_applies_offset_and_wraps() {
        assert_eq!(
            TimeOfDay::from_unix(0, 0),
            TimeOfDay {
                hours: 0,
                minutes: 0,
                seconds: 0
            }
        );
        assert_eq!(
            TimeOfDay::from_unix(3 * 3600 + 5, -4 * 60),
            TimeOfDay {
                hours: 23,
                minutes: 0,
                seconds: 5
            }
        );
    }

    #[test]
    fn test_single_line_is_scaled_to_fit() {
        // "12:34" is 19x5 unscaled; 64x16 fits scale 3.
        let canvas = render_time(NOON_ISH, false, None, 64, 16);

        assert_eq!(canvas.dimensions(), (64, 16));
        // Top row of '1' is 010: middle column lit, left column clear.
        assert_eq!(canvas.pixel(3, 0), Some(Color::WHITE));
        assert_eq!(canvas.pixel(5, 2), Some(Color::WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(Color::TRANSPARENT));
        // Nothing below the scaled text.
        assert_eq!(canvas.pixel(3, 15), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_narrow_region_stacks_fields_with_palette() {
        // "12:34:56" needs 31px; an 8px wide region forces stacking.
        let canvas = render_time(NOON_ISH, true, None, 8, 20);

        assert_eq!(canvas.pixel(1, 0), Some(line_color(0)));
        assert_eq!(canvas.pixel(0, 6), Some(line_color(1)));
        assert_eq!(canvas.pixel(0, 12), Some(line_color(2)));
    }

    #[test]
    fn test_configured_colour_overrides_palette() {
        let red = Color::rgb(255, 0, 0);

        let canvas = render_time(NOON_ISH, true, Some(red), 8, 20);

        assert_eq!(canvas.pixel(0, 6), Some(red));
    }

    #[test]
    fn test_invalid_colour_option_fails_setup() {
        let mut options = PluginOptions::new();
        options.insert("color".into(), toml::Value::String("blue".into()));
        let ctx = PluginContext {
            id: PluginId::new(),
            width: 16,
            height: 8,
            display: DisplayHandle::detached(),
            options,
        };

        assert!(matches!(
            Clock::setup(ctx),
            Err(PluginError::InvalidOptions(_))
        ));
    }

    #[tokio::test]
    async fn test_activated_clock_requests_redraws_until_deactivated() {
        // Arrange
        let (display, mut requests) = DisplayHandle::channel();
        let id = PluginId::new();
        let clock = Clock::setup(PluginContext {
            id,
            width: 16,
            height: 8,
            display,
            options: PluginOptions::new(),
        })
        .unwrap();

        // Act
        clock.activated().await.unwrap();
        let first = tokio::time::timeout(Duration::from_millis(1500), requests.recv()).await;
        clock.deactivated().await.unwrap();

        // Assert
        assert_eq!(first.unwrap(), Some(DisplayCommand::PluginDraw(id)));
        assert!(!clock.is_ticking());
    }
}
