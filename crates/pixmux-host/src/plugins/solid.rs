//! `solid`: fills its whole region with one colour.
//!
//! Options:
//!
//! | Key     | Type   | Default     | Meaning                          |
//! |---------|--------|-------------|----------------------------------|
//! | `color` | string | `"#ffffff"` | `#rrggbb` or `#rrggbbaa`         |
//!
//! A colour with alpha below `ff` is blended over whatever lies beneath.

use std::sync::Mutex;

use async_trait::async_trait;
use pixmux_core::{Canvas, Color, Plugin, PluginContext, PluginError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SolidOptions {
    color: String,
}

impl Default for SolidOptions {
    fn default() -> Self {
        Self {
            color: "#ffffff".to_string(),
        }
    }
}

/// Single-colour fill.
#[derive(Debug)]
pub struct Solid {
    color: Color,
    size: Mutex<(u32, u32)>,
}

impl Solid {
    /// Factory registered as `"solid"`.
    pub fn setup(ctx: PluginContext) -> Result<Self, PluginError> {
        let options: SolidOptions = ctx.parse_options()?;
        Ok(Self {
            color: parse_color(&options.color)?,
            size: Mutex::new((ctx.width, ctx.height)),
        })
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

#[async_trait]
impl Plugin for Solid {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        let (w, h) = *self.size.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Some(Canvas::filled(w, h, self.color)))
    }

    async fn resize_requested(&self, width: u32, height: u32) -> Result<(), PluginError> {
        *self.size.lock().unwrap_or_else(|e| e.into_inner()) = (width, height);
        Ok(())
    }
}

/// Parses `#rrggbb` or `#rrggbbaa` (the `#` is optional).
///
/// # Errors
///
/// Returns [`PluginError::InvalidOptions`] for any other shape.
pub fn parse_color(text: &str) -> Result<Color, PluginError> {
    let hex = text.trim().trim_start_matches('#');
    let invalid = || PluginError::InvalidOptions(format!("invalid colour {text:?}"));
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixmux_core::{DisplayHandle, PluginId, PluginOptions};

    fn context(options: PluginOptions) -> PluginContext {
        PluginContext {
            id: PluginId::new(),
            width: 3,
            height: 2,
            display: DisplayHandle::detached(),
            options,
        }
    }

    #[test]
    fn test_parse_color_accepts_rgb_and_rgba() {
        assert_eq!(parse_color("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(parse_color("00ff0080").unwrap(), Color::rgba(0, 255, 0, 128));
    }

    #[test]
    fn test_parse_color_rejects_malformed_input() {
        for bad in ["", "#fff", "#gg0000", "#12345", "#ÿÿÿ"] {
            assert!(
                matches!(parse_color(bad), Err(PluginError::InvalidOptions(_))),
                "{bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_draw_fills_current_size() {
        // Arrange
        let mut options = PluginOptions::new();
        options.insert("color".into(), toml::Value::String("#102030".into()));
        let solid = Solid::setup(context(options)).unwrap();

        // Act
        solid.resize_requested(5, 4).await.unwrap();
        let canvas = solid.draw().await.unwrap().unwrap();

        // Assert
        assert_eq!(canvas.dimensions(), (5, 4));
        assert_eq!(canvas.pixel(4, 3), Some(Color::rgb(16, 32, 48)));
        assert!(!canvas.has_alpha());
    }

    #[test]
    fn test_default_colour_is_white() {
        let solid = Solid::setup(context(PluginOptions::new())).unwrap();
        assert_eq!(solid.color(), Color::WHITE);
    }
}
