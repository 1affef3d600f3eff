//! `slideshow`: cycles through image files.
//!
//! Options:
//!
//! | Key         | Type            | Default | Meaning                        |
//! |-------------|-----------------|---------|--------------------------------|
//! | `images`    | array of paths  | `[]`    | files to show, in order        |
//! | `hold_secs` | integer         | `10`    | seconds each image stays up    |
//!
//! Images are decoded once, converted to RGBA and scaled to the region with
//! nearest-neighbour sampling.  With no images the plugin draws nothing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use pixmux_core::{Canvas, Plugin, PluginContext, PluginError};
use serde::Deserialize;
use tracing::{debug, info};

use super::ticker::Ticker;

fn default_hold_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
struct SlideshowOptions {
    #[serde(default)]
    images: Vec<PathBuf>,
    #[serde(default = "default_hold_secs")]
    hold_secs: u64,
}

/// Scaled copy of the slide shown last, reused while nothing changes.
#[derive(Debug)]
struct Rendered {
    index: usize,
    size: (u32, u32),
    canvas: Canvas,
}

/// Image slideshow plugin.
#[derive(Debug)]
pub struct Slideshow {
    ctx: PluginContext,
    hold: Duration,
    slides: Mutex<Vec<RgbaImage>>,
    current: Arc<AtomicUsize>,
    size: Mutex<(u32, u32)>,
    rendered: Mutex<Option<Rendered>>,
    ticker: Ticker,
}

impl Slideshow {
    /// Factory registered as `"slideshow"`.
    ///
    /// # Errors
    ///
    /// Fails if the options are malformed or any listed image cannot be read.
    pub fn setup(ctx: PluginContext) -> Result<Self, PluginError> {
        let options: SlideshowOptions = ctx.parse_options()?;
        let slideshow = Self {
            hold: Duration::from_secs(options.hold_secs),
            slides: Mutex::new(Vec::with_capacity(options.images.len())),
            current: Arc::new(AtomicUsize::new(0)),
            size: Mutex::new((ctx.width, ctx.height)),
            rendered: Mutex::new(None),
            ticker: Ticker::new(),
            ctx,
        };
        for path in &options.images {
            slideshow.add_image(path)?;
        }
        info!(
            plugin = %slideshow.ctx.id,
            "slideshow loaded {} image(s)",
            slideshow.len()
        );
        Ok(slideshow)
    }

    /// Decodes `path` and appends it to the rotation.
    pub fn add_image(&self, path: &Path) -> Result<(), PluginError> {
        let image = image::open(path)?.to_rgba8();
        debug!("slideshow image {} is {:?}", path.display(), image.dimensions());
        lock(&self.slides).push(image);
        Ok(())
    }

    pub fn len(&self) -> usize {
        lock(&self.slides).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the slide the next draw shows.
    pub fn current_index(&self) -> usize {
        match self.len() {
            0 => 0,
            n => self.current.load(Ordering::Relaxed) % n,
        }
    }

    /// Moves to the next slide, wrapping after the last.
    pub fn advance(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl Plugin for Slideshow {
    async fn draw(&self) -> Result<Option<Canvas>, PluginError> {
        let slides = lock(&self.slides);
        if slides.is_empty() {
            return Ok(None);
        }
        let index = self.current.load(Ordering::Relaxed) % slides.len();
        let size = *lock(&self.size);

        let mut rendered = lock(&self.rendered);
        match rendered.as_ref() {
            Some(r) if r.index == index && r.size == size => {}
            _ => {
                let canvas = Canvas::from_image(slides[index].clone(), true).resized(size.0, size.1);
                *rendered = Some(Rendered {
                    index,
                    size,
                    canvas,
                });
            }
        }
        Ok(rendered.as_ref().map(|r| r.canvas.clone()))
    }

    async fn resize_requested(&self, width: u32, height: u32) -> Result<(), PluginError> {
        *lock(&self.size) = (width, height);
        Ok(())
    }

    async fn activated(&self) -> Result<(), PluginError> {
        if self.len() > 1 {
            let ctx = self.ctx.clone();
            let current = Arc::clone(&self.current);
            self.ticker.start(self.hold, move || {
                current.fetch_add(1, Ordering::Relaxed);
                ctx.request_draw()
            });
        }
        Ok(())
    }

    async fn deactivated(&self) -> Result<(), PluginError> {
        self.ticker.stop();
        Ok(())
    }

    async fn teardown(&self) -> Result<(), PluginError> {
        self.ticker.stop();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pixmux_core::{Color, DisplayHandle, PluginId, PluginOptions};
    use uuid::Uuid;

    fn context(options: PluginOptions) -> PluginContext {
        PluginContext {
            id: PluginId::new(),
            width: 4,
            height: 4,
            display: DisplayHandle::detached(),
            options,
        }
    }

    /// Writes two 2x2 PNGs (red, green) to a fresh temp dir.
    fn write_slides() -> (PathBuf, Vec<PathBuf>) {
        let dir = std::env::temp_dir().join(format!("pixmux_slides_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut paths = Vec::new();
        for (name, px) in [("a.png", [255, 0, 0, 255]), ("b.png", [0, 255, 0, 255])] {
            let path = dir.join(name);
            RgbaImage::from_pixel(2, 2, Rgba(px)).save(&path).unwrap();
            paths.push(path);
        }
        (dir, paths)
    }

    fn image_options(paths: &[PathBuf]) -> PluginOptions {
        let mut options = PluginOptions::new();
        let list = paths
            .iter()
            .map(|p| toml::Value::String(p.display().to_string()))
            .collect();
        options.insert("images".into(), toml::Value::Array(list));
        options
    }

    #[tokio::test]
    async fn test_draws_current_slide_scaled_to_region() {
        // Arrange
        let (dir, paths) = write_slides();
        let show = Slideshow::setup(context(image_options(&paths))).unwrap();

        // Act
        let first = show.draw().await.unwrap().unwrap();
        show.advance();
        let second = show.draw().await.unwrap().unwrap();
        show.advance();

        // Assert
        assert_eq!(first.dimensions(), (4, 4));
        assert_eq!(first.pixel(3, 3), Some(Color::rgb(255, 0, 0)));
        assert_eq!(second.pixel(0, 0), Some(Color::rgb(0, 255, 0)));
        assert_eq!(show.current_index(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_resize_rescales_cached_slide() {
        let (dir, paths) = write_slides();
        let show = Slideshow::setup(context(image_options(&paths))).unwrap();
        show.draw().await.unwrap();

        show.resize_requested(6, 2).await.unwrap();
        let canvas = show.draw().await.unwrap().unwrap();

        assert_eq!(canvas.dimensions(), (6, 2));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_without_images_draws_nothing() {
        let show = Slideshow::setup(context(PluginOptions::new())).unwrap();

        assert!(show.is_empty());
        assert!(show.draw().await.unwrap().is_none());
    }

    #[test]
    fn test_missing_image_fails_setup() {
        let options = image_options(&[PathBuf::from("/nonexistent/slide.png")]);

        assert!(Slideshow::setup(context(options)).is_err());
    }
}
