//! PNG file sink.
//!
//! Every pushed frame replaces the file's contents.  The frame is encoded and
//! written to a sibling temporary file first, then renamed over the target, so
//! a viewer polling the file never sees a half-written image.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::ImageFormat;
use pixmux_core::{Canvas, DisplaySink, SinkError};
use tracing::trace;

/// Writes each frame to a PNG file.
#[derive(Debug, Clone)]
pub struct PngSink {
    path: PathBuf,
}

impl PngSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Encodes `frame` as PNG bytes.
pub fn encode_png(frame: &Canvas) -> Result<Vec<u8>, SinkError> {
    let mut bytes = Cursor::new(Vec::new());
    frame.as_image().write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

#[async_trait]
impl DisplaySink for PngSink {
    async fn push(&self, frame: &Canvas) -> Result<(), SinkError> {
        let frame = frame.clone();
        let bytes = tokio::task::spawn_blocking(move || encode_png(&frame))
            .await
            .map_err(|e| SinkError::Device(format!("encoder task failed: {e}")))??;

        let staging = self.staging_path();
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        trace!("wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixmux_core::Color;
    use uuid::Uuid;

    #[test]
    fn test_staging_path_is_a_sibling() {
        let sink = PngSink::new("/tmp/out/frame.png");
        assert_eq!(sink.staging_path(), PathBuf::from("/tmp/out/frame.png.tmp"));
    }

    #[tokio::test]
    async fn test_push_writes_decodable_png() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("pixmux_png_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");
        let sink = PngSink::new(path.clone());
        let frame = Canvas::filled(6, 4, Color::rgb(9, 80, 200));

        // Act
        sink.push(&frame).await.unwrap();

        // Assert
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(decoded.get_pixel(5, 3).0, [9, 80, 200, 255]);
        assert!(!sink.staging_path().exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_push_into_missing_directory_reports_io_error() {
        let sink = PngSink::new("/nonexistent/dir/that/cannot/exist/frame.png");

        let result = sink.push(&Canvas::new(2, 2)).await;

        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
