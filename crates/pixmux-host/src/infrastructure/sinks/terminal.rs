//! Terminal preview sink.
//!
//! Renders each frame with the Unicode upper half block `▀`: the foreground
//! colour paints the upper pixel and the background colour the lower one, so
//! one character cell shows two pixel rows.  Requires a terminal with 24-bit
//! colour support.

use std::fmt::Write as _;

use async_trait::async_trait;
use pixmux_core::{Canvas, Color, DisplaySink, SinkError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

const CURSOR_HOME: &str = "\x1b[H";
const RESET: &str = "\x1b[0m";

/// Writes frames as ANSI escape sequences to any async writer.
pub struct TerminalSink<W> {
    out: Mutex<W>,
}

impl TerminalSink<tokio::io::Stdout> {
    /// Sink writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> DisplaySink for TerminalSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn push(&self, frame: &Canvas) -> Result<(), SinkError> {
        let text = render_ansi(frame);
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Renders `frame` as one screenful of ANSI text, starting at the cursor home
/// position.  An odd last row is paired with black.
pub fn render_ansi(frame: &Canvas) -> String {
    let (width, height) = frame.dimensions();
    // "\x1b[38;2;RRR;GGG;BBBm" twice plus the 3-byte glyph per cell.
    let mut text = String::with_capacity((width as usize * 42 + 8) * (height as usize / 2 + 1));
    text.push_str(CURSOR_HOME);

    for y in (0..height).step_by(2) {
        for x in 0..width {
            let upper = frame.pixel(x, y).unwrap_or(Color::BLACK);
            let lower = frame.pixel(x, y + 1).unwrap_or(Color::BLACK);
            // Writing to a String cannot fail.
            let _ = write!(
                text,
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m▀",
                upper.r, upper.g, upper.b, lower.r, lower.g, lower.b
            );
        }
        text.push_str(RESET);
        text.push('\n');
    }
    text
}
