//! Display sinks shipped with the host.
//!
//! | Kind       | Output                                             |
//! |------------|----------------------------------------------------|
//! | `headless` | nothing (the display manager holds no sink)        |
//! | `terminal` | ANSI true-colour half blocks on stdout             |
//! | `png`      | a PNG file overwritten with every frame            |

pub mod png;
pub mod terminal;

use std::sync::Arc;

use pixmux_core::DisplaySink;
use tracing::info;

use crate::infrastructure::storage::config::{SinkConfig, SinkKind};

pub use png::PngSink;
pub use terminal::TerminalSink;

/// Builds the sink selected in the configuration.
///
/// Returns `None` for [`SinkKind::Headless`].
pub fn build_sink(config: &SinkConfig) -> Option<Arc<dyn DisplaySink>> {
    match config.kind {
        SinkKind::Headless => {
            info!("running headless: frames are composed but not shown");
            None
        }
        SinkKind::Terminal => Some(Arc::new(TerminalSink::stdout())),
        SinkKind::Png => {
            info!("writing frames to {}", config.path.display());
            Some(Arc::new(PngSink::new(config.path.clone())))
        }
    }
}
