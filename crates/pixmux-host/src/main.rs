//! Pixmux display host entry point.
//!
//! ```text
//! main()
//!  └─ load config            -- CLI path or platform config dir
//!  └─ build_display()        -- registry + layouts
//!  └─ build_sink()           -- headless / terminal / png
//!  └─ run_display()          -- until Ctrl-C
//! ```
//!
//! Usage: `pixmux [CONFIG_PATH]`

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pixmux_host::application::build_display::build_display;
use pixmux_host::application::run_display::{run_display, RunOptions};
use pixmux_host::infrastructure::sinks::build_sink;
use pixmux_host::infrastructure::storage::config::{config_file_path, load_config_from};
use pixmux_host::plugins::builtin_registry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config_path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => config_file_path()?,
    };
    let config = load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Structured logging.  `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.display.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Pixmux starting: {}x{} screen, config {}",
        config.display.width,
        config.display.height,
        config_path.display()
    );

    let mut display = build_display(&config, builtin_registry())?;
    display.manager.set_sink(build_sink(&config.sink));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    };

    run_display(&mut display, RunOptions::from_config(&config), shutdown).await?;

    info!("Pixmux stopped");
    Ok(())
}
