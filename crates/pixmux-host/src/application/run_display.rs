//! RunDisplayUseCase: the host's main loop.
//!
//! A single task owns the [`DisplayManager`] and waits on four sources:
//!
//! ```text
//!   shutdown future ─────────────┐
//!   plugin draw requests (queue) ├─► select! ─► DisplayManager
//!   refresh timer  (full frame)  │
//!   rotation timer (next layout) ┘
//! ```
//!
//! Because every source is served by the same task, a plugin's draw request
//! can never interleave with a layout switch.

use std::future::Future;
use std::time::Duration;

use pixmux_core::{DisplayError, DisplayManager};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::build_display::BuiltDisplay;
use super::rotate_layouts::LayoutRotation;
use crate::infrastructure::storage::config::AppConfig;

/// Timer settings for [`run_display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Period of full redraws; `None` redraws only on request.
    pub refresh: Option<Duration>,
    /// Period of layout rotation; `None` never rotates.
    pub rotation: Option<Duration>,
}

impl RunOptions {
    /// Reads the timer settings from the configuration; `0` disables a timer.
    pub fn from_config(config: &AppConfig) -> Self {
        let nonzero = |d: Duration| (!d.is_zero()).then_some(d);
        Self {
            refresh: nonzero(Duration::from_millis(config.display.refresh_interval_ms)),
            rotation: nonzero(Duration::from_secs(config.rotation.interval_secs)),
        }
    }
}

/// Shows the start layout and serves the display until `shutdown` resolves.
///
/// Failures while serving a single request are logged; the loop continues.
///
/// # Errors
///
/// Returns an error only if the initial switch to the start layout fails.
pub async fn run_display(
    display: &mut BuiltDisplay,
    options: RunOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<(), DisplayError> {
    let manager = &mut display.manager;
    manager.switch_layout(display.start).await?;

    let mut rotation = LayoutRotation::new(display.layouts.clone(), display.start);
    let mut refresh_timer = options.refresh.map(timer);
    let mut rotation_timer = options.rotation.map(timer);

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            command = manager.next_command() => match command {
                Some(command) => {
                    if let Err(e) = manager.handle_command(command).await {
                        warn!("display request {command:?} failed: {e}");
                    }
                }
                // The manager holds a sender itself, so this only happens if
                // the queue was torn down.
                None => break,
            },
            _ = tick(&mut refresh_timer) => {
                if let Err(e) = manager.update_display(None).await {
                    warn!("periodic refresh failed: {e}");
                }
            }
            _ = tick(&mut rotation_timer) => rotate(manager, &mut rotation).await,
        }
    }

    info!("display loop stopped");
    Ok(())
}

async fn rotate(manager: &mut DisplayManager, rotation: &mut LayoutRotation) {
    if let Some(current) = manager.current_layout_id() {
        rotation.follow(current);
    }
    let Some(next) = rotation.advance() else {
        return;
    };
    debug!(layout = %next, "rotating layout");
    if let Err(e) = manager.switch_layout(next).await {
        warn!("layout rotation failed: {e}");
    }
}

/// Interval whose first tick is one full period from now.
fn timer(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Waits for the next tick, or forever if the timer is disabled.
async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
