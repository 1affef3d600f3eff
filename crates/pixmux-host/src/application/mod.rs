//! Application layer use cases for the display host.
//!
//! # Sub-modules
//!
//! - **`build_display`** – Turns the loaded configuration into a
//!   [`DisplayManager`](pixmux_core::DisplayManager) with every layout
//!   registered, creating shared plugin instances once and validating every
//!   cross-reference.
//!
//! - **`rotate_layouts`** – Decides which layout comes next when the host
//!   cycles through layouts on a timer.
//!
//! - **`run_display`** – The host's main loop: serves plugin draw requests,
//!   periodic refreshes and layout rotation until shutdown.

pub mod build_display;
pub mod rotate_layouts;
pub mod run_display;
