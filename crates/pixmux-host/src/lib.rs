//! # pixmux-host
//!
//! The runnable side of Pixmux: reads a TOML configuration, builds layouts
//! from the built-in plugins, and drives a display sink.
//!
//! # Architecture overview (for beginners)
//!
//! - **`plugins`** – Built-in content producers (`test`, `clock`,
//!   `slideshow`, `solid`) and the registry that names them.
//!
//! - **`application`** – Use cases: build a display from configuration,
//!   rotate between layouts, and run the main loop.
//!
//! - **`infrastructure`** – OS-facing adapters: the config file and the
//!   display sinks (terminal preview, PNG file).
//!
//! The compositing engine itself lives in `pixmux_core`.

pub mod application;
pub mod infrastructure;
pub mod plugins;
