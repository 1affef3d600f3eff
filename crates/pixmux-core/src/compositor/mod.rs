//! The compositing and layout-switching engine.
//!
//! # Sub-modules
//!
//! - **`layout`** – A [`layout::Layout`] holds plugins with their placement
//!   and stacking index and composites them into one frame.  Plugin draws run
//!   concurrently with a per-plugin deadline; a slow or failing plugin only
//!   loses its own region for that frame.
//!
//! - **`display_manager`** – The [`display_manager::DisplayManager`] owns all
//!   layouts, runs the strictly ordered switch algorithm that fires plugin
//!   lifecycle callbacks, and pushes finished frames to the sink.
//!
//! - **`handle`** – The [`handle::DisplayHandle`] plugins use to ask for an
//!   out-of-cycle redraw without holding a reference to the manager.
//!
//! - **`sink`** – The [`sink::DisplaySink`] contract for whatever consumes
//!   finished frames, plus an in-memory implementation.
//!
//! # Concurrency model
//!
//! Everything runs inside one task.  "Concurrent" fan-outs are built with
//! [`futures::future::join_all`], which polls every plugin future in turn on
//! the current task and returns the outcomes in input order, so the paste
//! order of a frame never depends on which plugin finished first.

pub mod display_manager;
pub mod handle;
pub mod layout;
pub mod sink;
