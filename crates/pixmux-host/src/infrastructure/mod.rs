//! Infrastructure layer for the display host.
//!
//! Contains OS-facing adapters: display sinks that put finished frames on a
//! terminal or into a file, and file-system storage for the configuration.
//!
//! **Dependency rule**: this layer may depend on `pixmux_core`, but MUST NOT be
//! imported by the built-in plugins.

pub mod sinks;
pub mod storage;
