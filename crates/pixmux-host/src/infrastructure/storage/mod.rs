//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the
//! platform-appropriate directory (or a path given on the command line),
//! writes it back, and falls back to defaults on first run so the host shows
//! something even without a config file.

pub mod config;
