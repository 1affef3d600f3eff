//! BuildDisplayUseCase: configuration → ready-to-run display manager.
//!
//! Shared plugins (`[[plugins]]`) are created first, once each, sized to the
//! whole screen unless the entry says otherwise; every layout that references one receives a clone of the same
//! handle.  Layout-private plugins are created by their layout through the
//! registry, sized to their placement.
//!
//! Nothing is switched to here.  The caller decides when the first frame is
//! drawn.

use std::collections::{HashMap, HashSet};

use pixmux_core::{
    DisplayConfig, DisplayManager, LayoutError, LayoutId, Placement, PluginHandle, PluginRegistry,
    PluginSource, RegistryError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::storage::config::{AppConfig, LayoutPluginEntry};

/// Reasons a configuration cannot be turned into a display.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no layouts configured")]
    NoLayouts,

    #[error("layout name {0:?} is used more than once")]
    DuplicateLayout(String),

    #[error("shared plugin id {0:?} is used more than once")]
    DuplicateSharedPlugin(String),

    #[error("layout {layout:?} refers to unknown shared plugin {id:?}")]
    UnknownSharedPlugin { layout: String, id: String },

    #[error("layout {layout:?} plugin #{index} must set exactly one of `shared` and `factory`")]
    AmbiguousPlugin { layout: String, index: usize },

    #[error("start layout {0:?} is not configured")]
    UnknownStartLayout(String),

    #[error("failed to create shared plugin {id:?}: {source}")]
    SharedPlugin {
        id: String,
        #[source]
        source: RegistryError,
    },

    #[error("layout {layout:?}: {source}")]
    Layout {
        layout: String,
        #[source]
        source: LayoutError,
    },
}

/// A configured display manager and its layouts.
#[derive(Debug)]
pub struct BuiltDisplay {
    pub manager: DisplayManager,
    /// Layout ids in configuration order.
    pub layouts: Vec<LayoutId>,
    /// Layout to show first.
    pub start: LayoutId,
}

/// Builds every layout described by `config` using factories from `registry`.
///
/// # Errors
///
/// Returns a [`BuildError`] describing the first invalid reference or failed
/// plugin construction.  No partially built display is returned.
pub fn build_display(
    config: &AppConfig,
    registry: PluginRegistry,
) -> Result<BuiltDisplay, BuildError> {
    validate_names(config)?;

    let mut manager = DisplayManager::new(
        DisplayConfig {
            width: config.display.width,
            height: config.display.height,
            debug_borders: config.display.debug_borders,
        },
        registry,
    );

    // ── Shared instances ─────────────────────────────────────────────────────
    let mut shared: HashMap<&str, PluginHandle> = HashMap::new();
    for entry in &config.plugins {
        let ctx = manager.plugin_context(
            entry.width.unwrap_or(config.display.width),
            entry.height.unwrap_or(config.display.height),
            entry.options.clone(),
        );
        let handle = manager
            .registry()
            .create(&entry.factory, ctx)
            .map_err(|source| BuildError::SharedPlugin {
                id: entry.id.clone(),
                source,
            })?;
        debug!(id = %entry.id, plugin = %handle.id(), "created shared {} plugin", entry.factory);
        shared.insert(entry.id.as_str(), handle);
    }

    // ── Layouts ──────────────────────────────────────────────────────────────
    let mut layouts = Vec::with_capacity(config.layouts.len());
    let mut referenced: HashSet<&str> = HashSet::new();
    for layout_entry in &config.layouts {
        let layout = manager.new_layout();
        layout.set_name(layout_entry.name.clone());

        for (index, entry) in layout_entry.plugins.iter().enumerate() {
            let source = resolve_source(&layout_entry.name, index, entry, &shared)?;
            if let Some(id) = entry.shared.as_deref() {
                referenced.insert(id);
            }
            layout
                .add_plugin(
                    source,
                    Placement::new(entry.x, entry.y, entry.width, entry.height),
                    entry.z_index,
                )
                .map_err(|source| BuildError::Layout {
                    layout: layout_entry.name.clone(),
                    source,
                })?;
        }
        info!(
            layout = %layout_entry.name,
            plugins = layout.len(),
            "layout ready"
        );
        layouts.push(layout.id());
    }

    for id in shared.keys().filter(|id| !referenced.contains(*id)) {
        warn!("shared plugin {id:?} is not used by any layout");
    }

    let start = match config.rotation.start_layout.as_deref() {
        Some(name) => manager
            .layout_by_name(name)
            .map(|l| l.id())
            .ok_or_else(|| BuildError::UnknownStartLayout(name.to_string()))?,
        None => layouts[0],
    };

    Ok(BuiltDisplay {
        manager,
        layouts,
        start,
    })
}

fn validate_names(config: &AppConfig) -> Result<(), BuildError> {
    if config.layouts.is_empty() {
        return Err(BuildError::NoLayouts);
    }
    let mut seen = HashSet::new();
    for layout in &config.layouts {
        if !seen.insert(layout.name.as_str()) {
            return Err(BuildError::DuplicateLayout(layout.name.clone()));
        }
    }
    let mut seen = HashSet::new();
    for plugin in &config.plugins {
        if !seen.insert(plugin.id.as_str()) {
            return Err(BuildError::DuplicateSharedPlugin(plugin.id.clone()));
        }
    }
    Ok(())
}

fn resolve_source(
    layout: &str,
    index: usize,
    entry: &LayoutPluginEntry,
    shared: &HashMap<&str, PluginHandle>,
) -> Result<PluginSource, BuildError> {
    match (entry.shared.as_deref(), entry.factory.as_deref()) {
        (Some(id), None) => shared
            .get(id)
            .map(PluginSource::from)
            .ok_or_else(|| BuildError::UnknownSharedPlugin {
                layout: layout.to_string(),
                id: id.to_string(),
            }),
        (None, Some(factory)) => {
            Ok(PluginSource::named(factory).with_options(entry.options.clone()))
        }
        _ => Err(BuildError::AmbiguousPlugin {
            layout: layout.to_string(),
            index,
        }),
    }
}
