//! Name → factory registry used to build plugins from configuration.
//!
//! The registry is populated once at startup (for example with the built-in
//! plugins of `pixmux-host`) and then shared read-only by every layout.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::{Plugin, PluginContext, PluginError, PluginHandle};

/// A function that builds a plugin from its construction context.
pub type PluginFactory =
    Arc<dyn Fn(PluginContext) -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync>;

/// Errors raised while resolving or running a factory.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No factory is registered under this name.
    #[error("no plugin factory named {0:?}")]
    UnknownFactory(String),

    /// The factory ran but refused to build the plugin.
    #[error("plugin factory {name:?} failed: {source}")]
    Setup {
        name: String,
        #[source]
        source: PluginError,
    },
}

/// Maps stable string identifiers to plugin factories.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<P, F>(&mut self, name: impl Into<String>, factory: F)
    where
        P: Plugin + 'static,
        F: Fn(PluginContext) -> Result<P, PluginError> + Send + Sync + 'static,
    {
        let factory: PluginFactory = Arc::new(
            move |ctx: PluginContext| -> Result<Arc<dyn Plugin>, PluginError> {
                let plugin = factory(ctx)?;
                Ok(Arc::new(plugin))
            },
        );
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns all registered names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds a plugin through the factory registered under `name`.
    ///
    /// The returned handle carries `ctx.id`, so the plugin can address itself
    /// in draw requests.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownFactory`] if `name` is not registered
    /// and [`RegistryError::Setup`] if the factory fails.
    pub fn create(&self, name: &str, ctx: PluginContext) -> Result<PluginHandle, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFactory(name.to_string()))?;
        let id = ctx.id;
        let plugin = factory(ctx).map_err(|source| RegistryError::Setup {
            name: name.to_string(),
            source,
        })?;
        Ok(PluginHandle::with_id(id, plugin))
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("factories", &self.names())
            .finish()
    }
}
