//! Registry for all routing providers and their ports.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{ProviderId, ProviderMeta};
use crate::ports::{GeocodePort, PortError, RoutePort};

/// Collection of ports implementing one routing provider.
pub struct ProviderPlugin {
    /// Static metadata describing the provider.
    pub meta: ProviderMeta,
    /// Implementation for resolving district coordinates.
    pub geocode_port: Arc<dyn GeocodePort>,
    /// Implementation for rendering vehicle routes.
    pub route_port: Arc<dyn RoutePort>,
}

/// Registry that resolves plugins by provider identifier.
pub struct PluginRegistry {
    plugins: HashMap<ProviderId, ProviderPlugin>,
}

impl PluginRegistry {
    /// Build a registry from the provided plugin list.
    #[must_use]
    pub fn new(plugins: Vec<ProviderPlugin>) -> Self {
        let plugins_map = plugins
            .into_iter()
            .map(|plugin| (plugin.meta.id.clone(), plugin))
            .collect();
        Self {
            plugins: plugins_map,
        }
    }

    /// Return metadata for all registered providers.
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderMeta> {
        self.plugins
            .values()
            .map(|plugin| plugin.meta.clone())
            .collect()
    }

    /// Look up a plugin for the given provider.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::UnsupportedProvider`] when no plugin is registered.
    pub fn plugin(&self, provider: &ProviderId) -> Result<&ProviderPlugin, PortError> {
        self.plugins
            .get(provider)
            .ok_or(PortError::UnsupportedProvider)
    }
}
