use chatrelay_llm::ChatClient;
use chatrelay_persist::MessageStore;
use std::sync::Arc;

use crate::error::{RelayError, Result};
use crate::registry::ConnectionRegistry;
use crate::relay::MessageRelay;
use crate::settings::SettingsStore;
use crate::types::RelayConfig;

/// Builder for constructing a MessageRelay
///
/// Client and store are required; registry and settings default to fresh
/// instances.
#[derive(Default)]
pub struct RelayBuilder {
    client: Option<Arc<dyn ChatClient>>,
    store: Option<Arc<dyn MessageStore>>,
    registry: Option<Arc<ConnectionRegistry>>,
    settings: Option<Arc<SettingsStore>>,
    config: RelayConfig,
}

impl RelayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(mut self, registry: Arc<ConnectionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn settings(mut self, settings: Arc<SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<MessageRelay> {
        let client = self
            .client
            .ok_or_else(|| RelayError::Config("chat client is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RelayError::Config("message store is required".to_string()))?;

        Ok(MessageRelay::new(
            client,
            store,
            self.registry.unwrap_or_default(),
            self.settings.unwrap_or_default(),
            self.config,
        ))
    }
}
