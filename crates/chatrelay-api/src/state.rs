use chatrelay_llm::ChatClient;
use chatrelay_persist::MessageStore;
use chatrelay_relay::{ConnectionRegistry, MessageRelay, SettingsStore};
use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The registry and settings are the same instances the relay holds.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MessageStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub settings: Arc<SettingsStore>,
    pub relay: Arc<MessageRelay>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MessageStore>, llm_client: Arc<dyn ChatClient>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let settings = Arc::new(SettingsStore::new(config.initial_settings()));
        let relay = Arc::new(MessageRelay::new(
            llm_client,
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&settings),
            config.relay_config(),
        ));

        Self {
            config: Arc::new(config),
            store,
            registry,
            settings,
            relay,
        }
    }
}
