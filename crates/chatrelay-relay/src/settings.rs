use chatrelay_llm::ProviderType;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::SettingsError;

/// Models a client may switch to at runtime
pub const ALLOWED_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"];

pub const MAX_TOKENS_LIMIT: u32 = 4096;

/// Generation defaults applied to every turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub provider: ProviderType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            provider: ProviderType::OpenAI,
        }
    }
}

/// Partial update; absent fields keep their current value
///
/// Numbers are taken wide so out-of-range input is reported, not rejected
/// by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl SettingsUpdate {
    /// Check every field against `current` without applying anything
    pub fn validate(&self, current: &Settings) -> Result<(), SettingsError> {
        if let Some(model) = self.model.as_deref() {
            if !ALLOWED_MODELS.contains(&model) {
                return Err(SettingsError::UnknownModel {
                    got: model.to_string(),
                    allowed: ALLOWED_MODELS,
                });
            }
        }

        if let Some(max_tokens) = self.max_tokens {
            if !(1..=i64::from(MAX_TOKENS_LIMIT)).contains(&max_tokens) {
                return Err(SettingsError::MaxTokensOutOfRange {
                    got: max_tokens,
                    max: MAX_TOKENS_LIMIT,
                });
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(SettingsError::TemperatureOutOfRange(temperature));
            }
        }

        if let Some(requested) = self.provider.as_deref() {
            if requested != current.provider.as_str() {
                return Err(SettingsError::ProviderReadOnly {
                    active: current.provider.to_string(),
                    requested: requested.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Process-wide settings shared by the relay and the settings routes
pub struct SettingsStore {
    inner: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Copy of the current settings; a turn uses one snapshot throughout
    pub async fn snapshot(&self) -> Settings {
        self.inner.read().await.clone()
    }

    /// Validate and apply atomically; returns the settings now in effect
    pub async fn apply(&self, update: SettingsUpdate) -> Result<Settings, SettingsError> {
        let mut settings = self.inner.write().await;
        update.validate(&settings)?;

        if let Some(model) = update.model {
            settings.model = model;
        }
        if let Some(temperature) = update.temperature {
            settings.temperature = temperature as f32;
        }
        if let Some(max_tokens) = update.max_tokens {
            // range checked by validate
            settings.max_tokens = max_tokens as u32;
        }

        tracing::info!(
            model = %settings.model,
            temperature = settings.temperature,
            max_tokens = settings.max_tokens,
            "Settings updated"
        );
        Ok(settings.clone())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
