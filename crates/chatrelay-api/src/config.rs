use chatrelay_llm::{HttpOptions, ProviderConfig, ProviderType};
use chatrelay_relay::{RelayConfig, Settings};
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub azure: AzureConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub azure_openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// e.g. `sqlite://chat.db`; the file is created when missing
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: ProviderType,
    /// Initial model; changeable at runtime through the settings API
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_context_messages")]
    pub context_messages: u32,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_retry_budget")]
    pub retry_budget_secs: u64,
}

fn default_context_messages() -> u32 {
    10
}

fn default_pacing_ms() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    120
}

fn default_retry_budget() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            deployment: None,
            api_version: default_api_version(),
        }
    }
}

fn default_api_version() -> String {
    chatrelay_llm::azure_openai::DEFAULT_API_VERSION.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `CHATRELAY_<SECTION>__<KEY>` environment variables,
    ///    e.g. `CHATRELAY_SERVER__PORT=9000`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CHATRELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets come from the environment only
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        cfg.azure_openai_api_key = std::env::var("AZURE_OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        cfg.validate()?;
        Ok(cfg)
    }

    /// Fail fast on settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.llm.provider {
            ProviderType::OpenAI => {
                if self.openai_api_key.is_empty() {
                    return Err(ConfigError::Message(
                        "OPENAI_API_KEY environment variable is required".to_string(),
                    ));
                }
            }
            ProviderType::Azure => {
                if self.azure_api_key().is_empty() {
                    return Err(ConfigError::Message(
                        "Azure provider selected but AZURE_OPENAI_API_KEY / OPENAI_API_KEY is not set"
                            .to_string(),
                    ));
                }
                if self.azure.endpoint.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::Message("azure.endpoint is required".to_string()));
                }
                if self.azure.deployment.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::Message("azure.deployment is required".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Azure key, falling back to the OpenAI key
    pub fn azure_api_key(&self) -> &str {
        self.azure_openai_api_key
            .as_deref()
            .unwrap_or(&self.openai_api_key)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        let http = HttpOptions {
            connect_timeout_secs: self.llm.connect_timeout_secs,
            read_timeout_secs: self.llm.read_timeout_secs,
            retry_budget_secs: self.llm.retry_budget_secs,
        };

        let provider = match self.llm.provider {
            ProviderType::OpenAI => {
                ProviderConfig::openai(self.openai_api_key.clone(), self.llm.model.clone())
            }
            ProviderType::Azure => ProviderConfig::azure(
                self.azure_api_key(),
                self.azure.endpoint.clone().unwrap_or_default(),
                self.azure.deployment.clone().unwrap_or_default(),
                self.azure.api_version.clone(),
            ),
        };

        provider
            .with_base_url(self.llm.base_url.clone())
            .with_http(http)
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            context_messages: self.llm.context_messages,
            pacing_ms: self.llm.pacing_ms,
        }
    }

    pub fn initial_settings(&self) -> Settings {
        Settings {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            provider: self.llm.provider,
        }
    }
}
