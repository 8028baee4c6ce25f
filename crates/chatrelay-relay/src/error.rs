use thiserror::Error;

/// Anything that ends a chat turn early
#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Llm(#[from] chatrelay_llm::LlmError),

    #[error(transparent)]
    Persist(#[from] chatrelay_persist::PersistError),

    #[error("relay misconfigured: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Rejected settings update; nothing is applied when any field is invalid
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Model must be one of {allowed:?}, got {got:?}")]
    UnknownModel { got: String, allowed: &'static [&'static str] },

    #[error("max_tokens must be between 1 and {max}, got {got}")]
    MaxTokensOutOfRange { got: i64, max: u32 },

    #[error("temperature must be between 0 and 2, got {0}")]
    TemperatureOutOfRange(f64),

    #[error("provider is fixed at startup ({active}); cannot switch to {requested:?}")]
    ProviderReadOnly { active: String, requested: String },
}
