pub mod types;
pub mod error;
pub mod registry;
pub mod settings;
pub mod relay;
pub mod builder;
pub mod session;

pub use types::{ClientFrame, RelayConfig, StreamChunk, TurnOutcome, TurnPhase, TurnRequest};
pub use error::{RelayError, SettingsError};
pub use registry::{ConnectionRegistry, SessionHandle};
pub use settings::{Settings, SettingsStore, SettingsUpdate, ALLOWED_MODELS};
pub use relay::MessageRelay;
pub use builder::RelayBuilder;
pub use session::spawn_turn_worker;
