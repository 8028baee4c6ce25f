mod chunk;
mod frame;
mod config;
mod outcome;

pub use chunk::StreamChunk;
pub use frame::{ClientFrame, TurnRequest};
pub use config::RelayConfig;
pub use outcome::{TurnOutcome, TurnPhase};
