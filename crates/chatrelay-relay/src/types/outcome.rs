use std::fmt;

/// Where a turn is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    PersistingUser,
    FetchingContext,
    Streaming,
    Finalizing,
    Done,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::Idle => "idle",
            TurnPhase::PersistingUser => "persisting_user",
            TurnPhase::FetchingContext => "fetching_context",
            TurnPhase::Streaming => "streaming",
            TurnPhase::Finalizing => "finalizing",
            TurnPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a turn ended; `done` has been sent in every case
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed {
        fragments: usize,
        /// False when the upstream produced no text
        persisted: bool,
    },
    Aborted {
        forwarded: usize,
    },
    Failed {
        phase: TurnPhase,
        error: String,
    },
}

impl TurnOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TurnOutcome::Completed { .. } => "completed",
            TurnOutcome::Aborted { .. } => "aborted",
            TurnOutcome::Failed { .. } => "failed",
        }
    }
}
