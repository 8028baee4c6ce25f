use chatrelay_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use chatrelay_persist::{MessageStore, NewChatMessage};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::registry::{ConnectionRegistry, SessionHandle};
use crate::settings::SettingsStore;
use crate::types::{RelayConfig, StreamChunk, TurnOutcome, TurnPhase, TurnRequest};

pub const ABORTED_MESSAGE: &str = "Generation aborted";

/// Runs chat turns: persist the user message, stream the reply, persist it
pub struct MessageRelay {
    client: Arc<dyn ChatClient>,
    store: Arc<dyn MessageStore>,
    registry: Arc<ConnectionRegistry>,
    settings: Arc<SettingsStore>,
    config: RelayConfig,
}

impl MessageRelay {
    pub fn new(
        client: Arc<dyn ChatClient>,
        store: Arc<dyn MessageStore>,
        registry: Arc<ConnectionRegistry>,
        settings: Arc<SettingsStore>,
        config: RelayConfig,
    ) -> Self {
        Self {
            client,
            store,
            registry,
            settings,
            config,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::RelayBuilder {
        crate::builder::RelayBuilder::new()
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Run one turn for `client_id`, streaming chunks to its current connection
    ///
    /// Never fails: errors become an `error` chunk. A `done` chunk is always
    /// the last thing sent. The connection is resolved once, so a socket that
    /// replaces this one mid-turn receives nothing from it.
    pub async fn handle_turn(&self, client_id: &str, request: TurnRequest) -> TurnOutcome {
        let started = Instant::now();
        let session = self.registry.session(client_id).await;
        if let Some(session) = &session {
            session.clear_abort();
        }
        let session = session.as_ref();

        let mut phase = TurnPhase::Idle;
        let outcome = match self.run_turn(client_id, session, request, &mut phase).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(client_id, %phase, error = %err, "Chat turn failed");
                emit(client_id, session, StreamChunk::error(format!("Error: {err}"))).await;
                TurnOutcome::Failed {
                    phase,
                    error: err.to_string(),
                }
            }
        };

        emit(client_id, session, StreamChunk::Done).await;

        tracing::info!(
            client_id,
            outcome = outcome.label(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Chat turn finished"
        );
        outcome
    }

    async fn run_turn(
        &self,
        client_id: &str,
        session: Option<&SessionHandle>,
        request: TurnRequest,
        phase: &mut TurnPhase,
    ) -> Result<TurnOutcome> {
        let settings = self.settings.snapshot().await;
        let temperature = request.temperature.unwrap_or(settings.temperature);
        let max_tokens = request.max_tokens.unwrap_or(settings.max_tokens);

        *phase = TurnPhase::PersistingUser;
        self.store
            .insert(
                NewChatMessage::user(request.content)
                    .with_generation(settings.model.as_str(), temperature, max_tokens),
            )
            .await?;

        *phase = TurnPhase::FetchingContext;
        let context: Vec<Message> = self
            .store
            .recent(self.config.context_messages)
            .await?
            .into_iter()
            .map(Message::from)
            .collect();

        *phase = TurnPhase::Streaming;
        let chat_request = ChatRequest::new(context)
            .with_command(request.command)
            .with_options(
                ChatOptions::new()
                    .model(settings.model.as_str())
                    .temperature(temperature)
                    .max_tokens(max_tokens),
            );

        let mut stream = self.client.generate_stream(chat_request).await?;
        let pacing = self.config.pacing();
        let mut buffer = String::new();
        let mut forwarded = 0usize;

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;

            if is_aborted(session) {
                return Ok(aborted(client_id, session, forwarded).await);
            }

            buffer.push_str(&fragment);
            emit(client_id, session, StreamChunk::content(fragment)).await;
            forwarded += 1;

            if !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
        }
        drop(stream);

        // An abort that lands after the last fragment still discards the reply
        if is_aborted(session) {
            return Ok(aborted(client_id, session, forwarded).await);
        }

        *phase = TurnPhase::Finalizing;
        let persisted = !buffer.is_empty();
        if persisted {
            self.store
                .insert(
                    NewChatMessage::assistant(buffer)
                        .with_generation(settings.model, temperature, max_tokens),
                )
                .await?;
        }

        *phase = TurnPhase::Done;
        Ok(TurnOutcome::Completed {
            fragments: forwarded,
            persisted,
        })
    }
}

fn is_aborted(session: Option<&SessionHandle>) -> bool {
    session.is_some_and(SessionHandle::is_aborted)
}

async fn aborted(client_id: &str, session: Option<&SessionHandle>, forwarded: usize) -> TurnOutcome {
    tracing::info!(client_id, forwarded, "Generation aborted by client");
    emit(client_id, session, StreamChunk::error(ABORTED_MESSAGE)).await;
    TurnOutcome::Aborted { forwarded }
}

async fn emit(client_id: &str, session: Option<&SessionHandle>, chunk: StreamChunk) {
    match session {
        Some(session) => {
            if !session.send(chunk).await {
                tracing::debug!(client_id, "Dropping chunk for closed session");
            }
        }
        None => tracing::debug!(client_id, "Dropping chunk for unknown session"),
    }
}
