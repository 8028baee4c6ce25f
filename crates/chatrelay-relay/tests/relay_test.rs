use async_trait::async_trait;
use chatrelay_llm::{ChatClient, ChatRequest, FragmentStream, LlmError, ProviderType, Role};
use chatrelay_persist::{
    ChatMessage, HistoryPage, HistoryQuery, MessageStore, NewChatMessage, PersistError, SqliteMessageStore,
};
use chatrelay_relay::{
    spawn_turn_worker, ConnectionRegistry, MessageRelay, RelayConfig, Settings, SettingsStore, StreamChunk,
    TurnOutcome, TurnPhase, TurnRequest,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const CLIENT: &str = "client-1";

/// Scripted upstream; optionally requests an abort right before fragment `k`
///
/// `k == fragments.len()` requests it after the last fragment, before the
/// stream ends.
struct FakeClient {
    fragments: Vec<Result<String, String>>,
    abort_before: Option<(usize, Arc<ConnectionRegistry>)>,
    fail_to_open: bool,
    /// Registers a new connection under `CLIENT` when the stream opens
    replace_on_open: Mutex<Option<(Arc<ConnectionRegistry>, mpsc::Sender<StreamChunk>)>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeClient {
    fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
            abort_before: None,
            fail_to_open: false,
            replace_on_open: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn last_request(&self) -> ChatRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request made")
    }
}

#[async_trait]
impl ChatClient for FakeClient {
    async fn generate(&self, _request: ChatRequest) -> chatrelay_llm::Result<String> {
        unimplemented!("relay only streams")
    }

    async fn generate_stream(&self, request: ChatRequest) -> chatrelay_llm::Result<FragmentStream> {
        self.requests.lock().unwrap().push(request);
        let replacement = self.replace_on_open.lock().unwrap().take();
        if let Some((registry, sender)) = replacement {
            registry.register(CLIENT, sender).await;
        }
        if self.fail_to_open {
            return Err(LlmError::Http { status: 500, body: "boom".into() });
        }

        let fragments = self.fragments.clone();
        let abort_before = self.abort_before.clone();
        Ok(Box::pin(async_stream::stream! {
            let total = fragments.len();
            for (index, fragment) in fragments.into_iter().enumerate() {
                if let Some((k, registry)) = &abort_before {
                    if index == *k {
                        registry.request_abort(CLIENT).await;
                    }
                }
                yield fragment.map_err(LlmError::InvalidResponse);
            }
            if let Some((k, registry)) = &abort_before {
                if *k == total {
                    registry.request_abort(CLIENT).await;
                }
            }
        }))
    }

    fn provider(&self) -> ProviderType {
        ProviderType::OpenAI
    }
}

/// Store whose inserts always fail
struct BrokenStore;

#[async_trait]
impl MessageStore for BrokenStore {
    async fn insert(&self, _message: NewChatMessage) -> chatrelay_persist::Result<ChatMessage> {
        Err(PersistError::InvalidRow("disk on fire".into()))
    }
    async fn recent(&self, _limit: u32) -> chatrelay_persist::Result<Vec<ChatMessage>> {
        Ok(Vec::new())
    }
    async fn list(&self, _query: HistoryQuery) -> chatrelay_persist::Result<HistoryPage> {
        Ok(HistoryPage { messages: Vec::new(), total: 0 })
    }
    async fn clear(&self) -> chatrelay_persist::Result<u64> {
        Ok(0)
    }
    async fn ping(&self) -> chatrelay_persist::Result<()> {
        Ok(())
    }
}

struct Harness {
    relay: Arc<MessageRelay>,
    registry: Arc<ConnectionRegistry>,
    store: Arc<SqliteMessageStore>,
    client: Arc<FakeClient>,
    rx: mpsc::Receiver<StreamChunk>,
}

async fn harness_with(build_client: impl FnOnce(Arc<ConnectionRegistry>) -> FakeClient) -> Harness {
    let registry = Arc::new(ConnectionRegistry::new());
    let store = Arc::new(SqliteMessageStore::in_memory().await.unwrap());
    let client = Arc::new(build_client(Arc::clone(&registry)));
    let (tx, rx) = mpsc::channel(256);
    registry.register(CLIENT, tx).await;

    let relay = MessageRelay::builder()
        .client(client.clone())
        .store(store.clone())
        .registry(Arc::clone(&registry))
        .settings(Arc::new(SettingsStore::new(Settings::default())))
        .config(RelayConfig::default().without_pacing())
        .build()
        .unwrap();

    Harness {
        relay: Arc::new(relay),
        registry,
        store,
        client,
        rx,
    }
}

async fn harness(fragments: &[&str]) -> Harness {
    let fragments: Vec<String> = fragments.iter().map(|f| f.to_string()).collect();
    harness_with(move |_| {
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        FakeClient::new(&refs)
    })
    .await
}

fn drain(rx: &mut mpsc::Receiver<StreamChunk>) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();
    while let Ok(chunk) = rx.try_recv() {
        chunks.push(chunk);
    }
    chunks
}

#[tokio::test]
async fn test_fragments_forwarded_in_order_then_done_and_persisted() {
    let mut h = harness(&["The ", "quick ", "fox"]).await;

    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("tell me")).await;

    assert_eq!(outcome, TurnOutcome::Completed { fragments: 3, persisted: true });
    assert_eq!(
        drain(&mut h.rx),
        vec![
            StreamChunk::content("The "),
            StreamChunk::content("quick "),
            StreamChunk::content("fox"),
            StreamChunk::Done,
        ]
    );

    let stored = h.store.recent(10).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].role, Role::User);
    assert_eq!(stored[0].content, "tell me");
    assert_eq!(stored[1].role, Role::Assistant);
    assert_eq!(stored[1].content, "The quick fox");
    assert_eq!(stored[1].model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(stored[1].max_tokens, Some(2048));
}

#[tokio::test]
async fn test_hello_round_trip() {
    let mut h = harness(&["Hi", " there"]).await;

    h.relay.handle_turn(CLIENT, TurnRequest::new("hello")).await;

    assert_eq!(
        drain(&mut h.rx),
        vec![StreamChunk::content("Hi"), StreamChunk::content(" there"), StreamChunk::Done]
    );
    let history = h.store.recent(10).await.unwrap();
    let pairs: Vec<(Role, &str)> = history.iter().map(|m| (m.role, m.content.as_str())).collect();
    assert_eq!(pairs, vec![(Role::User, "hello"), (Role::Assistant, "Hi there")]);
}

#[tokio::test]
async fn test_abort_after_k_fragments() {
    let mut h = harness_with(|registry| FakeClient {
        abort_before: Some((2, registry)),
        ..FakeClient::new(&["a", "b", "c", "d", "e"])
    })
    .await;

    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("go")).await;

    assert_eq!(outcome, TurnOutcome::Aborted { forwarded: 2 });
    assert_eq!(
        drain(&mut h.rx),
        vec![
            StreamChunk::content("a"),
            StreamChunk::content("b"),
            StreamChunk::error("Generation aborted"),
            StreamChunk::Done,
        ]
    );

    let stored = h.store.recent(10).await.unwrap();
    assert_eq!(stored.len(), 1, "only the user message is kept");
    assert_eq!(stored[0].role, Role::User);
}

#[tokio::test]
async fn test_abort_after_last_fragment_skips_persisting_reply() {
    let mut h = harness_with(|registry| FakeClient {
        abort_before: Some((2, registry)),
        ..FakeClient::new(&["a", "b"])
    })
    .await;

    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("go")).await;

    assert_eq!(outcome, TurnOutcome::Aborted { forwarded: 2 });
    assert_eq!(
        drain(&mut h.rx),
        vec![
            StreamChunk::content("a"),
            StreamChunk::content("b"),
            StreamChunk::error("Generation aborted"),
            StreamChunk::Done,
        ]
    );
    let stored = h.store.recent(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "go");
}

#[tokio::test]
async fn test_turn_stays_on_the_connection_it_started_on() {
    let registry = Arc::new(ConnectionRegistry::new());
    let (old_tx, mut old_rx) = mpsc::channel(16);
    let (new_tx, mut new_rx) = mpsc::channel(16);
    registry.register(CLIENT, old_tx).await;

    let client = Arc::new(FakeClient::new(&["one", "two"]));
    *client.replace_on_open.lock().unwrap() = Some((Arc::clone(&registry), new_tx));
    let relay = MessageRelay::builder()
        .client(client)
        .store(Arc::new(SqliteMessageStore::in_memory().await.unwrap()))
        .registry(Arc::clone(&registry))
        .config(RelayConfig::default().without_pacing())
        .build()
        .unwrap();

    let outcome = relay.handle_turn(CLIENT, TurnRequest::new("hi")).await;

    assert_eq!(outcome, TurnOutcome::Completed { fragments: 2, persisted: true });
    assert_eq!(
        drain(&mut old_rx),
        vec![StreamChunk::content("one"), StreamChunk::content("two"), StreamChunk::Done]
    );
    assert!(new_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_abort_flag_cleared_at_next_turn() {
    let mut h = harness(&["fresh"]).await;

    h.registry.request_abort(CLIENT).await;
    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("again")).await;

    assert_eq!(outcome, TurnOutcome::Completed { fragments: 1, persisted: true });
    assert_eq!(drain(&mut h.rx), vec![StreamChunk::content("fresh"), StreamChunk::Done]);
}

#[tokio::test]
async fn test_upstream_error_becomes_error_chunk_then_done() {
    let mut h = harness_with(|_| FakeClient {
        fail_to_open: true,
        ..FakeClient::new(&[])
    })
    .await;

    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("hi")).await;

    assert!(matches!(outcome, TurnOutcome::Failed { phase: TurnPhase::Streaming, .. }));
    let chunks = drain(&mut h.rx);
    assert_eq!(chunks.len(), 2);
    match &chunks[0] {
        StreamChunk::Error { error } => {
            assert!(error.starts_with("Error: "), "{error}");
            assert!(error.contains("500"));
        }
        other => panic!("expected error chunk, got {other:?}"),
    }
    assert!(chunks[1].is_done());
}

#[tokio::test]
async fn test_mid_stream_error_discards_partial_output() {
    let mut h = harness_with(|_| FakeClient {
        fragments: vec![Ok("par".into()), Err("connection reset".into())],
        ..FakeClient::new(&[])
    })
    .await;

    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("hi")).await;

    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
    let chunks = drain(&mut h.rx);
    assert_eq!(chunks[0], StreamChunk::content("par"));
    assert!(matches!(&chunks[1], StreamChunk::Error { error } if error.contains("connection reset")));
    assert!(chunks[2].is_done());
    assert_eq!(h.store.recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_reply_is_not_persisted() {
    let mut h = harness(&[]).await;

    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("silence")).await;

    assert_eq!(outcome, TurnOutcome::Completed { fragments: 0, persisted: false });
    assert_eq!(drain(&mut h.rx), vec![StreamChunk::Done]);
    assert_eq!(h.store.recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_context_is_last_ten_messages_with_command_and_overrides() {
    let h = harness(&["ok"]).await;
    for i in 1..=14 {
        h.store
            .insert(NewChatMessage::new(Role::User, format!("old {i}")))
            .await
            .unwrap();
    }

    let request = TurnRequest {
        content: "newest".into(),
        command: Some("/summarize".into()),
        temperature: Some(0.1),
        max_tokens: Some(300),
    };
    h.relay.handle_turn(CLIENT, request).await;

    let sent = h.client.last_request();
    let context: Vec<&str> = sent.messages.iter().map(|m| m.content.as_str()).collect();
    let mut expected: Vec<String> = (6..=14).map(|i| format!("old {i}")).collect();
    expected.push("newest".into());
    assert_eq!(context, expected);
    assert_eq!(sent.command.as_deref(), Some("/summarize"));
    assert_eq!(sent.options.temperature, 0.1);
    assert_eq!(sent.options.max_tokens, 300);
    assert_eq!(sent.options.model.as_deref(), Some("gpt-4o-mini"));
}

#[tokio::test]
async fn test_persistence_failure_reported() {
    let registry = Arc::new(ConnectionRegistry::new());
    let (tx, mut rx) = mpsc::channel(16);
    registry.register(CLIENT, tx).await;
    let client = Arc::new(FakeClient::new(&["never"]));

    let relay = MessageRelay::builder()
        .client(client.clone())
        .store(Arc::new(BrokenStore))
        .registry(registry)
        .config(RelayConfig::default().without_pacing())
        .build()
        .unwrap();

    let outcome = relay.handle_turn(CLIENT, TurnRequest::new("hi")).await;

    assert!(matches!(outcome, TurnOutcome::Failed { phase: TurnPhase::PersistingUser, .. }));
    let chunks = drain(&mut rx);
    assert!(matches!(&chunks[0], StreamChunk::Error { error } if error.contains("disk on fire")));
    assert!(chunks[1].is_done());
    assert!(client.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unregistered_session_turn_completes_silently() {
    let h = harness(&["x"]).await;
    h.registry.unregister(CLIENT).await;

    let outcome = h.relay.handle_turn(CLIENT, TurnRequest::new("hi")).await;
    assert_eq!(outcome, TurnOutcome::Completed { fragments: 1, persisted: true });
}

#[tokio::test]
async fn test_turn_worker_serializes_turns() {
    let mut h = harness(&["one", "two"]).await;
    let (turns, worker) = spawn_turn_worker(Arc::clone(&h.relay), CLIENT.to_string());

    turns.send(TurnRequest::new("first")).await.unwrap();
    turns.send(TurnRequest::new("second")).await.unwrap();
    drop(turns);
    worker.await.unwrap();

    let chunks = drain(&mut h.rx);
    assert_eq!(
        chunks,
        vec![
            StreamChunk::content("one"),
            StreamChunk::content("two"),
            StreamChunk::Done,
            StreamChunk::content("one"),
            StreamChunk::content("two"),
            StreamChunk::Done,
        ]
    );

    let stored: Vec<String> = h.store.recent(10).await.unwrap().into_iter().map(|m| m.content).collect();
    assert_eq!(stored, vec!["first", "onetwo", "second", "onetwo"]);
}

#[test]
fn test_builder_requires_client_and_store() {
    assert!(MessageRelay::builder().build().is_err());
    assert!(MessageRelay::builder()
        .client(Arc::new(FakeClient::new(&[])))
        .build()
        .is_err());
}
