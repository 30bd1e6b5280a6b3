use keeper_database::{MemoryStorage, StorageProvider};
use keeper_domain::config::SessionConfig;
use keeper_domain::protocol::CommandMessage;
use keeper_domain::session::SessionState;
use keeper_kernel::Shutdown;
use keeper_session::texts::{
    CREATE_MENU, DATA_SAVED, DUPLICATE_TITLE, EMPTY_USERNAME, INVALID_MESSAGE, MAIN_MENU, NO_DATA,
};
use keeper_session::{
    SessionEngine, SessionError, SessionHandle, SessionRegistry, TransportError, TransportSink,
    TransportStream, serve,
};
use keeper_vault::Vault;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(150);

type Frame = Result<Option<CommandMessage>, TransportError>;

struct ChannelStream(mpsc::UnboundedReceiver<Frame>);

impl TransportStream for ChannelStream {
    async fn recv(&mut self) -> Frame {
        self.0.recv().await.unwrap_or(Ok(None))
    }
}

struct ChannelSink(mpsc::UnboundedSender<CommandMessage>);

impl TransportSink for ChannelSink {
    async fn send(&mut self, message: CommandMessage) -> Result<(), TransportError> {
        self.0
            .send(message)
            .map_err(|_| TransportError::Io { message: "peer gone".into(), context: None })
    }
}

struct Harness {
    storage: MemoryStorage,
    engine: Arc<SessionEngine<MemoryStorage>>,
    shutdown: Shutdown,
}

impl Harness {
    fn new() -> Self {
        let storage = MemoryStorage::new();
        let vault: Vault =
            Vault::builder().key("thisis32byteencryptionkey1234567").unwrap().build().unwrap();
        let engine =
            Arc::new(SessionEngine::new(storage.clone(), vault, SessionConfig::default()));
        Self { storage, engine, shutdown: Shutdown::new() }
    }

    fn registry(&self) -> &SessionRegistry<MemoryStorage> {
        self.engine.registry()
    }

    fn attach(&self) -> Client {
        let (frames, stream) = mpsc::unbounded_channel();
        let (sink, replies) = mpsc::unbounded_channel();
        let task = tokio::spawn(serve(
            Arc::clone(&self.engine),
            ChannelStream(stream),
            ChannelSink(sink),
            self.shutdown.subscribe(),
        ));
        Client { frames: Some(frames), replies, task }
    }

    async fn connect(&self, username: &str) -> Client {
        let mut client = self.attach();
        client.say(username, "hello");
        assert_eq!(client.next().await, MAIN_MENU);
        client
    }
}

struct Client {
    frames: Option<mpsc::UnboundedSender<Frame>>,
    replies: mpsc::UnboundedReceiver<CommandMessage>,
    task: JoinHandle<Result<(), SessionError>>,
}

impl Client {
    fn say(&self, username: &str, message: &str) {
        if let Some(frames) = &self.frames {
            frames.send(Ok(Some(CommandMessage::new(username, message)))).unwrap();
        }
    }

    fn garble(&self, reason: &'static str) {
        if let Some(frames) = &self.frames {
            frames
                .send(Err(TransportError::Protocol { message: reason.into(), context: None }))
                .unwrap();
        }
    }

    fn send(&self, message: &str) {
        self.say("", message);
    }

    async fn next_message(&mut self) -> CommandMessage {
        tokio::time::timeout(WAIT, self.replies.recv())
            .await
            .expect("reply in time")
            .expect("session still writing")
    }

    async fn next(&mut self) -> String {
        self.next_message().await.message
    }

    async fn assert_quiet(&mut self) {
        let pending = tokio::time::timeout(QUIET, self.replies.recv()).await;
        assert!(pending.is_err(), "unexpected message: {pending:?}");
    }

    async fn hang_up(mut self) -> Result<(), SessionError> {
        self.frames = None;
        tokio::time::timeout(WAIT, self.task).await.expect("session ends").expect("no panic")
    }

    async fn create(&mut self, choice: &str, payload: &str) -> Vec<String> {
        self.send("2");
        assert_eq!(self.next().await, CREATE_MENU);
        self.send(choice);
        self.next().await;
        self.send(payload);
        vec![self.next().await, self.next().await]
    }
}

#[tokio::test]
async fn store_and_retrieve() {
    let harness = Harness::new();
    let mut alice = harness.connect("alice").await;

    alice.send("1");
    assert_eq!(alice.next().await, NO_DATA);
    assert_eq!(alice.next().await, MAIN_MENU);

    let replies = alice.create("1", "mail::alice@example.com::s3cret::work").await;
    assert_eq!(replies, vec![DATA_SAVED, MAIN_MENU]);

    alice.send("1");
    assert_eq!(alice.next().await, "\nWhat do you want to get:\n1) mail\n");
    alice.send("1");
    assert_eq!(
        alice.next().await,
        "Your data:\nlogin: alice@example.com\nmeta: work\npassword: s3cret\n"
    );
    assert_eq!(alice.next().await, MAIN_MENU);

    let envelope = harness.storage.get_data("alice", "mail").await.unwrap();
    assert!(!envelope.contains("s3cret"));
    assert_eq!(
        harness.storage.record_kind("alice", "mail"),
        Some(keeper_domain::record::RecordKind::Password)
    );

    alice.hang_up().await.unwrap();
}

#[tokio::test]
async fn duplicate_title_keeps_create_prompt() {
    let harness = Harness::new();
    let mut alice = harness.connect("alice").await;

    assert_eq!(alice.create("2", "poem::roses are red::").await, vec![DATA_SAVED, MAIN_MENU]);

    alice.send("2");
    alice.next().await;
    alice.send("2");
    alice.next().await;
    alice.send("poem::violets are blue::");
    assert_eq!(alice.next().await, DUPLICATE_TITLE);

    let client_id = harness.registry().client_ids().pop().unwrap();
    let session = harness.registry().get(&client_id).unwrap();
    assert_eq!(session.state(), SessionState::CreateData);

    alice.send("poem2::violets are blue::");
    assert_eq!(alice.next().await, DATA_SAVED);
    assert_eq!(alice.next().await, MAIN_MENU);
    assert_eq!(harness.storage.titles_by_user("alice").await.unwrap(), vec!["poem", "poem2"]);
}

#[tokio::test]
async fn broadcast_reaches_only_the_owners_other_sessions() {
    let harness = Harness::new();
    let mut first = harness.connect("alice").await;
    let mut second = harness.connect("alice").await;
    let mut bob = harness.connect("bob").await;

    let replies = first.create("3", "visa::4111111111111111::12/29::ALICE::123::").await;
    assert_eq!(replies, vec![DATA_SAVED, MAIN_MENU]);

    let notice = second.next_message().await;
    assert_eq!(notice.username, "server");
    assert_eq!(notice.message, "UPDATE! New record: visa");
    second.assert_quiet().await;

    first.assert_quiet().await;
    bob.assert_quiet().await;
}

#[tokio::test]
async fn disconnect_deregisters_and_clears_mirror() {
    let harness = Harness::new();
    let alice = harness.connect("alice").await;

    let mirror = harness.storage.all_clients().await.unwrap();
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0].state, SessionState::SelectAction);
    assert!(mirror[0].client_id.starts_with("alice::"));

    alice.hang_up().await.unwrap();
    assert!(harness.registry().is_empty());
    assert!(harness.storage.all_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn transport_error_ends_session() {
    let harness = Harness::new();
    let alice = harness.connect("alice").await;

    if let Some(frames) = &alice.frames {
        frames.send(Err(TransportError::Io { message: "reset".into(), context: None })).unwrap();
    }
    let result = tokio::time::timeout(WAIT, alice.task).await.unwrap().unwrap();

    assert!(result.unwrap_err().is_transport());
    assert!(harness.registry().is_empty());
}

#[tokio::test]
async fn malformed_frame_is_answered_and_session_continues() {
    let harness = Harness::new();
    let mut alice = harness.connect("alice").await;

    alice.garble("expected value");
    assert_eq!(alice.next().await, INVALID_MESSAGE);
    assert_eq!(harness.registry().len(), 1);

    alice.send("2");
    assert_eq!(alice.next().await, CREATE_MENU);

    assert!(alice.hang_up().await.is_ok());
    assert!(harness.registry().is_empty());
}

#[tokio::test]
async fn malformed_handshake_frame_keeps_waiting() {
    let harness = Harness::new();
    let mut client = harness.attach();

    client.garble("trailing characters");
    assert_eq!(client.next().await, INVALID_MESSAGE);
    assert!(harness.registry().is_empty());

    client.say("alice", "hello");
    assert_eq!(client.next().await, MAIN_MENU);
    assert_eq!(harness.registry().len(), 1);
}

#[tokio::test]
async fn shutdown_ends_every_session() {
    let harness = Harness::new();
    let first = harness.connect("alice").await;
    let second = harness.connect("bob").await;
    assert_eq!(harness.registry().len(), 2);

    harness.shutdown.trigger();

    for client in [first, second] {
        let result = tokio::time::timeout(WAIT, client.task).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
    assert!(harness.registry().is_empty());
}

#[tokio::test]
async fn blank_username_is_rejected_until_a_name_arrives() {
    let harness = Harness::new();
    let mut client = harness.attach();

    client.say("   ", "hello");
    assert_eq!(client.next().await, EMPTY_USERNAME);
    assert!(harness.registry().is_empty());

    client.say("alice", "hello");
    assert_eq!(client.next().await, MAIN_MENU);
    assert_eq!(harness.registry().len(), 1);
}

#[tokio::test]
async fn eof_before_handshake_is_clean() {
    let harness = Harness::new();
    let client = harness.attach();
    client.hang_up().await.unwrap();
    assert!(harness.registry().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registry_survives_concurrent_churn() {
    let storage = MemoryStorage::new();
    let registry = Arc::new(SessionRegistry::new(storage.clone()));

    let tasks = (0..64)
        .map(|n| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let (session, _queue) = SessionHandle::new(format!("user{n}::id"), "user", 4);
                registry.register(session).await.unwrap();
                if n % 2 == 0 {
                    assert!(registry.remove(&format!("user{n}::id")).await);
                }
            })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(registry.len(), 32);
    assert_eq!(storage.all_clients().await.unwrap().len(), 32);
    assert!(registry.client_ids().iter().all(|id| {
        id.trim_start_matches("user").trim_end_matches("::id").parse::<u32>().unwrap() % 2 == 1
    }));
}

#[tokio::test]
async fn remove_is_idempotent() {
    let storage = MemoryStorage::new();
    let registry = SessionRegistry::new(storage.clone());
    let (session, _queue) = SessionHandle::new("alice::1", "alice", 4);
    registry.register(Arc::clone(&session)).await.unwrap();

    let (duplicate, _queue) = SessionHandle::new("alice::1", "alice", 4);
    assert!(registry.register(duplicate).await.unwrap_err().is_conflict());

    assert!(registry.remove("alice::1").await);
    assert!(session.is_terminated());
    assert!(!registry.remove("alice::1").await);
    assert!(!registry.remove("never-registered").await);
    assert!(storage.all_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn recover_purges_stale_mirror_rows() {
    let storage = MemoryStorage::new();
    storage.add_client("ghost::1", "ghost", SessionState::GetData).await.unwrap();
    storage.add_client("ghost::2", "ghost", SessionState::Connected).await.unwrap();

    let registry = SessionRegistry::new(storage.clone());
    let (live, _queue) = SessionHandle::new("alice::1", "alice", 4);
    registry.register(live).await.unwrap();

    assert_eq!(registry.recover().await.unwrap(), 2);
    let remaining = storage.all_clients().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].client_id, "alice::1");
}
