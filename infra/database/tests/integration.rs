use keeper_database::{
    ClientRecord, Database, MemoryStorage, StorageError, StorageProvider, SurrealStorage,
};
use keeper_domain::config::DatabaseConfig;
use keeper_domain::record::RecordKind;
use keeper_domain::session::SessionState;

async fn surreal() -> SurrealStorage {
    SurrealStorage::connect(&DatabaseConfig::default()).await.expect("connect to mem://")
}

async fn accounts_are_unique_and_checked(storage: impl StorageProvider) {
    storage.create_user("alice", "hash-a").await.expect("create alice");

    let err = storage.create_user("alice", "hash-b").await.unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err}");

    assert!(storage.exist_user("alice", "hash-a").await.unwrap());
    assert!(!storage.exist_user("alice", "hash-b").await.unwrap());
    assert!(!storage.exist_user("bob", "hash-a").await.unwrap());
}

async fn records_are_scoped_by_owner(storage: impl StorageProvider) {
    storage.create_data("alice", "mail", RecordKind::Password, "env-1").await.unwrap();
    storage.create_data("alice", "bank", RecordKind::Card, "env-2").await.unwrap();
    storage.create_data("bob", "mail", RecordKind::Text, "env-3").await.unwrap();

    let err = storage.create_data("alice", "mail", RecordKind::Text, "env-4").await.unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err}");

    assert_eq!(storage.titles_by_user("alice").await.unwrap(), vec!["bank", "mail"]);
    assert_eq!(storage.titles_by_user("bob").await.unwrap(), vec!["mail"]);
    assert!(storage.titles_by_user("carol").await.unwrap().is_empty());

    assert_eq!(storage.get_data("alice", "mail").await.unwrap(), "env-1");
    assert_eq!(storage.get_data("bob", "mail").await.unwrap(), "env-3");

    let err = storage.get_data("carol", "mail").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

async fn client_mirror_tracks_lifecycle(storage: impl StorageProvider) {
    storage.add_client("alice::1", "alice", SessionState::Handshake).await.unwrap();
    storage.add_client("bob::1", "bob", SessionState::Handshake).await.unwrap();

    let err = storage.add_client("alice::1", "alice", SessionState::Handshake).await.unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err}");

    storage.update_client_state("alice::1", SessionState::GetData).await.unwrap();
    storage.update_client_state("missing", SessionState::GetData).await.unwrap();

    let mut clients = storage.all_clients().await.unwrap();
    clients.sort_by(|a, b| a.client_id.cmp(&b.client_id));
    assert_eq!(
        clients,
        vec![
            ClientRecord {
                client_id: "alice::1".to_owned(),
                username: "alice".to_owned(),
                state: SessionState::GetData,
            },
            ClientRecord {
                client_id: "bob::1".to_owned(),
                username: "bob".to_owned(),
                state: SessionState::Handshake,
            },
        ]
    );

    storage.remove_client("alice::1").await.unwrap();
    storage.remove_client("alice::1").await.unwrap();
    assert_eq!(storage.all_clients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn surreal_accounts() {
    accounts_are_unique_and_checked(surreal().await).await;
}

#[tokio::test]
async fn surreal_records() {
    records_are_scoped_by_owner(surreal().await).await;
}

#[tokio::test]
async fn surreal_client_mirror() {
    client_mirror_tracks_lifecycle(surreal().await).await;
}

#[tokio::test]
async fn memory_accounts() {
    accounts_are_unique_and_checked(MemoryStorage::new()).await;
}

#[tokio::test]
async fn memory_records() {
    let storage = MemoryStorage::new();
    records_are_scoped_by_owner(storage.clone()).await;
    assert_eq!(storage.record_kind("alice", "bank"), Some(RecordKind::Card));
    assert_eq!(storage.record_kind("alice", "missing"), None);
}

#[tokio::test]
async fn memory_client_mirror() {
    client_mirror_tracks_lifecycle(MemoryStorage::new()).await;
}

#[tokio::test]
async fn schema_init_is_idempotent() {
    let storage = surreal().await;
    storage.init().await.expect("second init");
    storage.init().await.expect("third init");
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, StorageError::Validation { .. }));

    let err = Database::builder().url("mem://").init().await.unwrap_err();
    assert!(matches!(err, StorageError::Validation { .. }));
}

#[tokio::test]
async fn builder_exposes_session_names() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    assert_eq!(db.namespace(), "test_ns");
    assert_eq!(db.database(), "test_db");
    db.health().await.expect("health check");
}
