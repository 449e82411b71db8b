use sv_worker_core::contract::{MockStorageClient, StoredFile, User};
use sv_worker_core::error::{SettingsSyncError, StorageError};
use sv_worker_core::settings::{render_settings, sync_settings, SyncStatus, UserSettings};

const PATH: &str = "/_settings.txt";
const DEFAULT_TITLE: &str = "A Small Victory";

const GOOD: &str = "# You can change these, and soon they will be read and updated
# Feel free to email broken@smallvictori.es if you need help :-)

domain: foo.example.com
title: Title One!

# Any errors will appear here

";

fn user(settings_revision: Option<&str>) -> User {
    User {
        id: 1,
        storage_token: "token".to_string(),
        storage_uid: "uid1".to_string(),
        name: "jack".to_string(),
        folder_checksum: None,
        settings_revision: settings_revision.map(str::to_string),
        domain: None,
    }
}

fn stored(body: &str, revision: &str) -> StoredFile {
    StoredFile {
        bytes: body.as_bytes().to_vec(),
        revision: revision.to_string(),
    }
}

#[tokio::test]
async fn unchanged_revision_is_up_to_date_every_time() {
    let mut storage = MockStorageClient::new();
    storage
        .expect_fetch()
        .withf(|path| path == PATH)
        .times(2)
        .returning(|_| Ok(stored(GOOD, "rev-5")));
    storage.expect_put().never();

    let user = user(Some("rev-5"));
    for _ in 0..2 {
        let outcome = sync_settings(&storage, &user, PATH, DEFAULT_TITLE).await;
        assert!(
            matches!(outcome.status, SyncStatus::UpToDate),
            "expected up to date, got {:?}",
            outcome.status
        );
        assert_eq!(outcome.settings.domain, "foo.example.com");
        assert_eq!(outcome.settings.title, "Title One!");
        assert_eq!(outcome.settings.revision, "rev-5");
    }
}

#[tokio::test]
async fn up_to_date_still_applies_defaults() {
    let mut storage = MockStorageClient::new();
    storage
        .expect_fetch()
        .returning(|_| Ok(stored("# just comments\n", "rev-1")));
    storage.expect_put().never();

    let outcome = sync_settings(&storage, &user(Some("rev-1")), PATH, DEFAULT_TITLE).await;

    assert!(matches!(outcome.status, SyncStatus::UpToDate));
    assert_eq!(outcome.settings.title, DEFAULT_TITLE);
    assert_eq!(outcome.settings.domain, "jack");
}

#[tokio::test]
async fn changed_revision_rewrites_document() {
    let mut storage = MockStorageClient::new();
    storage
        .expect_fetch()
        .returning(|_| Ok(stored("title:   Title One!\ndomain: foo.example.com\n", "rev-6")));
    storage
        .expect_put()
        .withf(|path, body| path == PATH && body.as_slice() == GOOD.as_bytes())
        .times(1)
        .returning(|_, _| Ok("rev-7".to_string()));

    let outcome = sync_settings(&storage, &user(Some("rev-5")), PATH, DEFAULT_TITLE).await;

    match outcome.status {
        SyncStatus::Written { revision } => assert_eq!(revision, "rev-7"),
        other => panic!("expected a write, got {other:?}"),
    }
    assert_eq!(outcome.settings.revision, "rev-7");
}

#[tokio::test]
async fn validation_errors_are_written_back_as_comments() {
    let mut storage = MockStorageClient::new();
    storage
        .expect_fetch()
        .returning(|_| Ok(stored("domain: example.com\ntitle: Mine\n", "rev-2")));
    storage
        .expect_put()
        .withf(|_, body| {
            let text = String::from_utf8_lossy(body);
            text.contains("domain: example.com\n")
                && text.contains("# we couldn't parse and update your domain \"example.com\"")
        })
        .times(1)
        .returning(|_, _| Ok("rev-3".to_string()));

    let outcome = sync_settings(&storage, &user(None), PATH, DEFAULT_TITLE).await;

    assert!(matches!(outcome.status, SyncStatus::Written { .. }));
    assert_eq!(outcome.settings.domain, "example.com");
    assert_eq!(outcome.settings.errors.len(), 1);
}

#[tokio::test]
async fn missing_document_is_created_from_defaults() {
    let expected = render_settings(&UserSettings {
        title: DEFAULT_TITLE.to_string(),
        domain: "jack".to_string(),
        ..Default::default()
    });

    let mut storage = MockStorageClient::new();
    storage
        .expect_fetch()
        .returning(|p| Err(StorageError::NotFound(p.to_string())));
    storage
        .expect_put()
        .withf(move |_, body| body.as_slice() == expected.as_bytes())
        .times(1)
        .returning(|_, _| Ok("rev-1".to_string()));

    let outcome = sync_settings(&storage, &user(None), PATH, DEFAULT_TITLE).await;

    assert!(matches!(outcome.status, SyncStatus::Written { ref revision } if revision == "rev-1"));
}

#[tokio::test]
async fn fetch_failure_reports_failed_without_writing() {
    let mut storage = MockStorageClient::new();
    storage
        .expect_fetch()
        .returning(|_| Err(StorageError::Response("503".to_string())));
    storage.expect_put().never();

    let outcome = sync_settings(&storage, &user(Some("rev-1")), PATH, DEFAULT_TITLE).await;

    assert!(matches!(
        outcome.status,
        SyncStatus::Failed(SettingsSyncError::Fetch(_))
    ));
    assert_eq!(outcome.settings.title, DEFAULT_TITLE);
    assert_eq!(outcome.settings.domain, "jack");
    assert!(outcome.settings.revision.is_empty());
}

#[tokio::test]
async fn write_failure_reports_failed() {
    let mut storage = MockStorageClient::new();
    storage
        .expect_fetch()
        .returning(|_| Ok(stored(GOOD, "rev-9")));
    storage
        .expect_put()
        .times(1)
        .returning(|_, _| Err(StorageError::Response("insufficient_space".to_string())));

    let outcome = sync_settings(&storage, &user(Some("rev-1")), PATH, DEFAULT_TITLE).await;

    assert!(matches!(
        outcome.status,
        SyncStatus::Failed(SettingsSyncError::Write(_))
    ));
    assert!(outcome.settings.revision.is_empty());
}
