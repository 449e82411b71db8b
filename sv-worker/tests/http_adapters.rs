use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use sv_worker::dropbox::DropboxConnector;
use sv_worker::heroku::HerokuDomains;
use sv_worker_core::contract::{DomainRegistrar, StorageConnector, User};
use sv_worker_core::error::StorageError;

/// Serve `app` on an ephemeral local port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn user() -> User {
    User {
        id: 7,
        storage_token: "token-7".to_string(),
        storage_uid: "dbx7".to_string(),
        name: "jack".to_string(),
        folder_checksum: None,
        settings_revision: None,
        domain: None,
    }
}

#[tokio::test]
async fn existing_share_link_is_reused() {
    let app = Router::new()
        .route(
            "/sharing/create_shared_link_with_settings",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    r#"{"error_summary":"shared_link_already_exists/..","error":{".tag":"shared_link_already_exists"}}"#,
                )
            }),
        )
        .route(
            "/sharing/list_shared_links",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["path"], "/fall_2.png");
                Json(json!({
                    "links": [{ "url": "https://www.dropbox.com/s/abc/fall_2.png?dl=0" }],
                    "has_more": false
                }))
            }),
        );
    let base = serve(app).await;

    let storage = DropboxConnector::with_urls(reqwest::Client::new(), &base, &base).connect(&user());
    let url = storage.share_link("/fall_2.png").await.expect("link reused");

    assert_eq!(url, "https://www.dropbox.com/s/abc/fall_2.png?dl=0");
}

#[tokio::test]
async fn share_link_for_missing_file_is_not_found() {
    let app = Router::new().route(
        "/sharing/create_shared_link_with_settings",
        post(|| async {
            (
                StatusCode::CONFLICT,
                r#"{"error_summary":"path/not_found/.."}"#,
            )
        }),
    );
    let base = serve(app).await;

    let storage = DropboxConnector::with_urls(reqwest::Client::new(), &base, &base).connect(&user());
    let err = storage.share_link("/gone.png").await.unwrap_err();

    assert!(matches!(err, StorageError::NotFound(p) if p == "/gone.png"));
}

type Seen = Arc<Mutex<Vec<(Value, Option<String>)>>>;

fn heroku_app(status: StatusCode, seen: Seen) -> Router {
    Router::new()
        .route(
            "/apps/smallvictories/domains",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    seen.lock().unwrap().push((body, auth));
                    (status, r#"{"id":"invalid_params","message":"Hostname is already in use"}"#)
                },
            ),
        )
        .with_state(seen)
}

#[tokio::test]
async fn domain_registration_posts_hostname() {
    let seen: Seen = Arc::default();
    let base = serve(heroku_app(StatusCode::CREATED, seen.clone())).await;

    let heroku = HerokuDomains::with_url(
        reqwest::Client::new(),
        &base,
        "smallvictories",
        "ops@example.com",
        "token",
    );
    heroku
        .register("foo.example.com")
        .await
        .expect("registration accepted");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, json!({ "hostname": "foo.example.com" }));
    assert!(seen[0].1.as_deref().is_some_and(|a| a.starts_with("Basic ")));
}

#[tokio::test]
async fn rejected_domain_registration_is_an_error() {
    let seen: Seen = Arc::default();
    let base = serve(heroku_app(StatusCode::UNPROCESSABLE_ENTITY, seen.clone())).await;

    let heroku = HerokuDomains::with_url(
        reqwest::Client::new(),
        &base,
        "smallvictories",
        "ops@example.com",
        "token",
    );
    let err = heroku.register("foo.example.com").await.unwrap_err();

    assert!(err.to_string().contains("422"));
    assert!(err.to_string().contains("already in use"));
    assert_eq!(seen.lock().unwrap().len(), 1);
}
