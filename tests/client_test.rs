//! API client tests against an in-process mock of the design API.

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use atelier::batch::run_batch;
use atelier::client::{ApiClient, ApiError, UploadTarget};
use atelier::models::{ChecklistItem, NewComment, SectionType};
use atelier::optimistic::{ReorderCommand, item_ids, run_optimistic};
use atelier::poller::{NotificationWatcher, SectionWatcher};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use common::{MockApi, TempDir, checklist_json, comment_json, roster_json};
use serde_json::{Value, json};

type Recorded = Arc<Mutex<Vec<Value>>>;

fn client(api: &MockApi) -> ApiClient {
    ApiClient::new(api.url.clone(), Some("test-token".to_string())).unwrap()
}

fn asset_json(id: &str, filename: &str) -> Value {
    json!({
        "id": id,
        "url": format!("https://blob.example.com/{}", filename),
        "filename": filename,
        "createdAt": "2024-05-01T09:00:00Z"
    })
}

// ==================== Roster ====================

#[tokio::test]
async fn test_team_roster_falls_back_to_chat_endpoint() {
    let api = MockApi::start(
        Router::new().route("/api/chat/team-members", get(|| async { Json(roster_json()) })),
    );

    let members = client(&api).team_members().await.unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(members[1].name, "Bo Chen");
}

#[tokio::test]
async fn test_team_roster_prefers_mentions_endpoint() {
    let api = MockApi::start(
        Router::new()
            .route(
                "/api/team/mentions",
                get(|| async { Json(json!([{ "id": "m1", "name": "Mentions Roster" }])) }),
            )
            .route("/api/chat/team-members", get(|| async { Json(roster_json()) })),
    );

    let members = client(&api).team_members().await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, "m1");
}

#[tokio::test]
async fn test_team_roster_other_errors_do_not_fall_back() {
    let api = MockApi::start(
        Router::new()
            .route(
                "/api/team/mentions",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/api/chat/team-members", get(|| async { Json(roster_json()) })),
    );

    let err = client(&api).team_members().await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
}

// ==================== Errors ====================

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let api = MockApi::start(Router::new().route(
        "/api/design/comments",
        post(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Section is finalized" })),
            )
        }),
    ));

    let comment = NewComment {
        section_id: "sec-1".to_string(),
        content: "Can we try sage?".to_string(),
        parent_id: None,
        mentions: vec![],
        tags: vec![],
    };
    let err = client(&api).create_comment(&comment).await.unwrap_err();

    assert!(matches!(err, ApiError::Status { code: 409, .. }));
    assert_eq!(err.to_string(), "Section is finalized");
}

#[tokio::test]
async fn test_generic_message_without_json_body() {
    let api = MockApi::start(Router::new().route(
        "/api/design/notifications",
        get(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream</html>") }),
    ));

    let err = client(&api).list_notifications().await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status 502");
}

#[tokio::test]
async fn test_unauthorized_and_not_found() {
    let api = MockApi::start(
        Router::new().route("/api/stages/{id}", get(|| async { StatusCode::UNAUTHORIZED })),
    );
    let c = client(&api);

    assert!(matches!(c.get_stage("s1").await, Err(ApiError::Unauthorized)));
    let err = c.list_checklist("s1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unparseable_body_is_parse_error() {
    let api = MockApi::start(
        Router::new().route("/api/rfq/supplier-quote", get(|| async { Json(json!({ "quotes": [] })) })),
    );

    let err = client(&api).list_supplier_quotes().await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_connection_refused_is_http_error() {
    let c = ApiClient::new("http://127.0.0.1:9", None).unwrap();
    let err = c.list_notifications().await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)));
    assert_eq!(err.status_code(), None);
}

// ==================== Requests ====================

#[tokio::test]
async fn test_bearer_token_and_query_are_sent() {
    let api = MockApi::start(Router::new().route(
        "/api/design/comments",
        get(
            |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if auth != "Bearer test-token" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "no token" })));
                }
                let section = query.get("sectionId").cloned().unwrap_or_default();
                let mut c = comment_json("c1", None, 0);
                c["sectionId"] = json!(section);
                (StatusCode::OK, Json(json!([c])))
            },
        ),
    ));

    let comments = client(&api).list_comments("sec 42").await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].section_id.as_deref(), Some("sec 42"));
}

#[tokio::test]
async fn test_ensure_section_posts_type() {
    let seen: Recorded = Arc::default();
    let api = MockApi::start(
        Router::new()
            .route(
                "/api/design/sections",
                post(|State(seen): State<Recorded>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body.clone());
                    Json(json!({
                        "id": "sec-9",
                        "stageId": body["stageId"],
                        "type": body["type"],
                        "status": "DRAFT",
                        "completed": false,
                        "createdAt": "2024-05-01T09:00:00Z",
                        "updatedAt": "2024-05-01T09:00:00Z"
                    }))
                }),
            )
            .with_state(seen.clone()),
    );

    let section = client(&api)
        .ensure_section("stage-1", SectionType::WallCovering)
        .await
        .unwrap();

    assert_eq!(section.section_type, SectionType::WallCovering);
    assert_eq!(
        seen.lock().unwrap()[0],
        json!({ "stageId": "stage-1", "type": "WALL_COVERING" })
    );
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let api = MockApi::start(Router::new().route(
        "/api/comments/{id}",
        delete(|Path(id): Path<String>| async move {
            if id == "a/b" {
                StatusCode::NO_CONTENT
            } else {
                StatusCode::BAD_REQUEST
            }
        }),
    ));

    client(&api).delete_comment("a/b").await.unwrap();
}

// ==================== Uploads ====================

#[tokio::test]
async fn test_multipart_upload() {
    let api = MockApi::start(Router::new().route(
        "/api/design/upload",
        post(|mut multipart: Multipart| async move {
            let mut section = String::new();
            let mut filename = String::new();
            let mut size = 0;
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                match name.as_str() {
                    "sectionId" => section = field.text().await.unwrap(),
                    "file" => {
                        filename = field.file_name().unwrap_or_default().to_string();
                        size = field.bytes().await.unwrap().len();
                    }
                    _ => {}
                }
            }
            let mut asset = asset_json("a1", &filename);
            asset["caption"] = json!(format!("{}:{}", section, size));
            Json(asset)
        }),
    ));

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("swatch.jpg");
    std::fs::write(&file, b"12345").unwrap();

    let asset = client(&api)
        .upload_asset("sec-1", &file, UploadTarget::Server)
        .await
        .unwrap();
    assert_eq!(asset.filename, "swatch.jpg");
    assert_eq!(asset.caption.as_deref(), Some("sec-1:5"));
}

#[tokio::test]
async fn test_blob_upload_flow() {
    let uploaded: Arc<Mutex<Option<(String, usize)>>> = Arc::default();
    let uploaded_state = uploaded.clone();

    let api = MockApi::start_with(move |base| {
        Router::new()
            .route(
                "/api/design/upload/token",
                post(move |Json(body): Json<Value>| async move {
                    assert_eq!(body["contentType"], "application/pdf");
                    Json(json!({
                        "uploadUrl": format!("{}/blob/{}", base, body["filename"].as_str().unwrap()),
                        "token": "blob-token",
                        "assetUrl": "https://blob.example.com/plan.pdf"
                    }))
                }),
            )
            .route(
                "/blob/{name}",
                put(
                    |State(seen): State<Arc<Mutex<Option<(String, usize)>>>>,
                     headers: HeaderMap,
                     body: axum::body::Bytes| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        *seen.lock().unwrap() = Some((auth, body.len()));
                        StatusCode::OK
                    },
                ),
            )
            .route(
                "/api/design/upload/complete",
                post(|Json(body): Json<Value>| async move {
                    let mut asset = asset_json("a7", body["filename"].as_str().unwrap());
                    asset["url"] = body["url"].clone();
                    Json(asset)
                }),
            )
            .with_state(uploaded_state)
    });

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("plan.pdf");
    std::fs::write(&file, b"%PDF-1.7").unwrap();

    let asset = client(&api)
        .upload_asset("sec-1", &file, UploadTarget::Blob)
        .await
        .unwrap();

    assert_eq!(asset.id, "a7");
    assert_eq!(asset.url, "https://blob.example.com/plan.pdf");
    let (auth, len) = uploaded.lock().unwrap().clone().unwrap();
    assert_eq!(auth, "Bearer blob-token");
    assert_eq!(len, 8);
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let api = MockApi::start(Router::new());
    let err = client(&api)
        .upload_asset("sec-1", std::path::Path::new("/nonexistent/photo.jpg"), UploadTarget::Server)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Io { .. }));
}

// ==================== Optimistic updates ====================

#[tokio::test]
async fn test_checklist_reorder_reverts_on_server_error() {
    let api = MockApi::start(
        Router::new()
            .route("/api/stages/{id}/checklist", get(|| async { Json(checklist_json()) }))
            .route(
                "/api/stages/{id}/checklist/reorder",
                patch(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Could not save order" })),
                    )
                }),
            ),
    );
    let c = client(&api);

    let original: Vec<ChecklistItem> = c.list_checklist("stage-1").await.unwrap();
    let mut items = original.clone();

    let result = run_optimistic(&mut items, ReorderCommand::new(2, 0), |items| {
        let ids = item_ids(items);
        let c = c.clone();
        async move { c.reorder_checklist("stage-1", &ids).await }
    })
    .await;

    assert_eq!(result.unwrap_err().to_string(), "Could not save order");
    assert_eq!(items, original);
}

#[tokio::test]
async fn test_checklist_reorder_sends_new_order() {
    let seen: Recorded = Arc::default();
    let api = MockApi::start(
        Router::new()
            .route(
                "/api/stages/{id}/checklist/reorder",
                patch(|State(seen): State<Recorded>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    StatusCode::NO_CONTENT
                }),
            )
            .with_state(seen.clone()),
    );
    let c = client(&api);

    let mut items: Vec<ChecklistItem> = serde_json::from_value(checklist_json()).unwrap();
    run_optimistic(&mut items, ReorderCommand::new(0, 2), |items| {
        let ids = item_ids(items);
        let c = c.clone();
        async move { c.reorder_checklist("stage-1", &ids).await }
    })
    .await
    .unwrap();

    assert_eq!(item_ids(&items), vec!["i2", "i3", "i1"]);
    assert_eq!(seen.lock().unwrap()[0], json!({ "itemIds": ["i2", "i3", "i1"] }));
}

// ==================== Batch ====================

#[tokio::test]
async fn test_bulk_delete_partial_failure() {
    let api = MockApi::start(Router::new().route(
        "/api/design/assets/{id}",
        delete(|Path(id): Path<String>| async move {
            if id == "a2" {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Asset not found" })))
            } else {
                (StatusCode::OK, Json(json!({ "ok": true })))
            }
        }),
    ));
    let c = client(&api);

    let ids = vec!["a1".to_string(), "a2".to_string(), "a3".to_string()];
    let summary = run_batch(ids, String::clone, |id| {
        let c = c.clone();
        async move {
            c.delete_asset(&id).await?;
            Ok::<_, ApiError>(id)
        }
    })
    .await;

    assert_eq!(summary.succeeded, vec!["a1", "a3"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].item, "a2");
    assert_eq!(
        summary.to_toast(1, "Deleted", "asset").message,
        "Deleted 2 of 3 assets; 1 failed"
    );
}

// ==================== Notification watcher ====================

#[tokio::test]
async fn test_watcher_yields_each_unread_notification_once() {
    let api = MockApi::start(Router::new().route(
        "/api/design/notifications",
        get(|| async {
            Json(json!([
                { "id": "n1", "type": "MENTION", "message": "Ana mentioned you", "isRead": false, "createdAt": "2024-05-01T09:00:00Z" },
                { "id": "n2", "type": "COMMENT", "message": "Old news", "isRead": true, "createdAt": "2024-05-01T08:00:00Z" },
                { "id": "n3", "type": "SOMETHING_NEW", "message": "Future kind", "isRead": false, "createdAt": "2024-05-01T09:30:00Z" }
            ]))
        }),
    ));

    let mut watcher = NotificationWatcher::start(client(&api), Duration::from_millis(30));

    let first = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, "n1");
    assert_eq!(second.id, "n3");
    assert_eq!(second.kind, atelier::models::NotificationKind::Other);

    // Several more polls happen, but nothing new arrives
    let again = tokio::time::timeout(Duration::from_millis(200), watcher.recv()).await;
    assert!(again.is_err());

    assert!(watcher.is_running());
    watcher.stop().await;
}

#[tokio::test]
async fn test_watcher_survives_failed_polls() {
    let calls = Arc::new(Mutex::new(0u32));
    let api = MockApi::start(
        Router::new()
            .route(
                "/api/design/notifications",
                get(|State(calls): State<Arc<Mutex<u32>>>| async move {
                    let mut n = calls.lock().unwrap();
                    *n += 1;
                    if *n < 3 {
                        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "busy" })))
                    } else {
                        (
                            StatusCode::OK,
                            Json(json!([{ "id": "n9", "type": "REPLY", "message": "New reply", "createdAt": "2024-05-01T09:00:00Z" }])),
                        )
                    }
                }),
            )
            .with_state(calls.clone()),
    );

    let mut watcher = NotificationWatcher::start(client(&api), Duration::from_millis(20));
    let got = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(got.id, "n9");
    assert!(*calls.lock().unwrap() >= 3);
    watcher.stop().await;
}

#[tokio::test]
async fn test_section_watcher_yields_only_on_change() {
    let calls = Arc::new(Mutex::new(0u32));
    let api = MockApi::start(
        Router::new()
            .route(
                "/api/design/comments",
                get(|State(calls): State<Arc<Mutex<u32>>>| async move {
                    let mut n = calls.lock().unwrap();
                    *n += 1;
                    if *n < 3 {
                        Json(json!([comment_json("c1", None, 0)]))
                    } else {
                        Json(json!([comment_json("c1", None, 0), comment_json("c2", Some("c1"), 2)]))
                    }
                }),
            )
            .with_state(calls.clone()),
    );

    let mut watcher = SectionWatcher::start(client(&api), "sec-1", Duration::from_millis(20));

    let first = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 1);

    // The unchanged second poll is skipped
    let second = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.len(), 2);
    assert!(*calls.lock().unwrap() >= 3);

    let quiet = tokio::time::timeout(Duration::from_millis(150), watcher.recv()).await;
    assert!(quiet.is_err());
    watcher.stop().await;
}
