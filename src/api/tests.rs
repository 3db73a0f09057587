//! Router tests against a live listener. Records are written straight to the
//! database so nothing here depends on cluster replication.

use chrono::{Duration, TimeZone, Utc};
use reqwest::StatusCode;
use ring::rand::SystemRandom;
use serde_json::Value;

use crate::client::RelayClient;
use crate::dashboard::{Dashboard, FileStats};
use crate::share;
use crate::storage::models::{FileRecord, ShareLinkRecord};
use crate::testutil::{spawn_server, test_state, TEST_TOKEN};

fn file(id: &str, name: &str, mime: &str, size: u64, day: u32) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        original_name: name.to_string(),
        byte_size: size,
        mime_type: mime.to_string(),
        uploaded_at: Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap(),
        ipfs_hash: None,
        upload_id: None,
    }
}

fn share_link(token: &str, file: &FileRecord) -> ShareLinkRecord {
    ShareLinkRecord {
        token: token.to_string(),
        file_id: file.id.clone(),
        file_name: file.original_name.clone(),
        password_hash: None,
        expires_at: None,
        max_downloads: 1,
        download_count: 0,
        description: None,
        created_at: Utc::now(),
        exhausted_at: None,
    }
}

async fn get_json(
    client: &reqwest::Client,
    url: String,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let resp = request.send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_management_routes_require_bearer_token() {
    let temp_dir = tempfile::tempdir().unwrap();
    let base = spawn_server(test_state(&temp_dir)).await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, format!("{base}/api/files/list"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing bearer token");

    let (status, _) = get_json(&client, format!("{base}/api/files/list"), Some("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        get_json(&client, format!("{base}/api/files/shared-links"), Some(TEST_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["sharedLinks"], serde_json::json!([]));
}

#[tokio::test]
async fn test_list_files_search_and_sort() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = test_state(&temp_dir);
    state.db.put_file(&file("a", "report.pdf", "application/pdf", 300, 1)).unwrap();
    state.db.put_file(&file("b", "holiday.jpg", "image/jpeg", 100, 2)).unwrap();
    state.db.put_file(&file("c", "cover.png", "image/png", 200, 3)).unwrap();
    let base = spawn_server(state).await;
    let client = reqwest::Client::new();

    // Default order is newest first
    let (status, body) = get_json(&client, format!("{base}/api/files/list"), Some(TEST_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
    assert_eq!(body["files"][0]["originalName"], "cover.png");
    assert_eq!(body["files"][0]["mimetype"], "image/png");
    assert_eq!(body["files"][0]["pinned"], false);

    let (_, body) = get_json(
        &client,
        format!("{base}/api/files/list?search=IMAGE&sort=size&order=asc"),
        Some(TEST_TOKEN),
    )
    .await;
    let ids: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b", "c"]);

    let (status, body) = get_json(
        &client,
        format!("{base}/api/files/list?sort=color"),
        Some(TEST_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_share_validation() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = test_state(&temp_dir);
    state.db.put_file(&file("a", "a.txt", "text/plain", 3, 1)).unwrap();
    let base = spawn_server(state).await;
    let client = reqwest::Client::new();

    let cases = [
        (serde_json::json!({"fileId": "missing"}), StatusCode::NOT_FOUND),
        (serde_json::json!({"fileId": "a", "maxDownloads": 0}), StatusCode::BAD_REQUEST),
        (serde_json::json!({"fileId": "a", "expiresInHours": 0}), StatusCode::BAD_REQUEST),
        (
            serde_json::json!({"fileId": "a", "expiresAt": "2001-01-01T00:00:00Z"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            serde_json::json!({"fileId": "a", "expiresAt": "2999-01-01T00:00:00Z", "expiresInHours": 2}),
            StatusCode::BAD_REQUEST,
        ),
        (
            serde_json::json!({"fileId": "a", "expiresInHours": u32::MAX}),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (body, expected) in cases {
        let resp = client
            .post(format!("{base}/api/files/share"))
            .bearer_auth(TEST_TOKEN)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected, "request body: {body}");
    }
}

#[tokio::test]
async fn test_share_info_is_public_and_redacted() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = test_state(&temp_dir);
    let f = file("a", "a.txt", "text/plain", 42, 1);
    state.db.put_file(&f).unwrap();

    let mut link = share_link("tok-info", &f);
    link.max_downloads = 3;
    link.download_count = 1;
    link.password_hash = Some(share::hash_password(&SystemRandom::new(), "secret").unwrap());
    state.db.put_share(&link).unwrap();

    let base = spawn_server(state).await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, format!("{base}/api/share/tok-info"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileName"], "a.txt");
    assert_eq!(body["size"], 42);
    assert_eq!(body["hasPassword"], true);
    assert_eq!(body["remainingDownloads"], 2);
    assert_eq!(body["status"], "active");
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("token").is_none());

    let (status, _) = get_json(&client, format!("{base}/api/share/unknown"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_rejects_wrong_password() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = test_state(&temp_dir);
    let f = file("a", "a.txt", "text/plain", 3, 1);
    state.db.put_file(&f).unwrap();

    let mut link = share_link("tok-pw", &f);
    link.password_hash = Some(share::hash_password(&SystemRandom::new(), "secret").unwrap());
    state.db.put_share(&link).unwrap();

    let db = state.db.clone();
    let base = spawn_server(state).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/share/tok-pw/download");

    let resp = client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(&url)
        .header("X-Share-Password", "guess")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Failed attempts do not count as downloads
    assert_eq!(db.get_share("tok-pw").unwrap().unwrap().download_count, 0);
}

#[tokio::test]
async fn test_inactive_links_are_gone() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = test_state(&temp_dir);
    let f = file("a", "a.txt", "text/plain", 3, 1);
    state.db.put_file(&f).unwrap();

    let mut expired = share_link("tok-expired", &f);
    expired.expires_at = Some(Utc::now() - Duration::minutes(5));
    state.db.put_share(&expired).unwrap();

    let mut exhausted = share_link("tok-exhausted", &f);
    exhausted.download_count = 1;
    exhausted.exhausted_at = Some(Utc::now());
    state.db.put_share(&exhausted).unwrap();

    let base = spawn_server(state).await;
    let client = reqwest::Client::new();

    for token in ["tok-expired", "tok-exhausted"] {
        let (status, body) =
            get_json(&client, format!("{base}/api/share/{token}/download"), None).await;
        assert_eq!(status, StatusCode::GONE, "token {token}");
        assert_eq!(body["success"], false);
    }

    let (_, body) = get_json(&client, format!("{base}/api/share/tok-expired"), None).await;
    assert_eq!(body["status"], "expired");
    let (_, body) = get_json(&client, format!("{base}/api/share/tok-exhausted"), None).await;
    assert_eq!(body["status"], "exhausted");
}

#[tokio::test]
async fn test_ipfs_upload_without_pinner_is_unavailable() {
    let temp_dir = tempfile::tempdir().unwrap();
    let base = spawn_server(test_state(&temp_dir)).await;

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"hello".to_vec()).file_name("hello.txt"),
    );
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/ipfs/upload"))
        .bearer_auth(TEST_TOKEN)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = test_state(&temp_dir);
    let limit = state.config.max_upload_size as usize;
    let db = state.db.clone();
    let base = spawn_server(state).await;

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(vec![0u8; limit + 1]).file_name("big.bin"),
    );
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/files/upload"))
        .bearer_auth(TEST_TOKEN)
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(db.list_files().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_reports_ipfs_disabled() {
    let temp_dir = tempfile::tempdir().unwrap();
    let base = spawn_server(test_state(&temp_dir)).await;

    let (status, body) =
        get_json(&reqwest::Client::new(), format!("{base}/_internal/health"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ipfsEnabled"], false);
}

#[tokio::test]
async fn test_dashboard_refresh_publishes_stats() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = test_state(&temp_dir);
    state.db.put_file(&file("a", "one.txt", "text/plain", 1000, 1)).unwrap();
    state.db.put_file(&file("b", "two.txt", "text/plain", 1500, 2)).unwrap();
    state.db.put_file(&file("c", "three.txt", "text/plain", 500, 3)).unwrap();
    let base = spawn_server(state).await;

    let published = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&published);
    let client = RelayClient::new(&base, Some(TEST_TOKEN.to_string())).unwrap();
    let mut dashboard = Dashboard::new(client).on_stats(move |s| sink.lock().unwrap().push(s));

    dashboard.refresh().await.unwrap();

    assert_eq!(dashboard.state().files.len(), 3);
    assert_eq!(
        published.lock().unwrap().last().copied(),
        Some(FileStats {
            count: 3,
            total_size: 3000
        })
    );

    // Without a token the load fails and the list reverts to empty
    let client = RelayClient::new(&base, None).unwrap();
    let mut anonymous = Dashboard::new(client);
    assert!(anonymous.refresh().await.is_err());
    assert!(anonymous.state().files.is_empty());
}
