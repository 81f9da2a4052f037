use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use transfer_idp::config::Settings;
use transfer_idp::create_app;
use transfer_idp::directory::{DirectoryService, Identity};
use transfer_idp::errors::AppError;
use transfer_idp::storage::StorageService;

/// Directory double: scripted authentication verdict and lookup result,
/// with a counter to prove resolution never runs for rejected credentials.
#[derive(Default)]
struct MockDirectory {
    authenticate_ok: bool,
    bind_error: bool,
    canonical_id: Option<String>,
    resolve_calls: Arc<Mutex<u32>>,
}

#[async_trait]
impl DirectoryService for MockDirectory {
    async fn bind(&self, _login_name: &str, _secret: &str) -> Result<bool, AppError> {
        if self.bind_error {
            return Err(AppError::directory_unavailable("directory offline"));
        }
        Ok(self.authenticate_ok)
    }

    async fn find_canonical_id(
        &self,
        login_name: &str,
        _secret: &str,
    ) -> Result<Identity, AppError> {
        *self.resolve_calls.lock().unwrap() += 1;
        match &self.canonical_id {
            Some(id) => Ok(Identity {
                canonical_account_id: id.clone(),
            }),
            None => Err(AppError::identity_not_found(format!(
                "no record for {login_name}"
            ))),
        }
    }
}

/// Storage double: fixed existing-key count plus call recorders.
#[derive(Default)]
struct MockStorage {
    existing_keys: u64,
    fail_list: bool,
    list_calls: Arc<Mutex<Vec<(String, String)>>>,
    put_calls: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl StorageService for MockStorage {
    async fn count_keys_with_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: u32,
    ) -> Result<u64, AppError> {
        self.list_calls
            .lock()
            .unwrap()
            .push((bucket.to_string(), prefix.to_string()));
        if self.fail_list {
            return Err(AppError::storage_unavailable("storage offline"));
        }
        Ok(self.existing_keys.min(max_keys as u64))
    }

    async fn put_empty_object(&self, bucket: &str, key: &str) -> Result<(), AppError> {
        self.put_calls
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }
}

fn settings() -> Settings {
    Settings {
        home_directory_name: "transfer-home".to_string(),
        s3_access_role_arn: "arn:aws:iam::111122223333:role/transfer-access".to_string(),
        s3_root_bucket_arn: "arn:aws:s3:::transfer-home".to_string(),
        directory_url: "ldaps://ad.example.com:636".to_string(),
        directory_base_dn: "dc=example,dc=com".to_string(),
    }
}

async fn post_authorize(app: Router, username: &str, password: &str) -> Result<(StatusCode, Value)> {
    let req = Request::builder()
        .method("POST")
        .uri("/authorize")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"username": username, "password": password}).to_string(),
        ))?;
    let resp: Response = app.oneshot(req).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok((status, serde_json::from_slice(&body_bytes)?))
}

#[tokio::test]
async fn happy_path_grants_and_provisions_namespace() -> Result<()> {
    let directory = Arc::new(MockDirectory {
        authenticate_ok: true,
        canonical_id: Some("A1234".to_string()),
        ..Default::default()
    });
    let storage = Arc::new(MockStorage::default());
    let app = create_app(settings(), directory, storage.clone());

    // login name differs from the canonical account id on purpose
    let (status, body) = post_authorize(app, "alice", "hunter22").await?;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["Role"], "arn:aws:iam::111122223333:role/transfer-access");
    assert_eq!(body["HomeDirectory"], "/transfer-home/A1234");
    assert_eq!(body["userName"], "A1234");

    // scoping tokens come from the resolved identity, never from "alice"
    let policy: Value = serde_json::from_str(body["Policy"].as_str().unwrap())?;
    assert_eq!(
        policy["Statement"][0]["Condition"]["StringLike"]["s3:prefix"],
        json!(["A1234/*", "A1234"])
    );
    assert_eq!(
        policy["Statement"][1]["Resource"],
        "arn:aws:s3:::transfer-home/A1234*"
    );
    assert!(!body["Policy"].as_str().unwrap().contains("alice"));

    // namespace was checked and the marker created
    assert_eq!(
        *storage.list_calls.lock().unwrap(),
        vec![("transfer-home".to_string(), "A1234/".to_string())]
    );
    assert_eq!(
        *storage.put_calls.lock().unwrap(),
        vec![("transfer-home".to_string(), "A1234/".to_string())]
    );

    Ok(())
}

#[tokio::test]
async fn existing_namespace_skips_marker_creation() -> Result<()> {
    let directory = Arc::new(MockDirectory {
        authenticate_ok: true,
        canonical_id: Some("A1234".to_string()),
        ..Default::default()
    });
    let storage = Arc::new(MockStorage {
        existing_keys: 1,
        ..Default::default()
    });
    let app = create_app(settings(), directory, storage.clone());

    let (status, body) = post_authorize(app, "alice", "hunter22").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userName"], "A1234");
    assert!(storage.put_calls.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn rejected_credential_denies_without_downstream_calls() -> Result<()> {
    let directory = Arc::new(MockDirectory {
        authenticate_ok: false,
        canonical_id: Some("A1234".to_string()),
        ..Default::default()
    });
    let resolve_calls = directory.resolve_calls.clone();
    let storage = Arc::new(MockStorage::default());
    let app = create_app(settings(), directory, storage.clone());

    let (status, body) = post_authorize(app, "alice", "wrong").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    // denial happened before resolution and before any storage traffic
    assert_eq!(*resolve_calls.lock().unwrap(), 0);
    assert!(storage.list_calls.lock().unwrap().is_empty());
    assert!(storage.put_calls.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn storage_outage_denies_after_successful_resolution() -> Result<()> {
    let directory = Arc::new(MockDirectory {
        authenticate_ok: true,
        canonical_id: Some("A1234".to_string()),
        ..Default::default()
    });
    let storage = Arc::new(MockStorage {
        fail_list: true,
        ..Default::default()
    });
    let app = create_app(settings(), directory, storage.clone());

    let (status, body) = post_authorize(app, "alice", "hunter22").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(storage.put_calls.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn unreachable_directory_denies() -> Result<()> {
    let directory = Arc::new(MockDirectory {
        bind_error: true,
        ..Default::default()
    });
    let storage = Arc::new(MockStorage::default());
    let app = create_app(settings(), directory, storage);

    let (status, body) = post_authorize(app, "alice", "hunter22").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    Ok(())
}

#[tokio::test]
async fn missing_directory_record_denies() -> Result<()> {
    let directory = Arc::new(MockDirectory {
        authenticate_ok: true,
        canonical_id: None,
        ..Default::default()
    });
    let storage = Arc::new(MockStorage::default());
    let app = create_app(settings(), directory, storage.clone());

    let (status, body) = post_authorize(app, "alice", "hunter22").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(storage.list_calls.lock().unwrap().is_empty());

    Ok(())
}
