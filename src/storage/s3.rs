use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;

use super::sigv4::{self, CanonicalRequest, SigningKey, EMPTY_PAYLOAD_HASH};
use super::StorageService;
use crate::config::required_var;
use crate::errors::AppError;

const S3_SERVICE: &str = "s3";

/// `StorageService` speaking the S3 REST API directly, with SigV4 request
/// signing. All requests carry an empty payload (listing and zero-byte
/// marker puts), so the payload hash is a constant.
pub struct S3Storage {
    client: reqwest::Client,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    /// Path-style endpoint override for S3-compatible backends.
    endpoint: Option<String>,
}

impl S3Storage {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            client: reqwest::Client::new(),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            access_key_id: required_var("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required_var("AWS_SECRET_ACCESS_KEY")?,
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
            endpoint: std::env::var("S3_ENDPOINT_URL").ok(),
        })
    }

    /// Host header value and base URL for a bucket: virtual-hosted style
    /// against AWS, path-style when an endpoint override is configured.
    fn host_and_base(&self, bucket: &str) -> Result<(String, String), AppError> {
        match &self.endpoint {
            Some(endpoint) => {
                let url = reqwest::Url::parse(endpoint).map_err(|err| {
                    AppError::configuration(format!("invalid S3_ENDPOINT_URL: {err}"))
                })?;
                let host = url
                    .host_str()
                    .ok_or_else(|| AppError::configuration("S3_ENDPOINT_URL has no host"))?;
                let host = match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                let base = format!(
                    "{}://{host}/{bucket}",
                    url.scheme()
                );
                Ok((host, base))
            }
            None => {
                let host = format!("{bucket}.s3.{}.amazonaws.com", self.region);
                let base = format!("https://{host}");
                Ok((host, base))
            }
        }
    }

    async fn signed_request(
        &self,
        method: Method,
        bucket: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, AppError> {
        let (host, base) = self.host_and_base(bucket)?;
        let canonical_path = match &self.endpoint {
            Some(_) => format!("/{bucket}{path}"),
            None => path.to_string(),
        };
        let canonical_query = query
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let mut headers = vec![
            ("host".to_string(), host),
            ("x-amz-content-sha256".to_string(), EMPTY_PAYLOAD_HASH.to_string()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = &self.session_token {
            // keeps lexicographic header order: host < x-amz-content-sha256
            // < x-amz-date < x-amz-security-token
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let canonical = CanonicalRequest {
            method: method.as_str(),
            path: &canonical_path,
            query: &canonical_query,
            headers,
            payload_hash: EMPTY_PAYLOAD_HASH,
        };
        let key = SigningKey {
            access_key_id: &self.access_key_id,
            secret_access_key: &self.secret_access_key,
            region: &self.region,
            service: S3_SERVICE,
        };
        let authorization = sigv4::authorization_header(&key, &canonical, &amz_date);

        let mut url = format!("{base}{path}");
        if !canonical_query.is_empty() {
            url.push('?');
            url.push_str(&canonical_query);
        }

        let mut request = self
            .client
            .request(method, &url)
            .header("x-amz-content-sha256", EMPTY_PAYLOAD_HASH)
            .header("x-amz-date", &amz_date)
            .header("authorization", authorization);
        if let Some(token) = &self.session_token {
            request = request.header("x-amz-security-token", token);
        }

        request
            .send()
            .await
            .map_err(|err| AppError::storage_unavailable(format!("s3 request: {err}")))
    }
}

#[async_trait]
impl StorageService for S3Storage {
    async fn count_keys_with_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: u32,
    ) -> Result<u64, AppError> {
        // query pairs sorted by name, as the canonical request requires
        let query = [
            ("list-type", "2".to_string()),
            ("max-keys", max_keys.to_string()),
            ("prefix", prefix.to_string()),
        ];
        let response = self.signed_request(Method::GET, bucket, "/", &query).await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::storage_unavailable(format!("s3 list body: {err}")))?;
        if !status.is_success() {
            return Err(AppError::storage_unavailable(format!(
                "s3 list failed: {status}"
            )));
        }

        extract_tag(&body, "KeyCount")
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| AppError::storage_unavailable("s3 list response missing KeyCount"))
    }

    async fn put_empty_object(&self, bucket: &str, key: &str) -> Result<(), AppError> {
        let response = self
            .signed_request(Method::PUT, bucket, &object_path(key), &[])
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::storage_unavailable(format!(
                "s3 put failed: {status}"
            )));
        }
        Ok(())
    }
}

/// URI-encode an object key into a request path, preserving `/` separators.
fn object_path(key: &str) -> String {
    let encoded = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{encoded}")
}

/// Pull the text of the first `<tag>...</tag>` out of an XML body. The
/// listing response is the only XML this service reads, and `KeyCount` is
/// the only field it needs, so a full XML parser stays out of the tree.
fn extract_tag<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(&xml[start..end])
}
