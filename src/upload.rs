//! Profile photo upload with layered fallbacks
//!
//! Backends behind campus proxies and flaky mobile networks reject
//! multipart bodies in creative ways, so the upload runs an ordered
//! strategy chain: standard multipart, then a base64 JSON body, then the
//! same multipart payload hand-encoded and sent through a one-off HTTP
//! client. The first success wins; failures are collected per strategy.
//!
//! Every strategy sends the previous photo URL along as a cleanup hint so
//! the server can delete the replaced file.

use crate::error::{ApiError, Result};
use crate::executor::RequestExecutor;
use crate::types::UserEnvelope;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use reqwest::{header, multipart, Method};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const PHOTO_PATH: &str = "/api/profile/photo";
const PHOTO_BASE64_PATH: &str = "/api/profile/photo/base64";

/// A photo to upload
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Raw image bytes
    pub data: Vec<u8>,
    /// Original file name, when the picker provides one
    pub file_name: Option<String>,
    /// MIME type as declared by the picker; may be absent or the bare
    /// `"image"` sentinel some pickers emit
    pub declared_mime: Option<String>,
}

/// A completed upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// URL of the stored photo
    pub photo_url: String,
    /// Which strategy landed it ("multipart", "base64", "raw-multipart",
    /// or "mock")
    pub strategy: &'static str,
    /// Photo that was replaced, when one existed
    pub previous_photo: Option<String>,
    /// Server- or client-side caveat attached to the result
    pub warning: Option<String>,
}

/// Resolved per-upload state shared by every strategy
struct UploadAttempt {
    data: Bytes,
    file_name: String,
    mime: String,
    previous_photo: Option<String>,
}

/// One way of getting the photo bytes to the server
#[async_trait]
trait UploadStrategy: Send + Sync {
    /// Short tag used in logs and failure summaries
    fn name(&self) -> &'static str;

    /// Attempt the upload, returning the server's JSON body
    async fn upload(&self, executor: &RequestExecutor, attempt: &UploadAttempt) -> Result<Value>;
}

// ==================== MIME Resolution ====================

/// Resolve the MIME type to declare for an upload.
///
/// A concrete declared type is trusted (`image/jpg` normalized to
/// `image/jpeg`); the bare `"image"` sentinel and an absent type fall
/// back to extension sniffing, defaulting to `image/jpeg`.
pub(crate) fn resolve_mime(declared: Option<&str>, file_name: Option<&str>) -> String {
    match declared {
        Some("image") | None => sniff_extension(file_name),
        Some("image/jpg") => "image/jpeg".to_string(),
        Some(declared) if !declared.is_empty() => declared.to_string(),
        _ => sniff_extension(file_name),
    }
}

fn sniff_extension(file_name: Option<&str>) -> String {
    let name = file_name.unwrap_or("").to_lowercase();
    if name.contains(".png") {
        "image/png"
    } else if name.contains(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
    .to_string()
}

fn default_file_name(mime: &str) -> String {
    let extension = mime.split('/').nth(1).unwrap_or("jpg");
    format!("photo_{}.{}", now_millis(), extension)
}

fn now_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

// ==================== Strategies ====================

/// Strategy 1: reqwest multipart form
struct MultipartStrategy;

#[async_trait]
impl UploadStrategy for MultipartStrategy {
    fn name(&self) -> &'static str {
        "multipart"
    }

    async fn upload(&self, executor: &RequestExecutor, attempt: &UploadAttempt) -> Result<Value> {
        let part = multipart::Part::bytes(attempt.data.to_vec())
            .file_name(attempt.file_name.clone())
            .mime_str(&attempt.mime)
            .map_err(ApiError::from_transport)?;

        let mut form = multipart::Form::new().part("photo", part);
        if let Some(previous) = &attempt.previous_photo {
            form = form.text("current_photo", previous.clone());
        }

        let builder = executor
            .upload_request(Method::POST, PHOTO_PATH)
            .await
            .multipart(form);
        executor.dispatch(&Method::POST, PHOTO_PATH, builder).await
    }
}

/// Strategy 2: base64 JSON body
struct Base64Strategy;

#[async_trait]
impl UploadStrategy for Base64Strategy {
    fn name(&self) -> &'static str {
        "base64"
    }

    async fn upload(&self, executor: &RequestExecutor, attempt: &UploadAttempt) -> Result<Value> {
        let mut body = json!({
            "photo_base64": STANDARD.encode(&attempt.data),
            "filename": attempt.file_name,
            "mimetype": attempt.mime,
        });
        if let Some(previous) = &attempt.previous_photo {
            body["current_photo"] = json!(previous);
        }

        let builder = executor
            .upload_request(Method::POST, PHOTO_BASE64_PATH)
            .await
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        executor
            .dispatch(&Method::POST, PHOTO_BASE64_PATH, builder)
            .await
    }
}

/// Strategy 3: hand-encoded multipart through a one-off client.
///
/// Bypasses the shared client and reqwest's multipart writer entirely,
/// for servers that choke on the default framing.
struct RawMultipartStrategy;

impl RawMultipartStrategy {
    fn encode_body(attempt: &UploadAttempt, boundary: &str) -> Bytes {
        let mut body = BytesMut::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"photo\"; filename=\"{}\"\r\n",
                attempt.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", attempt.mime).as_bytes());
        body.extend_from_slice(&attempt.data);
        body.extend_from_slice(b"\r\n");

        if let Some(previous) = &attempt.previous_photo {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            body.extend_from_slice(b"Content-Disposition: form-data; name=\"current_photo\"\r\n\r\n");
            body.extend_from_slice(previous.as_bytes());
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        body.freeze()
    }
}

#[async_trait]
impl UploadStrategy for RawMultipartStrategy {
    fn name(&self) -> &'static str {
        "raw-multipart"
    }

    async fn upload(&self, executor: &RequestExecutor, attempt: &UploadAttempt) -> Result<Value> {
        let boundary = format!("----bangsamsir-{}", Uuid::new_v4().simple());
        let body = Self::encode_body(attempt, &boundary);

        let client = reqwest::Client::builder()
            .timeout(executor.config().upload_timeout)
            .build()
            .map_err(ApiError::from_transport)?;

        let mut builder = client
            .post(executor.url(PHOTO_PATH))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, executor.config().user_agent())
            .body(body);
        if let Some(token) = executor.bearer().await {
            builder = builder.bearer_auth(token);
        }

        executor.dispatch(&Method::POST, PHOTO_PATH, builder).await
    }
}

// ==================== Uploader ====================

/// Runs the upload strategy chain
pub struct PhotoUploader {
    executor: Arc<RequestExecutor>,
    strategies: Vec<Box<dyn UploadStrategy>>,
}

impl PhotoUploader {
    /// Create the uploader with the standard strategy order
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            strategies: vec![
                Box::new(MultipartStrategy),
                Box::new(Base64Strategy),
                Box::new(RawMultipartStrategy),
            ],
        }
    }

    /// Upload a profile photo, falling through the strategy chain.
    ///
    /// In development, a chain-wide failure degrades to a synthetic
    /// success so UI work can continue against a broken uploader; in
    /// production it fails with one error summarizing every strategy.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome> {
        let mime = resolve_mime(request.declared_mime.as_deref(), request.file_name.as_deref());
        let file_name = request
            .file_name
            .clone()
            .unwrap_or_else(|| default_file_name(&mime));
        debug!(
            file_name = %file_name,
            mime = %mime,
            size = request.data.len(),
            "Starting photo upload"
        );

        let attempt = UploadAttempt {
            data: Bytes::from(request.data),
            file_name,
            mime,
            previous_photo: self.current_photo_url().await,
        };

        let mut failures: Vec<(&'static str, ApiError)> = Vec::new();
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "Attempting upload strategy");
            let result = strategy
                .upload(&self.executor, &attempt)
                .await
                .and_then(|value| parse_outcome(value, strategy.name(), &attempt));
            match result {
                Ok(outcome) => {
                    info!(
                        strategy = outcome.strategy,
                        photo_url = %outcome.photo_url,
                        "Photo upload succeeded"
                    );
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Upload strategy failed");
                    failures.push((strategy.name(), e));
                }
            }
        }

        if self.executor.config().is_development() {
            warn!("All upload strategies failed, returning development mock");
            return Ok(UploadOutcome {
                photo_url: format!("/uploads/profiles/mock_{}.jpg", now_millis()),
                strategy: "mock",
                previous_photo: attempt.previous_photo,
                warning: Some(
                    "Upload failed, simulated success for development".to_string(),
                ),
            });
        }

        let summary = failures
            .iter()
            .map(|(name, error)| format!("{}: {}", name, error))
            .collect::<Vec<_>>()
            .join(" | ");
        Err(ApiError::Unknown(format!(
            "All upload strategies failed. {}",
            summary
        )))
    }

    /// Look up the photo the new one will replace. Never fatal.
    async fn current_photo_url(&self) -> Option<String> {
        match self.executor.get("/api/profile").await {
            Ok(value) => serde_json::from_value::<UserEnvelope>(value)
                .ok()
                .filter(|envelope| envelope.success)
                .and_then(|envelope| envelope.user)
                .and_then(|user| user.foto_profil),
            Err(e) => {
                warn!(error = %e, "Could not read current photo, proceeding without cleanup hint");
                None
            }
        }
    }
}

/// Turn a strategy's raw response into an outcome, treating an envelope
/// failure or a missing URL as that strategy failing
fn parse_outcome(value: Value, strategy: &'static str, attempt: &UploadAttempt) -> Result<UploadOutcome> {
    let success = value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Upload rejected")
            .to_string();
        return Err(ApiError::Unknown(message));
    }

    let photo_url = value
        .get("photo_url")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Malformed("Upload response missing photo_url".to_string()))?
        .to_string();

    Ok(UploadOutcome {
        photo_url,
        strategy,
        previous_photo: attempt.previous_photo.clone(),
        warning: value
            .get("warning")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_concrete_mime_is_kept() {
        assert_eq!(resolve_mime(Some("image/png"), Some("x.jpg")), "image/png");
        assert_eq!(resolve_mime(Some("image/webp"), None), "image/webp");
    }

    #[test]
    fn test_image_jpg_is_normalized() {
        assert_eq!(resolve_mime(Some("image/jpg"), None), "image/jpeg");
    }

    #[test]
    fn test_generic_sentinel_falls_back_to_extension() {
        assert_eq!(resolve_mime(Some("image"), Some("IMG_01.PNG")), "image/png");
        assert_eq!(resolve_mime(Some("image"), Some("pic.webp")), "image/webp");
        assert_eq!(resolve_mime(Some("image"), Some("pic.jpeg")), "image/jpeg");
        assert_eq!(resolve_mime(Some("image"), Some("pic.jpg")), "image/jpeg");
    }

    #[test]
    fn test_absent_mime_defaults_to_jpeg() {
        assert_eq!(resolve_mime(None, None), "image/jpeg");
        assert_eq!(resolve_mime(None, Some("mystery.bin")), "image/jpeg");
        assert_eq!(resolve_mime(Some(""), Some("a.webp")), "image/webp");
    }

    #[test]
    fn test_default_file_name_uses_mime_extension() {
        let name = default_file_name("image/png");
        assert!(name.starts_with("photo_"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_raw_multipart_framing() {
        let attempt = UploadAttempt {
            data: Bytes::from_static(b"BYTES"),
            file_name: "selfie.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            previous_photo: Some("/uploads/profiles/old.jpg".to_string()),
        };
        let body = RawMultipartStrategy::encode_body(&attempt, "XYZ");
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"photo\"; filename=\"selfie.jpg\"\r\n"
        ));
        assert!(text.contains("Content-Type: image/jpeg\r\n\r\nBYTES\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"current_photo\"\r\n\r\n/uploads/profiles/old.jpg\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn test_raw_multipart_omits_cleanup_field_without_prior_photo() {
        let attempt = UploadAttempt {
            data: Bytes::from_static(b"BYTES"),
            file_name: "selfie.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            previous_photo: None,
        };
        let body = RawMultipartStrategy::encode_body(&attempt, "XYZ");
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("current_photo"));
    }

    #[test]
    fn test_parse_outcome_requires_success_and_url() {
        let attempt = UploadAttempt {
            data: Bytes::new(),
            file_name: "a.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            previous_photo: Some("/old.jpg".to_string()),
        };

        let ok = parse_outcome(
            serde_json::json!({ "success": true, "photo_url": "/uploads/profiles/1.jpg" }),
            "multipart",
            &attempt,
        )
        .unwrap();
        assert_eq!(ok.photo_url, "/uploads/profiles/1.jpg");
        assert_eq!(ok.strategy, "multipart");
        assert_eq!(ok.previous_photo.as_deref(), Some("/old.jpg"));

        let rejected = parse_outcome(
            serde_json::json!({ "success": false, "message": "too large" }),
            "multipart",
            &attempt,
        )
        .unwrap_err();
        assert!(matches!(rejected, ApiError::Unknown(m) if m == "too large"));

        let missing = parse_outcome(
            serde_json::json!({ "success": true }),
            "base64",
            &attempt,
        )
        .unwrap_err();
        assert!(matches!(missing, ApiError::Malformed(_)));
    }
}
