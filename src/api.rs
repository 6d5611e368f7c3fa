//! High-level client facade
//!
//! `BangsamsirClient` wires the executor, session coordinator, fetch
//! guard, and photo uploader together and exposes one typed method per
//! backend operation. The wrappers stay thin: build the query string,
//! execute, deserialize the envelope.

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::executor::{query_string, RequestExecutor};
use crate::guard::{FetchGuard, GuardOutcome, GuardStats, DEFAULT_TTL};
use crate::session::{SessionCoordinator, SessionState};
use crate::token::TokenStore;
use crate::types::*;
use crate::upload::{PhotoUploader, UploadOutcome, UploadRequest};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Guard key for the notification badge poll
const UNREAD_COUNT_KEY: &str = "unread-count";

/// Client for the Bangsamsir waste-bank backend
///
/// # Example
///
/// ```rust,no_run
/// use bangsamsir_client::{BangsamsirClient, ClientConfig, MemoryTokenStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = BangsamsirClient::new(
///     ClientConfig::default(),
///     Arc::new(MemoryTokenStore::new()),
/// );
///
/// client.resume().await?;
/// let user = client.login("budi", "secret").await?;
/// println!("saldo: {}", user.saldo);
///
/// let unread = client.unread_count().await?;
/// # Ok(())
/// # }
/// ```
pub struct BangsamsirClient {
    executor: Arc<RequestExecutor>,
    session: SessionCoordinator,
    guard: FetchGuard,
    uploader: PhotoUploader,
}

impl BangsamsirClient {
    /// Create a client from explicit configuration
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Self {
        let executor = Arc::new(RequestExecutor::new(config, tokens));
        let session = SessionCoordinator::new(Arc::clone(&executor));
        let uploader = PhotoUploader::new(Arc::clone(&executor));
        Self {
            executor,
            session,
            guard: FetchGuard::new(),
            uploader,
        }
    }

    /// Create a client configured from environment variables
    pub fn from_env(tokens: Arc<dyn TokenStore>) -> Self {
        Self::new(ClientConfig::from_env(), tokens)
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    // ==================== Health ====================

    /// True when the backend answers its health endpoint
    pub async fn health(&self) -> bool {
        match self.executor.get("/api/health").await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Health check failed");
                false
            }
        }
    }

    // ==================== Session ====================

    /// Verify stored credentials at process start
    pub async fn resume(&self) -> Result<SessionState> {
        self.session.resume().await
    }

    /// Log in with username and password
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        self.session.login(username, password).await
    }

    /// Create an account and start its session
    pub async fn register(&self, input: &RegisterInput) -> Result<User> {
        self.session.register(input).await
    }

    /// Re-fetch the signed-in profile; `Ok(None)` when skipped
    pub async fn refresh_user(&self) -> Result<Option<User>> {
        self.session.refresh().await
    }

    /// End the session and drop all cached reads
    pub async fn logout(&self) {
        self.session.logout().await;
        self.guard.clear();
    }

    /// Current session state
    pub async fn session_state(&self) -> SessionState {
        self.session.state().await
    }

    /// Profile of the signed-in member, if any
    pub async fn current_user(&self) -> Option<User> {
        self.session.current_user().await
    }

    /// True while a session is established
    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    // ==================== Profile ====================

    /// Fetch the signed-in member's profile
    pub async fn profile(&self) -> Result<User> {
        let value = self.executor.get("/api/profile").await?;
        let response: UserEnvelope = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        response
            .user
            .ok_or_else(|| ApiError::Malformed("Profile response missing user".to_string()))
    }

    /// Update profile fields; merges the server's answer into the session
    pub async fn update_profile(&self, input: &UpdateProfileInput) -> Result<Option<User>> {
        let body = serde_json::to_value(input)?;
        let value = self.executor.put("/api/profile", &body).await?;
        let response: UserEnvelope = serde_json::from_value(value)?;
        if !response.success {
            return Err(ApiError::Unknown(
                response
                    .message
                    .unwrap_or_else(|| "Failed to update profile".to_string()),
            ));
        }

        match response.user {
            Some(user) => {
                let patch = serde_json::to_value(&user)?;
                self.session.merge_user(&patch).await;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Upload a new profile photo through the strategy chain
    pub async fn upload_profile_photo(&self, request: UploadRequest) -> Result<UploadOutcome> {
        let outcome = self.uploader.upload(request).await?;
        self.session
            .merge_user(&json!({ "foto_profil": outcome.photo_url }))
            .await;
        Ok(outcome)
    }

    /// Remove the profile photo
    pub async fn delete_profile_photo(&self) -> Result<()> {
        let value = self.executor.delete("/api/profile/photo").await?;
        let response: UserEnvelope = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        self.session
            .merge_user(&json!({ "foto_profil": null }))
            .await;
        Ok(())
    }

    // ==================== Notifications ====================

    /// List notifications with their stats block
    pub async fn notifications(&self, options: &NotificationOptions) -> Result<NotificationsResponse> {
        let mut params = Vec::new();
        if let Some(limit) = options.limit {
            params.push(format!("limit={}", limit));
        }
        if options.unread_only {
            params.push("unreadOnly=true".to_string());
        }
        let path = format!("/api/notifikasi{}", query_string(&params));

        let value = self.executor.get(&path).await?;
        let response: NotificationsResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        Ok(response)
    }

    /// Badge count for the notification tab, deduplicated and cached.
    ///
    /// `None` means a fetch is in flight and nothing is known yet, so a
    /// poller can simply keep its current badge.
    pub async fn unread_count(&self) -> Result<Option<i64>> {
        let executor = Arc::clone(&self.executor);
        let outcome = self
            .guard
            .guarded(UNREAD_COUNT_KEY, DEFAULT_TTL, move || async move {
                let value = executor
                    .get("/api/notifikasi?limit=1&unreadOnly=true")
                    .await?;
                let response: NotificationsResponse =
                    serde_json::from_value(value.clone())?;
                if !response.success {
                    return Err(read_failure(response.message));
                }
                Ok(value)
            })
            .await?;

        Ok(outcome.into_value().map(|value| {
            serde_json::from_value::<NotificationsResponse>(value)
                .ok()
                .and_then(|response| response.stats)
                .map(|stats| stats.unread_count)
                .unwrap_or(0)
        }))
    }

    /// Mark one notification read
    pub async fn mark_notification_read(&self, id: i64) -> Result<()> {
        let path = format!("/api/notifikasi/{}/read", id);
        let value = self.executor.patch(&path, &json!({})).await?;
        self.confirm_notification_mutation(value)
    }

    /// Mark every notification read
    pub async fn mark_all_notifications_read(&self) -> Result<()> {
        let value = self.executor.post_empty("/api/notifikasi/all/read").await?;
        self.confirm_notification_mutation(value)
    }

    /// Delete one notification
    pub async fn delete_notification(&self, id: i64) -> Result<()> {
        let path = format!("/api/notifikasi/{}/read", id);
        let value = self.executor.delete(&path).await?;
        self.confirm_notification_mutation(value)
    }

    /// Delete every already-read notification
    pub async fn delete_read_notifications(&self) -> Result<()> {
        let value = self
            .executor
            .delete("/api/notifikasi/all/read?onlyRead=true")
            .await?;
        self.confirm_notification_mutation(value)
    }

    /// Delete every notification, read or not
    pub async fn clear_notifications(&self) -> Result<()> {
        let value = self.executor.delete("/api/notifikasi/all/read").await?;
        self.confirm_notification_mutation(value)
    }

    /// Check a mutation envelope and bust the badge cache on success
    fn confirm_notification_mutation(&self, value: Value) -> Result<()> {
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(String::from);
            return Err(read_failure(message));
        }
        self.guard.invalidate(UNREAD_COUNT_KEY);
        Ok(())
    }

    // ==================== Savings & Balance ====================

    /// Catalog of accepted waste kinds with current prices
    pub async fn waste_types(&self) -> Result<Vec<WasteType>> {
        let value = self.executor.get("/api/waste-types").await?;
        let response: WasteTypesResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        Ok(response.waste_types)
    }

    /// Deposit history with stats and the price catalog
    pub async fn savings_history(&self, options: &SavingsOptions) -> Result<SavingsResponse> {
        let mut params = Vec::new();
        if let Some(ref periode) = options.periode {
            params.push(format!("periode={}", urlencoding::encode(periode)));
        }
        if let Some(ref month) = options.month {
            params.push(format!("month={}", urlencoding::encode(month)));
        }
        if let Some(ref year) = options.year {
            params.push(format!("year={}", urlencoding::encode(year)));
        }
        if let Some(ref date) = options.date {
            params.push(format!("date={}", urlencoding::encode(date)));
        }
        let path = format!("/api/nasabah/riwayat{}", query_string(&params));

        let value = self.executor.get(&path).await?;
        let response: SavingsResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        Ok(response)
    }

    /// Balance ledger with its totals
    pub async fn balance_mutations(&self, options: &MutationOptions) -> Result<MutationsResponse> {
        let mut params = Vec::new();
        if let Some(ref month) = options.month {
            params.push(format!("month={}", urlencoding::encode(month)));
        }
        if let Some(limit) = options.limit {
            params.push(format!("limit={}", limit));
        }
        if let Some(offset) = options.offset {
            params.push(format!("offset={}", offset));
        }
        let path = format!("/api/nasabah/mutasi-saldo{}", query_string(&params));

        let value = self.executor.get(&path).await?;
        let response: MutationsResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        Ok(response)
    }

    /// The member's cash-out requests
    pub async fn withdrawals(&self) -> Result<Vec<Withdrawal>> {
        let value = self.executor.get("/api/nasabah/withdrawal").await?;
        let response: WithdrawalsResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        Ok(response.entries().to_vec())
    }

    /// Submit a cash-out request
    pub async fn request_withdrawal(&self, input: &WithdrawalInput) -> Result<()> {
        let body = serde_json::to_value(input)?;
        let value = self
            .executor
            .post("/api/nasabah/withdrawal", &body)
            .await?;
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(String::from);
            return Err(read_failure(message));
        }
        Ok(())
    }

    // ==================== Education Content ====================

    /// Published articles
    pub async fn articles(&self, options: &ArticleOptions) -> Result<Vec<Article>> {
        let mut params = Vec::new();
        if let Some(ref kategori) = options.kategori {
            params.push(format!("kategori={}", urlencoding::encode(kategori)));
        }
        if let Some(ref search) = options.search {
            params.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(limit) = options.limit {
            params.push(format!("limit={}", limit));
        }
        if let Some(offset) = options.offset {
            params.push(format!("offset={}", offset));
        }
        let path = format!("/api/artikel{}", query_string(&params));

        let value = self.executor.get(&path).await?;
        let response: ArticlesResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        Ok(response.entries().to_vec())
    }

    /// One article by its slug
    pub async fn article_by_slug(&self, slug: &str) -> Result<Article> {
        let path = format!("/api/artikel/{}", urlencoding::encode(slug));
        let value = self.executor.get(&path).await?;
        let response: ArticleResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        response
            .entry()
            .cloned()
            .ok_or_else(|| ApiError::Malformed("Article response missing article".to_string()))
    }

    /// Circular-economy videos
    pub async fn videos(&self, options: &VideoOptions) -> Result<Vec<VideoItem>> {
        let mut params = Vec::new();
        if let Some(ref kategori) = options.kategori {
            params.push(format!("kategori={}", urlencoding::encode(kategori)));
        }
        if let Some(ref search) = options.search {
            params.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(ref sort_by) = options.sort_by {
            params.push(format!("sortBy={}", urlencoding::encode(sort_by)));
        }
        if let Some(limit) = options.limit {
            params.push(format!("limit={}", limit));
        }
        if let Some(offset) = options.offset {
            params.push(format!("offset={}", offset));
        }
        let path = format!("/api/ekonomi-sirkular{}", query_string(&params));

        let value = self.executor.get(&path).await?;
        let response: VideosResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        Ok(response.entries().to_vec())
    }

    /// One video by id
    pub async fn video_by_id(&self, id: i64) -> Result<VideoItem> {
        let path = format!("/api/ekonomi-sirkular/{}", id);
        let value = self.executor.get(&path).await?;
        let response: VideoResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(read_failure(response.message));
        }
        response
            .entry()
            .cloned()
            .ok_or_else(|| ApiError::Malformed("Video response missing video".to_string()))
    }

    // ==================== Raw Access & Caching ====================

    /// Run any fetcher behind the dedup/cache guard
    pub async fn guarded<F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<GuardOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        self.guard.guarded(key, ttl, fetcher).await
    }

    /// Drop one cached guard entry
    pub fn invalidate(&self, key: &str) {
        self.guard.invalidate(key);
    }

    /// Guard cache counters
    pub fn cache_stats(&self) -> GuardStats {
        self.guard.stats()
    }

    /// The underlying executor, for endpoints this facade does not wrap
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }
}

/// Envelope `success: false` on a read maps to `Unknown`
fn read_failure(message: Option<String>) -> ApiError {
    ApiError::Unknown(message.unwrap_or_else(|| "Request failed".to_string()))
}
