//! Rust client core for the Bangsamsir waste-bank backend
//!
//! One shared HTTP path with typed error classification, a session state
//! machine that survives connectivity blips, request deduplication for
//! polled reads, and a layered profile-photo upload chain.
//!
//! # Example
//!
//! ```rust,no_run
//! use bangsamsir_client::{BangsamsirClient, ClientConfig, FileTokenStore, SavingsOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create client over a persistent token store
//! let client = BangsamsirClient::new(
//!     ClientConfig {
//!         base_url: "https://bank-sampah.example.id".into(),
//!         ..Default::default()
//!     },
//!     Arc::new(FileTokenStore::new("/var/lib/bangsamsir")),
//! );
//!
//! // Restore the previous session, if the stored token still works
//! client.resume().await?;
//!
//! if !client.is_authenticated().await {
//!     client.login("budi", "secret").await?;
//! }
//!
//! // Deduplicated badge poll; None means a fetch is already running
//! if let Some(unread) = client.unread_count().await? {
//!     println!("unread notifications: {unread}");
//! }
//!
//! // Typed reads
//! let history = client.savings_history(&SavingsOptions::default()).await?;
//! println!("deposits: {}", history.riwayat.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod guard;
pub mod session;
pub mod token;
pub mod types;
pub mod upload;

// Re-export main types
pub use api::BangsamsirClient;
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, Result};
pub use executor::RequestExecutor;
pub use guard::{FetchGuard, GuardOutcome, GuardStats, DEFAULT_TTL};
pub use session::{SessionCoordinator, SessionState};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use types::*;
pub use upload::{PhotoUploader, UploadOutcome, UploadRequest};
