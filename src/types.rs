//! Wire types for the Bangsamsir backend
//!
//! Field names match the backend JSON exactly (a mix of Indonesian
//! snake_case and a few camelCase stats keys). Responses tolerate absent
//! optional fields via `serde(default)`; unknown fields are ignored.

use serde::{Deserialize, Serialize};

// ==================== Auth & Profile ====================

/// Account profile as the backend returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub nama_lengkap: String,
    /// "admin" or "nasabah"
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub unit_kerja: Option<String>,
    #[serde(default)]
    pub kategori_id: Option<i64>,
    /// 1 when the member is staff
    #[serde(default)]
    pub pegawai: i64,
    #[serde(default)]
    pub unit_kerja_id: Option<i64>,
    #[serde(default)]
    pub nip: Option<String>,
    /// Relative URL of the profile photo, if one was uploaded
    #[serde(default)]
    pub foto_profil: Option<String>,
    #[serde(default)]
    pub poin: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub exp: i64,
    /// Withdrawable balance in rupiah
    #[serde(default)]
    pub saldo: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Login / registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Envelope for endpoints that answer with a single profile
/// (`/api/auth/me`, `/api/profile`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Fields accepted by POST `/api/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub nama_lengkap: String,
}

/// Fields accepted by PUT `/api/profile`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileInput {
    pub nama_lengkap: String,
    pub pegawai: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_kerja: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

// ==================== Notifications ====================

/// A single notification row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub judul: String,
    #[serde(default)]
    pub pesan: String,
    #[serde(default)]
    pub tipe: Option<String>,
    /// 0 unread, 1 read
    #[serde(default)]
    pub dibaca: i64,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Per-priority unread breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorityCount {
    #[serde(default)]
    pub urgent: i64,
    #[serde(default)]
    pub high: i64,
    #[serde(default)]
    pub normal: i64,
    #[serde(default)]
    pub low: i64,
}

/// Aggregates the backend sends alongside the notification list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationStats {
    #[serde(default, rename = "totalNotifications")]
    pub total_notifications: i64,
    #[serde(default, rename = "unreadCount")]
    pub unread_count: i64,
    #[serde(default, rename = "todayCount")]
    pub today_count: i64,
    #[serde(default, rename = "priorityCount")]
    pub priority_count: PriorityCount,
}

/// GET `/api/notifikasi` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub stats: Option<NotificationStats>,
}

/// Query options for the notification list
#[derive(Debug, Clone, Default)]
pub struct NotificationOptions {
    pub limit: Option<u32>,
    pub unread_only: bool,
}

// ==================== Waste Catalog & Savings ====================

/// Catalog entry for one accepted waste kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteType {
    pub id: i64,
    pub nama_jenis: String,
    #[serde(default)]
    pub harga_per_kg: f64,
    #[serde(default)]
    pub urutan: i64,
}

/// GET `/api/waste-types` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteTypesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "wasteTypes")]
    pub waste_types: Vec<WasteType>,
}

/// One weighed line inside a savings transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsDetail {
    #[serde(default)]
    pub jenis: String,
    #[serde(default)]
    pub berat: f64,
    #[serde(default)]
    pub nilai: f64,
    #[serde(default)]
    pub harga_per_kg: f64,
}

/// A deposit visit: one dated drop-off with its weighed breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsEntry {
    pub id: i64,
    #[serde(default)]
    pub tanggal: String,
    #[serde(default)]
    pub total_nilai: f64,
    #[serde(default)]
    pub total_berat: f64,
    /// Summary label, e.g. "Plastik, Kertas"
    #[serde(default)]
    pub jenis_sampah: String,
    #[serde(default)]
    pub poin_earned: i64,
    #[serde(default)]
    pub admin: Option<String>,
    #[serde(default)]
    pub keterangan: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub breakdown: Option<String>,
    #[serde(default)]
    pub details: Vec<SavingsDetail>,
}

/// Running totals over the savings history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavingsStats {
    #[serde(default, rename = "totalTransaksi")]
    pub total_transaksi: i64,
    #[serde(default, rename = "totalBerat")]
    pub total_berat: f64,
    #[serde(default, rename = "totalNilai")]
    pub total_nilai: f64,
    #[serde(default, rename = "totalPoin")]
    pub total_poin: i64,
    #[serde(default)]
    pub breakdown: Option<serde_json::Value>,
}

/// GET `/api/nasabah/riwayat` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub riwayat: Vec<SavingsEntry>,
    #[serde(default)]
    pub stats: Option<SavingsStats>,
    #[serde(default)]
    pub jenis_sampah: Vec<WasteType>,
}

// ==================== Balance Mutations & Withdrawals ====================

/// One ledger movement on the member balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceMutation {
    pub id: i64,
    /// "masuk" or "keluar"
    #[serde(default)]
    pub jenis: String,
    #[serde(default)]
    pub jumlah: f64,
    #[serde(default)]
    pub saldo_awal: f64,
    #[serde(default)]
    pub saldo_akhir: f64,
    #[serde(default)]
    pub keterangan: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Totals over the mutation history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationStats {
    #[serde(default, rename = "totalMasuk")]
    pub total_masuk: f64,
    #[serde(default, rename = "totalKeluar")]
    pub total_keluar: f64,
    #[serde(default, rename = "transaksiMasuk")]
    pub transaksi_masuk: i64,
    #[serde(default, rename = "transaksiKeluar")]
    pub transaksi_keluar: i64,
}

/// GET `/api/nasabah/mutasi-saldo` response; the list arrives under
/// either `mutasi` or `data` depending on the backend version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mutasi: Option<Vec<BalanceMutation>>,
    #[serde(default)]
    pub data: Option<Vec<BalanceMutation>>,
    #[serde(default)]
    pub stats: Option<MutationStats>,
}

impl MutationsResponse {
    /// The mutation list, whichever key carried it
    pub fn entries(&self) -> &[BalanceMutation] {
        self.mutasi
            .as_deref()
            .or(self.data.as_deref())
            .unwrap_or(&[])
    }
}

/// A cash-out request and its review state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    #[serde(default)]
    pub amount: f64,
    /// "cash" or "bank_transfer"
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_holder: Option<String>,
    /// "pending", "approved", "completed", or "rejected"
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub processed_by: Option<String>,
    #[serde(default)]
    pub processed_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// GET `/api/nasabah/withdrawal` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub withdrawals: Option<Vec<Withdrawal>>,
    #[serde(default)]
    pub data: Option<Vec<Withdrawal>>,
}

impl WithdrawalsResponse {
    /// The withdrawal list, whichever key carried it
    pub fn entries(&self) -> &[Withdrawal] {
        self.withdrawals
            .as_deref()
            .or(self.data.as_deref())
            .unwrap_or(&[])
    }
}

/// Fields accepted by POST `/api/nasabah/withdrawal`; bank fields ride
/// along only for transfers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalInput {
    pub amount: f64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ==================== Education Content ====================

/// Published article teaser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub judul: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub konten_preview: String,
    #[serde(default)]
    pub gambar: Option<String>,
    #[serde(default)]
    pub kategori: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// GET `/api/artikel` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Option<Vec<Article>>,
    #[serde(default)]
    pub data: Option<Vec<Article>>,
}

impl ArticlesResponse {
    /// The article list, whichever key carried it
    pub fn entries(&self) -> &[Article] {
        self.articles
            .as_deref()
            .or(self.data.as_deref())
            .unwrap_or(&[])
    }
}

/// GET `/api/artikel/{slug}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub article: Option<Article>,
    #[serde(default)]
    pub data: Option<Article>,
}

impl ArticleResponse {
    /// The article, whichever key carried it
    pub fn entry(&self) -> Option<&Article> {
        self.article.as_ref().or(self.data.as_ref())
    }
}

/// Uploader credit on a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoCreator {
    #[serde(default)]
    pub nama_lengkap: String,
}

/// Circular-economy video entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: i64,
    pub judul: String,
    #[serde(default)]
    pub deskripsi: Option<String>,
    /// Currently always "youtube"
    #[serde(default)]
    pub tipe_video: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub kategori: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display duration, e.g. "12:30"
    #[serde(default)]
    pub durasi: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub creator: Option<VideoCreator>,
    #[serde(default)]
    pub popular: Option<bool>,
}

/// GET `/api/ekonomi-sirkular/{id}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub video: Option<VideoItem>,
    #[serde(default)]
    pub data: Option<VideoItem>,
}

impl VideoResponse {
    /// The video, whichever key carried it
    pub fn entry(&self) -> Option<&VideoItem> {
        self.video.as_ref().or(self.data.as_ref())
    }
}

/// GET `/api/ekonomi-sirkular` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub videos: Option<Vec<VideoItem>>,
    #[serde(default)]
    pub data: Option<Vec<VideoItem>>,
}

impl VideosResponse {
    /// The video list, whichever key carried it
    pub fn entries(&self) -> &[VideoItem] {
        self.videos
            .as_deref()
            .or(self.data.as_deref())
            .unwrap_or(&[])
    }
}

/// Query options for the savings history
#[derive(Debug, Clone, Default)]
pub struct SavingsOptions {
    /// Named period filter, e.g. "bulan-ini"
    pub periode: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub date: Option<String>,
}

/// Query options for the balance mutation list
#[derive(Debug, Clone, Default)]
pub struct MutationOptions {
    pub month: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Query options for the article list
#[derive(Debug, Clone, Default)]
pub struct ArticleOptions {
    pub kategori: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Query options for the video list
#[derive(Debug, Clone, Default)]
pub struct VideoOptions {
    pub kategori: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
