//! Facade integration tests
//!
//! Exercises `BangsamsirClient` end to end against a mock backend: the
//! cached badge poll and its invalidation on every notification
//! mutation, profile updates merging into the session, and the typed
//! read endpoints with their query strings and alternate payload keys.

use bangsamsir_client::{
    ApiError, ArticleOptions, BangsamsirClient, ClientConfig, GuardOutcome, MemoryTokenStore,
    MutationOptions, NotificationOptions, SavingsOptions, UpdateProfileInput, VideoOptions,
    WithdrawalInput,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BangsamsirClient {
    BangsamsirClient::new(
        ClientConfig {
            base_url: server.uri(),
            ..Default::default()
        },
        Arc::new(MemoryTokenStore::new()),
    )
}

fn unread_body(count: i64) -> serde_json::Value {
    json!({
        "success": true,
        "notifications": [],
        "stats": {
            "totalNotifications": 10,
            "unreadCount": count,
            "todayCount": 1,
            "priorityCount": { "urgent": 0, "high": 1, "normal": count - 1, "low": 0 }
        }
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-1",
            "user": {
                "id": 1,
                "username": "budi",
                "nama_lengkap": "Budi Santoso",
                "foto_profil": "/uploads/profiles/old.jpg",
                "saldo": 20000
            }
        })))
        .mount(server)
        .await;
}

// =============================================================================
// Badge Poll & Invalidation
// =============================================================================

#[tokio::test]
async fn test_unread_count_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifikasi"))
        .and(query_param("limit", "1"))
        .and(query_param("unreadOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unread_body(4)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.unread_count().await.unwrap(), Some(4));
    // Second poll inside the TTL never reaches the server
    assert_eq!(client.unread_count().await.unwrap(), Some(4));

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);

    server.verify().await;
}

#[tokio::test]
async fn test_marking_read_refreshes_the_badge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifikasi"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unread_body(4)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifikasi"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unread_body(3)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/notifikasi/7/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.unread_count().await.unwrap(), Some(4));

    client.mark_notification_read(7).await.unwrap();
    assert_eq!(client.cache_stats().invalidations, 1);

    // The invalidated key refetches and sees the new count
    assert_eq!(client.unread_count().await.unwrap(), Some(3));

    server.verify().await;
}

#[tokio::test]
async fn test_notification_mutations_hit_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notifikasi/all/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/notifikasi/3/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    // onlyRead-specific mock first so the plain delete falls through to
    // the catch-all below
    Mock::given(method("DELETE"))
        .and(path("/api/notifikasi/all/read"))
        .and(query_param("onlyRead", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/notifikasi/all/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.mark_all_notifications_read().await.unwrap();
    client.delete_notification(3).await.unwrap();
    client.delete_read_notifications().await.unwrap();
    client.clear_notifications().await.unwrap();

    server.verify().await;
}

#[tokio::test]
async fn test_rejected_mutation_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notifikasi/all/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Gagal menandai notifikasi"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.mark_all_notifications_read().await.unwrap_err();
    assert!(
        matches!(&err, ApiError::Unknown(m) if m == "Gagal menandai notifikasi"),
        "got: {:?}",
        err
    );
    assert_eq!(client.cache_stats().invalidations, 0);
}

#[tokio::test]
async fn test_notifications_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifikasi"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "notifications": [{
                "id": 7,
                "judul": "Setoran diterima",
                "pesan": "Tabunganmu bertambah Rp15.000",
                "dibaca": 0,
                "created_at": "2024-05-17T09:00:00Z"
            }],
            "stats": { "unreadCount": 1 }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .notifications(&NotificationOptions {
            limit: Some(5),
            unread_only: false,
        })
        .await
        .unwrap();

    assert_eq!(response.notifications.len(), 1);
    assert_eq!(response.notifications[0].judul, "Setoran diterima");
    assert_eq!(response.stats.unwrap().unread_count, 1);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_profile_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": { "id": 1, "username": "budi", "nama_lengkap": "Budi Santoso" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let user = client.profile().await.unwrap();
    assert_eq!(user.username, "budi");
}

#[tokio::test]
async fn test_profile_envelope_failure_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Akses ditolak"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.profile().await.unwrap_err();
    assert!(
        matches!(&err, ApiError::Unknown(m) if m == "Akses ditolak"),
        "got: {:?}",
        err
    );
}

#[tokio::test]
async fn test_update_profile_merges_into_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/profile"))
        .and(body_partial_json(json!({ "nama_lengkap": "Budi Baru" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": {
                "id": 1,
                "username": "budi",
                "nama_lengkap": "Budi Baru",
                "foto_profil": "/uploads/profiles/old.jpg",
                "saldo": 20000
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("budi", "secret").await.unwrap();

    let input = UpdateProfileInput {
        nama_lengkap: "Budi Baru".to_string(),
        pegawai: 0,
        ..Default::default()
    };
    let updated = client.update_profile(&input).await.unwrap().unwrap();
    assert_eq!(updated.nama_lengkap, "Budi Baru");
    assert_eq!(
        client.current_user().await.unwrap().nama_lengkap,
        "Budi Baru"
    );
}

#[tokio::test]
async fn test_delete_profile_photo_clears_session_photo() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/profile/photo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Foto profil dihapus"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("budi", "secret").await.unwrap();
    assert!(client.current_user().await.unwrap().foto_profil.is_some());

    client.delete_profile_photo().await.unwrap();
    assert_eq!(client.current_user().await.unwrap().foto_profil, None);
}

#[tokio::test]
async fn test_upload_merges_photo_into_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": {
                "id": 1,
                "username": "budi",
                "nama_lengkap": "Budi Santoso",
                "foto_profil": "/uploads/profiles/old.jpg"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/profile/photo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "photo_url": "/uploads/profiles/new.jpg"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("budi", "secret").await.unwrap();

    let outcome = client
        .upload_profile_photo(bangsamsir_client::UploadRequest {
            data: b"JPEGDATA".to_vec(),
            file_name: Some("selfie.jpg".to_string()),
            declared_mime: Some("image/jpeg".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(outcome.strategy, "multipart");
    assert_eq!(
        client.current_user().await.unwrap().foto_profil.as_deref(),
        Some("/uploads/profiles/new.jpg")
    );
}

// =============================================================================
// Savings, Balance & Withdrawals
// =============================================================================

#[tokio::test]
async fn test_waste_types() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/waste-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "wasteTypes": [
                { "id": 1, "nama_jenis": "Plastik", "harga_per_kg": 6000, "urutan": 1 },
                { "id": 2, "nama_jenis": "Kertas", "harga_per_kg": 2000, "urutan": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let types = client.waste_types().await.unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].nama_jenis, "Plastik");
}

#[tokio::test]
async fn test_savings_history_builds_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nasabah/riwayat"))
        .and(query_param("month", "05"))
        .and(query_param("year", "2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "riwayat": [{
                "id": 3,
                "tanggal": "2024-05-17",
                "total_nilai": 15000,
                "total_berat": 2.5,
                "jenis_sampah": "Plastik",
                "poin_earned": 15,
                "created_at": "2024-05-17T09:00:00Z",
                "details": []
            }],
            "stats": { "totalTransaksi": 1, "totalBerat": 2.5, "totalNilai": 15000, "totalPoin": 15 },
            "jenis_sampah": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = SavingsOptions {
        month: Some("05".to_string()),
        year: Some("2024".to_string()),
        ..Default::default()
    };
    let response = client.savings_history(&options).await.unwrap();
    assert_eq!(response.riwayat.len(), 1);
    assert_eq!(response.stats.unwrap().total_poin, 15);

    server.verify().await;
}

#[tokio::test]
async fn test_balance_mutations_under_data_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nasabah/mutasi-saldo"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": 11,
                "jenis": "masuk",
                "jumlah": 15000,
                "saldo_awal": 5000,
                "saldo_akhir": 20000,
                "created_at": "2024-05-17T09:05:00Z"
            }],
            "stats": { "totalMasuk": 15000, "totalKeluar": 0, "transaksiMasuk": 1, "transaksiKeluar": 0 }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = MutationOptions {
        limit: Some(20),
        ..Default::default()
    };
    let response = client.balance_mutations(&options).await.unwrap();
    assert_eq!(response.entries().len(), 1);
    assert_eq!(response.entries()[0].saldo_akhir, 20000.0);
    assert_eq!(response.stats.unwrap().total_masuk, 15000.0);
}

#[tokio::test]
async fn test_withdrawals_and_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/nasabah/withdrawal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": 5,
                "amount": 50000,
                "method": "cash",
                "status": "pending",
                "created_at": "2024-05-18T10:00:00Z"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/nasabah/withdrawal"))
        .and(body_partial_json(json!({ "amount": 50000.0, "method": "cash" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let listed = client.withdrawals().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, "pending");

    let input = WithdrawalInput {
        amount: 50000.0,
        method: "cash".to_string(),
        bank_account: None,
        bank_name: None,
        account_holder: None,
        notes: None,
    };
    client.request_withdrawal(&input).await.unwrap();

    server.verify().await;
}

#[tokio::test]
async fn test_withdrawal_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/nasabah/withdrawal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Saldo tidak cukup"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let input = WithdrawalInput {
        amount: 900000.0,
        method: "cash".to_string(),
        bank_account: None,
        bank_name: None,
        account_holder: None,
        notes: None,
    };
    let err = client.request_withdrawal(&input).await.unwrap_err();
    assert!(
        matches!(&err, ApiError::Unknown(m) if m == "Saldo tidak cukup"),
        "got: {:?}",
        err
    );
}

// =============================================================================
// Education Content
// =============================================================================

#[tokio::test]
async fn test_articles_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/artikel"))
        .and(query_param("kategori", "daur-ulang"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": 1,
                "judul": "Memilah Sampah",
                "slug": "memilah-sampah",
                "konten_preview": "Mulai dari rumah",
                "kategori": "daur-ulang",
                "tags": ["rumah"],
                "created_at": "2024-05-01T00:00:00Z"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/artikel/memilah-sampah"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "article": {
                "id": 1,
                "judul": "Memilah Sampah",
                "slug": "memilah-sampah",
                "konten_preview": "Mulai dari rumah",
                "kategori": "daur-ulang",
                "created_at": "2024-05-01T00:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let options = ArticleOptions {
        kategori: Some("daur-ulang".to_string()),
        ..Default::default()
    };
    let articles = client.articles(&options).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].slug, "memilah-sampah");

    let article = client.article_by_slug("memilah-sampah").await.unwrap();
    assert_eq!(article.judul, "Memilah Sampah");
}

#[tokio::test]
async fn test_videos_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ekonomi-sirkular"))
        .and(query_param("sortBy", "populer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "videos": [{
                "id": 9,
                "judul": "Kompos rumah tangga",
                "tipe_video": "youtube",
                "video_url": "https://youtu.be/x",
                "views": 120
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/ekonomi-sirkular/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "video": {
                "id": 9,
                "judul": "Kompos rumah tangga",
                "tipe_video": "youtube",
                "video_url": "https://youtu.be/x",
                "views": 121,
                "creator": { "nama_lengkap": "Bu Ani" }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let options = VideoOptions {
        sort_by: Some("populer".to_string()),
        ..Default::default()
    };
    let videos = client.videos(&options).await.unwrap();
    assert_eq!(videos.len(), 1);

    let video = client.video_by_id(9).await.unwrap();
    assert_eq!(video.views, 121);
    assert_eq!(video.creator.unwrap().nama_lengkap, "Bu Ani");
}

// =============================================================================
// Health, Caching & Logout
// =============================================================================

#[tokio::test]
async fn test_health_reports_reachable_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.health().await);
}

#[tokio::test]
async fn test_health_degrades_to_false() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(!client.health().await);
}

#[tokio::test]
async fn test_guarded_passthrough_for_custom_reads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/waste-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "wasteTypes": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ttl = Duration::from_secs(60);

    let executor = Arc::clone(client.executor());
    let first = client
        .guarded("waste-types", ttl, move || async move {
            executor.get("/api/waste-types").await
        })
        .await
        .unwrap();
    assert!(matches!(first, GuardOutcome::Fetched(_)));

    let executor = Arc::clone(client.executor());
    let second = client
        .guarded("waste-types", ttl, move || async move {
            executor.get("/api/waste-types").await
        })
        .await
        .unwrap();
    assert!(matches!(second, GuardOutcome::Cached(_)));

    server.verify().await;
}

#[tokio::test]
async fn test_logout_drops_cached_reads() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifikasi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unread_body(2)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login("budi", "secret").await.unwrap();
    client.unread_count().await.unwrap();
    assert_eq!(client.cache_stats().entries, 1);

    client.logout().await;
    assert!(!client.is_authenticated().await);
    // Nothing cached survives the session
    assert_eq!(client.cache_stats().entries, 0);
}
