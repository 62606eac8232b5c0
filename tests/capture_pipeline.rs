mod common;

use bigdecimal::BigDecimal;
use chrono::{TimeZone, Utc};
use common::{MemoryStore, SAMPLE_RECEIPT};
use receipt_rewards::config::CaptureSettings;
use receipt_rewards::models::{ManualReceipt, PointsSource};
use receipt_rewards::service::{CaptureInput, CaptureService, PlainTextRecognizer};
use receipt_rewards::AppError;
use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

fn service(store: Arc<MemoryStore>, settings: CaptureSettings) -> CaptureService {
    CaptureService::new(store, Arc::new(PlainTextRecognizer), settings)
}

fn image() -> CaptureInput {
    CaptureInput::Image(SAMPLE_RECEIPT.as_bytes().to_vec())
}

#[tokio::test]
async fn capture_saves_receipt_and_awards_points() {
    let store = Arc::new(MemoryStore::default());
    let service = service(store.clone(), CaptureSettings::default());
    let user = Uuid::new_v4();

    let outcome = service
        .capture(user, Uuid::new_v4(), image(), Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome.receipt.store_name, "FRESH MART");
    assert_eq!(outcome.receipt.total_amount, BigDecimal::from_str("50.00").unwrap());
    assert_eq!(outcome.receipt.status, "approved");
    assert_eq!(outcome.transaction.points, 500);
    assert_eq!(outcome.transaction.source, PointsSource::ReceiptScan);
    assert_eq!(outcome.transaction.receipt_id, Some(outcome.receipt.id));
    assert_eq!(outcome.items.len(), 3);
    assert!(!outcome.duplicate_warning);

    let summary = service.points_summary(user).await.unwrap();
    assert_eq!(summary.balance, 500);
    assert_eq!(summary.transactions.len(), 1);
}

#[tokio::test]
async fn second_identical_capture_is_flagged_but_saved() {
    let store = Arc::new(MemoryStore::default());
    let service = service(store.clone(), CaptureSettings::default());
    let (user, session) = (Uuid::new_v4(), Uuid::new_v4());

    service.capture(user, session, image(), Utc::now()).await.unwrap();
    let second = service.capture(user, session, image(), Utc::now()).await.unwrap();

    assert!(second.duplicate_warning);
    assert!(second.duplicate_score >= 0.8);
    assert_eq!(second.receipt.status, "flagged");
    assert_eq!(store.receipt_count(), 2);
    assert_eq!(store.transaction_count(), 2);
}

#[tokio::test]
async fn histories_are_per_session() {
    let store = Arc::new(MemoryStore::default());
    let service = service(store, CaptureSettings::default());
    let user = Uuid::new_v4();

    service.capture(user, Uuid::new_v4(), image(), Utc::now()).await.unwrap();
    let other = service.capture(user, Uuid::new_v4(), image(), Utc::now()).await.unwrap();
    assert!(!other.duplicate_warning);
}

#[tokio::test]
async fn new_session_is_seeded_from_saved_receipts() {
    let store = Arc::new(MemoryStore::default());
    let service = service(store, CaptureSettings::default());
    let user = Uuid::new_v4();

    service.capture(user, Uuid::new_v4(), image(), Utc::now()).await.unwrap();

    let session = Uuid::new_v4();
    assert_eq!(service.start_session(user, session).await.unwrap(), 1);
    let again = service.capture(user, session, image(), Utc::now()).await.unwrap();
    assert!(again.duplicate_warning);
}

#[tokio::test]
async fn fraud_detection_off_skips_duplicate_check() {
    let store = Arc::new(MemoryStore::default());
    let settings = CaptureSettings {
        fraud_detection_enabled: false,
        ..CaptureSettings::default()
    };
    let service = service(store, settings);
    let (user, session) = (Uuid::new_v4(), Uuid::new_v4());

    service.capture(user, session, image(), Utc::now()).await.unwrap();
    let second = service.capture(user, session, image(), Utc::now()).await.unwrap();
    assert!(!second.duplicate_warning);
    assert_eq!(second.duplicate_score, 0.0);
}

#[tokio::test]
async fn failed_save_awards_no_points() {
    let store = Arc::new(MemoryStore::default());
    store.fail_receipts.store(true, Ordering::SeqCst);
    let service = service(store.clone(), CaptureSettings::default());

    let err = service
        .capture(Uuid::new_v4(), Uuid::new_v4(), image(), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test]
async fn unreadable_receipt_is_a_retryable_extraction_error() {
    let store = Arc::new(MemoryStore::default());
    let service = service(store.clone(), CaptureSettings::default());
    let (user, session) = (Uuid::new_v4(), Uuid::new_v4());

    let err = service
        .capture(user, session, CaptureInput::Image(b"smudged".to_vec()), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Extraction(_)));
    assert_eq!(store.receipt_count(), 0);

    // retry straight away with a readable photo
    assert!(service.capture(user, session, image(), Utc::now()).await.is_ok());
}

#[tokio::test]
async fn ocr_disabled_requires_manual_entry() {
    let store = Arc::new(MemoryStore::default());
    let settings = CaptureSettings {
        ocr_enabled: false,
        ..CaptureSettings::default()
    };
    let service = service(store, settings);
    let user = Uuid::new_v4();

    let err = service
        .capture(user, Uuid::new_v4(), image(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let manual = ManualReceipt {
        store: "Corner Shop".to_string(),
        total: BigDecimal::from_str("12.75").unwrap(),
        items: vec![],
        timestamp: Some(Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap()),
    };
    let outcome = service
        .capture(user, Uuid::new_v4(), CaptureInput::Manual(manual), Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome.transaction.points, 127);
}

#[tokio::test]
async fn failed_points_insert_keeps_no_receipt_and_retry_is_clean() {
    let store = Arc::new(MemoryStore::default());
    store.fail_points.store(true, Ordering::SeqCst);
    let service = service(store.clone(), CaptureSettings::default());
    let (user, session) = (Uuid::new_v4(), Uuid::new_v4());

    for _ in 0..2 {
        let err = service
            .capture(user, session, image(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
    assert_eq!(store.receipt_count(), 0);
    assert_eq!(store.transaction_count(), 0);

    store.fail_points.store(false, Ordering::SeqCst);
    let outcome = service.capture(user, session, image(), Utc::now()).await.unwrap();
    assert!(!outcome.duplicate_warning);
    assert_eq!(outcome.receipt.points_earned, 500);
    assert_eq!(store.receipt_count(), 1);
    assert_eq!(store.transaction_count(), 1);
}

#[tokio::test]
async fn offline_record_submitted_twice_is_saved_once() {
    let store = Arc::new(MemoryStore::default());
    let service = service(store.clone(), CaptureSettings::default());
    let (user, session, record) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let first = service
        .capture_offline(user, session, record, image(), Utc::now())
        .await
        .unwrap();
    let again = service
        .capture_offline(user, session, record, image(), Utc::now())
        .await
        .unwrap();

    assert!(!first.replayed);
    assert!(again.replayed);
    assert_eq!(again.receipt.id, first.receipt.id);
    assert_eq!(again.transaction.id, first.transaction.id);
    assert!(!again.duplicate_warning);
    assert_eq!(store.receipt_count(), 1);
    assert_eq!(service.points_summary(user).await.unwrap().balance, 500);
}

#[tokio::test]
async fn idle_capture_sessions_are_forgotten() {
    let store = Arc::new(MemoryStore::default());
    let service = service(store, CaptureSettings::default());
    let (user, session) = (Uuid::new_v4(), Uuid::new_v4());
    service.capture(user, session, image(), Utc::now()).await.unwrap();
    assert_eq!(service.active_sessions(), 1);

    let idle = Duration::from_secs(60);
    assert_eq!(service.prune_idle_sessions(Instant::now() + Duration::from_secs(61), idle), 1);
    assert_eq!(service.active_sessions(), 0);

    // a forgotten session starts with an empty history
    let again = service.capture(user, session, image(), Utc::now()).await.unwrap();
    assert!(!again.duplicate_warning);
}
