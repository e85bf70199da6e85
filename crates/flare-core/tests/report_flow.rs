//! End-to-end report flows over on-disk storage.

use flare_core::access::Passcode;
use flare_core::config::REPORTS_STORAGE_KEY;
use flare_core::error::{AuthorizationError, LookupError, SessionError};
use flare_core::form::ReportInput;
use flare_core::geocoding::{Geocoder, ReverseGeocode, Suggestion};
use flare_core::storage::{NativeStorage, StorageBackend};
use flare_core::{AccessGate, BoundingBox, Geocode, ReportStatus, ReportSession, ReportStore};
use tempfile::TempDir;

/// Geocoder for a machine without network access.
struct Offline;

#[async_trait::async_trait(?Send)]
impl Geocoder for Offline {
    async fn reverse(&self, _point: Geocode) -> Result<ReverseGeocode, LookupError> {
        Err(LookupError::RequestFailed("offline".to_string()))
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Suggestion>, LookupError> {
        Err(LookupError::RequestFailed("offline".to_string()))
    }
}

const PASSCODE: &str = "MuMeLeLe";

fn input(lat: f64, lng: f64) -> ReportInput {
    ReportInput {
        reporter_name: "A".to_string(),
        reporter_phone: "6041234567".to_string(),
        emergency_type: "Fire".to_string(),
        address: "X".to_string(),
        geocode: Some(Geocode { lat, lng }),
        ..Default::default()
    }
}

async fn open_session(dir: &TempDir) -> ReportSession<NativeStorage, Offline> {
    let storage = NativeStorage::with_path(dir.path().to_path_buf()).unwrap();
    let store = ReportStore::open(storage).await;
    let gate = AccessGate::from_secret(Passcode::new(PASSCODE.to_string()));
    let mut session = ReportSession::new(store, Offline).with_access_gate(gate);
    session.set_bounds(BoundingBox::new(49.0, -123.0, 49.5, -122.5).unwrap());
    session
}

#[tokio::test]
async fn test_reports_survive_restart() {
    let dir = TempDir::new().unwrap();

    {
        let mut session = open_session(&dir).await;
        let first = session.submit(input(49.25, -122.9)).await.unwrap();
        let second = session.submit(input(50.0, -122.9)).await.unwrap();

        assert_eq!(first.id.as_u64(), 1);
        assert_eq!(second.id.as_u64(), 2);
        assert_eq!(first.status, ReportStatus::Open);
    }

    let session = open_session(&dir).await;
    assert_eq!(session.reports().len(), 2);
    assert_eq!(session.store().next_id().unwrap().as_u64(), 3);

    let visible: Vec<u64> = session
        .visible_reports()
        .iter()
        .map(|r| r.id.as_u64())
        .collect();
    assert_eq!(visible, vec![1]);
}

#[tokio::test]
async fn test_resolve_then_delete_lifecycle() {
    let dir = TempDir::new().unwrap();
    let mut session = open_session(&dir).await;
    let report = session.submit(input(49.25, -122.9)).await.unwrap();

    assert!(matches!(
        session.resolve(report.id, "wrong").await,
        Err(SessionError::Authorization(AuthorizationError::Rejected))
    ));

    let resolved = session.resolve(report.id, PASSCODE).await.unwrap();
    let again = session.resolve(report.id, PASSCODE).await.unwrap();
    assert_eq!(resolved.status, ReportStatus::Resolved);
    assert_eq!(again, resolved);

    session.delete(report.id, PASSCODE).await.unwrap();
    assert_eq!(session.focused_id(), None);

    let next = session.submit(input(49.25, -122.9)).await.unwrap();
    assert_eq!(next.id.as_u64(), 2);
}

#[tokio::test]
async fn test_load_then_save_leaves_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let storage = NativeStorage::with_path(dir.path().to_path_buf()).unwrap();
    {
        let mut session = open_session(&dir).await;
        session.submit(input(49.25, -122.9)).await.unwrap();
        session.submit(input(49.2625, -122.5)).await.unwrap();
    }
    let before = storage.load(REPORTS_STORAGE_KEY).await.unwrap();

    let mut store =
        ReportStore::open(NativeStorage::with_path(dir.path().to_path_buf()).unwrap()).await;
    let loaded = store.load().await;
    store.save(&loaded).await.unwrap();

    assert_eq!(storage.load(REPORTS_STORAGE_KEY).await.unwrap(), before);
}

#[tokio::test]
async fn test_corrupt_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let storage = NativeStorage::with_path(dir.path().to_path_buf()).unwrap();
    storage
        .save(REPORTS_STORAGE_KEY, b"[{\"id\": 1, \"truncated")
        .await
        .unwrap();

    let mut session = open_session(&dir).await;
    assert!(session.reports().is_empty());

    let report = session.submit(input(49.25, -122.9)).await.unwrap();
    assert_eq!(report.id.as_u64(), 1);
}

#[tokio::test]
async fn test_offline_click_still_opens_form() {
    let dir = TempDir::new().unwrap();
    let mut session = open_session(&dir).await;

    let pending = session
        .handle_map_click(Geocode { lat: 49.2, lng: -122.9 })
        .await
        .unwrap();
    assert_eq!(pending.input.address, "");
    assert!(matches!(pending.lookup_error, Some(LookupError::RequestFailed(_))));

    assert!(session.suggest_addresses("royal ave").await.is_err());
}

#[tokio::test]
async fn test_offline_address_only_report_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut session = open_session(&dir).await;
    let address_only = ReportInput {
        geocode: None,
        ..input(0.0, 0.0)
    };

    let result = session.submit(address_only).await;
    assert!(matches!(result, Err(SessionError::Lookup(_))));
    drop(session);

    let reopened = open_session(&dir).await;
    assert!(reopened.reports().is_empty());
}
