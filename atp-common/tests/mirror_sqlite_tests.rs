//! End-to-end dual-write against a file-backed document store

use atp_common::config::MirrorSettings;
use atp_common::db::{init_memory_database, Trip, TripDetails, TripType, User};
use atp_common::mirror::document::{TRIPS_COLLECTION, USERS_COLLECTION};
use atp_common::mirror::{DocumentKey, Mirror, MirrorOutcome};
use atp_common::Store;
use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

fn settings(dir: &TempDir) -> MirrorSettings {
    MirrorSettings {
        uri: format!("sqlite://{}?mode=rwc", dir.path().join("mirror.db").display()),
        database: "Trip_Planner_AI".to_string(),
    }
}

#[tokio::test]
async fn test_setup_then_dual_write() {
    let dir = TempDir::new().unwrap();
    let mirror = Mirror::connect_strict(&settings(&dir)).await.unwrap();

    let created = mirror.setup_collections().await.unwrap();
    assert_eq!(
        created,
        vec!["auth_user", "trips_trip", "trips_rating", "trips_profile"]
    );
    // Idempotent
    mirror.setup_collections().await.unwrap();

    let store = Store::new(init_memory_database().await.unwrap(), mirror);

    let mut user = User::new("traveller@example.com");
    assert_eq!(store.save_user(&mut user).await.unwrap(), MirrorOutcome::Inserted);
    let user_id = user.id.unwrap();

    let mut trip = Trip::new(
        user_id,
        TripDetails {
            start_location: "Lisbon".to_string(),
            destination: "Porto".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(),
            interested_activities: "food, wine".to_string(),
            trip_type: TripType::Friends,
            number_of_people: 3,
        },
    );
    assert_eq!(store.save_trip(&mut trip).await.unwrap(), MirrorOutcome::Inserted);

    trip.trip_plan = Some(json!({"day_1": {"morning": "Ribeira walk"}}));
    assert_eq!(store.save_trip(&mut trip).await.unwrap(), MirrorOutcome::Updated);

    let key = DocumentKey::new().field("id", trip.id.unwrap().to_string());
    let doc = store
        .mirror()
        .find_one(TRIPS_COLLECTION, &key)
        .await
        .unwrap()
        .expect("trip mirrored");
    assert_eq!(doc["start_date"], json!("2025-11-26"));
    assert_eq!(doc["end_date"], json!("2025-11-28"));
    assert_eq!(doc["trip_plan"]["day_1"]["morning"], json!("Ribeira walk"));

    let user_key = DocumentKey::new().field("email", "traveller@example.com");
    let user_doc = store
        .mirror()
        .find_one(USERS_COLLECTION, &user_key)
        .await
        .unwrap()
        .expect("user mirrored");
    assert_eq!(user_doc["id"], json!(user_id.to_string()));

    store.close().await;
}

#[tokio::test]
async fn test_connect_rejects_bad_database_name() {
    let dir = TempDir::new().unwrap();
    let mut bad = settings(&dir);
    bad.database = "Trip Planner; DROP".to_string();

    assert!(Mirror::connect_strict(&bad).await.is_err());
    assert!(!Mirror::connect(Some(&bad)).await.is_enabled());
}

#[tokio::test]
async fn test_unreachable_store_disables_mirror() {
    let unreachable = MirrorSettings {
        uri: "sqlite:///nonexistent-dir/atp/mirror.db".to_string(),
        database: "Trip_Planner_AI".to_string(),
    };
    let mirror = Mirror::connect(Some(&unreachable)).await;
    assert!(!mirror.is_enabled());
    assert!(mirror.setup_collections().await.is_err());
}
