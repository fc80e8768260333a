//! Dual-write behaviour of `Store`
//!
//! Primary writes must succeed whatever the mirror does; mirrored documents
//! must carry ISO-8601 dates, string foreign keys and explicit nulls.

use atp_common::db::init::init_memory_database;
use atp_common::db::models::{Profile, Rating, Trip, TripDetails, TripType, User};
use atp_common::db::{profiles, trips, users};
use atp_common::mirror::document::{
    PROFILES_COLLECTION, RATINGS_COLLECTION, TRIPS_COLLECTION, USERS_COLLECTION,
};
use atp_common::mirror::{DocumentKey, MemoryDocumentStore, Mirror, MirrorOutcome};
use atp_common::{Error, Store};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;

async fn store_with_memory_mirror() -> (Store, Arc<MemoryDocumentStore>) {
    let pool = init_memory_database().await.unwrap();
    let docs = Arc::new(MemoryDocumentStore::new());
    (Store::new(pool, Mirror::new(docs.clone())), docs)
}

fn details() -> TripDetails {
    TripDetails {
        start_location: "Test Location".to_string(),
        destination: "Test Destination".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap(),
        interested_activities: "hiking".to_string(),
        trip_type: TripType::Couple,
        number_of_people: 2,
    }
}

async fn saved_user(store: &Store, email: &str) -> User {
    let mut user = User::new(email);
    store.save_user(&mut user).await.unwrap();
    user
}

#[tokio::test]
async fn test_trip_start_date_mirrored_as_iso_string() {
    let (store, docs) = store_with_memory_mirror().await;
    let user = saved_user(&store, "traveller@example.com").await;

    let mut trip = Trip::new(user.id.unwrap(), details());
    let outcome = store.save_trip(&mut trip).await.unwrap();
    assert_eq!(outcome, MirrorOutcome::Inserted);

    let mirrored = docs.documents(TRIPS_COLLECTION).await;
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0]["start_date"], json!("2025-11-26"));
    assert_eq!(mirrored[0]["end_date"], json!("2025-11-30"));
    assert_eq!(mirrored[0]["user_id"], json!(user.id.unwrap().to_string()));
    assert_eq!(mirrored[0].get("posted_at"), Some(&Value::Null));
}

#[tokio::test]
async fn test_primary_write_survives_mirror_outage() {
    let (store, docs) = store_with_memory_mirror().await;
    docs.set_unavailable(true);

    let mut user = User::new("outage@example.com");
    let outcome = store.save_user(&mut user).await.unwrap();
    assert!(matches!(outcome, MirrorOutcome::Failed(_)));

    let mut trip = Trip::new(user.id.unwrap(), details());
    let outcome = store.save_trip(&mut trip).await.unwrap();
    assert!(matches!(outcome, MirrorOutcome::Failed(_)));

    // Primary rows are present
    assert!(users::get_user(store.pool(), user.id.unwrap())
        .await
        .unwrap()
        .is_some());
    assert!(trips::get_trip(store.pool(), trip.id.unwrap())
        .await
        .unwrap()
        .is_some());
    assert!(profiles::get_profile_by_user(store.pool(), user.id.unwrap())
        .await
        .unwrap()
        .is_some());

    // Drift: nothing reached the mirror, and nothing will be replayed later
    docs.set_unavailable(false);
    assert!(docs.documents(USERS_COLLECTION).await.is_empty());
    assert!(docs.documents(TRIPS_COLLECTION).await.is_empty());
}

#[tokio::test]
async fn test_primary_failure_propagates_and_skips_mirror() {
    let (store, docs) = store_with_memory_mirror().await;

    // No such user: the foreign key rejects the primary insert
    let mut trip = Trip::new(12345, details());
    let result = store.save_trip(&mut trip).await;

    assert!(matches!(result, Err(Error::Database(_))));
    assert!(trip.id.is_none());
    assert!(docs.documents(TRIPS_COLLECTION).await.is_empty());
}

#[tokio::test]
async fn test_disabled_mirror_leaves_primary_unaffected() {
    let pool = init_memory_database().await.unwrap();
    let store = Store::new(pool, Mirror::disabled());

    let mut user = User::new("solo@example.com");
    let outcome = store.save_user(&mut user).await.unwrap();
    assert_eq!(outcome, MirrorOutcome::Disabled);
    assert!(store.find_user_by_email("solo@example.com").await.unwrap().is_some());
}

#[tokio::test]
async fn test_user_save_creates_and_mirrors_profile() {
    let (store, docs) = store_with_memory_mirror().await;
    let user = saved_user(&store, "new@example.com").await;
    let user_id = user.id.unwrap();

    let profile = store.profile(user_id).await.unwrap().unwrap();
    assert_eq!(profile.user_id, user_id);

    let mirrored = docs
        .documents(PROFILES_COLLECTION)
        .await
        .into_iter()
        .find(|d| d["user_id"] == json!(user_id.to_string()))
        .unwrap();
    assert_eq!(mirrored.get("birth_date"), Some(&Value::Null));
}

#[tokio::test]
async fn test_resaving_user_updates_mirror_documents() {
    let (store, docs) = store_with_memory_mirror().await;
    let mut user = saved_user(&store, "again@example.com").await;

    user.first_name = "Updated".to_string();
    let outcome = store.save_user(&mut user).await.unwrap();
    assert_eq!(outcome, MirrorOutcome::Updated);

    let users_docs = docs.documents(USERS_COLLECTION).await;
    assert_eq!(users_docs.len(), 1);
    assert_eq!(users_docs[0]["first_name"], json!("Updated"));

    // Still one profile, mirrored once and updated thereafter
    assert_eq!(docs.documents(PROFILES_COLLECTION).await.len(), 1);
}

#[tokio::test]
async fn test_empty_email_is_rejected() {
    let (store, _) = store_with_memory_mirror().await;
    let mut user = User::new("   ");
    let result = store.save_user(&mut user).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_post_and_save_flags() {
    let (store, docs) = store_with_memory_mirror().await;
    let user = saved_user(&store, "poster@example.com").await;
    let user_id = user.id.unwrap();
    let mut trip = Trip::new(user_id, details());
    store.save_trip(&mut trip).await.unwrap();
    let trip_id = trip.id.unwrap();

    let saved = store.mark_trip_saved(trip_id, user_id).await.unwrap();
    assert!(saved.is_saved);
    assert!(matches!(
        store.mark_trip_saved(trip_id, user_id).await,
        Err(Error::Conflict(_))
    ));

    let posted = store.post_trip(trip_id, user_id).await.unwrap();
    assert!(posted.is_posted);
    assert!(posted.posted_at.is_some());
    assert!(matches!(
        store.post_trip(trip_id, user_id).await,
        Err(Error::Conflict(_))
    ));

    let doc = docs
        .documents(TRIPS_COLLECTION)
        .await
        .into_iter()
        .next()
        .unwrap();
    assert_eq!(doc["is_posted"], json!(true));
    assert!(doc["posted_at"].is_string());

    let (saved_list, posted_list) = store.dashboard(user_id).await.unwrap();
    assert_eq!(saved_list.len(), 1);
    assert_eq!(posted_list.len(), 1);
}

#[tokio::test]
async fn test_only_owner_can_post() {
    let (store, _) = store_with_memory_mirror().await;
    let owner = saved_user(&store, "owner@example.com").await;
    let other = saved_user(&store, "other@example.com").await;
    let mut trip = Trip::new(owner.id.unwrap(), details());
    store.save_trip(&mut trip).await.unwrap();

    let result = store.post_trip(trip.id.unwrap(), other.id.unwrap()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_view_trip_visibility() {
    let (store, _) = store_with_memory_mirror().await;
    let owner = saved_user(&store, "owner@example.com").await;
    let other = saved_user(&store, "other@example.com").await;
    let mut trip = Trip::new(owner.id.unwrap(), details());
    store.save_trip(&mut trip).await.unwrap();
    let trip_id = trip.id.unwrap();

    assert!(store.view_trip(trip_id, owner.id.unwrap()).await.is_ok());
    assert!(matches!(
        store.view_trip(trip_id, other.id.unwrap()).await,
        Err(Error::NotFound(_))
    ));

    store.post_trip(trip_id, owner.id.unwrap()).await.unwrap();
    assert!(store.view_trip(trip_id, other.id.unwrap()).await.is_ok());
}

#[tokio::test]
async fn test_rate_trip_upserts_and_mirrors_once() {
    let (store, docs) = store_with_memory_mirror().await;
    let owner = saved_user(&store, "owner@example.com").await;
    let rater = saved_user(&store, "rater@example.com").await;
    let mut trip = Trip::new(owner.id.unwrap(), details());
    store.save_trip(&mut trip).await.unwrap();
    let trip_id = trip.id.unwrap();

    store
        .rate_trip(trip_id, rater.id.unwrap(), 2, Some("meh".into()))
        .await
        .unwrap();
    let (rating, summary) = store
        .rate_trip(trip_id, rater.id.unwrap(), 5, Some("changed my mind".into()))
        .await
        .unwrap();

    assert_eq!(rating.rating, 5);
    assert_eq!(summary.total_ratings, 1);
    assert_eq!(summary.average_rating, 5.0);

    let key = DocumentKey::new()
        .field("trip_id", trip_id.to_string())
        .field("user_id", rater.id.unwrap().to_string());
    let mirrored = store
        .mirror()
        .find_one(RATINGS_COLLECTION, &key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mirrored["rating"], json!(5));
    assert!(mirrored["created_at"].is_string());
    assert_eq!(docs.documents(RATINGS_COLLECTION).await.len(), 1);
}

#[tokio::test]
async fn test_rate_trip_validation() {
    let (store, _) = store_with_memory_mirror().await;
    let owner = saved_user(&store, "owner@example.com").await;
    let mut trip = Trip::new(owner.id.unwrap(), details());
    store.save_trip(&mut trip).await.unwrap();

    assert!(matches!(
        store.rate_trip(trip.id.unwrap(), owner.id.unwrap(), 0, None).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.rate_trip(trip.id.unwrap(), owner.id.unwrap(), 6, None).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.rate_trip(9999, owner.id.unwrap(), 3, None).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_save_rating_rejects_second_insert_for_pair() {
    let (store, _) = store_with_memory_mirror().await;
    let owner = saved_user(&store, "owner@example.com").await;
    let mut trip = Trip::new(owner.id.unwrap(), details());
    store.save_trip(&mut trip).await.unwrap();

    let mut first = Rating::new(trip.id.unwrap(), owner.id.unwrap(), 4, None);
    store.save_rating(&mut first).await.unwrap();

    let mut second = Rating::new(trip.id.unwrap(), owner.id.unwrap(), 1, None);
    assert!(matches!(
        store.save_rating(&mut second).await,
        Err(Error::Database(_))
    ));
}

#[tokio::test]
async fn test_profile_save_refreshes_updated_at() {
    let (store, _) = store_with_memory_mirror().await;
    let user = saved_user(&store, "profile@example.com").await;
    let mut profile: Profile = store.profile(user.id.unwrap()).await.unwrap().unwrap();
    let before = profile.updated_at;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    profile.location = "Lisbon".to_string();
    store.save_profile(&mut profile).await.unwrap();

    let reloaded = store.profile(user.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(reloaded.location, "Lisbon");
    assert!(reloaded.updated_at > before);
}
