//! Trip table operations

use super::models::{Trip, TripDetails, TripType};
use crate::{Error, Result};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const TRIP_COLUMNS: &str = "id, user_id, start_location, destination, start_date, end_date, \
                            interested_activities, trip_type, number_of_people, created_at, \
                            trip_plan, is_saved, is_posted, posted_at";

fn trip_from_row(row: &SqliteRow) -> Result<Trip> {
    let trip_type: String = row.try_get("trip_type")?;
    let trip_plan: Option<String> = row.try_get("trip_plan")?;
    let trip_plan = trip_plan
        .map(|text| serde_json::from_str::<Value>(&text))
        .transpose()?;

    Ok(Trip {
        id: Some(row.try_get("id")?),
        user_id: row.try_get("user_id")?,
        details: TripDetails {
            start_location: row.try_get("start_location")?,
            destination: row.try_get("destination")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            interested_activities: row.try_get("interested_activities")?,
            trip_type: trip_type.parse::<TripType>()?,
            number_of_people: row.try_get("number_of_people")?,
        },
        created_at: row.try_get("created_at")?,
        trip_plan,
        is_saved: row.try_get("is_saved")?,
        is_posted: row.try_get("is_posted")?,
        posted_at: row.try_get("posted_at")?,
    })
}

fn plan_json(trip: &Trip) -> Result<Option<String>> {
    trip.trip_plan
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Error::from)
}

/// Insert a new trip and return its id
pub async fn insert_trip(pool: &SqlitePool, trip: &Trip) -> Result<i64> {
    let d = &trip.details;
    let result = sqlx::query(
        r#"
        INSERT INTO trips (
            user_id, start_location, destination, start_date, end_date,
            interested_activities, trip_type, number_of_people, created_at,
            trip_plan, is_saved, is_posted, posted_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(trip.user_id)
    .bind(&d.start_location)
    .bind(&d.destination)
    .bind(d.start_date)
    .bind(d.end_date)
    .bind(&d.interested_activities)
    .bind(d.trip_type.as_str())
    .bind(d.number_of_people)
    .bind(trip.created_at)
    .bind(plan_json(trip)?)
    .bind(trip.is_saved)
    .bind(trip.is_posted)
    .bind(trip.posted_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite a saved trip's columns
pub async fn update_trip(pool: &SqlitePool, id: i64, trip: &Trip) -> Result<()> {
    let d = &trip.details;
    let result = sqlx::query(
        r#"
        UPDATE trips SET
            user_id = ?, start_location = ?, destination = ?, start_date = ?, end_date = ?,
            interested_activities = ?, trip_type = ?, number_of_people = ?, created_at = ?,
            trip_plan = ?, is_saved = ?, is_posted = ?, posted_at = ?
        WHERE id = ?
        "#,
    )
    .bind(trip.user_id)
    .bind(&d.start_location)
    .bind(&d.destination)
    .bind(d.start_date)
    .bind(d.end_date)
    .bind(&d.interested_activities)
    .bind(d.trip_type.as_str())
    .bind(d.number_of_people)
    .bind(trip.created_at)
    .bind(plan_json(trip)?)
    .bind(trip.is_saved)
    .bind(trip.is_posted)
    .bind(trip.posted_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Trip {}", id)));
    }
    Ok(())
}

pub async fn get_trip(pool: &SqlitePool, id: i64) -> Result<Option<Trip>> {
    let sql = format!("SELECT {} FROM trips WHERE id = ?", TRIP_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(trip_from_row).transpose()
}

/// Trip `id` if owned by `user_id`
pub async fn get_user_trip(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Option<Trip>> {
    let sql = format!(
        "SELECT {} FROM trips WHERE id = ? AND user_id = ?",
        TRIP_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(trip_from_row).transpose()
}

/// A user's saved trips, newest first
pub async fn list_saved_trips(pool: &SqlitePool, user_id: i64) -> Result<Vec<Trip>> {
    let sql = format!(
        "SELECT {} FROM trips WHERE user_id = ? AND is_saved = 1 ORDER BY created_at DESC",
        TRIP_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;
    rows.iter().map(trip_from_row).collect()
}

/// A user's posted trips, most recently posted first
pub async fn list_user_posted_trips(pool: &SqlitePool, user_id: i64) -> Result<Vec<Trip>> {
    let sql = format!(
        "SELECT {} FROM trips WHERE user_id = ? AND is_posted = 1 ORDER BY posted_at DESC",
        TRIP_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;
    rows.iter().map(trip_from_row).collect()
}

/// All posted trips, most recently posted first
///
/// `limit` of `None` returns everything (explore page); the home page asks for 3.
pub async fn list_posted_trips(pool: &SqlitePool, limit: Option<i64>) -> Result<Vec<Trip>> {
    let sql = format!(
        "SELECT {} FROM trips WHERE is_posted = 1 ORDER BY posted_at DESC LIMIT ?",
        TRIP_COLUMNS
    );
    // SQLite treats a negative LIMIT as "no limit"
    let rows = sqlx::query(&sql)
        .bind(limit.unwrap_or(-1))
        .fetch_all(pool)
        .await?;
    rows.iter().map(trip_from_row).collect()
}
