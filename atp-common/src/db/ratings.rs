//! Rating table operations

use super::models::{Rating, RatingSummary, RatingWithUser};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn rating_from_row(row: &SqliteRow) -> Result<Rating> {
    Ok(Rating {
        id: Some(row.try_get("id")?),
        trip_id: row.try_get("trip_id")?,
        user_id: row.try_get("user_id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new rating and return its id
///
/// A second rating for the same (trip, user) violates the unique constraint.
pub async fn insert_rating(pool: &SqlitePool, rating: &Rating) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO ratings (trip_id, user_id, rating, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(rating.trip_id)
    .bind(rating.user_id)
    .bind(rating.rating)
    .bind(&rating.comment)
    .bind(rating.created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite a saved rating's value and comment (created_at is insert-only)
pub async fn update_rating(pool: &SqlitePool, id: i64, rating: &Rating) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE ratings SET trip_id = ?, user_id = ?, rating = ?, comment = ?
        WHERE id = ?
        "#,
    )
    .bind(rating.trip_id)
    .bind(rating.user_id)
    .bind(rating.rating)
    .bind(&rating.comment)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Rating {}", id)));
    }
    Ok(())
}

pub async fn get_rating(pool: &SqlitePool, trip_id: i64, user_id: i64) -> Result<Option<Rating>> {
    let row = sqlx::query(
        "SELECT id, trip_id, user_id, rating, comment, created_at \
         FROM ratings WHERE trip_id = ? AND user_id = ?",
    )
    .bind(trip_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(rating_from_row).transpose()
}

/// Create or update the rating for (trip, user)
///
/// Returns the stored rating and whether it was newly created.
pub async fn upsert_rating(
    pool: &SqlitePool,
    trip_id: i64,
    user_id: i64,
    value: i64,
    comment: Option<String>,
) -> Result<(Rating, bool)> {
    let created = get_rating(pool, trip_id, user_id).await?.is_none();

    sqlx::query(
        r#"
        INSERT INTO ratings (trip_id, user_id, rating, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (trip_id, user_id) DO UPDATE SET
            rating = excluded.rating,
            comment = excluded.comment
        "#,
    )
    .bind(trip_id)
    .bind(user_id)
    .bind(value)
    .bind(&comment)
    .bind(crate::time::now())
    .execute(pool)
    .await?;

    let rating = get_rating(pool, trip_id, user_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Rating for trip {} vanished after upsert", trip_id)))?;

    Ok((rating, created))
}

/// Average (one decimal, 0.0 when unrated) and count of a trip's ratings
pub async fn rating_summary(pool: &SqlitePool, trip_id: i64) -> Result<RatingSummary> {
    let (average, total): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(rating), COUNT(*) FROM ratings WHERE trip_id = ?",
    )
    .bind(trip_id)
    .fetch_one(pool)
    .await?;

    Ok(RatingSummary {
        average_rating: round_one_decimal(average.unwrap_or(0.0)),
        total_ratings: total,
    })
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A trip's ratings with rater emails, newest first
pub async fn list_trip_ratings(pool: &SqlitePool, trip_id: i64) -> Result<Vec<RatingWithUser>> {
    let rows = sqlx::query(
        r#"
        SELECT r.id, r.trip_id, r.user_id, r.rating, r.comment, r.created_at, u.email
        FROM ratings r
        JOIN users u ON u.id = r.user_id
        WHERE r.trip_id = ?
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(RatingWithUser {
                rating: rating_from_row(row)?,
                user_email: row.try_get("email")?,
            })
        })
        .collect()
}
