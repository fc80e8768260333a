//! Profile table operations

use super::models::Profile;
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn profile_from_row(row: &SqliteRow) -> Result<Profile> {
    Ok(Profile {
        id: Some(row.try_get("id")?),
        user_id: row.try_get("user_id")?,
        avatar: row.try_get("avatar")?,
        bio: row.try_get("bio")?,
        location: row.try_get("location")?,
        birth_date: row.try_get("birth_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn insert_profile(pool: &SqlitePool, profile: &Profile) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO profiles (user_id, avatar, bio, location, birth_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.avatar)
    .bind(&profile.bio)
    .bind(&profile.location)
    .bind(profile.birth_date)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_profile(pool: &SqlitePool, id: i64, profile: &Profile) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE profiles SET
            user_id = ?, avatar = ?, bio = ?, location = ?, birth_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.avatar)
    .bind(&profile.bio)
    .bind(&profile.location)
    .bind(profile.birth_date)
    .bind(profile.updated_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Profile {}", id)));
    }
    Ok(())
}

pub async fn get_profile_by_user(pool: &SqlitePool, user_id: i64) -> Result<Option<Profile>> {
    let row = sqlx::query(
        "SELECT id, user_id, avatar, bio, location, birth_date, created_at, updated_at \
         FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(profile_from_row).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::db::models::User;
    use crate::db::users::insert_user;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_profile_round_trip() {
        let pool = init_memory_database().await.unwrap();
        let user_id = insert_user(&pool, &User::new("p@example.com")).await.unwrap();

        let mut profile = Profile::new(user_id);
        profile.bio = "Slow traveller".to_string();
        profile.birth_date = NaiveDate::from_ymd_opt(1990, 5, 17);
        let id = insert_profile(&pool, &profile).await.unwrap();

        let loaded = get_profile_by_user(&pool, user_id).await.unwrap().unwrap();
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.bio, "Slow traveller");
        assert_eq!(loaded.birth_date, profile.birth_date);
    }

    #[tokio::test]
    async fn test_one_profile_per_user() {
        let pool = init_memory_database().await.unwrap();
        let user_id = insert_user(&pool, &User::new("q@example.com")).await.unwrap();

        insert_profile(&pool, &Profile::new(user_id)).await.unwrap();
        let result = insert_profile(&pool, &Profile::new(user_id)).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
