//! User table operations

use super::models::User;
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, is_active, is_staff, \
                            is_superuser, date_joined, last_login";

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: Some(row.try_get("id")?),
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        date_joined: row.try_get("date_joined")?,
        last_login: row.try_get("last_login")?,
    })
}

/// Insert a new user and return its id
pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (
            email, password, first_name, last_name,
            is_active, is_staff, is_superuser, date_joined, last_login
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.is_active)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.date_joined)
    .bind(user.last_login)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite a saved user's columns
pub async fn update_user(pool: &SqlitePool, id: i64, user: &User) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            email = ?, password = ?, first_name = ?, last_name = ?,
            is_active = ?, is_staff = ?, is_superuser = ?,
            date_joined = ?, last_login = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.is_active)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.date_joined)
    .bind(user.last_login)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User {}", id)));
    }
    Ok(())
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let row = sqlx::query(&sql).bind(email).fetch_optional(pool).await?;
    row.as_ref().map(user_from_row).transpose()
}
