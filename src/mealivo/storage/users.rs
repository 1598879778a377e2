//! User rows: accounts, verification state and image slots.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::mealivo::images::ImageSlot;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, email_verified_at, \
     profile_pic_url, profile_pic_id, cover_bg_url, cover_bg_id, created_at";

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub profile_pic_url: Option<String>,
    pub profile_pic_id: Option<String>,
    pub cover_bg_url: Option<String>,
    pub cover_bg_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Public id of the image currently stored in `slot`, if any.
    #[must_use]
    pub fn image_public_id(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Profile => self.profile_pic_id.as_deref(),
            ImageSlot::Cover => self.cover_bg_id.as_deref(),
        }
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email_verified_at: row.try_get("email_verified_at")?,
            profile_pic_url: row.try_get("profile_pic_url")?,
            profile_pic_id: row.try_get("profile_pic_id")?,
            cover_bg_url: row.try_get("cover_bg_url")?,
            cover_bg_id: row.try_get("cover_bg_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

pub async fn user_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    row.try_get("exists")
}

pub async fn insert_user(pool: &PgPool, user: &NewUser<'_>) -> Result<Uuid, sqlx::Error> {
    let query = r"
        INSERT INTO users (id, email, password_hash, first_name, last_name)
        VALUES ($1, $2, $3, $4, $5)
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let id = Uuid::new_v4();
    sqlx::query(query)
        .bind(id)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.first_name)
        .bind(user.last_name)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(id)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    row.as_ref().map(UserRecord::from_row).transpose()
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    row.as_ref().map(UserRecord::from_row).transpose()
}

/// Mark the address as verified. Returns `false` when no user owns it.
///
/// Already verified users keep their original verification time.
pub async fn mark_email_verified(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let query = r"
        UPDATE users
        SET email_verified_at = COALESCE(email_verified_at, NOW())
        WHERE email = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(email)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Store (or clear, with `None`) the hosted image for one slot.
pub async fn set_image(
    pool: &PgPool,
    user_id: Uuid,
    slot: ImageSlot,
    image: Option<(&str, &str)>,
) -> Result<(), sqlx::Error> {
    let query = match slot {
        ImageSlot::Profile => {
            "UPDATE users SET profile_pic_url = $2, profile_pic_id = $3 WHERE id = $1"
        }
        ImageSlot::Cover => "UPDATE users SET cover_bg_url = $2, cover_bg_id = $3 WHERE id = $1",
    };
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let (url, public_id) = match image {
        Some((url, public_id)) => (Some(url), Some(public_id)),
        None => (None, None),
    };
    sqlx::query(query)
        .bind(user_id)
        .bind(url)
        .bind(public_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email_verified_at: None,
            profile_pic_url: Some("https://img.test/p.png".to_string()),
            profile_pic_id: Some("profile/p".to_string()),
            cover_bg_url: None,
            cover_bg_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn image_public_id_reads_the_requested_slot() {
        let user = user();
        assert_eq!(user.image_public_id(ImageSlot::Profile), Some("profile/p"));
        assert_eq!(user.image_public_id(ImageSlot::Cover), None);
    }

    #[test]
    fn is_verified_follows_timestamp() {
        let mut user = user();
        assert!(!user.is_verified());
        user.email_verified_at = Some(Utc::now());
        assert!(user.is_verified());
    }
}
