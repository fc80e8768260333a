//! Dual-write store
//!
//! Every `save_*` writes the primary SQLite row first. Errors there are
//! returned to the caller unchanged. Only after the primary write succeeds is
//! the record handed to the [`Mirror`], whose outcome is returned alongside
//! but can never turn the save into an error.

use crate::db::models::{
    normalize_email, validate_rating, Profile, Rating, RatingSummary, RatingWithUser, Trip, User,
};
use crate::db::{profiles, ratings, trips, users};
use crate::mirror::{Mirror, MirrorOutcome};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Primary store with a best-effort document mirror
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    mirror: Mirror,
}

impl Store {
    pub fn new(pool: SqlitePool, mirror: Mirror) -> Self {
        Self { pool, mirror }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    /// Close primary and mirror connections
    pub async fn close(&self) {
        self.mirror.close().await;
        self.pool.close().await;
    }

    // ------------------------------------------------------------------
    // Save lifecycle
    // ------------------------------------------------------------------

    /// Insert or update a user, then mirror it
    ///
    /// A newly created user gets an empty profile. Every user save also saves
    /// (and so mirrors) the user's profile.
    pub async fn save_user(&self, user: &mut User) -> Result<MirrorOutcome> {
        user.email = normalize_email(&user.email);
        if user.email.is_empty() {
            return Err(Error::InvalidInput("The Email field must be set".to_string()));
        }

        let created = match user.id {
            Some(id) => {
                users::update_user(&self.pool, id, user).await?;
                false
            }
            None => {
                user.id = Some(users::insert_user(&self.pool, user).await?);
                true
            }
        };
        let user_id = user.id.ok_or_else(|| Error::Internal("user saved without id".into()))?;

        let outcome = self.mirror.replicate(&*user).await;

        let mut profile = match profiles::get_profile_by_user(&self.pool, user_id).await? {
            Some(profile) => profile,
            None => {
                if !created {
                    debug!(user_id, "Existing user had no profile; creating one");
                }
                Profile::new(user_id)
            }
        };
        self.save_profile(&mut profile).await?;

        Ok(outcome)
    }

    /// Insert or update a profile (refreshing `updated_at`), then mirror it
    pub async fn save_profile(&self, profile: &mut Profile) -> Result<MirrorOutcome> {
        profile.updated_at = crate::time::now();

        match profile.id {
            Some(id) => profiles::update_profile(&self.pool, id, profile).await?,
            None => profile.id = Some(profiles::insert_profile(&self.pool, profile).await?),
        }

        Ok(self.mirror.replicate(&*profile).await)
    }

    /// Insert or update a trip, then mirror it
    pub async fn save_trip(&self, trip: &mut Trip) -> Result<MirrorOutcome> {
        match trip.id {
            Some(id) => trips::update_trip(&self.pool, id, trip).await?,
            None => trip.id = Some(trips::insert_trip(&self.pool, trip).await?),
        }

        Ok(self.mirror.replicate(&*trip).await)
    }

    /// Insert or update a rating, then mirror it
    ///
    /// Inserting a second rating for the same (trip, user) is a primary-store
    /// error; use [`Store::rate_trip`] for create-or-update.
    pub async fn save_rating(&self, rating: &mut Rating) -> Result<MirrorOutcome> {
        validate_rating(rating.rating)?;

        match rating.id {
            Some(id) => ratings::update_rating(&self.pool, id, rating).await?,
            None => rating.id = Some(ratings::insert_rating(&self.pool, rating).await?),
        }

        Ok(self.mirror.replicate(&*rating).await)
    }

    // ------------------------------------------------------------------
    // Trip flows
    // ------------------------------------------------------------------

    /// Mark a user's own trip as saved
    pub async fn mark_trip_saved(&self, trip_id: i64, user_id: i64) -> Result<Trip> {
        let mut trip = self.require_owned_trip(trip_id, user_id).await?;
        if trip.is_saved {
            return Err(Error::Conflict("Trip is already saved".to_string()));
        }

        trip.is_saved = true;
        self.save_trip(&mut trip).await?;
        info!(trip_id, user_id, "Trip saved");
        Ok(trip)
    }

    /// Publish a user's own trip
    pub async fn post_trip(&self, trip_id: i64, user_id: i64) -> Result<Trip> {
        let mut trip = self.require_owned_trip(trip_id, user_id).await?;
        if trip.is_posted {
            return Err(Error::Conflict("Trip is already posted".to_string()));
        }

        trip.is_posted = true;
        trip.posted_at = Some(crate::time::now());
        self.save_trip(&mut trip).await?;
        info!(trip_id, user_id, "Trip posted");
        Ok(trip)
    }

    /// Create or update `user_id`'s rating of a trip
    pub async fn rate_trip(
        &self,
        trip_id: i64,
        user_id: i64,
        value: i64,
        comment: Option<String>,
    ) -> Result<(Rating, RatingSummary)> {
        validate_rating(value)?;
        if trips::get_trip(&self.pool, trip_id).await?.is_none() {
            return Err(Error::NotFound("Trip not found".to_string()));
        }

        let (rating, created) =
            ratings::upsert_rating(&self.pool, trip_id, user_id, value, comment).await?;
        self.mirror.replicate(&rating).await;

        let summary = ratings::rating_summary(&self.pool, trip_id).await?;
        info!(
            trip_id,
            user_id,
            created,
            average = summary.average_rating,
            total = summary.total_ratings,
            "Rating recorded"
        );
        Ok((rating, summary))
    }

    /// A trip the user may view: their own, or anyone's posted trip
    pub async fn view_trip(&self, trip_id: i64, user_id: i64) -> Result<Trip> {
        if let Some(trip) = trips::get_user_trip(&self.pool, trip_id, user_id).await? {
            return Ok(trip);
        }
        match trips::get_trip(&self.pool, trip_id).await? {
            Some(trip) if trip.is_posted => Ok(trip),
            _ => Err(Error::NotFound(
                "Trip not found or you don't have permission to view it.".to_string(),
            )),
        }
    }

    /// Ratings for a trip, newest first, with the summary
    pub async fn trip_ratings(
        &self,
        trip_id: i64,
    ) -> Result<(Vec<RatingWithUser>, RatingSummary)> {
        if trips::get_trip(&self.pool, trip_id).await?.is_none() {
            return Err(Error::NotFound("Trip not found".to_string()));
        }
        let listed = ratings::list_trip_ratings(&self.pool, trip_id).await?;
        let summary = ratings::rating_summary(&self.pool, trip_id).await?;
        Ok((listed, summary))
    }

    /// Posted trips, most recent first
    pub async fn explore(&self, limit: Option<i64>) -> Result<Vec<Trip>> {
        trips::list_posted_trips(&self.pool, limit).await
    }

    /// A user's (saved, posted) trips
    pub async fn dashboard(&self, user_id: i64) -> Result<(Vec<Trip>, Vec<Trip>)> {
        let saved = trips::list_saved_trips(&self.pool, user_id).await?;
        let posted = trips::list_user_posted_trips(&self.pool, user_id).await?;
        Ok((saved, posted))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        users::find_user_by_email(&self.pool, &normalize_email(email)).await
    }

    /// User by email, or `NotFound`
    pub async fn require_user(&self, email: &str) -> Result<User> {
        self.find_user_by_email(email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User '{}'", email)))
    }

    pub async fn profile(&self, user_id: i64) -> Result<Option<Profile>> {
        profiles::get_profile_by_user(&self.pool, user_id).await
    }

    async fn require_owned_trip(&self, trip_id: i64, user_id: i64) -> Result<Trip> {
        trips::get_user_trip(&self.pool, trip_id, user_id)
            .await?
            .ok_or_else(|| Error::NotFound("Trip not found".to_string()))
    }
}
