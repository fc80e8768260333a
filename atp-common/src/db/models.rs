//! Database models

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Who is travelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TripType {
    Couple,
    Friends,
    Family,
}

impl TripType {
    /// Stored value (`COUPLE`, `FRIENDS`, `FAMILY`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::Couple => "COUPLE",
            TripType::Friends => "FRIENDS",
            TripType::Family => "FAMILY",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            TripType::Couple => "Couple",
            TripType::Friends => "Friends",
            TripType::Family => "Family",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COUPLE" => Ok(TripType::Couple),
            "FRIENDS" => Ok(TripType::Friends),
            "FAMILY" => Ok(TripType::Family),
            other => Err(Error::InvalidInput(format!(
                "Unknown trip type '{}' (expected COUPLE, FRIENDS or FAMILY)",
                other
            ))),
        }
    }
}

/// Account record. Email is the login identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Primary key, `None` until first saved
    pub id: Option<i64>,
    pub email: String,
    /// Opaque password hash; authentication lives outside this crate
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Unsaved active user with an unusable password
    pub fn new(email: &str) -> Self {
        Self {
            id: None,
            email: normalize_email(email),
            password: UNUSABLE_PASSWORD.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: crate::time::now(),
            last_login: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Password marker for accounts that cannot log in with a password
pub const UNUSABLE_PASSWORD: &str = "!";

/// Lowercase the domain part of an email address, keep the local part as typed
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// The user-supplied part of a trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
    pub start_location: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interested_activities: String,
    pub trip_type: TripType,
    pub number_of_people: i64,
}

impl TripDetails {
    /// Inclusive day count, never below 1
    pub fn number_of_days(&self) -> i64 {
        ((self.end_date - self.start_date).num_days() + 1).max(1)
    }

    /// Checks applied before a trip is planned
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() || self.start_location.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Start location and destination are required".to_string(),
            ));
        }
        if self.start_date > self.end_date {
            return Err(Error::InvalidInput(
                "End date should be after start date".to_string(),
            ));
        }
        if self.number_of_people < 1 {
            return Err(Error::InvalidInput(
                "Number of people must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Option<i64>,
    pub user_id: i64,
    pub details: TripDetails,
    pub created_at: DateTime<Utc>,
    /// Generated itinerary document
    pub trip_plan: Option<Value>,
    pub is_saved: bool,
    pub is_posted: bool,
    pub posted_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// Unsaved trip owned by `user_id`
    pub fn new(user_id: i64, details: TripDetails) -> Self {
        Self {
            id: None,
            user_id,
            details,
            created_at: crate::time::now(),
            trip_plan: None,
            is_saved: false,
            is_posted: false,
            posted_at: None,
        }
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Trip ({} - {})",
            self.details.destination, self.details.start_date, self.details.end_date
        )
    }
}

/// Lowest accepted star rating
pub const MIN_RATING: i64 = 1;
/// Highest accepted star rating
pub const MAX_RATING: i64 = 5;

/// One user's rating of one trip. Unique per (trip, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Option<i64>,
    pub trip_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(trip_id: i64, user_id: i64, rating: i64, comment: Option<String>) -> Self {
        Self {
            id: None,
            trip_id,
            user_id,
            rating,
            comment,
            created_at: crate::time::now(),
        }
    }
}

/// Reject star values outside 1..=5
pub fn validate_rating(value: i64) -> Result<()> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )))
    }
}

/// Aggregate rating figures for a trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal, 0.0 when unrated
    pub average_rating: f64,
    pub total_ratings: i64,
}

/// Rating joined with the rater's email, for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingWithUser {
    pub rating: Rating,
    pub user_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<i64>,
    pub user_id: i64,
    /// Stored avatar path
    pub avatar: Option<String>,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile for a freshly created user
    pub fn new(user_id: i64) -> Self {
        let now = crate::time::now();
        Self {
            id: None,
            user_id,
            avatar: None,
            bio: String::new(),
            location: String::new(),
            birth_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}
