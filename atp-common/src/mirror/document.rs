//! Document shapes written to the mirror
//!
//! Field names follow the primary schema. Temporal fields are ISO-8601
//! strings, foreign keys are string references, and absent values are
//! written as explicit `null` rather than left out.

use crate::db::models::{Profile, Rating, Trip, User};
use crate::time::{iso_value, IsoFormat};
use serde_json::{Map, Value};

/// A mirrored document
pub type Document = Map<String, Value>;

pub const USERS_COLLECTION: &str = "auth_user";
pub const TRIPS_COLLECTION: &str = "trips_trip";
pub const RATINGS_COLLECTION: &str = "trips_rating";
pub const PROFILES_COLLECTION: &str = "trips_profile";

/// Equality filter on string-valued document fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentKey {
    fields: Vec<(&'static str, String)>,
}

impl DocumentKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// True when every key field is present in `document` with the same string value
    pub fn matches(&self, document: &Document) -> bool {
        self.fields.iter().all(|(name, expected)| {
            matches!(document.get(*name), Some(Value::String(actual)) if actual == expected)
        })
    }
}

/// Index over one or more document fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub fields: Vec<&'static str>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn on(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
            unique: false,
        }
    }

    pub fn unique(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
            unique: true,
        }
    }
}

/// A collection and the indexes it should carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub indexes: Vec<IndexSpec>,
}

/// Collections and indexes created by mirror setup
pub fn collection_specs() -> Vec<CollectionSpec> {
    vec![
        CollectionSpec {
            name: USERS_COLLECTION,
            indexes: vec![IndexSpec::unique(&["email"])],
        },
        CollectionSpec {
            name: TRIPS_COLLECTION,
            indexes: vec![IndexSpec::on(&["user_id"]), IndexSpec::on(&["is_posted"])],
        },
        CollectionSpec {
            name: RATINGS_COLLECTION,
            indexes: vec![IndexSpec::unique(&["trip_id", "user_id"])],
        },
        CollectionSpec {
            name: PROFILES_COLLECTION,
            indexes: vec![IndexSpec::unique(&["user_id"])],
        },
    ]
}

/// A primary-store record with a mirrored form
pub trait Mirrored {
    /// Target collection
    const COLLECTION: &'static str;

    /// Short description for log lines
    fn label(&self) -> String;

    /// Fields identifying the record's document
    fn mirror_key(&self) -> DocumentKey;

    /// Serialized copy of the record
    fn to_document(&self) -> Document;
}

fn reference(id: Option<i64>) -> Value {
    id.map_or(Value::Null, |id| Value::String(id.to_string()))
}

fn key_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

fn text(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |v| Value::String(v.clone()))
}

impl Mirrored for User {
    const COLLECTION: &'static str = USERS_COLLECTION;

    fn label(&self) -> String {
        format!("User '{}'", self.email)
    }

    fn mirror_key(&self) -> DocumentKey {
        DocumentKey::new().field("email", self.email.clone())
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("id".into(), reference(self.id));
        doc.insert("email".into(), Value::String(self.email.clone()));
        doc.insert("password".into(), Value::String(self.password.clone()));
        doc.insert("first_name".into(), Value::String(self.first_name.clone()));
        doc.insert("last_name".into(), Value::String(self.last_name.clone()));
        doc.insert("is_active".into(), Value::Bool(self.is_active));
        doc.insert("is_staff".into(), Value::Bool(self.is_staff));
        doc.insert("is_superuser".into(), Value::Bool(self.is_superuser));
        doc.insert(
            "date_joined".into(),
            Value::String(self.date_joined.iso_format()),
        );
        doc.insert("last_login".into(), iso_value(self.last_login.as_ref()));
        doc
    }
}

impl Mirrored for Trip {
    const COLLECTION: &'static str = TRIPS_COLLECTION;

    fn label(&self) -> String {
        format!("Trip '{}'", self.details.destination)
    }

    fn mirror_key(&self) -> DocumentKey {
        DocumentKey::new().field("id", key_id(self.id))
    }

    fn to_document(&self) -> Document {
        let d = &self.details;
        let mut doc = Document::new();
        doc.insert("id".into(), reference(self.id));
        doc.insert("user_id".into(), reference(Some(self.user_id)));
        doc.insert("destination".into(), Value::String(d.destination.clone()));
        doc.insert(
            "start_location".into(),
            Value::String(d.start_location.clone()),
        );
        doc.insert("start_date".into(), iso_value(Some(&d.start_date)));
        doc.insert("end_date".into(), iso_value(Some(&d.end_date)));
        doc.insert(
            "interested_activities".into(),
            Value::String(d.interested_activities.clone()),
        );
        doc.insert(
            "trip_type".into(),
            Value::String(d.trip_type.as_str().to_string()),
        );
        doc.insert("number_of_people".into(), Value::from(d.number_of_people));
        doc.insert(
            "trip_plan".into(),
            self.trip_plan.clone().unwrap_or(Value::Null),
        );
        doc.insert("is_saved".into(), Value::Bool(self.is_saved));
        doc.insert("is_posted".into(), Value::Bool(self.is_posted));
        doc.insert("posted_at".into(), iso_value(self.posted_at.as_ref()));
        doc.insert("created_at".into(), iso_value(Some(&self.created_at)));
        doc
    }
}

impl Mirrored for Rating {
    const COLLECTION: &'static str = RATINGS_COLLECTION;

    fn label(&self) -> String {
        format!("Rating of trip {} by user {}", self.trip_id, self.user_id)
    }

    fn mirror_key(&self) -> DocumentKey {
        DocumentKey::new()
            .field("trip_id", self.trip_id.to_string())
            .field("user_id", self.user_id.to_string())
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("id".into(), reference(self.id));
        doc.insert("trip_id".into(), reference(Some(self.trip_id)));
        doc.insert("user_id".into(), reference(Some(self.user_id)));
        doc.insert("rating".into(), Value::from(self.rating));
        doc.insert("comment".into(), text(self.comment.as_ref()));
        doc.insert("created_at".into(), iso_value(Some(&self.created_at)));
        doc
    }
}

impl Mirrored for Profile {
    const COLLECTION: &'static str = PROFILES_COLLECTION;

    fn label(&self) -> String {
        format!("Profile of user {}", self.user_id)
    }

    fn mirror_key(&self) -> DocumentKey {
        DocumentKey::new().field("user_id", self.user_id.to_string())
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("id".into(), reference(self.id));
        doc.insert("user_id".into(), reference(Some(self.user_id)));
        doc.insert("avatar".into(), text(self.avatar.as_ref()));
        doc.insert("bio".into(), Value::String(self.bio.clone()));
        doc.insert("location".into(), Value::String(self.location.clone()));
        doc.insert("birth_date".into(), iso_value(self.birth_date.as_ref()));
        doc.insert("created_at".into(), iso_value(Some(&self.created_at)));
        doc.insert("updated_at".into(), iso_value(Some(&self.updated_at)));
        doc
    }
}
