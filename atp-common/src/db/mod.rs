//! Primary store: schema, models and queries

pub mod init;
pub mod models;
pub mod profiles;
pub mod ratings;
pub mod trips;
pub mod users;

pub use init::*;
pub use models::*;
