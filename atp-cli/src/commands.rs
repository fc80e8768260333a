//! Subcommand handlers

use anyhow::{anyhow, bail, Context as _, Result};
use atp_ai::planner::plan_error;
use atp_ai::{Itinerary, TripPlanner};
use atp_common::config::{resolve_mirror_settings, TomlConfig};
use atp_common::db::{init_database, Trip, TripDetails, User};
use atp_common::mirror::MirrorOutcome;
use atp_common::{Mirror, Store};
use chrono::NaiveDate;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Settings resolved once at startup
pub struct Context {
    pub toml: TomlConfig,
    pub database_path: PathBuf,
    pub provider: String,
}

/// Profile fields to change; `None` leaves a field untouched
pub struct ProfileEdit {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub avatar: Option<String>,
}

async fn open_store(ctx: &Context) -> Result<Store> {
    info!("Database path: {}", ctx.database_path.display());
    let pool = init_database(&ctx.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", ctx.database_path.display()))?;

    let settings = resolve_mirror_settings(&ctx.toml);
    let mirror = Mirror::connect(settings.as_ref()).await;
    Ok(Store::new(pool, mirror))
}

fn report_mirror(outcome: &MirrorOutcome) {
    if let MirrorOutcome::Failed(reason) = outcome {
        warn!("Saved locally; mirror copy failed: {}", reason);
    }
}

async fn user_id(store: &Store, email: &str) -> Result<i64> {
    let user = store.require_user(email).await?;
    user.id
        .ok_or_else(|| anyhow!("User '{}' has no id", email))
}

pub async fn setup_mirror(ctx: &Context) -> Result<()> {
    let settings = resolve_mirror_settings(&ctx.toml).ok_or_else(|| {
        anyhow!("Mirror not configured: set ATP_MIRROR_URI or [mirror] uri in config.toml")
    })?;

    let mirror = match Mirror::connect_strict(&settings).await {
        Ok(mirror) => mirror,
        Err(e) => {
            error!("Failed to connect to mirror: {}", e);
            bail!("Mirror '{}' unreachable: {}", settings.database, e);
        }
    };

    let collections = mirror.setup_collections().await?;
    println!("✓ Connected to mirror database '{}'", settings.database);
    for name in collections {
        println!("✓ Collection ready: {}", name);
    }
    mirror.close().await;
    Ok(())
}

pub async fn user_add(
    ctx: &Context,
    email: &str,
    first_name: String,
    last_name: String,
) -> Result<()> {
    let store = open_store(ctx).await?;
    if store.find_user_by_email(email).await?.is_some() {
        bail!("User '{}' already exists", email);
    }

    let mut user = User::new(email);
    user.first_name = first_name;
    user.last_name = last_name;
    let outcome = store.save_user(&mut user).await?;
    report_mirror(&outcome);

    println!("✓ Created user {} (id {})", user.email, user.id.unwrap_or_default());
    store.close().await;
    Ok(())
}

pub async fn profile_edit(ctx: &Context, email: &str, edit: ProfileEdit) -> Result<()> {
    let store = open_store(ctx).await?;
    let user_id = user_id(&store, email).await?;
    let mut profile = store
        .profile(user_id)
        .await?
        .ok_or_else(|| anyhow!("User '{}' has no profile", email))?;

    if let Some(bio) = edit.bio {
        profile.bio = bio;
    }
    if let Some(location) = edit.location {
        profile.location = location;
    }
    if let Some(birth_date) = edit.birth_date {
        profile.birth_date = Some(birth_date);
    }
    if let Some(avatar) = edit.avatar {
        profile.avatar = Some(avatar);
    }

    report_mirror(&store.save_profile(&mut profile).await?);
    println!("✓ Profile updated for {}", email);
    store.close().await;
    Ok(())
}

pub async fn plan(ctx: &Context, email: &str, details: TripDetails) -> Result<()> {
    details.validate()?;

    let store = open_store(ctx).await?;
    let user_id = user_id(&store, email).await?;
    let planner = TripPlanner::from_config(&ctx.provider, &ctx.toml.ai)?;

    let plan = planner.generate_trip_plan(&details).await;
    if let Some(message) = plan_error(&plan) {
        bail!("Error generating trip plan: {}", message);
    }

    let mut trip = Trip::new(user_id, details);
    trip.trip_plan = Some(Value::Object(plan));
    report_mirror(&store.save_trip(&mut trip).await?);

    println!("✓ Trip plan generated (trip {})", trip.id.unwrap_or_default());
    println!("{}", trip);
    print_plan(&trip);
    store.close().await;
    Ok(())
}

pub async fn show(ctx: &Context, email: &str, trip_id: i64) -> Result<()> {
    let store = open_store(ctx).await?;
    let user_id = user_id(&store, email).await?;
    let trip = store.view_trip(trip_id, user_id).await?;

    println!("{}", trip);
    println!(
        "{} for {} people, {} days",
        trip.details.trip_type.label(),
        trip.details.number_of_people,
        trip.details.number_of_days()
    );
    print_plan(&trip);
    store.close().await;
    Ok(())
}

pub async fn save_trip(ctx: &Context, email: &str, trip_id: i64) -> Result<()> {
    let store = open_store(ctx).await?;
    let user_id = user_id(&store, email).await?;
    let trip = store.mark_trip_saved(trip_id, user_id).await?;
    println!("✓ Trip saved successfully: {}", trip);
    store.close().await;
    Ok(())
}

pub async fn post_trip(ctx: &Context, email: &str, trip_id: i64) -> Result<()> {
    let store = open_store(ctx).await?;
    let user_id = user_id(&store, email).await?;
    let trip = store.post_trip(trip_id, user_id).await?;
    println!("✓ Trip posted successfully: {}", trip);
    store.close().await;
    Ok(())
}

pub async fn rate(
    ctx: &Context,
    email: &str,
    trip_id: i64,
    rating: i64,
    comment: Option<String>,
) -> Result<()> {
    let store = open_store(ctx).await?;
    let user_id = user_id(&store, email).await?;
    let (_, summary) = store.rate_trip(trip_id, user_id, rating, comment).await?;
    println!(
        "✓ Rating submitted successfully (average {:.1} from {} ratings)",
        summary.average_rating, summary.total_ratings
    );
    store.close().await;
    Ok(())
}

pub async fn ratings(ctx: &Context, trip_id: i64) -> Result<()> {
    let store = open_store(ctx).await?;
    let (ratings, summary) = store.trip_ratings(trip_id).await?;

    println!(
        "Average {:.1} from {} ratings",
        summary.average_rating, summary.total_ratings
    );
    for entry in ratings {
        println!(
            "  {} {}  {}  {}",
            "★".repeat(entry.rating.rating.clamp(0, 5) as usize),
            entry.rating.created_at.format("%Y-%m-%d %H:%M"),
            entry.user_email,
            entry.rating.comment.as_deref().unwrap_or("")
        );
    }
    store.close().await;
    Ok(())
}

pub async fn explore(ctx: &Context, limit: Option<i64>) -> Result<()> {
    let store = open_store(ctx).await?;
    let trips = store.explore(limit).await?;
    if trips.is_empty() {
        println!("No posted trips yet");
    }
    for trip in &trips {
        print_trip_line(trip);
    }
    store.close().await;
    Ok(())
}

pub async fn dashboard(ctx: &Context, email: &str) -> Result<()> {
    let store = open_store(ctx).await?;
    let user_id = user_id(&store, email).await?;
    let (saved, posted) = store.dashboard(user_id).await?;

    println!("Saved trips ({})", saved.len());
    for trip in &saved {
        print_trip_line(trip);
    }
    println!("Posted trips ({})", posted.len());
    for trip in &posted {
        print_trip_line(trip);
    }
    store.close().await;
    Ok(())
}

fn print_trip_line(trip: &Trip) {
    let posted = trip
        .posted_at
        .map(|at| format!("  posted {}", at.format("%Y-%m-%d")))
        .unwrap_or_default();
    println!("  #{:<5} {}{}", trip.id.unwrap_or_default(), trip, posted);
}

fn print_plan(trip: &Trip) {
    match &trip.trip_plan {
        Some(Value::Object(plan)) => print!("{}", Itinerary::from_plan(plan)),
        _ => println!("(no itinerary)"),
    }
}
