//! atp - AI Trip Planner command-line interface
//!
//! Plans trips with an AI provider and manages saved, posted and rated trips
//! in the primary SQLite store. When a mirror connection string is configured,
//! every write is also copied to the document mirror.

use anyhow::Result;
use atp_common::config::{load_toml_config, resolve_ai_provider, resolve_database_path};
use atp_common::db::TripType;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "atp")]
#[command(about = "AI Trip Planner")]
#[command(version)]
struct Args {
    /// Config file (default: <config_dir>/atp/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Primary SQLite database file
    #[arg(long, global = true, value_name = "FILE")]
    database: Option<PathBuf>,

    /// AI provider: openai, google or anthropic
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify the mirror connection and create its collections and indexes
    SetupMirror,

    /// Register a user
    UserAdd {
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Update a user's profile
    ProfileEdit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Generate an itinerary and store the trip
    Plan {
        #[arg(long)]
        user: String,
        /// Start location
        #[arg(long)]
        from: String,
        /// Destination
        #[arg(long)]
        to: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value = "")]
        activities: String,
        /// couple, friends or family
        #[arg(long, default_value = "couple")]
        trip_type: TripType,
        #[arg(long, default_value_t = 1)]
        people: i64,
    },

    /// Show one trip with its itinerary
    Show {
        #[arg(long)]
        user: String,
        trip_id: i64,
    },

    /// Mark one of your trips as saved
    SaveTrip {
        #[arg(long)]
        user: String,
        trip_id: i64,
    },

    /// Publish one of your trips
    PostTrip {
        #[arg(long)]
        user: String,
        trip_id: i64,
    },

    /// Rate a trip from 1 to 5 stars
    Rate {
        #[arg(long)]
        user: String,
        trip_id: i64,
        rating: i64,
        #[arg(long)]
        comment: Option<String>,
    },

    /// List a trip's ratings, newest first
    Ratings { trip_id: i64 },

    /// Browse posted trips, most recent first
    Explore {
        #[arg(long)]
        limit: Option<i64>,
    },

    /// A user's saved and posted trips
    Dashboard {
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref())?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting atp v{}", env!("CARGO_PKG_VERSION"));

    let ctx = commands::Context {
        database_path: resolve_database_path(args.database.as_deref(), &toml_config),
        provider: resolve_ai_provider(args.provider.as_deref(), &toml_config),
        toml: toml_config,
    };

    match args.command {
        Command::SetupMirror => commands::setup_mirror(&ctx).await,
        Command::UserAdd {
            email,
            first_name,
            last_name,
        } => commands::user_add(&ctx, &email, first_name, last_name).await,
        Command::ProfileEdit {
            user,
            bio,
            location,
            birth_date,
            avatar,
        } => {
            let edit = commands::ProfileEdit {
                bio,
                location,
                birth_date,
                avatar,
            };
            commands::profile_edit(&ctx, &user, edit).await
        }
        Command::Plan {
            user,
            from,
            to,
            start,
            end,
            activities,
            trip_type,
            people,
        } => {
            let details = atp_common::db::TripDetails {
                start_location: from,
                destination: to,
                start_date: start,
                end_date: end,
                interested_activities: activities,
                trip_type,
                number_of_people: people,
            };
            commands::plan(&ctx, &user, details).await
        }
        Command::Show { user, trip_id } => commands::show(&ctx, &user, trip_id).await,
        Command::SaveTrip { user, trip_id } => commands::save_trip(&ctx, &user, trip_id).await,
        Command::PostTrip { user, trip_id } => commands::post_trip(&ctx, &user, trip_id).await,
        Command::Rate {
            user,
            trip_id,
            rating,
            comment,
        } => commands::rate(&ctx, &user, trip_id, rating, comment).await,
        Command::Ratings { trip_id } => commands::ratings(&ctx, trip_id).await,
        Command::Explore { limit } => commands::explore(&ctx, limit).await,
        Command::Dashboard { user } => commands::dashboard(&ctx, &user).await,
    }
}
