//! Bulk ingredient loader.
//!
//! Reads a JSON file of `{name, measurement_unit}` objects and inserts
//! the entries that are not already present. Safe to run repeatedly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use recipe_sharing_api::models::IngredientSeed;
use recipe_sharing_api::storage::IngredientRepo;

#[derive(Parser)]
#[command(about = "Load ingredient reference data from a JSON file")]
struct Args {
    /// Path to the JSON seed file
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("failed to connect to the database")?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let seeds: Vec<IngredientSeed> =
        serde_json::from_str(&raw).context("seed file is not a JSON array of ingredients")?;

    let repo = IngredientRepo::new(&pool);
    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for seed in &seeds {
        if repo
            .upsert(seed.name.trim(), seed.measurement_unit.trim())
            .await?
        {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    info!(
        "Loaded {} ingredients ({} new, {} already present)",
        seeds.len(),
        inserted,
        skipped
    );
    Ok(())
}
