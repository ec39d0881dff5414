// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Profile Migration Tool
//!
//! Migrates legacy profiles to the extended profile format.
//!
//! Usage:
//!   migrate-profiles --dry-run --input legacy.json
//!   migrate-profiles --backup --database-url sqlite:./data/profiles.db
//!   migrate-profiles --restore <snapshot-id>

use anyhow::{Context, Result};
use clap::Parser;
use nutrition_engine::{
    config::NutritionConfig,
    constants::env_config,
    database::{Database, ProfileStore},
    logging::{AppLogger, LoggingConfig},
    migration::{
        create_migration_snapshot, decode_legacy_profiles, restore_from_snapshot,
        MigrationOptions, ProfileMigrator,
    },
    models::{LegacyUserProfile, UserProfileExtended},
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "migrate-profiles")]
#[command(about = "Migrate legacy user profiles to the extended profile format")]
pub struct Args {
    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Fail profiles that do not pass validation after migration
    #[arg(long)]
    strict: bool,

    /// Snapshot the legacy profiles before migrating
    #[arg(long)]
    backup: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Read legacy profiles from a JSON array instead of the database
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Database URL (SQLite)
    #[arg(short, long)]
    database_url: Option<String>,

    /// Nutrition configuration file providing the migration defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Restore the legacy profiles saved in a snapshot and exit
    #[arg(long, conflicts_with_all = ["dry_run", "input", "backup"])]
    restore: Option<Uuid>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    LoggingConfig::for_cli(args.verbose).init()?;

    let database_url = args.database_url.clone().unwrap_or_else(env_config::database_url);

    if let Some(snapshot_id) = args.restore {
        let database = Database::new(&database_url).await?;
        return restore(&database, snapshot_id).await;
    }

    let migrator = ProfileMigrator::new(NutritionConfig::load(args.config.clone())?);
    let options = MigrationOptions {
        strict: args.strict,
        validate: true,
    };

    // Dry runs on file input never touch the database
    let database = if args.dry_run && args.input.is_some() {
        None
    } else {
        Some(Database::new(&database_url).await?)
    };

    let records: Vec<Value> = match (&args.input, &database) {
        (Some(path), _) => read_records(path)?,
        (None, Some(database)) => database
            .load_legacy_profiles()
            .await?
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<Value>>>()?,
        (None, None) => Vec::new(),
    };
    info!("Loaded {} legacy profiles", records.len());

    if args.backup && !args.dry_run {
        if let Some(database) = &database {
            let profiles: Vec<LegacyUserProfile> = decode_legacy_profiles(&records)
                .into_iter()
                .filter_map(Result::ok)
                .collect();
            let snapshot = create_migration_snapshot(&profiles, "pre-migration backup");
            database.save_snapshot(&snapshot).await?;
            info!("Snapshot {} saved", snapshot.id);
        }
    }

    let batch = migrator.batch_migrate_records(&records, &options);
    for (record, result) in records.iter().zip(&batch.results) {
        AppLogger::log_migration(
            record.get("id").and_then(Value::as_str).unwrap_or("<unknown>"),
            result.success,
            result.warnings.len(),
            result.errors.len(),
        );
    }

    info!(
        total = batch.total,
        successful = batch.successful,
        failed = batch.failed,
        fully_valid = batch.fully_valid,
        average_completion = batch.average_completion,
        "Migration finished"
    );

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    let migrated: Vec<UserProfileExtended> = batch
        .results
        .iter()
        .filter_map(|r| r.migrated_profile.clone())
        .collect();

    if let Some(database) = &database {
        let saved = database.save_migrated_profiles(&migrated).await?;
        info!("Saved {} migrated profiles", saved);
    }

    if batch.failed > 0 {
        warn!("{} profiles could not be migrated", batch.failed);
    }

    Ok(())
}

/// Read the input file as an array of raw records; records are decoded one
/// by one during migration
fn read_records(path: &PathBuf) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Input file is not a JSON array: {}", path.display()))
}

async fn restore(database: &Database, snapshot_id: Uuid) -> Result<()> {
    let snapshot = database
        .load_snapshot(snapshot_id)
        .await?
        .with_context(|| format!("Snapshot not found: {}", snapshot_id))?;

    let profiles = restore_from_snapshot(&snapshot);
    let restored = database.restore_legacy_profiles(&profiles).await?;
    info!(
        "Restored {} legacy profiles from snapshot {} ({})",
        restored, snapshot.id, snapshot.reason
    );
    Ok(())
}
