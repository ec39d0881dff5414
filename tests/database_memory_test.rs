// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Profile store tests: in-memory isolation and file-backed persistence

use anyhow::Result;
use nutrition_engine::database::{Database, ProfileStore};
use nutrition_engine::models::{LegacyPersonalMetrics, LegacyUserProfile, UserProfileExtended};
use std::fs;
use tempfile::TempDir;

fn legacy(id: &str) -> LegacyUserProfile {
    LegacyUserProfile {
        id: Some(id.to_string()),
        email: Some(format!("{id}@example.com")),
        personal_metrics: Some(LegacyPersonalMetrics {
            height: Some(172.0),
            weight: Some(68.0),
            age: Some(29),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_memory_database_no_physical_files() -> Result<()> {
    let database = Database::new("sqlite::memory:").await?;

    let current_dir = std::env::current_dir()?;
    for entry in fs::read_dir(&current_dir)? {
        let filename = entry?.file_name();
        let filename_str = filename.to_string_lossy();

        if filename_str.starts_with("sqlite::memory:") || filename_str.starts_with(":memory:") {
            panic!("Found physical file with memory database URL: {}", filename_str);
        }
    }

    database.insert_legacy_profile(&legacy("memory-user")).await?;
    let loaded = database.load_legacy_profiles().await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].email.as_deref(), Some("memory-user@example.com"));

    Ok(())
}

#[tokio::test]
async fn test_multiple_memory_databases_isolated() -> Result<()> {
    let database1 = Database::new("sqlite::memory:").await?;
    let database2 = Database::new("sqlite::memory:").await?;

    database1.insert_legacy_profile(&legacy("user-1")).await?;
    database2.insert_legacy_profile(&legacy("user-2")).await?;
    database2.insert_legacy_profile(&legacy("user-3")).await?;

    let profiles1 = database1.load_legacy_profiles().await?;
    let profiles2 = database2.load_legacy_profiles().await?;

    assert_eq!(profiles1.len(), 1);
    assert_eq!(profiles1[0].id.as_deref(), Some("user-1"));
    assert_eq!(profiles2.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_file_database_persists_across_connections() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("nested").join("profiles.db");
    let database_url = format!("sqlite:{}", db_path.display());

    {
        let database = Database::new(&database_url).await?;
        let profile = UserProfileExtended {
            user_id: "persisted".to_string(),
            weight: Some(81.5),
            ..Default::default()
        };
        database.save_migrated_profiles(&[profile]).await?;
    }

    assert!(db_path.exists());

    let reopened = Database::new(&database_url).await?;
    let stored = reopened.get_user_profile("persisted").await?;
    assert_eq!(stored.and_then(|p| p.weight), Some(81.5));

    Ok(())
}
