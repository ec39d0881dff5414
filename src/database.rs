// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! Persistence for legacy profiles, migrated profiles and migration
//! snapshots. The calculation core never touches storage; callers go through
//! the [`ProfileStore`] trait.

use crate::logging::AppLogger;
use crate::migration::MigrationSnapshot;
use crate::models::{LegacyUserProfile, UserProfileExtended};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::Path;
use uuid::Uuid;

/// Storage used by the migration tooling
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// All legacy profiles in insertion order
    async fn load_legacy_profiles(&self) -> Result<Vec<LegacyUserProfile>>;

    /// Replace the legacy profiles with `profiles`; used for rollback
    async fn restore_legacy_profiles(&self, profiles: &[LegacyUserProfile]) -> Result<usize>;

    /// Insert or update migrated profiles keyed by `user_id`
    async fn save_migrated_profiles(&self, profiles: &[UserProfileExtended]) -> Result<usize>;

    async fn save_snapshot(&self, snapshot: &MigrationSnapshot) -> Result<()>;

    async fn load_snapshot(&self, id: Uuid) -> Result<Option<MigrationSnapshot>>;
}

/// SQLite-backed profile store
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options =
            if database_url.starts_with("sqlite:") && !database_url.contains(":memory:") {
                ensure_parent_dir(database_url)?;
                let separator = if database_url.contains('?') { '&' } else { '?' };
                format!("{database_url}{separator}mode=rwc")
            } else {
                database_url.to_string()
            };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS legacy_profiles (
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migration_snapshots (
                id TEXT PRIMARY KEY,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Cheap connectivity check used by the readiness probe
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Store one legacy profile, returning its row key
    ///
    /// Profiles without an id get a generated key; the stored payload is
    /// left as given.
    pub async fn insert_legacy_profile(&self, profile: &LegacyUserProfile) -> Result<String> {
        let key = profile
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let payload = serde_json::to_string(profile)?;

        sqlx::query("INSERT INTO legacy_profiles (id, payload, created_at) VALUES (?1, ?2, ?3)")
            .bind(&key)
            .bind(payload)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(key)
    }

    /// Get a migrated profile by user id
    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfileExtended>> {
        let row = sqlx::query("SELECT payload FROM user_profiles WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let payload: String = row.try_get("payload")?;
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }
}

/// Filesystem path of a SQLite URL, following sqlx's parsing: `sqlite://`
/// or `sqlite:` prefix, query string ignored
fn sqlite_file_path(database_url: &str) -> &Path {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = rest.split('?').next().unwrap_or(rest);
    Path::new(path)
}

fn ensure_parent_dir(database_url: &str) -> Result<()> {
    match sqlite_file_path(database_url).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display())),
        _ => Ok(()),
    }
}

#[async_trait]
impl ProfileStore for Database {
    async fn load_legacy_profiles(&self) -> Result<Vec<LegacyUserProfile>> {
        let rows = sqlx::query("SELECT id, payload FROM legacy_profiles ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        let mut profiles = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let payload: String = row.try_get("payload")?;
            let profile = serde_json::from_str(&payload)
                .with_context(|| format!("Corrupt legacy profile payload for {}", id))?;
            profiles.push(profile);
        }

        AppLogger::log_store_operation("load", "legacy_profiles", profiles.len(), true);
        Ok(profiles)
    }

    async fn restore_legacy_profiles(&self, profiles: &[LegacyUserProfile]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM legacy_profiles")
            .execute(&mut *tx)
            .await?;

        let now = Utc::now().to_rfc3339();
        for profile in profiles {
            let key = profile
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            sqlx::query(
                "INSERT INTO legacy_profiles (id, payload, created_at) VALUES (?1, ?2, ?3)",
            )
            .bind(key)
            .bind(serde_json::to_string(profile)?)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        AppLogger::log_store_operation("restore", "legacy_profiles", profiles.len(), true);
        Ok(profiles.len())
    }

    async fn save_migrated_profiles(&self, profiles: &[UserProfileExtended]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        for profile in profiles {
            sqlx::query(
                r#"
                INSERT INTO user_profiles (user_id, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&profile.user_id)
            .bind(serde_json::to_string(profile)?)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        AppLogger::log_store_operation("upsert", "user_profiles", profiles.len(), true);
        Ok(profiles.len())
    }

    async fn save_snapshot(&self, snapshot: &MigrationSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO migration_snapshots (id, reason, created_at, payload)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(snapshot.id.to_string())
        .bind(&snapshot.reason)
        .bind(snapshot.created_at.to_rfc3339())
        .bind(serde_json::to_string(&snapshot.profiles)?)
        .execute(&self.pool)
        .await?;

        AppLogger::log_store_operation("insert", "migration_snapshots", 1, true);
        Ok(())
    }

    async fn load_snapshot(&self, id: Uuid) -> Result<Option<MigrationSnapshot>> {
        let row = sqlx::query(
            "SELECT id, reason, created_at, payload FROM migration_snapshots WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let reason: String = row.try_get("reason")?;
        let created_at_str: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)?.with_timezone(&Utc);
        let payload: String = row.try_get("payload")?;

        Ok(Some(MigrationSnapshot {
            id,
            created_at,
            reason,
            profiles: serde_json::from_str(&payload)
                .with_context(|| format!("Corrupt snapshot payload for {}", id))?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::create_migration_snapshot;
    use crate::models::LegacyPersonalMetrics;

    async fn create_test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn legacy(id: Option<&str>, height: f64) -> LegacyUserProfile {
        LegacyUserProfile {
            id: id.map(str::to_string),
            personal_metrics: Some(LegacyPersonalMetrics {
                height: Some(height),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(sqlite_file_path("sqlite:./data/x.db"), Path::new("./data/x.db"));
        assert_eq!(sqlite_file_path("sqlite://data/x.db"), Path::new("data/x.db"));
        assert_eq!(sqlite_file_path("sqlite:///var/lib/x.db"), Path::new("/var/lib/x.db"));
        assert_eq!(sqlite_file_path("sqlite:data/x.db?cache=shared"), Path::new("data/x.db"));
    }

    #[tokio::test]
    async fn test_double_slash_url_creates_nested_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("profiles.db");
        let url = format!("sqlite://{}", db_path.display());

        let db = Database::new(&url).await.unwrap();
        db.ping().await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_legacy_profiles_keep_insertion_order() {
        let db = create_test_db().await;

        db.insert_legacy_profile(&legacy(Some("b"), 170.0)).await.unwrap();
        let generated = db.insert_legacy_profile(&legacy(None, 160.0)).await.unwrap();
        db.insert_legacy_profile(&legacy(Some("a"), 180.0)).await.unwrap();

        assert!(Uuid::parse_str(&generated).is_ok());

        let loaded = db.load_legacy_profiles().await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].id.as_deref(), Some("b"));
        assert_eq!(loaded[1].id, None);
        assert_eq!(loaded[2].id.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_save_migrated_profiles_upserts() {
        let db = create_test_db().await;

        let mut profile = UserProfileExtended {
            user_id: "user-1".to_string(),
            height: Some(170.0),
            ..Default::default()
        };
        assert_eq!(db.save_migrated_profiles(&[profile.clone()]).await.unwrap(), 1);

        profile.height = Some(171.0);
        db.save_migrated_profiles(&[profile]).await.unwrap();

        let stored = db.get_user_profile("user-1").await.unwrap().unwrap();
        assert_eq!(stored.height, Some(171.0));
        assert!(db.get_user_profile("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_and_restore() {
        let db = create_test_db().await;
        let originals = vec![legacy(Some("p1"), 165.0), legacy(Some("p2"), 190.0)];
        for profile in &originals {
            db.insert_legacy_profile(profile).await.unwrap();
        }

        let snapshot = create_migration_snapshot(&originals, "pre-migration backup");
        db.save_snapshot(&snapshot).await.unwrap();

        db.restore_legacy_profiles(&[legacy(Some("p3"), 150.0)]).await.unwrap();
        assert_eq!(db.load_legacy_profiles().await.unwrap().len(), 1);

        let loaded = db.load_snapshot(snapshot.id).await.unwrap().unwrap();
        assert_eq!(loaded.reason, "pre-migration backup");
        assert_eq!(loaded.profiles, originals);

        db.restore_legacy_profiles(&loaded.profiles).await.unwrap();
        assert_eq!(db.load_legacy_profiles().await.unwrap(), originals);

        assert!(db.load_snapshot(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let db = create_test_db().await;
        assert!(db.ping().await.is_ok());
    }
}
