// BookFlow - Personal Reading Tracker
// Copyright (C) 2025 BookFlow contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Profile storage operations
//!
//! Functions for saving and retrieving local user profiles from SQLite.
//! Settings are stored as JSON in the database for flexibility.

use crate::error::{BookFlowError, Result};
use sqlx::SqlitePool;

/// Save or update a profile in the database
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `username` - Local username (primary key)
/// * `profile_json` - Complete profile JSON (display name, settings)
///
/// Also ensures the user's three system shelves exist.
pub async fn save_profile(
    pool: &SqlitePool,
    username: &str,
    profile_json: &str,
) -> Result<()> {
    let profile: serde_json::Value = serde_json::from_str(profile_json)
        .map_err(|e| BookFlowError::InvalidInput(format!("Invalid profile JSON: {}", e)))?;

    let display_name = profile["display_name"].as_str().unwrap_or(username);
    let settings_json = profile
        .get("settings")
        .map(|s| s.to_string())
        .unwrap_or_else(|| "{}".to_string());

    sqlx::query(
        r#"
        INSERT INTO Profiles (username, display_name, settings_json)
        VALUES (?, ?, ?)
        ON CONFLICT(username) DO UPDATE SET
            display_name = excluded.display_name,
            settings_json = excluded.settings_json,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(username)
    .bind(display_name)
    .bind(&settings_json)
    .execute(pool)
    .await?;

    crate::storage::queries::ensure_system_shelves(pool, username).await?;

    Ok(())
}

/// Get a profile from the database by username
///
/// Returns the complete profile JSON or None if not found.
pub async fn get_profile(pool: &SqlitePool, username: &str) -> Result<Option<String>> {
    let row: Option<(String, Option<String>, String)> = sqlx::query_as(
        r#"
        SELECT username, display_name, settings_json
        FROM Profiles
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    if let Some((name, display_name, settings_json)) = row {
        let settings: serde_json::Value = serde_json::from_str(&settings_json)
            .map_err(|e| BookFlowError::InvalidState(format!("Corrupt settings JSON in database: {}", e)))?;

        let profile = serde_json::json!({
            "username": name,
            "display_name": display_name,
            "settings": settings,
        });

        Ok(Some(serde_json::to_string(&profile)?))
    } else {
        Ok(None)
    }
}

/// Get primary profile (first profile in database)
///
/// Returns the complete profile JSON or None if no profiles exist.
pub async fn get_primary_profile(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT username
        FROM Profiles
        ORDER BY created_at ASC, username ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    if let Some((username,)) = row {
        get_profile(pool, &username).await
    } else {
        Ok(None)
    }
}

/// List all local usernames
pub async fn list_usernames(pool: &SqlitePool) -> Result<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT username FROM Profiles ORDER BY created_at, username")
        .fetch_all(pool)
        .await?;

    Ok(names)
}

/// Delete a profile from the database
///
/// Only removes the profile row; use [`crate::storage::queries::wipe_user_data`]
/// for a full account wipe.
pub async fn delete_profile(pool: &SqlitePool, username: &str) -> Result<()> {
    sqlx::query("DELETE FROM Profiles WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    #[tokio::test]
    async fn test_save_and_get_profile() {
        let db = Database::new_in_memory().await.unwrap();

        let profile_json = r#"{
            "username": "alice",
            "display_name": "Alice",
            "settings": {"theme": "dark", "default_shelf_sort": "title"}
        }"#;

        save_profile(db.pool(), "alice", profile_json).await.unwrap();

        let retrieved = get_profile(db.pool(), "alice")
            .await
            .unwrap()
            .expect("Profile not found");

        let retrieved_json: serde_json::Value = serde_json::from_str(&retrieved).unwrap();
        assert_eq!(retrieved_json["username"], "alice");
        assert_eq!(retrieved_json["settings"]["theme"], "dark");

        // Saving a profile provisions the system shelves
        let shelves = crate::storage::queries::list_shelves(db.pool(), "alice")
            .await
            .unwrap();
        assert_eq!(shelves.iter().filter(|s| s.is_system).count(), 3);
    }

    #[tokio::test]
    async fn test_get_primary_profile() {
        let db = Database::new_in_memory().await.unwrap();

        save_profile(db.pool(), "first", r#"{"display_name": "First"}"#).await.unwrap();
        save_profile(db.pool(), "second", r#"{"display_name": "Second"}"#).await.unwrap();

        let primary = get_primary_profile(db.pool()).await.unwrap().unwrap();
        let primary_json: serde_json::Value = serde_json::from_str(&primary).unwrap();
        assert_eq!(primary_json["username"], "first");
    }
}
