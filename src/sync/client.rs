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


//! HTTP client for the optional cloud sync backend
//!
//! The backend stores one JSON snapshot per (username, collection) and
//! resolves nothing: conflicting writes are last-write-wins on the envelope
//! timestamp, and every caller here treats failures as best-effort.

use crate::error::{BookFlowError, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Named collections synced as whole snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Books,
    Shelves,
    Challenge,
    Friends,
    SharedItems,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Books => "books",
            Collection::Shelves => "shelves",
            Collection::Challenge => "challenge",
            Collection::Friends => "friends",
            Collection::SharedItems => "shared-items",
        }
    }

    /// Pull order matters: shelves before books, so restored membership
    /// can resolve shelf uids.
    pub fn all() -> [Collection; 5] {
        [
            Collection::Shelves,
            Collection::Books,
            Collection::Challenge,
            Collection::Friends,
            Collection::SharedItems,
        ]
    }
}

/// Snapshot envelope stored per (username, collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub username: String,
    pub collection: Collection,
    pub updated_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Last-write-wins decision for a pulled snapshot
///
/// The local side of the comparison is the newest row timestamp in the local
/// collection (None when the collection is empty, which always loses).
pub fn remote_wins(local_updated_at: Option<DateTime<Utc>>, remote: &SnapshotEnvelope) -> bool {
    match local_updated_at {
        Some(local) => remote.updated_at > local,
        None => true,
    }
}

/// Configuration for SyncClient
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend base URL, e.g. "https://sync.example.com"
    pub base_url: String,
    /// API key sent as a bearer token, if the deployment requires one
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// HTTP client for the sync backend
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: Client,
    config: SyncConfig,
}

impl SyncClient {
    pub fn new(config: SyncConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| BookFlowError::ConfigurationError(format!("Invalid API key: {}", e)))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn snapshot_url(&self, username: &str, collection: Collection) -> String {
        format!(
            "{}/snapshots/{}/{}",
            self.config.base_url,
            urlencoding::encode(username),
            collection.as_str()
        )
    }

    /// Push a snapshot envelope, overwriting whatever the backend holds
    pub async fn push_snapshot(&self, envelope: &SnapshotEnvelope) -> Result<()> {
        let url = self.snapshot_url(&envelope.username, envelope.collection);
        let response = self.client.put(&url).json(envelope).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookFlowError::sync_failed(
                format!("HTTP {}", status),
                Some(status.as_u16()),
                Some(envelope.collection.as_str().to_string()),
            ));
        }

        Ok(())
    }

    /// Pull the snapshot envelope for (username, collection)
    ///
    /// Returns None when the backend has never seen this collection.
    pub async fn pull_snapshot(
        &self,
        username: &str,
        collection: Collection,
    ) -> Result<Option<SnapshotEnvelope>> {
        let url = self.snapshot_url(username, collection);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BookFlowError::sync_failed(
                format!("HTTP {}", status),
                Some(status.as_u16()),
                Some(collection.as_str().to_string()),
            ));
        }

        let envelope = response
            .json::<SnapshotEnvelope>()
            .await
            .map_err(|e| BookFlowError::InvalidSnapshot(e.to_string()))?;

        Ok(Some(envelope))
    }

    /// Mirror a friend-request state change to the backend
    pub async fn post_friend_request(
        &self,
        from: &str,
        to: &str,
        state: &str,
    ) -> Result<()> {
        let url = format!("{}/friend-requests", self.config.base_url);
        let body = serde_json::json!({ "from": from, "to": to, "state": state });
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookFlowError::sync_failed(
                format!("HTTP {}", status),
                Some(status.as_u16()),
                Some("friend-requests".to_string()),
            ));
        }

        Ok(())
    }

    /// Deliver a shared book snapshot to a buddy's remote inbox
    pub async fn post_shared_item(
        &self,
        recipient: &str,
        sender: &str,
        book_snapshot: &serde_json::Value,
    ) -> Result<()> {
        let url = format!("{}/shared-items", self.config.base_url);
        let body = serde_json::json!({
            "recipient": recipient,
            "sender": sender,
            "book": book_snapshot,
        });
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookFlowError::sync_failed(
                format!("HTTP {}", status),
                Some(status.as_u16()),
                Some("shared-items".to_string()),
            ));
        }

        Ok(())
    }

    /// Ask the backend's edge function to delete the account server-side
    ///
    /// Local rows are wiped by the caller only after this succeeds.
    pub async fn delete_account(&self, username: &str) -> Result<()> {
        let url = format!("{}/functions/delete-account", self.config.base_url);
        let body = serde_json::json!({ "username": username });
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookFlowError::AccountDeletionFailed(format!(
                "HTTP {}",
                status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn envelope(updated_at: DateTime<Utc>) -> SnapshotEnvelope {
        SnapshotEnvelope {
            username: "alice".to_string(),
            collection: Collection::Books,
            updated_at,
            payload: serde_json::json!([]),
        }
    }

    #[test]
    fn test_remote_wins_is_strictly_newer() {
        let t1 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 1).unwrap();

        assert!(remote_wins(None, &envelope(t1)));
        assert!(remote_wins(Some(t1), &envelope(t2)));
        // Equal timestamps keep local
        assert!(!remote_wins(Some(t1), &envelope(t1)));
        assert!(!remote_wins(Some(t2), &envelope(t1)));
    }

    #[test]
    fn test_collection_identifiers() {
        assert_eq!(Collection::SharedItems.as_str(), "shared-items");
        // Pull order: shelves strictly before books
        let order = Collection::all();
        let shelves_pos = order.iter().position(|c| *c == Collection::Shelves).unwrap();
        let books_pos = order.iter().position(|c| *c == Collection::Books).unwrap();
        assert!(shelves_pos < books_pos);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = SyncConfig::new("https://sync.example.com/");
        assert_eq!(config.base_url, "https://sync.example.com");
    }

    #[test]
    fn test_envelope_round_trip() {
        let env = envelope(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains("\"collection\":\"books\""));
        let decoded: SnapshotEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.collection, Collection::Books);
    }
}
