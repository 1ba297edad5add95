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


//! Open Library search API
//!
//! **Endpoint:** `GET https://openlibrary.org/search.json?q={query}`
//!
//! Search results are work-level documents. Descriptions are not part of the
//! search payload, so they stay empty here; covers resolve through the
//! separate covers host by numeric cover id.

use crate::api::client::SearchClient;
use crate::api::{BookMetadata, Provider};
use crate::error::Result;
use serde::Deserialize;

const BASE_URL: &str = "https://openlibrary.org/search.json";
const COVERS_URL: &str = "https://covers.openlibrary.org/b/id";

/// Top-level search response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub docs: Vec<WorkDoc>,
    #[serde(rename = "numFound", default)]
    pub num_found: i64,
}

/// One work-level document
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorkDoc {
    /// "/works/OL27448W"
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "author_name", default)]
    pub author_name: Vec<String>,
    #[serde(rename = "first_publish_year", default)]
    pub first_publish_year: Option<i32>,
    #[serde(rename = "number_of_pages_median", default)]
    pub number_of_pages_median: Option<i32>,
    #[serde(rename = "cover_i", default)]
    pub cover_i: Option<i64>,
}

/// Build the search URL for a query
pub fn search_url(query: &str, limit: usize) -> String {
    format!(
        "{}?q={}&limit={}&fields=key,title,author_name,first_publish_year,number_of_pages_median,cover_i",
        BASE_URL,
        urlencoding::encode(query),
        limit.min(100)
    )
}

/// Medium-size cover URL for a cover id
pub fn cover_url(cover_id: i64) -> String {
    format!("{}/{}-M.jpg", COVERS_URL, cover_id)
}

/// Convert a parsed response into the shared metadata shape
pub fn parse_response(response: SearchResponse) -> Vec<BookMetadata> {
    response
        .docs
        .into_iter()
        .filter_map(|doc| {
            let title = doc.title.filter(|t| !t.is_empty())?;
            let key = doc.key?;

            Some(BookMetadata {
                title,
                authors: doc.author_name,
                published_year: doc.first_publish_year,
                description: String::new(),
                page_count: doc.number_of_pages_median.filter(|&p| p > 0),
                cover_url: doc.cover_i.map(cover_url),
                series_name: None,
                series_number: None,
                provider: Provider::OpenLibrary,
                // Strip the "/works/" prefix; the bare id round-trips better
                provider_id: key.trim_start_matches("/works/").to_string(),
            })
        })
        .collect()
}

/// Search Open Library
pub async fn search(client: &SearchClient, query: &str, limit: usize) -> Result<Vec<BookMetadata>> {
    let url = search_url(query, limit);
    let body = client.get_json(&url, Provider::OpenLibrary.as_str()).await?;
    let response: SearchResponse = serde_json::from_value(body)?;
    Ok(parse_response(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "numFound": 1,
        "docs": [
            {
                "key": "/works/OL27448W",
                "title": "The Lord of the Rings",
                "author_name": ["J.R.R. Tolkien"],
                "first_publish_year": 1954,
                "number_of_pages_median": 1193,
                "cover_i": 9255566
            },
            {
                "title": "Orphan record without a key"
            }
        ]
    }"#;

    #[test]
    fn test_parse_response() {
        let response: SearchResponse = serde_json::from_str(FIXTURE).unwrap();
        let results = parse_response(response);

        assert_eq!(results.len(), 1);

        let meta = &results[0];
        assert_eq!(meta.title, "The Lord of the Rings");
        assert_eq!(meta.provider_id, "OL27448W");
        assert_eq!(meta.published_year, Some(1954));
        assert_eq!(meta.page_count, Some(1193));
        assert_eq!(
            meta.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/9255566-M.jpg")
        );
        assert_eq!(meta.provider, Provider::OpenLibrary);
    }

    #[test]
    fn test_search_url() {
        let url = search_url("tolkien", 5);
        assert!(url.starts_with("https://openlibrary.org/search.json?q=tolkien"));
        assert!(url.contains("limit=5"));
    }
}
