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


//! iTunes Search API (ebooks)
//!
//! **Endpoint:** `GET https://itunes.apple.com/search?media=ebook&term={query}`
//!
//! iTunes has no page counts for ebooks; descriptions arrive as HTML, which
//! is kept verbatim for the presentation layer to sanitize.

use crate::api::client::SearchClient;
use crate::api::{BookMetadata, Provider};
use crate::error::Result;
use serde::Deserialize;

const BASE_URL: &str = "https://itunes.apple.com/search";

/// Top-level search response
#[derive(Debug, Clone, Deserialize)]
pub struct ItunesResponse {
    #[serde(rename = "resultCount", default)]
    pub result_count: i64,
    #[serde(default)]
    pub results: Vec<ItunesBook>,
}

/// One ebook result
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ItunesBook {
    #[serde(rename = "trackId", default)]
    pub track_id: Option<i64>,
    #[serde(rename = "trackName", default)]
    pub track_name: Option<String>,
    #[serde(rename = "artistName", default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// "2011-03-24T07:00:00Z"
    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<String>,
    #[serde(rename = "artworkUrl100", default)]
    pub artwork_url_100: Option<String>,
}

/// Build the search URL for a query
pub fn search_url(query: &str, limit: usize) -> String {
    format!(
        "{}?media=ebook&term={}&limit={}",
        BASE_URL,
        urlencoding::encode(query),
        limit.min(200)
    )
}

/// Convert a parsed response into the shared metadata shape
pub fn parse_response(response: ItunesResponse) -> Vec<BookMetadata> {
    response
        .results
        .into_iter()
        .filter_map(|book| {
            let title = book.track_name.filter(|t| !t.is_empty())?;
            let track_id = book.track_id?;

            Some(BookMetadata {
                title,
                authors: book.artist_name.into_iter().collect(),
                published_year: book
                    .release_date
                    .as_deref()
                    .and_then(|d| d.get(0..4))
                    .and_then(|y| y.parse::<i32>().ok()),
                description: book.description.unwrap_or_default(),
                page_count: None,
                // 100px artwork scales up; the store serves larger variants
                cover_url: book
                    .artwork_url_100
                    .map(|url| url.replace("100x100", "600x600")),
                series_name: None,
                series_number: None,
                provider: Provider::Itunes,
                provider_id: track_id.to_string(),
            })
        })
        .collect()
}

/// Search the iTunes ebook store
pub async fn search(client: &SearchClient, query: &str, limit: usize) -> Result<Vec<BookMetadata>> {
    let url = search_url(query, limit);
    let body = client.get_json(&url, Provider::Itunes.as_str()).await?;
    let response: ItunesResponse = serde_json::from_value(body)?;
    Ok(parse_response(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "resultCount": 1,
        "results": [
            {
                "trackId": 420798397,
                "trackName": "The Name of the Wind",
                "artistName": "Patrick Rothfuss",
                "description": "<p>My name is Kvothe.</p>",
                "releaseDate": "2007-03-27T07:00:00Z",
                "artworkUrl100": "https://is1-ssl.mzstatic.com/image/thumb/x/100x100bb.jpg"
            },
            {
                "trackName": "No track id"
            }
        ]
    }"#;

    #[test]
    fn test_parse_response() {
        let response: ItunesResponse = serde_json::from_str(FIXTURE).unwrap();
        let results = parse_response(response);

        assert_eq!(results.len(), 1);

        let meta = &results[0];
        assert_eq!(meta.title, "The Name of the Wind");
        assert_eq!(meta.authors, vec!["Patrick Rothfuss".to_string()]);
        assert_eq!(meta.published_year, Some(2007));
        assert_eq!(meta.provider_id, "420798397");
        assert_eq!(meta.page_count, None);
        assert!(meta.cover_url.as_deref().unwrap().contains("600x600"));
    }

    #[test]
    fn test_search_url() {
        let url = search_url("name of the wind", 25);
        assert!(url.contains("media=ebook"));
        assert!(url.contains("term=name%20of%20the%20wind"));
        assert!(url.contains("limit=25"));
    }
}
