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


//! Google Books volumes API
//!
//! **Endpoint:** `GET https://www.googleapis.com/books/v1/volumes?q={query}`
//!
//! Responses use camelCase field names; only the subset of `volumeInfo` that
//! maps onto [`BookMetadata`] is modelled here.

use crate::api::client::SearchClient;
use crate::api::{BookMetadata, Provider};
use crate::error::Result;
use crate::shelf::parse_series_number;
use serde::Deserialize;

const BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Top-level volumes response
#[derive(Debug, Clone, Deserialize)]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Vec<Volume>,
    #[serde(rename = "totalItems", default)]
    pub total_items: i64,
}

/// One volume in the search results
#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(rename = "volumeInfo")]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    /// "2021", "2021-03" or "2021-03-16"
    #[serde(rename = "publishedDate", default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "pageCount", default)]
    pub page_count: Option<i32>,
    #[serde(rename = "imageLinks", default)]
    pub image_links: Option<ImageLinks>,
    #[serde(rename = "seriesInfo", default)]
    pub series_info: Option<SeriesInfo>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ImageLinks {
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail", default)]
    pub small_thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeriesInfo {
    #[serde(rename = "bookDisplayNumber", default)]
    pub book_display_number: Option<String>,
    #[serde(rename = "volumeSeries", default)]
    pub volume_series: Vec<VolumeSeries>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VolumeSeries {
    #[serde(rename = "seriesId", default)]
    pub series_id: Option<String>,
}

/// Build the search URL for a query
pub fn search_url(query: &str, limit: usize) -> String {
    format!(
        "{}?q={}&maxResults={}&printType=books",
        BASE_URL,
        urlencoding::encode(query),
        limit.min(40)
    )
}

/// Convert a parsed response into the shared metadata shape
///
/// Volumes without a title are skipped; Google occasionally returns stub
/// records for withdrawn listings.
pub fn parse_response(response: VolumesResponse) -> Vec<BookMetadata> {
    response
        .items
        .into_iter()
        .filter_map(|volume| {
            let info = volume.volume_info;
            let title = info.title.filter(|t| !t.is_empty())?;

            let cover_url = info
                .image_links
                .as_ref()
                .and_then(|links| links.thumbnail.clone().or_else(|| links.small_thumbnail.clone()))
                // Covers come back as plain http; upgrade for clients that refuse it
                .map(|url| url.replacen("http://", "https://", 1));

            let series_number = info
                .series_info
                .as_ref()
                .and_then(|s| s.book_display_number.as_deref())
                .map(parse_series_number);

            Some(BookMetadata {
                title,
                authors: info.authors,
                published_year: info
                    .published_date
                    .as_deref()
                    .and_then(|d| d.get(0..4))
                    .and_then(|y| y.parse::<i32>().ok()),
                description: info.description.unwrap_or_default(),
                page_count: info.page_count.filter(|&p| p > 0),
                cover_url,
                series_name: None,
                series_number,
                provider: Provider::GoogleBooks,
                provider_id: volume.id,
            })
        })
        .collect()
}

/// Search Google Books
pub async fn search(client: &SearchClient, query: &str, limit: usize) -> Result<Vec<BookMetadata>> {
    let url = search_url(query, limit);
    let body = client.get_json(&url, Provider::GoogleBooks.as_str()).await?;
    let response: VolumesResponse = serde_json::from_value(body)?;
    Ok(parse_response(response))
}
