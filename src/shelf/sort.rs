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


//! Multi-key sort comparators and series grouping
//!
//! Comparators are deterministic: every key falls through a fixed tie-breaker
//! chain (title, then first author) and finally the stable `book_uid`, so two
//! sorts of the same shelf always agree.

use crate::storage::models::Book;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    /// First decimal number in a series-order string ("Book 3" -> 3, "2.5" -> 2.5)
    static ref SERIES_NUMBER: Regex = Regex::new(r"(\d+(?:\.\d+)?)").expect("valid regex");
}

/// Sort key for shelf views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Author,
    /// Series name, then numeric series number
    Series,
    DateAdded,
    Rating,
    PageCount,
    /// Manual ordering hint (`sort_hint`), unhinted books last
    Manual,
}

impl SortKey {
    /// Direction users expect when none is given
    pub fn default_direction(&self) -> SortDirection {
        match self {
            SortKey::Rating => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    /// Parse a key identifier ("title", "author", "series", ...)
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "title" => Some(SortKey::Title),
            "author" => Some(SortKey::Author),
            "series" => Some(SortKey::Series),
            "date-added" => Some(SortKey::DateAdded),
            "rating" => Some(SortKey::Rating),
            "pages" => Some(SortKey::PageCount),
            "manual" => Some(SortKey::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Title key with case folded and a leading article dropped
///
/// "The Left Hand of Darkness" sorts under L, matching how shelf screens
/// alphabetize.
pub fn title_sort_key(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = lowered.strip_prefix(article) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    lowered
}

/// Extract a numeric series number from a free-form order string
///
/// Returns 0.0 when no number is present.
pub fn parse_series_number(order: &str) -> f32 {
    SERIES_NUMBER
        .captures(order)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// Compare two books under a sort key and direction
///
/// Direction flips only the primary key; the tie-breaker chain stays
/// ascending so near-equal books keep a stable relative order.
pub fn compare_books(a: &Book, b: &Book, key: SortKey, direction: SortDirection) -> Ordering {
    let primary = primary_ordering(a, b, key);
    let primary = match direction {
        SortDirection::Ascending => primary,
        SortDirection::Descending => primary.reverse(),
    };

    primary
        .then_with(|| title_sort_key(&a.title).cmp(&title_sort_key(&b.title)))
        .then_with(|| {
            a.first_author()
                .unwrap_or_default()
                .to_lowercase()
                .cmp(&b.first_author().unwrap_or_default().to_lowercase())
        })
        .then_with(|| a.book_uid.cmp(&b.book_uid))
}

fn primary_ordering(a: &Book, b: &Book, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => title_sort_key(&a.title).cmp(&title_sort_key(&b.title)),
        SortKey::Author => a
            .first_author()
            .map(|s| s.to_lowercase())
            .cmp(&b.first_author().map(|s| s.to_lowercase())),
        SortKey::Series => {
            let series = a
                .series_name
                .as_deref()
                .map(str::to_lowercase)
                .cmp(&b.series_name.as_deref().map(str::to_lowercase));
            series.then_with(|| cmp_f32(a.series_number, b.series_number))
        }
        SortKey::DateAdded => a.created_at.cmp(&b.created_at),
        SortKey::Rating => cmp_f32(a.rating, b.rating),
        SortKey::PageCount => a.page_count.cmp(&b.page_count),
        SortKey::Manual => match (a.sort_hint, b.sort_hint) {
            (Some(x), Some(y)) => x.cmp(&y),
            // Unhinted books sink below hinted ones
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

fn cmp_f32(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Sort a shelf's books in place
pub fn sort_books(books: &mut [Book], key: SortKey, direction: SortDirection) {
    books.sort_by(|a, b| compare_books(a, b, key, direction));
}

/// A series group within a shelf view
#[derive(Debug, Clone)]
pub struct SeriesGroup {
    /// Series name; None for a standalone book's singleton group
    pub series_name: Option<String>,
    pub books: Vec<Book>,
}

/// Group a shelf's books by series
///
/// Books without a series form singleton groups. Within a series group books
/// order by series number; groups themselves order by the given key applied
/// to their first member.
pub fn group_by_series(books: &[Book], key: SortKey, direction: SortDirection) -> Vec<SeriesGroup> {
    let mut groups: Vec<SeriesGroup> = Vec::new();

    for book in books {
        match &book.series_name {
            Some(series) => {
                if let Some(group) = groups
                    .iter_mut()
                    .find(|g| g.series_name.as_deref() == Some(series.as_str()))
                {
                    group.books.push(book.clone());
                } else {
                    groups.push(SeriesGroup {
                        series_name: Some(series.clone()),
                        books: vec![book.clone()],
                    });
                }
            }
            None => groups.push(SeriesGroup {
                series_name: None,
                books: vec![book.clone()],
            }),
        }
    }

    for group in &mut groups {
        group
            .books
            .sort_by(|a, b| cmp_f32(a.series_number, b.series_number).then_with(|| {
                compare_books(a, b, SortKey::Title, SortDirection::Ascending)
            }));
    }

    groups.sort_by(|a, b| compare_books(&a.books[0], &b.books[0], key, direction));

    groups
}
