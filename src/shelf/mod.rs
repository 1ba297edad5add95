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


//! Shelf ordering and grouping
//!
//! Shelf membership itself lives in the storage layer (status column for the
//! three system shelves, junction table for custom shelves). This module
//! covers the pure, in-memory half: multi-key sort comparators and series
//! grouping over a shelf's books.

mod sort;

pub use sort::{
    compare_books, group_by_series, parse_series_number, sort_books, title_sort_key, SeriesGroup,
    SortDirection, SortKey,
};
