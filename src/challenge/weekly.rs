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


//! Structured multi-book weekly challenge
//!
//! A weekly challenge spans a short date range and plans several books at
//! once. Each book gets a static per-day page plan (stored with the
//! challenge), while live targets against actual reading reuse the debt-carry
//! calculation from [`super::goals`].

use crate::challenge::{daily_goals, DayGoal};
use crate::error::{BookFlowError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-book plan inside a weekly challenge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyBookPlan {
    pub book_uid: String,
    pub title: String,
    /// Cumulative page number to reach by the end of the range
    pub total_pages: i64,
    /// Cumulative page position before day one
    #[serde(default)]
    pub start_page: i64,
    /// Planned pages per day, keyed by date
    pub daily_plan: BTreeMap<NaiveDate, i64>,
}

/// A multi-book weekly challenge over an inclusive date range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyChallenge {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub books: Vec<WeeklyBookPlan>,
}

impl WeeklyChallenge {
    /// Create an empty weekly challenge
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if end_date < start_date {
            return Err(BookFlowError::invalid_input(
                "Weekly challenge end date is before its start date",
            ));
        }

        Ok(Self {
            start_date,
            end_date,
            books: Vec::new(),
        })
    }

    /// Number of days in the challenge
    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Add a book with an evenly distributed static plan
    ///
    /// The remaining pages (total minus start page) split into equal shares,
    /// with the leftover spread one page at a time over the earliest days.
    pub fn add_book(
        &mut self,
        book_uid: impl Into<String>,
        title: impl Into<String>,
        total_pages: i64,
        start_page: i64,
    ) -> Result<()> {
        let book_uid = book_uid.into();
        if total_pages <= 0 {
            return Err(BookFlowError::invalid_input(
                "Weekly challenge book needs a positive page target",
            ));
        }
        if self.books.iter().any(|b| b.book_uid == book_uid) {
            return Err(BookFlowError::invalid_input(format!(
                "Book '{}' is already part of this weekly challenge",
                book_uid
            )));
        }

        let remaining = (total_pages - start_page).max(0);
        let days = self.num_days();
        let base = remaining / days;
        let leftover = remaining % days;

        let mut daily_plan = BTreeMap::new();
        for offset in 0..days {
            let date = self.start_date + Duration::days(offset);
            let planned = base + if offset < leftover { 1 } else { 0 };
            daily_plan.insert(date, planned);
        }

        self.books.push(WeeklyBookPlan {
            book_uid,
            title: title.into(),
            total_pages,
            start_page,
            daily_plan,
        });

        Ok(())
    }

    /// Remove a book from the challenge
    pub fn remove_book(&mut self, book_uid: &str) -> bool {
        let before = self.books.len();
        self.books.retain(|b| b.book_uid != book_uid);
        self.books.len() != before
    }

    /// Total planned pages across all books for one day
    pub fn planned_pages_for(&self, date: NaiveDate) -> i64 {
        self.books
            .iter()
            .filter_map(|b| b.daily_plan.get(&date))
            .sum()
    }

    /// Live goals for one book against its recorded cumulative entries
    ///
    /// Unlike the stored static plan, this recomputes with debt carry, so
    /// falling behind on a book inflates its later targets.
    pub fn goals_for_book(
        &self,
        book_uid: &str,
        entries: &BTreeMap<NaiveDate, i64>,
    ) -> Option<Vec<DayGoal>> {
        let plan = self.books.iter().find(|b| b.book_uid == book_uid)?;
        Some(daily_goals(
            self.start_date,
            self.end_date,
            plan.total_pages,
            plan.start_page,
            entries,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn week() -> WeeklyChallenge {
        WeeklyChallenge::new(date(2025, 6, 2), date(2025, 6, 8)).unwrap()
    }

    #[test]
    fn test_plan_distributes_remainder_to_early_days() {
        let mut challenge = week();
        challenge.add_book("uid-1", "Dune", 100, 0).unwrap();

        let plan = &challenge.books[0].daily_plan;
        assert_eq!(plan.len(), 7);
        // 100 over 7 days: 14 base, first two days get the spare pages
        assert_eq!(plan[&date(2025, 6, 2)], 15);
        assert_eq!(plan[&date(2025, 6, 3)], 15);
        assert_eq!(plan[&date(2025, 6, 4)], 14);
        assert_eq!(plan.values().sum::<i64>(), 100);
    }

    #[test]
    fn test_planned_pages_sum_across_books() {
        let mut challenge = week();
        challenge.add_book("uid-1", "Dune", 70, 0).unwrap();
        challenge.add_book("uid-2", "Emma", 140, 0).unwrap();

        assert_eq!(challenge.planned_pages_for(date(2025, 6, 5)), 10 + 20);
        assert_eq!(challenge.planned_pages_for(date(2025, 1, 1)), 0);
    }

    #[test]
    fn test_duplicate_and_invalid_books_rejected() {
        let mut challenge = week();
        challenge.add_book("uid-1", "Dune", 70, 0).unwrap();
        assert!(challenge.add_book("uid-1", "Dune again", 70, 0).is_err());
        assert!(challenge.add_book("uid-2", "Empty", 0, 0).is_err());

        assert!(WeeklyChallenge::new(date(2025, 6, 8), date(2025, 6, 2)).is_err());
    }

    #[test]
    fn test_goals_for_book_carry_debt() {
        let mut challenge = week();
        challenge.add_book("uid-1", "Dune", 70, 0).unwrap();

        // Read nothing the first two days
        let entries = BTreeMap::new();
        let goals = challenge.goals_for_book("uid-1", &entries).unwrap();
        assert_eq!(goals[0].target_pages, 10);
        assert_eq!(goals[2].target_pages, 14);

        assert!(challenge.goals_for_book("missing", &entries).is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let mut challenge = week();
        challenge.add_book("uid-1", "Dune", 70, 10).unwrap();

        let json = serde_json::to_string(&challenge).unwrap();
        let decoded: WeeklyChallenge = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, challenge);
    }
}
