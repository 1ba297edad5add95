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


//! Reading challenge calculations
//!
//! Pure, synchronous arithmetic over small in-memory inputs. Nothing here
//! touches the database; callers load reading logs and challenge rows and
//! feed them in, and recompute from scratch on every read.
//!
//! The central rule is the day-by-day page distribution with debt carry:
//! remaining pages are spread evenly (ceiling division) over the remaining
//! days, so a day read short leaves a larger remainder and every later day's
//! target grows to absorb the shortfall.

mod goals;
mod weekly;

pub use goals::{daily_goals, DayGoal};
pub use weekly::{WeeklyBookPlan, WeeklyChallenge};

/// Progress against the yearly book-count goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearlyProgress {
    pub year: i32,
    pub target_books: i32,
    pub finished_books: i32,
}

impl YearlyProgress {
    pub fn new(year: i32, target_books: i32, finished_books: i32) -> Self {
        Self {
            year,
            target_books,
            finished_books,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.target_books > 0 && self.finished_books >= self.target_books
    }

    pub fn books_remaining(&self) -> i32 {
        (self.target_books - self.finished_books).max(0)
    }

    /// Completed fraction in percent, capped at 100
    pub fn percent_complete(&self) -> u8 {
        if self.target_books <= 0 {
            return 0;
        }
        let pct = (self.finished_books as f64 / self.target_books as f64) * 100.0;
        pct.min(100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yearly_progress() {
        let progress = YearlyProgress::new(2025, 24, 6);
        assert!(!progress.is_complete());
        assert_eq!(progress.books_remaining(), 18);
        assert_eq!(progress.percent_complete(), 25);

        let done = YearlyProgress::new(2025, 12, 14);
        assert!(done.is_complete());
        assert_eq!(done.books_remaining(), 0);
        assert_eq!(done.percent_complete(), 100);

        let empty = YearlyProgress::new(2025, 0, 3);
        assert!(!empty.is_complete());
        assert_eq!(empty.percent_complete(), 0);
    }
}
