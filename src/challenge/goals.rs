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


//! Day-by-day page goal distribution with debt carry

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// One day of a page-paced challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayGoal {
    pub date: NaiveDate,
    /// Pages to read this day so the remaining target is spread evenly over
    /// the remaining days
    pub target_pages: i64,
    /// Effective pages attributed to this day from the cumulative records
    pub actual_pages: i64,
    /// Cumulative page position after this day
    pub cumulative_pages: i64,
}

/// Compute per-day page goals over an inclusive date range
///
/// # Arguments
/// * `start` / `end` - inclusive date range of the challenge
/// * `total_pages` - cumulative page number to reach by the end of the range
/// * `start_page` - cumulative page position before day one (0 for a fresh start)
/// * `entries` - manually recorded cumulative pages per day; days without an
///   entry attribute 0 pages, and the difference surfaces on the entry's day
///
/// Each day's target is the ceiling of remaining pages over remaining days,
/// computed against the cumulative position entering the day. A shortfall is
/// never tracked separately: it simply leaves more pages remaining, which
/// inflates every later target (the "debt carry"). Days after the target is
/// reached get a target of 0.
///
/// Entries dated outside the range are ignored. A cumulative entry lower than
/// the running position (a downward correction) attributes 0 pages rather
/// than negative reading, and the running position is kept.
pub fn daily_goals(
    start: NaiveDate,
    end: NaiveDate,
    total_pages: i64,
    start_page: i64,
    entries: &BTreeMap<NaiveDate, i64>,
) -> Vec<DayGoal> {
    if end < start {
        return Vec::new();
    }

    let num_days = (end - start).num_days() + 1;
    let mut goals = Vec::with_capacity(num_days as usize);
    let mut position = start_page.max(0);

    for offset in 0..num_days {
        let date = start + Duration::days(offset);
        let days_left = num_days - offset;

        let remaining = (total_pages - position).max(0);
        let target_pages = ceil_div(remaining, days_left);

        let (actual_pages, new_position) = match entries.get(&date) {
            Some(&cumulative) => ((cumulative - position).max(0), cumulative.max(position)),
            None => (0, position),
        };
        position = new_position;

        goals.push(DayGoal {
            date,
            target_pages,
            actual_pages,
            cumulative_pages: position,
        });
    }

    goals
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    if numerator <= 0 || denominator <= 0 {
        return 0;
    }
    (numerator + denominator - 1) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_even_distribution_without_entries() {
        // 100 pages over 4 days: 25 a day, never read
        let goals = daily_goals(
            date(2025, 6, 1),
            date(2025, 6, 4),
            100,
            0,
            &BTreeMap::new(),
        );

        assert_eq!(goals.len(), 4);
        assert_eq!(goals[0].target_pages, 25);
        // Nothing read on day one, so 100 pages over 3 days
        assert_eq!(goals[1].target_pages, 34);
        assert_eq!(goals[2].target_pages, 50);
        assert_eq!(goals[3].target_pages, 100);
        assert!(goals.iter().all(|g| g.actual_pages == 0));
    }

    #[test]
    fn test_on_pace_reader_keeps_flat_targets() {
        let mut entries = BTreeMap::new();
        entries.insert(date(2025, 6, 1), 25);
        entries.insert(date(2025, 6, 2), 50);
        entries.insert(date(2025, 6, 3), 75);
        entries.insert(date(2025, 6, 4), 100);

        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 4), 100, 0, &entries);

        for goal in &goals {
            assert_eq!(goal.target_pages, 25);
            assert_eq!(goal.actual_pages, 25);
        }
        assert_eq!(goals[3].cumulative_pages, 100);
    }

    #[test]
    fn test_shortfall_carries_debt_forward() {
        // 90 pages over 3 days, only 10 read on day one
        let mut entries = BTreeMap::new();
        entries.insert(date(2025, 6, 1), 10);

        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 3), 90, 0, &entries);

        assert_eq!(goals[0].target_pages, 30);
        assert_eq!(goals[0].actual_pages, 10);
        // 80 pages left over 2 days
        assert_eq!(goals[1].target_pages, 40);
        // Still nothing more read: all 80 land on the last day
        assert_eq!(goals[2].target_pages, 80);
    }

    #[test]
    fn test_start_page_offset() {
        // Picked the book up at page 120 of 200, 4 days left
        let goals = daily_goals(
            date(2025, 6, 1),
            date(2025, 6, 4),
            200,
            120,
            &BTreeMap::new(),
        );

        assert_eq!(goals[0].target_pages, 20);
        assert_eq!(goals[0].cumulative_pages, 120);
    }

    #[test]
    fn test_targets_drop_to_zero_after_finish() {
        let mut entries = BTreeMap::new();
        entries.insert(date(2025, 6, 2), 100);

        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 4), 100, 0, &entries);

        assert_eq!(goals[1].actual_pages, 100);
        assert_eq!(goals[2].target_pages, 0);
        assert_eq!(goals[3].target_pages, 0);
    }

    #[test]
    fn test_skipped_day_attributes_to_entry_day() {
        // No entry on day two; day three's entry carries both days' reading
        let mut entries = BTreeMap::new();
        entries.insert(date(2025, 6, 1), 30);
        entries.insert(date(2025, 6, 3), 90);

        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 3), 90, 0, &entries);

        assert_eq!(goals[0].actual_pages, 30);
        assert_eq!(goals[1].actual_pages, 0);
        assert_eq!(goals[2].actual_pages, 60);
    }

    #[test]
    fn test_downward_correction_never_goes_negative() {
        let mut entries = BTreeMap::new();
        entries.insert(date(2025, 6, 1), 50);
        entries.insert(date(2025, 6, 2), 40); // corrected downward

        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 3), 90, 0, &entries);

        assert_eq!(goals[1].actual_pages, 0);
        assert_eq!(goals[1].cumulative_pages, 50);
    }

    #[test]
    fn test_entries_outside_range_ignored() {
        let mut entries = BTreeMap::new();
        entries.insert(date(2025, 5, 28), 400);
        entries.insert(date(2025, 6, 10), 500);

        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 2), 60, 0, &entries);

        assert!(goals.iter().all(|g| g.actual_pages == 0));
        assert_eq!(goals[0].target_pages, 30);
    }

    #[test]
    fn test_degenerate_inputs() {
        // Inverted range
        assert!(daily_goals(date(2025, 6, 4), date(2025, 6, 1), 100, 0, &BTreeMap::new()).is_empty());

        // Already past the target before day one
        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 2), 100, 150, &BTreeMap::new());
        assert!(goals.iter().all(|g| g.target_pages == 0));

        // Zero target
        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 2), 0, 0, &BTreeMap::new());
        assert!(goals.iter().all(|g| g.target_pages == 0));

        // Single-day range takes everything at once
        let goals = daily_goals(date(2025, 6, 1), date(2025, 6, 1), 73, 0, &BTreeMap::new());
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].target_pages, 73);
    }
}
