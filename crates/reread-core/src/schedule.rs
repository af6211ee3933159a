//! Spaced-repetition schedule math.
//!
//! Each "mark as read" event advances a bookmark one step through a fixed,
//! escalating interval table. The `repetition_level` field is a 0-based
//! index into the table; once the table is exhausted the schedule ends and
//! the bookmark is considered mastered (no further reminders).
//!
//! The functions here are pure date arithmetic. Applying the advance to a
//! stored bookmark (including the `read_count` and `last_read_at` writes
//! that accompany it) is the database layer's job, so the full transition
//! stays atomic.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Reminder intervals in days, indexed by the current repetition level.
pub const REPETITION_INTERVALS: [u64; 7] = [1, 3, 7, 14, 30, 60, 90];

/// Outcome of advancing the schedule one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAdvance {
    /// Date of the next reminder; None once the table is exhausted.
    pub next_reminder_date: Option<NaiveDate>,
    /// Level after the advance.
    pub repetition_level: i32,
}

/// Compute the next reminder date and level for a read event at `today`.
///
/// Levels below the table length schedule `today + table[level]` and move
/// to `level + 1`. Levels at or past the end of the table terminate the
/// schedule: no reminder date, level unchanged. Negative levels are
/// clamped to 0 rather than trusted.
pub fn next_review(repetition_level: i32, today: NaiveDate) -> ReviewAdvance {
    let level = repetition_level.max(0) as usize;
    match REPETITION_INTERVALS.get(level) {
        Some(&interval_days) => ReviewAdvance {
            // checked_add_days only fails at the far end of chrono's range
            next_reminder_date: today.checked_add_days(Days::new(interval_days)),
            repetition_level: level as i32 + 1,
        },
        None => ReviewAdvance {
            next_reminder_date: None,
            repetition_level: level as i32,
        },
    }
}

/// True when a reminder dated `reminder` is due on or before `today`.
pub fn is_due(reminder: NaiveDate, today: NaiveDate) -> bool {
    reminder <= today
}
