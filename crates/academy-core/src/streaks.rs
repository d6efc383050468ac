//! Day-streak computation over recorded activity.
//!
//! A streak is consecutive UTC days each having at least one recorded
//! event, and it only counts as current when it ends today or yesterday.
//! An account with no activity has streak 0 regardless of its age.

use chrono::{DateTime, Utc};

/// Streak figures derived from event timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakStats {
    /// Consecutive active days ending today or yesterday; 0 if broken.
    pub current_streak: u32,
    /// Longest run of consecutive active days ever.
    pub best_streak: u32,
    /// Count of distinct days with activity.
    pub active_days: u32,
}

/// Compute streaks from event timestamps. `now` is passed explicitly so
/// callers and tests agree on what "today" means.
pub fn calculate(timestamps: &[DateTime<Utc>], now: DateTime<Utc>) -> StreakStats {
    if timestamps.is_empty() {
        return StreakStats::default();
    }

    // Distinct UTC day numbers, ascending.
    let mut days: Vec<i64> = timestamps
        .iter()
        .map(|ts| ts.timestamp().div_euclid(86400))
        .collect();
    days.sort_unstable();
    days.dedup();

    let active_days = days.len() as u32;

    let mut best_streak = 1u32;
    let mut run = 1u32;
    for window in days.windows(2) {
        if window[1] == window[0] + 1 {
            run += 1;
            best_streak = best_streak.max(run);
        } else {
            run = 1;
        }
    }

    let today = now.timestamp().div_euclid(86400);
    let last_day = *days.last().unwrap_or(&0);
    let current_streak = if last_day == today || last_day == today - 1 {
        // Walk backwards from the most recent active day.
        let mut current = 1u32;
        for i in (0..days.len().saturating_sub(1)).rev() {
            if days[i] + 1 == days[i + 1] {
                current += 1;
            } else {
                break;
            }
        }
        current
    } else {
        0
    };

    StreakStats {
        current_streak,
        best_streak,
        active_days,
    }
}
