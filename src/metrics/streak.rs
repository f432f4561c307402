use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

use super::soft;
use crate::database::{Database, DatabaseError, Filter};
use crate::models::Habit;

/// Streak band shown next to the day count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Milestone {
    None,
    Starting,
    Building,
    Week,
    Fortnight,
    Legendary,
}

impl Milestone {
    pub fn for_streak(days: u32) -> Self {
        match days {
            30.. => Milestone::Legendary,
            14.. => Milestone::Fortnight,
            7.. => Milestone::Week,
            3.. => Milestone::Building,
            1.. => Milestone::Starting,
            0 => Milestone::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Milestone::None => "start today",
            Milestone::Starting => "good start",
            Milestone::Building => "keep going",
            Milestone::Week => "one week",
            Milestone::Fortnight => "two weeks",
            Milestone::Legendary => "legendary",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreakReport {
    pub habit_id: i64,
    pub name: String,
    pub glyph: String,
    pub days: u32,
    pub milestone: Milestone,
    pub done_today: bool,
    /// Oldest first, ending with `today`
    pub last_seven: Vec<(NaiveDate, bool)>,
}

/// Count consecutive completed days ending at `today`.
/// A missing log for `today` means the streak is 0.
pub fn count_streak(done: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut days = 0;
    let mut cursor = today;
    while done.contains(&cursor) {
        days += 1;
        cursor -= Duration::days(1);
    }
    days
}

fn last_seven(done: &HashSet<NaiveDate>, today: NaiveDate) -> Vec<(NaiveDate, bool)> {
    (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            (date, done.contains(&date))
        })
        .collect()
}

/// Current streak of one habit. `NotFound` if the habit does not exist.
pub fn habit_streak(db: &Database, habit_id: i64, today: NaiveDate) -> Result<StreakReport, DatabaseError> {
    let habit: Habit = db.get(habit_id)?;
    Ok(report(db, habit_id, habit, today))
}

fn report(db: &Database, habit_id: i64, habit: Habit, today: NaiveDate) -> StreakReport {
    let done = soft("streak", db.habit_completed_dates(habit_id));
    let days = count_streak(&done, today);
    StreakReport {
        habit_id,
        name: habit.name,
        glyph: habit.glyph,
        days,
        milestone: Milestone::for_streak(days),
        done_today: done.contains(&today),
        last_seven: last_seven(&done, today),
    }
}

/// Streaks for every habit, in creation order
pub fn all_streaks(db: &Database, today: NaiveDate) -> Vec<StreakReport> {
    let habits: Vec<Habit> = soft("streak", db.list(&Filter::new()));
    habits
        .into_iter()
        .filter_map(|habit| {
            let id = habit.id?;
            Some(report(db, id, habit, today))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        crate::utils::parse_date(s).unwrap()
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let done: HashSet<NaiveDate> = ["2024-01-10", "2024-01-09", "2024-01-07"]
            .into_iter()
            .map(day)
            .collect();
        assert_eq!(count_streak(&done, day("2024-01-10")), 2);
    }

    #[test]
    fn streak_is_zero_without_a_log_today() {
        let done: HashSet<NaiveDate> = [day("2024-01-09")].into_iter().collect();
        assert_eq!(count_streak(&done, day("2024-01-10")), 0);
    }

    #[test]
    fn milestones_follow_day_thresholds() {
        assert_eq!(Milestone::for_streak(0), Milestone::None);
        assert_eq!(Milestone::for_streak(2), Milestone::Starting);
        assert_eq!(Milestone::for_streak(7), Milestone::Week);
        assert_eq!(Milestone::for_streak(29), Milestone::Fortnight);
        assert_eq!(Milestone::for_streak(400), Milestone::Legendary);
    }

    #[test]
    fn last_seven_ends_today() {
        let done: HashSet<NaiveDate> = [day("2024-01-10")].into_iter().collect();
        let window = last_seven(&done, day("2024-01-10"));
        assert_eq!(window.len(), 7);
        assert_eq!(window[0], (day("2024-01-04"), false));
        assert_eq!(window[6], (day("2024-01-10"), true));
    }
}
