use chrono::NaiveDate;

use super::soft;
use crate::database::{Database, DatabaseError};
use crate::models::Goal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineState {
    Upcoming,
    DueToday,
    Overdue,
}

/// Progress compared with time elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Ahead,
    OnTrack,
    Behind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub goal: Goal,
    /// Share of the created..deadline window already elapsed, 0..=100
    pub elapsed_percent: u8,
    pub days_left: i64,
    pub state: DeadlineState,
    pub pace: Pace,
}

/// Elapsed share of the window from `created` to `deadline`, floored and
/// clamped to 0..=100. A window of zero or negative length reads 0 before the
/// deadline and 100 from the deadline on.
pub fn elapsed_percent(created: NaiveDate, deadline: NaiveDate, today: NaiveDate) -> u8 {
    let total = (deadline - created).num_days();
    if total <= 0 {
        return if today < deadline { 0 } else { 100 };
    }
    let elapsed = (today - created).num_days();
    (elapsed * 100).div_euclid(total).clamp(0, 100) as u8
}

pub fn deadline_state(deadline: NaiveDate, today: NaiveDate) -> DeadlineState {
    match deadline.cmp(&today) {
        std::cmp::Ordering::Greater => DeadlineState::Upcoming,
        std::cmp::Ordering::Equal => DeadlineState::DueToday,
        std::cmp::Ordering::Less => DeadlineState::Overdue,
    }
}

fn pace(progress: u8, elapsed: u8) -> Pace {
    // within ten points counts as on track
    let diff = i16::from(progress) - i16::from(elapsed);
    if diff > 10 {
        Pace::Ahead
    } else if diff < -10 {
        Pace::Behind
    } else {
        Pace::OnTrack
    }
}

fn progress_for(goal: Goal, today: NaiveDate) -> GoalProgress {
    let elapsed = elapsed_percent(goal.created_at.date(), goal.deadline, today);
    GoalProgress {
        elapsed_percent: elapsed,
        days_left: (goal.deadline - today).num_days(),
        state: deadline_state(goal.deadline, today),
        pace: pace(goal.progress, elapsed),
        goal,
    }
}

/// Time-vs-progress for one goal. `NotFound` if the goal does not exist.
pub fn goal_time_progress(db: &Database, goal_id: i64, today: NaiveDate) -> Result<GoalProgress, DatabaseError> {
    let goal: Goal = db.get(goal_id)?;
    Ok(progress_for(goal, today))
}

/// Every goal, earliest deadline first
pub fn all_goal_progress(db: &Database, today: NaiveDate) -> Vec<GoalProgress> {
    soft("goal_progress", db.goals_by_deadline())
        .into_iter()
        .map(|goal| progress_for(goal, today))
        .collect()
}
