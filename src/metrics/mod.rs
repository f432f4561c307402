//! Derived metrics computed from stored records.
//!
//! Every function here is a read: nothing is written back to the store.
//! Missing data and storage failures degrade to zero values (logged at warn),
//! except that a missing habit or goal surfaces as `NotFound`.

pub mod budget;
pub mod dashboard;
pub mod goals;
pub mod productivity;
pub mod streak;

use log::warn;

use crate::database::DatabaseError;

pub use budget::{
    BudgetVariance, DaysSurvivable, Runway, RunwayBand, SavingsScenario, budget_variance,
    project_runway, runway,
};
pub use dashboard::{Dashboard, snapshot};
pub use goals::{DeadlineState, GoalProgress, Pace, all_goal_progress, goal_time_progress};
pub use productivity::{
    DayActivity, ProductivityBand, ProductivityReport, Suggestion, productivity_score, score_day,
};
pub use streak::{Milestone, StreakReport, all_streaks, habit_streak};

/// Unwrap a read used only for a metric, falling back to the default value
fn soft<T: Default>(metric: &str, result: Result<T, DatabaseError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "event=metric_fallback module=metrics metric={} status=error error={}",
                metric, err
            );
            T::default()
        }
    }
}
