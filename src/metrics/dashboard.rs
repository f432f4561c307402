use chrono::NaiveDate;

use super::budget::{BudgetVariance, budget_variance};
use super::goals::{GoalProgress, all_goal_progress};
use super::soft;
use super::streak::{StreakReport, all_streaks};
use crate::database::Database;
use crate::models::Task;
use crate::utils;

const TOP_TASKS: usize = 3;
const NEAREST_GOALS: usize = 2;

/// One-screen summary of the day
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub top_tasks: Vec<Task>,
    pub budget: BudgetVariance,
    pub habits: Vec<StreakReport>,
    pub goals: Vec<GoalProgress>,
}

pub fn snapshot(db: &Database, today: NaiveDate) -> Dashboard {
    let mut goals: Vec<GoalProgress> = all_goal_progress(db, today)
        .into_iter()
        .filter(|g| g.goal.progress < 100)
        .collect();
    goals.truncate(NEAREST_GOALS);

    Dashboard {
        today,
        top_tasks: soft("dashboard", db.top_open_tasks(TOP_TASKS)),
        budget: budget_variance(db, &utils::month_key(today)),
        habits: all_streaks(db, today),
        goals,
    }
}
