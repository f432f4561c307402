use chrono::NaiveDate;

use super::soft;
use crate::database::{Database, Filter};
use crate::models::{Budget, Habit, Task, TaskStatus};
use crate::utils;

/// Points available per category
pub const CATEGORY_POINTS: u32 = 25;

/// Raw numbers for one day, gathered from the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayActivity {
    pub open_tasks: usize,
    pub completed_today: usize,
    pub habits_total: usize,
    pub habits_done: usize,
    pub study_minutes: u32,
    pub expense_today: f64,
    pub has_expense_today: bool,
    /// Latest budget for the current month, if one is set
    pub budget: Option<Budget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductivityBand {
    Outstanding,
    Good,
    Fair,
    NeedsEffort,
}

impl ProductivityBand {
    pub fn for_score(score: u32) -> Self {
        match score {
            80.. => ProductivityBand::Outstanding,
            60.. => ProductivityBand::Good,
            40.. => ProductivityBand::Fair,
            _ => ProductivityBand::NeedsEffort,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProductivityBand::Outstanding => "outstanding",
            ProductivityBand::Good => "good",
            ProductivityBand::Fair => "fair",
            ProductivityBand::NeedsEffort => "needs effort",
        }
    }
}

/// Follow-up hint derived from the day's numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// More than five open tasks
    FocusOnFewerTasks { open: usize },
    NoOpenTasks,
    HabitsRemaining { remaining: usize },
    StartStudying,
    StudyOneMoreSession,
    KeepItUp,
}

impl Suggestion {
    pub fn message(&self) -> String {
        match self {
            Suggestion::FocusOnFewerTasks { open } => {
                format!("{} open tasks: pick the three that matter most", open)
            }
            Suggestion::NoOpenTasks => "No open tasks. Plan what you want to get done".to_string(),
            Suggestion::HabitsRemaining { remaining } => {
                format!("{} habit(s) still waiting for a check-in", remaining)
            }
            Suggestion::StartStudying => {
                "No study session yet today. Try a 25 minute block".to_string()
            }
            Suggestion::StudyOneMoreSession => {
                "Good start on studying. One more session reaches an hour".to_string()
            }
            Suggestion::KeepItUp => "Productive day. Keep it up".to_string(),
        }
    }
}

/// Points for one category; `None` when the category does not apply today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScore {
    pub points: Option<u32>,
}

impl CategoryScore {
    fn not_applicable() -> Self {
        Self { points: None }
    }

    fn earned(points: u32) -> Self {
        Self {
            points: Some(points),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductivityReport {
    pub score: u32,
    pub band: ProductivityBand,
    pub tasks: CategoryScore,
    pub habits: CategoryScore,
    pub study: CategoryScore,
    pub expenses: CategoryScore,
    pub activity: DayActivity,
    pub suggestions: Vec<Suggestion>,
}

impl ProductivityReport {
    /// Habit completion in percent, 0 without habits
    pub fn habit_rate(&self) -> f64 {
        percent(self.activity.habits_done, self.activity.habits_total)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn task_score(a: &DayActivity) -> CategoryScore {
    let considered = a.open_tasks + a.completed_today;
    if considered == 0 {
        return CategoryScore::not_applicable();
    }
    let rate = percent(a.completed_today, considered);
    CategoryScore::earned(if rate >= 50.0 {
        25
    } else if rate >= 25.0 {
        15
    } else if a.completed_today > 0 {
        10
    } else {
        0
    })
}

fn habit_score(a: &DayActivity) -> CategoryScore {
    if a.habits_total == 0 {
        return CategoryScore::not_applicable();
    }
    let rate = percent(a.habits_done, a.habits_total);
    CategoryScore::earned(if rate >= 80.0 {
        25
    } else if rate >= 50.0 {
        15
    } else if rate > 0.0 {
        10
    } else {
        0
    })
}

fn study_score(a: &DayActivity) -> CategoryScore {
    match a.study_minutes {
        0 => CategoryScore::not_applicable(),
        60.. => CategoryScore::earned(25),
        30.. => CategoryScore::earned(15),
        _ => CategoryScore::earned(10),
    }
}

fn expense_score(a: &DayActivity) -> CategoryScore {
    match (a.has_expense_today, &a.budget) {
        (true, Some(budget)) if a.expense_today <= budget.daily_allowance() => {
            CategoryScore::earned(25)
        }
        (true, _) => CategoryScore::earned(10),
        (false, Some(_)) => CategoryScore::earned(15),
        (false, None) => CategoryScore::not_applicable(),
    }
}

fn suggestions(a: &DayActivity) -> Vec<Suggestion> {
    let mut out = Vec::new();
    if a.open_tasks > 5 {
        out.push(Suggestion::FocusOnFewerTasks { open: a.open_tasks });
    } else if a.open_tasks == 0 {
        out.push(Suggestion::NoOpenTasks);
    }
    if a.habits_done < a.habits_total {
        out.push(Suggestion::HabitsRemaining {
            remaining: a.habits_total - a.habits_done,
        });
    }
    if a.study_minutes == 0 {
        out.push(Suggestion::StartStudying);
    } else if a.study_minutes < 60 {
        out.push(Suggestion::StudyOneMoreSession);
    }
    if out.is_empty() {
        out.push(Suggestion::KeepItUp);
    }
    out
}

/// Score a day from its raw numbers.
///
/// Only categories that apply count towards the maximum, so a day with no
/// habits defined is not penalised for them. With nothing applicable the
/// score is 0.
pub fn score_day(activity: DayActivity) -> ProductivityReport {
    let tasks = task_score(&activity);
    let habits = habit_score(&activity);
    let study = study_score(&activity);
    let expenses = expense_score(&activity);

    let categories = [tasks, habits, study, expenses];
    let applicable = categories.iter().filter(|c| c.points.is_some()).count() as u32;
    let earned: u32 = categories.iter().filter_map(|c| c.points).sum();
    let max = applicable * CATEGORY_POINTS;
    let score = if max == 0 {
        0
    } else {
        ((f64::from(earned) / f64::from(max)) * 100.0).round() as u32
    };

    ProductivityReport {
        score,
        band: ProductivityBand::for_score(score),
        tasks,
        habits,
        study,
        expenses,
        suggestions: suggestions(&activity),
        activity,
    }
}

/// Gather today's numbers from the store
pub fn day_activity(db: &Database, today: NaiveDate) -> DayActivity {
    let open: Vec<Task> = soft(
        "productivity",
        db.list(&Filter::new().ne("status", TaskStatus::Completed)),
    );
    let completed_today = soft("productivity", db.tasks_completed_on(today));

    let habits: Vec<Habit> = soft("productivity", db.list(&Filter::new()));
    let habits_done = habits
        .iter()
        .filter_map(|h| h.id)
        .filter(|id| soft("productivity", db.habit_completed_dates(*id)).contains(&today))
        .count();

    let expenses = soft("productivity", db.expenses_on(today));
    let month = utils::month_key(today);
    let budget = soft("productivity", db.latest_budget(&month));

    DayActivity {
        open_tasks: open.len(),
        completed_today: completed_today.len(),
        habits_total: habits.len(),
        habits_done,
        study_minutes: soft("productivity", db.study_minutes_on(today)),
        expense_today: expenses.iter().map(|e| e.amount).sum(),
        has_expense_today: !expenses.is_empty(),
        budget,
    }
}

/// Productivity report for `today`
pub fn productivity_score(db: &Database, today: NaiveDate) -> ProductivityReport {
    score_day(day_activity(db, today))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_applicable_scores_zero() {
        let report = score_day(DayActivity::default());
        assert_eq!(report.score, 0);
        assert_eq!(report.band, ProductivityBand::NeedsEffort);
        assert!(report.tasks.points.is_none());
    }

    #[test]
    fn only_applicable_categories_count() {
        // Tasks 25/25, habits 15/25, study and expenses not applicable
        let report = score_day(DayActivity {
            open_tasks: 1,
            completed_today: 1,
            habits_total: 2,
            habits_done: 1,
            ..DayActivity::default()
        });
        assert_eq!(report.score, 80);
        assert_eq!(report.band, ProductivityBand::Outstanding);
    }

    #[test]
    fn expense_within_daily_budget_earns_full_points() {
        let within = DayActivity {
            has_expense_today: true,
            expense_today: 90.0,
            budget: Some(Budget::new("2024-05".to_string(), 3000.0)),
            ..DayActivity::default()
        };
        assert_eq!(expense_score(&within).points, Some(25));

        let over = DayActivity {
            expense_today: 101.0,
            ..within.clone()
        };
        assert_eq!(expense_score(&over).points, Some(10));

        let budget_only = DayActivity {
            budget: within.budget.clone(),
            ..DayActivity::default()
        };
        assert_eq!(expense_score(&budget_only).points, Some(15));
    }

    #[test]
    fn study_thresholds() {
        let at = |minutes| {
            study_score(&DayActivity {
                study_minutes: minutes,
                ..DayActivity::default()
            })
            .points
        };
        assert_eq!(at(0), None);
        assert_eq!(at(10), Some(10));
        assert_eq!(at(30), Some(15));
        assert_eq!(at(60), Some(25));
    }

    #[test]
    fn suggestions_flag_remaining_habits_and_missing_study() {
        let report = score_day(DayActivity {
            open_tasks: 7,
            habits_total: 3,
            habits_done: 1,
            ..DayActivity::default()
        });
        assert_eq!(
            report.suggestions,
            vec![
                Suggestion::FocusOnFewerTasks { open: 7 },
                Suggestion::HabitsRemaining { remaining: 2 },
                Suggestion::StartStudying,
            ]
        );
    }
}
