use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

use super::soft;
use crate::database::Database;
use crate::query::{CategorySpend, category_breakdown};
use crate::utils;

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetVariance {
    pub month: String,
    pub spent: f64,
    /// Latest limit set for the month
    pub limit: Option<f64>,
    /// `limit - spent`, when a limit is set
    pub remaining: Option<f64>,
    pub over_budget: bool,
    pub categories: Vec<CategorySpend>,
}

/// Spending against the latest budget for a `YYYY-MM` month
pub fn budget_variance(db: &Database, month: &str) -> BudgetVariance {
    let expenses = soft("budget_variance", db.expenses_in_month(month));
    let limit = soft("budget_variance", db.latest_budget(month)).map(|b| b.monthly_limit);
    let spent: f64 = expenses.iter().map(|e| e.amount).sum();
    let remaining = limit.map(|l| l - spent);
    BudgetVariance {
        month: month.to_string(),
        spent,
        limit,
        remaining,
        over_budget: remaining.is_some_and(|r| r < 0.0),
        categories: category_breakdown(&expenses),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunwayBand {
    Safe,
    Tight,
    Critical,
}

impl RunwayBand {
    pub fn label(self) -> &'static str {
        match self {
            RunwayBand::Safe => "safe",
            RunwayBand::Tight => "tight",
            RunwayBand::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysSurvivable {
    Days(u64),
    /// Nothing is being spent
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsScenario {
    /// Fraction of daily spend cut, e.g. 0.2
    pub cut: f64,
    pub daily_saving: f64,
    pub days: DaysSurvivable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Runway {
    pub balance: f64,
    pub target_days: u32,
    pub daily_average: f64,
    /// True when the average came from this month's recorded expenses
    pub from_history: bool,
    pub daily_budget: f64,
    pub days: DaysSurvivable,
    pub band: RunwayBand,
    /// `balance - daily_average * target_days`; negative is a shortfall
    pub surplus: f64,
    pub depletion_date: Option<NaiveDate>,
    pub scenarios: Vec<SavingsScenario>,
    /// Largest spending categories this month, reported when not safe
    pub top_categories: Vec<CategorySpend>,
}

fn days_survivable(balance: f64, daily_average: f64) -> DaysSurvivable {
    if daily_average <= 0.0 {
        DaysSurvivable::Unbounded
    } else {
        DaysSurvivable::Days((balance.max(0.0) / daily_average).floor() as u64)
    }
}

fn band(days: DaysSurvivable, target_days: u32) -> RunwayBand {
    let days = match days {
        DaysSurvivable::Unbounded => return RunwayBand::Safe,
        DaysSurvivable::Days(days) => days,
    };
    let target = u64::from(target_days);
    if days >= target {
        RunwayBand::Safe
    } else if days * 10 >= target * 7 {
        RunwayBand::Tight
    } else {
        RunwayBand::Critical
    }
}

/// Project how long `balance` lasts at `daily_average` per day
pub fn project_runway(balance: f64, target_days: u32, daily_average: f64, today: NaiveDate) -> Runway {
    let days = days_survivable(balance, daily_average);
    let depletion_date = match days {
        DaysSurvivable::Days(d) => i64::try_from(d)
            .ok()
            .and_then(|d| today.checked_add_signed(Duration::try_days(d)?)),
        DaysSurvivable::Unbounded => None,
    };
    let scenarios = [0.2, 0.5]
        .into_iter()
        .map(|cut| SavingsScenario {
            cut,
            daily_saving: daily_average * cut,
            days: days_survivable(balance, daily_average * (1.0 - cut)),
        })
        .collect();

    Runway {
        balance,
        target_days,
        daily_average,
        from_history: false,
        daily_budget: if target_days == 0 {
            0.0
        } else {
            balance / f64::from(target_days)
        },
        days,
        band: band(days, target_days),
        surplus: balance - daily_average * f64::from(target_days),
        depletion_date,
        scenarios,
        top_categories: Vec::new(),
    }
}

/// This month's spend divided by the number of distinct days with expenses
pub fn historical_daily_average(db: &Database, today: NaiveDate) -> Option<f64> {
    let expenses = soft("runway", db.expenses_in_month(&utils::month_key(today)));
    let days: HashSet<NaiveDate> = expenses.iter().map(|e| e.date).collect();
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    (!days.is_empty() && total > 0.0).then(|| total / days.len() as f64)
}

/// Runway using this month's history when there is any, else `fallback_average`
pub fn runway(
    db: &Database,
    balance: f64,
    target_days: u32,
    fallback_average: f64,
    today: NaiveDate,
) -> Runway {
    let history = historical_daily_average(db, today);
    let mut projection = project_runway(
        balance,
        target_days,
        history.unwrap_or(fallback_average),
        today,
    );
    projection.from_history = history.is_some();
    if projection.band != RunwayBand::Safe {
        let mut categories = soft("runway", db.category_breakdown(&utils::month_key(today)));
        categories.truncate(3);
        projection.top_categories = categories;
    }
    projection
}
