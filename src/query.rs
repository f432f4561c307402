//! Ordering rules and store-backed listings shared by the CLI and the metric
//! engine.

use chrono::{Datelike, Duration, NaiveDate};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::database::{Database, DatabaseError, Direction, Filter};
use crate::models::{
    Budget, ClipboardItem, DayOfWeek, Expense, Goal, HabitLog, Note, ScheduleEntry, StudySession,
    Task, TaskStatus,
};
use crate::utils;

/// Sort schedule entries by (day number, start time). Stable.
/// Times compare as clock times, so `7:30` comes before `10:00`.
pub fn sort_schedule(entries: &mut [ScheduleEntry]) {
    entries.sort_by(|a, b| {
        a.day
            .number()
            .cmp(&b.day.number())
            .then_with(|| {
                utils::parse_time(&a.start_time)
                    .ok()
                    .cmp(&utils::parse_time(&b.start_time).ok())
            })
            .then_with(|| a.start_time.cmp(&b.start_time))
    });
}

/// Compare two tasks by (status rank, priority rank, deadline ascending).
/// Tasks without a deadline sort after every dated task.
pub fn task_order(a: &Task, b: &Task) -> Ordering {
    a.status
        .rank()
        .cmp(&b.status.rank())
        .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Stable task sort; ties keep their incoming (id) order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(task_order);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl TaskStats {
    /// Completed share of all tasks, in percent
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    pub category: String,
    pub total: f64,
    pub count: usize,
    pub average: f64,
    /// Share of the month's total spend, in percent
    pub share_percent: f64,
}

/// Group expenses by category, largest total first.
/// Categories with equal totals keep first-seen order.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategorySpend> {
    let grand_total: f64 = expenses.iter().map(|e| e.amount).sum();
    let mut order: Vec<String> = Vec::new();
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for expense in expenses {
        let entry = sums.entry(expense.category.clone()).or_insert_with(|| {
            order.push(expense.category.clone());
            (0.0, 0)
        });
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let mut breakdown: Vec<CategorySpend> = order
        .into_iter()
        .filter_map(|category| {
            let (total, count) = sums.get(&category).copied()?;
            Some(CategorySpend {
                average: total / count as f64,
                share_percent: if grand_total > 0.0 {
                    total / grand_total * 100.0
                } else {
                    0.0
                },
                category,
                total,
                count,
            })
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    breakdown
}

/// One cell of a habit's week grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMark {
    pub date: NaiveDate,
    pub day: DayOfWeek,
    pub done: bool,
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

impl Database {
    /// Schedule entries for one day, by start time
    pub fn schedule_for_day(&self, day: DayOfWeek) -> Result<Vec<ScheduleEntry>, DatabaseError> {
        let mut entries: Vec<ScheduleEntry> = self.list(&Filter::new().eq("day", day))?;
        sort_schedule(&mut entries);
        Ok(entries)
    }

    /// Whole week, Monday first
    pub fn weekly_schedule(&self) -> Result<Vec<ScheduleEntry>, DatabaseError> {
        let mut entries: Vec<ScheduleEntry> = self.list(&Filter::new())?;
        sort_schedule(&mut entries);
        Ok(entries)
    }

    /// Tasks in task order, optionally restricted to one status
    pub fn tasks_ordered(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, DatabaseError> {
        let filter = match status {
            Some(status) => Filter::new().eq("status", status),
            None => Filter::new(),
        };
        let mut tasks: Vec<Task> = self.list(&filter)?;
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    /// The first `n` tasks that are not completed, in task order
    pub fn top_open_tasks(&self, n: usize) -> Result<Vec<Task>, DatabaseError> {
        let filter = Filter::new().ne("status", TaskStatus::Completed);
        let mut tasks: Vec<Task> = self.list(&filter)?;
        sort_tasks(&mut tasks);
        tasks.truncate(n);
        Ok(tasks)
    }

    /// Tasks completed on `date`, judged by their update timestamp
    pub fn tasks_completed_on(&self, date: NaiveDate) -> Result<Vec<Task>, DatabaseError> {
        let filter = Filter::new()
            .eq("status", TaskStatus::Completed)
            .like("updated_at", format!("{}%", utils::format_date(date)));
        self.list(&filter)
    }

    pub fn task_stats(&self, today: NaiveDate) -> Result<TaskStats, DatabaseError> {
        let tasks: Vec<Task> = self.list(&Filter::new())?;
        let mut stats = TaskStats {
            total: tasks.len(),
            ..TaskStats::default()
        };
        for task in &tasks {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
            }
            if task.is_overdue(today) {
                stats.overdue += 1;
            }
        }
        Ok(stats)
    }

    /// Notes newest-updated first, optionally in one category
    pub fn notes(&self, category: Option<&str>) -> Result<Vec<Note>, DatabaseError> {
        let mut filter = Filter::new();
        if let Some(category) = category {
            filter = filter.eq("category", category.to_string());
        }
        self.list(&filter.order_by("updated_at", Direction::Desc))
    }

    /// Notes whose title or body contains `term` (case-insensitive for ASCII)
    pub fn search_notes(&self, term: &str) -> Result<Vec<Note>, DatabaseError> {
        let needle = term.trim().to_lowercase();
        let notes = self.notes(None)?;
        Ok(notes
            .into_iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle) || n.body.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Pinned items first, then newest first
    pub fn clipboard_history(&self, limit: u32) -> Result<Vec<ClipboardItem>, DatabaseError> {
        let filter = Filter::new()
            .order_by("pinned", Direction::Desc)
            .order_by("created_at", Direction::Desc)
            .limit(limit);
        self.list(&filter)
    }

    /// Items containing `term` literally (case-insensitive), newest first
    pub fn search_clipboard(&self, term: &str) -> Result<Vec<ClipboardItem>, DatabaseError> {
        let needle = term.trim().to_lowercase();
        let items: Vec<ClipboardItem> =
            self.list(&Filter::new().order_by("created_at", Direction::Desc))?;
        Ok(items
            .into_iter()
            .filter(|item| item.content.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn expenses_on(&self, date: NaiveDate) -> Result<Vec<Expense>, DatabaseError> {
        self.list(&Filter::new().eq("date", utils::format_date(date)))
    }

    /// Expenses dated within a `YYYY-MM` month, oldest first
    pub fn expenses_in_month(&self, month: &str) -> Result<Vec<Expense>, DatabaseError> {
        let month = utils::parse_month(month)
            .ok_or_else(|| DatabaseError::validation("month", "expected YYYY-MM"))?;
        let filter = Filter::new()
            .like("date", format!("{}-%", month))
            .order_by("date", Direction::Asc);
        self.list(&filter)
    }

    /// The most recently set budget for a month, if any
    pub fn latest_budget(&self, month: &str) -> Result<Option<Budget>, DatabaseError> {
        let filter = Filter::new()
            .eq("month", month.to_string())
            .order_by("id", Direction::Desc)
            .limit(1);
        Ok(self.list::<Budget>(&filter)?.into_iter().next())
    }

    pub fn category_breakdown(&self, month: &str) -> Result<Vec<CategorySpend>, DatabaseError> {
        Ok(category_breakdown(&self.expenses_in_month(month)?))
    }

    pub fn study_minutes_on(&self, date: NaiveDate) -> Result<u32, DatabaseError> {
        let sessions: Vec<StudySession> =
            self.list(&Filter::new().eq("date", utils::format_date(date)))?;
        Ok(sessions.iter().map(|s| s.duration_minutes).sum())
    }

    /// Per-day study totals for the `days` most recent days with sessions,
    /// newest first
    pub fn daily_study_totals(&self, days: usize) -> Result<Vec<(NaiveDate, u32)>, DatabaseError> {
        let sessions: Vec<StudySession> = self.list(&Filter::new())?;
        let mut totals: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for session in sessions {
            *totals.entry(session.date).or_default() += session.duration_minutes;
        }
        Ok(totals.into_iter().rev().take(days).collect())
    }

    /// Dates on which a habit has a completed log
    pub fn habit_completed_dates(&self, habit_id: i64) -> Result<HashSet<NaiveDate>, DatabaseError> {
        let filter = Filter::new().eq("habit_id", habit_id).eq("completed", 1);
        let logs: Vec<HabitLog> = self.list(&filter)?;
        Ok(logs.into_iter().map(|log| log.date).collect())
    }

    /// Monday..Sunday marks for the week containing `today`
    pub fn habit_week(&self, habit_id: i64, today: NaiveDate) -> Result<Vec<DayMark>, DatabaseError> {
        let done = self.habit_completed_dates(habit_id)?;
        let monday = week_start(today);
        Ok(DayOfWeek::ALL
            .iter()
            .enumerate()
            .map(|(offset, day)| {
                let date = monday + Duration::days(offset as i64);
                DayMark {
                    date,
                    day: *day,
                    done: done.contains(&date),
                }
            })
            .collect())
    }

    /// Goals by deadline, earliest first
    pub fn goals_by_deadline(&self) -> Result<Vec<Goal>, DatabaseError> {
        self.list(&Filter::new().order_by("deadline", Direction::Asc))
    }

    /// The unfinished goal with the earliest deadline
    pub fn next_reflection_goal(&self) -> Result<Option<Goal>, DatabaseError> {
        let filter = Filter::new()
            .lt("progress", 100)
            .order_by("deadline", Direction::Asc)
            .limit(1);
        Ok(self.list::<Goal>(&filter)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn task(id: i64, status: TaskStatus, priority: Priority, deadline: Option<&str>) -> Task {
        let mut task = Task::new(format!("task {}", id));
        task.id = Some(id);
        task.status = status;
        task.priority = priority;
        task.deadline = deadline.map(|d| utils::parse_date(d).unwrap());
        task
    }

    #[test]
    fn tasks_sort_by_status_priority_then_deadline_nulls_last() {
        let mut tasks = vec![
            task(1, TaskStatus::Completed, Priority::High, Some("2024-01-01")),
            task(2, TaskStatus::Pending, Priority::Low, Some("2024-01-01")),
            task(3, TaskStatus::Pending, Priority::High, None),
            task(4, TaskStatus::Pending, Priority::High, Some("2024-02-01")),
            task(5, TaskStatus::InProgress, Priority::High, Some("2023-01-01")),
            task(6, TaskStatus::Pending, Priority::High, None),
        ];
        sort_tasks(&mut tasks);
        let ids: Vec<i64> = tasks.iter().filter_map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3, 6, 2, 5, 1]);
    }

    #[test]
    fn schedule_sorts_monday_first() {
        let mut entries = vec![
            ScheduleEntry::new(DayOfWeek::Sunday, "Art".into(), "08:00".into(), "09:00".into()),
            ScheduleEntry::new(DayOfWeek::Monday, "Math".into(), "10:00".into(), "11:00".into()),
            ScheduleEntry::new(DayOfWeek::Monday, "Bio".into(), "07:30".into(), "09:00".into()),
        ];
        sort_schedule(&mut entries);
        let subjects: Vec<&str> = entries.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Bio", "Math", "Art"]);
    }

    #[test]
    fn breakdown_orders_by_total_and_computes_share() {
        let date = utils::parse_date("2024-03-01").unwrap();
        let mut food = Expense::new(30.0, date);
        food.category = "Food".into();
        let mut rent = Expense::new(60.0, date);
        rent.category = "Rent".into();
        let mut snack = Expense::new(10.0, date);
        snack.category = "Food".into();

        let breakdown = category_breakdown(&[food, rent, snack]);
        assert_eq!(breakdown[0].category, "Rent");
        assert_eq!(breakdown[1].category, "Food");
        assert_eq!(breakdown[1].count, 2);
        assert!((breakdown[1].average - 20.0).abs() < 1e-9);
        assert!((breakdown[0].share_percent - 60.0).abs() < 1e-9);
    }

    #[test]
    fn week_start_is_monday() {
        let sunday = utils::parse_date("2024-01-07").unwrap();
        assert_eq!(week_start(sunday), utils::parse_date("2024-01-01").unwrap());
    }
}
