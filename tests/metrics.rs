use chrono::NaiveDate;
use daybook::metrics::{
    self, DaysSurvivable, DeadlineState, ProductivityBand, RunwayBand, goal_time_progress,
    productivity_score,
};
use daybook::{Database, Expense, Goal, Habit, StudySession, Task};

fn date(s: &str) -> NaiveDate {
    daybook::utils::parse_date(s).unwrap()
}

fn expense(db: &Database, amount: f64, category: &str, on: NaiveDate) {
    let mut e = Expense::new(amount, on);
    e.category = category.to_string();
    db.create(&e).unwrap();
}

#[test]
fn empty_store_scores_zero() {
    let db = Database::open_in_memory().unwrap();
    let report = productivity_score(&db, date("2024-05-10"));
    assert_eq!(report.score, 0);
    assert_eq!(report.band, ProductivityBand::NeedsEffort);
}

#[test]
fn categories_without_data_do_not_count_against_the_score() {
    let db = Database::open_in_memory().unwrap();
    let today = date("2024-05-10");

    for name in ["Submit form", "Call bank"] {
        let id = db.create(&Task::new(name.to_string())).unwrap();
        // completion time is pinned so the test does not depend on the clock
        db.conn()
            .execute(
                "UPDATE tasks SET status = 'completed', updated_at = '2024-05-10 17:45:00' WHERE id = ?1",
                [id],
            )
            .unwrap();
    }
    // finished yesterday: neither open nor completed today
    let old = db.create(&Task::new("Old".to_string())).unwrap();
    db.conn()
        .execute(
            "UPDATE tasks SET status = 'completed', updated_at = '2024-05-09 23:59:59' WHERE id = ?1",
            [old],
        )
        .unwrap();
    db.set_budget("2024-05", 3_000_000.0).unwrap();
    expense(&db, 40_000.0, "Food", today);

    let report = productivity_score(&db, today);
    assert_eq!(report.activity.completed_today, 2);
    assert_eq!(report.tasks.points, Some(25));
    assert_eq!(report.expenses.points, Some(25));
    assert_eq!(report.habits.points, None);
    assert_eq!(report.study.points, None);
    assert_eq!(report.score, 100);
    assert_eq!(report.band, ProductivityBand::Outstanding);
}

#[test]
fn partial_day_is_normalised_over_applicable_categories() {
    let db = Database::open_in_memory().unwrap();
    let today = date("2024-05-10");

    // tasks: 0 of 2 done -> 0/25
    db.create(&Task::new("Open one".to_string())).unwrap();
    db.create(&Task::new("Open two".to_string())).unwrap();
    // habits: 1 of 2 done -> 15/25
    let read = db.create(&Habit::new("Read".to_string())).unwrap();
    db.create(&Habit::new("Run".to_string())).unwrap();
    db.check_in_habit(read, today).unwrap();
    // study: 45 minutes -> 15/25
    db.create(&StudySession::new(today, 45)).unwrap();

    let report = productivity_score(&db, today);
    assert_eq!(report.tasks.points, Some(0));
    assert_eq!(report.habits.points, Some(15));
    assert_eq!(report.study.points, Some(15));
    assert_eq!(report.expenses.points, None);
    // 30 of 75
    assert_eq!(report.score, 40);
    assert_eq!(report.band, ProductivityBand::Fair);
}

#[test]
fn runway_uses_supplied_average_without_history() {
    let db = Database::open_in_memory().unwrap();
    let today = date("2024-05-15");
    let runway = metrics::runway(&db, 300_000.0, 10, 50_000.0, today);

    assert!(!runway.from_history);
    assert_eq!(runway.days, DaysSurvivable::Days(6));
    assert_eq!(runway.band, RunwayBand::Critical);
    assert_eq!(runway.depletion_date, Some(date("2024-05-21")));
    assert!(runway.top_categories.is_empty());
}

#[test]
fn runway_prefers_this_months_history() {
    let db = Database::open_in_memory().unwrap();
    let today = date("2024-05-15");
    expense(&db, 30_000.0, "Food", date("2024-05-01"));
    expense(&db, 10_000.0, "Transport", date("2024-05-01"));
    expense(&db, 20_000.0, "Food", date("2024-05-02"));
    expense(&db, 90_000.0, "Rent", date("2024-04-30"));

    // 60k over 2 distinct days
    let runway = metrics::runway(&db, 600_000.0, 30, 1.0, today);
    assert!(runway.from_history);
    assert_eq!(runway.daily_average, 30_000.0);
    assert_eq!(runway.days, DaysSurvivable::Days(20));
    assert_eq!(runway.band, RunwayBand::Critical);
    let top: Vec<&str> = runway
        .top_categories
        .iter()
        .map(|c| c.category.as_str())
        .collect();
    assert_eq!(top, vec!["Food", "Transport"]);
}

#[test]
fn budget_variance_reports_remaining_and_overrun() {
    let db = Database::open_in_memory().unwrap();
    expense(&db, 700.0, "Food", date("2024-06-03"));
    expense(&db, 500.0, "Bills", date("2024-06-20"));

    let none = metrics::budget_variance(&db, "2024-06");
    assert_eq!(none.spent, 1_200.0);
    assert!(none.limit.is_none());
    assert!(!none.over_budget);

    db.set_budget("2024-06", 1_000.0).unwrap();
    let over = metrics::budget_variance(&db, "2024-06");
    assert_eq!(over.remaining, Some(-200.0));
    assert!(over.over_budget);
    assert_eq!(over.categories[0].category, "Food");
}

#[test]
fn goal_time_progress_halfway() {
    let db = Database::open_in_memory().unwrap();
    let mut goal = Goal::new("Finish thesis".to_string(), date("2024-01-11"));
    goal.created_at = daybook::utils::parse_timestamp("2024-01-01 09:30:00").unwrap();
    goal.set_progress(20);
    let id = db.create(&goal).unwrap();

    let progress = goal_time_progress(&db, id, date("2024-01-06")).unwrap();
    assert_eq!(progress.elapsed_percent, 50);
    assert_eq!(progress.goal.progress, 20);
    assert_eq!(progress.days_left, 5);
    assert_eq!(progress.state, DeadlineState::Upcoming);
    assert_eq!(progress.pace, metrics::Pace::Behind);

    let late = goal_time_progress(&db, id, date("2024-02-01")).unwrap();
    assert_eq!(late.elapsed_percent, 100);
    assert_eq!(late.state, DeadlineState::Overdue);
}

#[test]
fn goal_time_progress_missing_goal_is_not_found() {
    let db = Database::open_in_memory().unwrap();
    let err = goal_time_progress(&db, 9, date("2024-01-06")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn delete_goal_cascades_to_reflections() {
    let db = Database::open_in_memory().unwrap();
    let id = db
        .create(&Goal::new("Save 10m".to_string(), date("2024-12-31")))
        .unwrap();
    db.add_goal_reflection(id, "Progress?", "On track", date("2024-03-01"))
        .unwrap();
    db.add_goal_reflection(id, "Blockers?", "None", date("2024-03-08"))
        .unwrap();

    assert_eq!(db.delete_goal(id).unwrap(), 2);
    assert!(goal_time_progress(&db, id, date("2024-03-09")).unwrap_err().is_not_found());
}

#[test]
fn dashboard_collects_open_work() {
    let db = Database::open_in_memory().unwrap();
    let today = date("2024-05-15");
    for n in 0..5 {
        db.create(&Task::new(format!("task {}", n))).unwrap();
    }
    let done = db.create(&Goal::new("Done".to_string(), date("2024-05-20"))).unwrap();
    db.set_goal_progress(done, 100, None).unwrap();
    for (target, deadline) in [("Far", "2025-01-01"), ("Near", "2024-06-01"), ("Mid", "2024-09-01")] {
        db.create(&Goal::new(target.to_string(), date(deadline))).unwrap();
    }
    db.create(&Habit::new("Water".to_string())).unwrap();

    let dash = metrics::snapshot(&db, today);
    assert_eq!(dash.top_tasks.len(), 3);
    let goals: Vec<&str> = dash.goals.iter().map(|g| g.goal.target.as_str()).collect();
    assert_eq!(goals, vec!["Near", "Mid"]);
    assert_eq!(dash.habits.len(), 1);
    assert!(!dash.habits[0].done_today);
    assert_eq!(dash.budget.month, "2024-05");
}
