use chrono::{Duration, NaiveDate};
use daybook::metrics::{Milestone, habit_streak};
use daybook::{CheckIn, Collection, Database, DatabaseError, Filter, Habit, HabitLog};

fn date(s: &str) -> NaiveDate {
    daybook::utils::parse_date(s).unwrap()
}

fn habit(db: &Database, name: &str) -> i64 {
    db.create(&Habit::new(name.to_string())).unwrap()
}

#[test]
fn check_in_is_idempotent_per_day() {
    let db = Database::open_in_memory().unwrap();
    let id = habit(&db, "Read");
    let today = date("2024-04-10");

    assert!(matches!(db.check_in_habit(id, today).unwrap(), CheckIn::Recorded(_)));
    assert_eq!(db.check_in_habit(id, today).unwrap(), CheckIn::AlreadyLogged);

    let logs: Vec<HabitLog> = db.list(&Filter::new().eq("habit_id", id)).unwrap();
    assert_eq!(logs.len(), 1);
}

#[test]
fn generic_duplicate_log_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let id = habit(&db, "Stretch");
    let today = date("2024-04-10");
    db.create(&HabitLog::new(id, today)).unwrap();

    let err = db.create(&HabitLog::new(id, today)).unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::Duplicate {
            collection: Collection::HabitLogs
        }
    ));
}

#[test]
fn check_in_for_missing_habit_is_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(
        db.check_in_habit(3, date("2024-04-10"))
            .unwrap_err()
            .is_not_found()
    );
}

#[test]
fn streak_counts_consecutive_days_ending_today() {
    let db = Database::open_in_memory().unwrap();
    let id = habit(&db, "Walk");
    let today = date("2024-04-10");
    for back in 0..5 {
        db.check_in_habit(id, today - Duration::days(back)).unwrap();
    }
    // gap on the 5th; the older log on the 3rd does not count
    db.check_in_habit(id, date("2024-04-03")).unwrap();

    let report = habit_streak(&db, id, today).unwrap();
    assert_eq!(report.days, 5);
    assert_eq!(report.milestone, Milestone::Building);
    assert!(report.done_today);
    assert_eq!(report.last_seven.iter().filter(|(_, done)| *done).count(), 5);
}

#[test]
fn streak_is_zero_when_today_is_missing() {
    let db = Database::open_in_memory().unwrap();
    let id = habit(&db, "Meditate");
    let today = date("2024-04-10");
    db.check_in_habit(id, date("2024-04-09")).unwrap();
    db.check_in_habit(id, date("2024-04-08")).unwrap();

    let report = habit_streak(&db, id, today).unwrap();
    assert_eq!(report.days, 0);
    assert_eq!(report.milestone, Milestone::None);
    assert!(!report.done_today);
}

#[test]
fn delete_habit_cascades_to_logs() {
    let db = Database::open_in_memory().unwrap();
    let keep = habit(&db, "Keep");
    let gone = habit(&db, "Gone");
    let today = date("2024-04-10");
    for id in [keep, gone] {
        db.check_in_habit(id, today).unwrap();
        db.check_in_habit(id, today - Duration::days(1)).unwrap();
    }

    assert_eq!(db.delete_habit(gone).unwrap(), 2);
    assert!(habit_streak(&db, gone, today).unwrap_err().is_not_found());
    let orphans: Vec<HabitLog> = db.list(&Filter::new().eq("habit_id", gone)).unwrap();
    assert!(orphans.is_empty());

    assert_eq!(habit_streak(&db, keep, today).unwrap().days, 2);
}

#[test]
fn delete_missing_habit_leaves_logs_alone() {
    let db = Database::open_in_memory().unwrap();
    let id = habit(&db, "Journal");
    db.check_in_habit(id, date("2024-04-10")).unwrap();

    assert!(db.delete_habit(id + 100).unwrap_err().is_not_found());
    let logs: Vec<HabitLog> = db.list(&Filter::new()).unwrap();
    assert_eq!(logs.len(), 1);
}

#[test]
fn week_grid_runs_monday_to_sunday() {
    let db = Database::open_in_memory().unwrap();
    let id = habit(&db, "Gym");
    // 2024-04-10 is a Wednesday
    db.check_in_habit(id, date("2024-04-08")).unwrap();
    db.check_in_habit(id, date("2024-04-10")).unwrap();

    let week = db.habit_week(id, date("2024-04-10")).unwrap();
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date, date("2024-04-08"));
    assert_eq!(week[6].date, date("2024-04-14"));
    let marks: Vec<bool> = week.iter().map(|d| d.done).collect();
    assert_eq!(marks, vec![true, false, true, false, false, false, false]);
}
