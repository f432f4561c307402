pub mod cli;
pub mod config;
pub mod database;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod query;
pub mod utils;

pub use config::Config;
pub use database::{CheckIn, Database, DatabaseError, Direction, Filter, Record};
pub use models::{
    Budget, ClipboardItem, Collection, DayOfWeek, Expense, Goal, GoalReflection, Habit, HabitLog,
    Note, Priority, ScheduleEntry, StudySession, Task, TaskStatus,
};
pub use utils::Profile;
