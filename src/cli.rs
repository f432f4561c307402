use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use thiserror::Error;

use crate::config::Config;
use crate::database::{CheckIn, Database, DatabaseError, Filter};
use crate::export::{self, ExportError, ExportKind};
use crate::metrics::{self, DaysSurvivable};
use crate::models::{
    ClipboardItem, DayOfWeek, Expense, Goal, Habit, Note, Priority, ScheduleEntry, Task, TaskStatus,
};
use crate::utils::{self, parse_date};

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Schedules, notes, tasks, money, habits and goals in one local file")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a class to the weekly schedule
    AddClass {
        /// Day name, abbreviation or number (Monday=1)
        day: String,
        subject: String,
        /// Start time (HH:MM)
        start: String,
        /// End time (HH:MM)
        end: String,
        #[arg(long)]
        room: Option<String>,
        #[arg(long)]
        instructor: Option<String>,
        /// Colour as #RRGGBB
        #[arg(long)]
        color: Option<String>,
    },
    /// Change fields of a class
    EditClass {
        id: i64,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<String>,
        /// End time (HH:MM)
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        room: Option<String>,
        #[arg(long)]
        instructor: Option<String>,
        /// Colour as #RRGGBB
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a class from the schedule
    DeleteClass { id: i64 },
    /// Show the schedule for one day, or the whole week
    Schedule {
        #[arg(long)]
        day: Option<String>,
    },
    /// Add a task
    AddTask {
        description: String,
        /// High, Medium or Low
        #[arg(long, default_value = "Medium")]
        priority: String,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Estimated hours
        #[arg(long)]
        estimate: Option<f64>,
    },
    /// Move a task to pending, in_progress or completed
    TaskStatus { id: i64, status: String },
    /// List tasks by status, priority and deadline
    Tasks {
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a task
    DeleteTask { id: i64 },
    /// Add a note
    AddNote {
        title: String,
        #[arg(long)]
        body: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// List notes, newest first
    Notes {
        #[arg(long)]
        category: Option<String>,
        /// Only notes whose title or body contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Change the title, body, tags or category of a note
    EditNote {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Toggle the favorite flag on a note
    FavoriteNote { id: i64 },
    /// Delete a note
    DeleteNote { id: i64 },
    /// Save a snippet to the clipboard history and copy it
    Clip { content: String },
    /// Show clipboard history, pinned first
    Clips {
        #[arg(long)]
        search: Option<String>,
    },
    /// Toggle the pinned flag on a clipboard item
    PinClip { id: i64 },
    /// Copy a saved clipboard item back to the system clipboard
    CopyClip { id: i64 },
    /// Remove an item from the clipboard history
    DeleteClip { id: i64 },
    /// Write notes, clipboard history or the schedule to a JSON file
    Export {
        /// notes, clipboard or schedule
        kind: String,
        /// Output file, defaults to a timestamped file in the exports directory
        #[arg(long)]
        output: Option<String>,
    },
    /// Record an expense
    AddExpense {
        amount: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a recorded expense
    DeleteExpense { id: i64 },
    /// Set the monthly budget
    SetBudget {
        limit: String,
        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    /// Show spending against the monthly budget
    Budget {
        #[arg(long)]
        month: Option<String>,
    },
    /// Add a habit to track
    AddHabit {
        name: String,
        #[arg(long)]
        glyph: Option<String>,
    },
    /// Mark a habit done for a day
    CheckIn {
        habit_id: i64,
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the current streak of every habit
    Streaks,
    /// Monday to Sunday check-in grid for every habit
    HabitWeek,
    /// Delete a habit and all of its check-ins
    DeleteHabit { id: i64 },
    /// Add a long-term goal
    AddGoal {
        target: String,
        /// Deadline (YYYY-MM-DD)
        deadline: String,
    },
    /// Update goal progress (0-100)
    GoalProgress {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        progress: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show goals against elapsed time
    Goals,
    /// Delete a goal and all of its reflections
    DeleteGoal { id: i64 },
    /// Answer a reflection prompt for a goal
    Reflect {
        goal_id: i64,
        answer: String,
        #[arg(long, default_value = "What moved this goal forward today?")]
        prompt: String,
    },
    /// Record a study session
    LogStudy {
        minutes: u32,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Study minutes per day for the most recent days with sessions
    StudyStats {
        #[arg(long, default_value_t = 7)]
        days: usize,
    },
    /// Score today's productivity
    Score,
    /// Project how long a balance lasts
    Runway {
        balance: String,
        /// Days the balance has to last
        #[arg(long)]
        days: Option<u32>,
        /// Daily spend to assume when this month has no expenses
        #[arg(long)]
        average: Option<String>,
    },
    /// Summary of tasks, budget, habits and goals (default)
    Dashboard,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Clipboard unavailable: {0}")]
    ClipboardError(String),
    #[error("Export failed: {0}")]
    ExportError(#[from] ExportError),
}

fn date_or_today(value: Option<String>, today: NaiveDate) -> Result<NaiveDate, CliError> {
    match value {
        Some(s) => parse_date(&s)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", s, e))),
        None => Ok(today),
    }
}

fn amount(value: &str) -> Result<f64, CliError> {
    utils::parse_amount(value)
        .ok_or_else(|| CliError::InvalidArgument(format!("'{}' is not an amount", value)))
}

/// An amount that must be zero or more, e.g. a balance or a daily spend
fn non_negative_amount(value: &str) -> Result<f64, CliError> {
    let parsed = amount(value)?;
    if parsed < 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "'{}' must not be negative",
            value
        )));
    }
    Ok(parsed)
}

fn parse_arg<T>(value: &str) -> Result<T, CliError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| CliError::InvalidArgument(e.to_string()))
}

/// Match a category against the configured list, keeping the configured spelling
fn expense_category(config: &Config, value: Option<String>) -> Result<String, CliError> {
    let Some(value) = value else {
        return Ok(Expense::DEFAULT_CATEGORY.to_string());
    };
    config
        .expense_categories
        .iter()
        .find(|c| c.eq_ignore_ascii_case(value.trim()))
        .cloned()
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "unknown category '{}' (expected one of: {})",
                value,
                config.expense_categories.join(", ")
            ))
        })
}

fn copy_to_system_clipboard(text: &str) -> Result<(), CliError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| CliError::ClipboardError(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| CliError::ClipboardError(e.to_string()))
}

/// Render money with thousands separators and no decimals
pub fn format_money(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if rounded < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

fn print_task(task: &Task, today: NaiveDate) {
    let deadline = task
        .deadline
        .map(utils::format_date)
        .unwrap_or_else(|| "-".to_string());
    let overdue = if task.is_overdue(today) { " (overdue)" } else { "" };
    println!(
        "#{:<4} [{:<11}] {:<6} {} due {}{}",
        task.id.unwrap_or_default(),
        task.status.as_str(),
        task.priority.as_str(),
        task.description,
        deadline,
        overdue
    );
}

/// Dispatch one command against the store
pub fn run(command: Commands, db: &Database, config: &Config, today: NaiveDate) -> Result<(), CliError> {
    info!("event=cli_command module=cli status=start");
    match command {
        Commands::AddClass {
            day,
            subject,
            start,
            end,
            room,
            instructor,
            color,
        } => {
            let mut entry = ScheduleEntry::new(parse_arg(&day)?, subject, start, end);
            entry.room = room;
            entry.instructor = instructor;
            if let Some(color) = color {
                entry.color_code = color;
            }
            let id = db.create(&entry)?;
            println!("Class added to {} (ID: {})", entry.day, id);
            Ok(())
        }
        Commands::EditClass {
            id,
            day,
            subject,
            start,
            end,
            room,
            instructor,
            color,
        } => {
            let mut entry: ScheduleEntry = db.get(id)?;
            if let Some(day) = day {
                entry.day = parse_arg(&day)?;
            }
            if let Some(subject) = subject {
                entry.subject = subject;
            }
            if let Some(start) = start {
                entry.start_time = start;
            }
            if let Some(end) = end {
                entry.end_time = end;
            }
            if let Some(room) = room {
                entry.room = Some(room).filter(|r| !r.trim().is_empty());
            }
            if let Some(instructor) = instructor {
                entry.instructor = Some(instructor).filter(|i| !i.trim().is_empty());
            }
            if let Some(color) = color {
                entry.color_code = color;
            }
            db.update(&mut entry)?;
            println!("Class {} updated", id);
            Ok(())
        }
        Commands::DeleteClass { id } => {
            db.delete::<ScheduleEntry>(id)?;
            println!("Class {} deleted", id);
            Ok(())
        }
        Commands::Schedule { day } => {
            let entries = match day {
                Some(day) => db.schedule_for_day(parse_arg::<DayOfWeek>(&day)?)?,
                None => db.weekly_schedule()?,
            };
            for e in entries {
                println!(
                    "{:<9} {}-{} {:<24} {} {}",
                    e.day.as_str(),
                    e.start_time,
                    e.end_time,
                    e.subject,
                    e.room.unwrap_or_default(),
                    e.instructor.unwrap_or_default()
                );
            }
            Ok(())
        }
        Commands::AddTask {
            description,
            priority,
            deadline,
            category,
            estimate,
        } => handle_add_task(db, description, &priority, deadline, category, estimate),
        Commands::TaskStatus { id, status } => {
            let task = db.set_task_status(id, parse_arg(&status)?)?;
            println!("Task {} is now {}", id, task.status);
            Ok(())
        }
        Commands::Tasks { status } => handle_tasks(db, status, today),
        Commands::DeleteTask { id } => {
            db.delete::<Task>(id)?;
            println!("Task {} deleted", id);
            Ok(())
        }
        Commands::AddNote {
            title,
            body,
            tags,
            category,
        } => {
            let mut note = Note::new(title, body);
            note.tags = tags.as_deref().map(Note::parse_tags).unwrap_or_default();
            if let Some(category) = category {
                note.category = category;
            }
            let id = db.create(&note)?;
            println!("Note created successfully (ID: {})", id);
            Ok(())
        }
        Commands::Notes { category, search } => {
            let notes = match search {
                Some(term) => db.search_notes(&term)?,
                None => db.notes(category.as_deref())?,
            };
            for note in notes {
                let star = if note.favorite { "*" } else { " " };
                println!(
                    "{}#{:<4} {} [{}] {}",
                    star,
                    note.id.unwrap_or_default(),
                    note.title,
                    note.category,
                    note.tags.join(", ")
                );
            }
            Ok(())
        }
        Commands::EditNote {
            id,
            title,
            body,
            tags,
            category,
        } => handle_edit_note(db, id, title, body, tags, category),
        Commands::DeleteNote { id } => {
            db.delete::<Note>(id)?;
            println!("Note {} deleted", id);
            Ok(())
        }
        Commands::FavoriteNote { id } => {
            let favorite = db.toggle_note_favorite(id)?;
            println!("Note {} {}", id, if favorite { "starred" } else { "unstarred" });
            Ok(())
        }
        Commands::Clip { content } => {
            let id = db.create(&ClipboardItem::new(content.clone()))?;
            println!("Saved to clipboard history (ID: {})", id);
            if let Err(e) = copy_to_system_clipboard(&content) {
                println!("Not copied: {}", e);
            }
            Ok(())
        }
        Commands::Clips { search } => {
            let items = match search {
                Some(term) => db.search_clipboard(&term)?,
                None => db.clipboard_history(config.clipboard_history_limit)?,
            };
            for item in items {
                let pin = if item.pinned { "^" } else { " " };
                let preview: String = item.content.chars().take(60).collect();
                println!("{}#{:<4} {}", pin, item.id.unwrap_or_default(), preview.replace('\n', " "));
            }
            Ok(())
        }
        Commands::PinClip { id } => {
            let pinned = db.toggle_clipboard_pin(id)?;
            println!("Clipboard item {} {}", id, if pinned { "pinned" } else { "unpinned" });
            Ok(())
        }
        Commands::CopyClip { id } => {
            let item: ClipboardItem = db.get(id)?;
            copy_to_system_clipboard(&item.content)?;
            println!("Copied clipboard item {}", id);
            Ok(())
        }
        Commands::DeleteClip { id } => {
            db.delete::<ClipboardItem>(id)?;
            println!("Clipboard item {} deleted", id);
            Ok(())
        }
        Commands::Export { kind, output } => {
            let kind: ExportKind = kind.parse()?;
            let now = utils::now_local();
            let (json, total) = export::export_json(db, kind, now)?;
            let path = match output {
                Some(path) => utils::expand_path(&path),
                None => config
                    .get_export_dir()
                    .join(export::default_file_name(kind, now)),
            };
            export::write_file(&path, &json)?;
            info!(
                "event=export module=cli status=ok collection={} records={}",
                kind.collection(),
                total
            );
            println!("Exported {} record(s) to {}", total, path.display());
            Ok(())
        }
        Commands::DeleteExpense { id } => {
            db.delete::<Expense>(id)?;
            println!("Expense {} deleted", id);
            Ok(())
        }
        Commands::AddExpense {
            amount: value,
            category,
            description,
            date,
        } => {
            let mut expense = Expense::new(amount(&value)?, date_or_today(date, today)?);
            expense.category = expense_category(config, category)?;
            expense.description = description.unwrap_or_default();
            let id = db.create(&expense)?;
            println!(
                "Expense recorded (ID: {}): {} on {}",
                id,
                format_money(expense.amount),
                expense.category
            );
            Ok(())
        }
        Commands::SetBudget { limit, month } => {
            let month = month.unwrap_or_else(|| utils::month_key(today));
            let limit = amount(&limit)?;
            db.set_budget(&month, limit)?;
            println!("Budget for {} set to {}", month, format_money(limit));
            Ok(())
        }
        Commands::Budget { month } => {
            let month = month.unwrap_or_else(|| utils::month_key(today));
            print_budget(&metrics::budget_variance(db, &month));
            Ok(())
        }
        Commands::AddHabit { name, glyph } => {
            let mut habit = Habit::new(name);
            if let Some(glyph) = glyph {
                habit.glyph = glyph;
            }
            let id = db.create(&habit)?;
            println!("Habit created successfully (ID: {})", id);
            Ok(())
        }
        Commands::CheckIn { habit_id, date } => {
            let date = date_or_today(date, today)?;
            match db.check_in_habit(habit_id, date)? {
                CheckIn::Recorded(_) => println!("Checked in for {}", utils::format_date(date)),
                CheckIn::AlreadyLogged => {
                    println!("Already checked in for {}", utils::format_date(date))
                }
            }
            let streak = metrics::habit_streak(db, habit_id, today)?;
            println!("Streak: {} day(s), {}", streak.days, streak.milestone.label());
            Ok(())
        }
        Commands::Streaks => {
            for streak in metrics::all_streaks(db, today) {
                let week: String = streak
                    .last_seven
                    .iter()
                    .map(|(_, done)| if *done { '#' } else { '.' })
                    .collect();
                println!(
                    "{} {:<20} {:>3} day(s)  {}  {}",
                    streak.glyph,
                    streak.name,
                    streak.days,
                    week,
                    streak.milestone.label()
                );
            }
            Ok(())
        }
        Commands::HabitWeek => {
            let habits: Vec<Habit> = db.list(&Filter::new())?;
            for habit in habits {
                let Some(id) = habit.id else { continue };
                let week = db.habit_week(id, today)?;
                let cells: Vec<&str> = week
                    .iter()
                    .map(|mark| {
                        if mark.done {
                            "x"
                        } else if mark.date <= today {
                            "-"
                        } else {
                            "."
                        }
                    })
                    .collect();
                let done = week.iter().filter(|mark| mark.done).count();
                println!(
                    "{} {:<20} {}  {}/7",
                    habit.glyph,
                    habit.name,
                    cells.join(" "),
                    done
                );
            }
            Ok(())
        }
        Commands::DeleteHabit { id } => {
            let logs = db.delete_habit(id)?;
            println!("Habit {} deleted with {} check-in(s)", id, logs);
            Ok(())
        }
        Commands::AddGoal { target, deadline } => {
            let deadline = date_or_today(Some(deadline), today)?;
            let id = db.create(&Goal::new(target, deadline))?;
            println!("Goal created successfully (ID: {})", id);
            Ok(())
        }
        Commands::GoalProgress {
            id,
            progress,
            notes,
        } => {
            let goal = db.set_goal_progress(id, progress, notes)?;
            println!("Goal {} at {}%", id, goal.progress);
            Ok(())
        }
        Commands::Goals => {
            for progress in metrics::all_goal_progress(db, today) {
                println!(
                    "#{:<4} {:<30} progress {:>3}%  time {:>3}%  {} day(s) left  {:?} {:?}",
                    progress.goal.id.unwrap_or_default(),
                    progress.goal.target,
                    progress.goal.progress,
                    progress.elapsed_percent,
                    progress.days_left,
                    progress.state,
                    progress.pace
                );
            }
            Ok(())
        }
        Commands::DeleteGoal { id } => {
            let reflections = db.delete_goal(id)?;
            println!("Goal {} deleted with {} reflection(s)", id, reflections);
            Ok(())
        }
        Commands::Reflect {
            goal_id,
            answer,
            prompt,
        } => {
            db.add_goal_reflection(goal_id, &prompt, &answer, today)?;
            let progress = metrics::goal_time_progress(db, goal_id, today)?;
            println!(
                "Reflection saved. {}% done with {}% of the time used",
                progress.goal.progress, progress.elapsed_percent
            );
            Ok(())
        }
        Commands::LogStudy {
            minutes,
            subject,
            date,
        } => {
            let date = date_or_today(date, today)?;
            db.log_study_session(date, minutes, subject.as_deref().unwrap_or_default())?;
            println!(
                "Logged {} minute(s); {} today",
                minutes,
                db.study_minutes_on(today)?
            );
            Ok(())
        }
        Commands::StudyStats { days } => {
            let totals = db.daily_study_totals(days)?;
            if totals.is_empty() {
                println!("No study sessions yet");
                return Ok(());
            }
            let mut sum = 0;
            for (date, minutes) in &totals {
                println!(
                    "{}  {:>4} min  {:>5.1} h",
                    utils::format_date(*date),
                    minutes,
                    f64::from(*minutes) / 60.0
                );
                sum += minutes;
            }
            println!("Total: {} min ({:.1} h)", sum, f64::from(sum) / 60.0);
            Ok(())
        }
        Commands::Score => {
            print_score(&metrics::productivity_score(db, today));
            Ok(())
        }
        Commands::Runway {
            balance,
            days,
            average,
        } => {
            let balance = non_negative_amount(&balance)?;
            let fallback = match average {
                Some(value) => non_negative_amount(&value)?,
                None => config.fallback_daily_spend,
            };
            let target = days.unwrap_or(config.runway_target_days);
            print_runway(&metrics::runway(db, balance, target, fallback, today));
            Ok(())
        }
        Commands::Dashboard => {
            print_dashboard(&metrics::snapshot(db, today));
            Ok(())
        }
    }
}

/// Handle the add-task command
fn handle_add_task(
    db: &Database,
    description: String,
    priority: &str,
    deadline: Option<String>,
    category: Option<String>,
    estimate: Option<f64>,
) -> Result<(), CliError> {
    let mut task = Task::new(description);
    task.priority = parse_arg::<Priority>(priority)?;
    if let Some(due) = deadline {
        task.deadline = Some(parse_date(&due).map_err(|e| {
            CliError::DateParseError(format!("Invalid date format '{}': {}", due, e))
        })?);
    }
    if let Some(category) = category {
        task.category = category;
    }
    task.estimated_hours = estimate;

    let id = db.create(&task)?;
    println!("Task created successfully (ID: {})", id);
    Ok(())
}

fn handle_edit_note(
    db: &Database,
    id: i64,
    title: Option<String>,
    body: Option<String>,
    tags: Option<String>,
    category: Option<String>,
) -> Result<(), CliError> {
    let mut note: Note = db.get(id)?;
    if let Some(title) = title {
        note.title = title;
    }
    if let Some(body) = body {
        note.body = body;
    }
    if let Some(tags) = tags {
        note.tags = Note::parse_tags(&tags);
    }
    if let Some(category) = category {
        note.category = category;
    }
    db.update(&mut note)?;
    println!("Note {} updated", id);
    Ok(())
}

fn handle_tasks(db: &Database, status: Option<String>, today: NaiveDate) -> Result<(), CliError> {
    let status = status.as_deref().map(parse_arg::<TaskStatus>).transpose()?;
    for task in db.tasks_ordered(status)? {
        print_task(&task, today);
    }
    let stats = db.task_stats(today)?;
    println!(
        "{} task(s): {} pending, {} in progress, {} completed, {} overdue ({:.0}% done)",
        stats.total,
        stats.pending,
        stats.in_progress,
        stats.completed,
        stats.overdue,
        stats.completion_rate()
    );
    Ok(())
}

fn print_budget(variance: &metrics::BudgetVariance) {
    println!("Budget {}", variance.month);
    println!("  spent     {}", format_money(variance.spent));
    match (variance.limit, variance.remaining) {
        (Some(limit), Some(remaining)) => {
            println!("  limit     {}", format_money(limit));
            if variance.over_budget {
                println!("  over by   {}", format_money(-remaining));
            } else {
                println!("  remaining {}", format_money(remaining));
            }
        }
        _ => println!("  no budget set"),
    }
    for c in &variance.categories {
        println!(
            "  {:<14} {:>12} {:>3} item(s) {:>5.1}%",
            c.category,
            format_money(c.total),
            c.count,
            c.share_percent
        );
    }
}

fn points(score: metrics::productivity::CategoryScore) -> String {
    score
        .points
        .map(|p| format!("{}/25", p))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_score(report: &metrics::ProductivityReport) {
    let a = &report.activity;
    println!("Productivity {}/100 ({})", report.score, report.band.label());
    println!(
        "  tasks    {:>6}  {} completed today, {} open",
        points(report.tasks),
        a.completed_today,
        a.open_tasks
    );
    println!(
        "  habits   {:>6}  {}/{} ({:.0}%)",
        points(report.habits),
        a.habits_done,
        a.habits_total,
        report.habit_rate()
    );
    println!("  study    {:>6}  {} minute(s)", points(report.study), a.study_minutes);
    println!(
        "  expenses {:>6}  {} spent today",
        points(report.expenses),
        format_money(a.expense_today)
    );
    for suggestion in &report.suggestions {
        println!("  - {}", suggestion.message());
    }
}

fn days_text(days: DaysSurvivable) -> String {
    match days {
        DaysSurvivable::Days(d) => format!("{} day(s)", d),
        DaysSurvivable::Unbounded => "unbounded".to_string(),
    }
}

fn print_runway(r: &metrics::Runway) {
    let source = if r.from_history { "this month" } else { "assumed" };
    println!("Balance {} over {} day(s)", format_money(r.balance), r.target_days);
    println!("  daily budget   {}", format_money(r.daily_budget));
    println!("  daily average  {} ({})", format_money(r.daily_average), source);
    println!("  lasts          {} [{}]", days_text(r.days), r.band.label());
    if r.surplus >= 0.0 {
        println!("  surplus        {}", format_money(r.surplus));
    } else {
        println!("  shortfall      {}", format_money(-r.surplus));
    }
    if let Some(date) = r.depletion_date {
        println!("  runs out on    {}", utils::format_date(date));
    }
    for s in &r.scenarios {
        println!(
            "  spend {:.0}% less ({} per day saved): {}",
            s.cut * 100.0,
            format_money(s.daily_saving),
            days_text(s.days)
        );
    }
    for (i, c) in r.top_categories.iter().enumerate() {
        println!(
            "  cut #{} {}: {} ({} per item)",
            i + 1,
            c.category,
            format_money(c.total),
            format_money(c.average)
        );
    }
}

fn print_dashboard(d: &metrics::Dashboard) {
    println!("{}", utils::format_date(d.today));
    println!("Top tasks:");
    if d.top_tasks.is_empty() {
        println!("  nothing open");
    }
    for task in &d.top_tasks {
        print!("  ");
        print_task(task, d.today);
    }
    print_budget(&d.budget);
    println!("Habits:");
    for h in &d.habits {
        let mark = if h.done_today { "x" } else { " " };
        println!("  [{}] {} {} ({} day streak)", mark, h.glyph, h.name, h.days);
    }
    println!("Goals:");
    for g in &d.goals {
        println!(
            "  {} by {}: {}% done, {}% of time used",
            g.goal.target,
            utils::format_date(g.goal.deadline),
            g.goal.progress,
            g.elapsed_percent
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_gets_thousands_separators() {
        assert_eq!(format_money(0.0), "0");
        assert_eq!(format_money(1234567.4), "1,234,567");
        assert_eq!(format_money(-50000.0), "-50,000");
        assert_eq!(format_money(999.5), "1,000");
    }

    #[test]
    fn categories_match_configured_spelling() {
        let config = Config::default();
        assert_eq!(expense_category(&config, Some("food".into())).unwrap(), "Food");
        assert_eq!(expense_category(&config, None).unwrap(), "Other");
        assert!(expense_category(&config, Some("yachts".into())).is_err());
    }

    fn today() -> NaiveDate {
        parse_date("2024-05-15").unwrap()
    }

    #[test]
    fn runway_rejects_negative_balance_and_average() {
        let db = Database::open_in_memory().unwrap();
        let config = Config::default();
        let negative_average = Commands::Runway {
            balance: "1000".to_string(),
            days: Some(10),
            average: Some("-50".to_string()),
        };
        assert!(matches!(
            run(negative_average, &db, &config, today()),
            Err(CliError::InvalidArgument(_))
        ));

        let negative_balance = Commands::Runway {
            balance: "-1000".to_string(),
            days: Some(10),
            average: None,
        };
        assert!(matches!(
            run(negative_balance, &db, &config, today()),
            Err(CliError::InvalidArgument(_))
        ));

        assert_eq!(non_negative_amount("0").unwrap(), 0.0);
    }

    #[test]
    fn edit_note_changes_only_given_fields() {
        let db = Database::open_in_memory().unwrap();
        let mut note = Note::new("Draft".to_string(), "Body".to_string());
        note.tags = vec!["old".to_string()];
        let id = db.create(&note).unwrap();

        let edit = Commands::EditNote {
            id,
            title: Some("Final".to_string()),
            body: None,
            tags: Some("rust, cli".to_string()),
            category: None,
        };
        run(edit, &db, &Config::default(), today()).unwrap();

        let stored: Note = db.get(id).unwrap();
        assert_eq!(stored.title, "Final");
        assert_eq!(stored.body, "Body");
        assert_eq!(stored.tags, vec!["rust", "cli"]);
        assert_eq!(stored.category, "General");
    }

    #[test]
    fn edit_class_validates_new_times() {
        let db = Database::open_in_memory().unwrap();
        let entry = ScheduleEntry::new(
            DayOfWeek::Monday,
            "Physics".to_string(),
            "08:00".to_string(),
            "09:40".to_string(),
        );
        let id = db.create(&entry).unwrap();
        let edit = |start: &str, end: &str| Commands::EditClass {
            id,
            day: Some("tue".to_string()),
            subject: None,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            room: Some("B-201".to_string()),
            instructor: None,
            color: None,
        };

        assert!(run(edit("11:00", "10:00"), &db, &Config::default(), today()).is_err());
        run(edit("9:05", "10:45"), &db, &Config::default(), today()).unwrap();

        let stored: ScheduleEntry = db.get(id).unwrap();
        assert_eq!(stored.day, DayOfWeek::Tuesday);
        assert_eq!(stored.start_time, "09:05");
        assert_eq!(stored.room.as_deref(), Some("B-201"));
    }

    #[test]
    fn delete_commands_remove_records() {
        let db = Database::open_in_memory().unwrap();
        let config = Config::default();
        let task = db.create(&Task::new("Drop me".to_string())).unwrap();
        let expense = db
            .create(&Expense::new(5_000.0, today()))
            .unwrap();
        let goal = db
            .create(&Goal::new("Ship it".to_string(), today()))
            .unwrap();
        db.add_goal_reflection(goal, "Why?", "Because", today()).unwrap();

        run(Commands::DeleteTask { id: task }, &db, &config, today()).unwrap();
        run(Commands::DeleteExpense { id: expense }, &db, &config, today()).unwrap();
        run(Commands::DeleteGoal { id: goal }, &db, &config, today()).unwrap();

        assert!(db.get::<Task>(task).unwrap_err().is_not_found());
        assert!(db.get::<Expense>(expense).unwrap_err().is_not_found());
        assert!(db.get::<Goal>(goal).unwrap_err().is_not_found());
        assert!(matches!(
            run(Commands::DeleteNote { id: 99 }, &db, &config, today()),
            Err(CliError::DatabaseError(DatabaseError::NotFound { .. }))
        ));
    }

    #[test]
    fn export_writes_json_to_the_given_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("notes.json");
        let db = Database::open_in_memory().unwrap();
        db.create(&Note::new("Exported".to_string(), "Body".to_string()))
            .unwrap();

        let command = Commands::Export {
            kind: "notes".to_string(),
            output: Some(path.to_string_lossy().to_string()),
        };
        run(command, &db, &Config::default(), today()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: export::Export<Note> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.records[0].title, "Exported");

        let unknown = Commands::Export {
            kind: "habits".to_string(),
            output: None,
        };
        assert!(matches!(
            run(unknown, &db, &Config::default(), today()),
            Err(CliError::ExportError(_))
        ));
    }

    #[test]
    fn stats_commands_run_on_empty_and_filled_stores() {
        let db = Database::open_in_memory().unwrap();
        let config = Config::default();
        run(Commands::StudyStats { days: 7 }, &db, &config, today()).unwrap();
        run(Commands::HabitWeek, &db, &config, today()).unwrap();

        let habit = db.create(&Habit::new("Read".to_string())).unwrap();
        db.check_in_habit(habit, today()).unwrap();
        db.log_study_session(today(), 40, "Maths").unwrap();
        run(Commands::StudyStats { days: 7 }, &db, &config, today()).unwrap();
        run(Commands::HabitWeek, &db, &config, today()).unwrap();
    }

    #[test]
    fn cli_parses_runway_arguments() {
        let cli = Cli::try_parse_from(["daybook", "runway", "300,000", "--days", "10"]).unwrap();
        match cli.command {
            Some(Commands::Runway { balance, days, .. }) => {
                assert_eq!(balance, "300,000");
                assert_eq!(days, Some(10));
            }
            _ => panic!("expected runway"),
        }
    }
}
