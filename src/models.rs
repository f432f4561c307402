use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, Type, Value, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::database::{DatabaseError, Record};
use crate::utils;

/// Named collections, one SQLite table each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    ScheduleEntries,
    Notes,
    Tasks,
    Expenses,
    Budgets,
    ClipboardItems,
    Habits,
    HabitLogs,
    Goals,
    GoalReflections,
    StudySessions,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::ScheduleEntries => "schedule_entries",
            Collection::Notes => "notes",
            Collection::Tasks => "tasks",
            Collection::Expenses => "expenses",
            Collection::Budgets => "budgets",
            Collection::ClipboardItems => "clipboard_items",
            Collection::Habits => "habits",
            Collection::HabitLogs => "habit_logs",
            Collection::Goals => "goals",
            Collection::GoalReflections => "goal_reflections",
            Collection::StudySessions => "study_sessions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

impl ParseKindError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// Text-backed enum columns share one decoding path.
macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|err: ParseKindError| FromSqlError::Other(Box::new(err)))
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Text(value.as_str().to_string())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Day of the week, numbered Monday=1 through Sunday=7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Application-defined ordering number (Monday=1 … Sunday=7)
    pub fn number(self) -> u8 {
        match self {
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
            DayOfWeek::Sunday => 7,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::ALL[date.weekday().num_days_from_monday() as usize]
    }
}

impl FromStr for DayOfWeek {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| {
                let name = day.as_str().to_ascii_lowercase();
                needle == name || needle == name[..3] || needle == day.number().to_string()
            })
            .ok_or_else(|| ParseKindError::new("day of week", s))
    }
}

text_enum_sql!(DayOfWeek);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl FromStr for Priority {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(ParseKindError::new("priority", s)),
        }
    }
}

text_enum_sql!(Priority);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 1,
            TaskStatus::InProgress => 2,
            TaskStatus::Completed => 3,
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(ParseKindError::new("task status", s)),
        }
    }
}

text_enum_sql!(TaskStatus);

// ---------------------------------------------------------------------------
// Column helpers shared by the record decoders

fn conversion_error<E>(row: &Row<'_>, column: &str, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let index = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn date_column(row: &Row<'_>, column: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    utils::parse_date(&raw).map_err(|err| conversion_error(row, column, err))
}

fn optional_date_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        Some(raw) if !raw.trim().is_empty() => utils::parse_date(&raw)
            .map(Some)
            .map_err(|err| conversion_error(row, column, err)),
        _ => Ok(None),
    }
}

fn timestamp_column(row: &Row<'_>, column: &str) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(column)?;
    utils::parse_timestamp(&raw).map_err(|err| conversion_error(row, column, err))
}

fn tags_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Vec<String>> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(&raw).map_err(|err| conversion_error(row, column, err))
        }
        _ => Ok(Vec::new()),
    }
}

fn bool_column(row: &Row<'_>, column: &str) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(column)? != 0)
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(utils::format_date(date))
}

fn timestamp_value(ts: NaiveDateTime) -> Value {
    Value::Text(utils::format_timestamp(ts))
}

fn optional_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

fn optional_real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

fn flag_value(flag: bool) -> Value {
    Value::Integer(i64::from(flag))
}

fn require_text(field: &'static str, value: &str) -> Result<(), DatabaseError> {
    if value.trim().is_empty() {
        return Err(DatabaseError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Re-render a wall-clock time as zero-padded `HH:MM` so stored times sort
/// as text
fn normalized_time(field: &'static str, value: &str) -> Result<String, DatabaseError> {
    utils::parse_time(value)
        .map(|t| t.format(utils::TIME_FORMAT).to_string())
        .map_err(|_| DatabaseError::validation(field, "expected HH:MM"))
}

fn require_amount(field: &'static str, value: f64) -> Result<(), DatabaseError> {
    if !value.is_finite() {
        return Err(DatabaseError::validation(field, "must be a number"));
    }
    if value < 0.0 {
        return Err(DatabaseError::validation(field, "must not be negative"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Records

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Option<i64>,
    pub day: DayOfWeek,
    pub subject: String,
    pub start_time: String, // HH:MM
    pub end_time: String,   // HH:MM
    pub room: Option<String>,
    pub instructor: Option<String>,
    pub color_code: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ScheduleEntry {
    pub const DEFAULT_COLOR: &'static str = "#3498db";

    pub fn new(day: DayOfWeek, subject: String, start_time: String, end_time: String) -> Self {
        let now = utils::now_local();
        Self {
            id: None,
            day,
            subject,
            start_time,
            end_time,
            room: None,
            instructor: None,
            color_code: Self::DEFAULT_COLOR.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for ScheduleEntry {
    const COLLECTION: Collection = Collection::ScheduleEntries;
    const COLUMNS: &'static [&'static str] = &[
        "day",
        "subject",
        "start_time",
        "end_time",
        "room",
        "instructor",
        "color_code",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        require_text("subject", &self.subject)?;
        let start = utils::parse_time(&self.start_time)
            .map_err(|_| DatabaseError::validation("start_time", "expected HH:MM"))?;
        let end = utils::parse_time(&self.end_time)
            .map_err(|_| DatabaseError::validation("end_time", "expected HH:MM"))?;
        if end <= start {
            return Err(DatabaseError::validation("end_time", "must be after start_time"));
        }
        let hex = self.color_code.strip_prefix('#').unwrap_or("");
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DatabaseError::validation("color_code", "expected #RRGGBB"));
        }
        Ok(())
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            self.day.into(),
            Value::Text(self.subject.clone()),
            Value::Text(normalized_time("start_time", &self.start_time)?),
            Value::Text(normalized_time("end_time", &self.end_time)?),
            optional_text(self.room.clone()),
            optional_text(self.instructor.clone()),
            Value::Text(self.color_code.clone()),
            timestamp_value(self.created_at),
            timestamp_value(self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            day: row.get("day")?,
            subject: row.get("subject")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            room: row.get("room")?,
            instructor: row.get("instructor")?,
            color_code: row.get("color_code")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub category: String,
    pub favorite: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Note {
    pub const DEFAULT_CATEGORY: &'static str = "General";

    pub fn new(title: String, body: String) -> Self {
        let now = utils::now_local();
        Self {
            id: None,
            title,
            body,
            tags: Vec::new(),
            category: Self::DEFAULT_CATEGORY.to_string(),
            favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Split comma-separated user input into trimmed, non-empty tags
    pub fn parse_tags(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Record for Note {
    const COLLECTION: Collection = Collection::Notes;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "body",
        "tags",
        "category",
        "favorite",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        require_text("title", &self.title)?;
        require_text("body", &self.body)?;
        require_text("category", &self.category)?;
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(DatabaseError::validation("tags", "tags must not be empty"));
        }
        Ok(())
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Text(self.title.clone()),
            Value::Text(self.body.clone()),
            Value::Text(serde_json::to_string(&self.tags)?),
            Value::Text(self.category.clone()),
            flag_value(self.favorite),
            timestamp_value(self.created_at),
            timestamp_value(self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            title: row.get("title")?,
            body: row.get("body")?,
            tags: tags_column(row, "tags")?,
            category: row.get("category")?,
            favorite: bool_column(row, "favorite")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub category: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    pub const DEFAULT_CATEGORY: &'static str = "General";

    pub fn new(description: String) -> Self {
        let now = utils::now_local();
        Self {
            id: None,
            description,
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            deadline: None,
            estimated_hours: None,
            actual_hours: None,
            category: Self::DEFAULT_CATEGORY.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.deadline.is_some_and(|d| d < today)
    }
}

impl Record for Task {
    const COLLECTION: Collection = Collection::Tasks;
    const COLUMNS: &'static [&'static str] = &[
        "description",
        "priority",
        "status",
        "deadline",
        "estimated_hours",
        "actual_hours",
        "category",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        require_text("description", &self.description)?;
        if let Some(hours) = self.estimated_hours {
            require_amount("estimated_hours", hours)?;
        }
        if let Some(hours) = self.actual_hours {
            require_amount("actual_hours", hours)?;
        }
        Ok(())
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Text(self.description.clone()),
            self.priority.into(),
            self.status.into(),
            optional_text(self.deadline.map(utils::format_date)),
            optional_real(self.estimated_hours),
            optional_real(self.actual_hours),
            Value::Text(self.category.clone()),
            timestamp_value(self.created_at),
            timestamp_value(self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            description: row.get("description")?,
            priority: row.get("priority")?,
            status: row.get("status")?,
            deadline: optional_date_column(row, "deadline")?,
            estimated_hours: row.get("estimated_hours")?,
            actual_hours: row.get("actual_hours")?,
            category: row.get("category")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Option<i64>,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl Expense {
    pub const DEFAULT_CATEGORY: &'static str = "Other";

    pub fn new(amount: f64, date: NaiveDate) -> Self {
        Self {
            id: None,
            amount,
            category: Self::DEFAULT_CATEGORY.to_string(),
            description: String::new(),
            date,
            created_at: utils::now_local(),
        }
    }
}

impl Record for Expense {
    const COLLECTION: Collection = Collection::Expenses;
    const COLUMNS: &'static [&'static str] =
        &["amount", "category", "description", "date", "created_at"];
    const UPDATABLE: bool = false;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        require_amount("amount", self.amount)?;
        require_text("category", &self.category)
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Real(self.amount),
            Value::Text(self.category.clone()),
            Value::Text(self.description.clone()),
            date_value(self.date),
            timestamp_value(self.created_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            amount: row.get("amount")?,
            category: row.get("category")?,
            description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
            date: date_column(row, "date")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

/// Monthly spending limit. Budgets are appended; the newest row for a month wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Option<i64>,
    pub month: String, // YYYY-MM
    pub monthly_limit: f64,
    pub created_at: NaiveDateTime,
}

impl Budget {
    pub fn new(month: String, monthly_limit: f64) -> Self {
        Self {
            id: None,
            month,
            monthly_limit,
            created_at: utils::now_local(),
        }
    }

    /// Even daily share of the monthly limit (30-day month)
    pub fn daily_allowance(&self) -> f64 {
        self.monthly_limit / 30.0
    }
}

impl Record for Budget {
    const COLLECTION: Collection = Collection::Budgets;
    const COLUMNS: &'static [&'static str] = &["month", "monthly_limit", "created_at"];
    const UPDATABLE: bool = false;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        if utils::parse_month(&self.month).as_deref() != Some(self.month.as_str()) {
            return Err(DatabaseError::validation("month", "expected YYYY-MM"));
        }
        require_amount("monthly_limit", self.monthly_limit)
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Text(self.month.clone()),
            Value::Real(self.monthly_limit),
            timestamp_value(self.created_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            month: row.get("month")?,
            monthly_limit: row.get("monthly_limit")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardItem {
    pub id: Option<i64>,
    pub content: String,
    pub pinned: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ClipboardItem {
    pub fn new(content: String) -> Self {
        let now = utils::now_local();
        Self {
            id: None,
            content,
            pinned: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for ClipboardItem {
    const COLLECTION: Collection = Collection::ClipboardItems;
    const COLUMNS: &'static [&'static str] = &["content", "pinned", "created_at", "updated_at"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        require_text("content", &self.content)
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Text(self.content.clone()),
            flag_value(self.pinned),
            timestamp_value(self.created_at),
            timestamp_value(self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            content: row.get("content")?,
            pinned: bool_column(row, "pinned")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Option<i64>,
    pub name: String,
    pub glyph: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Habit {
    pub const DEFAULT_GLYPH: &'static str = "✅";

    pub fn new(name: String) -> Self {
        let now = utils::now_local();
        Self {
            id: None,
            name,
            glyph: Self::DEFAULT_GLYPH.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Habit {
    const COLLECTION: Collection = Collection::Habits;
    const COLUMNS: &'static [&'static str] = &["name", "glyph", "created_at", "updated_at"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        require_text("name", &self.name)
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Text(self.name.clone()),
            Value::Text(self.glyph.clone()),
            timestamp_value(self.created_at),
            timestamp_value(self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            glyph: row.get("glyph")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

/// One check-in of a habit on a date. Unique per (habit_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: Option<i64>,
    pub habit_id: i64,
    pub date: NaiveDate,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

impl HabitLog {
    pub fn new(habit_id: i64, date: NaiveDate) -> Self {
        Self {
            id: None,
            habit_id,
            date,
            completed: true,
            created_at: utils::now_local(),
        }
    }
}

impl Record for HabitLog {
    const COLLECTION: Collection = Collection::HabitLogs;
    const COLUMNS: &'static [&'static str] = &["habit_id", "date", "completed", "created_at"];
    const UPDATABLE: bool = false;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        if self.habit_id <= 0 {
            return Err(DatabaseError::validation("habit_id", "must reference a habit"));
        }
        Ok(())
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Integer(self.habit_id),
            date_value(self.date),
            flag_value(self.completed),
            timestamp_value(self.created_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            habit_id: row.get("habit_id")?,
            date: date_column(row, "date")?,
            completed: bool_column(row, "completed")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Option<i64>,
    pub target: String,
    pub deadline: NaiveDate,
    /// Percent complete, always within 0..=100
    pub progress: u8,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Goal {
    pub fn new(target: String, deadline: NaiveDate) -> Self {
        let now = utils::now_local();
        Self {
            id: None,
            target,
            deadline,
            progress: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set progress, clamping into 0..=100
    pub fn set_progress(&mut self, progress: i64) {
        self.progress = progress.clamp(0, 100) as u8;
    }
}

impl Record for Goal {
    const COLLECTION: Collection = Collection::Goals;
    const COLUMNS: &'static [&'static str] =
        &["target", "deadline", "progress", "notes", "created_at", "updated_at"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        require_text("target", &self.target)
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Text(self.target.clone()),
            date_value(self.deadline),
            Value::Integer(i64::from(self.progress.min(100))),
            optional_text(self.notes.clone()),
            timestamp_value(self.created_at),
            timestamp_value(self.updated_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            target: row.get("target")?,
            deadline: date_column(row, "deadline")?,
            progress: row.get::<_, i64>("progress")?.clamp(0, 100) as u8,
            notes: row.get("notes")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReflection {
    pub id: Option<i64>,
    pub goal_id: i64,
    pub prompt: String,
    pub answer: String,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl GoalReflection {
    pub fn new(goal_id: i64, prompt: String, answer: String, date: NaiveDate) -> Self {
        Self {
            id: None,
            goal_id,
            prompt,
            answer,
            date,
            created_at: utils::now_local(),
        }
    }
}

impl Record for GoalReflection {
    const COLLECTION: Collection = Collection::GoalReflections;
    const COLUMNS: &'static [&'static str] = &["goal_id", "prompt", "answer", "date", "created_at"];
    const UPDATABLE: bool = false;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        if self.goal_id <= 0 {
            return Err(DatabaseError::validation("goal_id", "must reference a goal"));
        }
        require_text("answer", &self.answer)
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            Value::Integer(self.goal_id),
            Value::Text(self.prompt.clone()),
            Value::Text(self.answer.clone()),
            date_value(self.date),
            timestamp_value(self.created_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            goal_id: row.get("goal_id")?,
            prompt: row.get("prompt")?,
            answer: row.get("answer")?,
            date: date_column(row, "date")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub subject: String,
    pub created_at: NaiveDateTime,
}

impl StudySession {
    pub const DEFAULT_SUBJECT: &'static str = "General study";

    pub fn new(date: NaiveDate, duration_minutes: u32) -> Self {
        Self {
            id: None,
            date,
            duration_minutes,
            subject: Self::DEFAULT_SUBJECT.to_string(),
            created_at: utils::now_local(),
        }
    }
}

impl Record for StudySession {
    const COLLECTION: Collection = Collection::StudySessions;
    const COLUMNS: &'static [&'static str] = &["date", "duration_minutes", "subject", "created_at"];
    const UPDATABLE: bool = false;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        if self.duration_minutes == 0 {
            return Err(DatabaseError::validation("duration_minutes", "must be positive"));
        }
        require_text("subject", &self.subject)
    }

    fn values(&self) -> Result<Vec<Value>, DatabaseError> {
        Ok(vec![
            date_value(self.date),
            Value::Integer(i64::from(self.duration_minutes)),
            Value::Text(self.subject.clone()),
            timestamp_value(self.created_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let minutes: i64 = row.get("duration_minutes")?;
        Ok(Self {
            id: Some(row.get("id")?),
            date: date_column(row, "date")?,
            duration_minutes: u32::try_from(minutes)
                .map_err(|err| conversion_error(row, "duration_minutes", err))?,
            subject: row.get("subject")?,
            created_at: timestamp_column(row, "created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_of_week_parses_names_abbreviations_and_numbers() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("Sun".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert_eq!("3".parse::<DayOfWeek>().unwrap(), DayOfWeek::Wednesday);
        assert!("Funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn day_of_week_of_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(DayOfWeek::of(date), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::of(date).number(), 7);
    }

    #[test]
    fn task_status_accepts_hyphenated_input() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
    }

    #[test]
    fn goal_progress_is_clamped() {
        let deadline = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let mut goal = Goal::new("Run a marathon".to_string(), deadline);
        goal.set_progress(140);
        assert_eq!(goal.progress, 100);
        goal.set_progress(-5);
        assert_eq!(goal.progress, 0);
    }

    #[test]
    fn note_tags_parse_from_comma_list() {
        assert_eq!(Note::parse_tags(" rust, ,db "), vec!["rust", "db"]);
        assert!(Note::parse_tags("").is_empty());
    }

    #[test]
    fn expense_rejects_negative_amount() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = Expense::new(-1.0, date).validate().unwrap_err();
        assert!(matches!(err, DatabaseError::Validation { field: "amount", .. }));
    }
}
