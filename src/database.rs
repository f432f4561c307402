use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use std::path::Path;
use thiserror::Error;

use crate::models::{
    Budget, ClipboardItem, Collection, Goal, GoalReflection, Habit, HabitLog, Note, StudySession,
    Task, TaskStatus,
};
use crate::utils;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("No record {id} in {collection}")]
    NotFound { collection: Collection, id: i64 },
    #[error("Duplicate record in {collection}")]
    Duplicate { collection: Collection },
    #[error("Records in {collection} cannot be edited")]
    ReadOnly { collection: Collection },
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Failed to encode field: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

impl DatabaseError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DatabaseError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }
}

/// A record kind stored in its own collection.
///
/// `values` must yield one value per entry of `COLUMNS`, in the same order.
/// The `id` column is owned by the store and never part of `COLUMNS`.
pub trait Record: Sized {
    const COLLECTION: Collection;
    const COLUMNS: &'static [&'static str];
    /// Append-only kinds reject `Database::update`
    const UPDATABLE: bool = true;

    fn id(&self) -> Option<i64>;
    fn validate(&self) -> Result<(), DatabaseError>;
    fn values(&self) -> Result<Vec<Value>, DatabaseError>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Refresh the update timestamp, for kinds that carry one
    fn touch(&mut self, _now: NaiveDateTime) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Like,
    Lt,
    Ge,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Like => "LIKE",
            Op::Lt => "<",
            Op::Ge => ">=",
        }
    }
}

/// Column predicates, ordering and limit for `Database::list`.
///
/// Conditions are joined with AND. Every listing ends with `id ASC` so rows
/// with equal sort keys come back in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(&'static str, Op, Value)>,
    order: Vec<(&'static str, Direction)>,
    limit: Option<u32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.condition(column, Op::Eq, value.into())
    }

    pub fn ne(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.condition(column, Op::Ne, value.into())
    }

    pub fn like(self, column: &'static str, pattern: impl Into<String>) -> Self {
        self.condition(column, Op::Like, Value::Text(pattern.into()))
    }

    pub fn lt(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.condition(column, Op::Lt, value.into())
    }

    pub fn ge(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.condition(column, Op::Ge, value.into())
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn condition(mut self, column: &'static str, op: Op, value: Value) -> Self {
        self.conditions.push((column, op, value));
        self
    }

    fn select_sql<R: Record>(&self) -> Result<(String, Vec<Value>), DatabaseError> {
        let known = |column: &str| column == "id" || R::COLUMNS.contains(&column);
        for column in self
            .conditions
            .iter()
            .map(|(c, _, _)| *c)
            .chain(self.order.iter().map(|(c, _)| *c))
        {
            if !known(column) {
                return Err(DatabaseError::validation(
                    "filter",
                    format!("unknown column `{}` for {}", column, R::COLLECTION),
                ));
            }
        }

        let mut sql = select_prefix::<R>();
        let mut params = Vec::with_capacity(self.conditions.len());
        if !self.conditions.is_empty() {
            let clauses: Vec<String> = self
                .conditions
                .iter()
                .enumerate()
                .map(|(i, (column, op, _))| format!("\"{}\" {} ?{}", column, op.sql(), i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
            params.extend(self.conditions.iter().map(|(_, _, v)| v.clone()));
        }

        let mut order: Vec<String> = self
            .order
            .iter()
            .map(|(column, direction)| {
                let dir = match direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("\"{}\" {}", column, dir)
            })
            .collect();
        order.push("id ASC".to_string());
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok((sql, params))
    }
}

fn select_prefix<R: Record>() -> String {
    let columns: Vec<String> = std::iter::once("id")
        .chain(R::COLUMNS.iter().copied())
        .map(|c| format!("\"{}\"", c))
        .collect();
    format!("SELECT {} FROM {}", columns.join(", "), R::COLLECTION.table())
}

/// Map a failed write, turning unique-index hits into `Duplicate`.
/// Other constraint failures stay SQLite errors.
fn write_error(err: rusqlite::Error, collection: Collection) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DatabaseError::Duplicate { collection }
        }
        _ => DatabaseError::SqliteError(err),
    }
}

/// Outcome of a habit check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckIn {
    Recorded(i64),
    AlreadyLogged,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let db_path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::StorageUnavailable(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| {
            warn!("event=db_open module=store status=error mode=file error={}", e);
            DatabaseError::StorageUnavailable(format!("cannot open {}: {}", db_path.display(), e))
        })?;

        let db = Database { conn };
        db.initialize_schema()?;
        info!("event=db_open module=store status=ok mode=file");
        Ok(db)
    }

    /// Open a private in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::StorageUnavailable(e.to_string()))?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create every table and index; safe to run against an existing file
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schedule_entries (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                day             TEXT NOT NULL,
                subject         TEXT NOT NULL,
                start_time      TEXT NOT NULL,
                end_time        TEXT NOT NULL,
                room            TEXT,
                instructor      TEXT,
                color_code      TEXT NOT NULL DEFAULT '#3498db',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                body            TEXT NOT NULL,
                tags            TEXT NOT NULL DEFAULT '[]',
                category        TEXT NOT NULL DEFAULT 'General',
                favorite        INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                description     TEXT NOT NULL,
                priority        TEXT NOT NULL DEFAULT 'Medium',
                status          TEXT NOT NULL DEFAULT 'pending',
                deadline        TEXT,
                estimated_hours REAL,
                actual_hours    REAL,
                category        TEXT NOT NULL DEFAULT 'General',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS expenses (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                amount          REAL NOT NULL,
                category        TEXT NOT NULL DEFAULT 'Other',
                description     TEXT,
                date            TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS budgets (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                month           TEXT NOT NULL,
                monthly_limit   REAL NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS clipboard_items (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                content         TEXT NOT NULL,
                pinned          INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS habits (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                glyph           TEXT NOT NULL DEFAULT '✅',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS habit_logs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                habit_id        INTEGER NOT NULL,
                date            TEXT NOT NULL,
                completed       INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS goals (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                target          TEXT NOT NULL,
                deadline        TEXT NOT NULL,
                progress        INTEGER NOT NULL DEFAULT 0,
                notes           TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS goal_reflections (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                goal_id         INTEGER NOT NULL,
                prompt          TEXT NOT NULL,
                answer          TEXT NOT NULL,
                date            TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS study_sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                date             TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                subject          TEXT NOT NULL,
                created_at       TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_habit_logs_habit_date ON habit_logs(habit_id, date);
            CREATE INDEX IF NOT EXISTS idx_schedule_day ON schedule_entries(day);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            CREATE INDEX IF NOT EXISTS idx_budgets_month ON budgets(month);
            CREATE INDEX IF NOT EXISTS idx_goal_reflections_goal ON goal_reflections(goal_id);
            CREATE INDEX IF NOT EXISTS idx_study_sessions_date ON study_sessions(date);",
        )?;
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Validate and insert a record, returning its new ID.
    /// Any `id` already set on the record is ignored.
    pub fn create<R: Record>(&self, record: &R) -> Result<i64, DatabaseError> {
        record.validate()?;
        let values = record.values()?;

        let columns: Vec<String> = R::COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::COLLECTION.table(),
            columns.join(", "),
            placeholders.join(", ")
        );

        self.conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| write_error(e, R::COLLECTION))?;
        let id = self.conn.last_insert_rowid();
        debug!(
            "event=record_create module=store collection={} id={}",
            R::COLLECTION,
            id
        );
        Ok(id)
    }

    /// Get a single record by ID
    pub fn get<R: Record>(&self, id: i64) -> Result<R, DatabaseError> {
        let sql = format!("{} WHERE id = ?1", select_prefix::<R>());
        self.conn
            .query_row(&sql, [id], R::from_row)
            .optional()?
            .ok_or(DatabaseError::NotFound {
                collection: R::COLLECTION,
                id,
            })
    }

    /// Check whether a record exists without decoding it
    pub fn exists<R: Record>(&self, id: i64) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
            R::COLLECTION.table()
        );
        Ok(self.conn.query_row(&sql, [id], |row| row.get(0))?)
    }

    /// List records matching `filter`.
    ///
    /// Rows whose stored values no longer decode (a malformed date, an unknown
    /// status) are skipped with a warning rather than failing the listing.
    pub fn list<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, DatabaseError> {
        let (sql, params) = filter.select_sql::<R>()?;
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            match R::from_row(row) {
                Ok(record) => records.push(record),
                Err(
                    err @ (rusqlite::Error::FromSqlConversionFailure(..)
                    | rusqlite::Error::InvalidColumnType(..)
                    | rusqlite::Error::IntegralValueOutOfRange(..)),
                ) => {
                    let id: Option<i64> = row.get("id").ok();
                    warn!(
                        "event=record_skip module=store collection={} id={:?} error={}",
                        R::COLLECTION,
                        id,
                        err
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(records)
    }

    /// Validate and write an existing record, refreshing its update timestamp
    pub fn update<R: Record>(&self, record: &mut R) -> Result<(), DatabaseError> {
        if !R::UPDATABLE {
            return Err(DatabaseError::ReadOnly {
                collection: R::COLLECTION,
            });
        }
        let id = record
            .id()
            .ok_or_else(|| DatabaseError::validation("id", "record has not been stored yet"))?;
        record.validate()?;
        record.touch(utils::now_local());

        let mut values = record.values()?;
        let assignments: Vec<String> = R::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, c)| format!("\"{}\" = ?{}", c, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            R::COLLECTION.table(),
            assignments.join(", "),
            values.len() + 1
        );
        values.push(Value::Integer(id));

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| write_error(e, R::COLLECTION))?;
        tx.commit()?;

        if changed == 0 {
            return Err(DatabaseError::NotFound {
                collection: R::COLLECTION,
                id,
            });
        }
        debug!(
            "event=record_update module=store collection={} id={}",
            R::COLLECTION,
            id
        );
        Ok(())
    }

    /// Delete a record by ID
    pub fn delete<R: Record>(&self, id: i64) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::COLLECTION.table());
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(&sql, [id])?;
        tx.commit()?;

        if changed == 0 {
            return Err(DatabaseError::NotFound {
                collection: R::COLLECTION,
                id,
            });
        }
        debug!(
            "event=record_delete module=store collection={} id={}",
            R::COLLECTION,
            id
        );
        Ok(())
    }

    /// Delete a parent row and every child row referencing it, atomically.
    /// Returns the number of child rows removed.
    fn delete_cascading(
        &self,
        parent: Collection,
        child: Collection,
        reference_column: &str,
        id: i64,
    ) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;

        let exists: bool = tx.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", parent.table()),
            [id],
            |row| row.get(0),
        )?;
        if !exists {
            // Dropping the transaction rolls it back; nothing was written.
            return Err(DatabaseError::NotFound {
                collection: parent,
                id,
            });
        }

        let children = tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", child.table(), reference_column),
            [id],
        )?;
        tx.execute(&format!("DELETE FROM {} WHERE id = ?1", parent.table()), [id])?;
        tx.commit()?;

        info!(
            "event=cascade_delete module=store collection={} id={} children={}",
            parent, id, children
        );
        Ok(children)
    }

    /// Delete a habit together with all of its check-ins
    pub fn delete_habit(&self, id: i64) -> Result<usize, DatabaseError> {
        self.delete_cascading(Collection::Habits, Collection::HabitLogs, "habit_id", id)
    }

    /// Delete a goal together with all of its reflections
    pub fn delete_goal(&self, id: i64) -> Result<usize, DatabaseError> {
        self.delete_cascading(Collection::Goals, Collection::GoalReflections, "goal_id", id)
    }

    /// Record a completed check-in for a habit on `date`.
    /// A second check-in for the same day is a no-op.
    pub fn check_in_habit(&self, habit_id: i64, date: NaiveDate) -> Result<CheckIn, DatabaseError> {
        if !self.exists::<Habit>(habit_id)? {
            return Err(DatabaseError::NotFound {
                collection: Collection::Habits,
                id: habit_id,
            });
        }
        match self.create(&HabitLog::new(habit_id, date)) {
            Ok(id) => Ok(CheckIn::Recorded(id)),
            Err(DatabaseError::Duplicate { .. }) => Ok(CheckIn::AlreadyLogged),
            Err(err) => Err(err),
        }
    }

    /// Move a task to any status
    pub fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, DatabaseError> {
        let mut task: Task = self.get(id)?;
        task.status = status;
        self.update(&mut task)?;
        Ok(task)
    }

    /// Update goal progress (clamped to 0..=100) and optionally replace its notes
    pub fn set_goal_progress(
        &self,
        id: i64,
        progress: i64,
        notes: Option<String>,
    ) -> Result<Goal, DatabaseError> {
        let mut goal: Goal = self.get(id)?;
        goal.set_progress(progress);
        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            goal.notes = Some(notes);
        }
        self.update(&mut goal)?;
        Ok(goal)
    }

    /// Attach a reflection to an existing goal
    pub fn add_goal_reflection(
        &self,
        goal_id: i64,
        prompt: &str,
        answer: &str,
        date: NaiveDate,
    ) -> Result<i64, DatabaseError> {
        if !self.exists::<Goal>(goal_id)? {
            return Err(DatabaseError::NotFound {
                collection: Collection::Goals,
                id: goal_id,
            });
        }
        self.create(&GoalReflection::new(
            goal_id,
            prompt.to_string(),
            answer.to_string(),
            date,
        ))
    }

    /// Flip the favorite flag on a note, returning the new value
    pub fn toggle_note_favorite(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut note: Note = self.get(id)?;
        note.favorite = !note.favorite;
        self.update(&mut note)?;
        Ok(note.favorite)
    }

    /// Flip the pinned flag on a clipboard item, returning the new value
    pub fn toggle_clipboard_pin(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut item: ClipboardItem = self.get(id)?;
        item.pinned = !item.pinned;
        self.update(&mut item)?;
        Ok(item.pinned)
    }

    /// Append a budget for `month`; the newest budget for a month wins
    pub fn set_budget(&self, month: &str, monthly_limit: f64) -> Result<i64, DatabaseError> {
        let month = utils::parse_month(month)
            .ok_or_else(|| DatabaseError::validation("month", "expected YYYY-MM"))?;
        self.create(&Budget::new(month, monthly_limit))
    }

    /// Record a finished study session
    pub fn log_study_session(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        subject: &str,
    ) -> Result<i64, DatabaseError> {
        let mut session = StudySession::new(date, duration_minutes);
        if !subject.trim().is_empty() {
            session.subject = subject.trim().to_string();
        }
        self.create(&session)
    }
}
