//! Storage layer for the cycle tracker.
//!
//! Provides persistence for profiles, cycles, symptoms, moods and
//! medications using `rusqlite`, and implements [`RecordStore`] so the core
//! service can query it.
//!
//! # Thread Safety
//!
//! The connection lives behind a `Mutex`, so a [`Database`] is `Sync` and the
//! service can issue its fetches from several rayon workers at once. SQLite
//! work itself is serialized by the lock.
//!
//! # Schema
//!
//! ## Date Format
//!
//! Calendar dates are stored as TEXT in `YYYY-MM-DD` form, so lexicographic
//! order matches chronological order and `date >= ?` range filters work on
//! the raw column. Row creation times are ISO 8601 UTC timestamps.
//!
//! Nothing in the schema prevents a malformed date from being written by
//! another tool; such rows are returned as-is and rejected by the core's
//! row validation.
//!
//! ## Recurring Days
//!
//! `medications.recurring_days` holds a JSON array of lowercase weekday
//! names, or NULL for one-off doses. The text is returned undecoded; the
//! core rejects a malformed value for that medication alone.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use thiserror::Error;

use ct_core::store::{
    CycleRow, MedicationRow, MoodRow, NewCycle, NewMedication, NewMood, NewSymptom, ProfileRow,
    ProfileUpdate, SymptomRow, format_date,
};
use ct_core::{Category, FetchError, MAX_DAY_COUNT, RecordId, RecordStore, UserId};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A thread panicked while holding the connection.
    #[error("database connection lock poisoned")]
    LockPoisoned,
    /// No row with the given ID belongs to the user.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: RecordId },
    /// An end date was logged before the cycle's start date.
    #[error("cycle {id} cannot end on {end_date} before it starts on {start_date}")]
    EndBeforeStart {
        id: RecordId,
        start_date: String,
        end_date: NaiveDate,
    },
    /// An end date would make the period longer than [`MAX_DAY_COUNT`] days.
    #[error("cycle {id} cannot last {days} days (at most {MAX_DAY_COUNT})")]
    PeriodTooLong { id: RecordId, days: i64 },
    /// A stored start date could not be parsed.
    #[error("invalid start date for cycle {id}: {value}")]
    InvalidStoredDate {
        id: RecordId,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Failed to encode or decode a JSON column.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Mutex<Connection>,
}

/// Everything stored for one user, as written out by `ct export`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserExport {
    pub user_id: String,
    pub profile: Option<ProfileRow>,
    pub cycles: Vec<CycleRow>,
    pub symptoms: Vec<SymptomRow>,
    pub moods: Vec<MoodRow>,
    pub medications: Vec<MedicationRow>,
    pub exported_at: String,
}

/// Lower bound that every stored date passes.
const BEGINNING: &str = "0000-01-01";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        tracing::debug!(path = %path.display(), "opening database");
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                updated_at TEXT NOT NULL,
                username TEXT,
                full_name TEXT,
                birth_date TEXT,
                cycle_average_length INTEGER,
                period_average_length INTEGER
            );

            -- Cycles: one row per logged period start
            -- start_date/end_date: 'YYYY-MM-DD'
            CREATE TABLE IF NOT EXISTS cycles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                period_length INTEGER,
                notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_cycles_user_start ON cycles(user_id, start_date);

            CREATE TABLE IF NOT EXISTS symptoms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                type TEXT NOT NULL,
                intensity TEXT NOT NULL,
                notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_symptoms_user_date ON symptoms(user_id, date);

            CREATE TABLE IF NOT EXISTS moods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                type TEXT NOT NULL,
                intensity TEXT NOT NULL,
                notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_moods_user_date ON moods(user_id, date);

            CREATE TABLE IF NOT EXISTS medications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                dosage TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                taken INTEGER NOT NULL DEFAULT 0,
                recurring INTEGER NOT NULL DEFAULT 0,
                recurring_days TEXT,
                notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_medications_user_date ON medications(user_id, date);
            ",
        )?;
        Ok(())
    }

    // ========== Profiles ==========

    /// Creates the profile if missing, then applies the non-`None` fields.
    pub fn upsert_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<(), DbError> {
        self.conn()?.execute(
            "
            INSERT INTO profiles
            (user_id, updated_at, username, full_name, birth_date, cycle_average_length, period_average_length)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id) DO UPDATE SET
                updated_at = excluded.updated_at,
                username = COALESCE(excluded.username, profiles.username),
                full_name = COALESCE(excluded.full_name, profiles.full_name),
                birth_date = COALESCE(excluded.birth_date, profiles.birth_date),
                cycle_average_length = COALESCE(excluded.cycle_average_length, profiles.cycle_average_length),
                period_average_length = COALESCE(excluded.period_average_length, profiles.period_average_length)
            ",
            params![
                user_id.as_str(),
                now_timestamp(),
                update.username,
                update.full_name,
                update.birth_date.map(format_date),
                update.cycle_average_length,
                update.period_average_length,
            ],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, user_id: &UserId) -> Result<Option<ProfileRow>, DbError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "
                SELECT user_id, username, full_name, birth_date, cycle_average_length, period_average_length
                FROM profiles
                WHERE user_id = ?
                ",
                [user_id.as_str()],
                |row| {
                    Ok(ProfileRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        full_name: row.get(2)?,
                        birth_date: row.get(3)?,
                        cycle_average_length: row.get(4)?,
                        period_average_length: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // ========== Cycles ==========

    /// Logs a period start and returns the new cycle's ID.
    pub fn insert_cycle(&self, cycle: &NewCycle) -> Result<RecordId, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "
            INSERT INTO cycles (created_at, user_id, start_date, end_date, period_length, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                now_timestamp(),
                cycle.user_id.as_str(),
                format_date(cycle.start_date),
                cycle.end_date.map(format_date),
                cycle.period_length,
                cycle.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Records when a period ended and derives its length from the start date.
    pub fn set_cycle_end(
        &self,
        user_id: &UserId,
        id: RecordId,
        end_date: NaiveDate,
    ) -> Result<u32, DbError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let start_date: String = tx
            .query_row(
                "SELECT start_date FROM cycles WHERE id = ? AND user_id = ?",
                params![id, user_id.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(DbError::NotFound {
                entity: "cycle",
                id,
            })?;
        let start = NaiveDate::parse_from_str(&start_date, ct_core::store::DATE_FORMAT).map_err(
            |source| DbError::InvalidStoredDate {
                id,
                value: start_date.clone(),
                source,
            },
        )?;
        if end_date < start {
            return Err(DbError::EndBeforeStart {
                id,
                start_date,
                end_date,
            });
        }
        let days = (end_date - start).num_days() + 1;
        let period_length = u32::try_from(days)
            .ok()
            .filter(|days| *days <= MAX_DAY_COUNT)
            .ok_or(DbError::PeriodTooLong { id, days })?;

        tx.execute(
            "UPDATE cycles SET end_date = ?, period_length = ? WHERE id = ?",
            params![format_date(end_date), period_length, id],
        )?;
        tx.commit()?;
        tracing::debug!(id, period_length, "cycle end recorded");
        Ok(period_length)
    }

    pub fn delete_cycle(&self, user_id: &UserId, id: RecordId) -> Result<(), DbError> {
        let deleted = self.conn()?.execute(
            "DELETE FROM cycles WHERE id = ? AND user_id = ?",
            params![id, user_id.as_str()],
        )?;
        if deleted == 0 {
            return Err(DbError::NotFound {
                entity: "cycle",
                id,
            });
        }
        Ok(())
    }

    /// Cycles starting on or after `since`, most recent first.
    pub fn list_cycles(&self, user_id: &UserId, since: Option<NaiveDate>) -> Result<Vec<CycleRow>, DbError> {
        let since = since.map_or_else(|| BEGINNING.to_string(), format_date);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "
            SELECT id, user_id, start_date, end_date, period_length, notes
            FROM cycles
            WHERE user_id = ? AND start_date >= ?
            ORDER BY start_date DESC, id DESC
            ",
        )?;
        let rows = stmt.query_map(params![user_id.as_str(), since], |row| {
            Ok(CycleRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
                period_length: row.get(4)?,
                notes: row.get(5)?,
            })
        })?;
        let mut cycles = Vec::new();
        for row in rows {
            cycles.push(row?);
        }
        Ok(cycles)
    }

    // ========== Symptoms and moods ==========

    /// Inserts several symptoms atomically, returning their IDs in order.
    pub fn insert_symptoms(&self, symptoms: &[NewSymptom]) -> Result<Vec<RecordId>, DbError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(symptoms.len());
        for symptom in symptoms {
            insert_symptom_row(&tx, symptom)?;
            ids.push(tx.last_insert_rowid());
        }
        tx.commit()?;
        Ok(ids)
    }

    pub fn list_symptoms(&self, user_id: &UserId, since: Option<NaiveDate>) -> Result<Vec<SymptomRow>, DbError> {
        self.list_dated("symptoms", user_id, since, |row| {
            Ok(SymptomRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                date: row.get(2)?,
                kind: row.get(3)?,
                intensity: row.get(4)?,
                notes: row.get(5)?,
            })
        })
    }

    /// Inserts several moods atomically, returning their IDs in order.
    pub fn insert_moods(&self, moods: &[NewMood]) -> Result<Vec<RecordId>, DbError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(moods.len());
        for mood in moods {
            insert_mood_row(&tx, mood)?;
            ids.push(tx.last_insert_rowid());
        }
        tx.commit()?;
        Ok(ids)
    }

    pub fn list_moods(&self, user_id: &UserId, since: Option<NaiveDate>) -> Result<Vec<MoodRow>, DbError> {
        self.list_dated("moods", user_id, since, |row| {
            Ok(MoodRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                date: row.get(2)?,
                kind: row.get(3)?,
                intensity: row.get(4)?,
                notes: row.get(5)?,
            })
        })
    }

    /// Shared query for the two tables with identical `(type, intensity)` shape.
    fn list_dated<T>(
        &self,
        table: &'static str,
        user_id: &UserId,
        since: Option<NaiveDate>,
        map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, DbError> {
        let since = since.map_or_else(|| BEGINNING.to_string(), format_date);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "
            SELECT id, user_id, date, type, intensity, notes
            FROM {table}
            WHERE user_id = ? AND date >= ?
            ORDER BY date ASC, id ASC
            "
        ))?;
        let rows = stmt.query_map(params![user_id.as_str(), since], map)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    // ========== Medications ==========

    pub fn insert_medication(&self, medication: &NewMedication) -> Result<RecordId, DbError> {
        let recurring = !medication.recurring_days.is_empty();
        let recurring_days = if recurring {
            let names: Vec<&str> = medication.recurring_days.iter().map(|d| d.as_str()).collect();
            Some(serde_json::to_string(&names)?)
        } else {
            None
        };

        let conn = self.conn()?;
        conn.execute(
            "
            INSERT INTO medications
            (created_at, user_id, name, dosage, date, time, taken, recurring, recurring_days, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                now_timestamp(),
                medication.user_id.as_str(),
                medication.name,
                medication.dosage,
                format_date(medication.date),
                medication.time,
                medication.taken,
                recurring,
                recurring_days,
                medication.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_medication_taken(
        &self,
        user_id: &UserId,
        id: RecordId,
        taken: bool,
    ) -> Result<(), DbError> {
        let updated = self.conn()?.execute(
            "UPDATE medications SET taken = ? WHERE id = ? AND user_id = ?",
            params![taken, id, user_id.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound {
                entity: "medication",
                id,
            });
        }
        Ok(())
    }

    pub fn list_medications(
        &self,
        user_id: &UserId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<MedicationRow>, DbError> {
        let since = since.map_or_else(|| BEGINNING.to_string(), format_date);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "
            SELECT id, user_id, name, dosage, date, time, taken, recurring, recurring_days, notes
            FROM medications
            WHERE user_id = ? AND date >= ?
            ORDER BY date ASC, time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![user_id.as_str(), since], |row| {
            Ok(MedicationRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                dosage: row.get(3)?,
                date: row.get(4)?,
                time: row.get(5)?,
                taken: row.get(6)?,
                recurring: row.get(7)?,
                recurring_days: row.get(8)?,
                notes: row.get(9)?,
            })
        })?;
        let mut medications = Vec::new();
        for row in rows {
            medications.push(row?);
        }
        Ok(medications)
    }

    // ========== Export ==========

    /// Collects every stored record for the user.
    pub fn export_user_data(
        &self,
        user_id: &UserId,
        exported_at: DateTime<Utc>,
    ) -> Result<UserExport, DbError> {
        Ok(UserExport {
            user_id: user_id.to_string(),
            profile: self.get_profile(user_id)?,
            cycles: self.list_cycles(user_id, None)?,
            symptoms: self.list_symptoms(user_id, None)?,
            moods: self.list_moods(user_id, None)?,
            medications: self.list_medications(user_id, None)?,
            exported_at: format_timestamp(exported_at),
        })
    }
}

impl RecordStore for Database {
    fn fetch_cycles_for_user(&self, user_id: &UserId) -> Result<Vec<CycleRow>, FetchError> {
        self.list_cycles(user_id, None)
            .map_err(|e| FetchError::new(Category::Cycles, e))
    }

    fn fetch_cycles_since(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<CycleRow>, FetchError> {
        self.list_cycles(user_id, Some(since))
            .map_err(|e| FetchError::new(Category::Cycles, e))
    }

    fn fetch_symptoms_for_user(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<SymptomRow>, FetchError> {
        self.list_symptoms(user_id, Some(since))
            .map_err(|e| FetchError::new(Category::Symptoms, e))
    }

    fn fetch_moods_for_user(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<MoodRow>, FetchError> {
        self.list_moods(user_id, Some(since))
            .map_err(|e| FetchError::new(Category::Moods, e))
    }

    fn fetch_medications_for_user(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<MedicationRow>, FetchError> {
        self.list_medications(user_id, Some(since))
            .map_err(|e| FetchError::new(Category::Medications, e))
    }

    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<ProfileRow>, FetchError> {
        self.get_profile(user_id)
            .map_err(|e| FetchError::new(Category::Profile, e))
    }
}

fn insert_symptom_row(conn: &Connection, symptom: &NewSymptom) -> rusqlite::Result<usize> {
    conn.execute(
        "
        INSERT INTO symptoms (created_at, user_id, date, type, intensity, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
        params![
            now_timestamp(),
            symptom.user_id.as_str(),
            format_date(symptom.date),
            symptom.kind.as_str(),
            symptom.intensity.as_str(),
            symptom.notes,
        ],
    )
}

fn insert_mood_row(conn: &Connection, mood: &NewMood) -> rusqlite::Result<usize> {
    conn.execute(
        "
        INSERT INTO moods (created_at, user_id, date, type, intensity, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
        params![
            now_timestamp(),
            mood.user_id.as_str(),
            format_date(mood.date),
            mood.kind.as_str(),
            mood.intensity.as_str(),
            mood.notes,
        ],
    )
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
