pub mod catalog;
pub mod channels;
pub mod users;

use crate::message::FormattedText;
use crate::strings::STRINGS;
use crate::user_facing_error::UserFacingError;
use chrono::{Duration, Local};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Timestamp format stored in `created_at`/`last_active` columns. Fixed-width
/// so that plain string comparison orders chronologically.
pub(crate) const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn now_stamp() -> String {
    Local::now().format(STAMP_FORMAT).to_string()
}

/// Start-of-today and start-of-tomorrow stamps, for "today" statistics.
pub(crate) fn today_bounds() -> (String, String) {
    let today = Local::now().date_naive().and_hms_opt(0, 0, 0).unwrap();
    let tomorrow = today + Duration::days(1);
    (
        today.format(STAMP_FORMAT).to_string(),
        tomorrow.format(STAMP_FORMAT).to_string(),
    )
}

/// A registered bot user.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StoredUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub faculty: Option<String>,
    pub is_blocked: bool,
    pub is_admin: bool,
    pub created_at: String,
    pub last_active: Option<String>,
    pub total_downloads: i64,
}

/// The profile fields Telegram reports about a user.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UserStats {
    pub total: i64,
    pub new_today: i64,
    pub active_today: i64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Faculty {
    pub id: i64,
    pub name: String,
}

/// The lesson fields the catalog browser shows in lists.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LessonSummary {
    pub code: String,
    pub title: String,
    pub downloads: i64,
}

/// A faculty-wide listing row: the lesson plus its topic name, if any.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FacultyLesson {
    pub topic: Option<String>,
    pub lesson: LessonSummary,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Lesson {
    pub id: i64,
    pub faculty_id: i64,
    pub topic_id: Option<i64>,
    pub code: String,
    pub title: String,
    pub file_id: String,
    pub file_name: Option<String>,
    pub file_size: i64,
    pub created_at: String,
    pub downloads: i64,
}

/// Input of the add-lesson terminal step.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewLesson {
    pub faculty_id: i64,
    pub topic: Option<String>,
    pub code: String,
    pub title: String,
    pub file_id: String,
    pub file_name: Option<String>,
    pub file_size: i64,
}

/// A channel the user must be subscribed to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Channel {
    pub channel_id: i64,
    pub title: String,
    pub invite_link: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AdminEntry {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// A row of the admin recent-lessons listing. `file_id_len` lets the view
/// flag rows whose stored file reference looks broken.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RecentLesson {
    pub code: String,
    pub title: String,
    pub created_at: String,
    pub file_id_len: i64,
}

#[derive(Debug, PartialEq)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    DuplicateFacultyName(String),
    DuplicateLessonCode(String),
    NoSuchFaculty(i64),
    NoSuchLesson(String),
    NoSuchChannel(i64),
    NoSuchUser(i64),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "SQLite error: {}", e),
            Self::DuplicateFacultyName(name) => {
                write!(f, "A faculty named `{}` already exists", name)
            }
            Self::DuplicateLessonCode(code) => {
                write!(f, "A lesson with code `{}` already exists", code)
            }
            Self::NoSuchFaculty(id) => write!(f, "No faculty with id {}", id),
            Self::NoSuchLesson(code) => write!(f, "No lesson with code `{}`", code),
            Self::NoSuchChannel(id) => write!(f, "No channel with id {}", id),
            Self::NoSuchUser(id) => write!(f, "No user with telegram id {}", id),
        }
    }
}

impl Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl UserFacingError for StoreError {
    fn user_message(&self) -> FormattedText {
        let s = &STRINGS.errors.store;
        match self {
            Self::Sqlite(_) => STRINGS.errors.common.internal(),
            Self::DuplicateFacultyName(name) => s.duplicate_faculty(name),
            Self::DuplicateLessonCode(code) => s.duplicate_code(code),
            Self::NoSuchFaculty(_) => s.no_such_faculty(),
            Self::NoSuchLesson(code) => s.no_such_lesson(code),
            Self::NoSuchChannel(_) => s.no_such_channel(),
            Self::NoSuchUser(_) => s.no_such_user(),
        }
    }
}

// SQLite extended result codes used to recognize constraint violations.
const FOREIGN_KEY_VIOLATION: i32 = 787;
const UNIQUE_VIOLATION: i32 = 2067;

/// Translate constraint violations into typed [`StoreError`]s; everything
/// else stays a plain SQLite error.
pub(crate) fn map_constraints<UniqueF, ForeignKeyF>(
    unique: Option<UniqueF>,
    foreign_key: Option<ForeignKeyF>,
) -> impl FnOnce(rusqlite::Error) -> StoreError
where
    UniqueF: FnOnce() -> StoreError,
    ForeignKeyF: FnOnce() -> StoreError,
{
    move |e| {
        if let Some(rusqlite::ErrorCode::ConstraintViolation) = e.sqlite_error_code() {
            if let Some(ref err) = e.sqlite_error() {
                match err.extended_code {
                    UNIQUE_VIOLATION => {
                        if let Some(f) = unique {
                            return f();
                        }
                    }
                    FOREIGN_KEY_VIOLATION => {
                        if let Some(f) = foreign_key {
                            return f();
                        }
                    }
                    _ => (),
                }
            }
        }
        StoreError::from(e)
    }
}

macro_rules! constraint_fn {
    (?) => {
        Option::<fn() -> crate::store::StoreError>::None
    };
    ($f:expr) => {
        Some($f)
    };
}

macro_rules! constraints {
    [unique => $unique:tt, fk => $fk:tt $(,)?] => {
        crate::store::map_constraints(
            crate::store::constraint_fn!($unique),
            crate::store::constraint_fn!($fk),
        )
    };
}

pub(crate) use {constraint_fn, constraints};

/// The SQLite store. Owned by the blocking access task; see [`crate::db`].
pub struct Store {
    db: Connection,
}

impl Store {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(db: Connection) -> Result<Self, StoreError> {
        db.execute("PRAGMA foreign_keys=ON", rusqlite::params![])?;
        db.execute_batch(include_str!("bootstrap.sql"))?;
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &Connection {
        &self.db
    }
}
