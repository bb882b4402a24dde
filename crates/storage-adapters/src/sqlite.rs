//! # SQLite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `domains` models. Timestamps are stored as fixed-width
//! RFC 3339 text so that `ORDER BY` on them is chronological.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use domains::errors::{DomainError, Result};
use domains::models::{
    AcceptanceState, Draw, DrawId, DrawRecord, UserId, Word, WordId, Work,
};
use domains::ports::{DrawRepository, WordRepository, WorkRepository};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const WORD_COLUMNS: &str = "id, language, word, added_by, added_at";

const RECORD_SELECT: &str = "SELECT d.id AS draw_id, d.user_id, d.word_id, d.acceptance, d.timestamp, \
     w.language AS word_language, w.word, w.added_by, w.added_at, \
     k.language AS work_language, k.upload_time \
     FROM draws d \
     JOIN words w ON w.id = d.word_id \
     LEFT JOIN works k ON k.draw_id = d.id";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and applies
    /// pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(storage_error)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        info!(max_connections, "connected to sqlite");
        Self::from_pool(pool).await
    }

    /// A private in-memory database. Pinned to a single connection that is
    /// never recycled, since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(storage_error)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| DomainError::Internal(format!("migration failed: {e}")))?;
        debug!("sqlite migrations applied");
        Ok(Self { pool })
    }

    async fn fetch_record(&self, filter: &str, bind: RecordKey<'_>) -> Result<Option<DrawRecord>> {
        let sql = format!("{RECORD_SELECT} {filter}");
        let query = sqlx::query(&sql);
        let query = match bind {
            RecordKey::Draw(id) => query.bind(id.0),
            RecordKey::User(user) => query.bind(user.as_str()),
        };
        query
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(row_to_record)
            .transpose()
    }

    async fn fetch_draw(&self, id: DrawId) -> Result<Option<Draw>> {
        sqlx::query("SELECT id, user_id, word_id, acceptance, timestamp FROM draws WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(row_to_draw)
            .transpose()
    }
}

enum RecordKey<'a> {
    Draw(DrawId),
    User(&'a UserId),
}

/// Maps driver failures onto domain errors; constraint violations keep
/// their meaning, everything else becomes `Internal`.
fn storage_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            DomainError::ValidationError(format!("referenced record does not exist: {}", db.message()))
        }
        _ => DomainError::Internal(err.to_string()),
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(storage_error)
}

fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DomainError::Internal(format!("corrupt timestamp '{raw}': {e}")))
}

fn row_to_word(row: &SqliteRow) -> Result<Word> {
    Ok(Word {
        id: WordId(column::<Uuid>(row, "id")?),
        language: column(row, "language")?,
        word: column(row, "word")?,
        added_by: UserId::new(column::<String>(row, "added_by")?)?,
        added_at: decode_time(&column::<String>(row, "added_at")?)?,
    })
}

fn row_to_draw(row: &SqliteRow) -> Result<Draw> {
    Ok(Draw {
        id: DrawId(column::<Uuid>(row, "id")?),
        user_id: UserId::new(column::<String>(row, "user_id")?)?,
        word_id: WordId(column::<Uuid>(row, "word_id")?),
        acceptance: column::<String>(row, "acceptance")?.parse()?,
        timestamp: decode_time(&column::<String>(row, "timestamp")?)?,
    })
}

fn row_to_record(row: &SqliteRow) -> Result<DrawRecord> {
    let draw = Draw {
        id: DrawId(column::<Uuid>(row, "draw_id")?),
        user_id: UserId::new(column::<String>(row, "user_id")?)?,
        word_id: WordId(column::<Uuid>(row, "word_id")?),
        acceptance: column::<String>(row, "acceptance")?.parse()?,
        timestamp: decode_time(&column::<String>(row, "timestamp")?)?,
    };
    let word = Word {
        id: draw.word_id,
        language: column(row, "word_language")?,
        word: column(row, "word")?,
        added_by: UserId::new(column::<String>(row, "added_by")?)?,
        added_at: decode_time(&column::<String>(row, "added_at")?)?,
    };
    let work = match (
        column::<Option<String>>(row, "work_language")?,
        column::<Option<String>>(row, "upload_time")?,
    ) {
        (Some(language), Some(upload_time)) => Some(Work {
            draw_id: draw.id,
            language,
            upload_time: decode_time(&upload_time)?,
        }),
        _ => None,
    };
    Ok(DrawRecord { draw, word, work })
}

#[async_trait]
impl WordRepository for SqliteStore {
    async fn create_word(&self, word: Word) -> Result<Word> {
        sqlx::query(&format!(
            "INSERT INTO words ({WORD_COLUMNS}) VALUES (?, ?, ?, ?, ?)"
        ))
        .bind(word.id.0)
        .bind(&word.language)
        .bind(&word.word)
        .bind(word.added_by.as_str())
        .bind(encode_time(word.added_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match storage_error(e) {
            DomainError::Conflict(_) => DomainError::Conflict(format!("{} already exists", word.tag())),
            other => other,
        })?;
        Ok(word)
    }

    async fn list_words(&self) -> Result<Vec<Word>> {
        sqlx::query(&format!(
            "SELECT {WORD_COLUMNS} FROM words ORDER BY added_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?
        .iter()
        .map(row_to_word)
        .collect()
    }

    async fn list_candidate_words(&self, user: &UserId) -> Result<Vec<Word>> {
        sqlx::query(&format!(
            "SELECT {WORD_COLUMNS} FROM words w \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM draws d \
                 WHERE d.word_id = w.id AND d.user_id = ? AND d.acceptance = 'accepted' \
             ) \
             ORDER BY added_at, id"
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?
        .iter()
        .map(row_to_word)
        .collect()
    }
}

#[async_trait]
impl DrawRepository for SqliteStore {
    async fn create_draw(&self, draw: Draw) -> Result<Draw> {
        sqlx::query(
            "INSERT INTO draws (id, user_id, word_id, acceptance, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(draw.id.0)
        .bind(draw.user_id.as_str())
        .bind(draw.word_id.0)
        .bind(draw.acceptance.as_str())
        .bind(encode_time(draw.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| match storage_error(e) {
            DomainError::Conflict(_) => {
                DomainError::Conflict(format!("{} already has a pending draw", draw.user_id))
            }
            other => other,
        })?;
        Ok(draw)
    }

    async fn find_draw(&self, id: DrawId) -> Result<Option<DrawRecord>> {
        self.fetch_record("WHERE d.id = ?", RecordKey::Draw(id)).await
    }

    async fn find_pending_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        self.fetch_record(
            "WHERE d.user_id = ? AND d.acceptance = 'pending' \
             ORDER BY d.timestamp DESC, d.id DESC LIMIT 1",
            RecordKey::User(user),
        )
        .await
    }

    async fn find_unfinished_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        self.fetch_record(
            "WHERE d.user_id = ? AND d.acceptance = 'accepted' AND k.draw_id IS NULL \
             ORDER BY d.timestamp DESC, d.id DESC LIMIT 1",
            RecordKey::User(user),
        )
        .await
    }

    async fn latest_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        self.fetch_record(
            "WHERE d.user_id = ? ORDER BY d.timestamp DESC, d.id DESC LIMIT 1",
            RecordKey::User(user),
        )
        .await
    }

    async fn list_draws(&self, user: &UserId) -> Result<Vec<DrawRecord>> {
        sqlx::query(&format!(
            "{RECORD_SELECT} WHERE d.user_id = ? ORDER BY d.timestamp ASC, d.id ASC"
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?
        .iter()
        .map(row_to_record)
        .collect()
    }

    /// Conditional update: the row only changes while it is still pending,
    /// so two racing decisions cannot both succeed.
    async fn set_acceptance(&self, id: DrawId, to: AcceptanceState) -> Result<Draw> {
        if to == AcceptanceState::Pending {
            return Err(DomainError::ValidationError(
                "a draw cannot be moved back to pending".into(),
            ));
        }

        let updated = sqlx::query(
            "UPDATE draws SET acceptance = ? WHERE id = ? AND acceptance = 'pending'",
        )
        .bind(to.as_str())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?
        .rows_affected();

        let draw = self
            .fetch_draw(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Draw", id))?;

        if updated == 0 {
            // Still reports the state that blocked the update.
            draw.check_transition(to)?;
        }
        Ok(draw)
    }
}

#[async_trait]
impl WorkRepository for SqliteStore {
    async fn create_work(&self, work: Work) -> Result<Work> {
        sqlx::query("INSERT INTO works (draw_id, language, upload_time) VALUES (?, ?, ?)")
            .bind(work.draw_id.0)
            .bind(&work.language)
            .bind(encode_time(work.upload_time))
            .execute(&self.pool)
            .await
            .map_err(|e| match storage_error(e) {
                DomainError::Conflict(_) => DomainError::Conflict(format!(
                    "work for draw {} was already uploaded",
                    work.draw_id
                )),
                other => other,
            })?;
        Ok(work)
    }
}
