//! # Core Traits (Ports)
//!
//! Any storage adapter must implement the repository traits to be used by
//! the services. "Nothing found" is `Ok(None)` or an empty `Vec`; only
//! infrastructure failures and violated storage invariants are errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{AcceptanceState, Draw, DrawId, DrawRecord, UserId, Word, Work};

/// Persistence contract for words.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WordRepository: Send + Sync {
    /// Inserts a word. A duplicate `(language, word)` pair is a `Conflict`.
    async fn create_word(&self, word: Word) -> Result<Word>;
    /// All words ordered by `added_at`.
    async fn list_words(&self) -> Result<Vec<Word>>;
    /// Words the user has not accepted a draw for, ordered by `added_at`.
    async fn list_candidate_words(&self, user: &UserId) -> Result<Vec<Word>>;
}

/// Persistence contract for draws.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DrawRepository: Send + Sync {
    /// Inserts a draw. A second pending draw for the same user is a `Conflict`.
    async fn create_draw(&self, draw: Draw) -> Result<Draw>;
    async fn find_draw(&self, id: DrawId) -> Result<Option<DrawRecord>>;
    /// The user's pending draw, if any.
    async fn find_pending_draw(&self, user: &UserId) -> Result<Option<DrawRecord>>;
    /// The user's most recent accepted draw that has no work yet.
    async fn find_unfinished_draw(&self, user: &UserId) -> Result<Option<DrawRecord>>;
    /// The user's most recent draw by timestamp.
    async fn latest_draw(&self, user: &UserId) -> Result<Option<DrawRecord>>;
    /// All of the user's draws, oldest first.
    async fn list_draws(&self, user: &UserId) -> Result<Vec<DrawRecord>>;
    /// Moves a pending draw to `to`. Fails with `InvalidTransition` when the
    /// stored draw is no longer pending.
    async fn set_acceptance(&self, id: DrawId, to: AcceptanceState) -> Result<Draw>;
}

/// Persistence contract for uploaded work.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WorkRepository: Send + Sync {
    /// Inserts work for a draw. A second work for the same draw is a `Conflict`.
    async fn create_work(&self, work: Work) -> Result<Work>;
}

/// Source of the current time.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Chooses one word out of a non-empty candidate slice.
pub trait WordPicker: Send + Sync {
    fn pick<'a>(&self, candidates: &'a [Word]) -> Option<&'a Word>;
}
