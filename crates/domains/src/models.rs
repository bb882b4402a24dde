//! # Domain Models
//!
//! These structs represent the core entities of word-draw.
//! We use UUID v7 for time-ordered, globally unique identification of
//! words and draws; users are opaque external identities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, Result};

/// Maximum length of a language code such as `en-us`.
pub const MAX_LANGUAGE_LEN: usize = 5;
/// Maximum length of a word's text.
pub const MAX_WORD_LEN: usize = 100;

/// Identity of the user a draw is made for (e.g. a username).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError("user id must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    DomainError::ValidationError(format!(
                        "invalid {} '{}': {}",
                        stringify!($name),
                        s,
                        e
                    ))
                })
            }
        }
    };
}

uuid_id!(
    /// Primary key of a [`Word`].
    WordId
);
uuid_id!(
    /// Primary key of a [`Draw`]; also the key of its [`Work`].
    DrawId
);

/// Whether the user took on a drawn word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptanceState {
    Pending,
    Accepted,
    Rejected,
}

impl AcceptanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AcceptanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcceptanceState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::ValidationError(format!(
                "unknown acceptance state '{other}'"
            ))),
        }
    }
}

/// Whether a draw was completed within its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawOutcome {
    Successful,
    Failed,
    /// No work yet and the window is still open.
    Undetermined,
}

impl DrawOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for DrawOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time allowed between a draw and the upload of its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DrawWindow(Duration);

impl DrawWindow {
    pub fn new(duration: Duration) -> Result<Self> {
        if duration <= Duration::zero() {
            return Err(DomainError::ValidationError(
                "draw window must be a positive duration".into(),
            ));
        }
        Ok(Self(duration))
    }

    pub fn days(days: i64) -> Result<Self> {
        let duration = Duration::try_days(days).ok_or_else(|| {
            DomainError::ValidationError(format!("draw window of {days} days is out of range"))
        })?;
        Self::new(duration)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// The instant at which a window opened at `from` closes.
    pub fn closes_at(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from.checked_add_signed(self.0)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A distinct (language, word) pair that can be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    /// Language code (e.g. `en-us`)
    pub language: String,
    pub word: String,
    pub added_by: UserId,
    pub added_at: DateTime<Utc>,
}

impl Word {
    /// Validates and normalises a new word.
    pub fn new(
        language: &str,
        text: &str,
        added_by: UserId,
        added_at: DateTime<Utc>,
    ) -> Result<Self> {
        let language = language.trim();
        let text = text.trim();

        if language.is_empty() {
            return Err(DomainError::ValidationError("language must not be empty".into()));
        }
        if language.chars().count() > MAX_LANGUAGE_LEN {
            return Err(DomainError::ValidationError(format!(
                "language code '{language}' is longer than {MAX_LANGUAGE_LEN} characters"
            )));
        }
        if text.is_empty() {
            return Err(DomainError::ValidationError("word must not be empty".into()));
        }
        if text.chars().count() > MAX_WORD_LEN {
            return Err(DomainError::ValidationError(format!(
                "word is longer than {MAX_WORD_LEN} characters"
            )));
        }

        Ok(Self {
            id: WordId::new(),
            language: language.to_string(),
            word: text.to_string(),
            added_by,
            added_at,
        })
    }

    /// Short diagnostic form, e.g. `<Word: color (en-us)>`.
    pub fn tag(&self) -> String {
        format!("<Word: {} ({})>", self.word, self.language)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.word)
    }
}

/// Assignment of one word to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub id: DrawId,
    pub user_id: UserId,
    pub word_id: WordId,
    pub acceptance: AcceptanceState,
    pub timestamp: DateTime<Utc>,
}

impl Draw {
    pub fn pending(user_id: UserId, word_id: WordId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: DrawId::new(),
            user_id,
            word_id,
            acceptance: AcceptanceState::Pending,
            timestamp,
        }
    }

    /// Only the user a draw was made for may decide it or upload work for it.
    pub fn ensure_owner(&self, user: &UserId) -> Result<()> {
        if &self.user_id != user {
            return Err(DomainError::Forbidden(format!(
                "draw {} does not belong to {}",
                self.id, user
            )));
        }
        Ok(())
    }

    /// Checks that the draw may move to `to`. Only pending draws can be
    /// decided, and only towards accepted or rejected.
    pub fn check_transition(&self, to: AcceptanceState) -> Result<()> {
        match (self.acceptance, to) {
            (AcceptanceState::Pending, AcceptanceState::Accepted)
            | (AcceptanceState::Pending, AcceptanceState::Rejected) => Ok(()),
            (from, to) => Err(DomainError::InvalidTransition {
                entity: "Draw".into(),
                id: self.id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

/// Uploaded output for an accepted draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub draw_id: DrawId,
    pub language: String,
    pub upload_time: DateTime<Utc>,
}

/// A draw together with its word and (optional) work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub draw: Draw,
    pub word: Word,
    pub work: Option<Work>,
}

impl DrawRecord {
    /// Accepted but no work uploaded yet.
    pub fn is_unfinished(&self) -> bool {
        self.draw.acceptance == AcceptanceState::Accepted && self.work.is_none()
    }

    /// Evaluates the draw against `window` as of `now`.
    pub fn outcome(&self, window: DrawWindow, now: DateTime<Utc>) -> DrawOutcome {
        let limit = window.as_duration();
        match &self.work {
            None => {
                if now.signed_duration_since(self.draw.timestamp) >= limit {
                    DrawOutcome::Failed
                } else {
                    DrawOutcome::Undetermined
                }
            }
            Some(work) => {
                if work.upload_time.signed_duration_since(self.draw.timestamp) > limit {
                    DrawOutcome::Failed
                } else {
                    DrawOutcome::Successful
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("test").unwrap()
    }

    fn record(timestamp: DateTime<Utc>, upload_time: Option<DateTime<Utc>>) -> DrawRecord {
        let word = Word::new("en-us", "color", user(), timestamp).unwrap();
        let mut draw = Draw::pending(user(), word.id, timestamp);
        draw.acceptance = AcceptanceState::Accepted;
        let work = upload_time.map(|upload_time| Work {
            draw_id: draw.id,
            language: "de".into(),
            upload_time,
        });
        DrawRecord { draw, word, work }
    }

    #[test]
    fn word_displays_as_its_text() {
        let word = Word::new("en-us", "color", user(), Utc::now()).unwrap();
        assert_eq!(word.to_string(), "color");
        assert_eq!(word.tag(), "<Word: color (en-us)>");
    }

    #[test]
    fn word_validation() {
        let now = Utc::now();
        assert!(Word::new("en-us", "   ", user(), now).is_err());
        assert!(Word::new("", "color", user(), now).is_err());
        assert!(Word::new("en-us-x", "color", user(), now).is_err());
        assert!(Word::new("en", &"a".repeat(MAX_WORD_LEN + 1), user(), now).is_err());

        let word = Word::new(" en ", "  colour ", user(), now).unwrap();
        assert_eq!(word.language, "en");
        assert_eq!(word.word, "colour");
    }

    #[test]
    fn user_id_must_not_be_blank() {
        assert!(UserId::new("  ").is_err());
        assert_eq!(UserId::new(" alice ").unwrap().as_str(), "alice");
    }

    #[test]
    fn ids_parse_from_strings() {
        let id = DrawId::new();
        assert_eq!(id.to_string().parse::<DrawId>().unwrap(), id);
        assert!("not-a-uuid".parse::<WordId>().is_err());
    }

    #[test]
    fn acceptance_state_round_trips_through_str() {
        for state in [
            AcceptanceState::Pending,
            AcceptanceState::Accepted,
            AcceptanceState::Rejected,
        ] {
            assert_eq!(state.as_str().parse::<AcceptanceState>().unwrap(), state);
        }
        assert!("maybe".parse::<AcceptanceState>().is_err());
        assert_eq!(
            serde_json::to_string(&AcceptanceState::Rejected).unwrap(),
            "\"rejected\""
        );
    }

    #[test]
    fn only_pending_draws_can_be_decided() {
        let mut draw = Draw::pending(user(), WordId::new(), Utc::now());
        assert!(draw.check_transition(AcceptanceState::Accepted).is_ok());
        assert!(draw.check_transition(AcceptanceState::Rejected).is_ok());
        assert!(draw.check_transition(AcceptanceState::Pending).is_err());

        draw.acceptance = AcceptanceState::Rejected;
        let err = draw.check_transition(AcceptanceState::Accepted).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn only_the_drawing_user_owns_a_draw() {
        let draw = Draw::pending(user(), WordId::new(), Utc::now());
        assert!(draw.ensure_owner(&user()).is_ok());

        let err = draw.ensure_owner(&UserId::new("mallory").unwrap()).unwrap_err();
        assert_eq!(
            err,
            DomainError::Forbidden(format!("draw {} does not belong to mallory", draw.id))
        );
    }

    #[test]
    fn window_must_be_positive() {
        assert!(DrawWindow::new(Duration::zero()).is_err());
        assert!(DrawWindow::new(Duration::seconds(-5)).is_err());
        assert_eq!(DrawWindow::days(1).unwrap().as_duration(), Duration::days(1));
    }

    #[test]
    fn outcome_without_work() {
        let window = DrawWindow::days(1).unwrap();
        let now = Utc::now();

        assert_eq!(record(now, None).outcome(window, now), DrawOutcome::Undetermined);
        assert_eq!(
            record(now - Duration::days(2), None).outcome(window, now),
            DrawOutcome::Failed
        );
        // Exactly at the boundary the window has elapsed.
        assert_eq!(
            record(now - Duration::days(1), None).outcome(window, now),
            DrawOutcome::Failed
        );
    }

    #[test]
    fn outcome_with_work() {
        let window = DrawWindow::days(1).unwrap();
        let now = Utc::now();

        let on_time = record(now + Duration::minutes(1), Some(now));
        assert_eq!(on_time.outcome(window, now), DrawOutcome::Successful);

        let late = record(now - Duration::days(2), Some(now));
        assert_eq!(late.outcome(window, now), DrawOutcome::Failed);

        // Uploading exactly at the deadline still counts.
        let boundary = record(now - Duration::days(1), Some(now));
        assert_eq!(boundary.outcome(window, now), DrawOutcome::Successful);
    }

    #[test]
    fn unfinished_means_accepted_without_work() {
        let now = Utc::now();
        assert!(record(now, None).is_unfinished());
        assert!(!record(now, Some(now)).is_unfinished());
    }
}
