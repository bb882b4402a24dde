//! # WorkService
//!
//! Uploading work for accepted draws and judging whether draws were
//! completed inside their window.

use std::sync::Arc;

use domains::errors::{DomainError, Result};
use domains::models::{
    AcceptanceState, DrawId, DrawOutcome, DrawRecord, DrawWindow, UserId, Word, Work,
    MAX_LANGUAGE_LEN,
};
use domains::ports::{Clock, DrawRepository, WorkRepository};
use tracing::info;

pub struct WorkService {
    draws: Arc<dyn DrawRepository>,
    works: Arc<dyn WorkRepository>,
    clock: Arc<dyn Clock>,
}

impl WorkService {
    pub fn new(
        draws: Arc<dyn DrawRepository>,
        works: Arc<dyn WorkRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { draws, works, clock }
    }

    /// Records the upload of work for an accepted draw, stamped with the
    /// current time.
    pub async fn upload_work(&self, user: &UserId, draw_id: DrawId, language: &str) -> Result<Work> {
        let language = language.trim();
        if language.is_empty() || language.chars().count() > MAX_LANGUAGE_LEN {
            return Err(DomainError::ValidationError(format!(
                "language code must be 1 to {MAX_LANGUAGE_LEN} characters"
            )));
        }

        let record = self
            .draws
            .find_draw(draw_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Draw", draw_id))?;
        record.draw.ensure_owner(user)?;

        if record.draw.acceptance != AcceptanceState::Accepted {
            return Err(DomainError::InvalidTransition {
                entity: "Draw".into(),
                id: draw_id.to_string(),
                from: record.draw.acceptance.to_string(),
                to: "uploaded".into(),
            });
        }
        if record.work.is_some() {
            return Err(DomainError::Conflict(format!(
                "work for draw {draw_id} was already uploaded"
            )));
        }

        let work = self
            .works
            .create_work(Work {
                draw_id,
                language: language.to_string(),
                upload_time: self.clock.now(),
            })
            .await?;
        info!(draw_id = %draw_id, user = %user, language = %work.language, "work uploaded");
        Ok(work)
    }

    /// Judges a single draw as of now.
    pub fn evaluate(&self, record: &DrawRecord, window: DrawWindow) -> DrawOutcome {
        record.outcome(window, self.clock.now())
    }

    /// Looks up a draw and judges it as of now.
    pub async fn draw_outcome(&self, draw_id: DrawId, window: DrawWindow) -> Result<DrawOutcome> {
        let record = self
            .draws
            .find_draw(draw_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Draw", draw_id))?;
        Ok(self.evaluate(&record, window))
    }

    /// All of the user's draws with their outcome, oldest first.
    pub async fn history(
        &self,
        user: &UserId,
        window: DrawWindow,
    ) -> Result<Vec<(DrawRecord, DrawOutcome)>> {
        let now = self.clock.now();
        Ok(self
            .draws
            .list_draws(user)
            .await?
            .into_iter()
            .map(|record| {
                let outcome = record.outcome(window, now);
                (record, outcome)
            })
            .collect())
    }

    pub async fn failed_words(&self, user: &UserId, window: DrawWindow) -> Result<Vec<Word>> {
        self.words_with_outcome(user, window, DrawOutcome::Failed).await
    }

    pub async fn successful_words(&self, user: &UserId, window: DrawWindow) -> Result<Vec<Word>> {
        self.words_with_outcome(user, window, DrawOutcome::Successful).await
    }

    async fn words_with_outcome(
        &self,
        user: &UserId,
        window: DrawWindow,
        wanted: DrawOutcome,
    ) -> Result<Vec<Word>> {
        Ok(self
            .history(user, window)
            .await?
            .into_iter()
            .filter(|(_, outcome)| *outcome == wanted)
            .map(|(record, _)| record.word)
            .collect())
    }
}
