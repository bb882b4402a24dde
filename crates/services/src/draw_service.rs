//! # DrawService
//!
//! The word-drawing policy: which word a user is working on, and which word
//! they get next. Also owns the pending → accepted/rejected transitions.

use std::sync::Arc;

use domains::errors::{DomainError, Result};
use domains::models::{AcceptanceState, Draw, DrawId, DrawRecord, DrawWindow, UserId, Word, WordId};
use domains::ports::{Clock, DrawRepository, WordPicker, WordRepository};
use tracing::{debug, info, instrument, warn};

/// How many times `draw_word` re-runs after losing a race for the user's
/// single pending slot.
const MAX_DRAW_ATTEMPTS: usize = 3;

pub struct DrawService {
    words: Arc<dyn WordRepository>,
    draws: Arc<dyn DrawRepository>,
    clock: Arc<dyn Clock>,
    picker: Arc<dyn WordPicker>,
}

impl DrawService {
    pub fn new(
        words: Arc<dyn WordRepository>,
        draws: Arc<dyn DrawRepository>,
        clock: Arc<dyn Clock>,
        picker: Arc<dyn WordPicker>,
    ) -> Self {
        Self {
            words,
            draws,
            clock,
            picker,
        }
    }

    /// The word the user is engaged with right now: a pending draw first,
    /// otherwise an accepted draw still waiting for work.
    pub async fn current_word(&self, user: &UserId) -> Result<Option<Word>> {
        Ok(self.current_draw(user).await?.map(|record| record.word))
    }

    /// Same lookup as [`Self::current_word`], returning the whole record.
    pub async fn current_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        if let Some(pending) = self.draws.find_pending_draw(user).await? {
            return Ok(Some(pending));
        }
        self.draws.find_unfinished_draw(user).await
    }

    pub async fn last_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        self.draws.latest_draw(user).await
    }

    /// Returns the word the user should work on, creating a pending draw
    /// when a new word has to be chosen. `None` means every word has
    /// already been accepted by this user.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn draw_word(&self, user: &UserId, window: DrawWindow) -> Result<Option<Word>> {
        let mut attempt = 1;
        loop {
            match self.try_draw_word(user, window).await {
                Err(err) if err.is_conflict() && attempt < MAX_DRAW_ATTEMPTS => {
                    warn!(attempt, error = %err, "lost race for pending draw, retrying");
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_draw_word(&self, user: &UserId, window: DrawWindow) -> Result<Option<Word>> {
        if let Some(current) = self.current_word(user).await? {
            debug!(word = %current, "user already has a current word");
            return Ok(Some(current));
        }

        let now = self.clock.now();
        let last = self.draws.latest_draw(user).await?;

        if let Some(last) = &last {
            if last.draw.acceptance != AcceptanceState::Rejected
                && window.closes_at(last.draw.timestamp) > now
            {
                debug!(word = %last.word, "last draw window still open");
                return Ok(Some(last.word.clone()));
            }
        }

        let candidates = self.words.list_candidate_words(user).await?;
        let last_word = last.as_ref().map(|record| record.word.id);

        let Some(word) = select_candidate(candidates, last_word, self.picker.as_ref()) else {
            info!("no candidate words left");
            return Ok(None);
        };

        let draw = self
            .draws
            .create_draw(Draw::pending(user.clone(), word.id, now))
            .await?;
        info!(draw_id = %draw.id, word = %word, language = %word.language, "created draw");

        Ok(Some(word))
    }

    pub async fn accept_draw(&self, user: &UserId, id: DrawId) -> Result<Draw> {
        self.decide(user, id, AcceptanceState::Accepted).await
    }

    pub async fn reject_draw(&self, user: &UserId, id: DrawId) -> Result<Draw> {
        self.decide(user, id, AcceptanceState::Rejected).await
    }

    async fn decide(&self, user: &UserId, id: DrawId, to: AcceptanceState) -> Result<Draw> {
        let record = self
            .draws
            .find_draw(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Draw", id))?;

        record.draw.ensure_owner(user)?;
        record.draw.check_transition(to)?;

        let draw = self.draws.set_acceptance(id, to).await?;
        info!(draw_id = %id, user = %user, state = %to, "draw decided");
        Ok(draw)
    }
}

/// Picks the next word. With a single candidate it is returned even if it
/// repeats the last draw; otherwise the last word is left out of the pool.
fn select_candidate(
    candidates: Vec<Word>,
    last_word: Option<WordId>,
    picker: &dyn WordPicker,
) -> Option<Word> {
    if candidates.len() <= 1 {
        return candidates.into_iter().next();
    }

    let (fresh, repeated): (Vec<Word>, Vec<Word>) = candidates
        .into_iter()
        .partition(|word| Some(word.id) != last_word);
    let pool = if fresh.is_empty() { repeated } else { fresh };

    picker.pick(&pool).cloned()
}
