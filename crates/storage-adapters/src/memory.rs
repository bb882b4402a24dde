//! # In-memory Implementation
//!
//! Concurrent maps standing in for the three tables. The uniqueness rules
//! of the SQL schema are enforced through `DashMap` entries keyed by the
//! unique columns.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::errors::{DomainError, Result};
use domains::models::{AcceptanceState, Draw, DrawId, DrawRecord, UserId, Word, WordId, Work};
use domains::ports::{DrawRepository, WordRepository, WorkRepository};

#[derive(Default)]
pub struct MemoryStore {
    words: DashMap<WordId, Word>,
    /// (language, word) -> id
    word_keys: DashMap<(String, String), WordId>,
    draws: DashMap<DrawId, Draw>,
    /// user -> their single pending draw
    pending: DashMap<UserId, DrawId>,
    works: DashMap<DrawId, Work>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, draw: Draw) -> Result<DrawRecord> {
        let word = self
            .words
            .get(&draw.word_id)
            .map(|word| word.clone())
            .ok_or_else(|| {
                DomainError::Internal(format!("draw {} references missing word {}", draw.id, draw.word_id))
            })?;
        let work = self.works.get(&draw.id).map(|work| work.clone());
        Ok(DrawRecord { draw, word, work })
    }

    /// The user's draws, oldest first.
    fn user_draws(&self, user: &UserId) -> Vec<Draw> {
        let mut draws: Vec<Draw> = self
            .draws
            .iter()
            .filter(|draw| &draw.user_id == user)
            .map(|draw| draw.clone())
            .collect();
        draws.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        draws
    }

    fn latest_matching(
        &self,
        user: &UserId,
        keep: impl Fn(&Draw) -> bool,
    ) -> Result<Option<DrawRecord>> {
        self.user_draws(user)
            .into_iter()
            .rev()
            .find(|draw| keep(draw))
            .map(|draw| self.record(draw))
            .transpose()
    }
}

fn sorted_words(mut words: Vec<Word>) -> Vec<Word> {
    words.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.id.cmp(&b.id)));
    words
}

#[async_trait]
impl WordRepository for MemoryStore {
    async fn create_word(&self, word: Word) -> Result<Word> {
        match self.word_keys.entry((word.language.clone(), word.word.clone())) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!("{} already exists", word.tag()))),
            Entry::Vacant(slot) => {
                self.words.insert(word.id, word.clone());
                slot.insert(word.id);
                Ok(word)
            }
        }
    }

    async fn list_words(&self) -> Result<Vec<Word>> {
        Ok(sorted_words(
            self.words.iter().map(|word| word.clone()).collect(),
        ))
    }

    async fn list_candidate_words(&self, user: &UserId) -> Result<Vec<Word>> {
        let accepted: HashSet<WordId> = self
            .draws
            .iter()
            .filter(|draw| &draw.user_id == user && draw.acceptance == AcceptanceState::Accepted)
            .map(|draw| draw.word_id)
            .collect();

        Ok(sorted_words(
            self.words
                .iter()
                .filter(|word| !accepted.contains(&word.id))
                .map(|word| word.clone())
                .collect(),
        ))
    }
}

#[async_trait]
impl DrawRepository for MemoryStore {
    async fn create_draw(&self, draw: Draw) -> Result<Draw> {
        if !self.words.contains_key(&draw.word_id) {
            return Err(DomainError::ValidationError(format!(
                "referenced record does not exist: word {}",
                draw.word_id
            )));
        }

        if draw.acceptance != AcceptanceState::Pending {
            self.draws.insert(draw.id, draw.clone());
            return Ok(draw);
        }

        match self.pending.entry(draw.user_id.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "{} already has a pending draw",
                draw.user_id
            ))),
            Entry::Vacant(slot) => {
                self.draws.insert(draw.id, draw.clone());
                slot.insert(draw.id);
                Ok(draw)
            }
        }
    }

    async fn find_draw(&self, id: DrawId) -> Result<Option<DrawRecord>> {
        let draw = self.draws.get(&id).map(|draw| draw.clone());
        draw.map(|draw| self.record(draw)).transpose()
    }

    async fn find_pending_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        self.latest_matching(user, |draw| draw.acceptance == AcceptanceState::Pending)
    }

    async fn find_unfinished_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        self.latest_matching(user, |draw| {
            draw.acceptance == AcceptanceState::Accepted && !self.works.contains_key(&draw.id)
        })
    }

    async fn latest_draw(&self, user: &UserId) -> Result<Option<DrawRecord>> {
        self.latest_matching(user, |_| true)
    }

    async fn list_draws(&self, user: &UserId) -> Result<Vec<DrawRecord>> {
        self.user_draws(user)
            .into_iter()
            .map(|draw| self.record(draw))
            .collect()
    }

    async fn set_acceptance(&self, id: DrawId, to: AcceptanceState) -> Result<Draw> {
        // The draw's shard lock is released before the pending index is touched.
        let draw = {
            let mut entry = self
                .draws
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("Draw", id))?;
            entry.check_transition(to)?;
            entry.acceptance = to;
            entry.clone()
        };
        self.pending
            .remove_if(&draw.user_id, |_, pending_id| *pending_id == id);
        Ok(draw)
    }
}

#[async_trait]
impl WorkRepository for MemoryStore {
    async fn create_work(&self, work: Work) -> Result<Work> {
        if !self.draws.contains_key(&work.draw_id) {
            return Err(DomainError::ValidationError(format!(
                "referenced record does not exist: draw {}",
                work.draw_id
            )));
        }

        match self.works.entry(work.draw_id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "work for draw {} was already uploaded",
                work.draw_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(work.clone());
                Ok(work)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    async fn store_with_words(texts: &[&str]) -> (MemoryStore, Vec<Word>) {
        let store = MemoryStore::new();
        let start = Utc::now() - Duration::days(10);
        let mut words = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let word = Word::new("en-us", text, alice(), start + Duration::minutes(i as i64)).unwrap();
            words.push(store.create_word(word).await.unwrap());
        }
        (store, words)
    }

    #[tokio::test]
    async fn duplicate_word_is_a_conflict() {
        let (store, _) = store_with_words(&["color"]).await;
        let dup = Word::new("en-us", "color", alice(), Utc::now()).unwrap();
        assert!(store.create_word(dup).await.unwrap_err().is_conflict());
        assert_eq!(store.list_words().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deciding_frees_the_pending_slot() {
        let (store, words) = store_with_words(&["color", "colour"]).await;
        let now = Utc::now();

        let first = store
            .create_draw(Draw::pending(alice(), words[0].id, now))
            .await
            .unwrap();
        assert!(store
            .create_draw(Draw::pending(alice(), words[1].id, now))
            .await
            .unwrap_err()
            .is_conflict());

        store.set_acceptance(first.id, AcceptanceState::Rejected).await.unwrap();
        assert!(store.find_pending_draw(&alice()).await.unwrap().is_none());
        assert!(store
            .create_draw(Draw::pending(alice(), words[1].id, now))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn unfinished_draw_disappears_once_work_exists() {
        let (store, words) = store_with_words(&["color"]).await;
        let draw = store
            .create_draw(Draw::pending(alice(), words[0].id, Utc::now()))
            .await
            .unwrap();
        store.set_acceptance(draw.id, AcceptanceState::Accepted).await.unwrap();
        assert!(store.find_unfinished_draw(&alice()).await.unwrap().is_some());

        let work = Work {
            draw_id: draw.id,
            language: "de".into(),
            upload_time: Utc::now(),
        };
        store.create_work(work.clone()).await.unwrap();
        assert!(store.find_unfinished_draw(&alice()).await.unwrap().is_none());
        assert!(store.create_work(work).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn candidates_skip_accepted_words() {
        let (store, words) = store_with_words(&["color", "colour"]).await;
        let draw = store
            .create_draw(Draw::pending(alice(), words[1].id, Utc::now()))
            .await
            .unwrap();
        store.set_acceptance(draw.id, AcceptanceState::Accepted).await.unwrap();

        let candidates = store.list_candidate_words(&alice()).await.unwrap();
        assert_eq!(candidates, vec![words[0].clone()]);
    }

    #[tokio::test]
    async fn work_needs_an_existing_draw() {
        let store = MemoryStore::new();
        let err = store
            .create_work(Work {
                draw_id: DrawId::new(),
                language: "de".into(),
                upload_time: Utc::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }
}
