//! # WordService
//!
//! Adding words to the pool, one at a time or from a tab-separated list.

use std::sync::Arc;

use domains::errors::{DomainError, Result};
use domains::models::{UserId, Word};
use domains::ports::{Clock, WordRepository};
use tracing::{debug, info};

/// Counts from a bulk import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    /// Lines naming a word that already exists.
    pub skipped: usize,
}

pub struct WordService {
    words: Arc<dyn WordRepository>,
    clock: Arc<dyn Clock>,
}

impl WordService {
    pub fn new(words: Arc<dyn WordRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { words, clock }
    }

    pub async fn add_word(&self, user: &UserId, language: &str, text: &str) -> Result<Word> {
        let word = Word::new(language, text, user.clone(), self.clock.now())?;
        let word = self.words.create_word(word).await?;
        info!(word_id = %word.id, word = %word, language = %word.language, added_by = %user, "word added");
        Ok(word)
    }

    pub async fn list_words(&self) -> Result<Vec<Word>> {
        self.words.list_words().await
    }

    /// Adds every `language<TAB>word` line of `input`. Blank lines and lines
    /// starting with `#` are ignored; words that already exist are skipped.
    pub async fn import_words(&self, user: &UserId, input: &str) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for (index, line) in input.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((language, text)) = line.split_once('\t') else {
                return Err(DomainError::ValidationError(format!(
                    "line {line_no}: expected 'language<TAB>word'"
                )));
            };

            match self.add_word(user, language, text).await {
                Ok(_) => summary.added += 1,
                Err(DomainError::Conflict(reason)) => {
                    debug!(line = line_no, %reason, "skipping existing word");
                    summary.skipped += 1;
                }
                Err(DomainError::ValidationError(reason)) => {
                    return Err(DomainError::ValidationError(format!("line {line_no}: {reason}")));
                }
                Err(other) => return Err(other),
            }
        }

        info!(added = summary.added, skipped = summary.skipped, "word import finished");
        Ok(summary)
    }
}
