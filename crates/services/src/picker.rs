//! Candidate selection strategies for the `WordPicker` port.

use domains::models::Word;
use domains::ports::WordPicker;
use rand::seq::IndexedRandom;

/// Picks uniformly at random using the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl WordPicker for RandomPicker {
    fn pick<'a>(&self, candidates: &'a [Word]) -> Option<&'a Word> {
        candidates.choose(&mut rand::rng())
    }
}

/// Always picks the first candidate (oldest word).
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPicker;

#[cfg(any(test, feature = "testing"))]
impl WordPicker for FirstPicker {
    fn pick<'a>(&self, candidates: &'a [Word]) -> Option<&'a Word> {
        candidates.first()
    }
}
