//! Shared fixtures for the end-to-end tests: a fully wired set of services
//! over a real store, driven by a manual clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::models::{DrawWindow, UserId, Word};
use domains::ports::{Clock, DrawRepository, WordRepository, WorkRepository};
use services::{DrawService, ManualClock, RandomPicker, WordService, WorkService};
use storage_adapters::MemoryStore;

pub struct Harness {
    pub words: WordService,
    pub draws: DrawService,
    pub works: WorkService,
    pub clock: Arc<ManualClock>,
    pub window: DrawWindow,
}

impl Harness {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: WordRepository + DrawRepository + WorkRepository + 'static,
    {
        let clock = Arc::new(ManualClock::new(start_time()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        Self {
            words: WordService::new(store.clone(), dyn_clock.clone()),
            draws: DrawService::new(
                store.clone(),
                store.clone(),
                dyn_clock.clone(),
                Arc::new(RandomPicker),
            ),
            works: WorkService::new(store.clone(), store, dyn_clock),
            clock,
            window: DrawWindow::days(1).expect("one day is a valid window"),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Adds a word and moves the clock on a little so `added_at` is distinct.
    pub async fn add(&self, language: &str, text: &str) -> Word {
        let word = self
            .words
            .add_word(&user("admin"), language, text)
            .await
            .expect("adding fixture word");
        self.advance(Duration::seconds(1));
        word
    }

    /// Draws, accepts and uploads work for whatever `user` is given next.
    pub async fn complete_next(&self, user: &UserId) -> Word {
        let word = self
            .draws
            .draw_word(user, self.window)
            .await
            .expect("drawing")
            .expect("a word to draw");
        let record = self
            .draws
            .current_draw(user)
            .await
            .expect("current draw")
            .expect("a pending draw");
        self.draws.accept_draw(user, record.draw.id).await.expect("accepting");
        self.works
            .upload_work(user, record.draw.id, "de")
            .await
            .expect("uploading");
        word
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub fn user(name: &str) -> UserId {
    UserId::new(name).expect("valid user id")
}

pub fn memory() -> Harness {
    Harness::new(Arc::new(MemoryStore::new()))
}

#[cfg(feature = "db-sqlite")]
pub async fn sqlite() -> Harness {
    let store = storage_adapters::SqliteStore::in_memory()
        .await
        .expect("in-memory sqlite");
    Harness::new(Arc::new(store))
}

/// Expands each named `async fn(Harness)` scenario into one `#[tokio::test]`
/// per storage adapter.
#[macro_export]
macro_rules! on_every_store {
    ($($scenario:ident),* $(,)?) => {
        mod memory_store {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario($crate::memory()).await
                }
            )*
        }

        #[cfg(feature = "db-sqlite")]
        mod sqlite_store {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario($crate::sqlite().await).await
                }
            )*
        }
    };
}
