//! Simultaneous draws for one user must settle on a single pending draw.

use std::sync::Arc;

use domains::models::AcceptanceState;
use integration_tests::{on_every_store, user, Harness};
use storage_adapters::MemoryStore;

const RACERS: usize = 8;

on_every_store!(interleaved_draws_share_one_pending_draw, separate_users_do_not_contend);

async fn race(h: Arc<Harness>, name: &str) -> Vec<String> {
    let mut handles = Vec::with_capacity(RACERS);
    for _ in 0..RACERS {
        let h = Arc::clone(&h);
        let racer = user(name);
        handles.push(tokio::spawn(async move {
            h.draws
                .draw_word(&racer, h.window)
                .await
                .unwrap()
                .map(|word| word.word)
        }));
    }

    let mut drawn = Vec::with_capacity(RACERS);
    for handle in handles {
        drawn.push(handle.await.unwrap().unwrap());
    }
    drawn
}

async fn seed(h: &Harness) {
    for (language, text) in [("en-us", "color"), ("en-gb", "colour"), ("de", "Farbe"), ("fr", "couleur")] {
        h.add(language, text).await;
    }
}

async fn assert_single_pending(h: &Harness, name: &str, drawn: &[String]) {
    assert!(drawn.windows(2).all(|pair| pair[0] == pair[1]), "racers saw {drawn:?}");

    let history = h.works.history(&user(name), h.window).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0.draw.acceptance, AcceptanceState::Pending);
    assert_eq!(history[0].0.word.word, drawn[0]);
}

async fn interleaved_draws_share_one_pending_draw(h: Harness) {
    seed(&h).await;
    let h = Arc::new(h);

    let drawn = race(Arc::clone(&h), "alice").await;
    assert_single_pending(&h, "alice", &drawn).await;
}

async fn separate_users_do_not_contend(h: Harness) {
    seed(&h).await;
    let h = Arc::new(h);

    let alice = race(Arc::clone(&h), "alice").await;
    let bob = race(Arc::clone(&h), "bob").await;
    assert_single_pending(&h, "alice", &alice).await;
    assert_single_pending(&h, "bob", &bob).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_draws_share_one_pending_draw() {
    let h = Harness::new(Arc::new(MemoryStore::new()));
    seed(&h).await;
    let h = Arc::new(h);

    for round in 0..20 {
        let name = format!("user-{round}");
        let drawn = race(Arc::clone(&h), &name).await;
        assert_single_pending(&h, &name, &drawn).await;
    }
}
