//! End-to-end behaviour of the draw policy over real stores.

use chrono::Duration;
use domains::models::AcceptanceState;
use integration_tests::{on_every_store, user, Harness};

on_every_store!(
    first_draw_creates_one_pending_draw,
    redraw_without_decision_is_idempotent,
    draw_word_walks_through_the_pool,
    rejected_word_returns_when_it_is_the_only_candidate,
    open_window_keeps_the_last_word,
    rejection_moves_on_to_another_word,
    unfinished_accepted_draw_stays_current,
    last_draw_is_the_most_recent,
    users_draw_independently,
    empty_pool_draws_nothing,
);

async fn first_draw_creates_one_pending_draw(h: Harness) {
    let alice = user("alice");
    let color = h.add("en-us", "color").await;

    assert_eq!(h.draws.current_word(&alice).await.unwrap(), None);
    assert!(h.draws.last_draw(&alice).await.unwrap().is_none());

    let drawn = h.draws.draw_word(&alice, h.window).await.unwrap();
    assert_eq!(drawn.as_ref(), Some(&color));

    let history = h.works.history(&alice, h.window).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0.draw.acceptance, AcceptanceState::Pending);
    assert_eq!(h.draws.current_word(&alice).await.unwrap(), Some(color));
}

async fn redraw_without_decision_is_idempotent(h: Harness) {
    let alice = user("alice");
    h.add("en-us", "color").await;
    h.add("en-gb", "colour").await;

    let first = h.draws.draw_word(&alice, h.window).await.unwrap();
    h.advance(Duration::hours(3));
    let second = h.draws.draw_word(&alice, h.window).await.unwrap();

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(h.works.history(&alice, h.window).await.unwrap().len(), 1);
}

async fn draw_word_walks_through_the_pool(h: Harness) {
    let alice = user("alice");
    let color = h.add("en-us", "color").await;

    assert_eq!(h.complete_next(&alice).await, color);
    h.advance(Duration::days(2));

    // The completed word is never offered again.
    let colour = h.add("en-gb", "colour").await;
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), Some(colour.clone()));
    let pending = h.draws.current_draw(&alice).await.unwrap().unwrap();
    assert_eq!(pending.word, colour);
    assert_eq!(pending.draw.acceptance, AcceptanceState::Pending);

    h.draws.accept_draw(&alice, pending.draw.id).await.unwrap();
    h.works.upload_work(&alice, pending.draw.id, "de").await.unwrap();
    h.advance(Duration::days(2));

    // Out of words.
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), None);

    let farbe = h.add("de", "Farbe").await;
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), Some(farbe.clone()));

    let pending = h.draws.current_draw(&alice).await.unwrap().unwrap();
    h.draws.reject_draw(&alice, pending.draw.id).await.unwrap();

    // The rejected word is the only one left, so it comes straight back.
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), Some(farbe));
    assert_eq!(h.works.history(&alice, h.window).await.unwrap().len(), 4);
}

async fn rejected_word_returns_when_it_is_the_only_candidate(h: Harness) {
    let alice = user("alice");
    let color = h.add("en-us", "color").await;
    let colour = h.add("en-gb", "colour").await;

    let completed = h.complete_next(&alice).await;
    let remaining = if completed == color { colour } else { color };
    h.advance(Duration::days(2));

    assert_eq!(
        h.draws.draw_word(&alice, h.window).await.unwrap(),
        Some(remaining.clone())
    );
    let pending = h.draws.current_draw(&alice).await.unwrap().unwrap();
    h.draws.reject_draw(&alice, pending.draw.id).await.unwrap();

    assert_eq!(
        h.draws.draw_word(&alice, h.window).await.unwrap(),
        Some(remaining)
    );
}

async fn open_window_keeps_the_last_word(h: Harness) {
    let alice = user("alice");
    let color = h.add("en-us", "color").await;
    assert_eq!(h.complete_next(&alice).await, color);

    let colour = h.add("en-gb", "colour").await;

    // Finished early: the same word is shown until the window closes.
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), Some(color));
    assert_eq!(h.works.history(&alice, h.window).await.unwrap().len(), 1);

    h.advance(Duration::days(1));
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), Some(colour));
    assert_eq!(h.works.history(&alice, h.window).await.unwrap().len(), 2);
}

async fn rejection_moves_on_to_another_word(h: Harness) {
    let alice = user("alice");
    h.add("en-us", "color").await;
    h.add("en-gb", "colour").await;

    let first = h.draws.draw_word(&alice, h.window).await.unwrap().unwrap();
    let pending = h.draws.current_draw(&alice).await.unwrap().unwrap();
    h.draws.reject_draw(&alice, pending.draw.id).await.unwrap();

    let second = h.draws.draw_word(&alice, h.window).await.unwrap().unwrap();
    assert_ne!(first, second);
}

async fn unfinished_accepted_draw_stays_current(h: Harness) {
    let alice = user("alice");
    h.add("en-us", "color").await;
    h.add("en-gb", "colour").await;

    let word = h.draws.draw_word(&alice, h.window).await.unwrap().unwrap();
    let pending = h.draws.current_draw(&alice).await.unwrap().unwrap();
    h.draws.accept_draw(&alice, pending.draw.id).await.unwrap();

    h.advance(Duration::days(3));
    assert_eq!(h.draws.current_word(&alice).await.unwrap(), Some(word.clone()));
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), Some(word));
    assert_eq!(h.works.history(&alice, h.window).await.unwrap().len(), 1);
}

async fn last_draw_is_the_most_recent(h: Harness) {
    let alice = user("alice");
    h.add("en-us", "color").await;
    h.complete_next(&alice).await;
    h.advance(Duration::days(1));

    let colour = h.add("en-gb", "colour").await;
    assert_eq!(h.complete_next(&alice).await, colour);

    let last = h.draws.last_draw(&alice).await.unwrap().unwrap();
    assert_eq!(last.word, colour);
    assert!(last.work.is_some());
}

async fn users_draw_independently(h: Harness) {
    let alice = user("alice");
    let bob = user("bob");
    let color = h.add("en-us", "color").await;

    assert_eq!(h.complete_next(&alice).await, color);
    assert_eq!(h.draws.draw_word(&bob, h.window).await.unwrap(), Some(color));
    assert_eq!(h.works.history(&bob, h.window).await.unwrap().len(), 1);
}

async fn empty_pool_draws_nothing(h: Harness) {
    let alice = user("alice");
    assert_eq!(h.draws.draw_word(&alice, h.window).await.unwrap(), None);
    assert!(h.works.history(&alice, h.window).await.unwrap().is_empty());
    assert!(h.words.list_words().await.unwrap().is_empty());
}
