//! Start, countdown, and cancellation through the public oven API.

use std::sync::Arc;
use std::time::Duration;

use megawave_core::{Button, CookOutcome, StartOutcome, TICK};
use megawave_types::{Fold, Readout};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::common::Harness;

#[tokio::test(start_paused = true)]
async fn start_with_nothing_entered() {
    let h = Harness::new();

    let outcome = h.oven.press_start(&CancellationToken::new()).await;

    assert_eq!(outcome, StartOutcome::ZeroTime);
    assert!(outcome.cook_outcome().is_none());
    assert_eq!(h.oven.display(), "00:00");
    assert!(!h.oven.is_cooking());
    assert_eq!(h.logs.count("cannot start with zero time"), 1);
    assert_eq!(h.metrics.cooking_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn all_zero_digits_still_refuse_to_start() {
    let h = Harness::new();
    h.press(&[0, 0, 0, 0]);

    let outcome = h.oven.press_start(&CancellationToken::new()).await;

    assert_eq!(outcome, StartOutcome::ZeroTime);
    assert!(!h.oven.is_cooking());
}

#[tokio::test(start_paused = true)]
async fn one_second_cook_runs_to_completion() {
    let h = Harness::new();
    h.press(&[0, 0, 0, 1]);
    h.take_shown();

    let started = Instant::now();
    let outcome = h.oven.press_start(&CancellationToken::new()).await;

    assert_eq!(outcome, StartOutcome::Cooked(CookOutcome::Completed));
    assert_eq!(started.elapsed(), TICK);
    assert_eq!(h.take_shown(), ["00:01", "00:00"]);
    assert_eq!(h.oven.display(), "00:00");
    assert!(!h.oven.is_cooking());

    let logs = h.logs.contents();
    assert!(logs.contains("start pressed cooking=false"));
    assert!(logs.contains("cooking complete"));
    assert_eq!(h.metrics.cooking_sessions(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_two_second_cook() {
    let h = Harness::new();
    h.press(&[0, 0, 0, 2]);
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let oven = Arc::clone(&h.oven);
        let cancel = cancel.clone();
        async move { oven.press_start(&cancel).await }
    });

    h.wait_until_cooking().await;
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(h.oven.is_cooking());
    assert_eq!(h.oven.display(), "00:01");
    cancel.cancel();

    let outcome = task.await.unwrap();
    assert_eq!(outcome, StartOutcome::Cooked(CookOutcome::Canceled));
    assert!(!h.oven.is_cooking());
    assert_eq!(h.oven.display(), "00:00");
    assert!(h.logs.contents().contains("cooking canceled"));

    // Ready for a new entry.
    h.press(&[4, 2]);
    assert_eq!(h.oven.display(), "00:42");
}

#[tokio::test(start_paused = true)]
async fn cancel_before_start_takes_canceled_path() {
    let h = Harness::new();
    h.press(&[3, 0]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    let outcome = h.oven.press_start(&cancel).await;

    assert_eq!(outcome, StartOutcome::Cooked(CookOutcome::Canceled));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(h.oven.display(), "00:00");
    assert!(!h.oven.is_cooking());
}

#[tokio::test(start_paused = true)]
async fn child_token_cancels_with_parent() {
    let h = Harness::new();
    h.press(&[1, 0]);
    let shutdown = CancellationToken::new();

    let task = tokio::spawn({
        let oven = Arc::clone(&h.oven);
        let cancel = shutdown.child_token();
        async move { oven.press_start(&cancel).await }
    });
    h.wait_until_cooking().await;
    shutdown.cancel();

    assert_eq!(
        task.await.unwrap(),
        StartOutcome::Cooked(CookOutcome::Canceled)
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_starts_run_one_cycle() {
    let h = Harness::new();
    h.press(&[3]);
    let cancel = CancellationToken::new();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let oven = Arc::clone(&h.oven);
            let cancel = cancel.clone();
            tokio::spawn(async move { oven.press_start(&cancel).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap());
    }

    let cooked = outcomes
        .iter()
        .filter(|o| matches!(o, StartOutcome::Cooked(CookOutcome::Completed)))
        .count();
    assert_eq!(cooked, 1, "{outcomes:?}");
    assert_eq!(h.metrics.cooking_sessions(), 1);
    assert_eq!(h.metrics.button_presses(Button::Start, true), 7);
}

#[tokio::test(start_paused = true)]
async fn entry_ignored_while_cooking_is_logged() {
    let h = Harness::new();
    h.press(&[5]);
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let oven = Arc::clone(&h.oven);
        let cancel = cancel.clone();
        async move { oven.press_start(&cancel).await }
    });
    h.wait_until_cooking().await;

    for d in [1, 2, 3, 4, 5, 99] {
        h.oven.press_digit(d);
    }
    assert_eq!(h.oven.display(), "00:05");

    cancel.cancel();
    task.await.unwrap();

    assert_eq!(h.logs.count("digit ignored while cooking"), 5);
    assert_eq!(h.logs.count("invalid digit ignored"), 1);
    assert_eq!(h.metrics.button_presses(Button::Digit, true), 5);
}

#[tokio::test(start_paused = true)]
async fn session_span_wraps_cycle_events() {
    let h = Harness::new();
    h.press(&[1, 3, 5]);

    h.oven.press_start(&CancellationToken::new()).await;

    let logs = h.logs.contents();
    let span = "cooking_session{initial_display=01:35 duration_seconds=95}";
    assert!(logs.contains(&format!("{span}: megawave_core::oven: cooking started")));
    assert!(logs.contains(&format!("{span}: megawave_core::oven: cooking complete")));
    assert_eq!(logs.matches("tick display=").count(), 96);
}

#[test]
fn overflow_fold_boundaries() {
    let (last_exact, fold) = Readout::from_remaining(5999);
    assert_eq!(last_exact.to_string(), "99:59");
    assert_eq!(fold, Fold::Exact);

    assert_eq!(Readout::from_remaining(6039).0.to_string(), "99:99");

    let (first, fold) = Readout::from_remaining(6000);
    assert_eq!(first.to_string(), "99:60");
    assert_eq!(fold, Fold::Folded);

    let (first, fold) = Readout::from_remaining(12_000);
    assert_eq!(first, Readout::SATURATED);
    assert_eq!(
        fold,
        Fold::Saturated {
            overflow_minutes: 101
        }
    );
}

#[tokio::test(start_paused = true)]
async fn aborted_cook_task_leaves_oven_usable() {
    let h = Harness::new();
    h.press(&[0, 0, 0, 5]);

    let task = tokio::spawn({
        let oven = Arc::clone(&h.oven);
        async move { oven.press_start(&CancellationToken::new()).await }
    });
    h.wait_until_cooking().await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.oven.display(), "00:04");

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert!(!h.oven.is_cooking());
    assert_eq!(h.oven.display(), "00:00");

    h.press(&[7]);
    assert_eq!(h.oven.display(), "00:07");
    let outcome = h.oven.press_start(&CancellationToken::new()).await;
    assert_eq!(outcome, StartOutcome::Cooked(CookOutcome::Completed));
}
