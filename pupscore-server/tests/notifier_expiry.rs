use std::time::Duration;

use pupscore_server::server::notify::TokioExpiryScheduler;
use pupscore_server::server::{AppConfig, AppState};
use pupscore_server::storage::Store;
use pupscore_shared::domain::{Achievement, AchievementKind, now_utc};
use pupscore_shared::gamification::{AchievementNotification, AchievementNotifier, ManualClock};
use time::OffsetDateTime;
use time::macros::datetime;
use tokio_util::sync::CancellationToken;

const T0: OffsetDateTime = datetime!(2026-05-10 09:30 UTC);

fn fresh(id: &str) -> Achievement {
    unlocked_at(id, T0 - Duration::from_secs(1))
}

fn unlocked_at(id: &str, at: OffsetDateTime) -> Achievement {
    Achievement {
        id: id.into(),
        title: id.into(),
        description: String::new(),
        icon: String::new(),
        is_negative: false,
        penalty_points: None,
        max_progress: None,
        kind: AchievementKind::Standard,
        progress: 1,
        unlocked: true,
        unlocked_at: Some(at),
    }
}

// Freshness is judged by the frozen clock; only the cooldown runs on tokio time.
fn notifier(token: &CancellationToken) -> AchievementNotifier<ManualClock, TokioExpiryScheduler> {
    AchievementNotifier::new(
        ManualClock::new(T0),
        TokioExpiryScheduler::new(token.child_token()),
    )
}

#[tokio::test(start_paused = true)]
async fn cooldown_expires_on_tokio_timer() {
    let token = CancellationToken::new();
    let n = notifier(&token);
    let items = vec![fresh("first-scoop")];

    let mut out: Vec<AchievementNotification> = Vec::new();
    assert!(n.notify_new_achievements(&items, &mut out));
    assert_eq!(out.len(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(n.is_cooling_down(&"first-scoop".into()));
    assert!(n.notify_new_achievements(&items, &mut out));
    assert_eq!(out.len(), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(!n.is_cooling_down(&"first-scoop".into()));
    assert!(n.notify_new_achievements(&items, &mut out));
    assert_eq!(out.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_keeps_pending_ids_suppressed() {
    let token = CancellationToken::new();
    let n = notifier(&token);
    let items = vec![fresh("first-scoop")];

    let mut out: Vec<AchievementNotification> = Vec::new();
    n.notify_new_achievements(&items, &mut out);
    n.shutdown();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(n.is_cooling_down(&"first-scoop".into()));
    assert!(n.notify_new_achievements(&items, &mut out));
    assert_eq!(out.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn parent_token_cancels_timers() {
    let token = CancellationToken::new();
    let n = notifier(&token);
    let items = vec![fresh("first-scoop")];

    let mut out: Vec<AchievementNotification> = Vec::new();
    n.notify_new_achievements(&items, &mut out);
    token.cancel();

    tokio::time::sleep(Duration::from_secs(90)).await;
    assert!(n.is_cooling_down(&"first-scoop".into()));
}

#[tokio::test]
async fn idle_users_are_not_kept_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let store = Store::connect_sqlite(db_path.to_str().unwrap()).await.unwrap();
    let state = AppState::new(AppConfig::from_yaml("{}").unwrap(), store);
    tokio::time::pause();

    let items = vec![unlocked_at("first-scoop", now_utc())];
    for user in ["rex", "bella"] {
        let (has_new, out) = state.check_notifications(user, &items).await;
        assert!(has_new);
        assert_eq!(out.len(), 1);
    }
    assert_eq!(state.tracked_notifiers().await, 2);

    for n in 0..50 {
        let (has_new, _) = state.check_notifications(&format!("stranger-{n}"), &[]).await;
        assert!(!has_new);
    }
    assert_eq!(state.tracked_notifiers().await, 2);

    // Entries with a pending cooldown survive pruning and keep suppressing.
    let (has_new, out) = state.check_notifications("rex", &items).await;
    assert!(has_new);
    assert!(out.is_empty());

    tokio::time::sleep(Duration::from_secs(61)).await;
    let (has_new, out) = state.check_notifications("stranger", &[]).await;
    assert!(!has_new);
    assert!(out.is_empty());
    assert_eq!(state.tracked_notifiers().await, 0);
}
