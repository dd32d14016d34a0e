use std::time::Duration;

use pupscore_shared::domain::{Achievement, AchievementKind};
use pupscore_shared::gamification::{
    AchievementNotification, AchievementNotifier, Clock, ManualClock, NotifierSettings, Polarity,
};
use time::OffsetDateTime;
use time::macros::datetime;

const T0: OffsetDateTime = datetime!(2026-05-10 09:30 UTC);

fn unlocked(id: &str, is_negative: bool, at: OffsetDateTime) -> Achievement {
    Achievement {
        id: id.into(),
        title: format!("{id} title"),
        description: format!("{id} description"),
        icon: String::new(),
        is_negative,
        penalty_points: is_negative.then_some(10),
        max_progress: Some(1),
        kind: AchievementKind::Standard,
        progress: 1,
        unlocked: true,
        unlocked_at: Some(at),
    }
}

fn notifier(clock: &ManualClock) -> AchievementNotifier<ManualClock, ManualClock> {
    AchievementNotifier::new(clock.clone(), clock.clone())
}

#[test]
fn nothing_fresh_means_no_notification() {
    let clock = ManualClock::new(T0);
    let n = notifier(&clock);
    let mut locked = unlocked("a", false, T0);
    locked.unlocked = false;
    let stale = unlocked("b", false, T0 - Duration::from_secs(11));

    let mut out: Vec<AchievementNotification> = Vec::new();
    assert!(!n.notify_new_achievements(&[locked, stale], &mut out));
    assert!(out.is_empty());
    assert_eq!(clock.pending(), 0);
}

#[test]
fn cooldown_suppresses_until_expiry() {
    let clock = ManualClock::new(T0);
    let n = notifier(&clock);
    let list = vec![unlocked("first-log", false, T0)];

    let mut out = Vec::new();
    assert!(n.notify_new_achievements(&list, &mut out));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].headline, "Achievement Unlocked!");
    assert_eq!(out[0].achievement_id.0, "first-log");

    clock.advance(Duration::from_secs(5));
    let mut again = Vec::new();
    assert!(n.notify_new_achievements(&list, &mut again));
    assert!(again.is_empty(), "second call within cooldown must not notify");
    assert!(n.is_cooling_down(&"first-log".into()));

    clock.advance(Duration::from_secs(56));
    assert!(!n.is_cooling_down(&"first-log".into()));
    let refreshed = vec![unlocked("first-log", false, clock.now())];
    let mut third = Vec::new();
    assert!(n.notify_new_achievements(&refreshed, &mut third));
    assert_eq!(third.len(), 1);
}

#[test]
fn cooldown_is_fixed_from_first_announcement() {
    let clock = ManualClock::new(T0);
    let n = notifier(&clock);

    let mut out = Vec::new();
    n.notify_new_achievements(&[unlocked("a", false, T0)], &mut out);
    clock.advance(Duration::from_secs(50));
    // A suppressed hit does not push the expiry out.
    n.notify_new_achievements(&[unlocked("a", false, clock.now())], &mut out);
    clock.advance(Duration::from_secs(10));
    assert!(!n.is_cooling_down(&"a".into()));
    assert_eq!(out.len(), 1);
}

#[test]
fn bulk_unlocks_are_consolidated_per_polarity() {
    let clock = ManualClock::new(T0);
    let n = notifier(&clock);
    let list = vec![
        unlocked("early-bird", false, T0 - Duration::from_secs(3)),
        unlocked("hydrated", false, T0 - Duration::from_secs(1)),
        unlocked("mushy", true, T0 - Duration::from_secs(120)),
    ];

    let mut out = Vec::new();
    assert!(n.notify_new_achievements(&list, &mut out));
    assert_eq!(out.len(), 1);
    let alert = &out[0];
    assert_eq!(alert.polarity, Polarity::Positive);
    assert_eq!(alert.count, 2);
    assert_eq!(alert.headline, "2 Achievements Unlocked");
    assert_eq!(alert.title, "early-bird title");
    assert_eq!(alert.description, "early-bird description");
    // Only the example achievement enters the cooldown.
    assert!(n.is_cooling_down(&"early-bird".into()));
    assert!(!n.is_cooling_down(&"hydrated".into()));
}

#[test]
fn positive_and_negative_are_announced_separately() {
    let clock = ManualClock::new(T0);
    let n = notifier(&clock);
    let list = vec![
        unlocked("bad-1", true, T0),
        unlocked("good", false, T0),
        unlocked("bad-2", true, T0),
    ];

    let mut out = Vec::new();
    assert!(n.notify_new_achievements(&list, &mut out));
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].polarity, Polarity::Positive);
    assert_eq!(out[0].headline, "Achievement Unlocked!");
    assert_eq!(out[1].polarity, Polarity::Negative);
    assert_eq!(out[1].headline, "2 Setbacks Unlocked");
    assert_eq!(out[1].achievement_id.0, "bad-1");
    assert_eq!(clock.pending(), 2);
}

#[test]
fn suppressed_first_candidate_skips_whole_group() {
    let clock = ManualClock::new(T0);
    let n = notifier(&clock);

    let mut out = Vec::new();
    n.notify_new_achievements(&[unlocked("a", false, T0)], &mut out);
    out.clear();

    let list = vec![unlocked("a", false, T0), unlocked("b", false, T0)];
    assert!(n.notify_new_achievements(&list, &mut out));
    assert!(out.is_empty());
}

#[test]
fn shutdown_drops_pending_expiries() {
    let clock = ManualClock::new(T0);
    let n = notifier(&clock);
    let mut out = Vec::new();
    n.notify_new_achievements(&[unlocked("a", false, T0)], &mut out);
    assert_eq!(clock.pending(), 1);

    n.shutdown();
    assert_eq!(clock.pending(), 0);
    clock.advance(Duration::from_secs(120));
    assert!(n.is_cooling_down(&"a".into()));
}

#[test]
fn custom_window_and_cooldown() {
    let clock = ManualClock::new(T0);
    let n = AchievementNotifier::with_settings(
        clock.clone(),
        clock.clone(),
        NotifierSettings {
            window_secs: 300,
            cooldown_secs: 5,
        },
    );
    let list = vec![unlocked("a", false, T0 - Duration::from_secs(120))];

    let mut out = Vec::new();
    assert!(n.notify_new_achievements(&list, &mut out));
    clock.advance(Duration::from_secs(5));
    assert!(n.notify_new_achievements(&list, &mut out));
    assert_eq!(out.len(), 2);
}
