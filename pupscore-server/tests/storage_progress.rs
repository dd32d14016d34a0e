use pupscore_server::server::{AppConfig, MAX_NOTIFY_SECS};
use pupscore_server::storage::{StorageError, Store};
use pupscore_server::profile;
use pupscore_shared::domain::{
    AchievementDefinition, AchievementKind, ChallengeDefinition, ChallengeType,
};

fn achievement(id: &str, title: &str, target: Option<i32>) -> AchievementDefinition {
    AchievementDefinition {
        id: id.into(),
        title: title.into(),
        description: String::new(),
        icon: String::new(),
        is_negative: false,
        penalty_points: None,
        max_progress: target,
        trigger_value: None,
        kind: AchievementKind::Standard,
    }
}

fn challenge(id: &str, points: i32, target: Option<i32>) -> ChallengeDefinition {
    ChallengeDefinition {
        id: id.into(),
        title: id.into(),
        description: String::new(),
        icon: String::new(),
        points,
        start_date: None,
        end_date: None,
        challenge_type: ChallengeType::Weekly,
        condition_value: target,
    }
}

async fn store_with(
    achievements: &[AchievementDefinition],
    challenges: &[ChallengeDefinition],
) -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let store = Store::connect_sqlite(path.to_str().unwrap()).await.unwrap();
    store.seed_catalog(achievements, challenges).await.unwrap();
    (store, dir)
}

#[tokio::test]
async fn catalog_keeps_seed_order_and_reseeds_in_place() {
    let defs = vec![
        achievement("zeta", "Zeta", None),
        achievement("alpha", "Alpha", Some(2)),
    ];
    let (store, _dir) = store_with(&defs, &[]).await;
    let listed = store.list_achievement_catalog().await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|d| d.id.0.as_str()).collect();
    assert_eq!(ids, ["zeta", "alpha"]);

    let mut changed = defs.clone();
    changed[1].max_progress = None;
    changed[1].trigger_value = Some(5);
    store.seed_catalog(&changed, &[]).await.unwrap();
    let listed = store.list_achievement_catalog().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].max_progress, None);
    assert_eq!(listed[1].target(), Some(5));
}

#[tokio::test]
async fn legacy_streak_title_is_promoted_on_seed() {
    let defs = vec![
        achievement("streak", "7 Day Streak", Some(7)),
        AchievementDefinition {
            is_negative: true,
            ..achievement("lost", "Lost Streak", None)
        },
        AchievementDefinition {
            kind: AchievementKind::Daily,
            ..achievement("weekly", "Weekly Streak", Some(4))
        },
        achievement("plain", "First Scoop", None),
    ];
    let (store, _dir) = store_with(&defs, &[]).await;
    let listed = store.list_achievement_catalog().await.unwrap();
    assert_eq!(listed[0].kind, AchievementKind::Streak);
    assert_eq!(listed[1].kind, AchievementKind::Standard);
    assert_eq!(listed[2].kind, AchievementKind::Streak);
    assert_eq!(listed[3].kind, AchievementKind::Standard);

    store
        .record_achievement_progress("rex", "streak", 4)
        .await
        .unwrap();
    let profile = profile::load_profile(&store, "rex").await.unwrap();
    assert_eq!(profile.current_streak, 4);
}

#[tokio::test]
async fn unlock_timestamp_is_written_once() {
    let (store, _dir) = store_with(&[achievement("ten", "Ten Logs", Some(3))], &[]).await;

    let first = store.record_achievement_progress("rex", "ten", 1).await.unwrap();
    assert!(!first.unlocked);
    assert_eq!(first.unlocked_at, None);

    let unlocked = store.record_achievement_progress("rex", "ten", 3).await.unwrap();
    assert!(unlocked.unlocked);
    let at = unlocked.unlocked_at.expect("unlocked_at set on unlock");

    let later = store.record_achievement_progress("rex", "ten", 5).await.unwrap();
    assert_eq!(later.progress, 5);
    assert!(later.unlocked);
    assert_eq!(later.unlocked_at, Some(at));

    let rows = store.list_user_achievement_progress("rex").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].unlocked_at, Some(at));
}

#[tokio::test]
async fn progress_never_decreases() {
    let (store, _dir) = store_with(&[achievement("ten", "Ten Logs", Some(10))], &[]).await;
    store.record_achievement_progress("rex", "ten", 6).await.unwrap();
    let row = store.record_achievement_progress("rex", "ten", 2).await.unwrap();
    assert_eq!(row.progress, 6);
    assert!(!row.unlocked);
}

#[tokio::test]
async fn binary_achievement_unlocks_on_any_progress() {
    let (store, _dir) = store_with(&[achievement("first", "First Log", None)], &[]).await;
    let zero = store.record_achievement_progress("rex", "first", 0).await.unwrap();
    assert!(!zero.unlocked);
    let one = store.record_achievement_progress("rex", "first", 1).await.unwrap();
    assert!(one.unlocked);
}

#[tokio::test]
async fn progress_is_isolated_per_user() {
    let (store, _dir) = store_with(&[achievement("first", "First Log", None)], &[]).await;
    store.record_achievement_progress("rex", "first", 1).await.unwrap();
    assert!(
        store
            .list_user_achievement_progress("bella")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn invalid_progress_is_rejected() {
    let (store, _dir) = store_with(
        &[achievement("first", "First Log", None)],
        &[challenge("walk", 10, Some(2))],
    )
    .await;

    assert!(matches!(
        store.record_achievement_progress("rex", "nope", 1).await,
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        store.record_achievement_progress("rex", "first", -1).await,
        Err(StorageError::InvalidInput(_))
    ));
    assert!(matches!(
        store.record_challenge_progress("rex", "nope", 1).await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn completed_challenges_feed_profile_totals() {
    let defs = vec![
        achievement("first", "First Log", None),
        AchievementDefinition {
            is_negative: true,
            penalty_points: Some(20),
            ..achievement("runny", "Runny Day", None)
        },
    ];
    let challenges = vec![challenge("walk", 30, Some(2)), challenge("water", 75, Some(7))];
    let (store, _dir) = store_with(&defs, &challenges).await;

    store.record_achievement_progress("rex", "first", 1).await.unwrap();
    store.record_achievement_progress("rex", "runny", 1).await.unwrap();
    let walk = store.record_challenge_progress("rex", "walk", 2).await.unwrap();
    assert!(walk.completed);
    assert!(walk.completed_at.is_some());
    let water = store.record_challenge_progress("rex", "water", 3).await.unwrap();
    assert!(!water.completed);

    let profile = profile::load_profile(&store, "rex").await.unwrap();
    assert_eq!(profile.penalty_points, 20);
    assert_eq!(profile.stats.experience, 50 + 30 - 20);
    assert_eq!(profile.stats.level, 1);
    assert_eq!(profile.poop_coins, 80);
    assert_eq!(profile.stink_badges, 1);
    assert_eq!(profile.challenges.len(), 2);
}

#[test]
fn example_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.yaml");
    let cfg = AppConfig::load_from_path(path).unwrap();
    assert_eq!(cfg.listen_port, Some(5252));
    assert_eq!(cfg.notifications.cooldown_secs, 60);
    assert!(
        cfg.achievements
            .iter()
            .any(|a| a.kind == AchievementKind::Streak)
    );
    assert!(cfg.challenges.iter().any(|c| c.end_date.is_some()));
}

#[test]
fn duplicate_catalog_ids_are_rejected() {
    let yaml = r#"
achievements:
  - id: a
    title: A
  - id: a
    title: Again
"#;
    assert!(AppConfig::from_yaml(yaml).is_err());
}

#[test]
fn oversized_notifier_durations_are_rejected() {
    let yaml = format!("notifications:\n  window_secs: {}\n", MAX_NOTIFY_SECS + 1);
    let err = AppConfig::from_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("window_secs"), "{err}");

    let err = AppConfig::from_yaml("notifications:\n  cooldown_secs: 18446744073709551615\n")
        .unwrap_err();
    assert!(err.to_string().contains("cooldown_secs"), "{err}");

    let yaml = format!("notifications:\n  cooldown_secs: {MAX_NOTIFY_SECS}\n");
    let cfg = AppConfig::from_yaml(&yaml).unwrap();
    assert_eq!(cfg.notifications.cooldown_secs, MAX_NOTIFY_SECS);
    assert_eq!(cfg.notifications.window_secs, 10);
}
