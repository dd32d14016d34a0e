use std::collections::HashMap;

use crate::domain::{
    Achievement, AchievementKind, Challenge, ChallengeDefinition, ChallengeId, PlayerStats,
    UserChallengeProgress,
};

/// Reward for each unlocked positive achievement, in both XP and coins.
pub const ACHIEVEMENT_XP: i32 = 50;
pub const EXP_PER_LEVEL: i32 = 100;
/// Title fragment that marked the streak tracker before the `streak` kind.
pub const LEGACY_STREAK_MARKER: &str = "Streak";

fn earned(a: &Achievement) -> bool {
    a.unlocked && !a.is_negative
}

fn setback(a: &Achievement) -> bool {
    a.unlocked && a.is_negative
}

/// Sum of penalties over unlocked setbacks. Never negative.
pub fn calculate_penalty_points(achievements: &[Achievement]) -> i32 {
    let total: i64 = achievements
        .iter()
        .filter(|a| setback(a))
        .map(|a| i64::from(a.penalty_points.unwrap_or(0).max(0)))
        .sum();
    saturate(total)
}

/// Progress of the positive achievement tagged as the streak tracker, or 0.
///
/// Catalogs that predate the `streak` kind marked the tracker by a title
/// containing "Streak"; that match is used only when no tagged one exists.
pub fn get_current_streak(achievements: &[Achievement]) -> i32 {
    let positive = || achievements.iter().filter(|a| !a.is_negative);
    positive()
        .find(|a| a.kind == AchievementKind::Streak)
        .or_else(|| positive().find(|a| a.title.contains(LEGACY_STREAK_MARKER)))
        .map(|a| a.progress)
        .unwrap_or(0)
}

/// Experience track. Completed challenges are priced from the catalog; ids
/// missing from the catalog are worth nothing. Experience floors at zero.
pub fn calculate_player_stats(
    achievements: &[Achievement],
    user_challenges: &[UserChallengeProgress],
    challenge_catalog: &[ChallengeDefinition],
    penalty_points: i32,
) -> PlayerStats {
    let points: HashMap<&ChallengeId, i32> = challenge_catalog
        .iter()
        .map(|c| (&c.id, c.points))
        .collect();
    let challenge_xp: i64 = user_challenges
        .iter()
        .filter(|uc| uc.completed)
        .map(|uc| i64::from(points.get(&uc.challenge_id).copied().unwrap_or(0)))
        .sum();

    let total = achievement_reward(achievements) + challenge_xp - i64::from(penalty_points);
    let experience = saturate(total.max(0));
    let level = 1 + experience / EXP_PER_LEVEL;
    PlayerStats {
        experience,
        level,
        next_level_exp: saturate(i64::from(level) * i64::from(EXP_PER_LEVEL)),
    }
}

/// Currency track. Shares the per-achievement reward with experience today
/// but is computed independently of [`calculate_player_stats`].
pub fn calculate_poop_coins(
    achievements: &[Achievement],
    completed_challenges: &[Challenge],
) -> i32 {
    let from_challenges: i64 = completed_challenges
        .iter()
        .filter(|c| c.completed)
        .map(|c| i64::from(c.points))
        .sum();
    saturate(achievement_reward(achievements) + from_challenges)
}

/// One badge per unlocked setback, regardless of its penalty.
pub fn calculate_stink_badges(achievements: &[Achievement]) -> i32 {
    saturate(achievements.iter().filter(|a| setback(a)).count() as i64)
}

fn achievement_reward(achievements: &[Achievement]) -> i64 {
    achievements.iter().filter(|a| earned(a)).count() as i64 * i64::from(ACHIEVEMENT_XP)
}

// Totals are accumulated in i64 and pinned to the i32 range on the way out.
fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
