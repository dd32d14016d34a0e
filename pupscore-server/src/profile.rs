//! Fetches one user's rows and runs them through the gamification core.

use pupscore_shared::api::PlayerStatsDto;
use pupscore_shared::domain::{
    Achievement, Challenge, ChallengeDefinition, PlayerStats, UserChallengeProgress,
};
use pupscore_shared::gamification::{
    calculate_penalty_points, calculate_player_stats, calculate_poop_coins,
    calculate_stink_badges, get_current_streak, map_achievements, map_challenges,
};
use serde::Serialize;

use crate::storage::{StorageError, Store};

/// Everything the UI shows about a user's progression, computed from one
/// consistent fetch.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerProfile {
    pub user_id: String,
    pub achievements: Vec<Achievement>,
    pub challenges: Vec<Challenge>,
    pub stats: PlayerStats,
    pub penalty_points: i32,
    pub current_streak: i32,
    pub poop_coins: i32,
    pub stink_badges: i32,
}

impl PlayerProfile {
    pub fn build(
        user_id: &str,
        achievements: Vec<Achievement>,
        challenge_catalog: &[ChallengeDefinition],
        challenge_progress: &[UserChallengeProgress],
    ) -> Self {
        let challenges = map_challenges(challenge_catalog, challenge_progress);
        let completed: Vec<Challenge> = challenges
            .iter()
            .filter(|c| c.completed)
            .cloned()
            .collect();

        let penalty_points = calculate_penalty_points(&achievements);
        let stats = calculate_player_stats(
            &achievements,
            challenge_progress,
            challenge_catalog,
            penalty_points,
        );
        Self {
            user_id: user_id.to_string(),
            current_streak: get_current_streak(&achievements),
            poop_coins: calculate_poop_coins(&achievements, &completed),
            stink_badges: calculate_stink_badges(&achievements),
            penalty_points,
            stats,
            achievements,
            challenges,
        }
    }

    pub fn stats_dto(&self) -> PlayerStatsDto {
        PlayerStatsDto {
            user_id: self.user_id.clone(),
            experience: self.stats.experience,
            level: self.stats.level,
            next_level_exp: self.stats.next_level_exp,
            penalty_points: self.penalty_points,
            current_streak: self.current_streak,
            poop_coins: self.poop_coins,
            stink_badges: self.stink_badges,
        }
    }
}

pub async fn load_achievements(
    store: &Store,
    user_id: &str,
) -> Result<Vec<Achievement>, StorageError> {
    let (catalog, progress) = futures::try_join!(
        store.list_achievement_catalog(),
        store.list_user_achievement_progress(user_id),
    )?;
    Ok(map_achievements(&catalog, &progress))
}

pub async fn load_challenges(
    store: &Store,
    user_id: &str,
) -> Result<Vec<Challenge>, StorageError> {
    let (catalog, progress) = futures::try_join!(
        store.list_challenge_catalog(),
        store.list_user_challenge_progress(user_id),
    )?;
    Ok(map_challenges(&catalog, &progress))
}

/// Any fetch failure aborts the whole profile; partial data never reaches the
/// calculators.
pub async fn load_profile(store: &Store, user_id: &str) -> Result<PlayerProfile, StorageError> {
    let (achievements, challenge_catalog, challenge_progress) = futures::try_join!(
        load_achievements(store, user_id),
        store.list_challenge_catalog(),
        store.list_user_challenge_progress(user_id),
    )?;
    Ok(PlayerProfile::build(
        user_id,
        achievements,
        &challenge_catalog,
        &challenge_progress,
    ))
}
