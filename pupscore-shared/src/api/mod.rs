use serde::{Deserialize, Serialize};

use crate::gamification::AchievementNotification;

pub mod endpoints;

pub const API_V1_PREFIX: &str = "/api/v1";

/// Route prefix for everything scoped to one user.
pub fn user_scope(user_id: &str) -> String {
    format!("{}/users/{}", API_V1_PREFIX, user_id)
}

// Stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatsDto {
    pub user_id: String,
    pub experience: i32,
    pub level: i32,
    pub next_level_exp: i32,
    pub penalty_points: i32,
    pub current_streak: i32,
    pub poop_coins: i32,
    pub stink_badges: i32,
}

// Progress
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressReq {
    pub progress: i32,
}

// Notifications
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationCheckResp {
    /// Whether any unlock fell inside the freshness window.
    pub has_new: bool,
    /// Alerts that survived the cooldown.
    pub notifications: Vec<AchievementNotification>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeFilter {
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionInfoDto {
    pub version: String,
}
