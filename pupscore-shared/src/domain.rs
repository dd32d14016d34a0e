use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl FromStr for UserId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UserId(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementId(pub String);

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AchievementId {
    fn from(value: &str) -> Self {
        AchievementId(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(pub String);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ChallengeId {
    fn from(value: &str) -> Self {
        ChallengeId(value.to_string())
    }
}

/// Open-ended achievement tag. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AchievementKind {
    #[default]
    Standard,
    Daily,
    /// Designates the achievement whose progress is the current streak.
    Streak,
    Other(String),
}

impl AchievementKind {
    pub fn as_str(&self) -> &str {
        match self {
            AchievementKind::Standard => "standard",
            AchievementKind::Daily => "daily",
            AchievementKind::Streak => "streak",
            AchievementKind::Other(s) => s,
        }
    }
}

impl From<String> for AchievementKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "standard" => AchievementKind::Standard,
            "daily" => AchievementKind::Daily,
            "streak" => AchievementKind::Streak,
            _ => AchievementKind::Other(value),
        }
    }
}

impl From<&str> for AchievementKind {
    fn from(value: &str) -> Self {
        AchievementKind::from(value.to_string())
    }
}

impl From<AchievementKind> for String {
    fn from(value: AchievementKind) -> Self {
        match value {
            AchievementKind::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for AchievementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown challenge type: {0}")]
pub struct UnknownChallengeType(pub String);

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Daily => "daily",
            ChallengeType::Weekly => "weekly",
            ChallengeType::Monthly => "monthly",
        }
    }
}

impl FromStr for ChallengeType {
    type Err = UnknownChallengeType;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ChallengeType::Daily),
            "weekly" => Ok(ChallengeType::Weekly),
            "monthly" => Ok(ChallengeType::Monthly),
            other => Err(UnknownChallengeType(other.to_string())),
        }
    }
}

/// Catalog entry for an achievement. Seeded once, never mutated per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Setback achievements subtract `penalty_points` instead of granting XP.
    #[serde(default)]
    pub is_negative: bool,
    #[serde(default)]
    pub penalty_points: Option<i32>,
    #[serde(default)]
    pub max_progress: Option<i32>,
    #[serde(default)]
    pub trigger_value: Option<i32>,
    #[serde(default, rename = "achievement_type")]
    pub kind: AchievementKind,
}

impl AchievementDefinition {
    /// Progress needed to unlock: explicit `max_progress`, else `trigger_value`.
    /// `None` means the achievement is a plain on/off unlock.
    pub fn target(&self) -> Option<i32> {
        self.max_progress.or(self.trigger_value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievementProgress {
    pub achievement_id: AchievementId,
    pub progress: i32,
    pub unlocked: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub unlocked_at: Option<OffsetDateTime>,
}

/// Catalog definition joined with one user's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub is_negative: bool,
    pub penalty_points: Option<i32>,
    pub max_progress: Option<i32>,
    #[serde(rename = "achievement_type")]
    pub kind: AchievementKind,
    pub progress: i32,
    pub unlocked: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub unlocked_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDefinition {
    pub id: ChallengeId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub points: i32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub challenge_type: ChallengeType,
    #[serde(default)]
    pub condition_value: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserChallengeProgress {
    pub challenge_id: ChallengeId,
    pub progress: i32,
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub points: i32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    pub challenge_type: ChallengeType,
    pub max_progress: Option<i32>,
    pub progress: i32,
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl Challenge {
    /// Whether `now` falls inside the optional start/end window (inclusive).
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        let started = self.start_date.is_none_or(|s| s <= now);
        let not_ended = self.end_date.is_none_or(|e| now <= e);
        started && not_ended
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub experience: i32,
    pub level: i32,
    pub next_level_exp: i32,
}

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(UtcOffset::UTC)
}
