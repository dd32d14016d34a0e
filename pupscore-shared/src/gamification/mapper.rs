use std::collections::HashMap;

use crate::domain::{
    Achievement, AchievementDefinition, AchievementId, Challenge, ChallengeDefinition,
    ChallengeId, UserAchievementProgress, UserChallengeProgress,
};

/// Left-joins the catalog with one user's progress rows.
///
/// Output follows catalog order. A catalog entry without a progress row maps
/// to `progress = 0`, locked. Progress rows for unknown ids are dropped.
pub fn map_achievements(
    catalog: &[AchievementDefinition],
    progress: &[UserAchievementProgress],
) -> Vec<Achievement> {
    let mut by_id: HashMap<&AchievementId, &UserAchievementProgress> = HashMap::new();
    for row in progress {
        by_id.entry(&row.achievement_id).or_insert(row);
    }

    catalog
        .iter()
        .map(|def| {
            let row = by_id.get(&def.id);
            Achievement {
                id: def.id.clone(),
                title: def.title.clone(),
                description: def.description.clone(),
                icon: def.icon.clone(),
                is_negative: def.is_negative,
                penalty_points: def.penalty_points,
                max_progress: def.target(),
                kind: def.kind.clone(),
                progress: row.map(|r| r.progress).unwrap_or(0),
                unlocked: row.map(|r| r.unlocked).unwrap_or(false),
                unlocked_at: row.and_then(|r| r.unlocked_at),
            }
        })
        .collect()
}

/// Same join as [`map_achievements`], keyed on the challenge id.
pub fn map_challenges(
    catalog: &[ChallengeDefinition],
    progress: &[UserChallengeProgress],
) -> Vec<Challenge> {
    let mut by_id: HashMap<&ChallengeId, &UserChallengeProgress> = HashMap::new();
    for row in progress {
        by_id.entry(&row.challenge_id).or_insert(row);
    }

    catalog
        .iter()
        .map(|def| {
            let row = by_id.get(&def.id);
            Challenge {
                id: def.id.clone(),
                title: def.title.clone(),
                description: def.description.clone(),
                icon: def.icon.clone(),
                points: def.points,
                start_date: def.start_date,
                end_date: def.end_date,
                challenge_type: def.challenge_type,
                max_progress: def.condition_value,
                progress: row.map(|r| r.progress).unwrap_or(0),
                completed: row.map(|r| r.completed).unwrap_or(false),
                completed_at: row.and_then(|r| r.completed_at),
            }
        })
        .collect()
}
