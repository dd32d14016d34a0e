use crate::storage::schema::{achievements, challenges, user_achievements, user_challenges};
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = achievements)]
pub struct AchievementRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub is_negative: bool,
    pub penalty_points: Option<i32>,
    pub max_progress: Option<i32>,
    pub trigger_value: Option<i32>,
    pub achievement_type: String,
    pub position: i32,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = achievements)]
#[diesel(treat_none_as_null = true)]
pub struct NewAchievement<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub icon: &'a str,
    pub is_negative: bool,
    pub penalty_points: Option<i32>,
    pub max_progress: Option<i32>,
    pub trigger_value: Option<i32>,
    pub achievement_type: &'a str,
    pub position: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = user_achievements)]
#[diesel(primary_key(user_id, achievement_id))]
#[diesel(belongs_to(AchievementRow, foreign_key = achievement_id))]
pub struct UserAchievementRow {
    pub user_id: String,
    pub achievement_id: String,
    pub progress: i32,
    pub unlocked: bool,
    pub unlocked_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = user_achievements)]
pub struct NewUserAchievement<'a> {
    pub user_id: &'a str,
    pub achievement_id: &'a str,
    pub progress: i32,
    pub unlocked: bool,
    pub unlocked_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = challenges)]
pub struct ChallengeRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub points: i32,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub challenge_type: String,
    pub condition_value: Option<i32>,
    pub position: i32,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = challenges)]
#[diesel(treat_none_as_null = true)]
pub struct NewChallenge<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub icon: &'a str,
    pub points: i32,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub challenge_type: &'a str,
    pub condition_value: Option<i32>,
    pub position: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = user_challenges)]
#[diesel(primary_key(user_id, challenge_id))]
#[diesel(belongs_to(ChallengeRow, foreign_key = challenge_id))]
pub struct UserChallengeRow {
    pub user_id: String,
    pub challenge_id: String,
    pub progress: i32,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = user_challenges)]
pub struct NewUserChallenge<'a> {
    pub user_id: &'a str,
    pub challenge_id: &'a str,
    pub progress: i32,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}
