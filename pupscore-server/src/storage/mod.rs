pub mod models;
pub mod schema;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{
    AchievementRow, ChallengeRow, NewAchievement, NewChallenge, NewUserAchievement,
    NewUserChallenge, UserAchievementRow, UserChallengeRow,
};
use pupscore_shared::domain::{
    AchievementDefinition, AchievementKind, ChallengeDefinition, ChallengeType,
    UserAchievementProgress, UserChallengeProgress,
};
use pupscore_shared::gamification::LEGACY_STREAK_MARKER;
use time::OffsetDateTime;
use tracing::{trace, warn};

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced catalog entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    /// Upserts both catalogs. Position follows the order given, which is the
    /// order every listing returns.
    pub async fn seed_catalog(
        &self,
        cfg_achievements: &[AchievementDefinition],
        cfg_challenges: &[ChallengeDefinition],
    ) -> Result<(), StorageError> {
        use schema::{achievements, challenges};

        let pool = self.pool.clone();
        let achievements_owned = cfg_achievements.to_owned();
        let challenges_owned = cfg_challenges.to_owned();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;

            conn.immediate_transaction(|conn| -> Result<(), StorageError> {
                for (pos, a) in achievements_owned.iter().enumerate() {
                    let kind = catalog_kind(a);
                    let row = NewAchievement {
                        id: &a.id.0,
                        title: &a.title,
                        description: &a.description,
                        icon: &a.icon,
                        is_negative: a.is_negative,
                        penalty_points: a.penalty_points,
                        max_progress: a.max_progress,
                        trigger_value: a.trigger_value,
                        achievement_type: kind.as_str(),
                        position: pos as i32,
                    };
                    diesel::insert_into(achievements::table)
                        .values(&row)
                        .on_conflict(achievements::id)
                        .do_update()
                        .set(&row)
                        .execute(conn)?;
                }

                for (pos, c) in challenges_owned.iter().enumerate() {
                    let row = NewChallenge {
                        id: &c.id.0,
                        title: &c.title,
                        description: &c.description,
                        icon: &c.icon,
                        points: c.points,
                        start_date: c.start_date.and_then(to_naive),
                        end_date: c.end_date.and_then(to_naive),
                        challenge_type: c.challenge_type.as_str(),
                        condition_value: c.condition_value,
                        position: pos as i32,
                    };
                    diesel::insert_into(challenges::table)
                        .values(&row)
                        .on_conflict(challenges::id)
                        .do_update()
                        .set(&row)
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await?
    }

    pub async fn list_achievement_catalog(
        &self,
    ) -> Result<Vec<AchievementDefinition>, StorageError> {
        use schema::achievements::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<AchievementDefinition>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let rows = achievements
                .order((position.asc(), id.asc()))
                .select(AchievementRow::as_select())
                .load::<AchievementRow>(&mut conn)?;
            Ok(rows.into_iter().map(achievement_definition).collect())
        })
        .await?
    }

    pub async fn list_challenge_catalog(&self) -> Result<Vec<ChallengeDefinition>, StorageError> {
        use schema::challenges::dsl::*;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<ChallengeDefinition>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let rows = challenges
                .order((position.asc(), id.asc()))
                .select(ChallengeRow::as_select())
                .load::<ChallengeRow>(&mut conn)?;
            Ok(rows.into_iter().map(challenge_definition).collect())
        })
        .await?
    }

    pub async fn list_user_achievement_progress(
        &self,
        user: &str,
    ) -> Result<Vec<UserAchievementProgress>, StorageError> {
        use schema::user_achievements::dsl as ua;
        let pool = self.pool.clone();
        let user_owned = user.to_string();
        tokio::task::spawn_blocking(
            move || -> Result<Vec<UserAchievementProgress>, StorageError> {
                let mut conn = pool.get()?;
                configure_sqlite_conn(&mut conn)?;
                let rows = ua::user_achievements
                    .filter(ua::user_id.eq(&user_owned))
                    .select(UserAchievementRow::as_select())
                    .load::<UserAchievementRow>(&mut conn)?;
                Ok(rows.into_iter().map(achievement_progress).collect())
            },
        )
        .await?
    }

    pub async fn list_user_challenge_progress(
        &self,
        user: &str,
    ) -> Result<Vec<UserChallengeProgress>, StorageError> {
        use schema::user_challenges::dsl as uc;
        let pool = self.pool.clone();
        let user_owned = user.to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<UserChallengeProgress>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let rows = uc::user_challenges
                .filter(uc::user_id.eq(&user_owned))
                .select(UserChallengeRow::as_select())
                .load::<UserChallengeRow>(&mut conn)?;
            Ok(rows.into_iter().map(challenge_progress).collect())
        })
        .await?
    }

    /// Raises a user's progress on one achievement.
    ///
    /// Progress never decreases. The row unlocks once the target is reached
    /// (or on any progress when the achievement has no target), and
    /// `unlocked_at` is written only on that transition.
    pub async fn record_achievement_progress(
        &self,
        user: &str,
        achievement: &str,
        value: i32,
    ) -> Result<UserAchievementProgress, StorageError> {
        if value < 0 {
            return Err(StorageError::InvalidInput(format!(
                "progress must not be negative: {value}"
            )));
        }
        let pool = self.pool.clone();
        let user_owned = user.to_string();
        let achievement_owned = achievement.to_string();
        trace!(
            user_id = %user_owned,
            achievement_id = %achievement_owned,
            value,
            "record_achievement_progress"
        );
        tokio::task::spawn_blocking(move || -> Result<UserAchievementProgress, StorageError> {
            use schema::achievements::dsl as a;
            use schema::user_achievements::dsl as ua;
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<UserAchievementProgress, StorageError> {
                let def = a::achievements
                    .filter(a::id.eq(&achievement_owned))
                    .select(AchievementRow::as_select())
                    .first::<AchievementRow>(conn)
                    .optional()?
                    .ok_or_else(|| {
                        StorageError::NotFound(format!("achievement {achievement_owned}"))
                    })?;
                let existing = ua::user_achievements
                    .filter(ua::user_id.eq(&user_owned))
                    .filter(ua::achievement_id.eq(&achievement_owned))
                    .select(UserAchievementRow::as_select())
                    .first::<UserAchievementRow>(conn)
                    .optional()?;

                let now = Utc::now().naive_utc();
                let prev_progress = existing.as_ref().map(|r| r.progress).unwrap_or(0);
                let progress = prev_progress.max(value);
                let target = def.max_progress.or(def.trigger_value);
                let (unlocked, unlocked_at) = advance_unlock(
                    existing.as_ref().map(|r| (r.unlocked, r.unlocked_at)),
                    progress,
                    target,
                    now,
                );

                let row = NewUserAchievement {
                    user_id: &user_owned,
                    achievement_id: &achievement_owned,
                    progress,
                    unlocked,
                    unlocked_at,
                    updated_at: now,
                };
                diesel::insert_into(ua::user_achievements)
                    .values(&row)
                    .on_conflict((ua::user_id, ua::achievement_id))
                    .do_update()
                    .set((
                        ua::progress.eq(progress),
                        ua::unlocked.eq(unlocked),
                        ua::unlocked_at.eq(unlocked_at),
                        ua::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                if unlocked && existing.as_ref().is_none_or(|r| !r.unlocked) {
                    tracing::info!(
                        user_id = %user_owned,
                        achievement_id = %achievement_owned,
                        negative = def.is_negative,
                        "achievement unlocked"
                    );
                }

                Ok(UserAchievementProgress {
                    achievement_id: achievement_owned.as_str().into(),
                    progress,
                    unlocked,
                    unlocked_at: unlocked_at.and_then(to_offset),
                })
            })
        })
        .await?
    }

    /// Challenge counterpart of [`Store::record_achievement_progress`], with
    /// `condition_value` as the target.
    pub async fn record_challenge_progress(
        &self,
        user: &str,
        challenge: &str,
        value: i32,
    ) -> Result<UserChallengeProgress, StorageError> {
        if value < 0 {
            return Err(StorageError::InvalidInput(format!(
                "progress must not be negative: {value}"
            )));
        }
        let pool = self.pool.clone();
        let user_owned = user.to_string();
        let challenge_owned = challenge.to_string();
        trace!(
            user_id = %user_owned,
            challenge_id = %challenge_owned,
            value,
            "record_challenge_progress"
        );
        tokio::task::spawn_blocking(move || -> Result<UserChallengeProgress, StorageError> {
            use schema::challenges::dsl as c;
            use schema::user_challenges::dsl as uc;
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<UserChallengeProgress, StorageError> {
                let target: Option<Option<i32>> = c::challenges
                    .filter(c::id.eq(&challenge_owned))
                    .select(c::condition_value)
                    .first::<Option<i32>>(conn)
                    .optional()?;
                let Some(target) = target else {
                    return Err(StorageError::NotFound(format!(
                        "challenge {challenge_owned}"
                    )));
                };
                let existing = uc::user_challenges
                    .filter(uc::user_id.eq(&user_owned))
                    .filter(uc::challenge_id.eq(&challenge_owned))
                    .select(UserChallengeRow::as_select())
                    .first::<UserChallengeRow>(conn)
                    .optional()?;

                let now = Utc::now().naive_utc();
                let prev_progress = existing.as_ref().map(|r| r.progress).unwrap_or(0);
                let progress = prev_progress.max(value);
                let (completed, completed_at) = advance_unlock(
                    existing.as_ref().map(|r| (r.completed, r.completed_at)),
                    progress,
                    target,
                    now,
                );

                let row = NewUserChallenge {
                    user_id: &user_owned,
                    challenge_id: &challenge_owned,
                    progress,
                    completed,
                    completed_at,
                    updated_at: now,
                };
                diesel::insert_into(uc::user_challenges)
                    .values(&row)
                    .on_conflict((uc::user_id, uc::challenge_id))
                    .do_update()
                    .set((
                        uc::progress.eq(progress),
                        uc::completed.eq(completed),
                        uc::completed_at.eq(completed_at),
                        uc::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                Ok(UserChallengeProgress {
                    challenge_id: challenge_owned.as_str().into(),
                    progress,
                    completed,
                    completed_at: completed_at.and_then(to_offset),
                })
            })
        })
        .await?
    }
}

/// Next `(done, done_at)` for a progress row. Once done, the row and its
/// timestamp are frozen.
fn advance_unlock(
    previous: Option<(bool, Option<NaiveDateTime>)>,
    progress: i32,
    target: Option<i32>,
    now: NaiveDateTime,
) -> (bool, Option<NaiveDateTime>) {
    if let Some((true, at)) = previous {
        return (true, at.or(Some(now)));
    }
    let reached = match target {
        Some(t) => progress >= t,
        None => progress > 0,
    };
    if reached {
        (true, Some(now))
    } else {
        (false, None)
    }
}

/// Older catalogs marked the streak tracker only by its title.
fn catalog_kind(def: &AchievementDefinition) -> AchievementKind {
    if def.kind != AchievementKind::Streak
        && !def.is_negative
        && def.title.contains(LEGACY_STREAK_MARKER)
    {
        warn!(
            achievement_id = %def.id,
            title = %def.title,
            kind = %def.kind,
            "seed: treating legacy streak title as achievement_type=streak"
        );
        return AchievementKind::Streak;
    }
    def.kind.clone()
}

fn achievement_definition(row: AchievementRow) -> AchievementDefinition {
    AchievementDefinition {
        id: row.id.as_str().into(),
        title: row.title,
        description: row.description,
        icon: row.icon,
        is_negative: row.is_negative,
        penalty_points: row.penalty_points,
        max_progress: row.max_progress,
        trigger_value: row.trigger_value,
        kind: AchievementKind::from(row.achievement_type),
    }
}

fn challenge_definition(row: ChallengeRow) -> ChallengeDefinition {
    let challenge_type = row
        .challenge_type
        .parse::<ChallengeType>()
        .unwrap_or_else(|e| {
            warn!(challenge_id = %row.id, error = %e, "falling back to daily challenge type");
            ChallengeType::default()
        });
    ChallengeDefinition {
        id: row.id.as_str().into(),
        title: row.title,
        description: row.description,
        icon: row.icon,
        points: row.points,
        start_date: row.start_date.and_then(to_offset),
        end_date: row.end_date.and_then(to_offset),
        challenge_type,
        condition_value: row.condition_value,
    }
}

fn achievement_progress(row: UserAchievementRow) -> UserAchievementProgress {
    UserAchievementProgress {
        achievement_id: row.achievement_id.as_str().into(),
        progress: row.progress,
        unlocked: row.unlocked,
        unlocked_at: row.unlocked_at.and_then(to_offset),
    }
}

fn challenge_progress(row: UserChallengeRow) -> UserChallengeProgress {
    UserChallengeProgress {
        challenge_id: row.challenge_id.as_str().into(),
        progress: row.progress,
        completed: row.completed,
        completed_at: row.completed_at.and_then(to_offset),
    }
}

// SQLite timestamps are naive UTC.
fn to_offset(dt: NaiveDateTime) -> Option<OffsetDateTime> {
    let micros = dt.and_utc().timestamp_micros();
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000).ok()
}

fn to_naive(dt: OffsetDateTime) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond()).map(|d| d.naive_utc())
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    // Ignore the result rows; Diesel's execute is fine for PRAGMAs
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys=ON;").execute(conn)?;
    Ok(())
}
