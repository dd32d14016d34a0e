//! Achievement and challenge progression.
//!
//! Everything here works on in-memory snapshots of catalog and progress rows.
//! The mapper and calculators are pure; the notifier is the only stateful
//! piece and owns its dedup set.

pub mod clock;
pub mod mapper;
pub mod notify;
pub mod stats;

pub use clock::{Clock, ExpiryCallback, ExpiryScheduler, ManualClock, SystemClock};
pub use mapper::{map_achievements, map_challenges};
pub use notify::{
    AchievementNotification, AchievementNotifier, NotificationSink, NotifierSettings, Polarity,
};
pub use stats::{
    ACHIEVEMENT_XP, EXP_PER_LEVEL, LEGACY_STREAK_MARKER, calculate_penalty_points,
    calculate_player_stats, calculate_poop_coins, calculate_stink_badges, get_current_streak,
};
