use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::clock::{Clock, ExpiryScheduler};
use crate::domain::{Achievement, AchievementId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

/// One consolidated alert for a group of fresh unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementNotification {
    pub polarity: Polarity,
    /// Number of fresh unlocks folded into this alert.
    pub count: usize,
    pub headline: String,
    /// The first fresh unlock, shown as the example.
    pub achievement_id: AchievementId,
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl AchievementNotification {
    fn for_group(polarity: Polarity, first: &Achievement, count: usize) -> Self {
        let headline = match (polarity, count) {
            (Polarity::Positive, 1) => "Achievement Unlocked!".to_string(),
            (Polarity::Positive, n) => format!("{n} Achievements Unlocked"),
            (Polarity::Negative, 1) => "Setback Unlocked".to_string(),
            (Polarity::Negative, n) => format!("{n} Setbacks Unlocked"),
        };
        Self {
            polarity,
            count,
            headline,
            achievement_id: first.id.clone(),
            title: first.title.clone(),
            description: first.description.clone(),
            icon: first.icon.clone(),
        }
    }
}

/// Receives notifications raised by [`AchievementNotifier`].
pub trait NotificationSink {
    fn emit(&mut self, notification: AchievementNotification);
}

impl NotificationSink for Vec<AchievementNotification> {
    fn emit(&mut self, notification: AchievementNotification) {
        self.push(notification);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierSettings {
    /// How far back `unlocked_at` may be for an unlock to count as new.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// How long an achievement stays suppressed after being announced.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

fn default_window_secs() -> u64 {
    10
}

fn default_cooldown_secs() -> u64 {
    60
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Announces fresh unlocks at most once per cooldown.
///
/// Each announced id sits in the dedup set until a one-shot expiry scheduled
/// at insertion time removes it. Skipped ids do not extend the cooldown.
pub struct AchievementNotifier<C, S> {
    clock: C,
    scheduler: S,
    recent: Arc<Mutex<HashSet<AchievementId>>>,
    window: Duration,
    cooldown: Duration,
}

impl<C: Clock, S: ExpiryScheduler> AchievementNotifier<C, S> {
    pub fn new(clock: C, scheduler: S) -> Self {
        Self::with_settings(clock, scheduler, NotifierSettings::default())
    }

    pub fn with_settings(clock: C, scheduler: S, settings: NotifierSettings) -> Self {
        Self {
            clock,
            scheduler,
            recent: Arc::new(Mutex::new(HashSet::new())),
            window: Duration::from_secs(settings.window_secs),
            cooldown: Duration::from_secs(settings.cooldown_secs),
        }
    }

    /// Emits at most one positive and one negative notification for unlocks
    /// newer than the window. Returns whether any fresh unlock existed,
    /// whether or not it was suppressed by the cooldown.
    pub fn notify_new_achievements(
        &self,
        achievements: &[Achievement],
        sink: &mut dyn NotificationSink,
    ) -> bool {
        let cutoff = self.clock.now() - self.window;
        let (positive, negative): (Vec<&Achievement>, Vec<&Achievement>) = achievements
            .iter()
            .filter(|a| a.unlocked && a.unlocked_at.is_some_and(|at| at > cutoff))
            .partition(|a| !a.is_negative);

        if positive.is_empty() && negative.is_empty() {
            return false;
        }

        self.announce(Polarity::Positive, &positive, sink);
        self.announce(Polarity::Negative, &negative, sink);
        true
    }

    fn announce(
        &self,
        polarity: Polarity,
        group: &[&Achievement],
        sink: &mut dyn NotificationSink,
    ) {
        let Some(first) = group.first() else {
            return;
        };
        {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
            if !recent.insert(first.id.clone()) {
                trace!(achievement_id = %first.id, ?polarity, "notify: suppressed by cooldown");
                return;
            }
        }

        let recent = Arc::clone(&self.recent);
        let id = first.id.clone();
        self.scheduler.schedule(
            self.cooldown,
            Box::new(move || {
                recent
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&id);
            }),
        );

        debug!(
            achievement_id = %first.id,
            ?polarity,
            count = group.len(),
            "notify: announcing unlock"
        );
        sink.emit(AchievementNotification::for_group(polarity, first, group.len()));
    }

    /// Whether `id` is currently inside its cooldown.
    pub fn is_cooling_down(&self, id: &AchievementId) -> bool {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// True when nothing is cooling down, so the notifier holds no state
    /// worth keeping.
    pub fn is_idle(&self) -> bool {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Cancels pending expiries. Call when the owner shuts down.
    pub fn shutdown(&self) {
        self.scheduler.cancel_all();
    }
}
