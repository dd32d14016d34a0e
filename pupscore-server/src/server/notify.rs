use std::time::Duration;

use pupscore_shared::gamification::{
    AchievementNotifier, ExpiryCallback, ExpiryScheduler, SystemClock,
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub type UserNotifier = AchievementNotifier<SystemClock, TokioExpiryScheduler>;

/// Expiry timers as detached tokio tasks. Cancelling the token drops every
/// timer that has not fired yet.
#[derive(Clone, Debug)]
pub struct TokioExpiryScheduler {
    token: CancellationToken,
}

impl TokioExpiryScheduler {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl ExpiryScheduler for TokioExpiryScheduler {
    fn schedule(&self, delay: Duration, expire: ExpiryCallback) {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => expire(),
                _ = token.cancelled() => {
                    trace!("notify: expiry timer cancelled");
                }
            }
        });
    }

    fn cancel_all(&self) {
        self.token.cancel();
    }
}
