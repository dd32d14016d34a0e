use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::{API_V1_PREFIX, user_scope};

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn version(base: &str) -> String {
    base_join(base, &format!("{}/version", API_V1_PREFIX))
}
pub fn achievement_catalog(base: &str) -> String {
    base_join(base, &format!("{}/achievements", API_V1_PREFIX))
}
pub fn challenge_catalog(base: &str) -> String {
    base_join(base, &format!("{}/challenges", API_V1_PREFIX))
}
pub fn user_achievements(base: &str, user_id: &str) -> String {
    base_join(base, &format!("{}/achievements", user_scope(&enc(user_id))))
}
pub fn user_challenges(base: &str, user_id: &str) -> String {
    base_join(base, &format!("{}/challenges", user_scope(&enc(user_id))))
}
pub fn user_stats(base: &str, user_id: &str) -> String {
    base_join(base, &format!("{}/stats", user_scope(&enc(user_id))))
}
pub fn achievement_progress(base: &str, user_id: &str, achievement_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/achievements/{}/progress",
            user_scope(&enc(user_id)),
            enc(achievement_id)
        ),
    )
}
pub fn challenge_progress(base: &str, user_id: &str, challenge_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/challenges/{}/progress",
            user_scope(&enc(user_id)),
            enc(challenge_id)
        ),
    )
}
pub fn notifications_check(base: &str, user_id: &str) -> String {
    base_join(
        base,
        &format!("{}/notifications/check", user_scope(&enc(user_id))),
    )
}
