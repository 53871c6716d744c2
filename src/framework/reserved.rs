//! Reserved-Name Guard.
//!
//! The drivers install their own lifecycle slots. User methods or pass-through
//! fields with the same name silently replace them, so collisions are reported
//! (once per category) unless the caller set `overwrite_reserved`. Nothing is
//! ever blocked.

use log::warn;

/// Slots the page driver installs.
pub const RESERVED_PAGE_NAMES: &[&str] = &[
    "onLoad",
    "onShow",
    "onReady",
    "onHide",
    "onUnload",
    "onTabItemTap",
    "onPullDownRefresh",
    "onReachBottom",
    "onPageScroll",
    "onResize",
    "onShareAppMessage",
    "onShareTimeline",
    "onAddToFavorites",
    "onSaveExitState",
];

/// Slots the app driver installs.
pub const RESERVED_APP_NAMES: &[&str] = &[
    "onLaunch",
    "onShow",
    "onHide",
    "onError",
    "onPageNotFound",
    "onUnhandledRejection",
    "onThemeChange",
    "globalData",
];

/// Declared names that collide with `reserved`, in declaration order, without repeats.
///
/// Logs a single warning listing them unless `acknowledged` is set.
pub fn detect_reserved<'a>(
    scope: &str,
    category: &str,
    declared: impl IntoIterator<Item = &'a str>,
    reserved: &[&str],
    acknowledged: bool,
) -> Vec<String> {
    let mut collisions: Vec<String> = Vec::new();
    for name in declared {
        if reserved.contains(&name) && !collisions.iter().any(|c| c == name) {
            collisions.push(name.to_string());
        }
    }

    if !collisions.is_empty() && !acknowledged {
        warn!(
            "[spark-mina] {} - reserved names detected in {} definition: {}.",
            scope,
            category,
            serde_json::Value::from(collisions.clone())
        );
    }

    collisions
}
