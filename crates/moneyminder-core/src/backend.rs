//! Backend sync service seam.
//!
//! Backend records are loosely shaped (older API versions used `_id`,
//! `body`, `isRead`, `createdAt`), so they arrive as raw JSON and are
//! mapped here.

use chrono::{DateTime, Utc};

use crate::error::PlatformError;
use crate::notification_log::{generate_id, NotificationCategory, NotificationRecord};
use crate::preferences::PreferencesPatch;

/// Remote account service.
pub trait BackendSync {
    fn register_push_token(&mut self, token: &str, platform: &str) -> Result<(), PlatformError>;

    fn get_notification_preferences(&mut self) -> Result<PreferencesPatch, PlatformError>;

    fn update_notification_preferences(
        &mut self,
        patch: &PreferencesPatch,
    ) -> Result<(), PlatformError>;

    fn get_notifications(&mut self) -> Result<Vec<serde_json::Value>, PlatformError>;
}

fn first_str<'a>(raw: &'a serde_json::Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| raw.get(*k).and_then(|v| v.as_str()))
}

/// Map one backend record, filling gaps with defaults.
pub fn map_backend_notification(raw: &serde_json::Value, now: DateTime<Utc>) -> NotificationRecord {
    let id = first_str(raw, &["id", "_id"])
        .map(str::to_string)
        .or_else(|| raw.get("id").and_then(|v| v.as_i64()).map(|n| n.to_string()))
        .unwrap_or_else(|| generate_id(now));

    let timestamp = first_str(raw, &["timestamp", "createdAt"])
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    let read = ["read", "isRead"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(|v| v.as_bool()))
        .unwrap_or(false);

    NotificationRecord {
        id,
        title: first_str(raw, &["title"]).unwrap_or_default().to_string(),
        message: first_str(raw, &["message", "body"])
            .unwrap_or_default()
            .to_string(),
        category: first_str(raw, &["type"])
            .map(NotificationCategory::parse_lenient)
            .unwrap_or_default(),
        timestamp,
        read,
        payload: raw.get("data").cloned().unwrap_or(serde_json::Value::Null),
    }
}
