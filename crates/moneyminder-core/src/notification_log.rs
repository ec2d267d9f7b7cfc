//! In-app notification log.
//!
//! Records are kept most-recent-first. The unread count is a maintained
//! aggregate: adjusted on each transition, recomputed from scratch on bulk
//! loads so a corrupted stored count never survives.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Storage key of the log snapshot.
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// Display category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl NotificationCategory {
    /// Lenient parse used for backend data; unknown values map to `Info`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }
}

/// A stored in-app notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub category: NotificationCategory,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    /// Opaque link back to the source record.
    #[serde(rename = "data", default)]
    pub payload: serde_json::Value,
}

/// A notification before it is given an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub read: bool,
    pub payload: serde_json::Value,
}

impl NewNotification {
    /// An unread notification without payload.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        category: NotificationCategory,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            category,
            read: false,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }
}

/// Persisted form of the log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSnapshot {
    #[serde(default)]
    pub in_app_notifications: Vec<NotificationRecord>,
    /// Informational only; ignored on load.
    #[serde(default)]
    pub unread_count: usize,
    #[serde(default)]
    pub last_saved: Option<DateTime<Utc>>,
}

/// Generate a record id: unix millis plus a random base36 suffix.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}

/// Ordered notification collection with a maintained unread count.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    records: Vec<NotificationRecord>,
    unread: usize,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a snapshot, recomputing the unread count.
    pub fn from_snapshot(snapshot: LogSnapshot) -> Self {
        let mut log = Self::new();
        log.replace_all(snapshot.in_app_notifications);
        log
    }

    pub fn snapshot(&self, last_saved: DateTime<Utc>) -> LogSnapshot {
        LogSnapshot {
            in_app_notifications: self.records.clone(),
            unread_count: self.unread,
            last_saved: Some(last_saved),
        }
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Insert at the front with a fresh id and the current time.
    pub fn append(&mut self, new: NewNotification) -> NotificationRecord {
        self.append_at(new, Utc::now())
    }

    /// Insert at the front with a fresh id stamped at `now`.
    pub fn append_at(&mut self, new: NewNotification, now: DateTime<Utc>) -> NotificationRecord {
        let mut id = generate_id(now);
        while self.get(&id).is_some() {
            id = generate_id(now);
        }

        let record = NotificationRecord {
            id,
            title: new.title,
            message: new.message,
            category: new.category,
            timestamp: now,
            read: new.read,
            payload: new.payload,
        };
        if !record.read {
            self.unread += 1;
        }
        self.records.insert(0, record.clone());
        record
    }

    /// Mark one record read. Returns whether it transitioned.
    pub fn mark_read(&mut self, id: &str) -> bool {
        self.set_read(id, true)
    }

    /// Mark one record unread. Returns whether it transitioned.
    pub fn mark_unread(&mut self, id: &str) -> bool {
        self.set_read(id, false)
    }

    fn set_read(&mut self, id: &str, read: bool) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if record.read == read {
            return false;
        }
        record.read = read;
        if read {
            self.unread -= 1;
        } else {
            self.unread += 1;
        }
        true
    }

    /// Mark every record read. Returns how many transitioned.
    pub fn mark_all_read(&mut self) -> usize {
        let changed = self.unread;
        for record in &mut self.records {
            record.read = true;
        }
        self.unread = 0;
        changed
    }

    /// Delete a record, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<NotificationRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let record = self.records.remove(index);
        if !record.read {
            self.unread -= 1;
        }
        Some(record)
    }

    /// Replace the whole log. Input order is kept as given.
    pub fn replace_all(&mut self, records: Vec<NotificationRecord>) {
        self.unread = records.iter().filter(|r| !r.read).count();
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.unread = 0;
    }
}
