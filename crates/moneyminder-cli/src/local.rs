//! File-backed stand-ins for the mobile notification platform.
//!
//! Scheduled reminders are kept in `<data_dir>/scheduled.json` until they
//! are cancelled or delivered with `remind fire`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use moneyminder_core::storage::data_dir;
use moneyminder_core::{
    event_channel, AppConfig, FileStore, NotificationCenter, NotificationPlatform,
    PermissionGateway, PermissionStatus, PlatformError, PlatformEventSender, ScheduleOptions,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reminder waiting to fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReminder {
    pub id: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub fire_at: DateTime<Utc>,
    pub options: ScheduleOptions,
}

pub struct LocalPlatform {
    path: PathBuf,
    pending: Vec<PendingReminder>,
}

impl LocalPlatform {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join("scheduled.json"),
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[PendingReminder] {
        &self.pending
    }

    /// Remove a pending reminder so it can be delivered.
    pub fn take(&mut self, id: &str) -> Result<Option<PendingReminder>, PlatformError> {
        let Some(index) = self.pending.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let reminder = self.pending.remove(index);
        self.save()?;
        Ok(Some(reminder))
    }

    fn error(message: impl std::fmt::Display) -> PlatformError {
        PlatformError::new("local", message.to_string())
    }

    fn save(&self) -> Result<(), PlatformError> {
        let content = serde_json::to_string_pretty(&self.pending).map_err(Self::error)?;
        // Same sibling-then-rename write as `FileStore`.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(Self::error)
    }
}

impl NotificationPlatform for LocalPlatform {
    fn platform_name(&self) -> &str {
        "local"
    }

    fn initialize(&mut self) -> Result<(), PlatformError> {
        self.pending = match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(Self::error)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Self::error(e)),
        };
        Ok(())
    }

    fn register_for_push_notifications(&mut self) -> Result<Option<String>, PlatformError> {
        Ok(None)
    }

    fn schedule_local_notification(
        &mut self,
        title: &str,
        body: &str,
        data: &serde_json::Value,
        fire_at: DateTime<Utc>,
        options: &ScheduleOptions,
    ) -> Result<String, PlatformError> {
        let id = Uuid::new_v4().to_string();
        self.pending.push(PendingReminder {
            id: id.clone(),
            title: title.to_string(),
            body: body.to_string(),
            data: data.clone(),
            fire_at,
            options: options.clone(),
        });
        self.save()?;
        Ok(id)
    }

    fn cancel_notification(&mut self, id: &str) -> Result<(), PlatformError> {
        let before = self.pending.len();
        self.pending.retain(|r| r.id != id);
        if self.pending.len() != before {
            self.save()?;
        }
        Ok(())
    }
}

/// A terminal has no OS permission prompt.
pub struct LocalGateway;

impl PermissionGateway for LocalGateway {
    fn get_status(&self) -> Result<PermissionStatus, PlatformError> {
        Ok(PermissionStatus::granted())
    }

    fn request_permission(&mut self) -> Result<PermissionStatus, PlatformError> {
        Ok(PermissionStatus::granted())
    }

    fn open_platform_settings(&mut self) -> Result<(), PlatformError> {
        tracing::info!("open the system notification settings to allow exact alarms");
        Ok(())
    }
}

pub type LocalCenter = NotificationCenter<FileStore, LocalPlatform, LocalGateway>;

/// Build and initialize the notification center over the data directory.
pub fn open_center() -> Result<(LocalCenter, PlatformEventSender), Box<dyn std::error::Error>> {
    let dir = data_dir()?;
    let config = AppConfig::load_or_default();
    let (tx, rx) = event_channel();
    let mut center = NotificationCenter::new(
        FileStore::with_dir(&dir)?,
        LocalPlatform::new(&dir),
        LocalGateway,
        rx,
        config.scheduler,
    );
    center.initialize()?;
    Ok((center, tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options() -> ScheduleOptions {
        ScheduleOptions {
            channel_id: "reminders".into(),
            allow_while_idle: true,
            silent: false,
        }
    }

    #[test]
    fn schedule_writes_complete_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let mut platform = LocalPlatform::new(dir.path());
        platform.initialize().unwrap();
        let id = platform
            .schedule_local_notification("Debt due", "Pay", &serde_json::json!({}), Utc::now(), &options())
            .unwrap();

        assert!(!dir.path().join("scheduled.json.tmp").exists());
        let mut reopened = LocalPlatform::new(dir.path());
        reopened.initialize().unwrap();
        assert_eq!(reopened.pending().len(), 1);
        assert_eq!(reopened.pending()[0].id, id);
    }

    #[test]
    fn take_and_cancel_persist_removal() {
        let dir = TempDir::new().unwrap();
        let mut platform = LocalPlatform::new(dir.path());
        platform.initialize().unwrap();
        let first = platform
            .schedule_local_notification("a", "", &serde_json::Value::Null, Utc::now(), &options())
            .unwrap();
        let second = platform
            .schedule_local_notification("b", "", &serde_json::Value::Null, Utc::now(), &options())
            .unwrap();

        assert_eq!(platform.take(&first).unwrap().unwrap().title, "a");
        assert!(platform.take(&first).unwrap().is_none());
        platform.cancel_notification(&second).unwrap();
        platform.cancel_notification("unknown").unwrap();

        let mut reopened = LocalPlatform::new(dir.path());
        reopened.initialize().unwrap();
        assert!(reopened.pending().is_empty());
    }
}
