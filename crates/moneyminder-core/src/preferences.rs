//! Notification preferences.
//!
//! Loaded once at start, mutated through explicit setters, and saved after
//! every change. The stored document is the camelCase JSON form of
//! [`NotificationPreferences`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StorageError};
use crate::quiet_hours::QuietHours;
use crate::storage::{json_path, KeyValueStore};

/// Storage key of the preferences document.
pub const PREFERENCES_KEY: &str = "notification_preferences";

/// How often the spending report is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Never,
}

/// Categories a user can switch off individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Budget,
    Goal,
    Spending,
    Tip,
    SyncReminder,
    /// Due-date reminders (borrowed money, bills).
    Reminder,
}

/// User notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub push_enabled: bool,
    pub reminders_enabled: bool,
    pub budget_alerts: bool,
    pub goal_alerts: bool,
    pub spending_alerts: bool,
    pub tips: bool,
    pub sync_reminders: bool,
    pub quiet_hours: QuietHours,
    /// Percentage of a budget at which a spending alert fires.
    pub spending_alert_threshold: f64,
    pub report_frequency: ReportFrequency,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            push_enabled: true,
            reminders_enabled: true,
            budget_alerts: true,
            goal_alerts: true,
            spending_alerts: true,
            tips: false,
            sync_reminders: true,
            quiet_hours: QuietHours::default(),
            spending_alert_threshold: 80.0,
            report_frequency: ReportFrequency::default(),
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_alerts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_alerts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_alerts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_alert_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_frequency: Option<ReportFrequency>,
}

impl PreferencesPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&NotificationPreferences> for PreferencesPatch {
    fn from(prefs: &NotificationPreferences) -> Self {
        Self {
            push_enabled: Some(prefs.push_enabled),
            reminders_enabled: Some(prefs.reminders_enabled),
            budget_alerts: Some(prefs.budget_alerts),
            goal_alerts: Some(prefs.goal_alerts),
            spending_alerts: Some(prefs.spending_alerts),
            tips: Some(prefs.tips),
            sync_reminders: Some(prefs.sync_reminders),
            quiet_hours: Some(prefs.quiet_hours),
            spending_alert_threshold: Some(prefs.spending_alert_threshold),
            report_frequency: Some(prefs.report_frequency),
        }
    }
}

impl NotificationPreferences {
    /// Load from storage, falling back to defaults when absent or malformed.
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get_json::<Self>(PREFERENCES_KEY) {
            Ok(Some(prefs)) => prefs,
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "notification preferences unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<(), StorageError> {
        store.set_json(PREFERENCES_KEY, self)
    }

    /// Apply a patch, returning whether anything changed.
    pub fn apply(&mut self, patch: &PreferencesPatch) -> bool {
        let before = self.clone();
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = patch.$field {
                    self.$field = value;
                })*
            };
        }
        take!(
            push_enabled,
            reminders_enabled,
            budget_alerts,
            goal_alerts,
            spending_alerts,
            tips,
            sync_reminders,
            quiet_hours,
            spending_alert_threshold,
            report_frequency
        );
        *self != before
    }

    /// Whether alerts of `kind` are switched on.
    pub fn allows(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::Budget => self.budget_alerts,
            AlertKind::Goal => self.goal_alerts,
            AlertKind::Spending => self.spending_alerts,
            AlertKind::Tip => self.tips,
            AlertKind::SyncReminder => self.sync_reminders,
            AlertKind::Reminder => self.reminders_enabled,
        }
    }

    /// Whether `percent_used` of a budget warrants a spending alert.
    pub fn should_alert_spending(&self, percent_used: f64) -> bool {
        self.spending_alerts && percent_used >= self.spending_alert_threshold
    }

    /// Get a value as string by camelCase dot path, e.g. `quietHours.start`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json_path::get(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by camelCase dot path without saving.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        json_path::set(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}
