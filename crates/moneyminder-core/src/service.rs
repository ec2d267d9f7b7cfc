//! The notification service object.
//!
//! [`NotificationCenter`] is built once at application start and handed to
//! the UI layer. It owns the notification log and the preferences; every
//! entry point takes `&mut self`, so mutations are serialized by
//! construction.
//!
//! Mutations are applied in memory first and then written to the store. A
//! failed write is logged and recorded in [`PersistStatus`]; the in-memory
//! state is never rolled back.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backend::{map_backend_notification, BackendSync};
use crate::error::{ConfigError, PlatformError, SchedulingError};
use crate::notification_log::{
    LogSnapshot, NewNotification, NotificationCategory, NotificationLog, NotificationRecord,
    NOTIFICATIONS_KEY,
};
use crate::permission::{PermissionGateway, PermissionStatus, Permissions};
use crate::platform::{DeliveryReport, NotificationPlatform, PlatformEvent, PlatformEventReceiver};
use crate::preferences::{AlertKind, NotificationPreferences, PreferencesPatch, ReportFrequency};
use crate::quiet_hours::QuietHours;
use crate::scheduler::{
    DriftMonitor, DriftVerdict, ReminderRequest, ReminderScheduler, ScheduledReminder,
};
use crate::storage::{KeyValueStore, SchedulerConfig};

/// Outcome of the most recent durable writes of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Last successful write.
    pub last_saved: Option<DateTime<Utc>>,
    /// Error of the last write, cleared by the next success.
    pub last_error: Option<String>,
}

impl PersistStatus {
    fn record(&mut self, result: Result<(), String>, now: DateTime<Utc>) {
        match result {
            Ok(()) => {
                self.last_saved = Some(now);
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }
}

/// What a backend sync changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Number of notifications loaded, `None` if the fetch failed or no backend.
    pub notifications: Option<usize>,
    pub preferences_changed: bool,
}

/// Process-wide notification state and reminder service.
pub struct NotificationCenter<S, P, G> {
    store: S,
    platform: P,
    permissions: Permissions<G>,
    events: PlatformEventReceiver,
    backend: Option<Box<dyn BackendSync>>,
    scheduler: ReminderScheduler,
    drift: DriftMonitor,
    log: NotificationLog,
    preferences: NotificationPreferences,
    log_persist: PersistStatus,
    preferences_persist: PersistStatus,
}

impl<S, P, G> NotificationCenter<S, P, G>
where
    S: KeyValueStore,
    P: NotificationPlatform,
    G: PermissionGateway,
{
    pub fn new(
        store: S,
        platform: P,
        gateway: G,
        events: PlatformEventReceiver,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            platform,
            permissions: Permissions::new(gateway),
            events,
            backend: None,
            drift: DriftMonitor::new(config.drift_threshold_secs),
            scheduler: ReminderScheduler::new(config),
            log: NotificationLog::new(),
            preferences: NotificationPreferences::default(),
            log_persist: PersistStatus::default(),
            preferences_persist: PersistStatus::default(),
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn BackendSync>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Load persisted state and bring up the platform.
    ///
    /// Only a platform initialization failure is returned; storage and
    /// backend problems are logged.
    pub fn initialize(&mut self) -> Result<(), PlatformError> {
        self.load_state();
        self.platform.initialize()?;

        if self.preferences.push_enabled {
            self.register_push_token();
        }
        info!(
            notifications = self.log.len(),
            unread = self.log.unread_count(),
            "notification center initialized"
        );
        Ok(())
    }

    /// Reload preferences and the log from the store.
    pub fn load_state(&mut self) {
        self.preferences = NotificationPreferences::load(&self.store);

        match self.store.get_json::<LogSnapshot>(NOTIFICATIONS_KEY) {
            Ok(Some(snapshot)) => {
                self.log_persist.last_saved = snapshot.last_saved;
                self.log = NotificationLog::from_snapshot(snapshot);
            }
            Ok(None) => self.log = NotificationLog::new(),
            Err(e) => {
                warn!(error = %e, "stored notifications unreadable, starting empty");
                self.log = NotificationLog::new();
            }
        }
    }

    fn register_push_token(&mut self) {
        match self.permissions.status() {
            Ok(status) if status.granted => {}
            Ok(status) => {
                debug!(status = %status.status, "push permission not granted, skipping token registration");
                return;
            }
            Err(e) => {
                warn!(error = %e, "could not read push permission");
                return;
            }
        }

        let token = match self.platform.register_for_push_notifications() {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "push registration failed");
                return;
            }
        };
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.register_push_token(&token, self.platform.platform_name()) {
                warn!(error = %e, "push token upload failed");
            }
        }
    }

    // --- notification log ---

    pub fn notifications(&self) -> &[NotificationRecord] {
        self.log.records()
    }

    pub fn notification(&self, id: &str) -> Option<&NotificationRecord> {
        self.log.get(id)
    }

    pub fn unread_count(&self) -> usize {
        self.log.unread_count()
    }

    pub fn add_notification(&mut self, new: NewNotification) -> NotificationRecord {
        let record = self.log.append(new);
        self.persist_log();
        record
    }

    pub fn mark_as_read(&mut self, id: &str) -> bool {
        let changed = self.log.mark_read(id);
        if changed {
            self.persist_log();
        }
        changed
    }

    pub fn mark_as_unread(&mut self, id: &str) -> bool {
        let changed = self.log.mark_unread(id);
        if changed {
            self.persist_log();
        }
        changed
    }

    pub fn mark_all_as_read(&mut self) -> usize {
        let changed = self.log.mark_all_read();
        if changed > 0 {
            self.persist_log();
        }
        changed
    }

    pub fn remove_notification(&mut self, id: &str) -> Option<NotificationRecord> {
        let removed = self.log.remove(id);
        if removed.is_some() {
            self.persist_log();
        }
        removed
    }

    /// Empty the log and delete its stored document.
    pub fn clear_all(&mut self) {
        self.log.clear();
        let result = self.store.remove(NOTIFICATIONS_KEY).map_err(|e| {
            warn!(error = %e, "failed to delete stored notifications");
            e.to_string()
        });
        self.log_persist.record(result, Utc::now());
    }

    pub fn persist_status(&self) -> &PersistStatus {
        &self.log_persist
    }

    fn persist_log(&mut self) {
        let now = Utc::now();
        let result = self
            .store
            .set_json(NOTIFICATIONS_KEY, &self.log.snapshot(now))
            .map_err(|e| {
                warn!(error = %e, "failed to persist notifications");
                e.to_string()
            });
        self.log_persist.record(result, now);
    }

    // --- preferences ---

    pub fn preferences(&self) -> &NotificationPreferences {
        &self.preferences
    }

    pub fn preferences_persist_status(&self) -> &PersistStatus {
        &self.preferences_persist
    }

    /// Apply a partial update; saves and pushes to the backend when changed.
    pub fn update_preferences(&mut self, patch: PreferencesPatch) -> bool {
        if !self.preferences.apply(&patch) {
            return false;
        }
        self.persist_preferences();
        self.push_preferences(&patch);
        true
    }

    pub fn set_push_enabled(&mut self, enabled: bool) -> bool {
        self.update_preferences(PreferencesPatch {
            push_enabled: Some(enabled),
            ..Default::default()
        })
    }

    pub fn set_reminders_enabled(&mut self, enabled: bool) -> bool {
        self.update_preferences(PreferencesPatch {
            reminders_enabled: Some(enabled),
            ..Default::default()
        })
    }

    pub fn set_quiet_hours(&mut self, quiet_hours: QuietHours) -> bool {
        self.update_preferences(PreferencesPatch {
            quiet_hours: Some(quiet_hours),
            ..Default::default()
        })
    }

    pub fn set_spending_alert_threshold(&mut self, threshold: f64) -> bool {
        self.update_preferences(PreferencesPatch {
            spending_alert_threshold: Some(threshold),
            ..Default::default()
        })
    }

    pub fn set_report_frequency(&mut self, frequency: ReportFrequency) -> bool {
        self.update_preferences(PreferencesPatch {
            report_frequency: Some(frequency),
            ..Default::default()
        })
    }

    /// Set one preference by camelCase key, e.g. `quietHours.start`.
    pub fn set_preference(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.preferences.clone();
        updated.set(key, value)?;
        self.update_preferences(PreferencesPatch::from(&updated));
        Ok(())
    }

    pub fn reset_preferences(&mut self) {
        self.update_preferences(PreferencesPatch::from(&NotificationPreferences::default()));
    }

    pub fn should_alert(&self, kind: AlertKind) -> bool {
        self.preferences.allows(kind)
    }

    pub fn should_alert_spending(&self, percent_used: f64) -> bool {
        self.preferences.should_alert_spending(percent_used)
    }

    fn persist_preferences(&mut self) {
        let result = self.preferences.save(&mut self.store).map_err(|e| {
            warn!(error = %e, "failed to persist notification preferences");
            e.to_string()
        });
        self.preferences_persist.record(result, Utc::now());
    }

    fn push_preferences(&mut self, patch: &PreferencesPatch) {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.update_notification_preferences(patch) {
                warn!(error = %e, "failed to push notification preferences");
            }
        }
    }

    // --- reminders ---

    pub fn permission_status(&self) -> Result<PermissionStatus, PlatformError> {
        self.permissions.status()
    }

    pub fn schedule_reminder(
        &mut self,
        request: ReminderRequest,
    ) -> Result<ScheduledReminder, SchedulingError> {
        self.schedule_reminder_at(request, Utc::now())
    }

    /// Schedule as if the current instant were `now`.
    pub fn schedule_reminder_at(
        &mut self,
        request: ReminderRequest,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReminder, SchedulingError> {
        if !self.preferences.reminders_enabled {
            return Err(SchedulingError::Disabled);
        }

        let status = self
            .permissions
            .ensure_granted()
            .map_err(SchedulingError::Platform)?;
        if !status.granted {
            return Err(SchedulingError::PermissionDenied {
                status: status.status.to_string(),
            });
        }

        self.scheduler.schedule(
            &mut self.platform,
            request,
            &self.preferences.quiet_hours,
            now,
        )
    }

    pub fn cancel_reminder(&mut self, id: &str) -> Result<(), SchedulingError> {
        self.scheduler.cancel(&mut self.platform, id)
    }

    // --- platform events ---

    /// Drain pending platform events. Returns how many were handled.
    pub fn process_events(&mut self) -> usize {
        let events = self.events.drain();
        let handled = events.len();
        for event in events {
            match event {
                PlatformEvent::Received(delivered) => {
                    self.add_notification(
                        NewNotification::new(delivered.title, delivered.body, delivered.category)
                            .with_payload(delivered.data),
                    );
                }
                PlatformEvent::Delayed(report) => {
                    self.handle_delivery_report(&report);
                }
            }
        }
        handled
    }

    /// Run drift detection on one delivery report.
    pub fn handle_delivery_report(&mut self, report: &DeliveryReport) -> DriftVerdict {
        let verdict = self.drift.observe(report);
        if let DriftVerdict::Warn { drift_secs } = verdict {
            let minutes = (drift_secs + 59) / 60;
            self.add_notification(
                NewNotification::new(
                    "Reminders may be delayed",
                    format!(
                        "A reminder arrived about {minutes} min late. Allow exact alarms and \
                         background activity for this app so reminders fire on time."
                    ),
                    NotificationCategory::Warning,
                )
                .with_payload(serde_json::json!({
                    "kind": "drift-warning",
                    "reminderId": report.reminder_id,
                    "driftSecs": drift_secs,
                })),
            );
            self.permissions.open_settings_best_effort();
        }
        verdict
    }

    pub fn drift_warned(&self) -> bool {
        self.drift.has_warned()
    }

    // --- backend ---

    /// Pull notifications and preferences from the backend.
    pub fn sync_from_backend(&mut self) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let Some(backend) = self.backend.as_mut() else {
            return outcome;
        };

        let fetched = backend.get_notifications();
        let remote_prefs = backend.get_notification_preferences();

        match fetched {
            Ok(raw) => {
                let now = Utc::now();
                let records: Vec<_> = raw
                    .iter()
                    .map(|r| map_backend_notification(r, now))
                    .collect();
                outcome.notifications = Some(records.len());
                self.log.replace_all(records);
                self.persist_log();
            }
            Err(e) => warn!(error = %e, "notification sync failed, keeping local log"),
        }

        match remote_prefs {
            Ok(patch) if patch.is_empty() => debug!("backend sent no preference overrides"),
            Ok(patch) => {
                if self.preferences.apply(&patch) {
                    outcome.preferences_changed = true;
                    self.persist_preferences();
                }
            }
            Err(e) => warn!(error = %e, "preference sync failed, keeping local preferences"),
        }

        outcome
    }

    // --- collaborators ---

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn permissions_mut(&mut self) -> &mut Permissions<G> {
        &mut self.permissions
    }

    pub fn scheduler_config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }
}
