//! Due-date reminder scheduling.
//!
//! A reminder is never handed to the platform "in the past": invalid and
//! past targets are moved to `now + fallback_delay_secs`, and every delay
//! is at least `min_delay_secs`. The enriched payload carries
//! `scheduledFor` so a late delivery can be measured.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SchedulingError;
use crate::platform::{DeliveryReport, NotificationPlatform, ScheduleOptions};
use crate::quiet_hours::QuietHours;
use crate::storage::SchedulerConfig;

/// When a reminder should fire, as given by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderTarget {
    /// A date string from a form field or stored record.
    Raw(String),
    At(DateTime<Utc>),
}

impl From<&str> for ReminderTarget {
    fn from(value: &str) -> Self {
        ReminderTarget::Raw(value.to_string())
    }
}

impl From<String> for ReminderTarget {
    fn from(value: String) -> Self {
        ReminderTarget::Raw(value)
    }
}

impl From<DateTime<Utc>> for ReminderTarget {
    fn from(value: DateTime<Utc>) -> Self {
        ReminderTarget::At(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRequest {
    pub title: String,
    pub body: String,
    pub target: ReminderTarget,
    pub payload: serde_json::Value,
}

impl ReminderRequest {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        target: impl Into<ReminderTarget>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            target: target.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Why a target was moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetAdjustment {
    Past,
    Unparseable,
}

impl TargetAdjustment {
    fn as_str(self) -> &'static str {
        match self {
            TargetAdjustment::Past => "past",
            TargetAdjustment::Unparseable => "unparseable",
        }
    }
}

/// Fire time after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedTarget {
    pub fire_at: DateTime<Utc>,
    pub delay_secs: u64,
    pub adjustment: Option<TargetAdjustment>,
}

/// A reminder registered with the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub id: String,
    pub fire_at: DateTime<Utc>,
    pub delay_secs: u64,
    pub adjustment: Option<TargetAdjustment>,
}

/// Parse a reminder date string. Naive forms are read as UTC.
pub fn parse_target(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Builds and registers reminders with the platform.
#[derive(Debug, Clone, Default)]
pub struct ReminderScheduler {
    config: SchedulerConfig,
    /// Zone for quiet-hours checks; the host's local zone when unset.
    utc_offset: Option<FixedOffset>,
}

/// Seconds from config as a `Duration`, capped at `SchedulerConfig::MAX_SECS`.
fn config_secs(secs: u64) -> Duration {
    Duration::seconds(secs.min(SchedulerConfig::MAX_SECS) as i64)
}

/// `at + delta`, saturating at the latest representable instant.
fn saturating_add(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl ReminderScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            utc_offset: None,
        }
    }

    /// Evaluate quiet hours at a fixed offset instead of the local zone.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Resolve a target into a fire time that is strictly in the future.
    pub fn normalize(&self, target: &ReminderTarget, now: DateTime<Utc>) -> NormalizedTarget {
        let fallback = saturating_add(now, config_secs(self.config.fallback_delay_secs));

        let (target, adjustment) = match target {
            ReminderTarget::At(at) => (Some(*at), None),
            ReminderTarget::Raw(raw) => match parse_target(raw) {
                Some(at) => (Some(at), None),
                None => {
                    warn!(
                        adjustment = TargetAdjustment::Unparseable.as_str(),
                        raw = %raw,
                        fallback = %fallback,
                        "reminder date unparseable; scheduling fallback"
                    );
                    (None, Some(TargetAdjustment::Unparseable))
                }
            },
        };

        let (target, adjustment) = match target {
            Some(at) if at <= now => {
                warn!(
                    adjustment = TargetAdjustment::Past.as_str(),
                    requested = %at,
                    fallback = %fallback,
                    "reminder date in the past; scheduling fallback"
                );
                (fallback, Some(TargetAdjustment::Past))
            }
            Some(at) => (at, adjustment),
            None => (fallback, adjustment),
        };

        let millis = (target - now).num_milliseconds().max(0) as u64;
        let min_delay_secs = self.config.min_delay_secs.min(SchedulerConfig::MAX_SECS);
        let delay_secs = millis.div_ceil(1000).max(min_delay_secs);

        NormalizedTarget {
            fire_at: saturating_add(now, Duration::seconds(delay_secs as i64)),
            delay_secs,
            adjustment,
        }
    }

    /// Register a reminder with the platform. Not retried on failure.
    pub fn schedule<P: NotificationPlatform>(
        &self,
        platform: &mut P,
        request: ReminderRequest,
        quiet_hours: &QuietHours,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReminder, SchedulingError> {
        let target = self.normalize(&request.target, now);
        let data = enrich_payload(request.payload, target.fire_at, now);
        let options = ScheduleOptions {
            channel_id: self.config.channel_id.clone(),
            allow_while_idle: true,
            silent: self.is_quiet_at(quiet_hours, &target.fire_at),
        };

        let id = platform
            .schedule_local_notification(&request.title, &request.body, &data, target.fire_at, &options)
            .map_err(SchedulingError::Platform)?;

        info!(
            reminder_id = %id,
            fire_at = %target.fire_at,
            delay_secs = target.delay_secs,
            silent = options.silent,
            "reminder scheduled"
        );

        Ok(ScheduledReminder {
            id,
            fire_at: target.fire_at,
            delay_secs: target.delay_secs,
            adjustment: target.adjustment,
        })
    }

    fn is_quiet_at(&self, quiet_hours: &QuietHours, at: &DateTime<Utc>) -> bool {
        match &self.utc_offset {
            Some(offset) => quiet_hours.is_active_in(at, offset),
            None => quiet_hours.is_active_at(at),
        }
    }

    /// Cancel a reminder. Unknown or already-fired ids are a no-op.
    pub fn cancel<P: NotificationPlatform>(
        &self,
        platform: &mut P,
        id: &str,
    ) -> Result<(), SchedulingError> {
        platform
            .cancel_notification(id)
            .map_err(SchedulingError::Platform)
    }
}

/// Add `scheduledFor`/`requestedAt`; a non-object payload is kept under `value`.
fn enrich_payload(
    payload: serde_json::Value,
    fire_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> serde_json::Value {
    let mut map = match payload {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("value".into(), other);
            map
        }
    };
    map.insert("scheduledFor".into(), fire_at.to_rfc3339().into());
    map.insert("requestedAt".into(), now.to_rfc3339().into());
    serde_json::Value::Object(map)
}

/// Outcome of checking one delivery against its intended time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftVerdict {
    /// Within threshold, early, or not a tracked reminder.
    OnTime,
    /// First late delivery: show the warning.
    Warn { drift_secs: i64 },
    /// Late, but the warning was already shown.
    Suppressed { drift_secs: i64 },
}

/// Detects late deliveries; warns at most once per monitor lifetime.
#[derive(Debug, Clone)]
pub struct DriftMonitor {
    threshold: Duration,
    warned: bool,
}

impl DriftMonitor {
    pub fn new(threshold_secs: u64) -> Self {
        Self {
            threshold: config_secs(threshold_secs),
            warned: false,
        }
    }

    pub fn has_warned(&self) -> bool {
        self.warned
    }

    pub fn observe(&mut self, report: &DeliveryReport) -> DriftVerdict {
        let Some(scheduled_for) = report
            .data
            .get("scheduledFor")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
        else {
            return DriftVerdict::OnTime;
        };

        let drift = report.fired_at - scheduled_for;
        if drift <= self.threshold {
            return DriftVerdict::OnTime;
        }

        let drift_secs = drift.num_seconds();
        if self.warned {
            return DriftVerdict::Suppressed { drift_secs };
        }
        self.warned = true;
        warn!(
            reminder_id = %report.reminder_id,
            drift_secs,
            "reminder delivered late; exact alarm permission likely missing"
        );
        DriftVerdict::Warn { drift_secs }
    }
}

impl Default for DriftMonitor {
    fn default() -> Self {
        Self::new(SchedulerConfig::default().drift_threshold_secs)
    }
}
