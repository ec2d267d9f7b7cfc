//! # MoneyMinder Core Library
//!
//! Notification state and reminder scheduling for the MoneyMinder
//! personal-finance tracker. Rendering lives elsewhere; this crate
//! holds the state model plus thin seams over the mobile platform and
//! the backend. A standalone CLI exercises the same core.
//!
//! ## Architecture
//!
//! - **Notification Log**: most-recent-first in-app notifications with a
//!   maintained unread count
//! - **Preferences**: persisted toggles, quiet hours and report frequency
//! - **Reminder Scheduler**: clamps past/invalid due dates forward, hands a
//!   one-shot notification to the platform and detects late deliveries
//! - **Storage**: JSON key-value documents and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`NotificationCenter`]: the service object owning log and preferences
//! - [`NotificationLog`]: the in-app notification list
//! - [`ReminderScheduler`]: due-date reminder scheduling
//! - [`NotificationPlatform`]: trait for the OS notification service

pub mod backend;
pub mod error;
pub mod notification_log;
pub mod permission;
pub mod platform;
pub mod preferences;
pub mod quiet_hours;
pub mod scheduler;
pub mod service;
pub mod storage;

pub use backend::{map_backend_notification, BackendSync};
pub use error::{ConfigError, CoreError, PlatformError, SchedulingError, StorageError};
pub use notification_log::{
    LogSnapshot, NewNotification, NotificationCategory, NotificationLog, NotificationRecord,
};
pub use permission::{PermissionGateway, PermissionState, PermissionStatus, Permissions};
pub use platform::{
    event_channel, DeliveredNotification, DeliveryReport, NotificationPlatform, PlatformEvent,
    PlatformEventReceiver, PlatformEventSender, ScheduleOptions,
};
pub use preferences::{AlertKind, NotificationPreferences, PreferencesPatch, ReportFrequency};
pub use quiet_hours::{is_quiet, QuietHours, TimeOfDay};
pub use scheduler::{
    DriftMonitor, DriftVerdict, ReminderRequest, ReminderScheduler, ReminderTarget,
    ScheduledReminder, TargetAdjustment,
};
pub use service::{NotificationCenter, PersistStatus, SyncOutcome};
pub use storage::{AppConfig, FileStore, KeyValueStore, MemoryStore, SchedulerConfig};
