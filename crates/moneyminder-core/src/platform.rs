//! Push/local-notification platform seam.
//!
//! The platform pushes "received" and "delayed" events into a
//! single-producer channel; the [`NotificationCenter`](crate::NotificationCenter)
//! drains it on its own thread. The sender is deliberately not `Clone`, so
//! the one platform subscription is the only producer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::error::PlatformError;
use crate::notification_log::NotificationCategory;

/// Delivery options for a scheduled local notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOptions {
    /// Android channel / iOS category.
    pub channel_id: String,
    /// Fire even in doze / low-power mode.
    pub allow_while_idle: bool,
    /// Deliver without sound or heads-up, e.g. inside quiet hours.
    pub silent: bool,
}

/// Local and push notification service provided by the OS.
pub trait NotificationPlatform {
    /// Short platform identifier sent with the push token, e.g. "android".
    fn platform_name(&self) -> &str;

    fn initialize(&mut self) -> Result<(), PlatformError>;

    /// Register for remote push; `None` when the device has no token.
    fn register_for_push_notifications(&mut self) -> Result<Option<String>, PlatformError>;

    /// Register a one-shot notification and return its platform id.
    fn schedule_local_notification(
        &mut self,
        title: &str,
        body: &str,
        data: &serde_json::Value,
        fire_at: DateTime<Utc>,
        options: &ScheduleOptions,
    ) -> Result<String, PlatformError>;

    /// Cancel a pending notification. Unknown ids must succeed.
    fn cancel_notification(&mut self, id: &str) -> Result<(), PlatformError>;
}

/// A notification the platform delivered to the app.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredNotification {
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub data: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

/// The platform's report of when a scheduled reminder actually fired.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub reminder_id: String,
    /// The payload handed to `schedule_local_notification`.
    pub data: serde_json::Value,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Received(DeliveredNotification),
    Delayed(DeliveryReport),
}

/// Producer half, held by the platform subscription.
#[derive(Debug)]
pub struct PlatformEventSender {
    tx: mpsc::UnboundedSender<PlatformEvent>,
}

impl PlatformEventSender {
    /// Queue an event. Returns `false` once the receiver is gone.
    pub fn send(&self, event: PlatformEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer half, drained synchronously.
#[derive(Debug)]
pub struct PlatformEventReceiver {
    rx: mpsc::UnboundedReceiver<PlatformEvent>,
}

impl PlatformEventReceiver {
    /// Next queued event without blocking.
    pub fn try_next(&mut self) -> Option<PlatformEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Every event queued so far.
    pub fn drain(&mut self) -> Vec<PlatformEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

/// Create the platform event channel.
pub fn event_channel() -> (PlatformEventSender, PlatformEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PlatformEventSender { tx }, PlatformEventReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received(title: &str) -> PlatformEvent {
        PlatformEvent::Received(DeliveredNotification {
            title: title.into(),
            body: String::new(),
            category: NotificationCategory::Info,
            data: serde_json::Value::Null,
            received_at: Utc::now(),
        })
    }

    #[test]
    fn drain_preserves_order() {
        let (tx, mut rx) = event_channel();
        assert!(tx.send(received("a")));
        assert!(tx.send(received("b")));

        let titles: Vec<_> = rx
            .drain()
            .into_iter()
            .map(|e| match e {
                PlatformEvent::Received(n) => n.title,
                PlatformEvent::Delayed(_) => unreachable!(),
            })
            .collect();
        assert_eq!(titles, ["a", "b"]);
        assert!(rx.try_next().is_none());
    }

    #[test]
    fn queued_events_survive_sender_drop() {
        let (tx, mut rx) = event_channel();
        tx.send(received("late"));
        drop(tx);
        assert_eq!(rx.drain().len(), 1);
        assert!(rx.try_next().is_none());
    }

    #[test]
    fn send_fails_after_receiver_drop() {
        let (tx, rx) = event_channel();
        drop(rx);
        assert!(!tx.send(received("lost")));
    }
}
