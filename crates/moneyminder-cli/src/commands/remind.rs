//! Reminder commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use moneyminder_core::{
    DeliveredNotification, DeliveryReport, NotificationCategory, PlatformEvent, ReminderRequest,
};

use crate::local::open_center;

#[derive(Subcommand)]
pub enum RemindAction {
    /// Schedule a one-shot reminder
    Schedule {
        /// Reminder title
        title: String,
        /// Reminder body
        body: String,
        /// When to fire (RFC 3339, "YYYY-MM-DD HH:MM" UTC, or "YYYY-MM-DD")
        when: String,
        /// Associated JSON data, e.g. '{"debtId": "d-1"}'
        #[arg(long)]
        data: Option<String>,
    },
    /// Cancel a pending reminder
    Cancel {
        /// Reminder ID
        id: String,
    },
    /// List pending reminders
    List,
    /// Deliver a pending reminder now, as the platform would
    Fire {
        /// Reminder ID
        id: String,
        /// Delivery time (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(action: RemindAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut center, events) = open_center()?;

    match action {
        RemindAction::Schedule {
            title,
            body,
            when,
            data,
        } => {
            let payload = match data {
                Some(raw) => serde_json::from_str(&raw)?,
                None => serde_json::Value::Null,
            };
            let scheduled =
                center.schedule_reminder(ReminderRequest::new(title, body, when).with_payload(payload))?;
            if let Some(adjustment) = scheduled.adjustment {
                eprintln!("warning: requested time was {adjustment:?}, moved to {}", scheduled.fire_at);
            }
            println!("Reminder scheduled: {}", scheduled.id);
            println!("{}", serde_json::to_string_pretty(&scheduled)?);
        }
        RemindAction::Cancel { id } => {
            center.cancel_reminder(&id)?;
            println!("ok");
        }
        RemindAction::List => {
            println!("{}", serde_json::to_string_pretty(center.platform().pending())?);
        }
        RemindAction::Fire { id, at } => {
            let fired_at = match at {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc),
                None => Utc::now(),
            };
            let reminder = center
                .platform_mut()
                .take(&id)?
                .ok_or(format!("Reminder not found: {id}"))?;

            events.send(PlatformEvent::Received(DeliveredNotification {
                title: reminder.title,
                body: reminder.body,
                category: NotificationCategory::Info,
                data: reminder.data.clone(),
                received_at: fired_at,
            }));
            events.send(PlatformEvent::Delayed(DeliveryReport {
                reminder_id: reminder.id,
                data: reminder.data,
                fired_at,
            }));
            center.process_events();

            println!("Reminder delivered: {id}");
            if center.drift_warned() {
                println!("drift warning issued: reminder fired late");
            }
        }
    }
    Ok(())
}
