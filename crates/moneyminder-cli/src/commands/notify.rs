//! In-app notification commands for CLI.

use clap::Subcommand;
use moneyminder_core::{NewNotification, NotificationCategory};

use crate::local::open_center;

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Add a notification to the log
    Add {
        /// Notification title
        title: String,
        /// Notification message
        message: String,
        /// Category: success, error, warning or info
        #[arg(long = "type", default_value = "info")]
        category: String,
        /// Add it already read
        #[arg(long)]
        read: bool,
        /// Associated JSON data
        #[arg(long)]
        data: Option<String>,
    },
    /// List notifications, most recent first
    List {
        /// Print JSON instead of one line per notification
        #[arg(long)]
        json: bool,
    },
    /// Mark a notification read
    Read {
        /// Notification ID
        id: String,
    },
    /// Mark a notification unread
    Unread {
        /// Notification ID
        id: String,
    },
    /// Mark every notification read
    ReadAll,
    /// Delete a notification
    Remove {
        /// Notification ID
        id: String,
    },
    /// Delete all notifications
    Clear,
    /// Print the unread count
    Count,
}

fn parse_category(value: &str) -> Result<NotificationCategory, String> {
    match value {
        "success" => Ok(NotificationCategory::Success),
        "error" => Ok(NotificationCategory::Error),
        "warning" => Ok(NotificationCategory::Warning),
        "info" => Ok(NotificationCategory::Info),
        other => Err(format!("unknown notification type: {other}")),
    }
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut center, _events) = open_center()?;

    match action {
        NotifyAction::Add {
            title,
            message,
            category,
            read,
            data,
        } => {
            let payload = match data {
                Some(raw) => serde_json::from_str(&raw)?,
                None => serde_json::Value::Null,
            };
            let record = center.add_notification(
                NewNotification::new(title, message, parse_category(&category)?)
                    .with_read(read)
                    .with_payload(payload),
            );
            println!("Notification added: {}", record.id);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        NotifyAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(center.notifications())?);
            } else {
                for record in center.notifications() {
                    let mark = if record.read { " " } else { "*" };
                    println!("{mark} {}  {}: {}", record.id, record.title, record.message);
                }
                println!("{} unread", center.unread_count());
            }
        }
        NotifyAction::Read { id } => {
            if center.mark_as_read(&id) {
                println!("ok");
            } else {
                println!("no change: {id}");
            }
        }
        NotifyAction::Unread { id } => {
            if center.mark_as_unread(&id) {
                println!("ok");
            } else {
                println!("no change: {id}");
            }
        }
        NotifyAction::ReadAll => {
            let changed = center.mark_all_as_read();
            println!("{changed} marked read");
        }
        NotifyAction::Remove { id } => match center.remove_notification(&id) {
            Some(_) => println!("Notification removed: {id}"),
            None => println!("Notification not found: {id}"),
        },
        NotifyAction::Clear => {
            center.clear_all();
            println!("notifications cleared");
        }
        NotifyAction::Count => println!("{}", center.unread_count()),
    }

    if let Some(e) = &center.persist_status().last_error {
        eprintln!("warning: notifications not saved: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_category_is_strict() {
        assert_eq!(parse_category("warning").unwrap(), NotificationCategory::Warning);
        assert!(parse_category("Warning").is_err());
        assert!(parse_category("promo").is_err());
    }
}
