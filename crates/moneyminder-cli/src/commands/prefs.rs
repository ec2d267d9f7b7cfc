//! Notification preference commands for CLI.

use clap::Subcommand;

use crate::local::open_center;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print all preferences as JSON
    List,
    /// Get one preference
    Get {
        /// camelCase key (e.g. "pushEnabled", "quietHours.start")
        key: String,
    },
    /// Set one preference (saved immediately)
    Set {
        /// camelCase key
        key: String,
        /// New value
        value: String,
    },
    /// Reset preferences to defaults
    Reset,
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut center, _events) = open_center()?;

    match action {
        PrefsAction::List => {
            println!("{}", serde_json::to_string_pretty(center.preferences())?);
        }
        PrefsAction::Get { key } => match center.preferences().get(&key) {
            Some(value) => println!("{value}"),
            None => {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            }
        },
        PrefsAction::Set { key, value } => {
            center.set_preference(&key, &value)?;
            println!("ok");
        }
        PrefsAction::Reset => {
            center.reset_preferences();
            println!("preferences reset to defaults");
        }
    }

    if let Some(e) = &center.preferences_persist_status().last_error {
        eprintln!("warning: preferences not saved: {e}");
    }
    Ok(())
}
