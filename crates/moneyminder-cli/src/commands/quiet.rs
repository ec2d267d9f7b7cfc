//! Quiet hours check for CLI.

use chrono::Local;
use clap::Subcommand;
use moneyminder_core::{is_quiet, TimeOfDay};

use crate::local::open_center;

#[derive(Subcommand)]
pub enum QuietAction {
    /// Check whether a time falls inside the configured quiet hours
    Check {
        /// Time of day as HH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(action: QuietAction) -> Result<(), Box<dyn std::error::Error>> {
    let (center, _events) = open_center()?;
    let window = center.preferences().quiet_hours;

    match action {
        QuietAction::Check { at } => {
            let at = match at {
                Some(raw) => raw.parse::<TimeOfDay>()?,
                None => TimeOfDay::of(&Local::now()),
            };
            if !window.enabled {
                println!("quiet hours disabled ({}-{})", window.start, window.end);
            } else if is_quiet(at, &window) {
                println!("quiet at {at} ({}-{})", window.start, window.end);
            } else {
                println!("not quiet at {at} ({}-{})", window.start, window.end);
            }
        }
    }
    Ok(())
}
