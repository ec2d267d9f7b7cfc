pub mod config;
pub mod notify;
pub mod prefs;
pub mod quiet;
pub mod remind;
