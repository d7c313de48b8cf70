use std::env::VarError;
use std::env;

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::LOG_CONFIG_PATH;

pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";

pub const VAR_BACKEND_URL: &str = "BACKEND_URL";
pub const VAR_SESSION_PATH: &str = "SESSION_PATH";
pub const VAR_PLATFORM: &str = "PLATFORM";
pub const VAR_REMINDER_INTERVAL_MINUTES: &str = "REMINDER_INTERVAL_MINUTES";
pub const VAR_DELIVERY_URL: &str = "DELIVERY_URL";
pub const VAR_WS_URL: &str = "WS_URL";
pub const VAR_DOCUMENTS_DIR: &str = "DOCUMENTS_DIR";

pub const DEFAULT_SESSION_PATH: &str = "session.json";
pub const DEFAULT_DOCUMENTS_DIR: &str = "documents";
pub const DEFAULT_REMINDER_INTERVAL_MINUTES: u64 = 30;

pub fn check_environment_vars() -> Result<(), VarError> {
    env::var(VAR_BACKEND_URL)?;
    Ok(())
}

/// Reads an optional variable, treating an empty value as unset.
pub fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn reminder_interval_minutes() -> u64 {
    optional_var(VAR_REMINDER_INTERVAL_MINUTES)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_REMINDER_INTERVAL_MINUTES)
}

pub fn init_logging() {
    if log4rs::init_file(LOG_CONFIG_PATH, Default::default()).is_ok() {
        return;
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("Failed to initialise logging: {e}");
            }
        }
        Err(e) => eprintln!("Invalid fallback logging config: {e}"),
    }
}

/// Last few characters of a token, safe to print in logs.
pub fn get_short_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect()
}
