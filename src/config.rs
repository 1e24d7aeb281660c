use crate::event_log::SheetSchema;
use crate::stats::InitialVisitors;
use chrono::FixedOffset;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub password: String,
    pub sheet_path: PathBuf,
    pub utc_offset: FixedOffset,
    pub cache_ttl: Duration,
    pub initial_visitors: InitialVisitors,
    pub schema: SheetSchema,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let password = lookup("COUNTER_PASSWORD")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("COUNTER_PASSWORD"))?;

        let sheet_path = lookup("COUNTER_SHEET_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("COUNTER_SHEET_PATH"))?;

        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| invalid("PORT", &value, "expected a port number"))?,
        };

        let offset_hours = match lookup("COUNTER_UTC_OFFSET_HOURS") {
            None => DEFAULT_UTC_OFFSET_HOURS,
            Some(value) => value
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|hours| (-23..=23).contains(hours))
                .ok_or_else(|| {
                    invalid("COUNTER_UTC_OFFSET_HOURS", &value, "expected whole hours in -23..=23")
                })?,
        };
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            invalid("COUNTER_UTC_OFFSET_HOURS", &offset_hours.to_string(), "offset out of range")
        })?;

        let cache_ttl = match lookup("COUNTER_CACHE_TTL_SECS") {
            None => Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| invalid("COUNTER_CACHE_TTL_SECS", &value, "expected seconds"))?,
        };

        let initial_visitors = match lookup("COUNTER_COUNT_INITIAL").as_deref().map(str::trim) {
            None | Some("true") | Some("1") => InitialVisitors::Count,
            Some("false") | Some("0") => InitialVisitors::Skip,
            Some(other) => {
                return Err(invalid("COUNTER_COUNT_INITIAL", other, "expected true or false"));
            }
        };

        let schema = match lookup("COUNTER_HEADERS").as_deref().map(str::trim) {
            None | Some("en") => SheetSchema::english(),
            Some("ja") => SheetSchema::japanese(),
            Some(other) => return Err(invalid("COUNTER_HEADERS", other, "expected en or ja")),
        };

        Ok(Self {
            port,
            password,
            sheet_path,
            utc_offset,
            cache_ttl,
            initial_visitors,
            schema,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    }
}
