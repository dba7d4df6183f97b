//! Run settings.
//!
//! Everything here comes from the command line; there is no config file.
//! Defaults live in [`crate::constants`].

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CALENDAR_NAME, DEFAULT_OUTPUT_FILE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SESSION_MINUTES, DEFAULT_TIMEZONE, MAX_BATCH_SIZE,
};
use crate::error::InvalidInputError;

/// What to do when a batch request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failed batch. A partial calendar is worse than none.
    #[default]
    Abort,
    /// Skip the failed batch, keep going, and report it.
    BestEffort,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub batch_size: usize,
    pub request_timeout: Duration,
    /// Zone used when the site does not advertise one
    pub default_timezone: Tz,
    /// Forces the event zone and skips the site lookup
    pub timezone_override: Option<Tz>,
    pub default_duration: chrono::Duration,
    pub failure_policy: FailurePolicy,
    pub output: PathBuf,
    pub calendar_name: String,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_timezone: DEFAULT_TIMEZONE,
            timezone_override: None,
            default_duration: chrono::Duration::minutes(DEFAULT_SESSION_MINUTES),
            failure_policy: FailurePolicy::Abort,
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            calendar_name: DEFAULT_CALENDAR_NAME.to_string(),
            color: false,
        }
    }
}

impl Settings {
    /// Reject values the API or the mapper cannot work with.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(InvalidInputError::new(format!(
                "batch size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(InvalidInputError::new("request timeout must be greater than zero"));
        }
        if self.default_duration <= chrono::Duration::zero() {
            return Err(InvalidInputError::new(
                "default session duration must be greater than zero",
            ));
        }
        Ok(())
    }
}
