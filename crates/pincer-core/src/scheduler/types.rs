//! Scheduler types

use super::cron::CronSchedule;
use crate::identity::UserId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Shortest interval a job may use
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Longest interval a job may use (one year)
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Scheduler error type
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The job definition is unusable
    #[error("invalid job '{name}': {reason}")]
    InvalidJob {
        /// Job name
        name: String,
        /// What is wrong
        reason: String,
    },
    /// A job with this name already exists
    #[error("duplicate job: {0}")]
    DuplicateJob(String),
    /// The cron expression does not parse
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCron {
        /// Expression as written
        expression: String,
        /// What is wrong
        reason: String,
    },
    /// No job with this name
    #[error("job not found: {0}")]
    JobNotFound(String),
    /// The sink could not deliver a reply
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// When a job fires.
///
/// In configuration this is either `interval_secs = 3600` or
/// `cron = "0 9 * * 1-5"` next to the other job fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobTrigger {
    /// Fixed number of seconds between firings
    Interval {
        /// Seconds between firings
        interval_secs: u64,
    },
    /// Five-field cron expression, evaluated in UTC
    Cron {
        /// `minute hour day-of-month month day-of-week`
        cron: String,
    },
}

impl fmt::Display for JobTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTrigger::Interval { interval_secs } => write!(f, "every {}s", interval_secs),
            JobTrigger::Cron { cron } => write!(f, "cron '{}'", cron),
        }
    }
}

/// A message sent on behalf of a user on a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    /// Unique job name
    pub name: String,
    /// When it fires
    #[serde(flatten)]
    pub trigger: JobTrigger,
    /// Identity the message is sent as
    pub user_id: UserId,
    /// Text handed to the orchestrator
    pub message: String,
}

impl ScheduledJob {
    /// Create an interval job
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        user_id: impl Into<UserId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            trigger: JobTrigger::Interval {
                interval_secs: interval.as_secs(),
            },
            user_id: user_id.into(),
            message: message.into(),
        }
    }

    /// Create a cron job
    #[must_use]
    pub fn cron(
        name: impl Into<String>,
        expression: impl Into<String>,
        user_id: impl Into<UserId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            trigger: JobTrigger::Cron {
                cron: expression.into(),
            },
            user_id: user_id.into(),
            message: message.into(),
        }
    }

    /// Check the job before it is accepted
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| SchedulerError::InvalidJob {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("empty name"));
        }
        match &self.trigger {
            JobTrigger::Interval { interval_secs } => {
                let interval = Duration::from_secs(*interval_secs);
                if interval < MIN_INTERVAL {
                    return Err(invalid("interval must be at least 1 second"));
                }
                if interval > MAX_INTERVAL {
                    return Err(invalid("interval must be at most 365 days"));
                }
            }
            JobTrigger::Cron { cron } => {
                let schedule = CronSchedule::parse(cron).map_err(|e| invalid(&e.to_string()))?;
                if schedule.next_after(Utc::now()).is_none() {
                    return Err(invalid("cron expression never fires"));
                }
            }
        }
        if self.user_id.as_str().trim().is_empty() {
            return Err(invalid("empty user id"));
        }
        if self.message.trim().is_empty() {
            return Err(invalid("empty message"));
        }
        Ok(())
    }
}
