//! Scheduler - interval and cron jobs routed through the orchestrator
//!
//! A job fires by calling [`Orchestrator::handle_message`] exactly like a
//! transport would, so it passes the same security gate and budget as the
//! user it runs as. The reply goes to a [`JobSink`].
//!
//! [`Orchestrator::handle_message`]: crate::orchestrator::Orchestrator::handle_message
//!
//! # Example
//!
//! ```ignore
//! let engine = SchedulerEngine::new(orchestrator, Arc::new(LogSink), SchedulerConfig::default());
//! engine
//!     .add_job(ScheduledJob::new("weather", Duration::from_secs(3600), "42", "search weather today"))
//!     .await?;
//! engine.run(shutdown_token).await;
//! ```

mod cron;
mod engine;
mod types;

pub use cron::CronSchedule;
pub use engine::{JobSink, LogSink, SchedulerConfig, SchedulerEngine};
pub use types::{
    JobTrigger, Result as SchedulerResult, ScheduledJob, SchedulerError, MAX_INTERVAL,
    MIN_INTERVAL,
};
