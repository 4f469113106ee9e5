//! Scheduler execution engine
//!
//! Checks for due jobs on a fixed tick, runs each firing in its own task
//! and waits for in-flight firings on shutdown.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::cron::CronSchedule;
use super::types::{JobTrigger, Result, ScheduledJob, SchedulerError};
use crate::orchestrator::Orchestrator;

#[cfg(test)]
mod tests;

/// Where job replies go
#[async_trait::async_trait]
pub trait JobSink: Send + Sync {
    /// Deliver the reply produced by one firing
    async fn deliver(&self, job: &ScheduledJob, reply: &str) -> Result<()>;
}

/// Sink that only logs replies
pub struct LogSink;

#[async_trait::async_trait]
impl JobSink for LogSink {
    async fn deliver(&self, job: &ScheduledJob, reply: &str) -> Result<()> {
        info!(job = %job.name, user = %job.user_id, chars = reply.chars().count(), "Scheduled job replied");
        Ok(())
    }
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often due jobs are checked
    pub check_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(1),
        }
    }
}

impl SchedulerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the check interval
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }
}

/// Next-firing arithmetic for one job
enum Cadence {
    Every(Duration),
    Cron {
        schedule: CronSchedule,
        next_run: DateTime<Utc>,
    },
}

impl Cadence {
    fn for_job(job: &ScheduledJob) -> Result<Self> {
        Ok(match &job.trigger {
            JobTrigger::Interval { interval_secs } => {
                Cadence::Every(Duration::from_secs(*interval_secs))
            }
            JobTrigger::Cron { cron } => Cadence::Cron {
                schedule: CronSchedule::parse(cron)?,
                next_run: Utc::now(),
            },
        })
    }

    /// The instant of the firing after `now`, or `None` if there is none
    fn advance(&mut self, now: Instant) -> Option<Instant> {
        match self {
            Cadence::Every(interval) => now.checked_add(*interval),
            Cadence::Cron { schedule, next_run } => {
                // Cron runs on the wall clock; never schedule the same minute twice.
                let wall = Utc::now();
                *next_run = schedule.next_after((*next_run).max(wall))?;
                let wait = (*next_run - wall).to_std().unwrap_or(Duration::ZERO);
                now.checked_add(wait)
            }
        }
    }
}

/// Clears the in-flight flag when a firing ends, even by panic
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct JobState {
    job: ScheduledJob,
    cadence: Cadence,
    /// `None` once the job has no further firings
    next_due: Option<Instant>,
    running: Arc<AtomicBool>,
}

/// Scheduler engine for interval and cron jobs
pub struct SchedulerEngine {
    orchestrator: Arc<Orchestrator>,
    sink: Arc<dyn JobSink>,
    config: SchedulerConfig,
    jobs: RwLock<HashMap<String, JobState>>,
}

impl SchedulerEngine {
    /// Create a new scheduler engine
    #[must_use]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        sink: Arc<dyn JobSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            orchestrator,
            sink,
            config,
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Add a job. An interval job first fires one interval from now, a
    /// cron job at its next matching minute.
    pub async fn add_job(&self, job: ScheduledJob) -> Result<()> {
        job.validate()?;

        let mut cadence = Cadence::for_job(&job)?;
        let next_due = cadence
            .advance(Instant::now())
            .ok_or_else(|| SchedulerError::InvalidJob {
                name: job.name.clone(),
                reason: "no upcoming firing".to_string(),
            })?;

        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.name) {
            return Err(SchedulerError::DuplicateJob(job.name));
        }

        info!(job = %job.name, trigger = %job.trigger, user = %job.user_id, "Scheduled job added");
        jobs.insert(
            job.name.clone(),
            JobState {
                cadence,
                next_due: Some(next_due),
                running: Arc::new(AtomicBool::new(false)),
                job,
            },
        );
        Ok(())
    }

    /// Remove a job by name. An in-flight firing still completes.
    pub async fn remove_job(&self, name: &str) -> Result<ScheduledJob> {
        self.jobs
            .write()
            .await
            .remove(name)
            .map(|state| state.job)
            .ok_or_else(|| SchedulerError::JobNotFound(name.to_string()))
    }

    /// All jobs, sorted by name
    pub async fn list_jobs(&self) -> Vec<ScheduledJob> {
        let mut jobs: Vec<ScheduledJob> = self
            .jobs
            .read()
            .await
            .values()
            .map(|state| state.job.clone())
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        jobs
    }

    /// Start the scheduler loop
    pub async fn run(&self, shutdown: CancellationToken) {
        let jobs = self.jobs.read().await.len();
        info!(jobs, "Scheduler engine starting");
        let mut running = JoinSet::new();
        let mut ticker = tokio::time::interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.fire_due(&mut running).await;
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Scheduled job task failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Scheduler engine shutting down");
                    break;
                }
            }
        }

        while let Some(joined) = running.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Scheduled job task failed");
            }
        }
        info!("Scheduler engine stopped");
    }

    async fn fire_due(&self, running: &mut JoinSet<()>) {
        let now = Instant::now();
        let mut jobs = self.jobs.write().await;

        for state in jobs
            .values_mut()
            .filter(|s| s.next_due.is_some_and(|due| due <= now))
        {
            state.next_due = state.cadence.advance(now);
            if state.next_due.is_none() {
                warn!(job = %state.job.name, "Scheduled job has no further firings");
            }

            if state.running.swap(true, Ordering::SeqCst) {
                warn!(job = %state.job.name, "Previous firing still running, skipping");
                continue;
            }

            debug!(job = %state.job.name, "Firing scheduled job");
            let job = state.job.clone();
            let guard = RunningGuard(Arc::clone(&state.running));
            let orchestrator = Arc::clone(&self.orchestrator);
            let sink = Arc::clone(&self.sink);

            running.spawn(async move {
                let _guard = guard;
                let reply = orchestrator.handle_message(&job.user_id, &job.message).await;
                if let Err(e) = sink.deliver(&job, &reply).await {
                    warn!(job = %job.name, error = %e, "Failed to deliver scheduled reply");
                }
            });
        }
    }
}
