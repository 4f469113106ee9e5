//! Background task startup functions
//!
//! Contains functions to start the scheduler and the cleanup task.

use super::config::SchedulerAppConfig;
use anyhow::{Context, Result};
use pincer_core::{JobSink, Orchestrator, SchedulerConfig, SchedulerEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How often idle rate windows and history locks are dropped
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Start the interval scheduler, or `None` when it is disabled
pub async fn start_scheduler(
    config: &SchedulerAppConfig,
    orchestrator: &Arc<Orchestrator>,
    sink: Arc<dyn JobSink>,
    shutdown: CancellationToken,
) -> Result<Option<JoinHandle<()>>> {
    if !config.enabled {
        info!("Scheduler disabled by configuration");
        return Ok(None);
    }

    let engine = Arc::new(SchedulerEngine::new(
        Arc::clone(orchestrator),
        sink,
        SchedulerConfig::default(),
    ));
    for job in &config.jobs {
        engine
            .add_job(job.clone())
            .await
            .with_context(|| format!("Failed to schedule job '{}'", job.name))?;
    }

    info!(jobs = config.jobs.len(), "Scheduler started");
    Ok(Some(tokio::spawn(async move {
        engine.run(shutdown).await;
    })))
}

/// Start the cleanup background task
pub fn start_cleanup_task(
    orchestrator: &Arc<Orchestrator>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let orchestrator = Arc::clone(orchestrator);
    info!(interval_secs = interval.as_secs(), "Cleanup task started");
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let removed = orchestrator.cleanup();
                    if removed > 0 {
                        debug!(removed, "Cleanup: dropped idle per-user state");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Cleanup task shutting down");
                    break;
                }
            }
        }
    })
}
