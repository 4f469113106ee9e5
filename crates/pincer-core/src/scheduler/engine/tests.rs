use super::*;
use crate::orchestrator::OrchestratorConfig;
use crate::security::{AllowList, RateLimitConfig, SecurityGate};
use pincer_tools::{register_builtins, ToolRegistry};
use std::sync::Mutex;

#[derive(Default)]
struct CollectSink {
    replies: Mutex<Vec<(String, String)>>,
}

impl CollectSink {
    fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobSink for CollectSink {
    async fn deliver(&self, job: &ScheduledJob, reply: &str) -> Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((job.name.clone(), reply.to_string()));
        Ok(())
    }
}

fn orchestrator(max_requests: u32) -> Arc<Orchestrator> {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, None).unwrap();
    let gate = Arc::new(SecurityGate::new(
        AllowList::Unrestricted,
        RateLimitConfig::per_minute(max_requests),
    ));
    Arc::new(Orchestrator::new(gate, Arc::new(registry), OrchestratorConfig::default()).unwrap())
}

fn engine_with(max_requests: u32, sink: Arc<CollectSink>) -> Arc<SchedulerEngine> {
    Arc::new(SchedulerEngine::new(
        orchestrator(max_requests),
        sink,
        SchedulerConfig::default(),
    ))
}

fn job(name: &str, secs: u64, message: &str) -> ScheduledJob {
    ScheduledJob::new(name, Duration::from_secs(secs), "42", message)
}

#[tokio::test]
async fn test_add_list_remove() {
    let engine = engine_with(10, Arc::new(CollectSink::default()));
    engine.add_job(job("weather", 3600, "search weather")).await.unwrap();
    engine.add_job(job("answer", 60, "calc 6*7")).await.unwrap();

    let names: Vec<String> = engine.list_jobs().await.into_iter().map(|j| j.name).collect();
    assert_eq!(names, vec!["answer", "weather"]);

    let removed = engine.remove_job("weather").await.unwrap();
    assert_eq!(removed.message, "search weather");
    assert!(matches!(
        engine.remove_job("weather").await,
        Err(SchedulerError::JobNotFound(_))
    ));
    assert_eq!(engine.list_jobs().await.len(), 1);
}

#[tokio::test]
async fn test_invalid_jobs_rejected() {
    let engine = engine_with(10, Arc::new(CollectSink::default()));
    assert!(matches!(
        engine.add_job(job("fast", 0, "calc 1+1")).await,
        Err(SchedulerError::InvalidJob { .. })
    ));
    assert!(matches!(
        engine.add_job(job("silent", 10, "  ")).await,
        Err(SchedulerError::InvalidJob { .. })
    ));
    assert!(matches!(
        engine.add_job(job("", 10, "calc 1+1")).await,
        Err(SchedulerError::InvalidJob { .. })
    ));

    assert!(matches!(
        engine.add_job(job("forever", u64::MAX, "calc 1+1")).await,
        Err(SchedulerError::InvalidJob { .. })
    ));
    assert!(matches!(
        engine
            .add_job(ScheduledJob::cron("bad", "every day", "42", "calc 1+1"))
            .await,
        Err(SchedulerError::InvalidJob { .. })
    ));

    engine.add_job(job("dup", 10, "calc 1+1")).await.unwrap();
    assert!(matches!(
        engine.add_job(job("dup", 20, "calc 2+2")).await,
        Err(SchedulerError::DuplicateJob(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_jobs_fire_through_orchestrator() {
    let sink = Arc::new(CollectSink::default());
    let engine = engine_with(10, sink.clone());
    engine.add_job(job("sum", 5, "calc 2+2")).await.unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let engine = Arc::clone(&engine);
        let shutdown = shutdown.clone();
        async move { engine.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_millis(11_500)).await;
    shutdown.cancel();
    handle.await.unwrap();

    let replies = sink.replies();
    assert_eq!(replies.len(), 2);
    assert!(replies.iter().all(|(name, reply)| name == "sum" && reply == "4"));
}

#[tokio::test(start_paused = true)]
async fn test_jobs_share_the_user_budget() {
    let sink = Arc::new(CollectSink::default());
    let engine = engine_with(1, sink.clone());
    engine.add_job(job("sum", 2, "calc 2+2")).await.unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let engine = Arc::clone(&engine);
        let shutdown = shutdown.clone();
        async move { engine.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_millis(6_500)).await;
    shutdown.cancel();
    handle.await.unwrap();

    let replies = sink.replies();
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0].1, "4");
    assert!(replies[1].1.contains("Too many requests"));
    assert!(replies[2].1.contains("Too many requests"));
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let engine = engine_with(10, Arc::new(CollectSink::default()));
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), engine.run(shutdown))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cron_job_fires_on_the_minute() {
    let sink = Arc::new(CollectSink::default());
    let engine = engine_with(10, sink.clone());
    engine
        .add_job(ScheduledJob::cron("minutely", "* * * * *", "42", "calc 2+3"))
        .await
        .unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let engine = Arc::clone(&engine);
        let shutdown = shutdown.clone();
        async move { engine.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_secs(61)).await;
    shutdown.cancel();
    handle.await.unwrap();

    let replies = sink.replies();
    assert!(!replies.is_empty());
    assert!(replies.iter().all(|(name, reply)| name == "minutely" && reply == "5"));
}

/// Panics on the first delivery, collects afterwards
#[derive(Default)]
struct FlakySink {
    calls: std::sync::atomic::AtomicUsize,
    inner: CollectSink,
}

#[async_trait::async_trait]
impl JobSink for FlakySink {
    async fn deliver(&self, job: &ScheduledJob, reply: &str) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("sink exploded");
        }
        self.inner.deliver(job, reply).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_job_keeps_firing_after_a_panicked_run() {
    let sink = Arc::new(FlakySink::default());
    let engine = Arc::new(SchedulerEngine::new(
        orchestrator(10),
        sink.clone(),
        SchedulerConfig::default(),
    ));
    engine.add_job(job("sum", 5, "calc 2+2")).await.unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let engine = Arc::clone(&engine);
        let shutdown = shutdown.clone();
        async move { engine.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_millis(11_500)).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    assert_eq!(sink.inner.replies(), vec![("sum".to_string(), "4".to_string())]);
}
