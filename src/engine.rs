use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::history::HistoryStore;
use crate::models::{ProbeResult, Status};
use crate::prober::Prober;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleSummary {
    pub total: usize,
    pub up: usize,
    pub down: usize,
    /// Probe tasks that died before reporting; their endpoints keep their
    /// previous history.
    pub lost: usize,
    pub elapsed: Duration,
}

pub struct Dispatcher<P: Prober> {
    prober: Arc<P>,
    history: Arc<HistoryStore>,
    concurrency_limiter: Arc<Semaphore>,
}

impl<P: Prober> Dispatcher<P> {
    pub fn new(prober: P, history: Arc<HistoryStore>, max_concurrency: usize) -> Self {
        Self {
            prober: Arc::new(prober),
            history,
            concurrency_limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Probes every endpoint concurrently and waits for all of them.
    ///
    /// Each result is recorded as soon as its own probe finishes. Dropping
    /// the returned future aborts the probes still in flight; whatever was
    /// already recorded stays.
    pub async fn run_cycle(&self, endpoints: &[String], timeout: Duration) -> CycleSummary {
        let start_time = Instant::now();
        let mut tasks = JoinSet::new();

        for endpoint in endpoints {
            let prober = Arc::clone(&self.prober);
            let history = Arc::clone(&self.history);
            let limiter = Arc::clone(&self.concurrency_limiter);
            let endpoint = endpoint.clone();

            tasks.spawn(async move {
                let _permit = limiter.acquire_owned().await.ok();
                let result = prober.probe(&endpoint, timeout).await;
                let up = result.is_up();
                process_result(&history, &endpoint, result).await;
                up
            });
        }

        let mut summary = CycleSummary { total: endpoints.len(), ..CycleSummary::default() };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => summary.up += 1,
                Ok(false) => summary.down += 1,
                Err(e) => {
                    summary.lost += 1;
                    error!(error = %e, "Probe task failed");
                }
            }
        }
        summary.elapsed = start_time.elapsed();

        info!(
            total = summary.total,
            up = summary.up,
            down = summary.down,
            lost = summary.lost,
            "Cycle completed in {:.2}s",
            summary.elapsed.as_secs_f64()
        );
        summary
    }
}

async fn process_result(history: &HistoryStore, endpoint: &str, result: ProbeResult) {
    let old_status = history.latest(endpoint).await.map(|r| r.status());
    let new_status = result.status();

    info!(
        endpoint,
        up = result.is_up(),
        code = result.status_code(),
        latency_ms = result.latency_ms(),
        error = result.error_detail().as_deref(),
        "Probe finished"
    );
    history.record(endpoint, result).await;

    match old_status {
        Some(old) if old != new_status => {
            let msg = format!("[CHANGE] {endpoint} {old:?} -> {new_status:?}");
            if new_status == Status::Down { error!("{}", msg); } else { warn!("{}", msg); }
        }
        None if new_status == Status::Down => error!("[CHANGE] {endpoint} is down on first check"),
        _ => {}
    }
}
