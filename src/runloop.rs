//! Drives check cycles and redraws.
//!
//! ```text
//! Init -> Checking -> Displaying -> Waiting -+-> Checking    (interval elapsed)
//!                                            +-> Displaying  (terminal resized)
//! any state -> Stopped on shutdown
//! ```

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::engine::Dispatcher;
use crate::models::MonitorState;
use crate::prober::Prober;
use crate::render::{render, Header};
use crate::resize::{DimensionSource, ResizeWatcher};
use crate::terminal::DisplaySink;

/// How often the waiting loop re-evaluates its due conditions.
pub const TICK: Duration = Duration::from_millis(500);

fn ticker() -> tokio::time::Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Checking,
    Displaying,
    Waiting,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Check,
    Redraw,
    Idle,
}

#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// A due check wins over a resize; the check is followed by a redraw anyway.
    pub fn next_action(&self, last_check: Option<Instant>, now: Instant, resized: bool) -> Action {
        let due = last_check.is_none_or(|at| now.saturating_duration_since(at) >= self.interval);
        if due {
            Action::Check
        } else if resized {
            Action::Redraw
        } else {
            Action::Idle
        }
    }
}

pub struct RunLoop<P: Prober, D, S> {
    endpoints: Arc<[String]>,
    timeout: Duration,
    header: Header,
    scheduler: Scheduler,
    dispatcher: Arc<Dispatcher<P>>,
    state: MonitorState,
    resize: ResizeWatcher,
    dimensions: D,
    sink: S,
    wake: Arc<Notify>,
    phase: Phase,
}

impl<P, D, S> RunLoop<P, D, S>
where
    P: Prober,
    D: DimensionSource,
    S: DisplaySink,
{
    pub fn new(config: &MonitorConfig, prober: P, dimensions: D, sink: S) -> Self {
        let state = MonitorState::new(&config.websites, config.history_size);
        let dispatcher = Dispatcher::new(prober, Arc::clone(&state.history), config.max_concurrency);
        Self {
            endpoints: state.history.endpoints().cloned().collect(),
            timeout: config.timeout(),
            header: Header {
                last_check: None,
                check_interval: config.check_interval(),
                history_size: state.history.capacity(),
            },
            scheduler: Scheduler::new(config.check_interval()),
            dispatcher: Arc::new(dispatcher),
            state,
            resize: ResizeWatcher::new(),
            dimensions,
            sink,
            wake: Arc::new(Notify::new()),
            phase: Phase::Init,
        }
    }

    /// Notified by whoever sees terminal events, so a resize is handled
    /// before the next tick.
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!(
            endpoints = self.endpoints.len(),
            interval_secs = self.header.check_interval.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            history_size = self.header.history_size,
            "Monitor started"
        );

        loop {
            self.phase = match self.phase {
                Phase::Init => {
                    self.state.last_dimensions = Some(self.dimensions.dimensions());
                    Phase::Checking
                }
                Phase::Checking => self.check(&shutdown).await,
                Phase::Displaying => {
                    self.display().await;
                    Phase::Waiting
                }
                Phase::Waiting => self.wait(&shutdown).await,
                Phase::Stopped => break,
            };
        }

        info!(
            last_check = ?self.state.last_check.map(|t| t.to_rfc3339()),
            last_size = ?self.state.last_dimensions.map(|d| (d.columns, d.rows)),
            "Monitor stopped"
        );
        Ok(())
    }

    async fn check(&mut self, shutdown: &CancellationToken) -> Phase {
        self.state.mark_checked(Instant::now());
        self.header.last_check = self.state.last_check;

        let dispatcher = Arc::clone(&self.dispatcher);
        let endpoints = Arc::clone(&self.endpoints);
        let timeout = self.timeout;
        let cycle = async move { dispatcher.run_cycle(&endpoints, timeout).await };
        tokio::pin!(cycle);

        let wake = Arc::clone(&self.wake);
        let mut ticker = ticker();

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("Abandoning in-flight cycle");
                    return Phase::Stopped;
                }
                _summary = &mut cycle => return Phase::Displaying,
                _ = ticker.tick() => self.redraw_if_resized().await,
                () = wake.notified() => self.redraw_if_resized().await,
            }
        }
    }

    async fn wait(&mut self, shutdown: &CancellationToken) -> Phase {
        let wake = Arc::clone(&self.wake);
        let mut ticker = ticker();

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return Phase::Stopped,
                _ = ticker.tick() => {}
                () = wake.notified() => {}
            }

            let resized = self.sample_resize();
            match self.scheduler.next_action(self.state.last_check_instant, Instant::now(), resized) {
                Action::Check => return Phase::Checking,
                Action::Redraw => return Phase::Displaying,
                Action::Idle => {}
            }
        }
    }

    /// Samples the terminal and reports whether it differs from the last render.
    fn sample_resize(&mut self) -> bool {
        let current = self.dimensions.dimensions();
        self.state.last_dimensions = Some(current);
        let changed = self.resize.has_changed(current);
        if changed {
            if let Some(previous) = self.resize.last_rendered() {
                info!(
                    from = %format!("{}x{}", previous.columns, previous.rows),
                    to = %format!("{}x{}", current.columns, current.rows),
                    "Terminal resized"
                );
            }
        }
        changed
    }

    /// Mid-cycle redraws only replace an existing frame; the first frame
    /// waits for the first cycle to finish.
    async fn redraw_if_resized(&mut self) {
        if self.resize.last_rendered().is_some() && self.sample_resize() {
            self.display().await;
        }
    }

    async fn display(&mut self) {
        let dimensions = self.dimensions.dimensions();
        self.state.last_dimensions = Some(dimensions);
        let snapshot = self.state.history.snapshot().await;
        let dashboard = render(&snapshot, dimensions, &self.header);
        match self.sink.show(&dashboard) {
            Ok(()) => self.resize.mark_rendered(dimensions),
            Err(e) => {
                // The screen may be blank now; force a redraw on the next tick.
                self.resize.invalidate();
                error!(error = %e, "Failed to render dashboard");
            }
        }
    }
}
