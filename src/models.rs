use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;

use crate::history::HistoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Up,
    Down,
}

/// `true` for any 2xx or 3xx status.
pub fn is_up(status_code: u16) -> bool {
    (200..400).contains(&status_code)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// A response arrived; says nothing about whether the code is healthy.
    Success { status_code: u16, latency: Duration },
    TransportFailure { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub timestamp: DateTime<Local>,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn success(status_code: u16, latency: Duration) -> Self {
        Self {
            timestamp: Local::now(),
            outcome: ProbeOutcome::Success { status_code, latency },
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            outcome: ProbeOutcome::TransportFailure { reason: reason.into() },
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.outcome {
            ProbeOutcome::Success { status_code, .. } => Some(status_code),
            ProbeOutcome::TransportFailure { .. } => None,
        }
    }

    pub fn latency(&self) -> Option<Duration> {
        match self.outcome {
            ProbeOutcome::Success { latency, .. } => Some(latency),
            ProbeOutcome::TransportFailure { .. } => None,
        }
    }

    pub fn latency_ms(&self) -> Option<f64> {
        self.latency().map(|l| l.as_secs_f64() * 1000.0)
    }

    pub fn is_up(&self) -> bool {
        self.status_code().is_some_and(is_up)
    }

    pub fn status(&self) -> Status {
        if self.is_up() { Status::Up } else { Status::Down }
    }

    pub fn error_detail(&self) -> Option<String> {
        match &self.outcome {
            ProbeOutcome::Success { status_code, .. } if !is_up(*status_code) => {
                Some(format!("HTTP {status_code}"))
            }
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::TransportFailure { reason } => Some(reason.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalDimensions {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalDimensions {
    /// Used when the terminal size cannot be read.
    pub const FALLBACK: Self = Self { columns: 80, rows: 24 };

    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

pub struct MonitorState {
    pub history: Arc<HistoryStore>,
    pub last_dimensions: Option<TerminalDimensions>,
    pub last_check: Option<DateTime<Local>>,
    pub last_check_instant: Option<tokio::time::Instant>,
}

impl MonitorState {
    pub fn new(endpoints: &[String], history_size: usize) -> Self {
        Self {
            history: Arc::new(HistoryStore::new(endpoints, history_size)),
            last_dimensions: None,
            last_check: None,
            last_check_instant: None,
        }
    }

    pub fn mark_checked(&mut self, at: tokio::time::Instant) {
        self.last_check = Some(Local::now());
        self.last_check_instant = Some(at);
    }
}
