use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::refresh::RefreshPipeline;
use crate::storage::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
}

/// Fixed-period trigger for the refresh pipeline.
///
/// Cycles run inline in the timer loop, so two cycles never overlap. A cycle
/// that outlasts the period pushes the next trigger back instead of
/// stacking up missed ticks.
pub struct Scheduler {
    pipeline: Arc<RefreshPipeline>,
    period: Duration,
    state: watch::Sender<CycleState>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<RefreshPipeline>, period: Duration) -> Self {
        let (state, _) = watch::channel(CycleState::Idle);
        Self {
            pipeline,
            period,
            state,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    /// Run exactly one cycle, logging its outcome.
    pub async fn trigger(&self) -> Result<Reading> {
        self.state.send_replace(CycleState::Running);
        let outcome = self.pipeline.run_cycle().await;
        self.state.send_replace(CycleState::Idle);

        if let Err(e) = &outcome {
            log_cycle_error(self.pipeline.location(), e);
        }
        outcome
    }

    /// Fire immediately, then every `period`, until `shutdown` is signalled.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Refreshing {} every {:?}",
            self.pipeline.location(),
            self.period
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    // failures only end this cycle
                    let _ = self.trigger().await;
                }
            }
        }

        info!("Refresh scheduler for {} stopped", self.pipeline.location());
    }
}

/// Which stage a failed cycle stopped at, as it appears in the log.
fn failure_summary(err: &Error) -> &'static str {
    match err {
        Error::Resolution { .. } => "could not resolve location",
        Error::Fetch(_) => "could not fetch conditions",
        Error::Parse { .. } => "reading dropped, bad timestamp",
        _ => "cycle failed",
    }
}

fn log_cycle_error(location: &str, err: &Error) {
    error!("refresh {}: {}: {}", location, failure_summary(err), err);
}
