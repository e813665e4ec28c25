//! Periodic deadline sweep: forces overdue rounds and expires stale lobbies.
//!
//! Each step goes through the coordinator's own transactions, so a sweep can
//! race a late human submission safely; whichever commits first wins and the
//! other re-reads.

use std::sync::Arc;
use std::time::Duration;

use furrow_protocol::GameStatus;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::coordinator::{ForceOutcome, RoundCoordinator};
use crate::error::CoordinatorResult;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub forced: u32,
    pub expired: u32,
    pub failed: u32,
}

pub struct DeadlineSweeper {
    coordinator: Arc<RoundCoordinator>,
}

impl DeadlineSweeper {
    pub fn new(coordinator: Arc<RoundCoordinator>) -> Self {
        Self { coordinator }
    }

    /// One pass over every game.
    pub async fn run_once(&self) -> CoordinatorResult<SweepReport> {
        let mut report = SweepReport::default();
        for (game_id, status) in self.coordinator.store().list_games().await? {
            match status {
                GameStatus::InProgress => {
                    match self.coordinator.force_round_on_deadline(game_id).await {
                        Ok(ForceOutcome::Forced { .. }) => report.forced += 1,
                        Ok(ForceOutcome::NotDue) => {}
                        Err(err) => {
                            warn!(
                                %game_id,
                                kind = %err.kind(),
                                error = %err,
                                "forcing round failed"
                            );
                            report.failed += 1;
                        }
                    }
                }
                GameStatus::Waiting => match self.coordinator.expire_stale_lobby(game_id).await {
                    Ok(true) => report.expired += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!(%game_id, kind = %err.kind(), error = %err, "expiring lobby failed");
                        report.failed += 1;
                    }
                },
                GameStatus::Finished | GameStatus::Expired | GameStatus::Deleted => {}
            }
        }
        if report != SweepReport::default() {
            debug!(?report, "sweep finished");
        }
        Ok(report)
    }

    /// Run the sweep every `interval` until the task is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.run_once().await {
                    warn!(kind = %err.kind(), error = %err, "sweep failed");
                }
            }
        })
    }
}
