use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use common::AgentError;

use crate::analysis::AnalysisGenerator;
use crate::api::SnapshotSource;
use crate::clients::{HistoryReader, Publisher};
use crate::duplicate::DuplicateGuard;
use crate::formatter::PostFormatter;

/// Pipeline stage a cycle failed in, carried on the outcome so the log
/// line names the failing dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Generate,
    Format,
    DupCheck,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Generate => "generate",
            Stage::Format => "format",
            Stage::DupCheck => "dup-check",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Published,
    Skipped,
    Failed(Stage),
}

/// Owns one full posting pipeline and the schedule that drives it. Cycles
/// run strictly sequentially; no state survives from one cycle to the
/// next.
pub struct CorrelationAgent {
    market: Arc<dyn SnapshotSource>,
    generator: AnalysisGenerator,
    formatter: PostFormatter,
    guard: DuplicateGuard,
    history: Arc<dyn HistoryReader>,
    publisher: Arc<dyn Publisher>,
    cycle_interval: Duration,
    failure_backoff: Duration,
}

impl CorrelationAgent {
    pub fn new(
        market: Arc<dyn SnapshotSource>,
        generator: AnalysisGenerator,
        formatter: PostFormatter,
        guard: DuplicateGuard,
        history: Arc<dyn HistoryReader>,
        publisher: Arc<dyn Publisher>,
        cycle_interval: Duration,
        failure_backoff: Duration,
    ) -> Self {
        Self {
            market,
            generator,
            formatter,
            guard,
            history,
            publisher,
            cycle_interval,
            failure_backoff,
        }
    }

    /// One full fetch → generate → format → dup-check → publish pass. All
    /// failures are absorbed here; the scheduler only ever sees an
    /// outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let snapshot = match self.market.fetch().await {
            Ok(snapshot) => snapshot,
            Err(err) => return self.fail(Stage::Fetch, err),
        };

        let analysis = match self.generator.generate(&snapshot).await {
            Ok(analysis) => analysis,
            Err(err) => return self.fail(Stage::Generate, err),
        };

        let post = self.formatter.format(&analysis, &snapshot);

        // History is advisory: if the feed is down duplication cannot be
        // proven, so the post goes through.
        let history = match self.history.recent_posts().await {
            Ok(posts) => posts,
            Err(err) => {
                warn!(%err, "history feed unavailable, treating as empty");
                Vec::new()
            }
        };

        if self.guard.is_duplicate(&post, &history) {
            info!("duplicate analysis, skipping publish");
            return CycleOutcome::Skipped;
        }

        match self.publisher.publish(&post).await {
            Ok(()) => {
                info!("cycle complete, analysis published");
                CycleOutcome::Published
            }
            Err(err) => self.fail(Stage::Publish, err),
        }
    }

    /// Scheduler loop: a failed cycle backs off longer before the next
    /// attempt; ctrl-c is honored between cycles, never mid-cycle.
    pub async fn run(&self) {
        loop {
            info!("starting correlation cycle");
            let outcome = self.run_cycle().await;

            let delay = match outcome {
                CycleOutcome::Failed(_) => self.failure_backoff,
                CycleOutcome::Published | CycleOutcome::Skipped => self.cycle_interval,
            };
            info!(?outcome, ?delay, "cycle finished, sleeping");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("stop signal received, shutting down");
                    break;
                }
            }
        }
    }

    fn fail(&self, stage: Stage, err: AgentError) -> CycleOutcome {
        error!(%stage, %err, "cycle failed");
        CycleOutcome::Failed(stage)
    }
}
