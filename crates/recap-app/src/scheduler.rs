use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::pipeline::PipelineOrchestrator;

/// Fire the pipeline every `period`, first run one period after start
///
/// Each tick runs on its own task so a slow cycle never delays the timer; the
/// orchestrator drops ticks that arrive while a cycle is still running.
pub async fn run_scheduler(
    orchestrator: Arc<PipelineOrchestrator>,
    period: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(interval_secs = period.as_secs(), "Capture scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::spawn(orchestrator.clone().trigger());
            }
            _ = cancel.cancelled() => {
                tracing::info!("Capture scheduler stopping");
                break;
            }
        }
    }

    Ok(())
}
