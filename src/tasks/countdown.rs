//! Per-timer countdown background task

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};
use tracing::debug;

use crate::manager::{TickOutcome, WeakTimerManager};

/// Spawn the repeating countdown for one timer run
///
/// The first tick fires one `period` after spawning. The loop ends when the
/// manager reports the run finished or is dropped; otherwise it lives until
/// the manager aborts the returned handle.
pub fn spawn_countdown(
    manager: WeakTimerManager,
    timer_id: String,
    generation: u64,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Countdown {} (run {}) started", timer_id, generation);

        let mut interval = interval_at(Instant::now() + period, period);

        loop {
            interval.tick().await;

            let Some(manager) = manager.upgrade() else {
                debug!("Manager dropped, ending countdown {}", timer_id);
                break;
            };

            match manager.tick(&timer_id, generation).await {
                TickOutcome::Continue => {}
                TickOutcome::Finished => break,
            }
        }

        debug!("Countdown {} (run {}) ended", timer_id, generation);
    })
}
