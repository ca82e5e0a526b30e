use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::app::counter::UnreadCounter;

/// Owned handle for the periodic unread-count refresh.
///
/// `stop` cancels deterministically: once it returns, no refresh can
/// write to the counter. Dropping the handle without `stop` aborts the task.
pub struct UnreadPoller {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl UnreadPoller {
    /// Refreshes once immediately, then every `period`.
    pub fn spawn(counter: Arc<UnreadCounter>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(counter, period, shutdown_rx));
        Self {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(error = ?err, "unread poller ended abnormally");
                }
            }
        }
    }
}

impl Drop for UnreadPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(counter: Arc<UnreadCounter>, period: Duration, mut shutdown: oneshot::Receiver<()>) {
    info!(period_secs = period.as_secs(), "unread poller started");
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                // An in-flight refresh is dropped on shutdown so a late
                // response never lands after teardown.
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = counter.refresh() => {}
                }
            }
        }
    }

    info!("unread poller stopped");
}
