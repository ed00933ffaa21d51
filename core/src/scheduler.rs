use log::debug;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Delay between the end of one poll cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct PollHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Runs a poll cycle repeatedly on a single tokio task.
///
/// The next cycle is scheduled only after the previous one returns, so a slow
/// cycle lowers the rate instead of queueing work. At most one task is
/// pending at any time.
pub struct PollScheduler {
    interval: Duration,
    pending: Option<PollHandle>,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Spawns the poll task, replacing any pending one. Must be called from
    /// within a tokio runtime.
    pub fn start<F>(&mut self, mut cycle: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.cancel();

        let (cancel, mut cancelled) = watch::channel(false);
        let interval = self.interval;
        let task = tokio::spawn(async move {
            loop {
                let stop = *cancelled.borrow();
                if stop {
                    break;
                }
                cycle();
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = cancelled.changed() => break,
                }
            }
        });
        self.pending = Some(PollHandle { cancel, task });
    }

    /// Cancels the pending task. A cycle already running finishes, but no
    /// further cycle starts. Returns whether a task was pending.
    pub fn cancel(&mut self) -> bool {
        let Some(handle) = self.pending.take() else {
            return false;
        };
        let _ = handle.cancel.send(true);
        handle.task.abort();
        debug!("poll schedule cancelled");
        true
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
