//! Single-consumer tick executor.
//!
//! The engine never invokes continuations on a transport thread; it posts
//! them through a [`TickScheduler`]. `TickQueue` is the bundled
//! implementation: an explicit task queue whose consumer half the host
//! drains from its main loop, either by polling once per tick
//! ([`TickQueueRunner::drain_pending`]) or by parking a dedicated task on it
//! ([`TickQueueRunner::run_until_closed`]).

use crate::host::TickScheduler;
use tokio::sync::mpsc;
use tracing::trace;

type Task = Box<dyn FnOnce() + Send>;

/// Producer half: cheap to clone into the engine and anything else that
/// needs to reach the main loop.
#[derive(Debug, Clone)]
pub struct TickQueue {
    tx: mpsc::UnboundedSender<Task>,
}

/// Consumer half, held by the host's main loop. Single consumer by
/// construction.
#[derive(Debug)]
pub struct TickQueueRunner {
    rx: mpsc::UnboundedReceiver<Task>,
}

impl TickQueue {
    /// Creates a connected queue/runner pair.
    pub fn new() -> (Self, TickQueueRunner) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, TickQueueRunner { rx })
    }
}

impl TickScheduler for TickQueue {
    fn submit(&self, task: Task) {
        // After the runner is dropped (shutdown) there is no main loop left
        // to run on; tasks are dropped.
        if self.tx.send(task).is_err() {
            trace!("tick queue closed; dropping task");
        }
    }
}

impl TickQueueRunner {
    /// Runs every queued task until all producers are dropped.
    pub async fn run_until_closed(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
    }

    /// Runs every task queued so far and returns how many ran. Non-blocking;
    /// suitable for calling once per host tick or from tests.
    pub fn drain_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}
