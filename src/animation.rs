//! Auto-advance through years.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::viewer::Selection;

/// Steps the selection through a list of years on a fixed tick, wrapping
/// back to the first year after the last.
///
/// `start` and `stop` are idempotent. The position is kept across a
/// stop/start cycle.
pub struct Animator {
    selection: Selection,
    years: Arc<Vec<i32>>,
    interval: Duration,
    next_index: Arc<AtomicUsize>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Animator {
    pub fn new(selection: Selection, years: Vec<i32>, interval: Duration) -> Self {
        Self {
            selection,
            years: Arc::new(years),
            interval,
            next_index: Arc::new(AtomicUsize::new(0)),
            task: Mutex::new(None),
        }
    }

    /// Whether the tick task is running
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start ticking. Returns `false` if already running, the interval is
    /// zero, or there are no years to step through. Must be called inside a
    /// tokio runtime.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Animation already running");
            return false;
        }
        if self.years.is_empty() {
            warn!("No years to animate");
            return false;
        }
        if self.interval.is_zero() {
            warn!("Animation interval must be non-zero");
            return false;
        }

        let selection = self.selection.clone();
        let years = Arc::clone(&self.years);
        let next_index = Arc::clone(&self.next_index);
        let period = self.interval;

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let index = next_index.load(Ordering::SeqCst) % years.len();
                selection.set_year(years[index]);
                next_index.store((index + 1) % years.len(), Ordering::SeqCst);
                debug!(year = years[index], "Animation tick");
            }
        }));
        info!(interval_ms = period.as_millis() as u64, "Animation started");
        true
    }

    /// Stop ticking. Returns `false` if already stopped.
    pub fn stop(&self) -> bool {
        match self.task.lock().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                info!("Animation stopped");
                true
            }
            _ => false,
        }
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
