use parking_lot::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// Single-slot timer: scheduling replaces and cancels whatever was pending,
/// so at most one callback is ever outstanding.
pub struct Debouncer {
    delay: Duration,
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `task` once `delay` has passed without another call to `schedule`.
    ///
    /// Outside a tokio runtime there is nothing to run the timer on; the task
    /// is handed back so the caller can apply it right away.
    pub fn schedule<F>(&self, task: F) -> Result<(), F>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => return Err(task),
        };

        let mut slot = self.slot.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
            trace!("Replaced pending debounce timer");
        }

        let delay = self.delay;
        *slot = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
        Ok(())
    }

    /// Cancels the pending task. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        match self.slot.lock().take() {
            Some(pending) => {
                let waiting = !pending.is_finished();
                pending.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.slot.get_mut().take() {
            pending.abort();
        }
    }
}
