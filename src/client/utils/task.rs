use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// A one-shot timer with an explicit cancel handle: sleeps, then delivers
/// `event` on `tx`. Dropping the handle aborts the timer, so whoever owns
/// it cancels the callback simply by letting it go out of scope when the
/// awaited condition resolves first.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn once<T: Send + 'static>(
        delay: Duration,
        tx: mpsc::UnboundedSender<T>,
        event: T,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the session is tearing down
            let _ = tx.send(event);
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
