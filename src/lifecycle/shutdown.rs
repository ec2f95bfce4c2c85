//! Shutdown coordination for the background loops.

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Owns the shutdown broadcast and the loops listening to it.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, tasks: Vec::new() }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Spawn a named background loop handed its own shutdown receiver.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task(self.subscribe()));
        self.tasks.push((name, handle));
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of receivers still alive.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Trigger, then wait up to `grace` for each spawned loop.
    ///
    /// Loops still running after the grace period are aborted. Returns the
    /// number of loops that did not exit cleanly.
    pub async fn shutdown(self, grace: Duration) -> usize {
        self.trigger();

        let mut unclean = 0;
        for (name, mut handle) in self.tasks {
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => tracing::debug!(task = name, "Task stopped"),
                Ok(Err(e)) => {
                    unclean += 1;
                    tracing::error!(task = name, error = %e, "Task panicked");
                }
                Err(_) => {
                    unclean += 1;
                    handle.abort();
                    tracing::warn!(task = name, grace_secs = grace.as_secs(), "Task did not stop in time, aborted");
                }
            }
        }
        unclean
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_spawned_loops_stop_on_shutdown() {
        let mut shutdown = Shutdown::new();
        shutdown.spawn("listener", |mut rx| async move {
            let _ = rx.recv().await;
        });

        assert_eq!(shutdown.shutdown(Duration::from_secs(1)).await, 0);
    }

    #[tokio::test]
    async fn test_stuck_loop_is_aborted() {
        let mut shutdown = Shutdown::new();
        shutdown.spawn("stuck", |_rx| std::future::pending::<()>());

        assert_eq!(shutdown.shutdown(Duration::from_millis(20)).await, 1);
    }
}
