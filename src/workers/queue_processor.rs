use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use crate::queue::EventQueue;

/// Worker that drains the event queue into digests on a fixed cadence
pub struct QueueProcessorWorker {
    queue: Arc<EventQueue>,
    process_interval: Duration,
}

impl QueueProcessorWorker {
    /// Create a new queue processor worker
    pub fn new(queue: Arc<EventQueue>) -> Self {
        let process_interval = queue.config().process_interval;
        Self {
            queue,
            process_interval,
        }
    }

    /// Run the worker loop
    pub async fn run(&self) {
        info!(
            "Queue processor started (interval: {:?})",
            self.process_interval
        );

        let mut interval = time::interval(self.process_interval);

        loop {
            interval.tick().await;
            self.process();
        }
    }

    fn process(&self) {
        let groups = self.queue.process_queue();
        if !groups.is_empty() {
            debug!("Delivered {} digest(s)", groups.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueConfig;

    #[tokio::test(start_paused = true)]
    async fn test_worker_drains_queue_on_tick() {
        let queue = Arc::new(EventQueue::new(QueueConfig::default()));
        let worker = QueueProcessorWorker::new(Arc::clone(&queue));
        let handle = tokio::spawn(async move { worker.run().await });

        time::sleep(Duration::from_millis(10)).await;
        queue.add_event("GOAL", None);
        assert_eq!(queue.len(), 1);

        time::sleep(Duration::from_secs(2)).await;
        assert!(queue.is_empty());

        handle.abort();
    }
}
