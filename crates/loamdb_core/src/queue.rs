//! In-process write queue and its consumer.

use crate::platform::Platform;
use crate::record::Record;
use crate::types::CollectionId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// One queued record write.
#[derive(Debug, Clone)]
pub struct WriteJob {
    /// Target collection.
    pub collection_id: CollectionId,
    /// The record to apply.
    pub record: Record,
}

/// A FIFO queue of pending record writes.
///
/// Handlers enqueue accepted writes here and return immediately; the
/// [`Consumer`] drains the queue on its own thread. The queue is unbounded.
#[derive(Debug, Default)]
pub struct WriteQueue {
    jobs: Mutex<VecDeque<WriteJob>>,
}

impl WriteQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job to the queue.
    pub fn push(&self, job: WriteJob) {
        self.jobs.lock().push_back(job);
    }

    /// Removes and returns the oldest job, or `None` if the queue is empty.
    #[must_use]
    pub fn pop(&self) -> Option<WriteJob> {
        self.jobs.lock().pop_front()
    }

    /// Returns the number of pending jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Returns true if no jobs are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

/// The write consumer: a background thread that drains the platform's write
/// queue and applies each job to its collection.
///
/// A job that fails to apply is logged and dropped; later jobs still run.
/// Failed writes are observable through the log, not through the caller.
pub struct Consumer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Consumer {
    /// Spawns the consumer thread for a platform.
    ///
    /// The thread polls the queue, sleeping for the platform's configured
    /// poll interval whenever the queue is empty.
    #[must_use]
    pub fn spawn(platform: Arc<Platform>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let interval = platform.config().consumer_poll_interval;

        let handle = std::thread::Builder::new()
            .name("loamdb-write-consumer".to_string())
            .spawn(move || {
                consumer_loop(&platform, &thread_stop, interval);
            })
            .ok();

        Self { stop, handle }
    }

    /// Signals the thread to stop and waits for it to finish.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn consumer_loop(platform: &Platform, stop: &AtomicBool, interval: Duration) {
    tracing::info!("write consumer started");
    while !stop.load(Ordering::SeqCst) {
        match platform.queue().pop() {
            Some(job) => {
                let collection_id = job.collection_id;
                if let Err(err) = platform.apply_write(&job) {
                    tracing::error!(collection = %collection_id, %err, "dropping failed write");
                }
            }
            None => {
                std::thread::sleep(interval);
            }
        }
    }
    tracing::info!("write consumer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(key: &str) -> WriteJob {
        WriteJob {
            collection_id: CollectionId::new(1),
            record: Record::from_value(json!({"_key": key})).unwrap(),
        }
    }

    #[test]
    fn queue_is_fifo() {
        let queue = WriteQueue::new();
        queue.push(job("a"));
        queue.push(job("b"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().record.key().unwrap(), "a");
        assert_eq!(queue.pop().unwrap().record.key().unwrap(), "b");
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }
}
