//! Concurrency limit with a bounded wait queue.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Debug)]
pub struct Bulkhead {
    name: String,
    permits: Semaphore,
    max_queued: usize,
    queued: AtomicUsize,
}

impl Bulkhead {
    pub fn new(name: impl Into<String>, max_concurrent: usize, max_queued: usize) -> Self {
        Self {
            name: name.into(),
            permits: Semaphore::new(max_concurrent),
            max_queued,
            queued: AtomicUsize::new(0),
        }
    }

    /// Waits for a slot. Returns `None` without waiting if the queue is full.
    pub async fn enter(&self) -> Option<SemaphorePermit<'_>> {
        if let Ok(permit) = self.permits.try_acquire() {
            return Some(permit);
        }
        if self.queued.fetch_add(1, Ordering::AcqRel) >= self.max_queued {
            self.queued.fetch_sub(1, Ordering::AcqRel);
            metrics::counter!("bulkhead_rejected_total", "name" => self.name.clone()).increment(1);
            tracing::warn!(name = %self.name, "bulkhead queue full, rejecting call");
            return None;
        }
        let permit = self.permits.acquire().await.ok();
        self.queued.fetch_sub(1, Ordering::AcqRel);
        permit
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_when_slots_and_queue_are_full() {
        let bulkhead = Bulkhead::new("test", 1, 0);
        let held = bulkhead.enter().await;
        assert!(held.is_some());
        assert_eq!(bulkhead.available(), 0);

        assert!(bulkhead.enter().await.is_none());

        drop(held);
        assert!(bulkhead.enter().await.is_some());
    }

    #[tokio::test]
    async fn test_queued_call_waits_for_a_slot() {
        let bulkhead = std::sync::Arc::new(Bulkhead::new("test", 1, 1));
        let held = bulkhead.enter().await;

        let waiter = {
            let bulkhead = bulkhead.clone();
            tokio::spawn(async move { bulkhead.enter().await.is_some() })
        };
        while bulkhead.queued() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(bulkhead.enter().await.is_none());

        drop(held);
        assert!(waiter.await.unwrap());
    }
}
