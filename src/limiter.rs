use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate shared by every fetch task. Cloning hands out another
/// handle to the same slots.
#[derive(Debug, Clone)]
pub struct Limiter {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// One admitted slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct Permit {
    _inner: OwnedSemaphorePermit,
}

impl Permit {
    pub fn release(self) {}
}

impl Limiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits until fewer than `capacity` permits are held.
    pub async fn acquire(&self) -> Result<Permit> {
        let inner = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .context("limiter closed")?;
        Ok(Permit { _inner: inner })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}
