use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Largest capacity a pool can be created with. The drain reclaims every token in
/// one `acquire_many`, which takes a `u32`.
pub const MAX_CAPACITY: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
    Semaphore::MAX_PERMITS
} else {
    u32::MAX as usize
};

#[derive(Debug)]
pub enum Acquire {
    Acquired(Token),
    /// Nothing was consumed, the pool is gone for good.
    Retired,
}

/// Dropping a token returns it to its pool.
#[derive(Debug)]
pub struct Token {
    permit: OwnedSemaphorePermit,
}

impl Token {
    pub fn release(self) {
        drop(self.permit);
    }
}

#[derive(Debug)]
pub(crate) struct Drained {
    permit: Option<OwnedSemaphorePermit>,
}

/// A counting semaphore that can be retired for good.
#[derive(Debug)]
pub struct Pool {
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

impl Pool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Blocked callers are woken with `Retired` when the pool is retired.
    pub async fn acquire(&self) -> Acquire {
        match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => Acquire::Acquired(Token { permit }),
            Err(_) => Acquire::Retired,
        }
    }

    /// Reclaims all `capacity` tokens. Callers queued behind the drain wait until
    /// `retire` turns them away.
    pub(crate) async fn drain(&self) -> Drained {
        // capacity never exceeds MAX_CAPACITY, which fits in a u32
        let n = self.capacity as u32;
        Drained {
            permit: self.semaphore.clone().acquire_many_owned(n).await.ok(),
        }
    }

    pub(crate) fn retire(&self, drained: Drained) {
        if let Some(permit) = drained.permit {
            permit.forget();
        }
        self.semaphore.close();
    }
}
