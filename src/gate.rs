use std::{
    future::Future,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tokio::runtime::Handle;

use crate::{
    error::GateError,
    pool::{Acquire, Pool, MAX_CAPACITY},
    signal::Signal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unopened,
    Open,
    /// `close` was called and in-flight callbacks are still returning tokens.
    Closing,
    Closed,
}

#[derive(Debug)]
enum State {
    Unopened,
    Open(Arc<Pool>),
    Draining(Arc<Pool>),
    Closed,
}

/// Lets callers run work only while the owner keeps the gate open. Callbacks must
/// not call back into the same gate, that may deadlock.
#[derive(Debug)]
pub struct Gate {
    capacity: usize,
    state: Arc<RwLock<State>>,
    opened: Arc<Signal>,
    closed: Arc<Signal>,
}

impl Gate {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, MAX_CAPACITY),
            state: Arc::new(RwLock::new(State::Unopened)),
            opened: Default::default(),
            closed: Default::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn phase(&self) -> Phase {
        match *self.read() {
            State::Unopened => Phase::Unopened,
            State::Open(_) => Phase::Open,
            State::Draining(_) => Phase::Closing,
            State::Closed => Phase::Closed,
        }
    }

    /// Tokens free right now. Always 0 unless the gate holds a pool.
    pub fn available(&self) -> usize {
        self.pool().map_or(0, |pool| pool.available())
    }

    /// A new unopened gate with the same capacity, sharing nothing with `self`.
    pub fn clone_fresh(&self) -> Self {
        Self::new(self.capacity)
    }

    pub fn open(&self) -> Result<(), GateError> {
        {
            let mut state = self.write();
            match &*state {
                State::Unopened => {}
                State::Open(_) | State::Draining(_) => return Err(GateError::AlreadyOpened),
                State::Closed => return Err(GateError::Closed),
            }
            *state = State::Open(Arc::new(Pool::new(self.capacity)));
        }

        log::debug!("gate opened with capacity {}", self.capacity);
        self.opened.fire();
        Ok(())
    }

    pub async fn wait_opened(&self) {
        self.opened.wait().await
    }

    /// Starts closing the gate without waiting for it. The closed signal fires
    /// once every token is back, so only after all callbacks in flight returned.
    pub fn close(&self) -> Result<(), GateError> {
        let mut state = self.write();
        if matches!(*state, State::Unopened) {
            *state = State::Closed;
            drop(state);
            log::debug!("closing a gate that was never opened");
            self.closed.fire();
            return Ok(());
        }
        let pool = match &*state {
            State::Open(pool) => pool.clone(),
            _ => return Ok(()),
        };

        let handle = Handle::try_current().map_err(GateError::NoRuntime)?;
        *state = State::Draining(pool.clone());
        drop(state);

        log::debug!("draining gate pool of {} tokens", pool.capacity());
        let shared = self.state.clone();
        let closed = self.closed.clone();
        handle.spawn(async move {
            let drained = pool.drain().await;
            {
                let mut state = shared.write().unwrap_or_else(PoisonError::into_inner);
                pool.retire(drained);
                *state = State::Closed;
            }
            log::debug!("gate closed");
            closed.fire();
        });

        Ok(())
    }

    /// Returns immediately on a gate that was never opened.
    pub async fn wait_closed(&self) {
        if self.phase() == Phase::Unopened {
            return;
        }
        self.closed.wait().await
    }

    pub fn opened_channel(&self) -> Arc<Signal> {
        self.opened.clone()
    }

    pub fn closed_channel(&self) -> Arc<Signal> {
        self.closed.clone()
    }

    /// Takes a token from the gate's pool. An unopened or closed gate answers
    /// `Retired` without waiting.
    pub async fn acquire(&self) -> Acquire {
        match self.pool() {
            Some(pool) => pool.acquire().await,
            None => {
                log::trace!("gate not open, no token to take");
                Acquire::Retired
            }
        }
    }

    /// The token is held while `f` runs and returned even if it panics.
    pub async fn run_if_open<F>(&self, f: F) -> &Self
    where
        F: FnOnce(),
    {
        if let Acquire::Acquired(_token) = self.acquire().await {
            f();
        }
        self
    }

    pub async fn run_if_open_async<F, Fut>(&self, f: F) -> &Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        if let Acquire::Acquired(_token) = self.acquire().await {
            f().await;
        }
        self
    }

    pub async fn run_if_closed<F>(&self, f: F) -> &Self
    where
        F: FnOnce(),
    {
        if self.probe_closed().await {
            f();
        }
        self
    }

    pub async fn run_if_closed_async<F, Fut>(&self, f: F) -> &Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        if self.probe_closed().await {
            f().await;
        }
        self
    }

    // while a pool exists, taking and returning a token tells open from retired
    async fn probe_closed(&self) -> bool {
        match self.acquire().await {
            Acquire::Acquired(token) => {
                token.release();
                false
            }
            Acquire::Retired => true,
        }
    }

    // the lock is dropped before the caller touches the pool
    fn pool(&self) -> Option<Arc<Pool>> {
        match &*self.read() {
            State::Open(pool) | State::Draining(pool) => Some(pool.clone()),
            State::Unopened | State::Closed => None,
        }
    }

    // no user code runs under the lock, so a poisoned lock still holds a valid state
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
