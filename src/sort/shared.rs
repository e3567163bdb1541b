//! Copy-then-publish handoff of draw orders to a concurrent reader.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A published order and the generation it was published at.
///
/// Generation 0 is the initial empty order.
#[derive(Clone, Debug, Default)]
pub struct OrderSnapshot {
    pub order: Arc<[u32]>,
    pub generation: u64,
}

struct Inner {
    current: Mutex<OrderSnapshot>,
    published: Condvar,
}

/// Shared slot holding the latest complete draw order.
///
/// Writers build a whole new order and swap it in; readers clone an `Arc`
/// and never observe a partially written order. Cloning the handle shares
/// the slot.
#[derive(Clone)]
pub struct SharedOrder {
    inner: Arc<Inner>,
}

impl Default for SharedOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedOrder {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                current: Mutex::new(OrderSnapshot::default()),
                published: Condvar::new(),
            }),
        }
    }

    /// Replace the current order. Returns the new generation.
    pub fn publish(&self, order: Vec<u32>) -> u64 {
        let order: Arc<[u32]> = order.into();
        let generation = {
            let mut current = self.inner.current.lock();
            current.generation += 1;
            current.order = order;
            current.generation
        };
        self.inner.published.notify_all();
        generation
    }

    pub fn snapshot(&self) -> OrderSnapshot {
        self.inner.current.lock().clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.current.lock().generation
    }

    /// Block until an order with at least `generation` is published, or the
    /// timeout expires. Returns the latest snapshot if it is new enough.
    /// A timeout too large to represent as a deadline waits without limit.
    pub fn wait_for(&self, generation: u64, timeout: Duration) -> Option<OrderSnapshot> {
        let deadline = Instant::now().checked_add(timeout);
        let mut current = self.inner.current.lock();
        while current.generation < generation {
            match deadline {
                Some(deadline) => {
                    if self
                        .inner
                        .published
                        .wait_until(&mut current, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
                None => self.inner.published.wait(&mut current),
            }
        }
        (current.generation >= generation).then(|| current.clone())
    }
}

impl std::fmt::Debug for SharedOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.inner.current.lock();
        f.debug_struct("SharedOrder")
            .field("generation", &current.generation)
            .field("len", &current.order.len())
            .finish()
    }
}
