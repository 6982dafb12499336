#![forbid(unsafe_code)]

//! Fixed-capacity message queues.
//!
//! A [`Queue`] is only a factory: it hands out direction-typed handles and is
//! dropped once the wiring is done. Task-side handles take a bounded wait;
//! the interrupt-side handle can only try.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError, TrySendError};
use gov_core::{GovError, GovResult};
use log::trace;

/// Counters shared by every handle of one queue.
#[derive(Debug, Default)]
pub struct QueueStats {
    accepted: AtomicU64,
    dropped: AtomicU64,
    stale: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub dropped: u64,
    pub stale: u64,
}

impl QueueStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }

    fn on_accept(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    fn on_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn on_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct Queue<T> {
    name: &'static str,
    tx: Sender<T>,
    rx: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Queue<T> {
    /// A capacity of zero is raised to one; a rendezvous queue would make
    /// every interrupt-side send fail.
    pub fn bounded(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity.max(1));
        Self { name, tx, rx, stats: Arc::new(QueueStats::default()) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn producer(&self) -> Producer<T> {
        Producer { name: self.name, tx: self.tx.clone(), stats: self.stats.clone() }
    }

    pub fn isr_producer(&self) -> IsrProducer<T> {
        IsrProducer { tx: self.tx.clone(), stats: self.stats.clone() }
    }

    pub fn consumer(&self) -> Consumer<T> {
        Consumer { name: self.name, rx: self.rx.clone(), stats: self.stats.clone() }
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        self.stats.clone()
    }
}

/// Task-side sending end.
pub struct Producer<T> {
    name: &'static str,
    tx: Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Producer<T> {
    /// Enqueue, waiting at most `wait_ms` for a free slot.
    /// On timeout the item is discarded and `DroppedOutput` returned.
    pub fn send(&self, item: T, wait_ms: u64) -> GovResult<()> {
        let res = if wait_ms == 0 {
            self.tx.try_send(item).map_err(|e| match e {
                TrySendError::Full(_) => GovError::DroppedOutput,
                TrySendError::Disconnected(_) => GovError::Disconnected,
            })
        } else {
            self.tx.send_timeout(item, Duration::from_millis(wait_ms)).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => GovError::DroppedOutput,
                SendTimeoutError::Disconnected(_) => GovError::Disconnected,
            })
        };

        match res {
            Ok(()) => self.stats.on_accept(),
            Err(GovError::DroppedOutput) => {
                self.stats.on_drop();
                trace!("[{}] full after {}ms, item dropped", self.name, wait_ms);
            }
            Err(_) => {}
        }
        res
    }
}

/// Interrupt-side sending end. Exposes no waiting operation at all.
pub struct IsrProducer<T> {
    tx: Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> IsrProducer<T> {
    /// `WouldBlock` means the queue was full and the item is gone; the
    /// caller is not expected to retry.
    pub fn send_from_isr(&self, item: T) -> nb::Result<(), GovError> {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.stats.on_accept();
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.stats.on_drop();
                Err(nb::Error::WouldBlock)
            }
            Err(TrySendError::Disconnected(_)) => Err(nb::Error::Other(GovError::Disconnected)),
        }
    }
}

/// Receiving end.
pub struct Consumer<T> {
    name: &'static str,
    rx: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Consumer<T> {
    /// Dequeue, waiting at most `wait_ms`. Timeout yields `StaleInput`.
    pub fn recv(&self, wait_ms: u64) -> GovResult<T> {
        let res = if wait_ms == 0 {
            self.rx.try_recv().map_err(|e| match e {
                TryRecvError::Empty => GovError::StaleInput,
                TryRecvError::Disconnected => GovError::Disconnected,
            })
        } else {
            self.rx.recv_timeout(Duration::from_millis(wait_ms)).map_err(|e| match e {
                RecvTimeoutError::Timeout => GovError::StaleInput,
                RecvTimeoutError::Disconnected => GovError::Disconnected,
            })
        };

        if let Err(GovError::StaleInput) = res {
            self.stats.on_stale();
            trace!("[{}] nothing within {}ms", self.name, wait_ms);
        }
        res
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
