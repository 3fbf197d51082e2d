//! Blocking rendezvous endpoints over shared channels.
//!
//! There is no clock and no scheduler tick: each endpoint advances only on
//! rendezvous events, suspending until the counterpart moves the wires.
//! Each side of a link has exactly one writer role — the producer drives
//! the rails, the consumer drives the acknowledge — so the mutex guarding
//! the shared wires is the only synchronization beyond that single-writer
//! rule. Per-link cycles are strictly sequential; handshakes on distinct
//! links proceed fully concurrently and may sit in different phases at
//! the same time.
//!
//! The protocol itself defines no cancellation or timeout. The `_timeout`
//! variants are the external deadline a verification harness may impose
//! to surface deadlock; a miss reports [`LinkError::Stalled`] without
//! touching the channel state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::trace;

use crate::channel::{Channel, Wires};
use crate::control::ControlChannel;
use crate::fault::Fault;
use crate::multi::MultiChannel;
use crate::phase::Phase;

/// Endpoint-level failures: circuit faults plus harness conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    /// A protocol fault on this link's channel.
    #[error(transparent)]
    Fault(#[from] Fault),
    /// The counterpart made no progress before the caller's deadline.
    #[error("counterpart made no progress before the deadline")]
    Stalled,
    /// The counterpart endpoint was dropped mid-protocol.
    #[error("counterpart endpoint disconnected")]
    Disconnected,
}

struct Cell<C> {
    chan: C,
    producer_live: bool,
    consumer_live: bool,
}

struct Shared<C> {
    cell: Mutex<Cell<C>>,
    moved: Condvar,
    id: u64,
}

impl<C: Wires> Shared<C> {
    fn new(chan: C) -> Arc<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Arc::new(Shared {
            cell: Mutex::new(Cell { chan, producer_live: true, consumer_live: true }),
            moved: Condvar::new(),
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Applies one protocol step under the lock and wakes the
    /// counterpart.
    fn update<T>(&self, f: impl FnOnce(&mut C) -> Result<T, Fault>) -> Result<T, LinkError> {
        let mut cell = self.cell.lock();
        let out = f(&mut cell.chan)?;
        self.moved.notify_all();
        Ok(out)
    }

    /// Suspends until `ready` holds, the counterpart hangs up, or the
    /// deadline passes.
    fn wait_for(&self, until: Option<Instant>, mut ready: impl FnMut(&C) -> bool) -> Result<(), LinkError> {
        let mut cell = self.cell.lock();
        loop {
            if ready(&cell.chan) {
                return Ok(());
            }
            if !cell.producer_live || !cell.consumer_live {
                return Err(LinkError::Disconnected);
            }
            match until {
                Some(at) => {
                    if self.moved.wait_until(&mut cell, at).timed_out() {
                        return Err(LinkError::Stalled);
                    }
                }
                None => self.moved.wait(&mut cell),
            }
        }
    }

    fn hang_up(&self, producer_side: bool) {
        let mut cell = self.cell.lock();
        if producer_side {
            cell.producer_live = false;
        } else {
            cell.consumer_live = false;
        }
        self.moved.notify_all();
    }
}

/// Producer endpoint: the designated writer of the payload wires.
///
/// Not clonable; one writer per side is the protocol's only concurrency
/// rule.
#[derive(Debug)]
pub struct Producer<C: Wires> {
    shared: Arc<Shared<C>>,
}

/// Consumer endpoint: the designated writer of the acknowledge wire.
#[derive(Debug)]
pub struct Consumer<C: Wires> {
    shared: Arc<Shared<C>>,
}

impl<C: Wires> std::fmt::Debug for Shared<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<C: Wires> Drop for Producer<C> {
    fn drop(&mut self) { self.shared.hang_up(true) }
}

impl<C: Wires> Drop for Consumer<C> {
    fn drop(&mut self) { self.shared.hang_up(false) }
}

fn endpoints<C: Wires>(chan: C) -> (Producer<C>, Consumer<C>) {
    let shared = Shared::new(chan);
    (Producer { shared: shared.clone() }, Consumer { shared })
}

/// Creates a quiescent `W`-bit link.
pub fn channel<const W: usize>() -> (Producer<Channel<W>>, Consumer<Channel<W>>) {
    endpoints(Channel::new())
}

/// Creates a quiescent `K`-payload link of width `W`.
pub fn multi_channel<const W: usize, const K: usize>(
) -> (Producer<MultiChannel<W, K>>, Consumer<MultiChannel<W, K>>) {
    endpoints(MultiChannel::new())
}

/// Creates a quiescent control-only link.
pub fn control_channel() -> (Producer<ControlChannel>, Consumer<ControlChannel>) {
    endpoints(ControlChannel::new())
}

impl<C: Wires> Producer<C> {
    /// Waits out the tail of the previous cycle: rails NULL, ack clear.
    fn settle_in(&self, until: Option<Instant>) -> Result<(), LinkError> {
        self.shared.wait_for(until, |chan| chan.phase() == Phase::Null && !chan.ack())
    }

    /// Waits for the consumer's ack, then retires the wavefront.
    fn retire_out(&self, until: Option<Instant>, back_to_null: impl FnOnce(&mut C) -> Result<(), Fault>) -> Result<(), LinkError> {
        self.shared.wait_for(until, |chan| chan.ack())?;
        self.shared.update(back_to_null)?;
        trace!(link = self.shared.id, "returned to null");
        Ok(())
    }
}

impl<const W: usize> Producer<Channel<W>> {
    /// Carries one word through a full four-phase cycle. Blocks until the
    /// consumer has acknowledged and the wavefront has been retired.
    pub fn send(&self, word: u64) -> Result<(), LinkError> { self.transfer(word, None) }

    /// [`send`](Self::send) under a harness deadline.
    pub fn send_timeout(&self, word: u64, limit: Duration) -> Result<(), LinkError> {
        self.transfer(word, Some(Instant::now() + limit))
    }

    fn transfer(&self, word: u64, until: Option<Instant>) -> Result<(), LinkError> {
        self.settle_in(until)?;
        self.shared.update(|chan| chan.begin_transfer(word))?;
        trace!(link = self.shared.id, word, "wavefront asserted");
        self.retire_out(until, Channel::return_to_null)
    }
}

impl<const W: usize, const K: usize> Producer<MultiChannel<W, K>> {
    /// Carries one fused word group through a full four-phase cycle.
    pub fn send(&self, words: [u64; K]) -> Result<(), LinkError> { self.transfer(words, None) }

    /// [`send`](Self::send) under a harness deadline.
    pub fn send_timeout(&self, words: [u64; K], limit: Duration) -> Result<(), LinkError> {
        self.transfer(words, Some(Instant::now() + limit))
    }

    fn transfer(&self, words: [u64; K], until: Option<Instant>) -> Result<(), LinkError> {
        self.settle_in(until)?;
        self.shared.update(|chan| chan.begin_transfer(words))?;
        trace!(link = self.shared.id, ?words, "fused wavefront asserted");
        self.retire_out(until, MultiChannel::return_to_null)
    }
}

impl Producer<ControlChannel> {
    /// Carries one synchronization event through a full four-phase cycle.
    pub fn notify(&self) -> Result<(), LinkError> { self.event(None) }

    /// [`notify`](Self::notify) under a harness deadline.
    pub fn notify_timeout(&self, limit: Duration) -> Result<(), LinkError> {
        self.event(Some(Instant::now() + limit))
    }

    fn event(&self, until: Option<Instant>) -> Result<(), LinkError> {
        self.settle_in(until)?;
        self.shared.update(ControlChannel::signal)?;
        trace!(link = self.shared.id, "event asserted");
        self.retire_out(until, ControlChannel::clear)
    }
}

impl<C: Wires> Consumer<C> {
    /// Waits for the NULL spacer, then clears ack.
    fn settle_out(&self, until: Option<Instant>, ack_clear: impl FnOnce(&mut C) -> Result<(), Fault>) -> Result<(), LinkError> {
        self.shared.wait_for(until, |chan| chan.is_null())?;
        self.shared.update(ack_clear)
    }
}

impl<const W: usize> Consumer<Channel<W>> {
    /// Receives one word: waits for completion, reads, acknowledges, then
    /// waits out the mandatory spacer before clearing ack.
    pub fn recv(&self) -> Result<u64, LinkError> { self.receive(None) }

    /// [`recv`](Self::recv) under a harness deadline.
    pub fn recv_timeout(&self, limit: Duration) -> Result<u64, LinkError> {
        self.receive(Some(Instant::now() + limit))
    }

    fn receive(&self, until: Option<Instant>) -> Result<u64, LinkError> {
        self.shared.wait_for(until, Channel::is_complete)?;
        let word = self.shared.update(|chan| {
            let word = chan.read_word()?;
            chan.assert_ack()?;
            Ok(word)
        })?;
        trace!(link = self.shared.id, word, "acknowledged");
        self.settle_out(until, Channel::clear_ack)?;
        Ok(word)
    }
}

impl<const W: usize, const K: usize> Consumer<MultiChannel<W, K>> {
    /// Receives one fused word group.
    pub fn recv(&self) -> Result<[u64; K], LinkError> { self.receive(None) }

    /// [`recv`](Self::recv) under a harness deadline.
    pub fn recv_timeout(&self, limit: Duration) -> Result<[u64; K], LinkError> {
        self.receive(Some(Instant::now() + limit))
    }

    fn receive(&self, until: Option<Instant>) -> Result<[u64; K], LinkError> {
        self.shared.wait_for(until, MultiChannel::is_complete)?;
        let words = self.shared.update(|chan| {
            let words = chan.read_words()?;
            chan.assert_ack()?;
            Ok(words)
        })?;
        trace!(link = self.shared.id, ?words, "acknowledged");
        self.settle_out(until, MultiChannel::clear_ack)?;
        Ok(words)
    }
}

impl Consumer<ControlChannel> {
    /// Waits for one synchronization event and completes its cycle.
    pub fn wait(&self) -> Result<(), LinkError> { self.observe(None) }

    /// [`wait`](Self::wait) under a harness deadline.
    pub fn wait_timeout(&self, limit: Duration) -> Result<(), LinkError> {
        self.observe(Some(Instant::now() + limit))
    }

    fn observe(&self, until: Option<Instant>) -> Result<(), LinkError> {
        self.shared.wait_for(until, ControlChannel::is_complete)?;
        self.shared.update(ControlChannel::assert_ack)?;
        trace!(link = self.shared.id, "event acknowledged");
        self.settle_out(until, ControlChannel::clear_ack)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn rendezvous_carries_words_in_order() {
        let (tx, rx) = channel::<8>();
        let feeder = thread::spawn(move || {
            for word in [0x01, 0x80, 0xff, 0x00] {
                tx.send(word).unwrap();
            }
        });
        let got: Vec<u64> = (0..4).map(|_| rx.recv().unwrap()).collect();
        feeder.join().unwrap();
        assert_eq!(got, vec![0x01, 0x80, 0xff, 0x00]);
    }

    #[test]
    fn recv_on_idle_link_times_out() {
        let (_tx, rx) = channel::<4>();
        assert_eq!(rx.recv_timeout(Duration::from_millis(20)), Err(LinkError::Stalled));
    }

    #[test]
    fn send_without_consumer_reports_hangup() {
        let (tx, rx) = channel::<4>();
        drop(rx);
        assert_eq!(tx.send(3), Err(LinkError::Disconnected));
    }

    #[test]
    fn control_event_synchronizes() {
        let (start_tx, start_rx) = control_channel();
        let waiter = thread::spawn(move || start_rx.wait());
        start_tx.notify().unwrap();
        waiter.join().unwrap().unwrap();
    }
}
