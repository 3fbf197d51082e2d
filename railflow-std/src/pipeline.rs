//! Pipeline assembly and harness deadlines.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use railflow::link::{self, Consumer, LinkError, Producer};
use railflow::Channel;

use crate::stage::{spawn_stage, Stage};

/// Chains `stages` over fresh links.
///
/// Returns the feed producer, the drain consumer, and one join handle per
/// stage. Each inter-stage link cycles independently: the handshakes of a
/// long chain sit in different phases at the same time, which is where
/// the pipelining comes from.
pub fn chain<const W: usize>(
    stages: Vec<Box<dyn Stage>>,
) -> (Producer<Channel<W>>, Consumer<Channel<W>>, Vec<JoinHandle<Result<(), LinkError>>>) {
    let (feed, mut upstream) = link::channel::<W>();
    let mut drivers = Vec::with_capacity(stages.len());
    for stage in stages {
        let (output, downstream) = link::channel::<W>();
        drivers.push(spawn_stage(upstream, output, stage));
        upstream = downstream;
    }
    (feed, upstream, drivers)
}

/// Runs `f` on a helper thread and reports [`LinkError::Stalled`] if it
/// outlives `limit`.
///
/// The protocol itself is blocking with no timeout, so this is how a
/// verification harness turns a deadlocked pipeline into a
/// counterexample. On a miss the helper thread is left parked on its
/// rendezvous; tearing it down is a process-level concern.
pub fn with_deadline<T: Send + 'static>(
    limit: Duration, f: impl FnOnce() -> T + Send + 'static,
) -> Result<T, LinkError> {
    let (done, report) = mpsc::channel();
    thread::spawn(move || {
        let _ = done.send(f());
    });
    report.recv_timeout(limit).map_err(|_| LinkError::Stalled)
}
