//! Opaque pipeline stages driven over rendezvous links.

use std::thread::{self, JoinHandle};

use tracing::debug;

use railflow::link::{Consumer, LinkError, Producer};
use railflow::{Channel, ControlChannel, MultiChannel};

/// The opaque capability a pipeline stage plugs into the protocol.
///
/// The protocol is algorithm-agnostic: whatever arithmetic or routing a
/// stage performs stays behind this trait, and the stage driver moves the
/// words exactly per the handshake contract.
pub trait Stage: Send {
    /// Transforms one transferred word into the next wavefront's word.
    fn consume(&mut self, word: u64) -> u64;
}

impl<F: FnMut(u64) -> u64 + Send> Stage for F {
    fn consume(&mut self, word: u64) -> u64 { self(word) }
}

impl Stage for Box<dyn Stage> {
    fn consume(&mut self, word: u64) -> u64 { (**self).consume(word) }
}

/// A stage consuming one fused `K`-operand transfer per output word.
pub trait FusedStage<const K: usize>: Send {
    /// Transforms one fused word group into the next wavefront's word.
    fn consume(&mut self, words: [u64; K]) -> u64;
}

impl<const K: usize, F: FnMut([u64; K]) -> u64 + Send> FusedStage<K> for F {
    fn consume(&mut self, words: [u64; K]) -> u64 { self(words) }
}

/// Drives `stage` between two links until the upstream hangs up.
///
/// An upstream hangup is the orderly end of the stream and returns
/// `Ok(())`; every other condition, including a downstream hangup,
/// propagates.
pub fn spawn_stage<const W: usize, const X: usize>(
    input: Consumer<Channel<W>>, output: Producer<Channel<X>>, mut stage: impl Stage + 'static,
) -> JoinHandle<Result<(), LinkError>> {
    thread::spawn(move || loop {
        let word = match input.recv() {
            Ok(word) => word,
            Err(LinkError::Disconnected) => {
                debug!("upstream hung up, stage retiring");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        output.send(stage.consume(word))?;
    })
}

/// Drives a fused-operand stage from a `K`-payload link onto a
/// single-payload link.
pub fn spawn_fused_stage<const W: usize, const K: usize, const X: usize>(
    input: Consumer<MultiChannel<W, K>>, output: Producer<Channel<X>>,
    mut stage: impl FusedStage<K> + 'static,
) -> JoinHandle<Result<(), LinkError>> {
    thread::spawn(move || loop {
        let words = match input.recv() {
            Ok(words) => words,
            Err(LinkError::Disconnected) => {
                debug!("upstream hung up, fused stage retiring");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        output.send(stage.consume(words))?;
    })
}

/// Feeds `words` into the pipeline one cycle at a time, then hangs up.
pub fn spawn_source<const W: usize>(
    output: Producer<Channel<W>>, words: impl IntoIterator<Item = u64> + Send + 'static,
) -> JoinHandle<Result<(), LinkError>> {
    thread::spawn(move || {
        for word in words {
            output.send(word)?;
        }
        Ok(())
    })
}

/// A source that holds its first wavefront until the start token arrives
/// on the control link.
pub fn spawn_gated_source<const W: usize>(
    gate: Consumer<ControlChannel>, output: Producer<Channel<W>>,
    words: impl IntoIterator<Item = u64> + Send + 'static,
) -> JoinHandle<Result<(), LinkError>> {
    thread::spawn(move || {
        gate.wait()?;
        for word in words {
            output.send(word)?;
        }
        Ok(())
    })
}

/// Feeds fused word groups into the pipeline, then hangs up.
pub fn spawn_multi_source<const W: usize, const K: usize>(
    output: Producer<MultiChannel<W, K>>,
    groups: impl IntoIterator<Item = [u64; K]> + Send + 'static,
) -> JoinHandle<Result<(), LinkError>> {
    thread::spawn(move || {
        for words in groups {
            output.send(words)?;
        }
        Ok(())
    })
}

/// Drains the pipeline until the upstream hangs up, collecting the words
/// in transfer order.
pub fn spawn_sink<const W: usize>(
    input: Consumer<Channel<W>>,
) -> JoinHandle<Result<Vec<u64>, LinkError>> {
    thread::spawn(move || {
        let mut words = Vec::new();
        loop {
            match input.recv() {
                Ok(word) => words.push(word),
                Err(LinkError::Disconnected) => return Ok(words),
                Err(err) => return Err(err),
            }
        }
    })
}
