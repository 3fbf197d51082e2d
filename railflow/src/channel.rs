//! Single-payload dual-rail channels.

use crate::fault::Fault;
use crate::phase::{FourPhase, Phase};
use crate::rail::{RailPair, RailState};

/// Wire-level observations every channel kind exposes to the handshake.
///
/// The rendezvous endpoints in [`crate::link`] drive any implementor
/// through the four-phase cycle using only these observations.
pub trait Wires {
    /// Current phase.
    fn phase(&self) -> Phase;

    /// Acknowledge wire.
    fn ack(&self) -> bool;

    /// Locally detected completion of the current wavefront.
    fn is_complete(&self) -> bool;

    /// True iff the payload wires are all at NULL.
    fn is_null(&self) -> bool;
}

/// The shared wires of one `W`-bit transfer: `W` rail pairs plus one
/// acknowledge.
///
/// A channel is a rendezvous object jointly owned by the two adjacent
/// stages. The producer writes the rails (the wavefront is the request);
/// the consumer writes the ack. No method here blocks; the blocking
/// endpoints live in [`crate::link`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel<const W: usize> {
    rails: [RailPair; W],
    hs: FourPhase,
}

impl<const W: usize> Default for Channel<W> {
    fn default() -> Self { Self::new() }
}

impl<const W: usize> Channel<W> {
    /// Quiescent channel: all rails NULL, ack clear.
    pub fn new() -> Self {
        assert!(W >= 1 && W <= 64, "payload width must be in 1..=64");
        Channel { rails: [RailPair::NULL; W], hs: FourPhase::new() }
    }

    /// Producer side: asserts the dual-rail codeword for `word` across
    /// all `W` pairs in one logical step.
    ///
    /// Precondition: the channel is NULL and the previous acknowledge has
    /// cleared; otherwise [`Fault::PrematureWavefront`].
    pub fn begin_transfer(&mut self, word: u64) -> Result<(), Fault> {
        assert!(W == 64 || word >> W == 0, "word does not fit the payload width");
        self.hs.raise()?;
        for (i, pair) in self.rails.iter_mut().enumerate() {
            *pair = RailPair::encode((word & (1 << i)) != 0);
        }
        Ok(())
    }

    /// Producer side: returns the rails to NULL after observing ack.
    pub fn return_to_null(&mut self) -> Result<(), Fault> {
        self.hs.retire()?;
        self.rails = [RailPair::NULL; W];
        Ok(())
    }

    /// Consumer side: decodes the transferred word.
    ///
    /// Valid only once completion holds; earlier reads fault with
    /// [`Fault::IncompleteRead`].
    pub fn read_word(&self) -> Result<u64, Fault> {
        let (word, resolved) = decode_rails(&self.rails, 0)?;
        if resolved != W {
            return Err(Fault::IncompleteRead { resolved, width: W });
        }
        Ok(word)
    }

    /// Consumer side: asserts ack for a fully consumed word. Ack may then
    /// be held arbitrarily long.
    pub fn assert_ack(&mut self) -> Result<(), Fault> {
        // a double-asserted pair is an encoding fault, not a bare
        // incomplete ack
        decode_rails(&self.rails, 0)?;
        self.hs.acknowledge(self.is_complete())
    }

    /// Consumer side: clears ack once the full NULL spacer is observed,
    /// completing the cycle.
    pub fn clear_ack(&mut self) -> Result<(), Fault> { self.hs.settle(self.is_null()) }

    /// Raw view of the rails, for layout packing and traces.
    pub fn rails(&self) -> &[RailPair] { &self.rails }

    /// Overrides one pair, bypassing the protocol.
    ///
    /// Fault-injection hook for harnesses; conformant drivers never call
    /// it. The phase bookkeeping is left untouched, so subsequent legal
    /// operations report whatever fault the injected wires provoke.
    pub fn force_pair(&mut self, bit: usize, pair: RailPair) { self.rails[bit] = pair; }
}

impl<const W: usize> Wires for Channel<W> {
    fn phase(&self) -> Phase { self.hs.phase() }

    fn ack(&self) -> bool { self.hs.ack() }

    /// AND over per-pair completion: the completion-detection tree is
    /// local and monotonic within a cycle, with no timing assumption.
    fn is_complete(&self) -> bool { self.rails.iter().all(|pair| pair.is_complete()) }

    fn is_null(&self) -> bool { self.rails.iter().all(|pair| pair.is_null()) }
}

/// Decodes a group of pairs into `(word, resolved count)`, faulting on a
/// double-asserted pair. `base` offsets the reported pair index.
pub(crate) fn decode_rails(rails: &[RailPair], base: usize) -> Result<(u64, usize), Fault> {
    let mut word = 0;
    let mut resolved = 0;
    for (i, pair) in rails.iter().enumerate() {
        match pair.state() {
            RailState::Illegal => return Err(Fault::EncodingViolation { bit: base + i }),
            RailState::Null => {}
            RailState::Zero => resolved += 1,
            RailState::One => {
                word |= 1 << i;
                resolved += 1;
            }
        }
    }
    Ok((word, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_preserves_word() {
        let mut chan = Channel::<8>::new();
        chan.begin_transfer(0xa5).unwrap();
        assert!(chan.is_complete());
        assert_eq!(chan.read_word().unwrap(), 0xa5);
        chan.assert_ack().unwrap();
        chan.return_to_null().unwrap();
        assert!(chan.is_null());
        chan.clear_ack().unwrap();
        assert_eq!(chan.phase(), Phase::Null);
    }

    #[test]
    fn premature_wavefront_rejected() {
        let mut chan = Channel::<4>::new();
        chan.begin_transfer(0b0011).unwrap();
        assert_eq!(chan.begin_transfer(0b0100), Err(Fault::PrematureWavefront { phase: Phase::Data }));
    }

    #[test]
    fn read_before_completion_rejected() {
        let mut chan = Channel::<4>::new();
        assert_eq!(chan.read_word(), Err(Fault::IncompleteRead { resolved: 0, width: 4 }));
        chan.begin_transfer(0b1100).unwrap();
        chan.force_pair(2, RailPair::NULL);
        assert_eq!(chan.read_word(), Err(Fault::IncompleteRead { resolved: 3, width: 4 }));
    }

    #[test]
    fn injected_double_rail_is_an_encoding_fault() {
        let mut chan = Channel::<4>::new();
        chan.begin_transfer(0b1010).unwrap();
        chan.force_pair(1, RailPair { pos: true, neg: true });
        assert_eq!(chan.read_word(), Err(Fault::EncodingViolation { bit: 1 }));
        assert_eq!(chan.assert_ack(), Err(Fault::EncodingViolation { bit: 1 }));
    }
}
