//! Fused multi-payload channels.

use arrayvec::ArrayVec;

use crate::channel::{decode_rails, Wires};
use crate::fault::Fault;
use crate::phase::{FourPhase, Phase};
use crate::rail::RailPair;

/// `K` independent `W`-bit payloads under one shared acknowledge.
///
/// When operands are always produced and consumed together (the deployed
/// shape is `K = 3`: two factors and an incoming partial word arriving as
/// a unit), sharing one handshake avoids replicating a completion tree
/// per operand, at the cost of coupling their timing. One shared ack
/// means all `K` sub-payloads move between NULL and DATA in lockstep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiChannel<const W: usize, const K: usize = 3> {
    groups: [[RailPair; W]; K],
    hs: FourPhase,
}

impl<const W: usize, const K: usize> Default for MultiChannel<W, K> {
    fn default() -> Self { Self::new() }
}

impl<const W: usize, const K: usize> MultiChannel<W, K> {
    /// Quiescent channel: all `K * W` pairs NULL, ack clear.
    pub fn new() -> Self {
        assert!(W >= 1 && W <= 64, "payload width must be in 1..=64");
        assert!(K >= 1, "at least one payload group");
        MultiChannel { groups: [[RailPair::NULL; W]; K], hs: FourPhase::new() }
    }

    /// Producer side: asserts all `K` sub-payload wavefronts atomically.
    pub fn begin_transfer(&mut self, words: [u64; K]) -> Result<(), Fault> {
        self.hs.raise()?;
        for (group, &word) in self.groups.iter_mut().zip(words.iter()) {
            assert!(W == 64 || word >> W == 0, "word does not fit the payload width");
            for (i, pair) in group.iter_mut().enumerate() {
                *pair = RailPair::encode((word & (1 << i)) != 0);
            }
        }
        Ok(())
    }

    /// Producer side: returns every group to NULL after observing ack.
    pub fn return_to_null(&mut self) -> Result<(), Fault> {
        self.hs.retire()?;
        self.groups = [[RailPair::NULL; W]; K];
        Ok(())
    }

    /// Consumer side: decodes all `K` transferred words.
    pub fn read_words(&self) -> Result<[u64; K], Fault> {
        let mut words = ArrayVec::<u64, K>::new();
        for (j, group) in self.groups.iter().enumerate() {
            let (word, resolved) = decode_rails(group, j * W)?;
            if resolved != W {
                return Err(Fault::IncompleteRead { resolved, width: W });
            }
            words.push(word);
        }
        Ok(words.into_inner().expect("one word per group"))
    }

    /// Consumer side: asserts the shared ack for the fused word group.
    pub fn assert_ack(&mut self) -> Result<(), Fault> {
        for (j, group) in self.groups.iter().enumerate() {
            decode_rails(group, j * W)?;
        }
        self.hs.acknowledge(self.is_complete())
    }

    /// Consumer side: clears ack once every group is back at NULL.
    pub fn clear_ack(&mut self) -> Result<(), Fault> { self.hs.settle(self.is_null()) }

    /// Raw view of one payload group, for layout packing and traces.
    pub fn group(&self, payload: usize) -> &[RailPair] { &self.groups[payload] }

    /// Overrides one pair of one group, bypassing the protocol.
    /// Fault-injection hook for harnesses.
    pub fn force_pair(&mut self, payload: usize, bit: usize, pair: RailPair) {
        self.groups[payload][bit] = pair;
    }
}

impl<const W: usize, const K: usize> Wires for MultiChannel<W, K> {
    fn phase(&self) -> Phase { self.hs.phase() }

    fn ack(&self) -> bool { self.hs.ack() }

    /// Joint completion: all `K * W` pairs must have resolved. False
    /// whenever any one sub-payload is incomplete, even if the others are
    /// complete.
    fn is_complete(&self) -> bool {
        self.groups.iter().flatten().all(|pair| pair.is_complete())
    }

    fn is_null(&self) -> bool { self.groups.iter().flatten().all(|pair| pair.is_null()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fused_cycle_preserves_words() {
        let mut chan = MultiChannel::<4, 3>::new();
        chan.begin_transfer([0b1010, 0b0111, 0b0001]).unwrap();
        assert!(chan.is_complete());
        assert_eq!(chan.read_words().unwrap(), [0b1010, 0b0111, 0b0001]);
        chan.assert_ack().unwrap();
        chan.return_to_null().unwrap();
        chan.clear_ack().unwrap();
        assert_eq!(chan.phase(), Phase::Null);
    }

    #[test]
    fn one_incomplete_group_blocks_completion() {
        let mut chan = MultiChannel::<4, 3>::new();
        chan.begin_transfer([0xf, 0x0, 0x5]).unwrap();
        chan.force_pair(1, 2, RailPair::NULL);
        assert!(!chan.is_complete());
        assert!(matches!(chan.assert_ack(), Err(Fault::PhaseMismatch { .. })));
    }

    #[test]
    fn encoding_fault_reports_flat_pair_index() {
        let mut chan = MultiChannel::<4, 3>::new();
        chan.begin_transfer([0, 0, 0]).unwrap();
        chan.force_pair(2, 1, RailPair { pos: true, neg: true });
        assert_eq!(chan.read_words(), Err(Fault::EncodingViolation { bit: 9 }));
    }
}
