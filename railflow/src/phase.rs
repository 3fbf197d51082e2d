//! Four-phase return-to-null handshake engine.

use crate::fault::Fault;

/// Phase of one transfer cycle.
///
/// Every channel kind cycles `Null -> Data -> Acked -> Spacer -> Null`
/// indefinitely; there is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Quiescent: rails NULL, ack clear. The only phase a wavefront may
    /// start from.
    Null,
    /// A DATA wavefront is asserted; the wavefront itself is the request.
    Data,
    /// The consumer has acknowledged a complete word. Ack may be held
    /// arbitrarily long.
    Acked,
    /// The producer has returned the rails to NULL; ack is still set.
    Spacer,
}

/// Sequencing engine shared by every channel kind.
///
/// Owns only the phase and the acknowledge wire. Payload rails stay with
/// the channel, which reports its completion and NULL observations in.
/// The producer side may call [`raise`](Self::raise) and
/// [`retire`](Self::retire); the consumer side may call
/// [`acknowledge`](Self::acknowledge) and [`settle`](Self::settle). That
/// single-writer split is the sole concurrency-safety mechanism of the
/// protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourPhase {
    phase: Phase,
    ack: bool,
}

impl Default for FourPhase {
    fn default() -> Self { Self::new() }
}

impl FourPhase {
    /// Engine at reset: quiescent, ack clear.
    pub const fn new() -> Self { FourPhase { phase: Phase::Null, ack: false } }

    /// Current phase.
    pub const fn phase(self) -> Phase { self.phase }

    /// Acknowledge wire.
    pub const fn ack(self) -> bool { self.ack }

    /// Producer asserts a new wavefront.
    ///
    /// Legal only from `Null` with ack cleared; overlapping wavefronts are
    /// the core safety violation of delay-insensitive signaling.
    pub fn raise(&mut self) -> Result<(), Fault> {
        if self.phase != Phase::Null || self.ack {
            return Err(Fault::PrematureWavefront { phase: self.phase });
        }
        self.phase = Phase::Data;
        Ok(())
    }

    /// Consumer asserts ack; `complete` is its locally detected
    /// completion.
    pub fn acknowledge(&mut self, complete: bool) -> Result<(), Fault> {
        if self.phase != Phase::Data {
            return Err(Fault::PhaseMismatch { phase: self.phase, op: "ack" });
        }
        if !complete {
            return Err(Fault::PhaseMismatch { phase: self.phase, op: "ack before completion" });
        }
        self.ack = true;
        self.phase = Phase::Acked;
        Ok(())
    }

    /// Producer retires the wavefront after observing ack.
    pub fn retire(&mut self) -> Result<(), Fault> {
        if self.phase != Phase::Acked {
            return Err(Fault::PhaseMismatch { phase: self.phase, op: "return-to-null" });
        }
        self.phase = Phase::Spacer;
        Ok(())
    }

    /// Consumer clears ack; `null_seen` is its observation of the full
    /// NULL spacer.
    pub fn settle(&mut self, null_seen: bool) -> Result<(), Fault> {
        if self.phase != Phase::Spacer {
            return Err(Fault::PhaseMismatch { phase: self.phase, op: "ack-clear" });
        }
        if !null_seen {
            return Err(Fault::PhaseMismatch { phase: self.phase, op: "ack-clear before NULL" });
        }
        self.ack = false;
        self.phase = Phase::Null;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_cycle() {
        let mut hs = FourPhase::new();
        for _ in 0..3 {
            hs.raise().unwrap();
            hs.acknowledge(true).unwrap();
            assert!(hs.ack());
            hs.retire().unwrap();
            assert!(hs.ack());
            hs.settle(true).unwrap();
            assert_eq!(hs.phase(), Phase::Null);
            assert!(!hs.ack());
        }
    }

    #[test]
    fn overlapping_wavefront_is_premature() {
        let mut hs = FourPhase::new();
        hs.raise().unwrap();
        assert_eq!(hs.raise(), Err(Fault::PrematureWavefront { phase: Phase::Data }));

        hs.acknowledge(true).unwrap();
        hs.retire().unwrap();
        // ack still set during the spacer: a new wavefront stays illegal
        assert_eq!(hs.raise(), Err(Fault::PrematureWavefront { phase: Phase::Spacer }));
    }

    #[test]
    fn ack_requires_completion() {
        let mut hs = FourPhase::new();
        hs.raise().unwrap();
        assert!(matches!(hs.acknowledge(false), Err(Fault::PhaseMismatch { .. })));
        assert_eq!(hs.phase(), Phase::Data);
        hs.acknowledge(true).unwrap();
    }

    #[test]
    fn ack_clear_requires_spacer_and_null() {
        let mut hs = FourPhase::new();
        hs.raise().unwrap();
        hs.acknowledge(true).unwrap();
        assert!(matches!(hs.settle(true), Err(Fault::PhaseMismatch { .. })));
        hs.retire().unwrap();
        assert!(matches!(hs.settle(false), Err(Fault::PhaseMismatch { .. })));
        hs.settle(true).unwrap();
    }
}
