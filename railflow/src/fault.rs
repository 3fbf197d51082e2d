//! Fault taxonomy of the dual-rail handshake.

use thiserror::Error;

use crate::phase::Phase;

/// Protocol faults.
///
/// Every fault is local to the offending channel and never propagates to
/// unrelated channels. The protocol has no retry semantics: a malformed
/// wavefront cannot be re-attempted, so a harness surfaces faults as
/// counterexamples instead of recovering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    /// Both rails of one pair observed asserted. Fatal: signals a
    /// hardware/model fault, never expected in a conformant run.
    #[error("both rails asserted on pair {bit}")]
    EncodingViolation {
        /// Flat index of the offending pair within the channel.
        bit: usize,
    },

    /// DATA asserted before the previous cycle's NULL-return and
    /// ack-clear were observed.
    #[error("wavefront asserted in phase {phase:?} before the channel settled")]
    PrematureWavefront {
        /// Phase the channel was in when the wavefront arrived.
        phase: Phase,
    },

    /// Payload read attempted before completion was detected.
    #[error("payload read with {resolved} of {width} pairs resolved")]
    IncompleteRead {
        /// Pairs that had individually resolved at the time of the read.
        resolved: usize,
        /// Payload width of the channel.
        width: usize,
    },

    /// Ack asserted without a matching completion, or cleared without
    /// observing the NULL spacer.
    #[error("{op} illegal in phase {phase:?}")]
    PhaseMismatch {
        /// Phase the channel was in.
        phase: Phase,
        /// The rejected operation.
        op: &'static str,
    },
}
