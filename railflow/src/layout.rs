//! Bit-exact wire layout of channel snapshots.
//!
//! The flat layouts here are the externally observed contract any
//! interoperating component (reference model, test harness) must
//! reproduce; bit positions are preserved exactly. LSB first: the
//! acknowledge always sits at bit 0, payload group `j` of width `w` at
//! `[2(j+1)w : 2jw+1]`, and a control-only channel is two bits with the
//! validity at bit 1.

use itertools::Itertools;
use static_assertions::const_assert_eq;
use thiserror::Error;

use crate::channel::{Channel, Wires};
use crate::control::ControlChannel;
use crate::fault::Fault;
use crate::multi::MultiChannel;
use crate::rail::{RailPair, RailState};

/// Which half of a payload group carries the true rails.
///
/// The gate-level material this layout interoperates with is inconsistent
/// about the convention, so every entry point takes it explicitly instead
/// of baking one in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RailOrder {
    /// Complement rails in the low half `[w:1]`, true rails in the high
    /// half `[2w:w+1]`.
    #[default]
    NegLowPosHigh,
    /// True rails in the low half, complement rails in the high half.
    PosLowNegHigh,
}

impl RailOrder {
    /// Splits a pair into `(low half, high half)` wire values.
    const fn split(self, pair: RailPair) -> (bool, bool) {
        match self {
            RailOrder::NegLowPosHigh => (pair.neg, pair.pos),
            RailOrder::PosLowNegHigh => (pair.pos, pair.neg),
        }
    }

    /// Rebuilds a pair from `(low half, high half)` wire values.
    const fn join(self, low: bool, high: bool) -> RailPair {
        match self {
            RailOrder::NegLowPosHigh => RailPair { pos: high, neg: low },
            RailOrder::PosLowNegHigh => RailPair { pos: low, neg: high },
        }
    }
}

/// Bit position of the acknowledge wire in every layout.
pub const ACK_BIT: usize = 0;

/// Total width of a single-payload channel of payload width `w`.
pub const fn single_width(w: usize) -> usize { 2 * w + 1 }

/// Total width of a `k`-payload channel of payload width `w`.
pub const fn multi_width(w: usize, k: usize) -> usize { 2 * k * w + 1 }

/// Total width of a control-only channel.
pub const CONTROL_WIDTH: usize = 2;

// pins of the published layout table
const_assert_eq!(single_width(4), 9);
const_assert_eq!(multi_width(4, 3), 25);

/// Layout errors for the flat-vector side of the ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The flat vector does not have the width the layout calls for.
    #[error("bit vector carries {got} bits, the layout needs {need}")]
    WidthMismatch {
        /// Bits required by the layout.
        need: usize,
        /// Bits supplied.
        got: usize,
    },
    /// A fault encoded in the snapshot itself.
    #[error(transparent)]
    Fault(#[from] Fault),
}

/// Packs payload groups and the ack into the flat layout. All groups must
/// share one width.
pub fn pack_groups(groups: &[&[RailPair]], ack: bool, order: RailOrder) -> Vec<bool> {
    let w = groups.first().map_or(0, |group| group.len());
    let mut bits = vec![false; multi_width(w, groups.len())];
    bits[ACK_BIT] = ack;
    for (j, group) in groups.iter().enumerate() {
        assert_eq!(group.len(), w, "payload groups must share one width");
        let base = 2 * j * w + 1;
        for (i, pair) in group.iter().enumerate() {
            let (low, high) = order.split(*pair);
            bits[base + i] = low;
            bits[base + w + i] = high;
        }
    }
    bits
}

/// Unpacks `k` payload groups of width `w` plus the ack from the flat
/// layout. A double-asserted pair in the snapshot is reported as the
/// encoding fault it is.
pub fn unpack_groups(
    bits: &[bool], w: usize, k: usize, order: RailOrder,
) -> Result<(Vec<Vec<RailPair>>, bool), LayoutError> {
    let need = multi_width(w, k);
    if bits.len() != need {
        return Err(LayoutError::WidthMismatch { need, got: bits.len() });
    }
    let ack = bits[ACK_BIT];
    let mut groups = Vec::with_capacity(k);
    for j in 0..k {
        let base = 2 * j * w + 1;
        let group = bits[base..base + w]
            .iter()
            .zip_eq(&bits[base + w..base + 2 * w])
            .map(|(&low, &high)| order.join(low, high))
            .collect_vec();
        for (i, pair) in group.iter().enumerate() {
            if pair.state() == RailState::Illegal {
                return Err(Fault::EncodingViolation { bit: j * w + i }.into());
            }
        }
        groups.push(group);
    }
    Ok((groups, ack))
}

/// Packs a single-payload snapshot: ack at bit 0, rails at `[2w:1]`.
pub fn pack_single(rails: &[RailPair], ack: bool, order: RailOrder) -> Vec<bool> {
    pack_groups(&[rails], ack, order)
}

/// Unpacks a single-payload snapshot of payload width `w`.
pub fn unpack_single(bits: &[bool], w: usize, order: RailOrder) -> Result<(Vec<RailPair>, bool), LayoutError> {
    let (mut groups, ack) = unpack_groups(bits, w, 1, order)?;
    Ok((groups.pop().expect("exactly one group"), ack))
}

/// Packs a control-only snapshot: ack at bit 0, validity at bit 1.
pub fn pack_control(valid: bool, ack: bool) -> [bool; CONTROL_WIDTH] { [ack, valid] }

/// Unpacks a control-only snapshot.
pub fn unpack_control(bits: &[bool]) -> Result<(bool, bool), LayoutError> {
    if bits.len() != CONTROL_WIDTH {
        return Err(LayoutError::WidthMismatch { need: CONTROL_WIDTH, got: bits.len() });
    }
    Ok((bits[1], bits[ACK_BIT]))
}

impl<const W: usize> Channel<W> {
    /// Flat wire image of the channel under the given rail order.
    pub fn pack(&self, order: RailOrder) -> Vec<bool> { pack_single(self.rails(), self.ack(), order) }
}

impl<const W: usize, const K: usize> MultiChannel<W, K> {
    /// Flat wire image of the channel under the given rail order.
    pub fn pack(&self, order: RailOrder) -> Vec<bool> {
        let groups = (0..K).map(|payload| self.group(payload)).collect_vec();
        pack_groups(&groups, self.ack(), order)
    }
}

impl ControlChannel {
    /// Flat wire image of the channel.
    pub fn pack(&self) -> [bool; CONTROL_WIDTH] { pack_control(self.valid(), self.ack()) }
}
