//! Control-only channels: a validity wire and an acknowledge, no payload.

use crate::channel::Wires;
use crate::fault::Fault;
use crate::phase::{FourPhase, Phase};

/// A degenerate one-bit channel for pure synchronization events.
///
/// DATA carries no information beyond "event occurred"; the four-phase
/// discipline is identical to the payload channels. Used to sequence
/// stages that need synchronization without data, such as start or flush
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChannel {
    valid: bool,
    hs: FourPhase,
}

impl Default for ControlChannel {
    fn default() -> Self { Self::new() }
}

impl ControlChannel {
    /// Quiescent channel: validity low, ack clear.
    pub const fn new() -> Self { ControlChannel { valid: false, hs: FourPhase::new() } }

    /// Producer side: raises the validity wire. The event itself is the
    /// datum.
    pub fn signal(&mut self) -> Result<(), Fault> {
        self.hs.raise()?;
        self.valid = true;
        Ok(())
    }

    /// Producer side: drops the validity wire after observing ack.
    pub fn clear(&mut self) -> Result<(), Fault> {
        self.hs.retire()?;
        self.valid = false;
        Ok(())
    }

    /// Consumer side: acknowledges the event.
    pub fn assert_ack(&mut self) -> Result<(), Fault> { self.hs.acknowledge(self.valid) }

    /// Consumer side: clears ack once the validity wire is back at NULL.
    pub fn clear_ack(&mut self) -> Result<(), Fault> { self.hs.settle(!self.valid) }

    /// Validity wire.
    pub const fn valid(self) -> bool { self.valid }
}

impl Wires for ControlChannel {
    fn phase(&self) -> Phase { self.hs.phase() }

    fn ack(&self) -> bool { self.hs.ack() }

    fn is_complete(&self) -> bool { self.valid }

    fn is_null(&self) -> bool { !self.valid }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_cycle() {
        let mut ctl = ControlChannel::new();
        ctl.signal().unwrap();
        assert!(ctl.is_complete());
        ctl.assert_ack().unwrap();
        ctl.clear().unwrap();
        assert!(ctl.is_null());
        ctl.clear_ack().unwrap();
        assert_eq!(ctl.phase(), Phase::Null);
    }

    #[test]
    fn ack_requires_the_event() {
        let mut ctl = ControlChannel::new();
        assert!(matches!(ctl.assert_ack(), Err(Fault::PhaseMismatch { .. })));
    }
}
