//! Wire-level walkthroughs of the four-phase cycle, including the fault
//! scenarios a harness is expected to force.

use railflow::{Channel, Fault, Phase, RailPair, Wires};

/// The w=4 walkthrough: a wavefront resolving pair by pair completes only
/// when the last pair resolves, reads back exactly, and finishes its
/// cycle through ack, spacer, and ack-clear.
#[test]
fn staggered_wavefront_resolves_then_reads_back() {
    let mut chan = Channel::<4>::new();
    chan.begin_transfer(0b1010).unwrap();

    // hold the wavefront in flight: every pair forced back to NULL
    let driven: Vec<RailPair> = chan.rails().to_vec();
    for bit in 0..4 {
        chan.force_pair(bit, RailPair::NULL);
    }

    // completion only once all four pairs have individually resolved
    for bit in 0..4 {
        assert!(!chan.is_complete());
        assert!(matches!(chan.read_word(), Err(Fault::IncompleteRead { .. })));
        chan.force_pair(bit, driven[bit]);
    }
    assert!(chan.is_complete());
    assert_eq!(chan.read_word().unwrap(), 0b1010);

    chan.assert_ack().unwrap();
    assert!(chan.ack());
    chan.return_to_null().unwrap();
    assert!(chan.is_null());
    chan.clear_ack().unwrap();
    assert_eq!(chan.phase(), Phase::Null);
    assert!(!chan.ack());
}

/// Completion is monotonic within a cycle: once detected it holds until
/// the producer's NULL phase, across reads and the ack.
#[test]
fn completion_does_not_flicker() {
    let mut chan = Channel::<4>::new();
    chan.begin_transfer(0b0110).unwrap();
    assert!(chan.is_complete());
    let _ = chan.read_word().unwrap();
    assert!(chan.is_complete());
    chan.assert_ack().unwrap();
    assert!(chan.is_complete());
    chan.return_to_null().unwrap();
    assert!(!chan.is_complete());
}

/// Forcing ack before completion is rejected with a phase mismatch.
#[test]
fn forced_early_ack_rejected() {
    let mut chan = Channel::<4>::new();
    chan.begin_transfer(0b1010).unwrap();
    chan.force_pair(3, RailPair::NULL);
    assert_eq!(
        chan.assert_ack(),
        Err(Fault::PhaseMismatch { phase: Phase::Data, op: "ack before completion" })
    );
}

/// Forcing both rails of one pair high is rejected with an encoding
/// violation on every consumer-side path.
#[test]
fn forced_double_rail_rejected() {
    let mut chan = Channel::<4>::new();
    chan.begin_transfer(0b1010).unwrap();
    chan.force_pair(2, RailPair { pos: true, neg: true });
    assert_eq!(chan.read_word(), Err(Fault::EncodingViolation { bit: 2 }));
    assert_eq!(chan.assert_ack(), Err(Fault::EncodingViolation { bit: 2 }));
}

/// The producer may not reassert DATA until ack has been observed, the
/// channel returned to NULL, and ack cleared.
#[test]
fn wavefront_sequencing_is_strict() {
    let mut chan = Channel::<4>::new();
    chan.begin_transfer(0b0001).unwrap();
    assert!(matches!(chan.begin_transfer(0b0010), Err(Fault::PrematureWavefront { phase: Phase::Data })));

    chan.assert_ack().unwrap();
    assert!(matches!(chan.begin_transfer(0b0010), Err(Fault::PrematureWavefront { phase: Phase::Acked })));

    chan.return_to_null().unwrap();
    // rails are NULL but ack has not cleared: the spacer is mandatory
    assert!(matches!(chan.begin_transfer(0b0010), Err(Fault::PrematureWavefront { phase: Phase::Spacer })));

    chan.clear_ack().unwrap();
    chan.begin_transfer(0b0010).unwrap();
    assert_eq!(chan.read_word().unwrap(), 0b0010);
}

/// A fault on one channel leaves an unrelated channel untouched.
#[test]
fn faults_stay_local() {
    let mut bad = Channel::<4>::new();
    let mut good = Channel::<4>::new();
    bad.begin_transfer(0xf).unwrap();
    bad.force_pair(0, RailPair { pos: true, neg: true });
    assert!(bad.read_word().is_err());

    good.begin_transfer(0x5).unwrap();
    assert_eq!(good.read_word().unwrap(), 0x5);
    good.assert_ack().unwrap();
    good.return_to_null().unwrap();
    good.clear_ack().unwrap();
}
