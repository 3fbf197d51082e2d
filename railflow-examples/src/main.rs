//! A clockless pipeline demo.
//!
//! A start token releases a fused-operand feed; a fused stage folds each
//! operand triple into one word, a short chain of opaque word stages
//! transforms it, and a sink drains the results. The stage closures are
//! opaque capabilities; only the handshake discipline is RailFlow's.

use std::thread;

use railflow::link;
use railflow_std::{chain, spawn_fused_stage, spawn_sink, spawn_stage};
use tracing::info;
use tracing_subscriber::EnvFilter;

const W: usize = 8;
const MASK: u64 = (1 << W) - 1;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let triples = [[3, 5, 1], [7, 7, 0], [255, 2, 4]];

    // operand triples arrive as one fused transfer: two factors and an
    // incoming partial word
    let (feed, operands) = link::multi_channel::<W, 3>();
    let (fused_out, fused_in) = link::channel::<W>();
    let fuser = spawn_fused_stage(operands, fused_out, |[a, b, carry_in]: [u64; 3]| {
        a.wrapping_mul(b).wrapping_add(carry_in) & MASK
    });

    // a short chain of opaque word stages behind the fused front
    let (chain_feed, drained, drivers) = chain::<W>(vec![
        Box::new(|word: u64| (word + 1) & MASK),
        Box::new(|word: u64| word ^ 0x0f),
    ]);
    let relay = spawn_stage(fused_in, chain_feed, |word: u64| word);
    let sink = spawn_sink(drained);

    // the feed holds its first wavefront until the start token arrives
    let (start, gate) = link::control_channel();
    let feeder = thread::spawn(move || -> Result<(), railflow::LinkError> {
        gate.wait()?;
        for words in triples {
            feed.send(words)?;
        }
        Ok(())
    });

    info!("releasing the start token");
    start.notify().expect("start token");

    feeder.join().expect("feeder thread").expect("fused transfers");
    fuser.join().expect("fused stage").expect("fused protocol");
    relay.join().expect("relay stage").expect("relay protocol");
    for driver in drivers {
        driver.join().expect("stage thread").expect("stage protocol");
    }

    let words = sink.join().expect("sink thread").expect("drained words");
    info!(?words, "pipeline drained");
    for (inputs, word) in triples.iter().zip(&words) {
        println!("{inputs:?} -> {word:#04x}");
    }
}
