//! Open an RSP, tune through a few frequencies and report batch statistics.
//!
//! Run with `RUST_LOG=debug cargo run --example rsp_capture --features mirsdr`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use librsp::{ChannelConnector, ConfigOption, DcOffsetMode, MirSdr, ReceiverManager};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let manager = ReceiverManager::new(MirSdr::new())?;
    let (sink, batches) = ChannelConnector::bounded(256);
    let sink = Arc::new(sink);
    let rx = manager.open(
        Some(sink.clone()),
        [
            ConfigOption::initial_rf(96.3),
            ConfigOption::initial_gr(40),
            ConfigOption::dc_mode(DcOffsetMode::Periodic6ms),
            ConfigOption::dc_track_time(30),
        ],
    )?;

    for freq in [96.3e6, 98.1e6, 145.5e6] {
        rx.tune(freq)?;
        let start = Instant::now();
        let mut samples = 0usize;
        while start.elapsed() < Duration::from_secs(1) {
            if let Ok(batch) = batches.recv_timeout(Duration::from_millis(100)) {
                samples += batch.len();
            }
        }
        println!(
            "{:>8.3} MHz  {:>9} samples/s  {:?}",
            freq / 1e6,
            samples,
            rx.band()?
        );
    }

    rx.gain(20)?;
    println!("{:?}", rx.registers()?);
    println!("{:?}, connector dropped {}", rx.stats(), sink.dropped());

    rx.uninit()?;
    Ok(())
}
