//! Control layer for SDRplay RSP receivers.
//!
//! Wraps the native `mir_sdr` API: builds a receiver configuration from
//! options, decides whether a change can be applied live or needs a stream
//! reinit, and forwards the I/Q batches the driver delivers on its own
//! thread to a [`Connector`].
//!
//! Only one receiver can own the hardware at a time. Opening a new one
//! through [`ReceiverManager::open`] deactivates the previous handle.
//!
//! ```no_run
//! # #[cfg(feature = "mirsdr")]
//! # fn main() -> librsp::Result<()> {
//! use std::sync::Arc;
//! use librsp::{ChannelConnector, ConfigOption, MirSdr, ReceiverManager};
//!
//! let manager = ReceiverManager::new(MirSdr::new())?;
//! let (sink, batches) = ChannelConnector::bounded(64);
//! let rx = manager.open(Some(Arc::new(sink)), [ConfigOption::initial_rf(96.3)])?;
//! rx.tune(98.1e6)?;
//! let batch = batches.recv().unwrap();
//! println!("{} samples", batch.len());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mirsdr"))]
//! # fn main() {}
//! ```

pub mod band;
pub mod config;
pub mod connector;
pub mod driver;
pub mod error;
#[cfg(feature = "mirsdr")]
mod ffi;
pub mod mock;
pub mod receiver;
pub mod reinit;
pub mod stream;

pub use band::Band;
pub use config::{
    AgcMode, Bandwidth, Config, ConfigOption, DcOffsetMode, Decimation, IfMode, LoMode, TrackTime,
};
pub use connector::{ChannelConnector, Connector, IqBatch};
pub use driver::{Driver, Registers, ReinitReason, StreamParams, MIR_SDR_API_VERSION};
pub use error::{Error, ErrorCode, Result};
#[cfg(feature = "mirsdr")]
pub use ffi::MirSdr;
pub use receiver::{Amplifier, Receiver, ReceiverManager, Tuner};
pub use stream::{BatchFlags, BridgeStats, StreamBridge};
