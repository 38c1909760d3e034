//! The boundary to the native RSP API.
//!
//! Every primitive returns the raw `mir_sdr_ErrT` status so that mapping into
//! [`Error`](crate::Error) happens in exactly one place.

use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use crate::config::{AgcMode, Bandwidth, Config, IfMode, LoMode};
use crate::stream::StreamBridge;

/// API version the bindings were written against.
pub const MIR_SDR_API_VERSION: f32 = 2.13;

/// Which parameter groups changed, as passed to `mir_sdr_Reinit`
/// (`mir_sdr_ReasonForReinitT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReinitReason(u32);

impl ReinitReason {
    pub const NONE: ReinitReason = ReinitReason(0x00);
    pub const GAIN: ReinitReason = ReinitReason(0x01);
    pub const SAMPLE_RATE: ReinitReason = ReinitReason(0x02);
    pub const RF_FREQ: ReinitReason = ReinitReason(0x04);
    pub const BANDWIDTH: ReinitReason = ReinitReason(0x08);
    pub const IF_TYPE: ReinitReason = ReinitReason(0x10);
    pub const LO_MODE: ReinitReason = ReinitReason(0x20);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: ReinitReason) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ReinitReason {
    type Output = ReinitReason;

    fn bitor(self, rhs: ReinitReason) -> ReinitReason {
        ReinitReason(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReinitReason {
    fn bitor_assign(&mut self, rhs: ReinitReason) {
        self.0 |= rhs.0;
    }
}

/// Auxiliary registers shared with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    /// Requested gain reduction, dB.
    pub gr_db: i32,
    /// System gain reduction reported back in alternate gain mode, dB.
    pub gr_system_db: i32,
    pub samples_per_packet: i32,
    pub use_gr_alt_mode: bool,
}

impl Registers {
    /// Registers as they must be before a (re)initialisation.
    pub fn reset(initial_gr_db: i32) -> Self {
        Registers {
            gr_db: initial_gr_db,
            gr_system_db: 0,
            samples_per_packet: 0,
            use_gr_alt_mode: true,
        }
    }

    /// Pick up the values the driver wrote back.
    pub fn absorb(&mut self, params: &StreamParams) {
        self.gr_db = params.gr_db;
        self.gr_system_db = params.gr_system_db;
        self.samples_per_packet = params.samples_per_packet;
    }
}

/// Full parameter set for `mir_sdr_StreamInit` / `mir_sdr_Reinit`.
///
/// `gr_db`, `gr_system_db` and `samples_per_packet` are in/out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamParams {
    pub gr_db: i32,
    pub sample_rate_mhz: f64,
    pub rf_mhz: f64,
    pub bandwidth: Bandwidth,
    pub if_mode: IfMode,
    pub lo_mode: LoMode,
    pub lna_enable: bool,
    pub gr_system_db: i32,
    pub use_gr_alt_mode: bool,
    pub samples_per_packet: i32,
}

impl StreamParams {
    pub fn new(cfg: &Config, regs: &Registers) -> Self {
        StreamParams {
            gr_db: regs.gr_db,
            sample_rate_mhz: cfg.sample_rate_mhz,
            rf_mhz: cfg.rf_mhz,
            bandwidth: cfg.bandwidth,
            if_mode: cfg.if_mode,
            lo_mode: cfg.lo_mode,
            lna_enable: cfg.lna,
            gr_system_db: regs.gr_system_db,
            use_gr_alt_mode: regs.use_gr_alt_mode,
            samples_per_packet: regs.samples_per_packet,
        }
    }
}

/// Native RSP primitives.
pub trait Driver: Send {
    fn api_version(&mut self, version: &mut f32) -> i32;

    /// Start streaming. The driver keeps `bridge` alive and feeds it from its
    /// own thread until [`stream_uninit`](Driver::stream_uninit).
    fn stream_init(&mut self, params: &mut StreamParams, bridge: Arc<StreamBridge>) -> i32;

    /// Reinitialise with a complete parameter set; `reason` says which parts
    /// actually changed.
    fn stream_reinit(&mut self, params: &mut StreamParams, reason: ReinitReason) -> i32;

    fn stream_uninit(&mut self) -> i32;

    fn set_rf(&mut self, freq_hz: f64, absolute: bool, sync_update: bool) -> i32;

    fn set_gr_alt_mode(
        &mut self,
        gr_db: &mut i32,
        lna_enable: bool,
        gr_system_db: &mut i32,
        absolute: bool,
        sync_update: bool,
    ) -> i32;

    /// `mode` is the native DC offset mode, 0..=5.
    fn set_dc_mode(&mut self, mode: i32, speed_up: bool) -> i32;

    fn set_dc_track_time(&mut self, track_time: u8) -> i32;

    fn set_ppm(&mut self, ppm: f64) -> i32;

    fn set_lo_mode(&mut self, mode: LoMode) -> i32;

    fn decimate_control(&mut self, enable: bool, factor: u32, wide_band: bool) -> i32;

    fn agc_control(&mut self, mode: AgcMode, set_point_dbfs: i32, lna_enable: bool) -> i32;

    fn dc_offset_iq_imbalance_control(&mut self, dc_offset: bool, iq_imbalance: bool) -> i32;

    fn debug_enable(&mut self, enable: bool) -> i32;
}
