//! Receiver configuration and the options that build it.
//!
//! A [`Config`] is a plain value. Options are pure mutators: each one takes a
//! `Config` and returns a new one, and a list of options is folded left to
//! right, so a later option for the same field wins.

/// Default receiver settings.
pub mod defaults {
    use super::{Bandwidth, IfMode, LoMode};

    /// Initial RF frequency in MHz.
    pub const RF_MHZ: f64 = 102.0;

    /// Sample rate in MHz.
    pub const SAMPLE_RATE_MHZ: f64 = 2.048;

    pub const BANDWIDTH: Bandwidth = Bandwidth::Bw1536;

    pub const IF_MODE: IfMode = IfMode::Zero;

    pub const LO_MODE: LoMode = LoMode::Auto;

    /// DC track time bounds, in units of 3 µs.
    pub const MIN_TRACK_TIME: u8 = 1;
    pub const MAX_TRACK_TIME: u8 = 63;
}

/// IF filter bandwidth, in kHz (`mir_sdr_Bw_MHzT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Bandwidth {
    Bw200 = 200,
    Bw300 = 300,
    Bw600 = 600,
    Bw1536 = 1536,
    Bw5000 = 5000,
    Bw6000 = 6000,
    Bw7000 = 7000,
    Bw8000 = 8000,
}

impl Bandwidth {
    pub fn khz(self) -> u32 {
        self as u32
    }

    pub fn native(self) -> i32 {
        self as i32
    }
}

/// Intermediate frequency, in kHz (`mir_sdr_If_kHzT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum IfMode {
    Zero = 0,
    If450 = 450,
    If1620 = 1620,
    If2048 = 2048,
}

impl IfMode {
    pub fn khz(self) -> u32 {
        self as u32
    }

    pub fn native(self) -> i32 {
        self as i32
    }
}

/// DC offset correction mode.
///
/// `None` means "never configured" and is never sent to the device; the other
/// variants map onto the native values 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DcOffsetMode {
    #[default]
    None,
    Static,
    Periodic6ms,
    Periodic12ms,
    Periodic24ms,
    /// Correct once after every gain update, tracking for the DC track time.
    OneShot,
    Continuous,
}

impl DcOffsetMode {
    pub fn native(self) -> Option<i32> {
        match self {
            DcOffsetMode::None => None,
            DcOffsetMode::Static => Some(0),
            DcOffsetMode::Periodic6ms => Some(1),
            DcOffsetMode::Periodic12ms => Some(2),
            DcOffsetMode::Periodic24ms => Some(3),
            DcOffsetMode::OneShot => Some(4),
            DcOffsetMode::Continuous => Some(5),
        }
    }
}

/// Up-converter local oscillator frequency (`mir_sdr_LoModeT`).
///
/// Only relevant below 60 MHz and between 250 and 420 MHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum LoMode {
    #[default]
    Undefined = 0,
    Auto = 1,
    /// Covers 370 to 420 MHz.
    Lo120MHz = 2,
    /// Covers 250 to 255 MHz and 400 to 420 MHz.
    Lo144MHz = 3,
    /// Covers 250 to 265 MHz.
    Lo168MHz = 4,
}

impl LoMode {
    pub fn native(self) -> i32 {
        self as i32
    }
}

/// Decimation factor applied after IF sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Decimation {
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 4,
    X8 = 8,
    X16 = 16,
    X32 = 32,
    X64 = 64,
}

impl Decimation {
    pub fn factor(self) -> u32 {
        self as u32
    }
}

/// AGC loop mode (`mir_sdr_AgcControlT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum AgcMode {
    #[default]
    Disabled = 0,
    Loop100Hz = 1,
    Loop50Hz = 2,
    Loop5Hz = 3,
}

impl AgcMode {
    pub fn native(self) -> i32 {
        self as i32
    }
}

/// DC tracking period, always within `[1, 63]` once built from a value.
///
/// The unset default is `0`, which is never sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TrackTime(u8);

impl TrackTime {
    /// Clamp `value` into the accepted range.
    pub fn clamped(value: i32) -> Self {
        let min = i32::from(defaults::MIN_TRACK_TIME);
        let max = i32::from(defaults::MAX_TRACK_TIME);
        TrackTime(value.clamp(min, max) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Every parameter the RSP can be configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sample_rate_mhz: f64,
    pub bandwidth: Bandwidth,
    pub if_mode: IfMode,
    pub iq_imbalance: bool,
    pub dc_offset: bool,
    pub dc_mode: DcOffsetMode,
    pub dc_track_time: TrackTime,
    pub lo_ppm: f64,
    pub lo_mode: LoMode,
    pub decimate: bool,
    pub decimation: Decimation,
    pub lna: bool,
    pub agc: AgcMode,
    /// AGC set point in dBFS, at most 0.
    pub agc_set_point_dbfs: i32,
    /// Initial gain reduction in dB.
    pub initial_gr: i32,
    pub rf_mhz: f64,
    pub debug: bool,
}

impl Default for Config {
    /// Broadcast FM at 102 MHz, 2.048 MHz sampling, 1536 kHz bandwidth,
    /// zero IF and automatic LO selection.
    fn default() -> Self {
        Config {
            sample_rate_mhz: defaults::SAMPLE_RATE_MHZ,
            bandwidth: defaults::BANDWIDTH,
            if_mode: defaults::IF_MODE,
            iq_imbalance: false,
            dc_offset: false,
            dc_mode: DcOffsetMode::None,
            dc_track_time: TrackTime::default(),
            lo_ppm: 0.0,
            lo_mode: defaults::LO_MODE,
            decimate: false,
            decimation: Decimation::X1,
            lna: false,
            agc: AgcMode::Disabled,
            agc_set_point_dbfs: 0,
            initial_gr: 0,
            rf_mhz: defaults::RF_MHZ,
            debug: false,
        }
    }
}

impl Config {
    /// Fold `options` over `self`, left to right.
    pub fn with<I>(self, options: I) -> Config
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        options.into_iter().fold(self, |cfg, opt| opt.apply(cfg))
    }
}

/// A single deferred change to a [`Config`].
///
/// Use the constructor functions; they validate their input up front so that
/// applying an option can never fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigOption {
    SampleRate(f64),
    Bandwidth(Bandwidth),
    If(IfMode),
    IqImbalance(bool),
    DcOffset(bool),
    DcMode(DcOffsetMode),
    DcTrackTime(TrackTime),
    LoPpm(f64),
    LoMode(LoMode),
    Decimate(bool, Decimation),
    Lna(bool),
    Agc(AgcMode, i32),
    InitialGr(i32),
    InitialRf(f64),
    Debug(bool),
}

impl ConfigOption {
    /// Sample rate in MHz.
    pub fn sample_rate(mhz: f64) -> Self {
        ConfigOption::SampleRate(mhz)
    }

    pub fn bandwidth(bw: Bandwidth) -> Self {
        ConfigOption::Bandwidth(bw)
    }

    pub fn if_mode(mode: IfMode) -> Self {
        ConfigOption::If(mode)
    }

    pub fn iq_imbalance(enabled: bool) -> Self {
        ConfigOption::IqImbalance(enabled)
    }

    pub fn dc_offset(enabled: bool) -> Self {
        ConfigOption::DcOffset(enabled)
    }

    pub fn dc_mode(mode: DcOffsetMode) -> Self {
        ConfigOption::DcMode(mode)
    }

    /// DC track time; values outside `[1, 63]` are clamped to the nearest bound.
    pub fn dc_track_time(track_time: i32) -> Self {
        ConfigOption::DcTrackTime(TrackTime::clamped(track_time))
    }

    /// Local oscillator correction in parts per million.
    pub fn lo_ppm(ppm: f64) -> Self {
        ConfigOption::LoPpm(ppm)
    }

    pub fn lo_mode(mode: LoMode) -> Self {
        ConfigOption::LoMode(mode)
    }

    pub fn decimate(enabled: bool, factor: Decimation) -> Self {
        ConfigOption::Decimate(enabled, factor)
    }

    pub fn lna(enabled: bool) -> Self {
        ConfigOption::Lna(enabled)
    }

    /// AGC mode and set point. The set point is relative to full scale, so
    /// anything above 0 dBFS is pulled down to 0.
    pub fn agc(mode: AgcMode, dbfs: i32) -> Self {
        ConfigOption::Agc(mode, dbfs.min(0))
    }

    /// Initial gain reduction in dB.
    pub fn initial_gr(db: i32) -> Self {
        ConfigOption::InitialGr(db)
    }

    /// Initial RF frequency in MHz.
    pub fn initial_rf(mhz: f64) -> Self {
        ConfigOption::InitialRf(mhz)
    }

    pub fn debug(enabled: bool) -> Self {
        ConfigOption::Debug(enabled)
    }

    pub fn apply(self, cfg: Config) -> Config {
        match self {
            ConfigOption::SampleRate(mhz) => Config {
                sample_rate_mhz: mhz,
                ..cfg
            },
            ConfigOption::Bandwidth(bandwidth) => Config { bandwidth, ..cfg },
            ConfigOption::If(if_mode) => Config { if_mode, ..cfg },
            ConfigOption::IqImbalance(iq_imbalance) => Config {
                iq_imbalance,
                ..cfg
            },
            ConfigOption::DcOffset(dc_offset) => Config { dc_offset, ..cfg },
            ConfigOption::DcMode(dc_mode) => Config { dc_mode, ..cfg },
            ConfigOption::DcTrackTime(dc_track_time) => Config {
                dc_track_time,
                ..cfg
            },
            ConfigOption::LoPpm(lo_ppm) => Config { lo_ppm, ..cfg },
            ConfigOption::LoMode(lo_mode) => Config { lo_mode, ..cfg },
            ConfigOption::Decimate(decimate, decimation) => Config {
                decimate,
                decimation,
                ..cfg
            },
            ConfigOption::Lna(lna) => Config { lna, ..cfg },
            ConfigOption::Agc(agc, agc_set_point_dbfs) => Config {
                agc,
                agc_set_point_dbfs,
                ..cfg
            },
            ConfigOption::InitialGr(initial_gr) => Config { initial_gr, ..cfg },
            ConfigOption::InitialRf(rf_mhz) => Config { rf_mhz, ..cfg },
            ConfigOption::Debug(debug) => Config { debug, ..cfg },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fm_102() {
        let cfg = Config::default();
        assert_eq!(cfg.rf_mhz, 102.0);
        assert_eq!(cfg.sample_rate_mhz, 2.048);
        assert_eq!(cfg.bandwidth, Bandwidth::Bw1536);
        assert_eq!(cfg.if_mode, IfMode::Zero);
        assert_eq!(cfg.lo_mode, LoMode::Auto);
        assert_eq!(cfg.dc_mode, DcOffsetMode::None);
        assert_eq!(cfg.dc_track_time.get(), 0);
    }

    #[test]
    fn track_time_is_clamped_at_construction() {
        let stored = |v| match ConfigOption::dc_track_time(v) {
            ConfigOption::DcTrackTime(tt) => tt.get(),
            other => panic!("unexpected option {other:?}"),
        };
        assert_eq!(stored(0), 1);
        assert_eq!(stored(-5), 1);
        assert_eq!(stored(100), 63);
        assert_eq!(stored(30), 30);
        assert_eq!(stored(1), 1);
        assert_eq!(stored(63), 63);
    }

    #[test]
    fn later_options_win() {
        let cfg = Config::default().with([
            ConfigOption::bandwidth(Bandwidth::Bw200),
            ConfigOption::initial_rf(433.92),
            ConfigOption::bandwidth(Bandwidth::Bw600),
        ]);
        assert_eq!(cfg.bandwidth, Bandwidth::Bw600);
        assert_eq!(cfg.rf_mhz, 433.92);
        assert_eq!(cfg.sample_rate_mhz, defaults::SAMPLE_RATE_MHZ);
    }

    #[test]
    fn options_do_not_touch_other_fields() {
        let base = Config::default();
        let cfg = base.clone().with([ConfigOption::lna(true)]);
        assert!(cfg.lna);
        assert_eq!(Config { lna: false, ..cfg }, base);
    }

    #[test]
    fn decimate_and_agc_set_two_fields() {
        let cfg = Config::default().with([
            ConfigOption::decimate(true, Decimation::X8),
            ConfigOption::agc(AgcMode::Loop50Hz, -30),
        ]);
        assert!(cfg.decimate);
        assert_eq!(cfg.decimation.factor(), 8);
        assert_eq!(cfg.agc, AgcMode::Loop50Hz);
        assert_eq!(cfg.agc_set_point_dbfs, -30);
    }

    #[test]
    fn agc_set_point_cannot_exceed_full_scale() {
        let cfg = Config::default().with([ConfigOption::agc(AgcMode::Loop5Hz, 6)]);
        assert_eq!(cfg.agc_set_point_dbfs, 0);
    }

    #[test]
    fn native_values() {
        let bws: Vec<u32> = [
            Bandwidth::Bw200,
            Bandwidth::Bw300,
            Bandwidth::Bw600,
            Bandwidth::Bw1536,
            Bandwidth::Bw5000,
            Bandwidth::Bw6000,
            Bandwidth::Bw7000,
            Bandwidth::Bw8000,
        ]
        .iter()
        .map(|b| b.khz())
        .collect();
        assert_eq!(bws, vec![200, 300, 600, 1536, 5000, 6000, 7000, 8000]);
        assert_eq!(IfMode::If1620.native(), 1620);
        assert_eq!(DcOffsetMode::None.native(), None);
        assert_eq!(DcOffsetMode::Static.native(), Some(0));
        assert_eq!(DcOffsetMode::Continuous.native(), Some(5));
        assert_eq!(LoMode::Lo168MHz.native(), 4);
        assert_eq!(AgcMode::Loop5Hz.native(), 3);
        assert_eq!(Decimation::X64.factor(), 64);
    }

    #[test]
    fn agc_modes_are_signed_like_the_other_native_enums() {
        let modes: Vec<i32> = [
            AgcMode::Disabled,
            AgcMode::Loop100Hz,
            AgcMode::Loop50Hz,
            AgcMode::Loop5Hz,
        ]
        .iter()
        .map(|m| m.native())
        .collect();
        assert_eq!(modes, vec![0, 1, 2, 3]);
        let lo: i32 = LoMode::Auto.native();
        assert_eq!(lo, 1);
    }
}
