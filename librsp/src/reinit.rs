//! Decides how a configuration change reaches the hardware.
//!
//! A reinit briefly interrupts the sample stream, so only changes the
//! hardware cannot absorb live pay for one. DC tracking and LO ppm trim are
//! pushed directly; everything that feeds `mir_sdr_Reinit` is collected into
//! a [`ReinitReason`] and sent in a single call with the complete parameter
//! set.

use std::sync::Arc;

use log::{debug, warn};

use crate::band::Band;
use crate::config::{Config, DcOffsetMode, LoMode, TrackTime};
use crate::driver::{Driver, Registers, ReinitReason, StreamParams};
use crate::error::{check, Result};
use crate::stream::StreamBridge;

/// A change applied without reinitialising.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImmediateUpdate {
    DcMode { mode: DcOffsetMode, track_time: TrackTime },
    Ppm(f64),
}

/// Outcome of diffing a staged configuration against the active one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    pub immediate: Vec<ImmediateUpdate>,
    pub reason: ReinitReason,
}

impl Plan {
    pub fn needs_reinit(&self) -> bool {
        !self.reason.is_empty()
    }
}

/// Compare `staged` with `active`. Pure; touches no hardware.
pub fn plan(active: &Config, staged: &Config) -> Plan {
    let mut immediate = Vec::new();
    if staged.dc_mode != active.dc_mode && staged.dc_mode != DcOffsetMode::None {
        immediate.push(ImmediateUpdate::DcMode {
            mode: staged.dc_mode,
            track_time: staged.dc_track_time,
        });
    }
    if staged.lo_ppm != active.lo_ppm && staged.lo_ppm != 0.0 {
        immediate.push(ImmediateUpdate::Ppm(staged.lo_ppm));
    }

    let mut reason = ReinitReason::NONE;
    if staged.initial_gr != active.initial_gr || staged.lna != active.lna {
        reason |= ReinitReason::GAIN;
    }
    if staged.sample_rate_mhz != active.sample_rate_mhz {
        reason |= ReinitReason::SAMPLE_RATE;
    }
    if staged.rf_mhz != active.rf_mhz {
        reason |= ReinitReason::RF_FREQ;
    }
    if staged.bandwidth != active.bandwidth {
        reason |= ReinitReason::BANDWIDTH;
    }
    if staged.if_mode != active.if_mode {
        reason |= ReinitReason::IF_TYPE;
    }
    if staged.lo_mode != active.lo_mode {
        reason |= ReinitReason::LO_MODE;
    }

    Plan { immediate, reason }
}

fn push_dc_mode<D: Driver>(
    driver: &mut D,
    mode: DcOffsetMode,
    track_time: TrackTime,
) -> Result<()> {
    let Some(native) = mode.native() else {
        return Ok(());
    };
    check(driver.set_dc_mode(native, false))?;
    // An unset track time leaves the driver's own default in place.
    if track_time.get() != 0 {
        check(driver.set_dc_track_time(track_time.get()))?;
    }
    Ok(())
}

/// Bring `active` to `staged`, reinitialising only if required.
///
/// On success `staged` becomes the active configuration and the reason sent
/// to the driver is returned. On failure `active` is left untouched.
pub fn apply<D: Driver>(
    driver: &mut D,
    active: &mut Config,
    regs: &mut Registers,
    staged: Config,
) -> Result<ReinitReason> {
    let plan = plan(active, &staged);

    for update in &plan.immediate {
        match *update {
            ImmediateUpdate::DcMode { mode, track_time } => {
                push_dc_mode(driver, mode, track_time)?
            }
            ImmediateUpdate::Ppm(ppm) => check(driver.set_ppm(ppm))?,
        }
    }

    if plan.needs_reinit() {
        let mut fresh = Registers::reset(staged.initial_gr);
        let mut params = StreamParams::new(&staged, &fresh);
        debug!("reinit {:#04x} with {:?}", plan.reason.bits(), params);
        let status = driver.stream_reinit(&mut params, plan.reason);
        fresh.absorb(&params);
        check(status)?;
        *regs = fresh;
    }

    *active = staged;
    Ok(plan.reason)
}

fn best_effort(status: i32, what: &str) {
    if let Err(e) = check(status) {
        warn!("{} failed: {}", what, e);
    }
}

/// Configure auxiliary features and start the stream.
///
/// Only the stream start itself is fatal; the feature calls are best effort.
pub fn initialize<D: Driver>(
    driver: &mut D,
    cfg: &Config,
    regs: &mut Registers,
    bridge: Arc<StreamBridge>,
) -> Result<()> {
    *regs = Registers::reset(cfg.initial_gr);

    best_effort(driver.debug_enable(cfg.debug), "debug enable");
    best_effort(
        driver.dc_offset_iq_imbalance_control(cfg.dc_offset, cfg.iq_imbalance),
        "DC offset / IQ imbalance control",
    );
    best_effort(
        driver.decimate_control(cfg.decimate, cfg.decimation.factor(), false),
        "decimation control",
    );
    best_effort(
        driver.agc_control(cfg.agc, cfg.agc_set_point_dbfs, cfg.lna),
        "AGC control",
    );
    if let Err(e) = push_dc_mode(driver, cfg.dc_mode, cfg.dc_track_time) {
        warn!("DC mode setup failed: {}", e);
    }
    if cfg.lo_ppm != 0.0 {
        best_effort(driver.set_ppm(cfg.lo_ppm), "ppm correction");
    }
    if cfg.lo_mode != LoMode::Undefined {
        best_effort(driver.set_lo_mode(cfg.lo_mode), "LO mode");
    }

    let mut params = StreamParams::new(cfg, regs);
    let status = driver.stream_init(&mut params, bridge);
    regs.absorb(&params);
    check(status)
}

/// How a tune request reached the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retune {
    /// Same band: centre frequency moved in place.
    CenterFrequency,
    /// Band edge crossed: stream reinitialised.
    Reinit(Band),
}

/// Tune to `freq_hz`. `band` is the band the hardware is currently set up
/// for and is only updated once the reinit succeeds.
pub fn retune<D: Driver>(
    driver: &mut D,
    active: &Config,
    regs: &mut Registers,
    band: &mut Band,
    freq_hz: f64,
) -> Result<Retune> {
    let next = Band::from_freq(freq_hz);
    if next == *band {
        check(driver.set_rf(freq_hz, true, false))?;
        return Ok(Retune::CenterFrequency);
    }

    debug!("band change {} -> {} at {:.3} MHz", band, next, freq_hz / 1e6);
    let mut params = StreamParams::new(active, regs);
    params.rf_mhz = freq_hz / 1e6;
    let status = driver.stream_reinit(&mut params, ReinitReason::RF_FREQ);
    check(status)?;
    regs.absorb(&params);
    *band = next;
    Ok(Retune::Reinit(next))
}

/// Write the gain reduction register in alternate gain mode. Never reinits.
pub fn set_gain<D: Driver>(
    driver: &mut D,
    active: &Config,
    regs: &mut Registers,
    reduction_db: i32,
) -> Result<()> {
    regs.gr_db = reduction_db;
    let status = driver.set_gr_alt_mode(
        &mut regs.gr_db,
        active.lna,
        &mut regs.gr_system_db,
        true,
        false,
    );
    check(status)
}
