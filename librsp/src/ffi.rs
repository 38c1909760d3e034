//! Binding to the native `mirsdrapi-rsp` library.

use std::os::raw::{c_double, c_float, c_int, c_uint, c_void};
use std::sync::Arc;

use log::warn;

use crate::config::{AgcMode, LoMode};
use crate::driver::{Driver, ReinitReason, StreamParams};
use crate::stream::{
    agc_callback, stream_callback, AgcCallbackFn, StreamBridge, StreamCallbackFn,
};

type MirSdrErrT = c_int;

#[link(name = "mirsdrapi-rsp")]
extern "C" {
    fn mir_sdr_ApiVersion(version: *mut c_float) -> MirSdrErrT;
    fn mir_sdr_StreamInit(
        gr_db: *mut c_int,
        fs_mhz: c_double,
        rf_mhz: c_double,
        bw_type: c_int,
        if_type: c_int,
        lna_enable: c_int,
        gr_db_system: *mut c_int,
        use_gr_alt_mode: c_int,
        samples_per_packet: *mut c_int,
        stream_cb: StreamCallbackFn,
        gain_change_cb: AgcCallbackFn,
        cb_context: *mut c_void,
    ) -> MirSdrErrT;
    fn mir_sdr_Reinit(
        gr_db: *mut c_int,
        fs_mhz: c_double,
        rf_mhz: c_double,
        bw_type: c_int,
        if_type: c_int,
        lo_mode: c_int,
        lna_enable: c_int,
        gr_db_system: *mut c_int,
        use_gr_alt_mode: c_int,
        samples_per_packet: *mut c_int,
        reason_for_reinit: c_uint,
    ) -> MirSdrErrT;
    fn mir_sdr_StreamUninit() -> MirSdrErrT;
    fn mir_sdr_SetRf(drf_hz: c_double, abs: c_int, sync_update: c_int) -> MirSdrErrT;
    fn mir_sdr_SetGrAltMode(
        gr_idx: *mut c_int,
        lna_state: c_int,
        gr_db_system: *mut c_int,
        abs: c_int,
        sync_update: c_int,
    ) -> MirSdrErrT;
    fn mir_sdr_SetDcMode(dc_cal: c_int, speed_up: c_int) -> MirSdrErrT;
    fn mir_sdr_SetDcTrackTime(track_time: c_int) -> MirSdrErrT;
    fn mir_sdr_SetPpm(ppm: c_double) -> MirSdrErrT;
    fn mir_sdr_SetLoMode(lo_mode: c_int) -> MirSdrErrT;
    fn mir_sdr_DecimateControl(
        enable: c_uint,
        decimation_factor: c_uint,
        wide_band_signal: c_uint,
    ) -> MirSdrErrT;
    fn mir_sdr_AgcControl(
        enable: c_int,
        set_point_dbfs: c_int,
        knee_dbfs: c_int,
        decay_ms: c_uint,
        hang_ms: c_uint,
        sync_update: c_int,
        lna_enable: c_int,
    ) -> MirSdrErrT;
    fn mir_sdr_DCoffsetIQimbalanceControl(dc_enable: c_uint, iq_enable: c_uint) -> MirSdrErrT;
    fn mir_sdr_DebugEnable(enable: c_uint) -> MirSdrErrT;
}

/// The real RSP, driven through `mirsdrapi-rsp`.
///
/// Holds on to the callback bridge while the stream runs, since the library
/// only keeps a raw pointer to it.
#[derive(Default)]
pub struct MirSdr {
    bridge: Option<Arc<StreamBridge>>,
}

impl MirSdr {
    pub fn new() -> Self {
        MirSdr { bridge: None }
    }
}

impl Drop for MirSdr {
    fn drop(&mut self) {
        if self.bridge.is_some() {
            let status = unsafe { mir_sdr_StreamUninit() };
            if status != 0 {
                warn!("stream uninit on drop returned {}", status);
            }
        }
    }
}

impl Driver for MirSdr {
    fn api_version(&mut self, version: &mut f32) -> i32 {
        unsafe { mir_sdr_ApiVersion(version as *mut f32) }
    }

    fn stream_init(&mut self, params: &mut StreamParams, bridge: Arc<StreamBridge>) -> i32 {
        let ctx = StreamBridge::context_ptr(&bridge);
        let status = unsafe {
            mir_sdr_StreamInit(
                &mut params.gr_db,
                params.sample_rate_mhz,
                params.rf_mhz,
                params.bandwidth.native(),
                params.if_mode.native(),
                c_int::from(params.lna_enable),
                &mut params.gr_system_db,
                c_int::from(params.use_gr_alt_mode),
                &mut params.samples_per_packet,
                stream_callback,
                agc_callback,
                ctx,
            )
        };
        if status == 0 {
            self.bridge = Some(bridge);
        }
        status
    }

    fn stream_reinit(&mut self, params: &mut StreamParams, reason: ReinitReason) -> i32 {
        unsafe {
            mir_sdr_Reinit(
                &mut params.gr_db,
                params.sample_rate_mhz,
                params.rf_mhz,
                params.bandwidth.native(),
                params.if_mode.native(),
                params.lo_mode.native(),
                c_int::from(params.lna_enable),
                &mut params.gr_system_db,
                c_int::from(params.use_gr_alt_mode),
                &mut params.samples_per_packet,
                reason.bits(),
            )
        }
    }

    fn stream_uninit(&mut self) -> i32 {
        let status = unsafe { mir_sdr_StreamUninit() };
        if status == 0 {
            // The library has stopped calling back; the bridge can go.
            self.bridge = None;
        }
        status
    }

    fn set_rf(&mut self, freq_hz: f64, absolute: bool, sync_update: bool) -> i32 {
        unsafe { mir_sdr_SetRf(freq_hz, c_int::from(absolute), c_int::from(sync_update)) }
    }

    fn set_gr_alt_mode(
        &mut self,
        gr_db: &mut i32,
        lna_enable: bool,
        gr_system_db: &mut i32,
        absolute: bool,
        sync_update: bool,
    ) -> i32 {
        unsafe {
            mir_sdr_SetGrAltMode(
                gr_db,
                c_int::from(lna_enable),
                gr_system_db,
                c_int::from(absolute),
                c_int::from(sync_update),
            )
        }
    }

    fn set_dc_mode(&mut self, mode: i32, speed_up: bool) -> i32 {
        unsafe { mir_sdr_SetDcMode(mode, c_int::from(speed_up)) }
    }

    fn set_dc_track_time(&mut self, track_time: u8) -> i32 {
        unsafe { mir_sdr_SetDcTrackTime(c_int::from(track_time)) }
    }

    fn set_ppm(&mut self, ppm: f64) -> i32 {
        unsafe { mir_sdr_SetPpm(ppm) }
    }

    fn set_lo_mode(&mut self, mode: LoMode) -> i32 {
        unsafe { mir_sdr_SetLoMode(mode.native()) }
    }

    fn decimate_control(&mut self, enable: bool, factor: u32, wide_band: bool) -> i32 {
        unsafe { mir_sdr_DecimateControl(c_uint::from(enable), factor, c_uint::from(wide_band)) }
    }

    fn agc_control(&mut self, mode: AgcMode, set_point_dbfs: i32, lna_enable: bool) -> i32 {
        // Knee, decay and hang only apply to the 5 Hz loop; 0 selects the
        // library defaults. Updates take effect immediately.
        unsafe {
            mir_sdr_AgcControl(
                mode.native(),
                set_point_dbfs,
                0,
                0,
                0,
                0,
                c_int::from(lna_enable),
            )
        }
    }

    fn dc_offset_iq_imbalance_control(&mut self, dc_offset: bool, iq_imbalance: bool) -> i32 {
        unsafe {
            mir_sdr_DCoffsetIQimbalanceControl(c_uint::from(dc_offset), c_uint::from(iq_imbalance))
        }
    }

    fn debug_enable(&mut self, enable: bool) -> i32 {
        unsafe { mir_sdr_DebugEnable(c_uint::from(enable)) }
    }
}
