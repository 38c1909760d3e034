//! In-memory stand-in for the native API.
//!
//! [`MockDriver`] is a cheap handle: clone it, hand one copy to a
//! [`ReceiverManager`](crate::ReceiverManager) and keep the other to inspect
//! the call journal, inject failures, or push sample batches as if they came
//! from the driver thread.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{AgcMode, LoMode};
use crate::driver::{Driver, ReinitReason, StreamParams, MIR_SDR_API_VERSION};
use crate::error::ErrorCode;
use crate::stream::{BatchFlags, StreamBridge};

/// Samples per packet reported by the mock on init and reinit.
pub const MOCK_SAMPLES_PER_PACKET: i32 = 336;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ApiVersion,
    StreamInit,
    StreamReinit,
    StreamUninit,
    SetRf,
    SetGrAltMode,
    SetDcMode,
    SetDcTrackTime,
    SetPpm,
    SetLoMode,
    DecimateControl,
    AgcControl,
    DcOffsetIqImbalanceControl,
    DebugEnable,
}

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ApiVersion,
    StreamInit(StreamParams),
    StreamReinit(StreamParams, ReinitReason),
    StreamUninit,
    SetRf { freq_hz: f64, absolute: bool },
    SetGrAltMode { gr_db: i32, lna_enable: bool, absolute: bool },
    SetDcMode(i32),
    SetDcTrackTime(u8),
    SetPpm(f64),
    SetLoMode(LoMode),
    DecimateControl { enable: bool, factor: u32 },
    AgcControl { mode: AgcMode, set_point_dbfs: i32, lna_enable: bool },
    DcOffsetIqImbalanceControl { dc_offset: bool, iq_imbalance: bool },
    DebugEnable(bool),
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::ApiVersion => CallKind::ApiVersion,
            Call::StreamInit(_) => CallKind::StreamInit,
            Call::StreamReinit(..) => CallKind::StreamReinit,
            Call::StreamUninit => CallKind::StreamUninit,
            Call::SetRf { .. } => CallKind::SetRf,
            Call::SetGrAltMode { .. } => CallKind::SetGrAltMode,
            Call::SetDcMode(_) => CallKind::SetDcMode,
            Call::SetDcTrackTime(_) => CallKind::SetDcTrackTime,
            Call::SetPpm(_) => CallKind::SetPpm,
            Call::SetLoMode(_) => CallKind::SetLoMode,
            Call::DecimateControl { .. } => CallKind::DecimateControl,
            Call::AgcControl { .. } => CallKind::AgcControl,
            Call::DcOffsetIqImbalanceControl { .. } => CallKind::DcOffsetIqImbalanceControl,
            Call::DebugEnable(_) => CallKind::DebugEnable,
        }
    }
}

struct MockState {
    version: f32,
    calls: Vec<Call>,
    statuses: HashMap<CallKind, i32>,
    bridge: Option<Arc<StreamBridge>>,
}

#[derive(Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        MockDriver::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver::with_version(MIR_SDR_API_VERSION)
    }

    /// A mock that reports `version` from `api_version`.
    pub fn with_version(version: f32) -> Self {
        MockDriver {
            state: Arc::new(Mutex::new(MockState {
                version,
                calls: Vec::new(),
                statuses: HashMap::new(),
                bridge: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Make every later call of `kind` return `status`.
    pub fn set_status(&self, kind: CallKind, status: i32) {
        self.state().statuses.insert(kind, status);
    }

    pub fn fail(&self, kind: CallKind, code: ErrorCode) {
        self.set_status(kind, code.status());
    }

    pub fn clear_status(&self, kind: CallKind) {
        self.state().statuses.remove(&kind);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    pub fn reinits(&self) -> Vec<(StreamParams, ReinitReason)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::StreamReinit(params, reason) => Some((*params, *reason)),
                _ => None,
            })
            .collect()
    }

    pub fn is_streaming(&self) -> bool {
        self.state().bridge.is_some()
    }

    /// Deliver a batch to the registered bridge, like the driver thread would.
    /// Returns `false` when no stream is running.
    pub fn push_samples(&self, i: &[i16], q: &[i16], flags: BatchFlags) -> bool {
        // Release the mock lock before calling out.
        let bridge = self.state().bridge.clone();
        match bridge {
            Some(bridge) => {
                bridge.on_samples(i, q, flags);
                true
            }
            None => false,
        }
    }

    pub fn push_agc(&self, gr_db: u32, lna_gr_db: u32) -> bool {
        let bridge = self.state().bridge.clone();
        match bridge {
            Some(bridge) => {
                bridge.on_agc(gr_db, lna_gr_db);
                true
            }
            None => false,
        }
    }

    fn record(&self, call: Call) -> i32 {
        let mut state = self.state();
        let kind = call.kind();
        state.calls.push(call);
        state.statuses.get(&kind).copied().unwrap_or(0)
    }
}

impl Driver for MockDriver {
    fn api_version(&mut self, version: &mut f32) -> i32 {
        *version = self.state().version;
        self.record(Call::ApiVersion)
    }

    fn stream_init(&mut self, params: &mut StreamParams, bridge: Arc<StreamBridge>) -> i32 {
        let mut status = self.record(Call::StreamInit(*params));
        let mut state = self.state();
        if status == 0 && state.bridge.is_some() {
            status = ErrorCode::AlreadyInitialised.status();
        }
        if status == 0 {
            params.gr_system_db = params.gr_db;
            params.samples_per_packet = MOCK_SAMPLES_PER_PACKET;
            state.bridge = Some(bridge);
        }
        status
    }

    fn stream_reinit(&mut self, params: &mut StreamParams, reason: ReinitReason) -> i32 {
        let mut status = self.record(Call::StreamReinit(*params, reason));
        if status == 0 && self.state().bridge.is_none() {
            status = ErrorCode::NotInitialised.status();
        }
        if status == 0 {
            params.gr_system_db = params.gr_db;
            params.samples_per_packet = MOCK_SAMPLES_PER_PACKET;
        }
        status
    }

    fn stream_uninit(&mut self) -> i32 {
        let mut status = self.record(Call::StreamUninit);
        let mut state = self.state();
        if status == 0 && state.bridge.is_none() {
            status = ErrorCode::NotInitialised.status();
        }
        if status == 0 {
            state.bridge = None;
        }
        status
    }

    fn set_rf(&mut self, freq_hz: f64, absolute: bool, _sync_update: bool) -> i32 {
        self.record(Call::SetRf { freq_hz, absolute })
    }

    fn set_gr_alt_mode(
        &mut self,
        gr_db: &mut i32,
        lna_enable: bool,
        gr_system_db: &mut i32,
        absolute: bool,
        _sync_update: bool,
    ) -> i32 {
        let status = self.record(Call::SetGrAltMode {
            gr_db: *gr_db,
            lna_enable,
            absolute,
        });
        if status == 0 {
            *gr_system_db = *gr_db;
        }
        status
    }

    fn set_dc_mode(&mut self, mode: i32, _speed_up: bool) -> i32 {
        self.record(Call::SetDcMode(mode))
    }

    fn set_dc_track_time(&mut self, track_time: u8) -> i32 {
        self.record(Call::SetDcTrackTime(track_time))
    }

    fn set_ppm(&mut self, ppm: f64) -> i32 {
        self.record(Call::SetPpm(ppm))
    }

    fn set_lo_mode(&mut self, mode: LoMode) -> i32 {
        self.record(Call::SetLoMode(mode))
    }

    fn decimate_control(&mut self, enable: bool, factor: u32, _wide_band: bool) -> i32 {
        self.record(Call::DecimateControl { enable, factor })
    }

    fn agc_control(&mut self, mode: AgcMode, set_point_dbfs: i32, lna_enable: bool) -> i32 {
        self.record(Call::AgcControl {
            mode,
            set_point_dbfs,
            lna_enable,
        })
    }

    fn dc_offset_iq_imbalance_control(&mut self, dc_offset: bool, iq_imbalance: bool) -> i32 {
        self.record(Call::DcOffsetIqImbalanceControl {
            dc_offset,
            iq_imbalance,
        })
    }

    fn debug_enable(&mut self, enable: bool) -> i32 {
        self.record(Call::DebugEnable(enable))
    }
}
