//! Bridge between the driver's delivery thread and the application.
//!
//! The native API hands out its own sample buffers and reuses them as soon as
//! the callback returns, so every batch is copied before it reaches the
//! [`Connector`]. Nothing on this path blocks on the control lock: the
//! connector slot is read with `try_read` and a contended batch is dropped.

use std::os::raw::{c_int, c_short, c_uint, c_void};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::{info, trace};

use crate::connector::Connector;

/// Native stream callback signature (`mir_sdr_StreamCallback_t`).
pub type StreamCallbackFn = unsafe extern "C" fn(
    xi: *mut c_short,
    xq: *mut c_short,
    first_sample_num: c_uint,
    gr_changed: c_int,
    rf_changed: c_int,
    fs_changed: c_int,
    num_samples: c_uint,
    reset: c_uint,
    cb_context: *mut c_void,
);

/// Native AGC callback signature (`mir_sdr_GainChangeCallback_t`).
pub type AgcCallbackFn =
    unsafe extern "C" fn(gr_db: c_uint, lna_gr_db: c_uint, cb_context: *mut c_void);

/// Per-batch flags raised by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchFlags {
    pub first_sample_num: u32,
    pub gr_changed: bool,
    pub rf_changed: bool,
    pub fs_changed: bool,
    pub reset: bool,
}

impl BatchFlags {
    /// The batch straddles a reconfiguration and its contents are unreliable.
    pub fn is_transient(&self) -> bool {
        self.gr_changed || self.rf_changed || self.fs_changed || self.reset
    }
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub delivered: u64,
    pub dropped: u64,
    pub agc_events: u64,
}

/// Receives driver upcalls and forwards copied batches to a connector.
pub struct StreamBridge {
    connector: RwLock<Option<Arc<dyn Connector>>>,
    delivered: AtomicU64,
    dropped: AtomicU64,
    agc_events: AtomicU64,
}

impl StreamBridge {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        StreamBridge {
            connector: RwLock::new(Some(connector)),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            agc_events: AtomicU64::new(0),
        }
    }

    /// Handle one batch from the driver. `i` and `q` are only borrowed for
    /// the duration of the call.
    pub fn on_samples(&self, i: &[i16], q: &[i16], flags: BatchFlags) {
        if flags.is_transient() {
            trace!("dropping transient batch: {:?}", flags);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if i.len() != q.len() {
            trace!("dropping batch with I/Q length mismatch {} != {}", i.len(), q.len());
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let Ok(slot) = self.connector.try_read() else {
            trace!("connector slot busy, dropping batch");
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let Some(connector) = slot.as_ref() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };

        connector.propagate(i.to_vec(), q.to_vec());
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// AGC moved the gain. Purely informational.
    pub fn on_agc(&self, gr_db: u32, lna_gr_db: u32) {
        self.agc_events.fetch_add(1, Ordering::Relaxed);
        info!("AGC callback [grdB: {}] [lnagrdB: {}]", gr_db, lna_gr_db);
    }

    pub fn is_attached(&self) -> bool {
        match self.connector.read() {
            Ok(slot) => slot.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    /// Unplug the connector. Waits for an in-flight delivery to finish, so no
    /// batch reaches the connector after this returns.
    pub(crate) fn detach(&self) {
        let mut slot = match self.connector.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = None;
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            agc_events: self.agc_events.load(Ordering::Relaxed),
        }
    }

    /// Context pointer handed to the native API. Valid for as long as the
    /// caller keeps `bridge` alive.
    pub fn context_ptr(bridge: &Arc<StreamBridge>) -> *mut c_void {
        Arc::as_ptr(bridge) as *mut c_void
    }
}

/// C-ABI entry point for sample batches.
///
/// # Safety
/// `cb_context` must be null or come from [`StreamBridge::context_ptr`] on a
/// bridge that is still alive. `xi` and `xq` must each be null or point to
/// `num_samples` readable values.
pub unsafe extern "C" fn stream_callback(
    xi: *mut c_short,
    xq: *mut c_short,
    first_sample_num: c_uint,
    gr_changed: c_int,
    rf_changed: c_int,
    fs_changed: c_int,
    num_samples: c_uint,
    reset: c_uint,
    cb_context: *mut c_void,
) {
    let Some(bridge) = (cb_context as *const StreamBridge).as_ref() else {
        return;
    };
    let flags = BatchFlags {
        first_sample_num,
        gr_changed: gr_changed != 0,
        rf_changed: rf_changed != 0,
        fs_changed: fs_changed != 0,
        reset: reset != 0,
    };
    let len = num_samples as usize;
    if len == 0 {
        bridge.on_samples(&[], &[], flags);
        return;
    }
    if xi.is_null() || xq.is_null() {
        bridge.dropped.fetch_add(1, Ordering::Relaxed);
        return;
    }
    let i = std::slice::from_raw_parts(xi as *const i16, len);
    let q = std::slice::from_raw_parts(xq as *const i16, len);
    bridge.on_samples(i, q, flags);
}

/// C-ABI entry point for AGC gain changes.
///
/// # Safety
/// Same contract on `cb_context` as [`stream_callback`].
pub unsafe extern "C" fn agc_callback(gr_db: c_uint, lna_gr_db: c_uint, cb_context: *mut c_void) {
    if let Some(bridge) = (cb_context as *const StreamBridge).as_ref() {
        bridge.on_agc(gr_db, lna_gr_db);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Seen = Arc<Mutex<Vec<(Vec<i16>, Vec<i16>)>>>;

    fn recording_bridge() -> (Arc<StreamBridge>, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |i: Vec<i16>, q: Vec<i16>| seen.lock().unwrap().push((i, q))
        };
        (Arc::new(StreamBridge::new(Arc::new(sink))), seen)
    }

    #[test]
    fn clean_batch_is_delivered() {
        let (bridge, seen) = recording_bridge();
        bridge.on_samples(&[1, 2, 3], &[4, 5, 6], BatchFlags::default());
        assert_eq!(*seen.lock().unwrap(), vec![(vec![1, 2, 3], vec![4, 5, 6])]);
        assert_eq!(bridge.stats().delivered, 1);
    }

    #[test]
    fn transient_batches_are_dropped() {
        let (bridge, seen) = recording_bridge();
        let flagged = [
            BatchFlags {
                gr_changed: true,
                ..Default::default()
            },
            BatchFlags {
                rf_changed: true,
                ..Default::default()
            },
            BatchFlags {
                fs_changed: true,
                ..Default::default()
            },
            BatchFlags {
                reset: true,
                ..Default::default()
            },
        ];
        for flags in flagged {
            bridge.on_samples(&[1], &[2], flags);
        }
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(bridge.stats().dropped, 4);
    }

    #[test]
    fn detached_bridge_drops() {
        let (bridge, seen) = recording_bridge();
        bridge.detach();
        assert!(!bridge.is_attached());
        bridge.on_samples(&[1], &[2], BatchFlags::default());
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(bridge.stats().dropped, 1);
    }

    #[test]
    fn mismatched_lengths_are_dropped() {
        let (bridge, seen) = recording_bridge();
        bridge.on_samples(&[1, 2], &[3], BatchFlags::default());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn ffi_callback_copies_both_channels() {
        let (bridge, seen) = recording_bridge();
        let mut i = vec![10i16, 20, 30, 40];
        let mut q = vec![-10i16, -20, -30, -40];
        unsafe {
            stream_callback(
                i.as_mut_ptr(),
                q.as_mut_ptr(),
                0,
                0,
                0,
                0,
                3,
                0,
                StreamBridge::context_ptr(&bridge),
            );
        }
        // The driver reuses its buffers right away.
        i.fill(0);
        q.fill(0);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, vec![10, 20, 30]);
        // Q must come from the Q buffer, not a second copy of I.
        assert_eq!(seen[0].1, vec![-10, -20, -30]);
    }

    #[test]
    fn ffi_callback_honours_flags() {
        let (bridge, seen) = recording_bridge();
        let mut i = vec![1i16; 4];
        let mut q = vec![2i16; 4];
        unsafe {
            stream_callback(
                i.as_mut_ptr(),
                q.as_mut_ptr(),
                0,
                1,
                0,
                0,
                4,
                0,
                StreamBridge::context_ptr(&bridge),
            );
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn ffi_callbacks_ignore_null_context() {
        let mut i = vec![1i16; 2];
        let mut q = vec![2i16; 2];
        unsafe {
            stream_callback(
                i.as_mut_ptr(),
                q.as_mut_ptr(),
                0,
                0,
                0,
                0,
                2,
                0,
                std::ptr::null_mut(),
            );
            agc_callback(20, 0, std::ptr::null_mut());
        }
    }

    #[test]
    fn agc_events_are_counted() {
        let (bridge, _) = recording_bridge();
        unsafe { agc_callback(40, 24, StreamBridge::context_ptr(&bridge)) };
        assert_eq!(bridge.stats().agc_events, 1);
    }
}
