//! Receiver lifecycle.
//!
//! A [`ReceiverManager`] owns the driver and at most one live session. Opening
//! a new receiver tears down the previous one; the old [`Receiver`] handle
//! then answers every call with [`Error::DeactivatedReceiver`].
//!
//! All control operations go through one mutex, so a reinit can never
//! overlap a tune, a gain change or a teardown. The sample path does not
//! take this lock.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use crate::band::Band;
use crate::config::{Config, ConfigOption};
use crate::connector::Connector;
use crate::driver::{Driver, Registers, ReinitReason, MIR_SDR_API_VERSION};
use crate::error::{check, Error, Result};
use crate::reinit::{self, Retune};
use crate::stream::{BridgeStats, StreamBridge};

/// Something that can be tuned.
pub trait Tuner {
    /// Set the centre frequency, in Hz.
    fn tune(&self, frequency_hz: f64) -> Result<()>;
}

/// Something with adjustable gain.
pub trait Amplifier {
    /// Set the gain reduction in dB, relative to maximum gain.
    fn gain(&self, reduction_db: i32) -> Result<()>;
}

struct Session {
    id: u64,
    config: Config,
    band: Band,
    frequency_hz: f64,
    registers: Registers,
    bridge: Arc<StreamBridge>,
}

struct Shared<D> {
    driver: D,
    active: Option<Session>,
    next_id: u64,
}

fn lock<D>(shared: &Mutex<Shared<D>>) -> MutexGuard<'_, Shared<D>> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Owner of the RSP and of the single active receiver.
pub struct ReceiverManager<D: Driver> {
    shared: Arc<Mutex<Shared<D>>>,
}

impl<D: Driver> ReceiverManager<D> {
    /// Wrap `driver` after checking that it speaks the expected API version.
    pub fn new(mut driver: D) -> Result<Self> {
        let mut version = 0.0f32;
        check(driver.api_version(&mut version))?;
        if (version - MIR_SDR_API_VERSION).abs() > 1e-4 {
            return Err(Error::ApiVersionMismatch {
                expected: MIR_SDR_API_VERSION,
                found: version,
            });
        }
        info!("mir_sdr API version {:.2}", version);
        Ok(ReceiverManager {
            shared: Arc::new(Mutex::new(Shared {
                driver,
                active: None,
                next_id: 1,
            })),
        })
    }

    /// Build a receiver feeding `connector`.
    ///
    /// The default configuration is applied first, then `options` in order.
    /// Any previously opened receiver is shut down before the hardware is
    /// initialised again; if that shutdown fails nothing changes.
    pub fn open<I>(
        &self,
        connector: Option<Arc<dyn Connector>>,
        options: I,
    ) -> Result<Receiver<D>>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        let connector = connector.ok_or(Error::UnpluggedConnector)?;

        let mut guard = lock(&self.shared);
        let shared = &mut *guard;

        if let Some(previous) = shared.active.as_ref() {
            check(shared.driver.stream_uninit())?;
            previous.bridge.detach();
            debug!("receiver {} deactivated", previous.id);
            shared.active = None;
        }

        let config = Config::default().with(options);
        let bridge = Arc::new(StreamBridge::new(connector));
        let mut registers = Registers::default();
        let started = reinit::initialize(
            &mut shared.driver,
            &config,
            &mut registers,
            Arc::clone(&bridge),
        );
        if let Err(e) = started {
            bridge.detach();
            return Err(e);
        }

        let id = shared.next_id;
        shared.next_id += 1;
        let frequency_hz = config.rf_mhz * 1e6;
        let session = Session {
            id,
            band: Band::from_freq(frequency_hz),
            frequency_hz,
            config,
            registers,
            bridge: bridge.clone(),
        };
        debug!(
            "receiver {} active in {}\n{:#?}\n{:#?}",
            id, session.band, session.config, session.registers
        );
        shared.active = Some(session);

        Ok(Receiver {
            id,
            shared: Arc::clone(&self.shared),
            bridge,
        })
    }

    /// Tear down whatever receiver is active. A no-op when none is.
    pub fn deactivate(&self) -> Result<()> {
        let mut guard = lock(&self.shared);
        let shared = &mut *guard;
        if let Some(session) = shared.active.as_ref() {
            check(shared.driver.stream_uninit())?;
            session.bridge.detach();
            debug!("receiver {} deactivated", session.id);
            shared.active = None;
        }
        Ok(())
    }

    /// Whether some receiver is currently plugged into a live stream.
    pub fn has_active(&self) -> bool {
        lock(&self.shared)
            .active
            .as_ref()
            .is_some_and(|s| s.bridge.is_attached())
    }
}

/// Handle to one receiver session.
pub struct Receiver<D: Driver> {
    id: u64,
    shared: Arc<Mutex<Shared<D>>>,
    bridge: Arc<StreamBridge>,
}

impl<D: Driver> Receiver<D> {
    fn with_session<T>(&self, f: impl FnOnce(&mut D, &mut Session) -> Result<T>) -> Result<T> {
        let mut guard = lock(&self.shared);
        let Shared { driver, active, .. } = &mut *guard;
        match active {
            Some(session) if session.id == self.id && self.bridge.is_attached() => {
                f(driver, session)
            }
            _ => Err(Error::DeactivatedReceiver),
        }
    }

    /// Retune. Stays on the cheap path while `frequency_hz` is in the
    /// current band, reinitialises otherwise.
    pub fn tune(&self, frequency_hz: f64) -> Result<()> {
        self.with_session(|driver, s| {
            let how = reinit::retune(
                driver,
                &s.config,
                &mut s.registers,
                &mut s.band,
                frequency_hz,
            )?;
            if let Retune::Reinit(band) = how {
                debug!("receiver {} moved to {}", s.id, band);
            }
            s.frequency_hz = frequency_hz;
            Ok(())
        })
    }

    /// Set the gain reduction, in dB.
    pub fn gain(&self, reduction_db: i32) -> Result<()> {
        self.with_session(|driver, s| {
            reinit::set_gain(driver, &s.config, &mut s.registers, reduction_db)
        })
    }

    /// Apply `options` on top of the active configuration.
    ///
    /// Returns the reason mask sent to the driver, empty when no reinit was
    /// needed.
    pub fn reconfigure<I>(&self, options: I) -> Result<ReinitReason>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        self.with_session(|driver, s| {
            let staged = s.config.clone().with(options);
            let rf_changed = staged.rf_mhz != s.config.rf_mhz;
            let reason = reinit::apply(driver, &mut s.config, &mut s.registers, staged)?;
            if rf_changed {
                s.frequency_hz = s.config.rf_mhz * 1e6;
                s.band = Band::from_freq(s.frequency_hz);
            }
            Ok(reason)
        })
    }

    /// Stop the stream and deactivate this receiver.
    pub fn uninit(&self) -> Result<()> {
        let mut guard = lock(&self.shared);
        let shared = &mut *guard;
        match shared.active.as_ref() {
            Some(session) if session.id == self.id && self.bridge.is_attached() => {
                check(shared.driver.stream_uninit())?;
                session.bridge.detach();
                shared.active = None;
                debug!("receiver {} uninitialised", self.id);
                Ok(())
            }
            _ => Err(Error::DeactivatedReceiver),
        }
    }

    /// Unplug the connector. The stream keeps running until the next
    /// [`ReceiverManager::open`] but no batch is delivered any more.
    pub fn deactivate(&self) {
        self.bridge.detach();
    }

    pub fn is_active(&self) -> bool {
        self.with_session(|_, _| Ok(())).is_ok()
    }

    pub fn config(&self) -> Result<Config> {
        self.with_session(|_, s| Ok(s.config.clone()))
    }

    pub fn band(&self) -> Result<Band> {
        self.with_session(|_, s| Ok(s.band))
    }

    /// Last frequency the receiver was tuned to, in Hz.
    pub fn frequency(&self) -> Result<f64> {
        self.with_session(|_, s| Ok(s.frequency_hz))
    }

    pub fn registers(&self) -> Result<Registers> {
        self.with_session(|_, s| Ok(s.registers))
    }

    pub fn stats(&self) -> BridgeStats {
        self.bridge.stats()
    }
}

impl<D: Driver> Tuner for Receiver<D> {
    fn tune(&self, frequency_hz: f64) -> Result<()> {
        Receiver::tune(self, frequency_hz)
    }
}

impl<D: Driver> Amplifier for Receiver<D> {
    fn gain(&self, reduction_db: i32) -> Result<()> {
        Receiver::gain(self, reduction_db)
    }
}
