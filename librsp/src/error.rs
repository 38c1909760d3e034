//! Error types for RSP operations.

use thiserror::Error;

/// Result type for RSP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Status codes returned by the native API (`mir_sdr_ErrT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    Fail = 1,
    InvalidParam = 2,
    OutOfRange = 3,
    GainUpdateError = 4,
    RfUpdateError = 5,
    FsUpdateError = 6,
    HwError = 7,
    AliasingError = 8,
    AlreadyInitialised = 9,
    NotInitialised = 10,
}

impl ErrorCode {
    /// Map a raw status into the known set, `None` for anything the API
    /// never documented.
    pub fn from_status(status: i32) -> Option<Self> {
        let code = match status {
            0 => ErrorCode::Success,
            1 => ErrorCode::Fail,
            2 => ErrorCode::InvalidParam,
            3 => ErrorCode::OutOfRange,
            4 => ErrorCode::GainUpdateError,
            5 => ErrorCode::RfUpdateError,
            6 => ErrorCode::FsUpdateError,
            7 => ErrorCode::HwError,
            8 => ErrorCode::AliasingError,
            9 => ErrorCode::AlreadyInitialised,
            10 => ErrorCode::NotInitialised,
            _ => return None,
        };
        Some(code)
    }

    /// Raw status value as seen on the C side.
    pub fn status(self) -> i32 {
        self as i32
    }

    /// Get the native enumerator name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Success => "mir_sdr_Success",
            ErrorCode::Fail => "mir_sdr_Fail",
            ErrorCode::InvalidParam => "mir_sdr_InvalidParam",
            ErrorCode::OutOfRange => "mir_sdr_OutOfRange",
            ErrorCode::GainUpdateError => "mir_sdr_GainUpdateError",
            ErrorCode::RfUpdateError => "mir_sdr_RfUpdateError",
            ErrorCode::FsUpdateError => "mir_sdr_FsUpdateError",
            ErrorCode::HwError => "mir_sdr_HwError",
            ErrorCode::AliasingError => "mir_sdr_AliasingError",
            ErrorCode::AlreadyInitialised => "mir_sdr_AlreadyInitialised",
            ErrorCode::NotInitialised => "mir_sdr_NotInitialised",
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Fail => "Fail",
            ErrorCode::InvalidParam => "Invalid Param",
            ErrorCode::OutOfRange => "Out of Range",
            ErrorCode::GainUpdateError => "Gain Update error",
            ErrorCode::RfUpdateError => "RF Update error",
            ErrorCode::FsUpdateError => "FS Update error",
            ErrorCode::HwError => "HW error",
            ErrorCode::AliasingError => "Aliasing error",
            ErrorCode::AlreadyInitialised => "Already Initialised",
            ErrorCode::NotInitialised => "Not Initialised",
        }
    }
}

/// Errors that can occur while driving an RSP.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The receiver was superseded by a newer one or torn down.
    #[error("Deactivated Receiver Error")]
    DeactivatedReceiver,

    /// No connector was supplied when building a receiver.
    #[error("Unplugged Connector Error")]
    UnpluggedConnector,

    /// The native API reported a failure.
    #[error("device error: {}", .0.description())]
    Device(ErrorCode),

    /// The native API returned a status outside the documented set.
    #[error("unknown device status: {0}")]
    UnknownStatus(i32),

    /// The linked library does not match the API the bindings were written for.
    #[error("API version mismatch: expected {expected}, found {found}")]
    ApiVersionMismatch { expected: f32, found: f32 },
}

impl Error {
    /// The native code behind a device error, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Device(code) => Some(*code),
            _ => None,
        }
    }
}

/// Turn a raw native status into a `Result`.
pub fn check(status: i32) -> Result<()> {
    match ErrorCode::from_status(status) {
        Some(ErrorCode::Success) => Ok(()),
        Some(code) => Err(Error::Device(code)),
        None => Err(Error::UnknownStatus(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_ok() {
        assert_eq!(check(0), Ok(()));
    }

    #[test]
    fn known_codes_map_to_device_errors() {
        for status in 1..=10 {
            let err = check(status).unwrap_err();
            let code = err.code().expect("device error");
            assert_eq!(code.status(), status);
        }
        assert_eq!(check(7), Err(Error::Device(ErrorCode::HwError)));
    }

    #[test]
    fn unknown_codes_are_not_indexed() {
        assert_eq!(check(11), Err(Error::UnknownStatus(11)));
        assert_eq!(check(-1), Err(Error::UnknownStatus(-1)));
        assert_eq!(check(i32::MAX), Err(Error::UnknownStatus(i32::MAX)));
        assert_eq!(ErrorCode::from_status(42), None);
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::DeactivatedReceiver.to_string(),
            "Deactivated Receiver Error"
        );
        assert_eq!(
            Error::UnpluggedConnector.to_string(),
            "Unplugged Connector Error"
        );
        assert_eq!(
            Error::Device(ErrorCode::OutOfRange).to_string(),
            "device error: Out of Range"
        );
        assert_eq!(
            Error::UnknownStatus(99).to_string(),
            "unknown device status: 99"
        );
    }

    #[test]
    fn names_follow_native_enum() {
        assert_eq!(ErrorCode::Success.name(), "mir_sdr_Success");
        assert_eq!(ErrorCode::NotInitialised.name(), "mir_sdr_NotInitialised");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
