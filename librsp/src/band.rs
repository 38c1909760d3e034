//! Tuner band classification.
//!
//! The RSP front end switches filters and the up-converter per band, so a
//! retune inside the current band is a cheap centre-frequency update while
//! crossing a band edge needs a reinit.

use std::fmt;

/// Frequency band as understood by the native API (`mir_sdr_BandT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// Below 12 MHz.
    AmLo,
    /// 12 to 30 MHz.
    AmMid,
    /// 30 to 60 MHz.
    AmHi,
    /// 60 to 120 MHz.
    Vhf,
    /// 120 to 250 MHz.
    Band3,
    /// 250 to 420 MHz.
    BandX,
    /// 420 to 1000 MHz.
    Band4_5,
    /// 1000 to 2000 MHz.
    BandL,
    /// 2 GHz and above, or anything not a number.
    OutOfRange,
}

const ALL_BANDS: &[Band] = &[
    Band::AmLo,
    Band::AmMid,
    Band::AmHi,
    Band::Vhf,
    Band::Band3,
    Band::BandX,
    Band::Band4_5,
    Band::BandL,
];

impl Band {
    /// Classify a frequency in hertz.
    pub fn from_freq(freq_hz: f64) -> Band {
        if freq_hz < 12e6 {
            return Band::AmLo;
        }
        ALL_BANDS
            .iter()
            .copied()
            .find(|band| {
                let (low, high) = band.freq_range();
                low <= freq_hz && freq_hz < high
            })
            .unwrap_or(Band::OutOfRange)
    }

    /// Half-open `[low, high)` range in hertz. `AmLo` starts at negative
    /// infinity; `OutOfRange` covers everything from 2 GHz up.
    pub fn freq_range(&self) -> (f64, f64) {
        match self {
            Band::AmLo => (f64::NEG_INFINITY, 12e6),
            Band::AmMid => (12e6, 30e6),
            Band::AmHi => (30e6, 60e6),
            Band::Vhf => (60e6, 120e6),
            Band::Band3 => (120e6, 250e6),
            Band::BandX => (250e6, 420e6),
            Band::Band4_5 => (420e6, 1000e6),
            Band::BandL => (1000e6, 2000e6),
            Band::OutOfRange => (2000e6, f64::INFINITY),
        }
    }

    /// Value of the matching `mir_sdr_BandT` enumerator, `-1` when out of range.
    pub fn native(&self) -> i32 {
        match self {
            Band::AmLo => 0,
            Band::AmMid => 1,
            Band::AmHi => 2,
            Band::Vhf => 3,
            Band::Band3 => 4,
            Band::BandX => 5,
            Band::Band4_5 => 6,
            Band::BandL => 7,
            Band::OutOfRange => -1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Band::AmLo => "AM LO",
            Band::AmMid => "AM MID",
            Band::AmHi => "AM HI",
            Band::Vhf => "VHF",
            Band::Band3 => "Band III",
            Band::BandX => "Band X",
            Band::Band4_5 => "Band IV/V",
            Band::BandL => "L Band",
            Band::OutOfRange => "out of range",
        }
    }

    /// All tunable bands in frequency order, lowest first.
    pub fn all() -> &'static [Band] {
        ALL_BANDS
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_and_out_of_range() {
        assert_eq!(Band::from_freq(11e6), Band::AmLo);
        assert_eq!(Band::from_freq(0.0), Band::AmLo);
        assert_eq!(Band::from_freq(2500e6), Band::OutOfRange);
        assert_eq!(Band::from_freq(2000e6), Band::OutOfRange);
        assert_eq!(Band::from_freq(f64::NAN), Band::OutOfRange);
    }

    #[test]
    fn edges_are_half_open() {
        assert_eq!(Band::from_freq(12e6), Band::AmMid);
        assert_eq!(Band::from_freq(29_999_999.0), Band::AmMid);
        assert_eq!(Band::from_freq(30e6), Band::AmHi);
        assert_eq!(Band::from_freq(60e6), Band::Vhf);
        assert_eq!(Band::from_freq(120e6), Band::Band3);
        assert_eq!(Band::from_freq(250e6), Band::BandX);
        assert_eq!(Band::from_freq(420e6), Band::Band4_5);
        assert_eq!(Band::from_freq(1000e6), Band::BandL);
        assert_eq!(Band::from_freq(1_999_999_999.0), Band::BandL);
    }

    #[test]
    fn broadcast_fm_is_vhf() {
        assert_eq!(Band::from_freq(100e6), Band::Vhf);
        assert_eq!(Band::from_freq(110e6), Band::Vhf);
    }

    #[test]
    fn midpoints_map_back() {
        for &band in Band::all().iter().skip(1) {
            let (low, high) = band.freq_range();
            assert_eq!(Band::from_freq((low + high) / 2.0), band, "{band}");
        }
    }

    #[test]
    fn native_values_are_ordered() {
        for (i, band) in Band::all().iter().enumerate() {
            assert_eq!(band.native(), i as i32);
        }
        assert_eq!(Band::OutOfRange.native(), -1);
    }
}
