//! Timetag handling
//!
//! OSC timetags are 64-bit NTP-style fixed-point values: 32 bits of seconds
//! since 1900-01-01 plus 32 bits of fractional seconds (1/2^32 resolution).
//! The raw value `1` is reserved and always means "dispatch as soon as
//! possible"; it never denotes the instant one tick past the epoch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
pub const SECONDS_1900_TO_1970: u64 = 2_208_988_800;

/// The reserved raw timetag value meaning "immediately".
pub const IMMEDIATE_RAW: u64 = 1;

/// A fixed-point NTP instant: seconds since 1900 plus a 1/2^32 fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NtpTime {
    pub seconds: u32,
    pub fraction: u32,
}

impl NtpTime {
    pub fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// The packed 64-bit wire representation.
    pub fn raw(self) -> u64 {
        (u64::from(self.seconds) << 32) | u64::from(self.fraction)
    }

    pub fn from_raw(raw: u64) -> Self {
        Self {
            seconds: (raw >> 32) as u32,
            fraction: raw as u32,
        }
    }

    /// The current wall-clock time as an NTP instant.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let since_unix = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let seconds = (since_unix.as_secs() + SECONDS_1900_TO_1970) as u32;
        let fraction = ((u64::from(since_unix.subsec_nanos()) << 32) / 1_000_000_000) as u32;
        Self { seconds, fraction }
    }

    pub fn to_system_time(self) -> SystemTime {
        let nanos = (u64::from(self.fraction) * 1_000_000_000) >> 32;
        let since_1900 = Duration::new(u64::from(self.seconds), nanos as u32);
        let offset = Duration::from_secs(SECONDS_1900_TO_1970);
        if since_1900 >= offset {
            UNIX_EPOCH + (since_1900 - offset)
        } else {
            UNIX_EPOCH - (offset - since_1900)
        }
    }
}

/// When a bundle's contents should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeTag {
    /// Dispatch as soon as possible (raw value `1`).
    Immediate,
    /// Dispatch at an absolute instant.
    At(NtpTime),
}

impl TimeTag {
    /// Decode a raw 64-bit timetag. The reserved value `1` decodes to
    /// [`TimeTag::Immediate`]; everything else is an absolute instant.
    pub fn from_raw(raw: u64) -> Self {
        if raw == IMMEDIATE_RAW {
            TimeTag::Immediate
        } else {
            TimeTag::At(NtpTime::from_raw(raw))
        }
    }

    pub fn to_raw(self) -> u64 {
        match self {
            TimeTag::Immediate => IMMEDIATE_RAW,
            TimeTag::At(t) => t.raw(),
        }
    }

    /// A timetag for the current instant.
    pub fn now() -> Self {
        TimeTag::At(NtpTime::now())
    }

    pub fn at(time: SystemTime) -> Self {
        TimeTag::At(NtpTime::from_system_time(time))
    }

    pub fn is_immediate(self) -> bool {
        matches!(self, TimeTag::Immediate)
    }

    /// True if this tag calls for delivery now: immediate, or an instant
    /// that has already passed.
    pub fn is_due(self) -> bool {
        match self {
            TimeTag::Immediate => true,
            TimeTag::At(t) => t <= NtpTime::now(),
        }
    }

    /// Time remaining until this tag is due; zero when already due.
    pub fn until_due(self) -> Duration {
        match self {
            TimeTag::Immediate => Duration::ZERO,
            TimeTag::At(t) => t
                .to_system_time()
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        }
    }
}
