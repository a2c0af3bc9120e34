//! Timetag tests

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use oscine_core::time::SECONDS_1900_TO_1970;
use oscine_core::{NtpTime, TimeTag};

#[test]
fn test_immediate_reserved_bit_pattern() {
    // 0x0000000000000001 always decodes to Immediate, never to the instant
    // one tick past the epoch.
    assert_eq!(TimeTag::from_raw(1), TimeTag::Immediate);
    assert_eq!(TimeTag::Immediate.to_raw(), 1);

    // The neighbors are ordinary instants.
    assert_eq!(TimeTag::from_raw(0), TimeTag::At(NtpTime::new(0, 0)));
    assert_eq!(TimeTag::from_raw(2), TimeTag::At(NtpTime::new(0, 2)));
}

#[test]
fn test_unix_epoch_maps_to_offset() {
    let tag = NtpTime::from_system_time(UNIX_EPOCH);
    assert_eq!(tag.seconds as u64, SECONDS_1900_TO_1970);
    assert_eq!(tag.fraction, 0);
    assert_eq!(tag.to_system_time(), UNIX_EPOCH);
}

#[test]
fn test_half_second_fraction() {
    let t = UNIX_EPOCH + Duration::from_millis(500);
    let ntp = NtpTime::from_system_time(t);
    // 0.5s is exactly half the 32-bit fraction space.
    assert_eq!(ntp.fraction, 1 << 31);
}

#[test]
fn test_due_checks() {
    assert!(TimeTag::Immediate.is_due());

    let past = TimeTag::at(SystemTime::now() - Duration::from_secs(1));
    assert!(past.is_due());
    assert_eq!(past.until_due(), Duration::ZERO);

    let future = TimeTag::at(SystemTime::now() + Duration::from_secs(30));
    assert!(!future.is_due());
    let wait = future.until_due();
    assert!(wait > Duration::from_secs(29) && wait <= Duration::from_secs(30));
}

#[test]
fn test_wire_order_matches_instant_order() {
    let early = NtpTime::new(3_800_000_000, 10);
    let late = NtpTime::new(3_800_000_000, 11);
    assert!(early < late);
    assert!(early.raw() < late.raw());
}
