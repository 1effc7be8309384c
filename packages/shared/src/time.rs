//! Wall-clock helpers and NTP time tag conversion.
//!
//! OSC bundles carry a 64-bit NTP time tag: the upper 32 bits count seconds
//! since 1900-01-01, the lower 32 bits are a binary fraction of a second.

use chrono::{DateTime, TimeDelta, Utc};

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970)
pub const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;

/// Current wall-clock time in UTC
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a UTC instant into an NTP time tag.
///
/// Instants before 1900 saturate to zero seconds.
pub fn to_ntp_timetag(instant: DateTime<Utc>) -> u64 {
    let seconds = (instant.timestamp() + NTP_UNIX_OFFSET_SECS).max(0) as u64;
    let nanos = u64::from(instant.timestamp_subsec_nanos());
    let fraction = (nanos << 32) / 1_000_000_000;
    ((seconds & 0xFFFF_FFFF) << 32) | fraction
}

/// Convert an NTP time tag back into a UTC instant (sub-microsecond precision is lost)
pub fn from_ntp_timetag(timetag: u64) -> Option<DateTime<Utc>> {
    let seconds = (timetag >> 32) as i64 - NTP_UNIX_OFFSET_SECS;
    let nanos = (((timetag & 0xFFFF_FFFF) * 1_000_000_000) >> 32) as u32;
    DateTime::from_timestamp(seconds, nanos)
}

/// Offset an instant by a number of microseconds
pub fn offset_micros(instant: DateTime<Utc>, micros: i64) -> DateTime<Utc> {
    instant + TimeDelta::microseconds(micros)
}

/// Format an instant as RFC 3339 for log output
pub fn to_rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339()
}
