//! Persisted display configuration.
//!
//! The one setting a host application is expected to save across reboots:
//! how long the GPU loop believes one full sub-frame cycle takes. Encoded
//! as a plain comma-separated `key,value` text line so it can be written
//! to whatever small key/value store the firmware already has (a flash
//! page, an EEPROM emulation region) without pulling in a serialization
//! crate for one integer.

use heapless::String;

/// Text key under which [`DisplayConfig::display_refresh_time_us`] is
/// stored.
pub const REFRESH_TIME_KEY: &str = "display_refresh_time_us";

/// Valid range for `display_refresh_time_us`, inclusive. Values outside
/// this range are rejected by `decode` in favor of the default.
pub const REFRESH_TIME_RANGE: core::ops::RangeInclusive<u32> = 0..=99990;

/// Longest encoded line this module will produce or accept.
pub const MAX_ENCODED_LEN: usize = 40;

/// Display timing configuration persisted by the host application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Microseconds the GPU loop budgets for one full sub-frame cycle.
    pub display_refresh_time_us: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            display_refresh_time_us: 27400,
        }
    }
}

impl DisplayConfig {
    /// Encode as a `key,value` line. Infallible: the longest possible
    /// value fits comfortably in [`MAX_ENCODED_LEN`].
    pub fn encode(&self) -> String<MAX_ENCODED_LEN> {
        let mut out = String::new();
        let _ = write_kv(&mut out, self.display_refresh_time_us);
        out
    }

    /// Decode a `key,value` line. Malformed input, an unrecognized key, or
    /// a value outside [`REFRESH_TIME_RANGE`] all fall back to
    /// [`DisplayConfig::default`] rather than erroring: a corrupted
    /// persisted config should never prevent the panel from starting.
    pub fn decode(line: &str) -> Self {
        let Some((key, value)) = line.trim().split_once(',') else {
            return Self::default();
        };
        if key != REFRESH_TIME_KEY {
            return Self::default();
        }
        match value.trim().parse::<u32>() {
            Ok(v) if REFRESH_TIME_RANGE.contains(&v) => Self {
                display_refresh_time_us: v,
            },
            _ => Self::default(),
        }
    }
}

fn write_kv(out: &mut String<MAX_ENCODED_LEN>, value: u32) -> core::fmt::Result {
    use core::fmt::Write;
    write!(out, "{REFRESH_TIME_KEY},{value}")
}
