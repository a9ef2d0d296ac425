#![no_std]

/// Abstracts the SSD1306-class 3-wire-plus-SPI panel protocol over any platform.
///
/// Implementations own the DC/CS/RES GPIO lines and the SPI bus. `write_cmd`
/// and `write_data` only differ in the state of DC; `reset` drives RES through
/// its full active-low pulse.
pub trait PanelTransport {
    type Error: core::fmt::Debug;

    /// Pull DC low and bulk-write `bytes` as controller commands.
    fn write_cmd(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Pull DC high and bulk-write `bytes` as GDRAM data.
    fn write_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Pulse RES low for the controller's reset window.
    fn reset(&mut self);
}

/// Abstracts the microsecond clock and delay primitives the GPU timing loop
/// needs to stay phase-locked with the panel's row scanner.
///
/// `now_us` wraps on overflow; callers only ever compute differences, never
/// absolute values, so wraparound is harmless as long as a single interval
/// never spans a full `u32` of microseconds (~71 minutes).
pub trait FrameClock {
    /// Free-running microsecond counter.
    fn now_us(&mut self) -> u32;

    /// Busy/idle-sleep for approximately `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Busy/idle-sleep for approximately `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}
