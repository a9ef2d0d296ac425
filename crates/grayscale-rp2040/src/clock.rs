//! [`FrameClock`] backed by the RP2040's always-on microsecond timer.

use grayscale_hal::FrameClock;
use rp2040_hal::Timer;

pub struct Rp2040Clock {
    timer: Timer,
}

impl Rp2040Clock {
    pub fn new(timer: Timer) -> Self {
        Self { timer }
    }
}

impl FrameClock for Rp2040Clock {
    fn now_us(&mut self) -> u32 {
        self.timer.get_counter_low()
    }

    fn delay_us(&mut self, us: u32) {
        let start = self.timer.get_counter_low();
        while self.timer.get_counter_low().wrapping_sub(start) < us {
            cortex_m::asm::nop();
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}
