//! [`PanelTransport`] over the RP2040's SPI peripheral plus the panel's
//! DC/CS/RES GPIO lines.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use grayscale_hal::PanelTransport;

/// Reset pulse timing: settle high, assert low, settle high again.
const RESET_SETTLE_MS: u32 = 1;
const RESET_ASSERT_MS: u32 = 10;
const RESET_RELEASE_MS: u32 = 10;

#[derive(Debug)]
pub enum Rp2040TransportError<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
}

/// CS is asserted low once, here, for the transport's entire lifetime:
/// the panel is the only device on this SPI bus, and toggling CS around
/// every command/data write would add latency inside the GPU loop's
/// tightly budgeted per-sub-frame timing window.
pub struct Rp2040PanelTransport<SPI, DC, RES, CS> {
    spi: SPI,
    dc: DC,
    res: RES,
    cs: CS,
    cycles_per_ms: u32,
}

impl<SPI, DC, RES, CS, SpiE, PinE> Rp2040PanelTransport<SPI, DC, RES, CS>
where
    SPI: SpiBus<u8, Error = SpiE>,
    DC: OutputPin<Error = PinE>,
    RES: OutputPin<Error = PinE>,
    CS: OutputPin<Error = PinE>,
{
    pub fn new(spi: SPI, dc: DC, res: RES, mut cs: CS, sys_freq_hz: u32) -> Self {
        let _ = cs.set_low();
        Self {
            spi,
            dc,
            res,
            cs,
            cycles_per_ms: sys_freq_hz / 1000,
        }
    }

    fn delay_ms(&self, ms: u32) {
        cortex_m::asm::delay(self.cycles_per_ms * ms);
    }

    fn write(&mut self, dc_high: bool, bytes: &[u8]) -> Result<(), Rp2040TransportError<SpiE, PinE>> {
        if dc_high {
            self.dc.set_high()
        } else {
            self.dc.set_low()
        }
        .map_err(Rp2040TransportError::Pin)?;
        self.spi.write(bytes).map_err(Rp2040TransportError::Spi)
    }
}

impl<SPI, DC, RES, CS, SpiE, PinE> PanelTransport for Rp2040PanelTransport<SPI, DC, RES, CS>
where
    SPI: SpiBus<u8, Error = SpiE>,
    DC: OutputPin<Error = PinE>,
    RES: OutputPin<Error = PinE>,
    CS: OutputPin<Error = PinE>,
    SpiE: core::fmt::Debug,
    PinE: core::fmt::Debug,
{
    type Error = Rp2040TransportError<SpiE, PinE>;

    fn write_cmd(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.write(false, bytes)
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.write(true, bytes)
    }

    fn reset(&mut self) {
        let _ = self.res.set_high();
        self.delay_ms(RESET_SETTLE_MS);
        let _ = self.res.set_low();
        self.delay_ms(RESET_ASSERT_MS);
        let _ = self.res.set_high();
        self.delay_ms(RESET_RELEASE_MS);
    }
}
