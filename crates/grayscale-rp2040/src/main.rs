//! RP2040 firmware for an SSD1306-class 72x40 panel driven in software-
//! dithered 2-bit grayscale.
//!
//! Core 0: owns the framebuffer, runs the application's drawing loop.
//! Core 1: owns the SPI transport, runs the GPU timing loop that streams
//! sub-frames to the panel at a fixed cadence.

#![no_std]
#![no_main]

mod clock;
mod core1;
mod transport;

use defmt_rtt as _;
use panic_probe as _;
use rp2040_hal as hal;

use embedded_hal::digital::OutputPin;
use grayscale_hal::FrameClock;
use hal::clocks::Clock;
use hal::fugit::RateExtU32;
use hal::multicore::{Multicore, Stack};
use hal::sio::Sio;
use hal::Timer;

use grayscale_core::color;
use grayscale_core::{CoordinationState, Framebuffer, FramebufferCell, GrayscaleEngine, Rasterizer};

use clock::Rp2040Clock;
use transport::Rp2040PanelTransport;

/// Core 0's clock, backed by the SysTick timer it owns outright (core 1
/// keeps the always-on microsecond [`Timer`] for its own [`Rp2040Clock`]).
/// `now_us` is a plain running total rather than a hardware read, since
/// core 0 only ever waits relative to its own prior call.
struct SysClock {
    delay: cortex_m::delay::Delay,
    now_us: u32,
}

impl FrameClock for SysClock {
    fn now_us(&mut self) -> u32 {
        self.now_us
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
        self.now_us = self.now_us.wrapping_add(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
        self.now_us = self.now_us.wrapping_add(ms.saturating_mul(1000));
    }
}

/// Second-stage bootloader the boot ROM jumps to; generic QSPI flash, works
/// on any RP2040 board without board-specific flash config.
#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

const XTAL_FREQ_HZ: u32 = 12_000_000;

/// Core 1 stack, sized for the GPU loop's flat call depth (no recursion,
/// no dynamic allocation).
#[link_section = ".core1_stack"]
static CORE1_STACK: Stack<1024> = Stack::new();

static COORD: CoordinationState = CoordinationState::new();
static SHARED_FB: FramebufferCell = FramebufferCell::new();

#[hal::entry]
fn main() -> ! {
    let mut pac = hal::pac::Peripherals::take().unwrap();
    let core = cortex_m::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let sys_freq = clocks.system_clock.freq().to_Hz();
    let mut sio = Sio::new(pac.SIO);

    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // --- SPI0 to the panel ---
    let spi_sclk = pins.gpio2.into_function::<hal::gpio::FunctionSpi>();
    let spi_mosi = pins.gpio3.into_function::<hal::gpio::FunctionSpi>();
    let spi_miso = pins.gpio4.into_function::<hal::gpio::FunctionSpi>();

    let spi_bus = hal::spi::Spi::<_, _, _, 8>::new(pac.SPI0, (spi_mosi, spi_miso, spi_sclk));
    let spi_bus = spi_bus.init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        8.MHz(),
        embedded_hal::spi::MODE_0,
    );

    let dc = pins.gpio6.into_push_pull_output();
    let res = pins.gpio7.into_push_pull_output();
    let mut cs = pins.gpio5.into_push_pull_output();
    cs.set_high().ok();

    let timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let clock = Rp2040Clock::new(timer);
    let gpu_transport = Rp2040PanelTransport::new(spi_bus, dc, res, cs, sys_freq);

    // --- Spawn core 1: it owns the transport from here on ---
    let mut mc = Multicore::new(&mut pac.PSM, &mut pac.PPB, &mut sio.fifo);
    let cores = mc.cores();
    let core1 = &mut cores[1];
    let _ = core1.spawn(CORE1_STACK.take().unwrap(), move || {
        core1::core1_main(gpu_transport, clock, &COORD, &SHARED_FB);
    });

    defmt::info!("grayscale-rp2040: core 1 spawned, starting panel");

    let mut clock0 = SysClock {
        delay: cortex_m::delay::Delay::new(core.SYST, sys_freq),
        now_us: 0,
    };

    let engine = GrayscaleEngine::new(&COORD, &SHARED_FB);
    engine.start(&mut clock0);

    // A small idle animation so a first boot is visibly alive; a real
    // application draws here instead.
    let mut t: i32 = 0;
    loop {
        // SAFETY: core 0 is the only core that ever calls `draw`, and it
        // always finishes drawing before requesting a copy below.
        unsafe {
            engine.draw(|fb: &mut Framebuffer| {
                fb.fill(color::BLACK);
                fb.filled_rect(t % 72, 16, 8, 8, color::WHITE);
            });
        }
        engine.show_async();
        t = (t + 2) % 72;
        clock0.delay_ms(33);
    }
}

/// Program metadata for `picotool info`.
#[link_section = ".bi_entries"]
#[used]
pub static PICOTOOL_ENTRIES: [hal::binary_info::EntryAddr; 4] = [
    hal::binary_info::rp_cargo_bin_name!(),
    hal::binary_info::rp_cargo_version!(),
    hal::binary_info::rp_program_description!(c"SSD1306 grayscale panel driver"),
    hal::binary_info::rp_program_build_attribute!(),
];
