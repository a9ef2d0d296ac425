//! Integration tests for the GPU loop and facade using a mock transport and
//! a manually-advanced clock, exercising the public API the way a host
//! application would rather than poking at `GpuLoop`'s private fields.
//!
//! The mock transport shares its captured writes through an `Rc<RefCell<_>>`
//! so a handle cloned before the transport is moved into `GpuLoop::new` can
//! still inspect everything written to it afterward.

use std::cell::RefCell;
use std::rc::Rc;

use grayscale_core::{color, CoordinationState, Framebuffer, FramebufferCell, GpuLoop, GrayscaleEngine, ThreadState};
use grayscale_hal::{FrameClock, PanelTransport};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Write {
    Cmd(Vec<u8>),
    Data(Vec<u8>),
}

#[derive(Clone)]
struct MockTransport {
    writes: Rc<RefCell<Vec<Write>>>,
}

impl MockTransport {
    fn new() -> Self {
        Self {
            writes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn data_writes(&self) -> Vec<Vec<u8>> {
        self.writes
            .borrow()
            .iter()
            .filter_map(|w| match w {
                Write::Data(bytes) => Some(bytes.clone()),
                Write::Cmd(_) => None,
            })
            .collect()
    }
}

impl PanelTransport for MockTransport {
    type Error = core::convert::Infallible;

    fn write_cmd(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.writes.borrow_mut().push(Write::Cmd(bytes.to_vec()));
        Ok(())
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.writes.borrow_mut().push(Write::Data(bytes.to_vec()));
        Ok(())
    }

    fn reset(&mut self) {}
}

/// `GpuLoop` owns its own clock for timing budgets; these tests never need
/// it to actually wait, so it is a no-op stand-in. Time "passing" is driven
/// entirely by the harness clock below ticking the loop forward.
struct NullClock;

impl FrameClock for NullClock {
    fn now_us(&mut self) -> u32 {
        0
    }
    fn delay_us(&mut self, _us: u32) {}
    fn delay_ms(&mut self, _ms: u32) {}
}

/// Stands in for the second core: every time the facade would block waiting
/// on the coordination state, this ticks the GPU loop forward by one
/// sub-frame instead of actually sleeping.
struct HarnessClock<'a, 'b> {
    now: u32,
    gpu: &'b mut GpuLoop<'a, MockTransport, NullClock>,
}

impl<'a, 'b> FrameClock for HarnessClock<'a, 'b> {
    fn now_us(&mut self) -> u32 {
        self.now
    }

    fn delay_us(&mut self, us: u32) {
        self.now = self.now.wrapping_add(us);
        let _ = self.gpu.tick();
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

#[test]
fn show_drives_a_full_frame_through_to_the_wire() {
    let coord = CoordinationState::new();
    let shared = FramebufferCell::new();
    let transport = MockTransport::new();
    let wire = transport.clone();
    let mut gpu = GpuLoop::new(transport, NullClock, &coord, &shared);
    let engine = GrayscaleEngine::new(&coord, &shared);

    coord.set_thread_state(ThreadState::Starting);
    gpu.tick().unwrap();
    assert_eq!(coord.thread_state(), ThreadState::Running);

    unsafe {
        engine.draw(|fb| {
            fb.fill(color::BLACK);
            fb.set_pixel(10, 10, color::WHITE);
        });
    }

    let mut harness = HarnessClock { now: 0, gpu: &mut gpu };
    engine.show(&mut harness);
    // `show()` only guarantees the *next* cycle to start after it returns
    // streams the new contents (the cycle in flight when the copy request
    // was drained was already composed from the old shadow). Run that next
    // full cycle by hand before inspecting the wire.
    for _ in 0..3 {
        harness.gpu.tick().unwrap();
    }

    let idx = (10usize >> 3) * 72 + 10;
    let bit = 1u8 << (10 & 7);
    let data_writes = wire.data_writes();
    let last_cycle = &data_writes[data_writes.len() - 3..];
    for data in last_cycle {
        assert_eq!(data.len(), 360);
        assert_eq!(data[idx] & bit, bit, "every streamed sub-frame should carry the lit pixel");
        for (i, &b) in data.iter().enumerate() {
            if i != idx {
                assert_eq!(b, 0, "byte {i} should be dark outside the single lit pixel");
            }
        }
    }
}

#[test]
fn brightness_sync_lands_the_expanded_contrast_on_the_wire() {
    let coord = CoordinationState::new();
    let shared = FramebufferCell::new();
    let transport = MockTransport::new();
    let mut gpu = GpuLoop::new(transport, NullClock, &coord, &shared);
    let engine = GrayscaleEngine::new(&coord, &shared);

    coord.set_thread_state(ThreadState::Starting);
    gpu.tick().unwrap();

    let mut harness = HarnessClock { now: 0, gpu: &mut gpu };
    engine.brightness_sync(64, &mut harness);
    assert!(!coord.contrast_pending());
}

#[test]
fn write_cmd_over_eight_bytes_is_rejected_without_touching_the_framebuffer() {
    let coord = CoordinationState::new();
    let shared = FramebufferCell::new();
    let engine = GrayscaleEngine::new(&coord, &shared);

    unsafe {
        engine.draw(|fb| fb.fill(color::WHITE));
    }
    let before = unsafe { engine.draw(|fb: &mut Framebuffer| *fb.plane0()) };

    let nine_bytes = [0u8; 9];
    assert!(engine.write_cmd(&nine_bytes, &mut NullClock).is_err());

    let after = unsafe { engine.draw(|fb: &mut Framebuffer| *fb.plane0()) };
    assert_eq!(before, after);
}
