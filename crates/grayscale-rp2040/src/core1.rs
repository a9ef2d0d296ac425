//! Core 1 entry point: owns the panel transport and runs the GPU timing
//! loop forever, taking instructions from core 0 only through
//! [`CoordinationState`] and [`FramebufferCell`].

use grayscale_core::{CoordinationState, FramebufferCell, GpuLoop, ThreadState};
use grayscale_hal::{FrameClock, PanelTransport};

/// `grayscale-core` stays log-agnostic (it is `no_std` and reusable outside
/// a `defmt` context), so lifecycle transitions are observed and logged here
/// instead, by diffing [`CoordinationState::thread_state`] across ticks.
fn log_transition(prev: ThreadState, next: ThreadState) {
    if prev == next {
        return;
    }
    match next {
        ThreadState::Running => defmt::info!("GPU loop entering RUNNING: panel initialized"),
        ThreadState::Stopped => defmt::info!("GPU loop entering STOPPED: panel in conventional mode"),
        ThreadState::Starting => defmt::info!("GPU loop entering STARTING: panel bring-up requested"),
        ThreadState::Stopping => defmt::info!("GPU loop entering STOPPING: draining current cycle"),
    }
}

pub fn core1_main<T, C>(
    transport: T,
    clock: C,
    coord: &'static CoordinationState,
    shared: &'static FramebufferCell,
) -> !
where
    T: PanelTransport,
    C: FrameClock,
{
    let mut gpu = GpuLoop::new(transport, clock, coord, shared);
    let mut prev_state = coord.thread_state();
    loop {
        if gpu.tick().is_err() {
            defmt::error!("panel transport error in GPU loop");
        }
        let state = coord.thread_state();
        log_transition(prev_state, state);
        prev_state = state;
    }
}
