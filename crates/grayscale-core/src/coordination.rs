//! Lock-free state shared between the core that owns the framebuffer and the
//! core that runs the GPU timing loop.
//!
//! Cortex-M0+ (ARMv6-M) has no LDREX/STREX, so there is no compare-and-swap
//! and no `fetch_add`/`swap` on this target: every field here is a plain
//! `load`/`store` cell. Single-word load/store is atomic on any Cortex-M
//! core, so a one-writer, one-reader protocol per field needs nothing
//! stronger. Each field has exactly one core that writes it and one that
//! reads it.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::constants::CMD_NOP;

/// Lifecycle of the GPU timing loop running on the second core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ThreadState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl ThreadState {
    fn from_u32(v: u32) -> Self {
        match v {
            1 => ThreadState::Starting,
            2 => ThreadState::Running,
            3 => ThreadState::Stopping,
            _ => ThreadState::Stopped,
        }
    }
}

/// Fixed size of the pending-command scratch. A shorter command is
/// NOP-padded out to this length rather than tracking a separate count.
pub const PENDING_CMD_LEN: usize = 8;

/// Sentinel meaning "no contrast change pending" in `pending_contrast`.
const NO_CONTRAST: u32 = u32::MAX;

/// Cross-core coordination cell. One instance lives in `'static` memory,
/// shared by reference between the two cores; nothing here is behind a
/// lock.
pub struct CoordinationState {
    thread_state: AtomicU32,
    /// Core 0 sets this to request a fresh framebuffer copy; core 1 clears
    /// it once the copy is taken.
    copy_request: AtomicU32,
    /// Core 0 sets this after writing `pending_cmd_buf`; core 1 clears it
    /// once it has read the buffer out.
    cmd_request: AtomicU32,
    pending_cmd_buf: [AtomicU8; PENDING_CMD_LEN],
    /// Pending contrast value in `0..=127`, or `NO_CONTRAST`. Later writes
    /// coalesce: only the most recent call before the GPU loop next
    /// samples it takes effect, matching the reference implementation's
    /// behavior of writing contrast straight to a shared variable with no
    /// queue.
    pending_contrast: AtomicU32,
}

impl Default for CoordinationState {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinationState {
    pub const fn new() -> Self {
        Self {
            thread_state: AtomicU32::new(ThreadState::Stopped as u32),
            copy_request: AtomicU32::new(0),
            cmd_request: AtomicU32::new(0),
            pending_cmd_buf: [const { AtomicU8::new(CMD_NOP) }; PENDING_CMD_LEN],
            pending_contrast: AtomicU32::new(NO_CONTRAST),
        }
    }

    pub fn thread_state(&self) -> ThreadState {
        ThreadState::from_u32(self.thread_state.load(Ordering::Acquire))
    }

    pub fn set_thread_state(&self, state: ThreadState) {
        self.thread_state.store(state as u32, Ordering::Release);
    }

    /// Core 0: ask the GPU loop to copy the framebuffer at its next safe
    /// point.
    pub fn request_copy(&self) {
        self.copy_request.store(1, Ordering::Release);
    }

    /// Peek whether a copy request is still outstanding, without clearing
    /// it. Used by a caller on core 0 that wants to block until core 1 has
    /// picked up the frame it just submitted.
    pub fn copy_pending(&self) -> bool {
        self.copy_request.load(Ordering::Acquire) != 0
    }

    /// Peek whether a contrast change is still outstanding, without
    /// clearing it.
    pub fn contrast_pending(&self) -> bool {
        self.pending_contrast.load(Ordering::Acquire) != NO_CONTRAST
    }

    /// Peek whether a raw command is still outstanding, without clearing
    /// it.
    pub fn cmd_pending(&self) -> bool {
        self.cmd_request.load(Ordering::Acquire) != 0
    }

    /// Core 1: check and clear a pending copy request. Only core 1 ever
    /// clears this flag and only core 0 ever sets it, so a plain
    /// load-then-store never races with itself.
    pub fn take_copy_request(&self) -> bool {
        let requested = self.copy_request.load(Ordering::Acquire) != 0;
        if requested {
            self.copy_request.store(0, Ordering::Release);
        }
        requested
    }

    /// Core 0: hand the GPU loop a short out-of-band command, NOP-padded to
    /// [`PENDING_CMD_LEN`] bytes. Returns `false` without writing anything
    /// if `bytes` is longer than that.
    pub fn request_cmd(&self, bytes: &[u8]) -> bool {
        if bytes.len() > PENDING_CMD_LEN {
            return false;
        }
        for (slot, &b) in self.pending_cmd_buf.iter().zip(bytes) {
            slot.store(b, Ordering::Relaxed);
        }
        for slot in self.pending_cmd_buf.iter().skip(bytes.len()) {
            slot.store(CMD_NOP, Ordering::Relaxed);
        }
        self.cmd_request.store(1, Ordering::Release);
        true
    }

    /// Core 1: take the pending command scratch, if a command is pending.
    /// Clears the request flag.
    pub fn take_cmd(&self) -> Option<[u8; PENDING_CMD_LEN]> {
        if self.cmd_request.load(Ordering::Acquire) == 0 {
            return None;
        }
        let mut out = [0u8; PENDING_CMD_LEN];
        for (slot, dst) in self.pending_cmd_buf.iter().zip(out.iter_mut()) {
            *dst = slot.load(Ordering::Relaxed);
        }
        self.cmd_request.store(0, Ordering::Release);
        Some(out)
    }

    /// Core 0: request a contrast change, replacing any not-yet-applied
    /// value.
    pub fn request_contrast(&self, level: u8) {
        self.pending_contrast
            .store(level as u32, Ordering::Release);
    }

    /// Core 1: take a pending contrast value, if any.
    pub fn take_contrast(&self) -> Option<u8> {
        let v = self.pending_contrast.load(Ordering::Acquire);
        if v == NO_CONTRAST {
            None
        } else {
            self.pending_contrast.store(NO_CONTRAST, Ordering::Release);
            Some(v as u8)
        }
    }
}
