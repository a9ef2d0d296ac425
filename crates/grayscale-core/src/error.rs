//! Error types surfaced by the engine facade.

use core::fmt;

use crate::coordination::PENDING_CMD_LEN;

/// Failures the engine facade can report. Generic over the transport's own
/// error type so a caller sees exactly what their [`grayscale_hal::PanelTransport`]
/// reported, with no boxing or string allocation.
#[derive(Debug)]
pub enum EngineError<E> {
    /// A raw command handed to [`crate::engine::GrayscaleEngine::write_cmd`]
    /// was longer than [`PENDING_CMD_LEN`] bytes.
    CommandTooLong,
    /// The underlying transport reported an error writing to the panel.
    SpiWriteFailed(E),
}

impl<E> From<E> for EngineError<E> {
    fn from(e: E) -> Self {
        EngineError::SpiWriteFailed(e)
    }
}

impl<E: fmt::Debug> fmt::Display for EngineError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::CommandTooLong => write!(f, "command longer than {PENDING_CMD_LEN} bytes"),
            EngineError::SpiWriteFailed(e) => write!(f, "transport failed: {e:?}"),
        }
    }
}
