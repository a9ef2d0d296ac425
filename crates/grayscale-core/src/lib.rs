//! Platform-agnostic engine for an SSD1306-class 72x40 panel driven in a
//! software-dithered 2-bit grayscale mode across two MCU cores.
//!
//! This crate owns the framebuffer, the drawing primitives, the sub-frame
//! compositor, the cross-core coordination protocol, and the GPU timing
//! loop. It never touches a GPIO pin or a SPI peripheral directly: that is
//! [`grayscale_hal::PanelTransport`] and [`grayscale_hal::FrameClock`]'s
//! job, implemented per platform in a crate like `grayscale-rp2040`.

#![no_std]

pub mod color;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod coordination;
pub mod engine;
pub mod error;
pub mod font;
pub mod framebuffer;
pub mod rasterizer;
pub mod sprite;

pub use color::Color;
pub use compositor::Subframe;
pub use config::DisplayConfig;
pub use coordination::{CoordinationState, ThreadState};
pub use engine::{FramebufferCell, GpuLoop, GrayscaleEngine};
pub use error::EngineError;
pub use font::Font;
pub use framebuffer::Framebuffer;
pub use rasterizer::Rasterizer;
pub use sprite::Sprite;
