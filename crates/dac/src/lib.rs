//! Timer-driven DAC streaming: a byte-buffer queue drained one byte per tick
//!
//! Callers queue byte buffers on a [`DacDevice`]; a hardware timer fires the
//! device's tick handler at the configured rate, and each tick puts the next
//! byte on the analog output. When a buffer runs out the [`PlaybackMode`]
//! decides whether it is dropped (`Once`) or replayed (`Loop`).
//!
//! ```text
//! enqueue() ──► PlaybackQueue ──► StreamEngine::advance() ──► DacOutput::write()
//!                                        ▲
//!                       HardwareTimer ──► TickHandler::on_tick()
//! ```
//!
//! # Features
//!
//! - `std`: `std::error::Error` for [`DacError`]
//! - `defmt`: defmt logging and `defmt::Format` derives (target builds)
//! - `tracing`: tracing logging (hosted builds)
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to every module.
mod fmt;

pub mod device;
pub mod engine;
pub mod error;
pub mod policy;
pub mod queue;
pub mod registry;

pub use device::{DacDevice, DeviceState, DeviceStatus, Rate};
pub use engine::{Cursor, StreamEngine};
pub use error::{DacError, Reason};
pub use platform::config::QUEUE_DEPTH;
pub use policy::PlaybackMode;
pub use queue::PlaybackQueue;
pub use registry::DacRegistry;
