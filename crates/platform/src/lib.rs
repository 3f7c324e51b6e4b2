//! Hardware Abstraction Layer (HAL) for the DAC streaming driver
//!
//! This crate provides trait-based abstractions for the peripherals the
//! driver touches, enabling development and testing without physical
//! hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Host / scripting layer (simulator crate, or the board's binding)
//!         ↓
//! Streaming engine (dac crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (vendor DAC + timer-group registers, lwIP PPPoS)
//! ```
//!
//! # Abstractions
//!
//! - [`DacOutput`] - 8-bit analog output on two channels
//! - [`HardwareTimer`] - periodic/one-shot timer driving a [`TickHandler`]
//! - [`UartPeripheral`] - byte stream carrying PPP frames
//! - [`PppStack`] / [`PppInterface`] - PPP-over-serial network interface
//!
//! # Features
//!
//! - `std`: Enable standard library support (error impls, [`mocks`])
//! - `defmt`: Enable defmt logging and `defmt::Format` derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register and pad names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod dac_types;
pub mod mocks;
pub mod output;
pub mod peripheral;
pub mod ppp;
pub mod timer;

// Re-export main traits
pub use output::{DacOutput, OutputError};
pub use timer::{HardwareTimer, TickAction, TickHandler, TickPeriod, TimerError, TimerMode};

// Re-export domain newtypes
pub use dac_types::{DacChannel, DacValue, GpioNum, OutOfRangeError};

// Re-export peripheral types
pub use peripheral::{DataBits, Parity, StopBits, UartConfig, UartPeripheral};

// Re-export PPP types
pub use ppp::{IpConfig, PppError, PppInterface, PppStack, PppStatus};
