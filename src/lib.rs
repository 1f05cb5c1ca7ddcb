//! # table-motion
//!
//! Motion-control core for a three-axis (X/Y/Z) stepper positioning table
//! with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Non-blocking motion**: speed-ramped step scheduling advanced one
//!   tick at a time from a cooperative main loop
//! - **embedded-hal 1.0**: `OutputPin` for STEP/DIR/ENABLE, `InputPin`
//!   for limit switches, `DelayNs` for step pulse timing
//! - **Limit safety**: interrupt-latched limit events with automatic
//!   fixed-distance retraction, resolved on the main path
//! - **Motion FSM**: idle / continuous-run / stepped-move arbitration
//!   driven by `run`, `move`, and `stop` commands
//! - **no_std compatible**: core library works without the standard
//!   library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use table_motion::{AxisId, MotionFsm, MotorBank, StdClock};
//!
//! let mut bank = MotorBank::new(axes, switches);
//! let mut fsm = MotionFsm::new();
//! let clock = StdClock::new();
//!
//! bank.begin()?;
//! loop {
//!     bank.run_all(&clock)?;
//!     fsm.tick(&mut bank, &mut console)?;
//! }
//! ```
//!
//! Limit switch interrupts forward to the bank through the line mapping:
//!
//! ```rust,ignore
//! use table_motion::LimitLine;
//!
//! // inside the ISR bound to the X-min line:
//! let line = LimitLine::XMin;
//! bank.on_limit_hit(line.axis(), line.end())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O, TOML parsing, and `StdClock`
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod axis;
pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod motion;
pub mod motor;

// Re-exports for ergonomic API
pub use axis::AxisId;
pub use clock::SystemClock;
pub use config::{MotorSettings, TableConfig, validate_config};
pub use control::{FsmState, MotionFsm};
pub use error::{Error, Result};
pub use motion::{Direction, MotionProfile};
pub use motor::{AxisController, LimitEnd, LimitLine, LimitSwitch, MotorBank, RetractCompleted};

// Std-only conveniences
#[cfg(feature = "std")]
pub use clock::StdClock;
#[cfg(feature = "std")]
pub use config::load_config;
