//! Motion profile generation.

mod profile;

pub use profile::{Direction, MotionProfile};
