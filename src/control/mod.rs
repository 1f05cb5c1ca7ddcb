//! Motion state machine and command interpretation.

mod command;
mod fsm;

pub use fsm::{FsmState, MotionFsm};
