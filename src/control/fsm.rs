//! Motion finite-state machine.
//!
//! Arbitrates between idle, continuous-run, and stepped-move modes. The
//! FSM owns no hardware state of its own: it issues commands to the motor
//! bank and observes its status. All state transitions happen on the main
//! scheduling thread, never inside interrupt context, and the periodic
//! tick always sees post-tick, post-resolution bank state.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::axis::AxisId;
use crate::error::{CommandError, Error, Result};
use crate::motor::MotorBank;

use super::command;

/// Relative move, in caller units, that stands in for unbounded motion.
/// Large enough that a continuous run only ever ends on a stop command or
/// a limit event.
const CONTINUOUS_RUN_UNITS: f32 = 100_000.0;

/// Top-level motion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FsmState {
    /// No axis commanded.
    #[default]
    Idle,
    /// Unbounded motion until a stop command or limit event.
    ContinuousRun,
    /// Fixed relative move; ends when all axes come to rest.
    SteppedMove,
}

/// The motion state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionFsm {
    state: FsmState,
}

impl MotionFsm {
    /// Create the FSM in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> FsmState {
        self.state
    }

    /// Handle a `run` command: `run [x|y|z|all|-x|-y|-z|-all]`.
    ///
    /// Enables the selected axes, commands a functionally unbounded
    /// relative move in the requested direction and enters
    /// [`FsmState::ContinuousRun`]. A rejected input disables all motors
    /// and leaves the state unchanged.
    pub fn handle_run<STEP, DIR, EN, LIMIT, DELAY, W>(
        &mut self,
        bank: &mut MotorBank<STEP, DIR, EN, LIMIT, DELAY>,
        args: &[&str],
        out: &mut W,
    ) -> Result<()>
    where
        STEP: OutputPin,
        DIR: OutputPin,
        EN: OutputPin,
        LIMIT: InputPin,
        DELAY: DelayNs,
        W: Write,
    {
        let Some(&token) = args.first() else {
            bank.set_all_enabled(false)?;
            return Err(Error::Command(CommandError::MissingRunTarget));
        };

        let target = match command::parse_run_target(token) {
            Ok(target) => target,
            Err(e) => {
                bank.set_all_enabled(false)?;
                return Err(e.into());
            }
        };

        let units = if target.reverse {
            -CONTINUOUS_RUN_UNITS
        } else {
            CONTINUOUS_RUN_UNITS
        };

        for axis in target.selection.iter() {
            bank.set_enabled(axis, true)?;
            bank.move_relative(axis, units);
        }

        self.state = FsmState::ContinuousRun;

        let _ = writeln!(
            out,
            "[Run] Continuous motion {} {}",
            if target.reverse { "reverse" } else { "forward" },
            target.selection.token()
        );
        Ok(())
    }

    /// Handle a `stop` command: `stop [x|y|z|all]`, defaulting to `all`.
    ///
    /// Processed outside the periodic tick: halts the targeted axes at
    /// once and forces the FSM back to idle. Motors are disabled unless
    /// other axes remain running after a partial stop.
    pub fn handle_stop<STEP, DIR, EN, LIMIT, DELAY, W>(
        &mut self,
        bank: &mut MotorBank<STEP, DIR, EN, LIMIT, DELAY>,
        args: &[&str],
        out: &mut W,
    ) -> Result<()>
    where
        STEP: OutputPin,
        DIR: OutputPin,
        EN: OutputPin,
        LIMIT: InputPin,
        DELAY: DelayNs,
        W: Write,
    {
        let selection = command::parse_stop_target(args.first().copied())?;

        for axis in selection.iter() {
            bank.stop(axis);
        }

        if selection.is_all() || AxisId::ALL.iter().all(|axis| !bank.is_running(*axis)) {
            bank.set_all_enabled(false)?;
        }

        self.state = FsmState::Idle;

        let _ = writeln!(out, "[Stop] Motors stopped for {}", selection.token());
        Ok(())
    }

    /// Handle a `move` command: `move (axis value)... | move all value`.
    ///
    /// Enables all three axes (enable-all precedes the axis-selective
    /// move), issues the per-axis relative deltas and enters
    /// [`FsmState::SteppedMove`]. A rejected input changes neither the
    /// FSM state nor any axis's enabled flag.
    pub fn handle_move<STEP, DIR, EN, LIMIT, DELAY, W>(
        &mut self,
        bank: &mut MotorBank<STEP, DIR, EN, LIMIT, DELAY>,
        args: &[&str],
        out: &mut W,
    ) -> Result<()>
    where
        STEP: OutputPin,
        DIR: OutputPin,
        EN: OutputPin,
        LIMIT: InputPin,
        DELAY: DelayNs,
        W: Write,
    {
        let request = command::parse_move_args(args)?;

        bank.set_all_enabled(true)?;

        for axis in AxisId::ALL {
            if let Some(delta) = request.deltas[axis.index()] {
                bank.move_relative(axis, delta);
            }
        }

        self.state = FsmState::SteppedMove;

        let _ = write!(out, "[Move] Moving to: ");
        if request.used_all {
            // All deltas are the same value here
            let _ = writeln!(out, "ALL={}", request.deltas[0].unwrap_or(0.0));
        } else {
            for axis in AxisId::ALL {
                if let Some(delta) = request.deltas[axis.index()] {
                    let _ = write!(out, "{}={} ", axis, delta);
                }
            }
            let _ = writeln!(out);
        }
        Ok(())
    }

    /// Run one FSM step. Call every scheduling iteration, after the
    /// bank's `run_all`.
    ///
    /// In [`FsmState::ContinuousRun`], a tick with any axis retracting
    /// takes no action; the limit-stop check is re-evaluated on the next
    /// tick once the retraction has resolved. In
    /// [`FsmState::SteppedMove`], the move completes exactly when all
    /// three axes report no remaining distance, regardless of which were
    /// commanded.
    pub fn tick<STEP, DIR, EN, LIMIT, DELAY, W>(
        &mut self,
        bank: &mut MotorBank<STEP, DIR, EN, LIMIT, DELAY>,
        out: &mut W,
    ) -> Result<()>
    where
        STEP: OutputPin,
        DIR: OutputPin,
        EN: OutputPin,
        LIMIT: InputPin,
        DELAY: DelayNs,
        W: Write,
    {
        match self.state {
            FsmState::Idle => Ok(()),

            FsmState::ContinuousRun => {
                // Wait out any retraction before considering a stop
                if AxisId::ALL.iter().any(|axis| bank.is_retracting(*axis)) {
                    return Ok(());
                }

                if bank.limit_triggered()? {
                    for axis in AxisId::ALL {
                        bank.stop(axis);
                    }
                    bank.set_all_enabled(false)?;
                    self.state = FsmState::Idle;
                    let _ = writeln!(out, "[FSM] Limit triggered - stopping");
                }
                Ok(())
            }

            FsmState::SteppedMove => {
                if AxisId::ALL.iter().all(|axis| !bank.is_running(*axis)) {
                    bank.set_all_enabled(false)?;
                    self.state = FsmState::Idle;
                    let _ = writeln!(out, "[FSM] Move complete");
                }
                Ok(())
            }
        }
    }
}
