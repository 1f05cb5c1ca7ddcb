//! Motor bank: the sole owner of all axis hardware state.
//!
//! Aggregates the three axis controllers and their limit switches. The
//! bank is the only component that receives hardware interrupt
//! notifications; it records limit events and resolves the resulting
//! retraction on the next scheduling tick.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::axis::AxisId;
use crate::clock::SystemClock;
use crate::config::{validate_settings, MotorSettings, TableConfig};
use crate::error::{CommandError, Error, Result};
use crate::motor::axis::AxisController;
use crate::motor::limits::{LimitEnd, LimitSwitch};

/// Retraction distance commanded on a limit hit, in caller units.
///
/// Converted through the axis's `steps_per_unit`, so the physical backoff
/// scales with the axis gearing.
const RETRACT_UNITS: f32 = 25.0;

/// Axes whose retraction completed during a [`MotorBank::run_all`] call.
///
/// Returned to the caller so the security log line can be emitted outside
/// the real-time path.
pub type RetractCompleted = heapless::Vec<AxisId, 3>;

/// The three-axis motor bank.
///
/// # Concurrency contract
///
/// [`MotorBank::on_limit_hit`] is the only entry point intended for
/// interrupt context; the platform must serialize it against the main loop
/// (on a single core this is the hardware's interrupt-disable during ISR
/// bodies plus a critical section around main-loop access). It writes only
/// the latched limit flags and the retraction move; all flag clearing and
/// motor disabling happens exclusively in [`MotorBank::run_all`] on the
/// main path.
pub struct MotorBank<STEP, DIR, EN, LIMIT, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    LIMIT: InputPin,
    DELAY: DelayNs,
{
    axes: [AxisController<STEP, DIR, EN, DELAY>; 3],
    switches: [LimitSwitch<LIMIT>; 3],
}

impl<STEP, DIR, EN, LIMIT, DELAY> MotorBank<STEP, DIR, EN, LIMIT, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    LIMIT: InputPin,
    DELAY: DelayNs,
{
    /// Create a bank from its three axis controllers and switch pairs,
    /// ordered X, Y, Z.
    pub fn new(
        axes: [AxisController<STEP, DIR, EN, DELAY>; 3],
        switches: [LimitSwitch<LIMIT>; 3],
    ) -> Self {
        Self { axes, switches }
    }

    /// One-time initializer: all axes disabled.
    ///
    /// Must run before the first scheduling iteration, after the platform
    /// has configured pins and attached the six limit interrupts.
    pub fn begin(&mut self) -> Result<()> {
        for axis in AxisId::ALL {
            self.axes[axis.index()].set_enabled(false)?;
        }
        Ok(())
    }

    /// Advance every axis one tick, then resolve completed retractions.
    ///
    /// This is the single place where interrupt-raised state transitions
    /// back to normal: an axis that was retracting and has stopped gets
    /// its latch cleared and its motor disabled. Runs every scheduling
    /// cycle so a finished retraction never stays energized longer than
    /// one iteration.
    pub fn run_all<C: SystemClock>(&mut self, clock: &C) -> Result<RetractCompleted> {
        let now = clock.elapsed();
        for axis in AxisId::ALL {
            self.axes[axis.index()].tick(now)?;
        }

        let mut completed = RetractCompleted::new();
        for axis in AxisId::ALL {
            let i = axis.index();
            if self.switches[i].latch().is_retracting() && !self.axes[i].is_running() {
                self.switches[i].latch().resolve();
                self.axes[i].set_enabled(false)?;
                // Capacity 3, one slot per axis
                let _ = completed.push(axis);
            }
        }
        Ok(completed)
    }

    /// Limit switch interrupt entry point.
    ///
    /// Halts the axis's in-flight motion, latches the trigger, force
    /// enables the motor and commands a fixed retraction away from the
    /// switch (positive off the min end, negative off the max end).
    /// Ignored while a retraction is already in progress, so a bouncing
    /// switch cannot stack retractions.
    ///
    /// Safe for interrupt context: writes axis state and the profile only,
    /// never blocks.
    pub fn on_limit_hit(&mut self, axis: AxisId, end: LimitEnd) -> Result<()> {
        let i = axis.index();
        if self.switches[i].latch().is_retracting() {
            return Ok(());
        }

        self.switches[i].latch().trigger(end);

        let controller = &mut self.axes[i];
        controller.stop();

        let retract_units = match end {
            LimitEnd::Min => RETRACT_UNITS,
            LimitEnd::Max => -RETRACT_UNITS,
        };
        controller.set_enabled(true)?;
        controller.move_relative(retract_units);
        Ok(())
    }

    /// Latched trigger state for one axis end.
    #[inline]
    pub fn is_limit_reached(&self, axis: AxisId, end: LimitEnd) -> bool {
        self.switches[axis.index()].latch().is_triggered(end)
    }

    /// True iff any axis currently reads a limit pin active.
    ///
    /// Reads the physical pins, independent of the latched flags; used as
    /// the stop guard in the motion FSM.
    pub fn limit_triggered(&mut self) -> Result<bool> {
        for switch in self.switches.iter_mut() {
            if switch.any_pin_active()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True while a limit-triggered retraction is in progress on the axis.
    #[inline]
    pub fn is_retracting(&self, axis: AxisId) -> bool {
        self.switches[axis.index()].latch().is_retracting()
    }

    /// True iff the axis has remaining distance to travel.
    #[inline]
    pub fn is_running(&self, axis: AxisId) -> bool {
        self.axes[axis.index()].is_running()
    }

    /// Steps remaining to the axis target (signed).
    #[inline]
    pub fn distance_to_go(&self, axis: AxisId) -> i64 {
        self.axes[axis.index()].distance_to_go()
    }

    /// Add a relative move to the axis target, in caller units.
    pub fn move_relative(&mut self, axis: AxisId, units: f32) {
        self.axes[axis.index()].move_relative(units);
    }

    /// Set an absolute axis target, in caller units.
    pub fn move_absolute(&mut self, axis: AxisId, units: f32) {
        self.axes[axis.index()].move_absolute(units);
    }

    /// Re-zero an axis without motion (calibration).
    pub fn set_current_position(&mut self, axis: AxisId, units: f32) {
        self.axes[axis.index()].set_current_position(units);
    }

    /// Cancel the axis's remaining distance immediately.
    pub fn stop(&mut self, axis: AxisId) {
        self.axes[axis.index()].stop();
    }

    /// Drive one axis enable line.
    pub fn set_enabled(&mut self, axis: AxisId, enabled: bool) -> Result<()> {
        self.axes[axis.index()].set_enabled(enabled)?;
        Ok(())
    }

    /// Drive every axis enable line.
    pub fn set_all_enabled(&mut self, enabled: bool) -> Result<()> {
        for axis in AxisId::ALL {
            self.axes[axis.index()].set_enabled(enabled)?;
        }
        Ok(())
    }

    /// Whether the axis motor is enabled.
    #[inline]
    pub fn is_enabled(&self, axis: AxisId) -> bool {
        self.axes[axis.index()].is_enabled()
    }

    /// Current settings for one axis.
    #[inline]
    pub fn motor_settings(&self, axis: AxisId) -> MotorSettings {
        self.axes[axis.index()].settings()
    }

    /// Apply a full settings update to one axis.
    ///
    /// Other axes are not interrupted; an in-flight move on this axis
    /// honors the new ramp limits from the next tick.
    pub fn set_motor_settings(&mut self, axis: AxisId, settings: &MotorSettings) -> Result<()> {
        validate_settings(axis, settings)?;
        self.axes[axis.index()].apply_settings(settings)?;
        Ok(())
    }

    /// Update one axis's speed ceiling.
    pub fn set_max_speed(&mut self, axis: AxisId, max_speed: f32) {
        self.axes[axis.index()].set_max_speed(max_speed);
    }

    /// Update one axis's ramp acceleration.
    pub fn set_acceleration(&mut self, axis: AxisId, acceleration: f32) {
        self.axes[axis.index()].set_acceleration(acceleration);
    }

    /// Update one axis's unit conversion factor.
    pub fn set_steps_per_unit(&mut self, axis: AxisId, steps: u16) {
        self.axes[axis.index()].set_steps_per_unit(steps);
    }

    /// Update one axis's direction inversion flag.
    pub fn set_inverted(&mut self, axis: AxisId, inverted: bool) {
        self.axes[axis.index()].set_inverted(inverted);
    }

    /// Apply a parsed configuration to all three axes.
    pub fn apply_config(&mut self, config: &TableConfig) -> Result<()> {
        for axis in AxisId::ALL {
            self.set_motor_settings(axis, &config.settings_for(axis))?;
        }
        Ok(())
    }

    /// Handle the `axe` diagnostics command.
    ///
    /// `args` are the tokens after the command word:
    /// `axe <axis> [key=value ...]` with keys `maxSpeed`, `acceleration`,
    /// `stepsPerUnit`, `inverted`, `enabled`. With no pairs, writes the
    /// axis's configuration and limit status as a JSON-style report.
    /// Unrecognized keys are silently ignored.
    pub fn configure<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        let Some(&axis_token) = args.first() else {
            return Err(Error::Command(CommandError::MissingAxis));
        };

        let Some(axis) = AxisId::from_token(axis_token) else {
            return Err(Error::Command(CommandError::InvalidAxis(
                crate::error::bounded(axis_token),
            )));
        };

        if args.len() == 1 {
            self.write_report(axis, out);
            return Ok(());
        }

        let mut settings = self.motor_settings(axis);
        for pair in &args[1..] {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };

            match key {
                "maxSpeed" => settings.max_speed = parse_value(value)?,
                "acceleration" => settings.acceleration = parse_value(value)?,
                "stepsPerUnit" => settings.steps_per_unit = parse_value(value)?,
                "inverted" => settings.invert_direction = value == "true",
                "enabled" => settings.enabled = value == "true",
                // Unknown keys are dropped without comment
                _ => {}
            }
        }

        self.set_motor_settings(axis, &settings)?;
        let _ = writeln!(out, "[AXE] Updated axis settings.");
        Ok(())
    }

    fn write_report<W: Write>(&self, axis: AxisId, out: &mut W) {
        let settings = self.motor_settings(axis);
        let latch = self.switches[axis.index()].latch();

        let _ = writeln!(out, "{{");
        let _ = writeln!(out, "  \"axis\": \"{}\",", axis);
        let _ = writeln!(out, "  \"motor\": {{");
        let _ = writeln!(out, "    \"maxSpeed\": {},", settings.max_speed);
        let _ = writeln!(out, "    \"acceleration\": {},", settings.acceleration);
        let _ = writeln!(out, "    \"stepsPerUnit\": {},", settings.steps_per_unit);
        let _ = writeln!(out, "    \"inverted\": {},", settings.invert_direction);
        let _ = writeln!(out, "    \"enabled\": {}", settings.enabled);
        let _ = writeln!(out, "  }},");
        let _ = writeln!(out, "  \"limitSwitches\": {{");
        let _ = writeln!(out, "    \"minTriggered\": {},", latch.is_triggered(LimitEnd::Min));
        let _ = writeln!(out, "    \"maxTriggered\": {},", latch.is_triggered(LimitEnd::Max));
        let _ = writeln!(out, "    \"limitHit\": {},", latch.limit_hit());
        let _ = writeln!(out, "    \"retracting\": {}", latch.is_retracting());
        let _ = writeln!(out, "  }}");
        let _ = writeln!(out, "}}");
    }
}

/// Parse a numeric settings value, reporting the offending text on error.
fn parse_value<T: core::str::FromStr>(value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Command(CommandError::InvalidValue(crate::error::bounded(value))))
}
