//! Per-axis stepper controller.
//!
//! Owns one motor's STEP/DIR/ENABLE pins and its motion profile. Generic
//! over embedded-hal 1.0 pin types; the delay provider is used only for
//! the short STEP pulse width.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use core::time::Duration;

use crate::config::MotorSettings;
use crate::error::MotorError;
use crate::motion::{Direction, MotionProfile};

/// STEP pulse width in microseconds. 1-10 µs satisfies common driver ICs.
const STEP_PULSE_US: u32 = 2;

/// Controller for a single axis motor.
///
/// All motion methods are non-blocking: they only reprogram the profile.
/// Actual step pulses are emitted by [`AxisController::tick`], which must
/// be called every scheduling iteration.
pub struct AxisController<STEP, DIR, EN, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
{
    /// STEP pin (pulse to move one step).
    step_pin: STEP,

    /// DIR pin (level selects direction, subject to inversion).
    dir_pin: DIR,

    /// ENABLE pin (active low at the hardware boundary).
    enable_pin: EN,

    /// Delay provider for the step pulse width.
    delay: DELAY,

    /// Speed-ramped step scheduler.
    profile: MotionProfile,

    /// Live settings for this axis.
    settings: MotorSettings,

    /// Last direction written to the pin (cached to avoid pin writes).
    current_direction: Option<Direction>,
}

impl<STEP, DIR, EN, DELAY> AxisController<STEP, DIR, EN, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
{
    /// Create a controller with the given pins and settings.
    ///
    /// The motor starts at rest; the enable line is not touched until
    /// [`AxisController::set_enabled`] is called.
    pub fn new(step_pin: STEP, dir_pin: DIR, enable_pin: EN, delay: DELAY, settings: MotorSettings) -> Self {
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            delay,
            profile: MotionProfile::new(settings.max_speed, settings.acceleration),
            settings,
            current_direction: None,
        }
    }

    /// Convert caller units to motor steps.
    #[inline]
    fn units_to_steps(&self, units: f32) -> i64 {
        (units * self.settings.steps_per_unit as f32) as i64
    }

    /// Add a relative move to the running target.
    ///
    /// No bounds checking: travel is guarded by the limit hardware.
    pub fn move_relative(&mut self, units: f32) {
        let steps = self.units_to_steps(units);
        self.profile.move_relative(steps);
    }

    /// Set an absolute target position.
    pub fn move_absolute(&mut self, units: f32) {
        let steps = self.units_to_steps(units);
        self.profile.move_to(steps);
    }

    /// Re-zero the profile without motion (calibration).
    pub fn set_current_position(&mut self, units: f32) {
        let steps = self.units_to_steps(units);
        self.profile.set_current_position(steps);
    }

    /// Cancel the remaining distance immediately. The motor stays enabled.
    pub fn stop(&mut self) {
        self.profile.halt();
    }

    /// Advance the motion profile and emit at most one step pulse.
    ///
    /// Returns `true` if a step was emitted. This is the real-time path:
    /// it must run every scheduling iteration, fast enough that the
    /// profile's step intervals stay accurate.
    pub fn tick(&mut self, now: Duration) -> Result<bool, MotorError> {
        let Some(direction) = self.profile.poll(now) else {
            return Ok(false);
        };

        self.set_direction(direction)?;

        self.step_pin.set_high().map_err(|_| MotorError::PinError)?;
        self.delay.delay_us(STEP_PULSE_US);
        self.step_pin.set_low().map_err(|_| MotorError::PinError)?;

        Ok(true)
    }

    /// True iff remaining distance is nonzero.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.profile.is_running()
    }

    /// Steps remaining to the target (signed).
    #[inline]
    pub fn distance_to_go(&self) -> i64 {
        self.profile.distance_to_go()
    }

    /// Current position in steps.
    #[inline]
    pub fn position_steps(&self) -> i64 {
        self.profile.current_position()
    }

    /// Drive the enable line. Active-low: enabled drives the pin low.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError> {
        if enabled {
            self.enable_pin.set_low().map_err(|_| MotorError::PinError)?;
        } else {
            self.enable_pin.set_high().map_err(|_| MotorError::PinError)?;
        }
        self.settings.enabled = enabled;
        Ok(())
    }

    /// Whether the motor is currently enabled.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Current settings for this axis.
    #[inline]
    pub fn settings(&self) -> MotorSettings {
        self.settings
    }

    /// Apply a full settings update.
    ///
    /// Reprograms the profile's ramp parameters; an in-flight move picks
    /// the new limits up on subsequent ticks only. A changed inversion
    /// flag takes effect on the next direction write.
    pub fn apply_settings(&mut self, settings: &MotorSettings) -> Result<(), MotorError> {
        let inversion_changed = settings.invert_direction != self.settings.invert_direction;
        self.settings = *settings;

        self.profile.set_max_speed(settings.max_speed);
        self.profile.set_acceleration(settings.acceleration);

        if inversion_changed {
            // Force a pin rewrite on the next step
            self.current_direction = None;
        }

        self.set_enabled(settings.enabled)
    }

    /// Update only the speed ceiling.
    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.settings.max_speed = max_speed;
        self.profile.set_max_speed(max_speed);
    }

    /// Update only the ramp acceleration.
    pub fn set_acceleration(&mut self, acceleration: f32) {
        self.settings.acceleration = acceleration;
        self.profile.set_acceleration(acceleration);
    }

    /// Update only the unit conversion factor.
    pub fn set_steps_per_unit(&mut self, steps: u16) {
        self.settings.steps_per_unit = steps;
    }

    /// Update only the direction inversion flag.
    pub fn set_inverted(&mut self, inverted: bool) {
        if inverted != self.settings.invert_direction {
            self.settings.invert_direction = inverted;
            self.current_direction = None;
        }
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = match direction {
            Direction::Clockwise => !self.settings.invert_direction,
            Direction::CounterClockwise => self.settings.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| MotorError::PinError)?;
        } else {
            self.dir_pin.set_low().map_err(|_| MotorError::PinError)?;
        }

        self.current_direction = Some(direction);
        Ok(())
    }
}
