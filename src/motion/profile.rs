//! Motion profile generation.
//!
//! A constant-acceleration ramp that schedules at most one step per poll.
//! The profile tracks target and current position in steps and derives the
//! interval to the next step from the classic ramp recurrence
//! `c_n = c_{n-1} - 2*c_{n-1} / (4*n + 1)`, clamped at the interval that
//! corresponds to the configured maximum speed.

use core::time::Duration;

use libm::sqrtf;

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive step count.
    Clockwise,
    /// Negative step count.
    CounterClockwise,
}

impl Direction {
    /// Get direction from a signed step count.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// Speed-ramped step scheduler for one axis.
///
/// All positions are in motor steps. The profile is advanced exclusively
/// by [`MotionProfile::poll`]; no call here ever blocks. Read access is
/// cheap and side-effect free, so other components may query position and
/// remaining distance at any point of the scheduling cycle.
#[derive(Debug, Clone)]
pub struct MotionProfile {
    /// Current position in steps.
    current_pos: i64,

    /// Target position in steps.
    target_pos: i64,

    /// Current signed speed in steps/sec (negative = counter-clockwise).
    speed: f32,

    /// Configured speed ceiling in steps/sec.
    max_speed: f32,

    /// Configured ramp acceleration in steps/sec².
    acceleration: f32,

    /// Interval until the next step, in microseconds. Zero means no step
    /// is due.
    step_interval_us: u64,

    /// Timestamp of the last emitted step, in microseconds.
    last_step_time_us: u64,

    /// Ramp step counter. Positive while accelerating, negative while
    /// decelerating, zero at rest.
    n: i64,

    /// First-step interval in microseconds (from the acceleration).
    c0_us: f32,

    /// Interval of the most recent step in microseconds.
    cn_us: f32,

    /// Interval floor in microseconds (at max speed).
    cmin_us: f32,

    /// Direction the ramp is currently stepping in.
    direction: Direction,
}

impl MotionProfile {
    /// Create a profile at rest at position zero.
    pub fn new(max_speed: f32, acceleration: f32) -> Self {
        let mut profile = Self {
            current_pos: 0,
            target_pos: 0,
            speed: 0.0,
            max_speed: 1.0,
            acceleration: 0.0,
            step_interval_us: 0,
            last_step_time_us: 0,
            n: 0,
            c0_us: 0.0,
            cn_us: 0.0,
            cmin_us: 1.0,
            direction: Direction::Clockwise,
        };
        profile.set_max_speed(max_speed);
        profile.set_acceleration(acceleration);
        profile
    }

    /// Current position in steps.
    #[inline]
    pub fn current_position(&self) -> i64 {
        self.current_pos
    }

    /// Most recently set target position in steps.
    #[inline]
    pub fn target_position(&self) -> i64 {
        self.target_pos
    }

    /// Steps remaining to the target (signed).
    #[inline]
    pub fn distance_to_go(&self) -> i64 {
        self.target_pos - self.current_pos
    }

    /// True iff remaining distance is nonzero.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.distance_to_go() != 0
    }

    /// Current signed speed in steps/sec.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Configured speed ceiling in steps/sec.
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Configured acceleration in steps/sec².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Set an absolute target position.
    pub fn move_to(&mut self, absolute: i64) {
        if self.target_pos != absolute {
            self.target_pos = absolute;
            self.compute_new_speed();
        }
    }

    /// Add to the running target position.
    pub fn move_relative(&mut self, delta: i64) {
        self.move_to(self.target_pos + delta);
    }

    /// Re-zero the profile without motion.
    ///
    /// Sets current and target position to `position` and brings the ramp
    /// to rest. Used for calibration.
    pub fn set_current_position(&mut self, position: i64) {
        self.target_pos = position;
        self.current_pos = position;
        self.n = 0;
        self.step_interval_us = 0;
        self.speed = 0.0;
    }

    /// Cancel the remaining distance immediately.
    ///
    /// The target collapses onto the current position and the ramp resets;
    /// no deceleration tail is produced.
    pub fn halt(&mut self) {
        self.target_pos = self.current_pos;
        self.n = 0;
        self.step_interval_us = 0;
        self.speed = 0.0;
    }

    /// Reprogram the speed ceiling.
    ///
    /// Applies to subsequent ticks only; the ramp counter is rescaled so an
    /// in-flight move converges under the new ceiling.
    pub fn set_max_speed(&mut self, steps_per_sec: f32) {
        if steps_per_sec <= 0.0 || steps_per_sec == self.max_speed {
            return;
        }

        self.max_speed = steps_per_sec;
        self.cmin_us = 1_000_000.0 / steps_per_sec;

        // Recompute the ramp point from the current speed
        if self.n > 0 {
            self.n = ((self.speed * self.speed) / (2.0 * self.acceleration)) as i64;
            self.compute_new_speed();
        }
    }

    /// Reprogram the ramp acceleration.
    ///
    /// Applies to subsequent ticks only, not retroactively to already
    /// computed ramp segments.
    pub fn set_acceleration(&mut self, steps_per_sec2: f32) {
        if steps_per_sec2 <= 0.0 || steps_per_sec2 == self.acceleration {
            return;
        }

        // Rescale the ramp counter to preserve the current speed point
        if self.acceleration > 0.0 {
            self.n = ((self.n as f32) * (self.acceleration / steps_per_sec2)) as i64;
        }
        self.c0_us = 0.676 * sqrtf(2.0 / steps_per_sec2) * 1_000_000.0;
        self.acceleration = steps_per_sec2;
        self.compute_new_speed();
    }

    /// Poll the profile and consume a step if one is due.
    ///
    /// Must be called at a rate high enough to keep step timing accurate
    /// (sub-millisecond granularity at full speed). At most one step is
    /// produced per call; the returned direction is the direction of that
    /// step.
    pub fn poll(&mut self, now: Duration) -> Option<Direction> {
        if self.step_interval_us == 0 {
            return None;
        }

        let now_us = now.as_micros() as u64;
        if now_us.wrapping_sub(self.last_step_time_us) < self.step_interval_us {
            return None;
        }

        self.current_pos += self.direction.sign();
        self.last_step_time_us = now_us;

        let direction = self.direction;
        self.compute_new_speed();
        Some(direction)
    }

    /// Recompute speed and step interval after a step or a parameter change.
    fn compute_new_speed(&mut self) {
        let distance_to = self.distance_to_go();
        let steps_to_stop = ((self.speed * self.speed) / (2.0 * self.acceleration)) as i64;

        if distance_to == 0 && steps_to_stop <= 1 {
            // At the target and stopped, or close enough
            self.step_interval_us = 0;
            self.speed = 0.0;
            self.n = 0;
            return;
        }

        if distance_to > 0 {
            // Target is ahead: maybe begin decelerating, or reverse a
            // deceleration that is no longer needed
            if self.n > 0 {
                if steps_to_stop >= distance_to || self.direction == Direction::CounterClockwise {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < distance_to
                && self.direction == Direction::Clockwise
            {
                self.n = -self.n;
            }
        } else if distance_to < 0 {
            // Target is behind: mirror image of the above
            if self.n > 0 {
                if steps_to_stop >= -distance_to || self.direction == Direction::Clockwise {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0
                && steps_to_stop < -distance_to
                && self.direction == Direction::CounterClockwise
            {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            // First step from rest
            self.cn_us = self.c0_us;
            self.direction = Direction::from_steps(distance_to);
        } else {
            // Ramp recurrence, clamped at the max-speed interval
            self.cn_us -= (2.0 * self.cn_us) / ((4 * self.n + 1) as f32);
            if self.cn_us < self.cmin_us {
                self.cn_us = self.cmin_us;
            }
        }
        self.n += 1;

        self.step_interval_us = (self.cn_us as u64).max(1);
        self.speed = 1_000_000.0 / self.cn_us;
        if self.direction == Direction::CounterClockwise {
            self.speed = -self.speed;
        }
    }
}
