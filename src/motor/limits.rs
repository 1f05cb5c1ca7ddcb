//! Limit switch state and interrupt-line mapping.
//!
//! The latched flags are the only state shared between interrupt context
//! and the main loop. Each flag is a single atomic boolean with one writer
//! per context: the ISR path sets trigger/retract flags, the main-loop
//! resolver clears them. Composite reads may therefore be stale by one
//! scheduling iteration but are never torn.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::InputPin;

use crate::axis::AxisId;
use crate::error::MotorError;

/// Which end of an axis's travel a switch guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitEnd {
    /// Minimum-travel end.
    Min,
    /// Maximum-travel end.
    Max,
}

/// One of the six hardware interrupt lines.
///
/// Interrupt vectors cannot carry instance context, so firmware binds each
/// vector to a line and forwards to the owning bank:
/// `bank.on_limit_hit(line.axis(), line.end())`. The mapping is a plain
/// value type, so any number of banks can share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitLine {
    /// X axis, minimum end.
    XMin,
    /// X axis, maximum end.
    XMax,
    /// Y axis, minimum end.
    YMin,
    /// Y axis, maximum end.
    YMax,
    /// Z axis, minimum end.
    ZMin,
    /// Z axis, maximum end.
    ZMax,
}

impl LimitLine {
    /// All six lines, axis-major.
    pub const ALL: [LimitLine; 6] = [
        LimitLine::XMin,
        LimitLine::XMax,
        LimitLine::YMin,
        LimitLine::YMax,
        LimitLine::ZMin,
        LimitLine::ZMax,
    ];

    /// The axis this line belongs to.
    #[inline]
    pub const fn axis(self) -> AxisId {
        match self {
            LimitLine::XMin | LimitLine::XMax => AxisId::X,
            LimitLine::YMin | LimitLine::YMax => AxisId::Y,
            LimitLine::ZMin | LimitLine::ZMax => AxisId::Z,
        }
    }

    /// The travel end this line guards.
    #[inline]
    pub const fn end(self) -> LimitEnd {
        match self {
            LimitLine::XMin | LimitLine::YMin | LimitLine::ZMin => LimitEnd::Min,
            LimitLine::XMax | LimitLine::YMax | LimitLine::ZMax => LimitEnd::Max,
        }
    }
}

/// Latched limit flags for one axis.
///
/// Lifecycle: created untriggered at boot; trigger flags transition
/// false→true only via [`LimitLatch::trigger`] (interrupt context);
/// everything is cleared together by [`LimitLatch::resolve`] (main loop),
/// once the retraction profile reports zero remaining distance.
#[derive(Debug, Default)]
pub struct LimitLatch {
    triggered_min: AtomicBool,
    triggered_max: AtomicBool,
    limit_hit: AtomicBool,
    retracting: AtomicBool,
}

impl LimitLatch {
    /// Create an untriggered latch.
    pub const fn new() -> Self {
        Self {
            triggered_min: AtomicBool::new(false),
            triggered_max: AtomicBool::new(false),
            limit_hit: AtomicBool::new(false),
            retracting: AtomicBool::new(false),
        }
    }

    /// Latch a trigger for one end and mark the retraction in progress.
    ///
    /// ISR-context writer.
    pub fn trigger(&self, end: LimitEnd) {
        match end {
            LimitEnd::Min => self.triggered_min.store(true, Ordering::Relaxed),
            LimitEnd::Max => self.triggered_max.store(true, Ordering::Relaxed),
        }
        self.limit_hit.store(true, Ordering::Relaxed);
        self.retracting.store(true, Ordering::Relaxed);
    }

    /// Clear every latched flag after a completed retraction.
    ///
    /// Main-loop writer; idempotent.
    pub fn resolve(&self) {
        self.triggered_min.store(false, Ordering::Relaxed);
        self.triggered_max.store(false, Ordering::Relaxed);
        self.limit_hit.store(false, Ordering::Relaxed);
        self.retracting.store(false, Ordering::Relaxed);
    }

    /// Latched trigger state for one end.
    #[inline]
    pub fn is_triggered(&self, end: LimitEnd) -> bool {
        match end {
            LimitEnd::Min => self.triggered_min.load(Ordering::Relaxed),
            LimitEnd::Max => self.triggered_max.load(Ordering::Relaxed),
        }
    }

    /// True between a trigger and its resolution.
    #[inline]
    pub fn limit_hit(&self) -> bool {
        self.limit_hit.load(Ordering::Relaxed)
    }

    /// True while the retraction move is in progress.
    #[inline]
    pub fn is_retracting(&self) -> bool {
        self.retracting.load(Ordering::Relaxed)
    }
}

/// Limit switch pair for one axis: two active-low inputs plus the latch.
#[derive(Debug)]
pub struct LimitSwitch<PIN> {
    min_pin: PIN,
    max_pin: PIN,
    latch: LimitLatch,
}

impl<PIN> LimitSwitch<PIN>
where
    PIN: InputPin,
{
    /// Create a switch pair from its two input pins.
    pub fn new(min_pin: PIN, max_pin: PIN) -> Self {
        Self {
            min_pin,
            max_pin,
            latch: LimitLatch::new(),
        }
    }

    /// The latched flag set.
    #[inline]
    pub fn latch(&self) -> &LimitLatch {
        &self.latch
    }

    /// True iff either physical pin currently reads active (low).
    ///
    /// Independent of the latched interrupt flags.
    pub fn any_pin_active(&mut self) -> Result<bool, MotorError> {
        let min = self.min_pin.is_low().map_err(|_| MotorError::PinError)?;
        let max = self.max_pin.is_low().map_err(|_| MotorError::PinError)?;
        Ok(min || max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_mapping() {
        assert_eq!(LimitLine::XMin.axis(), AxisId::X);
        assert_eq!(LimitLine::XMin.end(), LimitEnd::Min);
        assert_eq!(LimitLine::ZMax.axis(), AxisId::Z);
        assert_eq!(LimitLine::ZMax.end(), LimitEnd::Max);
        assert_eq!(LimitLine::ALL.len(), 6);
    }

    #[test]
    fn test_latch_lifecycle() {
        let latch = LimitLatch::new();
        assert!(!latch.limit_hit());
        assert!(!latch.is_retracting());

        latch.trigger(LimitEnd::Max);
        assert!(latch.is_triggered(LimitEnd::Max));
        assert!(!latch.is_triggered(LimitEnd::Min));
        assert!(latch.limit_hit());
        assert!(latch.is_retracting());

        latch.resolve();
        assert!(!latch.is_triggered(LimitEnd::Max));
        assert!(!latch.limit_hit());
        assert!(!latch.is_retracting());

        // Idempotent
        latch.resolve();
        assert!(!latch.limit_hit());
    }
}
