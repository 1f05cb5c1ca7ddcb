//! Per-axis motor settings.

use serde::Deserialize;

use crate::axis::AxisId;

/// Motion parameters for one axis motor.
///
/// Settings are volatile: they reset to the per-axis defaults on restart
/// and are mutated only through the explicit settings operations on the
/// motor bank. The profile generator reads them on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorSettings {
    /// Maximum speed in steps per second (> 0).
    pub max_speed: f32,

    /// Acceleration in steps per second squared (> 0).
    pub acceleration: f32,

    /// Conversion factor from caller units to motor steps (never zero).
    pub steps_per_unit: u16,

    /// Invert the direction pin logic.
    pub invert_direction: bool,

    /// Drive the enable line active.
    pub enabled: bool,
}

impl MotorSettings {
    /// Hard-coded defaults for an axis.
    ///
    /// X carries the fine-pitch lead screw (100 steps/unit, inverted);
    /// Y and Z share the coarser 8 steps/unit gearing.
    pub const fn default_for(axis: AxisId) -> Self {
        match axis {
            AxisId::X => MotorSettings {
                max_speed: 800.0,
                acceleration: 800.0,
                steps_per_unit: 100,
                invert_direction: true,
                enabled: true,
            },
            AxisId::Y => MotorSettings {
                max_speed: 300.0,
                acceleration: 300.0,
                steps_per_unit: 8,
                invert_direction: false,
                enabled: true,
            },
            AxisId::Z => MotorSettings {
                max_speed: 300.0,
                acceleration: 300.0,
                steps_per_unit: 8,
                invert_direction: true,
                enabled: true,
            },
        }
    }
}

/// Partial per-axis override, parsed from TOML.
///
/// Every field is optional: an absent field keeps the axis's hard-coded
/// default, so a table that only tunes `max_speed` does not disturb the
/// axis's inversion or gearing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AxisOverride {
    /// Maximum speed in steps per second.
    pub max_speed: Option<f32>,
    /// Acceleration in steps per second squared.
    pub acceleration: Option<f32>,
    /// Conversion factor from caller units to motor steps.
    pub steps_per_unit: Option<u16>,
    /// Invert the direction pin logic.
    pub invert_direction: Option<bool>,
    /// Drive the enable line active.
    pub enabled: Option<bool>,
}

impl AxisOverride {
    /// Merge this override onto a base settings value.
    fn apply_to(self, mut settings: MotorSettings) -> MotorSettings {
        if let Some(max_speed) = self.max_speed {
            settings.max_speed = max_speed;
        }
        if let Some(acceleration) = self.acceleration {
            settings.acceleration = acceleration;
        }
        if let Some(steps_per_unit) = self.steps_per_unit {
            settings.steps_per_unit = steps_per_unit;
        }
        if let Some(invert_direction) = self.invert_direction {
            settings.invert_direction = invert_direction;
        }
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        settings
    }
}

/// Optional per-axis setting overrides, parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AxisTables {
    /// X axis overrides, if present.
    pub x: Option<AxisOverride>,
    /// Y axis overrides, if present.
    pub y: Option<AxisOverride>,
    /// Z axis overrides, if present.
    pub z: Option<AxisOverride>,
}

/// Complete table configuration.
///
/// Any axis without an `[axes.<id>]` table falls back to
/// [`MotorSettings::default_for`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableConfig {
    /// Per-axis overrides.
    #[serde(default)]
    pub axes: AxisTables,
}

impl TableConfig {
    /// Effective settings for an axis: the hard-coded defaults with the
    /// axis's override table (if any) merged on top.
    pub fn settings_for(&self, axis: AxisId) -> MotorSettings {
        let defaults = MotorSettings::default_for(axis);
        let override_for = match axis {
            AxisId::X => self.axes.x,
            AxisId::Y => self.axes.y,
            AxisId::Z => self.axes.z,
        };
        match override_for {
            Some(table) => table.apply_to(defaults),
            None => defaults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_table() {
        let x = MotorSettings::default_for(AxisId::X);
        assert_eq!(x.steps_per_unit, 100);
        assert!(x.invert_direction);

        let y = MotorSettings::default_for(AxisId::Y);
        assert_eq!(y.steps_per_unit, 8);
        assert!(!y.invert_direction);

        let z = MotorSettings::default_for(AxisId::Z);
        assert!(z.invert_direction);
        assert!(z.enabled);
    }

    #[test]
    fn test_empty_config_falls_back() {
        let config = TableConfig::default();
        for axis in AxisId::ALL {
            assert_eq!(config.settings_for(axis), MotorSettings::default_for(axis));
        }
    }

    #[test]
    fn test_partial_override_keeps_axis_defaults() {
        let config = TableConfig {
            axes: AxisTables {
                x: Some(AxisOverride {
                    max_speed: Some(600.0),
                    ..AxisOverride::default()
                }),
                ..AxisTables::default()
            },
        };

        let x = config.settings_for(AxisId::X);
        assert_eq!(x.max_speed, 600.0);
        // Untouched fields come from the X defaults, not an axis-blind zero
        assert!(x.invert_direction);
        assert_eq!(x.steps_per_unit, 100);
        assert!(x.enabled);
    }
}
