//! Configuration validation.

use crate::axis::AxisId;
use crate::error::{ConfigError, Error, Result};

use super::settings::{MotorSettings, TableConfig};

/// Validate a table configuration.
///
/// Checks every axis (override or default):
/// - `steps_per_unit` is nonzero
/// - `max_speed` is positive
/// - `acceleration` is positive
pub fn validate_config(config: &TableConfig) -> Result<()> {
    for axis in AxisId::ALL {
        validate_settings(axis, &config.settings_for(axis))?;
    }
    Ok(())
}

/// Validate one axis's settings.
pub fn validate_settings(axis: AxisId, settings: &MotorSettings) -> Result<()> {
    if settings.steps_per_unit == 0 {
        return Err(Error::Config(ConfigError::ZeroStepsPerUnit(axis)));
    }

    if settings.max_speed <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidMaxSpeed(settings.max_speed)));
    }

    if settings.acceleration <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            settings.acceleration,
        )));
    }

    Ok(())
}
