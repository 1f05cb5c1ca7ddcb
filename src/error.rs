//! Error types for table-motion.
//!
//! Provides unified error handling across command parsing, motor control,
//! and configuration. Every error is terminal to the single command that
//! produced it; nothing is retried and nothing brings the system down.

use core::fmt;

use crate::axis::AxisId;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Copy as much of `s` as fits into a bounded string, cutting on a char
/// boundary. Error payloads must never come back empty just because the
/// offending input was long.
pub(crate) fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Unified error type for all table-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed command input
    Command(CommandError),
    /// Motor hardware operation error
    Motor(MotorError),
    /// Configuration parsing or validation error
    Config(ConfigError),
}

/// Command parsing errors.
///
/// The `Display` text doubles as the usage line reported back over the
/// command boundary, matching the serial console wording.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// `run` called without a target
    MissingRunTarget,
    /// `run` target is not an axis, `all`, or a `-` prefixed form of either
    InvalidRunTarget(heapless::String<16>),
    /// `stop` target is not an axis or `all`
    InvalidStopTarget(heapless::String<16>),
    /// `move` token is not an axis or `all`
    InvalidMoveToken(heapless::String<16>),
    /// `move` axis token without a following numeric value
    MissingMoveValue(heapless::String<16>),
    /// `move` supplied no axis tokens at all
    NoMoveAxes,
    /// `axe` called without an axis
    MissingAxis,
    /// `axe` axis token is not X, Y, or Z
    InvalidAxis(heapless::String<16>),
    /// A value failed numeric parsing
    InvalidValue(heapless::String<16>),
}

/// Motor hardware errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// GPIO pin operation failed
    PinError,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Steps-per-unit conversion factor must be nonzero
    ZeroStepsPerUnit(AxisId),
    /// Maximum speed must be positive
    InvalidMaxSpeed(f32),
    /// Acceleration must be positive
    InvalidAcceleration(f32),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Command(e) => write!(f, "{}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::MissingRunTarget => {
                write!(f, "[Run] Usage: run [x|y|z|all|-x|-y|-z|-all]")
            }
            CommandError::InvalidRunTarget(tok) => {
                write!(
                    f,
                    "[Run] Invalid argument '{}'. Usage: run [x|y|z|all|-x|-y|-z|-all]",
                    tok
                )
            }
            CommandError::InvalidStopTarget(tok) => {
                write!(f, "[Stop] Invalid argument '{}'. Usage: stop [x|y|z|all]", tok)
            }
            CommandError::InvalidMoveToken(tok) => {
                write!(
                    f,
                    "[Move] Unknown axis '{}'. Usage: move x <val> y <val> z <val> | move all <val>",
                    tok
                )
            }
            CommandError::MissingMoveValue(tok) => {
                write!(f, "[Move] Missing value for '{}'", tok)
            }
            CommandError::NoMoveAxes => {
                write!(
                    f,
                    "[Move] No valid axes specified. Usage: move x <val> y <val> z <val> | move all <val>"
                )
            }
            CommandError::MissingAxis => write!(f, "Usage: axe <x|y|z> [key=value ...]"),
            CommandError::InvalidAxis(tok) => {
                write!(f, "Invalid axis '{}'. Use x, y, or z.", tok)
            }
            CommandError::InvalidValue(val) => write!(f, "Invalid numeric value '{}'", val),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::ZeroStepsPerUnit(axis) => {
                write!(f, "steps_per_unit for axis {} must be nonzero", axis)
            }
            ConfigError::InvalidMaxSpeed(v) => {
                write!(f, "Invalid max speed: {}. Must be > 0", v)
            }
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

// Conversion impls
impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
