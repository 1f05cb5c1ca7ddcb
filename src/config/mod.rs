//! Configuration module for table-motion.
//!
//! Provides the per-axis motor settings, their hard-coded defaults, and an
//! optional TOML layer (with `std` feature). Nothing here is persisted:
//! a restart always starts from the defaults.

mod settings;
mod validation;
#[cfg(feature = "std")]
mod loader;

pub use settings::{AxisOverride, AxisTables, MotorSettings, TableConfig};
pub use validation::{validate_config, validate_settings};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
