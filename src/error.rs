//! Error types.
//!
//! Configuration problems are reported with [`ConfigError`]. Errors coming
//! from WebGL2 or other JavaScript APIs are carried as
//! [`JsValue`](wasm_bindgen::JsValue), as in the rest of the render engine.

use thiserror::Error;

/// Configuration error.
///
/// These errors are returned when a simulation object is constructed with
/// parameters that cannot produce a usable water surface. They are fatal at
/// initialization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The ripple grid needs at least two samples per side.
    #[error("grid size must be at least 2 (got {0})")]
    GridSize(usize),
    /// The grid is indexed by `u16` elements, so it cannot exceed that size.
    #[error("grid size {0} does not fit in 16-bit vertex indices")]
    GridTooLarge(usize),
    /// The world radius of the water plane must be finite and positive.
    #[error("world radius must be finite and positive (got {0})")]
    WorldRadius(f32),
    /// A physical parameter is out of its valid range.
    #[error("invalid value {value} for {name}")]
    Parameter {
        /// Name of the parameter.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// The JSON configuration could not be parsed.
    #[error("unable to parse configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::Parse(err.to_string())
    }
}

impl From<ConfigError> for wasm_bindgen::JsValue {
    fn from(err: ConfigError) -> wasm_bindgen::JsValue {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

/// Checks that a parameter is finite and not negative.
pub(crate) fn non_negative(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Parameter { name, value })
    }
}

/// Checks that a parameter is finite and strictly positive.
pub(crate) fn positive(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Parameter { name, value })
    }
}
