//! Configuration.
//!
//! The whole water scene is configured with a [`WaterConfig`], which can be
//! deserialized from JSON. Every field has a default, so that a configuration
//! only needs to list the values that differ from the defaults.
//!
//! # Example
//!
//! ```
//! use cave_water::config::WaterConfig;
//!
//! let config = WaterConfig::from_json(r#"{"grid_resolution": 32, "drops": {"interval": 0.25}}"#)?;
//! assert_eq!(config.grid_size(), 33);
//! assert_eq!(config.drops.interval, 0.25);
//! assert_eq!(config.world_radius, 7.0);
//! # Ok::<(), cave_water::error::ConfigError>(())
//! ```

use crate::camera::{Camera, Projection};
use crate::drops::DropParams;
use crate::error::{self, ConfigError};
use crate::excitation::{LiftParams, TravelingWave};
use crate::reflection::ReflectionParams;
use crate::ripple::RippleParams;
use serde::{Deserialize, Serialize};

/// Configuration of the water scene.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WaterConfig {
    /// Number of grid cells per side of the water plane.
    ///
    /// The ripple field has `grid_resolution + 1` samples per side.
    pub grid_resolution: usize,
    /// Half the side length of the water plane in world units.
    pub world_radius: f32,
    /// Height of the water plane.
    pub water_height: f32,
    /// Ripple field parameters.
    pub ripple: RippleParams,
    /// Drop parameters.
    pub drops: DropParams,
    /// Excitation source parameters.
    pub excitation: ExcitationConfig,
    /// Reflection parameters.
    pub reflection: ReflectionParams,
    /// Initial camera.
    pub camera: Camera,
    /// Perspective projection. The aspect ratio is replaced by that of the
    /// canvas.
    pub projection: Projection,
    /// Filter directives for the logs, using the syntax of
    /// [`EnvFilter`](tracing_subscriber::EnvFilter).
    pub log_filter: String,
}

/// Configuration of the excitation source.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ExcitationConfig {
    /// Traveling wave produced while the source is active.
    pub wave: TravelingWave,
    /// Motion of the source.
    pub lift: LiftParams,
}

impl Default for WaterConfig {
    fn default() -> WaterConfig {
        WaterConfig {
            grid_resolution: 64,
            world_radius: 7.0,
            water_height: -2.48,
            ripple: RippleParams::default(),
            drops: DropParams::default(),
            excitation: ExcitationConfig::default(),
            reflection: ReflectionParams::default(),
            camera: Camera::default(),
            projection: Projection::default(),
            log_filter: "info".to_string(),
        }
    }
}

// Largest number of samples per side such that all the vertices of the grid
// can be addressed with u16 indices.
const MAX_GRID_SIZE: usize = 256;

impl WaterConfig {
    /// Parses and validates a configuration in JSON format.
    pub fn from_json(json: &str) -> Result<WaterConfig, ConfigError> {
        let config: WaterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the number of samples per side of the ripple field.
    pub fn grid_size(&self) -> usize {
        self.grid_resolution + 1
    }

    /// Checks that the configuration is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid_size = self.grid_size();
        if grid_size < 2 {
            return Err(ConfigError::GridSize(grid_size));
        }
        if grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge(grid_size));
        }
        if !(self.world_radius.is_finite() && self.world_radius > 0.0) {
            return Err(ConfigError::WorldRadius(self.world_radius));
        }
        if !self.water_height.is_finite() {
            return Err(ConfigError::Parameter {
                name: "water_height",
                value: self.water_height,
            });
        }
        self.ripple.validate()?;
        self.drops.validate()?;
        let wave = &self.excitation.wave;
        error::non_negative("excitation.wave.amplitude", wave.amplitude)?;
        error::positive("excitation.wave.radius", wave.radius)?;
        let lift = &self.excitation.lift;
        error::non_negative("excitation.lift.lift_step", lift.lift_step)?;
        if lift.raised_height < lift.rest_height {
            return Err(ConfigError::Parameter {
                name: "excitation.lift.raised_height",
                value: lift.raised_height,
            });
        }
        if !self.reflection.mirror_bias.is_finite() {
            return Err(ConfigError::Parameter {
                name: "reflection.mirror_bias",
                value: self.reflection.mirror_bias,
            });
        }
        let projection = &self.projection;
        error::positive("projection.fov_y", projection.fov_y)?;
        error::positive("projection.near", projection.near)?;
        if !(projection.far.is_finite() && projection.far > projection.near) {
            return Err(ConfigError::Parameter {
                name: "projection.far",
                value: projection.far,
            });
        }
        Ok(())
    }
}
