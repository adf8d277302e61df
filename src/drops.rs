//! Falling water drops.
//!
//! Drops are spawned periodically at one of a set of source points (for
//! instance the tips of the crystals hanging from the cave ceiling), fall under
//! gravity, and are removed when they reach the water plane. At that moment
//! they inject an impulse into the [`RippleField`].

use crate::error::{self, ConfigError};
use crate::ripple::RippleField;
use glam::{Vec2, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters of the drop spawner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DropParams {
    /// Time in seconds between consecutive drops.
    pub interval: f32,
    /// Initial falling speed of a drop.
    pub initial_speed: f32,
    /// Gravitational acceleration.
    pub gravity: f32,
    /// Strength of the impulse injected when a drop hits the water.
    pub impact_strength: f32,
    /// Time in seconds during which an impact is highlighted.
    pub glow_duration: f32,
    /// Seed for the random choice of source. If `None`, a seed is taken from
    /// the clock at startup.
    pub seed: Option<u64>,
    /// Points from which drops fall.
    pub sources: Vec<[f32; 3]>,
}

impl Default for DropParams {
    fn default() -> DropParams {
        DropParams {
            interval: 0.5,
            initial_speed: 2.0,
            gravity: 2.0,
            impact_strength: 0.8,
            glow_duration: 0.1,
            seed: None,
            sources: vec![
                [2.4, 4.2, 1.1],
                [-1.8, 4.6, 2.7],
                [-3.1, 4.1, -0.9],
                [0.6, 4.8, -2.9],
                [3.3, 4.3, -2.2],
                [-0.4, 5.1, 0.3],
            ],
        }
    }
}

impl DropParams {
    /// Checks that all the parameters are in their valid ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        error::positive("drops.interval", self.interval)?;
        error::non_negative("drops.initial_speed", self.initial_speed)?;
        error::non_negative("drops.gravity", self.gravity)?;
        error::positive("drops.impact_strength", self.impact_strength)?;
        if self.impact_strength > 1.0 {
            return Err(ConfigError::Parameter {
                name: "drops.impact_strength",
                value: self.impact_strength,
            });
        }
        error::non_negative("drops.glow_duration", self.glow_duration)?;
        Ok(())
    }
}

/// Falling drop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drop {
    /// World-space position.
    pub position: Vec3,
    /// Velocity. Only the vertical component changes while falling.
    pub velocity: Vec3,
}

/// Impact of a drop on the water.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Impact {
    /// World-space (X, Z) position of the impact.
    pub position: Vec2,
    /// Time of the impact in seconds.
    pub time: f32,
}

/// Drop spawner.
///
/// The spawner owns the set of drops currently falling.
#[derive(Debug, Clone)]
pub struct DropSpawner {
    params: DropParams,
    sources: Vec<Vec3>,
    water_height: f32,
    drops: Vec<Drop>,
    last_spawn: f32,
    last_impact: Option<Impact>,
    rng: StdRng,
}

impl DropSpawner {
    /// Creates a new drop spawner.
    ///
    /// Drops are removed when they reach `water_height`. The `seed` is used
    /// for the random choice of the source of each drop.
    pub fn new(params: DropParams, water_height: f32, seed: u64) -> Result<DropSpawner, ConfigError> {
        params.validate()?;
        let sources = params.sources.iter().map(|&p| Vec3::from_array(p)).collect();
        Ok(DropSpawner {
            params,
            sources,
            water_height,
            drops: Vec::new(),
            last_spawn: 0.0,
            last_impact: None,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Returns the drops that are currently falling.
    pub fn drops(&self) -> &[Drop] {
        &self.drops
    }

    /// Returns the latest impact, if any drop has reached the water.
    pub fn last_impact(&self) -> Option<Impact> {
        self.last_impact
    }

    /// Returns `true` if the latest impact should still be highlighted at
    /// `time`.
    pub fn glow_active(&self, time: f32) -> bool {
        self.last_impact
            .is_some_and(|impact| time - impact.time < self.params.glow_duration)
    }

    /// Returns the intensity of the highlight of the latest impact at `time`.
    ///
    /// The intensity is 1 at the moment of the impact and decreases linearly
    /// to 0 after `glow_duration` seconds.
    pub fn glow_intensity(&self, time: f32) -> f32 {
        match self.last_impact {
            Some(impact) if self.glow_active(time) => {
                (1.0 - (time - impact.time) / self.params.glow_duration).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Spawns new drops and advances the falling drops.
    ///
    /// A new drop is spawned if more than `interval` seconds have passed since
    /// the previous one. All the drops are then advanced by `dt` seconds. Drops
    /// that reach the water are removed and injected into `field`. Returns the
    /// number of impacts.
    pub fn update(&mut self, time: f32, dt: f32, field: &mut RippleField) -> usize {
        if time - self.last_spawn > self.params.interval {
            self.last_spawn = time;
            self.spawn();
        }

        let gravity = self.params.gravity;
        let water_height = self.water_height;
        let strength = self.params.impact_strength;
        let mut impacts = 0;
        let mut last_impact = self.last_impact;
        self.drops.retain_mut(|drop| {
            drop.velocity.y -= gravity * dt;
            drop.position.y += drop.velocity.y * dt;
            if drop.position.y <= water_height {
                field.inject(drop.position, strength);
                last_impact = Some(Impact {
                    position: Vec2::new(drop.position.x, drop.position.z),
                    time,
                });
                impacts += 1;
                false
            } else {
                true
            }
        });
        self.last_impact = last_impact;
        impacts
    }

    fn spawn(&mut self) {
        if self.sources.is_empty() {
            return;
        }
        let position = self.sources[self.rng.gen_range(0..self.sources.len())];
        tracing::trace!(%position, "spawning drop");
        self.drops.push(Drop {
            position,
            velocity: Vec3::new(0.0, -self.params.initial_speed, 0.0),
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ripple::RippleParams;

    const DT: f32 = 0.016;
    const WATER: f32 = -2.48;

    fn field() -> RippleField {
        RippleField::new(65, 7.0, RippleParams::default()).unwrap()
    }

    fn single_source(position: [f32; 3]) -> DropParams {
        DropParams {
            seed: Some(1),
            sources: vec![position],
            ..Default::default()
        }
    }

    #[test]
    fn validation() {
        assert!(DropParams::default().validate().is_ok());
        let params = DropParams {
            impact_strength: 1.5,
            ..Default::default()
        };
        assert!(DropSpawner::new(params, WATER, 0).is_err());
        let params = DropParams {
            interval: 0.0,
            ..Default::default()
        };
        assert!(DropSpawner::new(params, WATER, 0).is_err());
    }

    #[test]
    fn spawns_at_interval() {
        let mut field = field();
        let mut spawner = DropSpawner::new(single_source([1.0, 4.0, 2.0]), WATER, 0).unwrap();
        spawner.update(0.3, DT, &mut field);
        assert!(spawner.drops().is_empty());
        spawner.update(0.6, DT, &mut field);
        assert_eq!(spawner.drops().len(), 1);
        let drop = spawner.drops()[0];
        assert_eq!((drop.position.x, drop.position.z), (1.0, 2.0));
        assert!(drop.position.y < 4.0);
        assert!(drop.velocity.y < -2.0);
        spawner.update(0.7, DT, &mut field);
        assert_eq!(spawner.drops().len(), 1);
        spawner.update(1.2, DT, &mut field);
        assert_eq!(spawner.drops().len(), 2);
    }

    #[test]
    fn drop_hits_water_and_injects() {
        let mut field = field();
        let mut spawner = DropSpawner::new(single_source([1.0, -2.0, 2.0]), WATER, 0).unwrap();
        let mut time = 0.6;
        let mut impacts = spawner.update(time, DT, &mut field);
        assert_eq!(spawner.drops().len(), 1);
        assert!(!spawner.glow_active(time));
        while impacts == 0 {
            time += DT;
            impacts = spawner.update(time, DT, &mut field);
            assert!(time < 1.0, "drop never reached the water");
        }
        assert!(spawner.drops().is_empty());
        let (col, row) = field.world_to_grid(1.0, 2.0).unwrap();
        assert_eq!(field.velocity_at(col, row), 0.8);
        let impact = spawner.last_impact().unwrap();
        assert_eq!(impact.position, Vec2::new(1.0, 2.0));
        assert_eq!(impact.time, time);
        assert!(spawner.glow_active(time + 0.05));
        assert!(!spawner.glow_active(time + 0.2));
        assert_eq!(spawner.glow_intensity(time), 1.0);
        assert!(spawner.glow_intensity(time + 0.05) > 0.0);
        assert!(spawner.glow_intensity(time + 0.05) < 1.0);
        assert_eq!(spawner.glow_intensity(time + 0.2), 0.0);
    }

    #[test]
    fn no_sources() {
        let mut field = field();
        let params = DropParams {
            sources: Vec::new(),
            ..Default::default()
        };
        let mut spawner = DropSpawner::new(params, WATER, 0).unwrap();
        assert_eq!(spawner.update(1.0, DT, &mut field), 0);
        assert!(spawner.drops().is_empty());
    }

    #[test]
    fn same_seed_same_sources() {
        let mut field = field();
        let mut a = DropSpawner::new(DropParams::default(), WATER, 42).unwrap();
        let mut b = DropSpawner::new(DropParams::default(), WATER, 42).unwrap();
        for k in 1..20 {
            let t = k as f32 * 0.6;
            a.update(t, DT, &mut field);
            b.update(t, DT, &mut field);
        }
        assert_eq!(a.drops(), b.drops());
    }
}
