//! Per-frame water simulation.
//!
//! [`Simulation`] groups the ripple field with the objects that disturb it and
//! advances all of them once per frame, in a fixed order:
//!
//! 1. the excitation source moves one tick;
//! 2. drops are spawned and advanced, and those reaching the water inject
//!    impulses into the ripple field;
//! 3. the ripple field is stepped, with the traveling-wave forcing of the
//!    excitation source while it is active;
//! 4. the normals and the distortion map are recomputed.
//!
//! The simulation always advances by the fixed timestep in the
//! [`RippleParams`](crate::ripple::RippleParams), regardless of the frame rate.

use crate::config::WaterConfig;
use crate::drops::DropSpawner;
use crate::error::ConfigError;
use crate::excitation::{RisingSource, TravelingWave};
use crate::ripple::{Forcing, RippleField};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Water simulation.
#[derive(Debug, Clone)]
pub struct Simulation {
    field: RippleField,
    drops: DropSpawner,
    source: RisingSource,
    wave: TravelingWave,
    timestep: f32,
    time: f32,
    distortion_map: Box<[u8]>,
}

impl Simulation {
    /// Creates a new simulation.
    ///
    /// The `seed` determines the initial noise of the water surface and the
    /// sequence of drop sources.
    pub fn new(config: &WaterConfig, seed: u64) -> Result<Simulation, ConfigError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut field = RippleField::new(config.grid_size(), config.world_radius, config.ripple)?;
        field.seed_noise(&mut rng);
        field.compute_normals();
        let drops = DropSpawner::new(config.drops.clone(), config.water_height, rng.gen())?;
        let num_samples = field.heights().len();
        let mut simulation = Simulation {
            field,
            drops,
            source: RisingSource::new(config.excitation.lift),
            wave: config.excitation.wave,
            timestep: config.ripple.timestep,
            time: 0.0,
            distortion_map: vec![0; 4 * num_samples].into_boxed_slice(),
        };
        simulation
            .field
            .write_distortion_map(&mut simulation.distortion_map);
        Ok(simulation)
    }

    /// Advances the simulation by one tick.
    ///
    /// The `time` is the elapsed time in seconds since the start of the
    /// simulation. It drives the spawning of drops and the phase of the
    /// traveling wave. Returns the number of drops that reached the water
    /// during this tick.
    pub fn tick(&mut self, time: f32) -> usize {
        self.time = time;
        self.source.update();
        let impacts = self.drops.update(time, self.timestep, &mut self.field);
        let forcing = Forcing {
            source: &self.source,
            wave: &self.wave,
            elapsed: time,
        };
        self.field.step(self.timestep, Some(forcing));
        self.field.compute_normals();
        self.field.write_distortion_map(&mut self.distortion_map);
        impacts
    }

    /// Returns the time of the latest tick, in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns the ripple field.
    pub fn field(&self) -> &RippleField {
        &self.field
    }

    /// Returns the drop spawner.
    pub fn drops(&self) -> &DropSpawner {
        &self.drops
    }

    /// Returns the excitation source.
    pub fn source(&self) -> &RisingSource {
        &self.source
    }

    /// Starts raising or lowering the excitation source.
    ///
    /// See [`RisingSource::toggle`].
    pub fn toggle_excitation(&mut self) -> bool {
        self.source.toggle()
    }

    /// Returns the RGBA8 distortion map of the latest tick.
    ///
    /// See [`RippleField::write_distortion_map`].
    pub fn distortion_map(&self) -> &[u8] {
        &self.distortion_map
    }

    /// Writes the positions of the falling drops as consecutive XYZ triples.
    ///
    /// At most `max_drops` drops are written. Returns the number of drops
    /// written.
    pub fn write_drop_positions(&self, positions: &mut Vec<f32>, max_drops: usize) -> usize {
        positions.clear();
        let drops = &self.drops.drops()[..self.drops.drops().len().min(max_drops)];
        positions.extend(drops.iter().flat_map(|drop| drop.position.to_array()));
        drops.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drops::DropParams;
    use crate::excitation::{ExcitationSource, LiftState};

    fn quiet_config() -> WaterConfig {
        WaterConfig {
            drops: DropParams {
                sources: Vec::new(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn run(simulation: &mut Simulation, ticks: usize) -> usize {
        let mut impacts = 0;
        for _ in 0..ticks {
            let time = simulation.time() + simulation.timestep;
            impacts += simulation.tick(time);
        }
        impacts
    }

    #[test]
    fn starts_almost_flat() {
        let simulation = Simulation::new(&WaterConfig::default(), 7).unwrap();
        let field = simulation.field();
        assert_eq!(field.grid_size(), 65);
        assert!(field.total_abs_height() > 0.0);
        assert!(field.heights().iter().all(|h| h.abs() <= 5e-5));
        assert_eq!(simulation.distortion_map().len(), 4 * 65 * 65);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = WaterConfig {
            world_radius: 0.0,
            ..Default::default()
        };
        assert_eq!(
            Simulation::new(&config, 0).unwrap_err(),
            ConfigError::WorldRadius(0.0)
        );
    }

    fn max_abs_height(field: &RippleField) -> f32 {
        field.heights().iter().fold(0.0, |max, h| max.max(h.abs()))
    }

    // Mean absolute height of the samples whose distance to (x, z) is in the
    // given range.
    fn mean_abs_height(field: &RippleField, x: f32, z: f32, dist: std::ops::Range<f32>) -> f32 {
        let n = field.grid_size();
        let center = glam::Vec2::new(x, z);
        let (sum, count) = (0..n)
            .flat_map(|row| (0..n).map(move |col| (col, row)))
            .filter(|&(col, row)| dist.contains(&field.grid_to_world(col, row).distance(center)))
            .fold((0.0, 0), |(sum, count), (col, row)| {
                (sum + field.height_at(col, row).abs(), count + 1)
            });
        assert!(count > 0);
        sum / count as f32
    }

    #[test]
    fn drops_disturb_the_water() {
        let mut simulation = Simulation::new(&WaterConfig::default(), 3).unwrap();
        assert!(max_abs_height(simulation.field()) <= 5e-5);
        let mut impacts = 0;
        while impacts == 0 {
            impacts = run(&mut simulation, 1);
            assert!(simulation.time() < 5.0, "no drop reached the water");
        }
        let impact = simulation.drops().last_impact().unwrap();
        assert_eq!(impact.time, simulation.time());
        assert!(max_abs_height(simulation.field()) > 1e-3);
        run(&mut simulation, 200);
        let limit = simulation.field().params().amplitude_limit;
        assert!(simulation
            .field()
            .heights()
            .iter()
            .all(|h| h.is_finite() && h.abs() <= limit));
    }

    #[test]
    fn excitation_drives_the_water_near_the_source() {
        let (x, z) = (0.85, -1.26);
        let mut simulation = Simulation::new(&quiet_config(), 5).unwrap();
        run(&mut simulation, 20);
        let quiet = mean_abs_height(simulation.field(), x, z, 0.0..2.0);

        assert!(simulation.toggle_excitation());
        run(&mut simulation, 30);
        assert_eq!(simulation.source().state(), LiftState::Rising);
        assert!(simulation.source().is_active());
        let near = mean_abs_height(simulation.field(), x, z, 0.0..2.0);
        let far = mean_abs_height(simulation.field(), x, z, 5.0..100.0);
        assert!(near > 10.0 * quiet);
        assert!(near > 10.0 * far);
    }

    #[test]
    fn normals_follow_the_heights() {
        let mut simulation = Simulation::new(&WaterConfig::default(), 11).unwrap();
        run(&mut simulation, 250);
        let field = simulation.field();
        let mut expected = field.clone();
        expected.compute_normals();
        assert_eq!(field.normals(), expected.normals());
        let mut map = vec![0; simulation.distortion_map().len()];
        field.write_distortion_map(&mut map);
        assert_eq!(simulation.distortion_map(), &map[..]);
    }

    #[test]
    fn drop_positions() {
        let mut simulation = Simulation::new(&WaterConfig::default(), 13).unwrap();
        let mut positions = vec![1.0; 5];
        assert_eq!(simulation.write_drop_positions(&mut positions, 8), 0);
        assert!(positions.is_empty());
        simulation.tick(0.6);
        simulation.tick(1.2);
        assert_eq!(simulation.write_drop_positions(&mut positions, 8), 2);
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[..3], simulation.drops().drops()[0].position.to_array());
        assert_eq!(simulation.write_drop_positions(&mut positions, 1), 1);
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn same_seed_same_simulation() {
        let mut a = Simulation::new(&WaterConfig::default(), 99).unwrap();
        let mut b = Simulation::new(&WaterConfig::default(), 99).unwrap();
        run(&mut a, 100);
        run(&mut b, 100);
        assert_eq!(a.field(), b.field());
    }
}
