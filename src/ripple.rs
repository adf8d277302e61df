//! Ripple field simulation.
//!
//! This module contains [`RippleField`], a damped 2D wave equation solved on
//! the vertices of the square water grid. The field is advanced once per frame
//! with [`RippleField::step`], receives impulses from falling drops through
//! [`RippleField::inject`], and derives per-vertex surface normals with
//! [`RippleField::compute_normals`].
//!
//! The grid is stored row-major. Rows run along the world Z axis and columns
//! along the world X axis, so that sample `(col, row)` sits at world position
//! `(-R + col * spacing, -R + row * spacing)`, where `R` is the world radius of
//! the water plane.

use crate::error::{self, ConfigError};
use crate::excitation::{ExcitationSource, TravelingWave};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Physical and numerical parameters of the ripple field.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct RippleParams {
    /// Wave stiffness (multiplies the discrete Laplacian).
    pub stiffness: f32,
    /// Velocity damping factor.
    pub damping: f32,
    /// Symmetric bound applied to heights and velocities after each step.
    pub amplitude_limit: f32,
    /// Timestep in seconds used by the per-frame driver.
    ///
    /// The driver always uses this fixed value regardless of the actual frame
    /// time.
    pub timestep: f32,
    /// Sharpening factor applied to the height gradient when computing
    /// normals.
    pub normal_sharpening: f32,
    /// Radius in grid cells of the neighbourhood affected by an impulse.
    pub injection_radius: usize,
    /// Width in grid cells of the Gaussian falloff of an impulse.
    pub injection_width: f32,
}

impl Default for RippleParams {
    fn default() -> RippleParams {
        RippleParams {
            stiffness: 300.0,
            damping: 3.0,
            amplitude_limit: 0.3,
            timestep: 0.016,
            normal_sharpening: 5.0,
            injection_radius: 2,
            injection_width: 0.6,
        }
    }
}

impl RippleParams {
    /// Checks that all the parameters are in their valid ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        error::non_negative("ripple.stiffness", self.stiffness)?;
        error::non_negative("ripple.damping", self.damping)?;
        error::positive("ripple.amplitude_limit", self.amplitude_limit)?;
        error::positive("ripple.timestep", self.timestep)?;
        error::non_negative("ripple.normal_sharpening", self.normal_sharpening)?;
        error::positive("ripple.injection_width", self.injection_width)?;
        Ok(())
    }
}

/// Continuous forcing applied during a step.
///
/// While `source` is active, the samples around its projected position
/// receive a traveling-wave height offset that depends on the `elapsed` time
/// in seconds.
#[derive(Copy, Clone)]
pub struct Forcing<'a> {
    /// Excitation source.
    pub source: &'a dyn ExcitationSource,
    /// Shape of the traveling wave.
    pub wave: &'a TravelingWave,
    /// Elapsed time in seconds.
    pub elapsed: f32,
}

/// Ripple field.
///
/// The ripple field owns the height, velocity and normal arrays of an N×N
/// grid. The arrays are exposed read-only so that they can be uploaded to the
/// GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct RippleField {
    grid_size: usize,
    world_radius: f32,
    spacing: f32,
    params: RippleParams,
    heights: Box<[f32]>,
    velocities: Box<[f32]>,
    // Velocities of the step being computed. The wave pass reads only the
    // pre-step heights and writes only here.
    next_velocities: Box<[f32]>,
    normals: Box<[[f32; 3]]>,
}

impl RippleField {
    /// Creates a new ripple field at rest.
    ///
    /// The grid has `grid_size` × `grid_size` samples covering the square
    /// `[-world_radius, world_radius]` in world X and Z. Grids smaller than
    /// 2×2, non-positive radii and out-of-range parameters are rejected.
    pub fn new(
        grid_size: usize,
        world_radius: f32,
        params: RippleParams,
    ) -> Result<RippleField, ConfigError> {
        if grid_size < 2 {
            return Err(ConfigError::GridSize(grid_size));
        }
        if !(world_radius.is_finite() && world_radius > 0.0) {
            return Err(ConfigError::WorldRadius(world_radius));
        }
        params.validate()?;
        let num_samples = grid_size * grid_size;
        let spacing = 2.0 * world_radius / (grid_size - 1) as f32;
        tracing::debug!(grid_size, world_radius, spacing, "creating ripple field");
        Ok(RippleField {
            grid_size,
            world_radius,
            spacing,
            params,
            heights: vec![0.0; num_samples].into_boxed_slice(),
            velocities: vec![0.0; num_samples].into_boxed_slice(),
            next_velocities: vec![0.0; num_samples].into_boxed_slice(),
            normals: vec![[0.0, 1.0, 0.0]; num_samples].into_boxed_slice(),
        })
    }

    /// Returns the number of samples per side of the grid.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Returns the world radius of the water plane.
    pub fn world_radius(&self) -> f32 {
        self.world_radius
    }

    /// Returns the world-space distance between adjacent samples.
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Returns the parameters of the field.
    pub fn params(&self) -> &RippleParams {
        &self.params
    }

    /// Returns the heights, row-major.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Returns the velocities, row-major.
    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    /// Returns the normals computed by the last call to
    /// [`compute_normals`](RippleField::compute_normals).
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Returns the normals as a flat array of `3 * N * N` floats.
    pub fn normals_flat(&self) -> &[f32] {
        self.normals.as_flattened()
    }

    fn index(&self, col: usize, row: usize) -> usize {
        row * self.grid_size + col
    }

    /// Returns the height of the sample at `(col, row)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid.
    pub fn height_at(&self, col: usize, row: usize) -> f32 {
        self.heights[self.index(col, row)]
    }

    /// Returns the velocity of the sample at `(col, row)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid.
    pub fn velocity_at(&self, col: usize, row: usize) -> f32 {
        self.velocities[self.index(col, row)]
    }

    /// Sets the height of the sample at `(col, row)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid.
    pub fn set_height(&mut self, col: usize, row: usize, height: f32) {
        let i = self.index(col, row);
        self.heights[i] = height;
    }

    /// Sets the velocity of the sample at `(col, row)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid.
    pub fn set_velocity(&mut self, col: usize, row: usize, velocity: f32) {
        let i = self.index(col, row);
        self.velocities[i] = velocity;
    }

    /// Returns the world-space (x, z) position of the sample at `(col, row)`.
    pub fn grid_to_world(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            col as f32 * self.spacing - self.world_radius,
            row as f32 * self.spacing - self.world_radius,
        )
    }

    /// Returns the sample nearest to a world-space (x, z) position.
    ///
    /// Returns `None` if the nearest grid coordinates fall outside the grid.
    pub fn world_to_grid(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        let max = (self.grid_size - 1) as f32;
        let col = ((x + self.world_radius) / self.spacing).round();
        let row = ((z + self.world_radius) / self.spacing).round();
        // NaN fails both comparisons
        if (0.0..=max).contains(&col) && (0.0..=max).contains(&row) {
            Some((col as usize, row as usize))
        } else {
            None
        }
    }

    /// Sum of the absolute values of all the heights.
    pub fn total_abs_height(&self) -> f32 {
        self.heights.iter().map(|h| h.abs()).sum()
    }

    /// Adds a small amount of noise to the heights.
    ///
    /// Each height is perturbed by a uniform value in `[-5e-5, 5e-5]`, so
    /// that the surface does not start perfectly flat.
    pub fn seed_noise<R: rand::Rng>(&mut self, rng: &mut R) {
        const NOISE: f32 = 1e-4;
        for h in self.heights.iter_mut() {
            *h += (rng.gen::<f32>() - 0.5) * NOISE;
        }
    }

    /// Injects a velocity impulse at a world-space position.
    ///
    /// The vertical component of `world_position` is ignored. The impulse
    /// reaches the samples within `injection_radius` cells of the nearest
    /// sample, weighted by a Gaussian of the grid distance, so that the
    /// nearest sample receives exactly `strength`. The `strength` is clamped
    /// to `[0, 1]`.
    ///
    /// Positions whose nearest sample lies outside the grid are ignored.
    pub fn inject(&mut self, world_position: Vec3, strength: f32) {
        if !strength.is_finite() {
            return;
        }
        let strength = strength.clamp(0.0, 1.0);
        let Some((center_col, center_row)) = self.world_to_grid(world_position.x, world_position.z)
        else {
            tracing::trace!(%world_position, "ignoring impulse outside the ripple grid");
            return;
        };
        let radius = self.params.injection_radius as isize;
        let width = self.params.injection_width;
        let n = self.grid_size as isize;
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let col = center_col as isize + dx;
                let row = center_row as isize + dz;
                if !(0..n).contains(&col) || !(0..n).contains(&row) {
                    continue;
                }
                let dist = ((dx * dx + dz * dz) as f32).sqrt();
                if dist > radius as f32 {
                    continue;
                }
                let envelope = (-4.0 * (dist / width) * (dist / width)).exp();
                let i = self.index(col as usize, row as usize);
                self.velocities[i] += strength * envelope;
            }
        }
    }

    /// Advances the field by `dt` seconds.
    ///
    /// If a `forcing` is given and its source is active, its traveling wave is
    /// added to the heights first. Then the velocities of the interior samples
    /// are updated from the discrete Laplacian of the pre-step heights, all
    /// heights are integrated with the new velocities, and both heights and
    /// velocities are clamped to the amplitude limit.
    ///
    /// Border samples receive no Laplacian term and their velocity is reset
    /// to zero, so a velocity given to them by
    /// [`inject`](RippleField::inject) is discarded by the next step.
    ///
    /// A `dt` that is negative or not finite leaves the field unchanged.
    pub fn step(&mut self, dt: f32, forcing: Option<Forcing<'_>>) {
        if !(dt.is_finite() && dt >= 0.0) {
            tracing::warn!(dt, "rejecting ripple step with invalid timestep");
            return;
        }
        if let Some(forcing) = forcing {
            self.apply_forcing(&forcing);
        }
        self.wave_pass(dt);
        self.integrate(dt);
    }

    fn apply_forcing(&mut self, forcing: &Forcing<'_>) {
        if !forcing.source.is_active() {
            return;
        }
        let position = forcing.source.position();
        let center = Vec2::new(position.x, position.z);
        let wave = forcing.wave;
        for row in 0..self.grid_size {
            for col in 0..self.grid_size {
                let dist = self.grid_to_world(col, row).distance(center);
                if dist < wave.radius {
                    let i = self.index(col, row);
                    self.heights[i] += wave.offset(dist, forcing.elapsed);
                }
            }
        }
    }

    fn wave_pass(&mut self, dt: f32) {
        let n = self.grid_size;
        let k = self.params.stiffness;
        let c = self.params.damping;
        let heights = &self.heights;
        let velocities = &self.velocities;
        for (i, next) in self.next_velocities.iter_mut().enumerate() {
            let (row, col) = (i / n, i % n);
            *next = if row == 0 || col == 0 || row == n - 1 || col == n - 1 {
                0.0
            } else {
                let laplacian = heights[i - 1] + heights[i + 1] + heights[i - n] + heights[i + n]
                    - 4.0 * heights[i];
                velocities[i] + (k * laplacian - c * velocities[i]) * dt
            };
        }
    }

    fn integrate(&mut self, dt: f32) {
        let limit = self.params.amplitude_limit;
        std::mem::swap(&mut self.velocities, &mut self.next_velocities);
        for (h, v) in self.heights.iter_mut().zip(self.velocities.iter_mut()) {
            *h = (*h + *v * dt).clamp(-limit, limit);
            *v = v.clamp(-limit, limit);
        }
    }

    /// Recomputes the normals from the current heights.
    ///
    /// The gradient is estimated with central differences, reusing the sample
    /// itself as the missing neighbour at the borders, and is scaled by
    /// `normal_sharpening`. Degenerate normals default to `(0, 1, 0)`.
    pub fn compute_normals(&mut self) {
        let n = self.grid_size;
        let scale = self.params.normal_sharpening / (2.0 * self.spacing);
        for row in 0..n {
            for col in 0..n {
                let left = self.height_at(col.saturating_sub(1), row);
                let right = self.height_at((col + 1).min(n - 1), row);
                let down = self.height_at(col, row.saturating_sub(1));
                let up = self.height_at(col, (row + 1).min(n - 1));
                let dhdx = (right - left) * scale;
                let dhdz = (up - down) * scale;
                let normal = Vec3::new(-dhdx, 1.0, -dhdz)
                    .try_normalize()
                    .unwrap_or(Vec3::Y);
                let i = self.index(col, row);
                self.normals[i] = normal.to_array();
            }
        }
    }

    /// Encodes the horizontal components of the normals as an RGBA8 image.
    ///
    /// The X and Z components are mapped from `[-1, 1]` to `[0, 255]` in the
    /// red and green channels. Blue is 128 and alpha is 255. The `image` must
    /// have a length of `4 * N * N`.
    ///
    /// # Panics
    ///
    /// Panics if `image` has the wrong length.
    pub fn write_distortion_map(&self, image: &mut [u8]) {
        assert_eq!(image.len(), 4 * self.normals.len());
        for (pixel, normal) in image.chunks_exact_mut(4).zip(self.normals.iter()) {
            pixel[0] = ((normal[0] * 0.5 + 0.5) * 255.0) as u8;
            pixel[1] = ((normal[2] * 0.5 + 0.5) * 255.0) as u8;
            pixel[2] = 128;
            pixel[3] = 255;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::excitation::PointSource;
    use float_cmp::approx_eq;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    const DT: f32 = 0.016;

    fn cave_field() -> RippleField {
        RippleField::new(65, 7.0, RippleParams::default()).unwrap()
    }

    fn assert_bounded(field: &RippleField) {
        let limit = field.params().amplitude_limit;
        for (&h, &v) in field.heights().iter().zip(field.velocities()) {
            assert!(h.is_finite() && v.is_finite());
            assert!((-limit..=limit).contains(&h), "height {h} out of range");
            assert!((-limit..=limit).contains(&v), "velocity {v} out of range");
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        let params = RippleParams::default();
        assert_eq!(
            RippleField::new(1, 7.0, params),
            Err(ConfigError::GridSize(1))
        );
        assert_eq!(
            RippleField::new(0, 7.0, params),
            Err(ConfigError::GridSize(0))
        );
        assert_eq!(
            RippleField::new(5, 0.0, params),
            Err(ConfigError::WorldRadius(0.0))
        );
        assert!(RippleField::new(5, -1.0, params).is_err());
        assert!(RippleField::new(5, f32::NAN, params).is_err());
        let bad = RippleParams {
            damping: -1.0,
            ..params
        };
        assert!(matches!(
            RippleField::new(5, 7.0, bad),
            Err(ConfigError::Parameter {
                name: "ripple.damping",
                ..
            })
        ));
    }

    #[test]
    fn spacing() {
        let field = cave_field();
        assert!(approx_eq!(f32, field.spacing(), 14.0 / 64.0, ulps = 2));
        assert_eq!(field.heights().len(), 65 * 65);
        assert_eq!(field.normals_flat().len(), 3 * 65 * 65);
    }

    #[test]
    fn world_grid_conversion() {
        let field = cave_field();
        assert_eq!(field.world_to_grid(-7.0, -7.0), Some((0, 0)));
        assert_eq!(field.world_to_grid(7.0, 7.0), Some((64, 64)));
        assert_eq!(field.world_to_grid(0.0, 0.0), Some((32, 32)));
        assert_eq!(field.world_to_grid(7.2, 0.0), None);
        assert_eq!(field.world_to_grid(0.0, f32::NAN), None);
        let p = field.grid_to_world(10, 20);
        assert_eq!(field.world_to_grid(p.x, p.y), Some((10, 20)));
    }

    #[test]
    fn step_from_central_bump() {
        let params = RippleParams {
            stiffness: 300.0,
            damping: 3.0,
            ..Default::default()
        };
        // spacing = 2 * 2 / 4 = 1
        let mut field = RippleField::new(5, 2.0, params).unwrap();
        assert_eq!(field.spacing(), 1.0);
        field.set_height(2, 2, 0.1);
        field.step(DT, None);
        assert!(field.height_at(2, 2) < 0.1);
        for (col, row) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            assert!(field.velocity_at(col, row) > 0.0);
        }
        for (col, row) in [(0, 0), (4, 0), (0, 4), (4, 4), (1, 1), (3, 3)] {
            assert_eq!(field.height_at(col, row), 0.0);
            assert_eq!(field.velocity_at(col, row), 0.0);
        }
        assert_bounded(&field);
    }

    #[test]
    fn wave_pass_reads_only_previous_heights() {
        // Two bumps that would interact differently under an in-place update
        // must give a mirror-symmetric result.
        let mut field = RippleField::new(9, 4.0, RippleParams::default()).unwrap();
        field.set_height(3, 4, 0.05);
        field.set_height(5, 4, 0.05);
        field.step(DT, None);
        for row in 0..9 {
            for col in 0..9 {
                assert_eq!(field.velocity_at(col, row), field.velocity_at(8 - col, row));
                assert_eq!(field.velocity_at(col, row), field.velocity_at(col, 8 - row));
            }
        }
    }

    #[test]
    fn step_is_deterministic() {
        let mut field = cave_field();
        let mut rng = StdRng::seed_from_u64(7);
        field.seed_noise(&mut rng);
        field.inject(Vec3::new(1.0, 0.0, -2.0), 0.8);
        field.step(DT, None);
        let mut a = field.clone();
        let mut b = field.clone();
        for _ in 0..50 {
            a.step(DT, None);
            b.step(DT, None);
        }
        assert_eq!(a.heights(), b.heights());
        assert_eq!(a.velocities(), b.velocities());
    }

    #[test]
    fn damping_dissipates_energy() {
        let mut field = RippleField::new(9, 4.0, RippleParams::default()).unwrap();
        for row in 1..8 {
            for col in 1..8 {
                field.set_height(col, row, 0.05 * ((col * 7 + row * 3) % 5) as f32 - 0.1);
            }
        }
        let initial = field.total_abs_height();
        let window = 50;
        let mut previous_mean = f32::INFINITY;
        for _ in 0..10 {
            let mut sum = 0.0;
            for _ in 0..window {
                field.step(DT, None);
                assert_bounded(&field);
                sum += field.total_abs_height();
            }
            let mean = sum / window as f32;
            assert!(mean < previous_mean, "{mean} >= {previous_mean}");
            previous_mean = mean;
        }
        assert!(previous_mean < 0.01 * initial);
    }

    #[test]
    fn injection_center_and_cutoff() {
        let mut field = cave_field();
        let center = field.grid_to_world(30, 12);
        field.inject(Vec3::new(center.x, -2.48, center.y), 0.7);
        assert_eq!(field.velocity_at(30, 12), 0.7);
        // falloff at the cutoff radius is negligible but nonzero
        let edge = field.velocity_at(32, 12);
        assert!(edge > 0.0 && edge < 1e-6);
        for row in 0..65 {
            for col in 0..65 {
                let dx = col as f32 - 30.0;
                let dz = row as f32 - 12.0;
                if (dx * dx + dz * dz).sqrt() > 2.0 {
                    assert_eq!(field.velocity_at(col, row), 0.0);
                }
            }
        }
    }

    #[test]
    fn injection_near_border_is_clipped() {
        let mut field = cave_field();
        field.inject(Vec3::new(-7.0, 0.0, -7.0), 1.0);
        assert_eq!(field.velocity_at(0, 0), 1.0);
        assert!(field.velocity_at(1, 1) > 0.0);
    }

    #[test]
    fn corner_injection_settles() {
        let mut field = cave_field();
        field.inject(Vec3::new(-7.0, 0.0, -7.0), 0.8);
        for _ in 0..5000 {
            field.step(DT, None);
        }
        assert_eq!(field.velocity_at(0, 0), 0.0);
        assert_eq!(field.height_at(0, 0), 0.0);
        assert!(field.total_abs_height() < 1e-3);
        assert_bounded(&field);
    }

    #[test]
    fn injection_out_of_bounds() {
        let mut field = cave_field();
        let before = field.clone();
        field.inject(Vec3::new(1000.0, 0.0, 1000.0), 1.0);
        field.inject(Vec3::new(-7.5, 0.0, 0.0), 1.0);
        field.inject(Vec3::new(0.0, 0.0, f32::INFINITY), 1.0);
        assert_eq!(field, before);
    }

    #[test]
    fn injection_strength_is_clamped() {
        let mut field = cave_field();
        field.inject(Vec3::ZERO, 5.0);
        assert_eq!(field.velocity_at(32, 32), 1.0);
        field.inject(Vec3::ZERO, f32::NAN);
        assert_eq!(field.velocity_at(32, 32), 1.0);
    }

    #[test]
    fn invalid_timestep_is_ignored() {
        let mut field = cave_field();
        field.inject(Vec3::ZERO, 1.0);
        let before = field.clone();
        field.step(f32::NAN, None);
        field.step(-0.016, None);
        assert_eq!(field, before);
    }

    #[test]
    fn forcing_only_near_active_source() {
        let wave = TravelingWave::default();
        let mut field = cave_field();
        let inactive = PointSource::new(Vec3::new(0.85, -2.0, -1.26), false);
        field.step(
            DT,
            Some(Forcing {
                source: &inactive,
                wave: &wave,
                elapsed: 0.3,
            }),
        );
        assert_eq!(field.total_abs_height(), 0.0);

        let active = PointSource::new(Vec3::new(0.85, -1.5, -1.26), true);
        field.step(
            DT,
            Some(Forcing {
                source: &active,
                wave: &wave,
                elapsed: 0.3,
            }),
        );
        assert!(field.total_abs_height() > 0.0);
        // far away samples are untouched by the forcing term and the single
        // wave pass
        for row in 0..65 {
            for col in 0..65 {
                let p = field.grid_to_world(col, row);
                if p.distance(Vec2::new(0.85, -1.26)) > wave.radius + 2.0 * field.spacing() {
                    assert_eq!(field.height_at(col, row), 0.0);
                }
            }
        }
        assert_bounded(&field);
    }

    #[test]
    fn flat_normals_point_up() {
        let mut field = cave_field();
        field.compute_normals();
        assert!(field.normals().iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn normals_are_unit_and_tilt_downhill() {
        let mut field = cave_field();
        field.inject(Vec3::new(2.0, 0.0, 1.0), 1.0);
        for _ in 0..20 {
            field.step(DT, None);
        }
        field.compute_normals();
        for n in field.normals() {
            let len = Vec3::from_array(*n).length();
            assert!(approx_eq!(f32, len, 1.0, epsilon = 1e-5));
        }

        let mut slope = RippleField::new(3, 1.0, RippleParams::default()).unwrap();
        for row in 0..3 {
            slope.set_height(2, row, 0.1);
        }
        slope.compute_normals();
        let n = slope.normals()[slope.index(1, 1)];
        assert!(n[0] < 0.0);
        assert_eq!(n[2], 0.0);
        // border sample uses itself as its missing neighbour
        let edge = slope.normals()[slope.index(2, 1)];
        assert!(edge[0] < 0.0);
    }

    #[test]
    fn distortion_map_encoding() {
        let mut field = RippleField::new(2, 1.0, RippleParams::default()).unwrap();
        field.compute_normals();
        let mut image = vec![0; 16];
        field.write_distortion_map(&mut image);
        for pixel in image.chunks_exact(4) {
            assert_eq!(pixel, [127, 127, 128, 255]);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn amplitude_stays_bounded(
            impulses in prop::collection::vec((-7.0f32..7.0, -7.0f32..7.0, 0.0f32..=1.0), 1..8),
            steps in 1usize..40,
        ) {
            let mut field = cave_field();
            for (x, z, strength) in impulses {
                field.inject(Vec3::new(x, 0.0, z), strength);
            }
            let source = PointSource::new(Vec3::new(0.85, -1.0, -1.26), true);
            let wave = TravelingWave::default();
            for k in 0..steps {
                let forcing = Forcing { source: &source, wave: &wave, elapsed: k as f32 * DT };
                field.step(DT, Some(forcing));
                assert_bounded(&field);
            }
        }

        #[test]
        fn injection_is_local(x in -6.5f32..6.5, z in -6.5f32..6.5, strength in 0.01f32..=1.0) {
            let mut field = cave_field();
            field.inject(Vec3::new(x, 0.0, z), strength);
            let (col, row) = field.world_to_grid(x, z).unwrap();
            prop_assert_eq!(field.velocity_at(col, row), strength);
            for r in 0..65usize {
                for c in 0..65usize {
                    let dc = c as f32 - col as f32;
                    let dr = r as f32 - row as f32;
                    if (dc * dc + dr * dr).sqrt() > 2.0 {
                        prop_assert_eq!(field.velocity_at(c, r), 0.0);
                    }
                }
            }
        }
    }
}
