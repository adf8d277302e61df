//! Continuous excitation of the water surface.
//!
//! Besides the discrete impulses of falling drops, the ripple field can be
//! perturbed continuously by an [`ExcitationSource`]. While the source is
//! active, the samples around it receive a [`TravelingWave`] height offset on
//! every step.
//!
//! [`RisingSource`] is an excitation source that rises out of the water and
//! sinks back into it when toggled, and is active while it is raised above its
//! resting height.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Excitation source.
///
/// An excitation source is a world-space point together with a predicate
/// telling whether it currently disturbs the water.
pub trait ExcitationSource {
    /// Returns the world-space position of the source.
    ///
    /// Only its horizontal (X, Z) projection is used by the ripple field.
    fn position(&self) -> Vec3;

    /// Returns `true` if the source currently disturbs the water.
    fn is_active(&self) -> bool;
}

/// Fixed excitation source.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointSource {
    /// Position of the source.
    pub position: Vec3,
    /// Whether the source is active.
    pub active: bool,
}

impl PointSource {
    /// Creates a new point source.
    pub fn new(position: Vec3, active: bool) -> PointSource {
        PointSource { position, active }
    }
}

impl ExcitationSource for PointSource {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Traveling wave.
///
/// Describes the height offset added around an active excitation source:
/// `amplitude * sin(d * frequency - t * speed) * (1 - d / radius)` for samples
/// at a horizontal distance `d < radius` from the source.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct TravelingWave {
    /// Peak height offset per step.
    pub amplitude: f32,
    /// Spatial frequency (radians per world unit).
    pub frequency: f32,
    /// Temporal frequency (radians per second).
    pub speed: f32,
    /// Radius of influence in world units.
    pub radius: f32,
}

impl Default for TravelingWave {
    fn default() -> TravelingWave {
        TravelingWave {
            amplitude: 0.009,
            frequency: 8.0,
            speed: 6.0,
            radius: 2.0,
        }
    }
}

impl TravelingWave {
    /// Returns the height offset at a distance `dist` from the source at time
    /// `elapsed` (in seconds).
    ///
    /// The offset is zero at and beyond the radius.
    pub fn offset(&self, dist: f32, elapsed: f32) -> f32 {
        if dist >= self.radius {
            return 0.0;
        }
        (dist * self.frequency - elapsed * self.speed).sin()
            * self.amplitude
            * (1.0 - dist / self.radius)
    }
}

/// Motion parameters of a [`RisingSource`].
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct LiftParams {
    /// Horizontal (X, Z) position of the source.
    pub base: [f32; 2],
    /// Height of the source when it rests in the water.
    pub rest_height: f32,
    /// Height of the source when fully raised.
    pub raised_height: f32,
    /// Height change per tick while rising or lowering.
    pub lift_step: f32,
    /// Rotation (radians) per tick while raised or rising.
    pub spin_step: f32,
}

impl Default for LiftParams {
    fn default() -> LiftParams {
        LiftParams {
            base: [0.85, -1.26],
            rest_height: -2.0,
            raised_height: -0.8,
            lift_step: 0.008,
            spin_step: 0.02,
        }
    }
}

/// State of a [`RisingSource`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LiftState {
    /// Resting in the water.
    Embedded,
    /// Moving up towards the raised height.
    Rising,
    /// Held at the raised height.
    Raised,
    /// Moving down towards the resting height.
    Lowering,
}

/// Excitation source that can be raised out of the water.
///
/// The source starts [`Embedded`](LiftState::Embedded). A call to
/// [`toggle`](RisingSource::toggle) starts raising or lowering it, and each
/// call to [`update`](RisingSource::update) moves it by one tick. The source is
/// active while its height is above the resting height.
#[derive(Debug, Clone, PartialEq)]
pub struct RisingSource {
    params: LiftParams,
    state: LiftState,
    height: f32,
    rotation: f32,
}

impl RisingSource {
    /// Creates a new source resting in the water.
    pub fn new(params: LiftParams) -> RisingSource {
        RisingSource {
            params,
            state: LiftState::Embedded,
            height: params.rest_height,
            rotation: 0.0,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> LiftState {
        self.state
    }

    /// Returns the current height.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns the current rotation around the vertical axis, in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Returns how far the source is raised, between 0 (resting) and 1 (fully
    /// raised).
    pub fn lift_fraction(&self) -> f32 {
        let span = self.params.raised_height - self.params.rest_height;
        if span == 0.0 {
            return 0.0;
        }
        ((self.height - self.params.rest_height) / span).clamp(0.0, 1.0)
    }

    /// Starts raising or lowering the source.
    ///
    /// An embedded source starts rising and a raised source starts lowering.
    /// Returns `false` and does nothing if the source is moving.
    pub fn toggle(&mut self) -> bool {
        self.state = match self.state {
            LiftState::Embedded => LiftState::Rising,
            LiftState::Raised => LiftState::Lowering,
            LiftState::Rising | LiftState::Lowering => return false,
        };
        tracing::info!(state = ?self.state, "excitation source toggled");
        true
    }

    /// Advances the motion by one tick.
    pub fn update(&mut self) {
        match self.state {
            LiftState::Rising => {
                self.height += self.params.lift_step;
                if self.height >= self.params.raised_height {
                    self.height = self.params.raised_height;
                    self.state = LiftState::Raised;
                }
            }
            LiftState::Lowering => {
                self.height -= self.params.lift_step;
                if self.height <= self.params.rest_height {
                    self.height = self.params.rest_height;
                    self.state = LiftState::Embedded;
                    self.rotation = 0.0;
                }
            }
            LiftState::Embedded | LiftState::Raised => (),
        }
        if matches!(self.state, LiftState::Rising | LiftState::Raised) {
            self.rotation += self.params.spin_step;
        }
    }
}

impl ExcitationSource for RisingSource {
    fn position(&self) -> Vec3 {
        Vec3::new(self.params.base[0], self.height, self.params.base[1])
    }

    fn is_active(&self) -> bool {
        self.height > self.params.rest_height
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wave_vanishes_at_radius() {
        let wave = TravelingWave::default();
        assert_eq!(wave.offset(2.0, 1.3), 0.0);
        assert_eq!(wave.offset(5.0, 1.3), 0.0);
        assert!(wave.offset(0.3, 0.0).abs() <= wave.amplitude);
        // at the center the offset is only time-dependent
        let expected = (-0.5f32 * 6.0).sin() * 0.009;
        assert_eq!(wave.offset(0.0, 0.5), expected);
    }

    #[test]
    fn rise_and_lower() {
        let params = LiftParams::default();
        let mut source = RisingSource::new(params);
        assert_eq!(source.state(), LiftState::Embedded);
        assert!(!source.is_active());
        source.update();
        assert_eq!(source.height(), params.rest_height);

        assert!(source.toggle());
        assert!(!source.toggle());
        source.update();
        assert_eq!(source.state(), LiftState::Rising);
        assert!(source.is_active());
        assert!(source.rotation() > 0.0);

        let ticks = ((params.raised_height - params.rest_height) / params.lift_step).ceil() as usize;
        for _ in 0..ticks + 5 {
            source.update();
        }
        assert_eq!(source.state(), LiftState::Raised);
        assert_eq!(source.height(), params.raised_height);
        assert_eq!(source.lift_fraction(), 1.0);
        let position = source.position();
        assert_eq!((position.x, position.z), (0.85, -1.26));

        assert!(source.toggle());
        for _ in 0..ticks + 5 {
            source.update();
        }
        assert_eq!(source.state(), LiftState::Embedded);
        assert!(!source.is_active());
        assert_eq!(source.rotation(), 0.0);
        assert_eq!(source.lift_fraction(), 0.0);
    }

    #[test]
    fn point_source() {
        let source = PointSource::new(Vec3::new(1.0, 2.0, 3.0), true);
        assert!(source.is_active());
        assert_eq!(source.position(), Vec3::new(1.0, 2.0, 3.0));
    }
}
