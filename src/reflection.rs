//! Planar reflections with ping-pong render targets.
//!
//! The scene seen by a camera mirrored across the water plane is rendered
//! every frame into one of two offscreen targets, while the other one, which
//! holds the reflection completed in the previous frame, is sampled by the
//! water surface. The roles of both targets are swapped once per frame, so
//! that a target is never sampled while it is being rendered to.
//!
//! The protocol is implemented by [`ReflectionCompositor`] independently of the
//! graphics API. Access to the actual render targets goes through the
//! [`OffscreenTargets`] trait.

use crate::camera::{Camera, Projection};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Parameters of the reflections.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct ReflectionParams {
    /// Enables rendering and sampling of reflections.
    pub enabled: bool,
    /// Offset added to the height of the mirrored eye.
    pub mirror_bias: f32,
}

impl Default for ReflectionParams {
    fn default() -> ReflectionParams {
        ReflectionParams {
            enabled: true,
            mirror_bias: 2.6,
        }
    }
}

/// Index of one of the two offscreen targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TargetIndex {
    /// Target 0.
    First,
    /// Target 1.
    Second,
}

impl TargetIndex {
    /// Returns the other target.
    pub fn other(self) -> TargetIndex {
        match self {
            TargetIndex::First => TargetIndex::Second,
            TargetIndex::Second => TargetIndex::First,
        }
    }

    /// Returns the index as a number (0 or 1), for indexing arrays of
    /// targets.
    pub fn as_usize(self) -> usize {
        match self {
            TargetIndex::First => 0,
            TargetIndex::Second => 1,
        }
    }
}

/// Ping-pong state.
///
/// Holds the index of the target that is read (sampled by the water) and of
/// the one that is written (rendered to). Before the first frame both are
/// [`TargetIndex::First`]; the first target rendered is the second one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PingPong {
    read: TargetIndex,
    write: TargetIndex,
}

impl Default for PingPong {
    fn default() -> PingPong {
        PingPong {
            read: TargetIndex::First,
            write: TargetIndex::First,
        }
    }
}

impl PingPong {
    /// Returns the target holding the latest completed reflection.
    pub fn read(&self) -> TargetIndex {
        self.read
    }

    /// Returns the target that was rendered to most recently.
    pub fn write(&self) -> TargetIndex {
        self.write
    }

    /// Selects the target to render the next reflection to.
    ///
    /// This is always the target that is not being read.
    pub fn begin_write(&mut self) -> TargetIndex {
        self.write = self.read.other();
        self.write
    }

    /// Swaps the roles of the targets once the reflection has been rendered.
    ///
    /// The target just written becomes the one that is read.
    pub fn swap(&mut self) {
        self.read = self.write;
    }
}

/// Offscreen render targets.
///
/// This trait abstracts the two offscreen color targets and their shared
/// depth buffer.
pub trait OffscreenTargets {
    /// Error returned by the graphics API.
    type Error;

    /// Binds a target as the render destination and clears its color and
    /// depth.
    fn bind_target(&mut self, index: TargetIndex) -> Result<(), Self::Error>;

    /// Restores the default render destination.
    fn unbind_target(&mut self) -> Result<(), Self::Error>;
}

/// Reflection mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ReflectionMode {
    /// Reflections are rendered and sampled.
    Enabled,
    /// Reflections are neither rendered nor sampled. The water is drawn
    /// without reflection.
    Disabled,
}

/// Reflection compositor.
///
/// The compositor owns the ping-pong state of the reflection targets and the
/// view-projection matrix used for the latest reflection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionCompositor {
    params: ReflectionParams,
    plane_height: f32,
    mode: ReflectionMode,
    state: PingPong,
    view_projection: Mat4,
    // set once a reflection has been completed
    has_reflection: bool,
}

impl ReflectionCompositor {
    /// Creates a new compositor for a mirror plane at `plane_height`.
    pub fn new(params: ReflectionParams, plane_height: f32) -> ReflectionCompositor {
        ReflectionCompositor {
            params,
            plane_height,
            mode: if params.enabled {
                ReflectionMode::Enabled
            } else {
                ReflectionMode::Disabled
            },
            state: PingPong::default(),
            view_projection: Mat4::IDENTITY,
            has_reflection: false,
        }
    }

    /// Returns the reflection mode.
    pub fn mode(&self) -> ReflectionMode {
        self.mode
    }

    /// Switches to [`ReflectionMode::Disabled`].
    pub fn disable(&mut self) {
        if self.mode == ReflectionMode::Enabled {
            tracing::info!("disabling reflections");
        }
        self.mode = ReflectionMode::Disabled;
    }

    /// Returns the ping-pong state.
    pub fn state(&self) -> PingPong {
        self.state
    }

    /// Returns the parameters of the compositor.
    pub fn params(&self) -> &ReflectionParams {
        &self.params
    }

    /// Returns the target that the water surface should sample in the current
    /// frame.
    ///
    /// Returns `None` if reflections are disabled or if no reflection has been
    /// completed yet.
    pub fn sampled_target(&self) -> Option<TargetIndex> {
        match self.mode {
            ReflectionMode::Enabled if self.has_reflection => Some(self.state.read()),
            _ => None,
        }
    }

    /// Returns the view-projection matrix used to render the latest completed
    /// reflection.
    ///
    /// The water shader uses it to project world positions into the
    /// reflection texture.
    pub fn reflection_view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Renders the reflection of the scene.
    ///
    /// This must be called once per frame, after the water surface has been
    /// drawn sampling [`sampled_target`](ReflectionCompositor::sampled_target).
    /// The target that is not sampled is bound and cleared, and `scene` is
    /// called with the projection and mirrored view matrices. The `scene`
    /// callback must not draw the water surface. The default render
    /// destination is restored afterwards, even if `scene` fails, and then the
    /// roles of the targets are swapped.
    ///
    /// Does nothing if reflections are disabled.
    pub fn render_mirrored<T, F>(
        &mut self,
        targets: &mut T,
        camera: &Camera,
        projection: &Projection,
        scene: F,
    ) -> Result<(), T::Error>
    where
        T: OffscreenTargets,
        F: FnOnce(&mut T, &Mat4, &Mat4) -> Result<(), T::Error>,
    {
        if self.mode == ReflectionMode::Disabled {
            return Ok(());
        }
        let view = camera
            .mirrored(self.plane_height, self.params.mirror_bias)
            .view_matrix();
        let projection = projection.matrix();

        let write = self.state.begin_write();
        debug_assert_ne!(write, self.state.read());
        targets.bind_target(write)?;
        let rendered = scene(targets, &projection, &view);
        targets.unbind_target()?;
        rendered?;

        self.view_projection = projection * view;
        self.state.swap();
        self.has_reflection = true;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const WATER: f32 = -2.48;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Bind(TargetIndex),
        Unbind,
        Draw(TargetIndex),
    }

    #[derive(Default)]
    struct MockTargets {
        bound: Option<TargetIndex>,
        events: Vec<Event>,
        fail_bind: bool,
    }

    impl OffscreenTargets for MockTargets {
        type Error = String;

        fn bind_target(&mut self, index: TargetIndex) -> Result<(), String> {
            if self.fail_bind {
                return Err("bind failed".to_string());
            }
            self.bound = Some(index);
            self.events.push(Event::Bind(index));
            Ok(())
        }

        fn unbind_target(&mut self) -> Result<(), String> {
            self.bound = None;
            self.events.push(Event::Unbind);
            Ok(())
        }
    }

    fn draw_scene(targets: &mut MockTargets, _: &Mat4, _: &Mat4) -> Result<(), String> {
        let bound = targets.bound.ok_or("scene drawn without a target")?;
        targets.events.push(Event::Draw(bound));
        Ok(())
    }

    #[test]
    fn initial_state() {
        let compositor = ReflectionCompositor::new(ReflectionParams::default(), WATER);
        assert_eq!(compositor.mode(), ReflectionMode::Enabled);
        assert_eq!(compositor.state(), PingPong::default());
        // nothing to sample before the first reflection is rendered
        assert_eq!(compositor.sampled_target(), None);
        assert_eq!(compositor.reflection_view_projection(), Mat4::IDENTITY);
    }

    #[test]
    fn never_samples_the_target_being_written() {
        let mut compositor = ReflectionCompositor::new(ReflectionParams::default(), WATER);
        let mut targets = MockTargets::default();
        let camera = Camera::default();
        let projection = Projection::default();
        let mut written = Vec::new();
        for _ in 0..10 {
            let sampled = compositor.sampled_target();
            targets.events.clear();
            compositor
                .render_mirrored(&mut targets, &camera, &projection, draw_scene)
                .unwrap();
            let write = match targets.events.as_slice() {
                [Event::Bind(a), Event::Draw(b), Event::Unbind] if a == b => *a,
                events => panic!("unexpected events {events:?}"),
            };
            assert_ne!(Some(write), sampled);
            // the reflection just rendered is sampled in the next frame
            assert_eq!(compositor.sampled_target(), Some(write));
            written.push(write);
        }
        assert_eq!(written[0], TargetIndex::Second);
        assert!(written.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn stores_mirrored_view_projection() {
        let params = ReflectionParams::default();
        let mut compositor = ReflectionCompositor::new(params, WATER);
        let mut targets = MockTargets::default();
        let camera = Camera::default();
        let projection = Projection::default();
        let mut seen = None;
        compositor
            .render_mirrored(&mut targets, &camera, &projection, |_, p, v| {
                seen = Some(*p * *v);
                Ok(())
            })
            .unwrap();
        let expected = projection.matrix()
            * camera
                .mirrored(WATER, params.mirror_bias)
                .view_matrix();
        assert_eq!(seen, Some(expected));
        assert_eq!(compositor.reflection_view_projection(), expected);
    }

    #[test]
    fn scene_error_restores_default_destination() {
        let mut compositor = ReflectionCompositor::new(ReflectionParams::default(), WATER);
        let mut targets = MockTargets::default();
        let result = compositor.render_mirrored(
            &mut targets,
            &Camera::default(),
            &Projection::default(),
            |_, _, _| Err("draw failed".to_string()),
        );
        assert_eq!(result, Err("draw failed".to_string()));
        assert_eq!(targets.bound, None);
        assert_eq!(targets.events.last(), Some(&Event::Unbind));
        // an incomplete reflection is not sampled
        assert_eq!(compositor.sampled_target(), None);

        compositor
            .render_mirrored(
                &mut targets,
                &Camera::default(),
                &Projection::default(),
                draw_scene,
            )
            .unwrap();
        assert_eq!(compositor.sampled_target(), Some(TargetIndex::Second));
        let result = compositor.render_mirrored(
            &mut targets,
            &Camera::default(),
            &Projection::default(),
            |_, _, _| Err("draw failed".to_string()),
        );
        assert!(result.is_err());
        // the previous reflection is kept
        assert_eq!(compositor.sampled_target(), Some(TargetIndex::Second));
        assert_eq!(compositor.state().write(), TargetIndex::First);
    }

    #[test]
    fn bind_error() {
        let mut compositor = ReflectionCompositor::new(ReflectionParams::default(), WATER);
        let mut targets = MockTargets {
            fail_bind: true,
            ..Default::default()
        };
        assert!(compositor
            .render_mirrored(
                &mut targets,
                &Camera::default(),
                &Projection::default(),
                draw_scene
            )
            .is_err());
        assert!(targets.events.is_empty());
        assert_eq!(compositor.sampled_target(), None);
    }

    #[test]
    fn disabled_mode() {
        let params = ReflectionParams {
            enabled: false,
            ..Default::default()
        };
        let mut compositor = ReflectionCompositor::new(params, WATER);
        assert_eq!(compositor.sampled_target(), None);
        let mut targets = MockTargets::default();
        compositor
            .render_mirrored(
                &mut targets,
                &Camera::default(),
                &Projection::default(),
                draw_scene,
            )
            .unwrap();
        assert!(targets.events.is_empty());

        let mut compositor = ReflectionCompositor::new(ReflectionParams::default(), WATER);
        compositor.disable();
        assert_eq!(compositor.mode(), ReflectionMode::Disabled);
        assert_eq!(compositor.sampled_target(), None);
    }
}
