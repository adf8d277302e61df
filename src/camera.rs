//! Camera and projection.
//!
//! The camera is described by an eye position and yaw/pitch angles. This
//! module also computes the camera mirrored across the water plane, which is
//! used to render reflections.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// First-person camera.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub position: Vec3,
    /// Yaw angle in radians, measured from the +X axis towards +Z.
    pub yaw: f32,
    /// Pitch angle in radians. Positive values look up.
    pub pitch: f32,
}

impl Default for Camera {
    fn default() -> Camera {
        Camera {
            position: Vec3::new(0.0, 0.0, 5.0),
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
        }
    }
}

impl Camera {
    /// Returns the unit vector the camera is looking along.
    pub fn front(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        )
    }

    /// Returns the view matrix of the camera.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
    }

    /// Returns the camera mirrored across the horizontal plane at
    /// `plane_height`.
    ///
    /// The eye height is reflected across the plane and raised by `bias`, and
    /// the vertical component of the viewing direction is negated.
    pub fn mirrored(&self, plane_height: f32, bias: f32) -> MirroredCamera {
        let eye = Vec3::new(
            self.position.x,
            2.0 * plane_height - self.position.y + bias,
            self.position.z,
        );
        let front = self.front();
        MirroredCamera {
            eye,
            front: Vec3::new(front.x, -front.y, front.z),
        }
    }
}

/// Camera mirrored across the water plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MirroredCamera {
    /// Mirrored eye position.
    pub eye: Vec3,
    /// Mirrored viewing direction.
    pub front: Vec3,
}

impl MirroredCamera {
    /// Returns the view matrix of the mirrored camera.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye + self.front, Vec3::Y)
    }
}

/// Perspective projection.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct Projection {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
}

impl Default for Projection {
    fn default() -> Projection {
        Projection {
            fov_y: std::f32::consts::FRAC_PI_3,
            near: 0.3,
            far: 30.0,
            aspect: 1.0,
        }
    }
}

impl Projection {
    /// Returns the projection matrix, using OpenGL clip-space conventions.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Sets the aspect ratio from viewport dimensions in pixels.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn default_looks_down_negative_z() {
        let front = Camera::default().front();
        assert!(approx_eq!(f32, front.x, 0.0, epsilon = 1e-6));
        assert_eq!(front.y, 0.0);
        assert!(approx_eq!(f32, front.z, -1.0, epsilon = 1e-6));
    }

    #[test]
    fn mirror_across_water() {
        let camera = Camera {
            position: Vec3::new(1.0, 0.5, 3.0),
            yaw: 0.3,
            pitch: -0.4,
        };
        let mirrored = camera.mirrored(-2.48, 0.0);
        assert_eq!(mirrored.eye.x, 1.0);
        assert_eq!(mirrored.eye.z, 3.0);
        assert!(approx_eq!(f32, mirrored.eye.y, -5.46, epsilon = 1e-5));
        let front = camera.front();
        assert_eq!(mirrored.front, Vec3::new(front.x, -front.y, front.z));
        assert!(mirrored.front.y > 0.0);

        let biased = camera.mirrored(-2.48, 2.6);
        assert!(approx_eq!(f32, biased.eye.y, mirrored.eye.y + 2.6, epsilon = 1e-5));
    }

    #[test]
    fn mirrored_view_maps_reflected_points() {
        // A point above the plane seen by the camera lands at the same place as
        // its mirror image seen by the mirrored camera.
        let camera = Camera {
            position: Vec3::new(0.0, 1.0, 4.0),
            yaw: -1.2,
            pitch: -0.2,
        };
        let plane = -2.0;
        let point = Vec3::new(0.7, 0.4, -1.5);
        let mirrored_point = Vec3::new(point.x, 2.0 * plane - point.y, point.z);
        let a = camera.view_matrix().transform_point3(mirrored_point);
        let b = camera
            .mirrored(plane, 0.0)
            .view_matrix()
            .transform_point3(point);
        assert!(approx_eq!(f32, a.z, b.z, epsilon = 1e-4));
        assert!(approx_eq!(f32, a.x.abs(), b.x.abs(), epsilon = 1e-4));
        assert!(approx_eq!(f32, a.y.abs(), b.y.abs(), epsilon = 1e-4));
    }

    #[test]
    fn aspect_from_viewport() {
        let mut projection = Projection::default();
        projection.set_viewport(1600, 800);
        assert_eq!(projection.aspect, 2.0);
        projection.set_viewport(0, 800);
        assert_eq!(projection.aspect, 2.0);
    }
}
