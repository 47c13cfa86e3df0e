//! Fly camera for scene navigation.

use glam::{Mat4, Vec3};

/// Maximum pitch angle in radians (just under 90 degrees).
///
/// Clamping here keeps the view direction from becoming parallel to the
/// world up axis, which would make the look-at basis degenerate.
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// A movement direction relative to the camera's current orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMovement {
    /// Move along the view direction
    Forward,
    /// Move against the view direction
    Backward,
    /// Strafe left
    Left,
    /// Strafe right
    Right,
}

/// A free-flying first-person camera.
///
/// Orientation is stored as yaw and pitch in radians. Mouse motion feeds
/// [`process_mouse`](Camera::process_mouse), held movement keys feed
/// [`process_movement`](Camera::process_movement) with the frame delta,
/// and the resulting view/projection matrices are read back each frame.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Rotation around the world Y axis, in radians
    pub yaw: f32,
    /// Rotation above/below the horizon, in radians
    pub pitch: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane distance
    pub near: f32,
    /// Far clip plane distance
    pub far: f32,
    /// Movement speed in world units per second
    pub move_speed: f32,
    /// Radians of rotation per pixel of mouse motion
    pub mouse_sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            // Yaw of -90 degrees points the camera down the negative Z axis
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            fov_y: 45.0_f32.to_radians(),
            aspect: 800.0 / 600.0,
            near: 0.1,
            far: 100.0,
            move_speed: 3.0,
            mouse_sensitivity: 0.002,
        }
    }
}

impl Camera {
    /// Create a camera at (0, 0, 10) looking down the negative Z axis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the perspective projection parameters.
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
    }

    /// Update the aspect ratio, keeping the other projection parameters.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Set the movement speed in world units per second.
    pub fn set_speed(&mut self, speed: f32) {
        self.move_speed = speed;
    }

    /// Apply accumulated mouse motion in pixels.
    ///
    /// Positive `dx` turns right, positive `dy` looks down (matching raw
    /// device deltas, where Y grows downward). Pitch is clamped so the view
    /// never reaches the poles.
    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.mouse_sensitivity;
        self.pitch -= dy * self.mouse_sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move the camera in the given direction for `dt` seconds.
    pub fn process_movement(&mut self, direction: CameraMovement, dt: f32) {
        let velocity = self.move_speed * dt;
        match direction {
            CameraMovement::Forward => self.position += self.front() * velocity,
            CameraMovement::Backward => self.position -= self.front() * velocity,
            CameraMovement::Left => self.position -= self.right() * velocity,
            CameraMovement::Right => self.position += self.right() * velocity,
        }
    }

    /// Unit vector along the view direction.
    pub fn front(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Unit vector to the camera's right, parallel to the ground plane.
    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
    }

    /// Get the projection matrix (with Vulkan Y-flip).
    pub fn projection_matrix(&self) -> Mat4 {
        let mut proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        // Flip Y for Vulkan coordinate system
        proj.y_axis.y *= -1.0;
        proj
    }

    /// Get the view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!(
            (a - b).length() < 1e-5,
            "expected {:?} to be close to {:?}",
            b,
            a
        );
    }

    #[test]
    fn test_default_camera_faces_negative_z() {
        let camera = Camera::new();
        assert_vec3_near(camera.front(), Vec3::NEG_Z);
        assert_vec3_near(camera.right(), Vec3::X);
    }

    #[test]
    fn test_view_matrix_maps_position_to_origin() {
        let camera = Camera::new();
        let view = camera.view_matrix();
        let eye = view * camera.position.extend(1.0);
        assert!(eye.truncate().length() < 1e-5);
    }

    #[test]
    fn test_projection_flips_y() {
        let camera = Camera::new();
        let proj = camera.projection_matrix();
        assert!(proj.y_axis.y < 0.0);
    }

    #[test]
    fn test_set_aspect_changes_projection() {
        let mut camera = Camera::new();
        let before = camera.projection_matrix();
        camera.set_aspect(21.0 / 9.0);
        let after = camera.projection_matrix();
        assert_ne!(before.x_axis.x, after.x_axis.x);
        // The vertical field of view is unchanged
        assert_eq!(before.y_axis.y, after.y_axis.y);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new();
        camera.process_mouse(0.0, -100_000.0);
        assert!(camera.pitch <= PITCH_LIMIT);
        camera.process_mouse(0.0, 100_000.0);
        assert!(camera.pitch >= -PITCH_LIMIT);
    }

    #[test]
    fn test_forward_movement_follows_view_direction() {
        let mut camera = Camera::new();
        let start = camera.position;
        camera.process_movement(CameraMovement::Forward, 1.0);
        assert_vec3_near(camera.position, start + Vec3::NEG_Z * camera.move_speed);
    }

    #[test]
    fn test_strafe_is_perpendicular_to_view() {
        let mut camera = Camera::new();
        let start = camera.position;
        camera.process_movement(CameraMovement::Right, 0.5);
        let moved = camera.position - start;
        assert!(moved.dot(camera.front()).abs() < 1e-5);
        assert!(moved.x > 0.0);
    }

    #[test]
    fn test_mouse_turn_changes_front() {
        let mut camera = Camera::new();
        // A quarter turn to the right should face down positive X
        camera.process_mouse(std::f32::consts::FRAC_PI_2 / camera.mouse_sensitivity, 0.0);
        assert_vec3_near(camera.front(), Vec3::X);
    }
}
