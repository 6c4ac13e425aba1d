// camera.rs — orbit camera around the panorama center.

use glam::{Mat4, Vec3};

/// Default vertical field of view in degrees.
pub const DEFAULT_FOV_DEG: f32 = 60.0;

const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;

/// Camera orbiting the origin from just off-center, so the view never
/// degenerates when the look target coincides with the eye. Pan and zoom
/// are disabled; drag rotates the view.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Heading in degrees; 0 looks down -Z.
    pub yaw: f32,
    /// Elevation in degrees, clamped to just short of the poles.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    /// Drag sensitivity multiplier; negative inverts the drag direction.
    pub rotate_speed: f32,
}

impl OrbitCamera {
    pub fn new(aspect: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV_DEG,
            aspect,
            rotate_speed: 1.0,
        }
    }

    /// Eye position: a small offset from the origin along -X.
    pub fn eye(&self) -> Vec3 {
        Vec3::new(-0.1, 0.0, 0.0)
    }

    /// Unit look direction derived from yaw/pitch.
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        Vec3::new(cp * sy, sp, -cp * cy)
    }

    /// Screen-aligned right and up vectors, used to billboard markers.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let f = self.forward();
        let right = f.cross(Vec3::Y).normalize();
        let up = right.cross(f).normalize();
        (right, up)
    }

    /// Applies a pointer drag in pixels. The horizontal angular step per
    /// pixel follows from the horizontal field of view at the current
    /// aspect ratio, so dragging across the full window width sweeps one
    /// horizontal FOV regardless of resolution.
    pub fn drag(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let v_fov = self.fov.to_radians();
        let h_fov = 2.0 * ((v_fov / 2.0).tan() * self.aspect).atan();

        let yaw_per_px = (h_fov / width).to_degrees();
        let pitch_per_px = (v_fov / height).to_degrees();

        self.yaw -= dx * yaw_per_px * self.rotate_speed;
        self.pitch = (self.pitch - dy * pitch_per_px * self.rotate_speed).clamp(-89.9, 89.9);
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, NEAR, FAR);
        let view = Mat4::look_to_rh(self.eye(), self.forward(), Vec3::Y);
        proj * view
    }

    /// Projects a world point to window pixel coordinates. Returns `None`
    /// when the point is behind the camera.
    pub fn project_to_screen(&self, world: Vec3, width: f32, height: f32) -> Option<(f32, f32)> {
        let clip = self.view_proj() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(((ndc.x + 1.0) * 0.5 * width, (1.0 - ndc.y) * 0.5 * height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_zero_looks_down_negative_z() {
        let cam = OrbitCamera::new(4.0 / 3.0);
        let f = cam.forward();
        assert!((f - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped_at_the_poles() {
        let mut cam = OrbitCamera::new(1.0);
        cam.drag(0.0, 100_000.0, 800.0, 600.0);
        assert!(cam.pitch >= -89.9 && cam.pitch <= 89.9);
    }

    #[test]
    fn resize_round_trip_restores_aspect() {
        let mut cam = OrbitCamera::new(800.0 / 600.0);
        cam.set_aspect(1920, 1080);
        cam.set_aspect(800, 600);
        assert!((cam.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn resize_ignores_degenerate_sizes() {
        let mut cam = OrbitCamera::new(2.0);
        cam.set_aspect(0, 600);
        assert!((cam.aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn point_ahead_projects_to_screen_center() {
        let cam = OrbitCamera::new(800.0 / 600.0);
        let (x, y) = cam
            .project_to_screen(Vec3::new(-0.1, 0.0, -32.0), 800.0, 600.0)
            .unwrap();
        assert!((x - 400.0).abs() < 1.0, "x = {x}");
        assert!((y - 300.0).abs() < 1.0, "y = {y}");
    }

    #[test]
    fn point_behind_camera_does_not_project() {
        let cam = OrbitCamera::new(1.0);
        assert!(cam
            .project_to_screen(Vec3::new(-0.1, 0.0, 32.0), 800.0, 600.0)
            .is_none());
    }
}
