// picking.rs — pointer ray construction and scene intersection.

use glam::Vec3;

use crate::camera::OrbitCamera;
use crate::scene::{HotspotMarker, SceneObjectKind, PANORAMA_RADIUS};

/// A ray in world space.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// One intersection, nearest-first when returned from [`pick`].
#[derive(Debug, Clone, Copy)]
pub struct PickHit {
    pub object: SceneObjectKind,
    pub point: Vec3,
    pub distance: f32,
}

/// Builds the world-space ray under a pointer position.
///
/// Pixel coordinates map to normalized device coordinates as
/// `ndc_x = (x/w)*2 - 1`, `ndc_y = -(y/h)*2 + 1`, then the near- and
/// far-plane points are unprojected through the inverse view-projection.
pub fn ray_from_pointer(camera: &OrbitCamera, x: f32, y: f32, width: f32, height: f32) -> Ray {
    let ndc_x = (x / width) * 2.0 - 1.0;
    let ndc_y = -(y / height) * 2.0 + 1.0;

    let inv = camera.view_proj().inverse();
    let near = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
    let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));

    Ray::new(near, far - near)
}

/// Nearest positive intersection of a ray with a sphere, or `None`.
/// Works from inside the sphere too (returns the exit point), which is
/// how the panorama surface itself gets hit.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t0 = -b - sqrt_disc;
    let t1 = -b + sqrt_disc;
    if t0 > 1e-4 {
        Some(t0)
    } else if t1 > 1e-4 {
        Some(t1)
    } else {
        None
    }
}

/// Intersects the pointer ray against every scene object — each marker's
/// bounding sphere and the panorama sphere — and returns hits ordered by
/// ascending distance. Pure function of its inputs.
pub fn pick(
    camera: &OrbitCamera,
    markers: &[HotspotMarker],
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Vec<PickHit> {
    if width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }

    let ray = ray_from_pointer(camera, x, y, width, height);
    let mut hits = Vec::new();

    for (i, marker) in markers.iter().enumerate() {
        if let Some(t) = ray_sphere(&ray, marker.position, marker.pick_radius()) {
            hits.push(PickHit {
                object: SceneObjectKind::Marker(i),
                point: ray.at(t),
                distance: t,
            });
        }
    }

    if let Some(t) = ray_sphere(&ray, Vec3::ZERO, PANORAMA_RADIUS) {
        hits.push(PickHit {
            object: SceneObjectKind::Sphere,
            point: ray.at(t),
            distance: t,
        });
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// First marker hit, if any. Markers sit inside the panorama sphere, so
/// a marker hit is always nearer than the sphere hit behind it.
pub fn pick_marker(
    camera: &OrbitCamera,
    markers: &[HotspotMarker],
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Option<usize> {
    pick(camera, markers, x, y, width, height)
        .into_iter()
        .find_map(|hit| match hit.object {
            SceneObjectKind::Marker(i) => Some(i),
            SceneObjectKind::Sphere => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MARKER_ORBIT_RADIUS;

    fn marker_at(direction: Vec3) -> HotspotMarker {
        HotspotMarker::new(direction, "m", "p", "p.jpeg")
    }

    #[test]
    fn center_pointer_ray_follows_the_camera_forward() {
        let cam = OrbitCamera::new(800.0 / 600.0);
        let ray = ray_from_pointer(&cam, 400.0, 300.0, 800.0, 600.0);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-3);
    }

    #[test]
    fn marker_under_pointer_is_hit_before_the_sphere() {
        let cam = OrbitCamera::new(800.0 / 600.0);
        let markers = vec![marker_at(Vec3::NEG_Z)];
        let hits = pick(&cam, &markers, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object, SceneObjectKind::Marker(0));
        assert_eq!(hits[1].object, SceneObjectKind::Sphere);
        assert!(hits[0].distance < hits[1].distance);
        assert!((hits[0].distance - (MARKER_ORBIT_RADIUS - 1.0)).abs() < 0.5);
    }

    #[test]
    fn pointer_off_marker_hits_only_the_sphere() {
        let cam = OrbitCamera::new(800.0 / 600.0);
        let markers = vec![marker_at(Vec3::NEG_Z)];
        let hits = pick(&cam, &markers, 400.0, 40.0, 800.0, 600.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, SceneObjectKind::Sphere);
    }

    #[test]
    fn panorama_sphere_is_hit_from_inside() {
        let cam = OrbitCamera::new(1.0);
        let hits = pick(&cam, &[], 400.0, 300.0, 800.0, 800.0);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - PANORAMA_RADIUS).abs() < 0.2);
    }

    #[test]
    fn marker_behind_the_camera_is_not_hit() {
        let cam = OrbitCamera::new(1.0);
        let markers = vec![marker_at(Vec3::Z)];
        assert!(pick_marker(&cam, &markers, 400.0, 300.0, 800.0, 800.0).is_none());
    }

    #[test]
    fn degenerate_viewport_yields_no_hits() {
        let cam = OrbitCamera::new(1.0);
        assert!(pick(&cam, &[], 0.0, 0.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn picking_is_deterministic() {
        let cam = OrbitCamera::new(800.0 / 600.0);
        let markers = vec![marker_at(Vec3::NEG_Z)];
        let a = pick(&cam, &markers, 400.0, 300.0, 800.0, 600.0);
        let b = pick(&cam, &markers, 400.0, 300.0, 800.0, 600.0);
        assert_eq!(a.len(), b.len());
        for (ha, hb) in a.iter().zip(&b) {
            assert_eq!(ha.object, hb.object);
            assert_eq!(ha.distance, hb.distance);
        }
    }
}
