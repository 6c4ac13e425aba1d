// scene.rs — panorama/marker data model and the tour description.

use std::collections::HashSet;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Radius of the textured panorama sphere.
pub const PANORAMA_RADIUS: f32 = 50.0;
/// Markers sit on a fixed-radius shell inside the panorama sphere.
pub const MARKER_ORBIT_RADIUS: f32 = 32.0;
/// Idle marker scale (world units across the billboard).
pub const MARKER_BASE_SCALE: f32 = 2.0;
/// Hovered marker scale.
pub const MARKER_HOVER_SCALE: f32 = 3.0;

/// The single current panorama surface. Exactly one exists at a time;
/// the controller replaces it wholesale during a swap.
#[derive(Debug, Clone)]
pub struct PanoramaSphere {
    pub image_source: String,
    pub opacity: f32,
}

impl PanoramaSphere {
    pub fn new(image_source: impl Into<String>) -> Self {
        Self {
            image_source: image_source.into(),
            opacity: 1.0,
        }
    }
}

/// A clickable, camera-facing navigation marker.
#[derive(Debug, Clone)]
pub struct HotspotMarker {
    pub name: String,
    /// Id of the panorama this marker navigates to.
    pub target: String,
    /// Image of the target panorama, resolved when the roster is built.
    pub target_image: String,
    /// World position: the configured direction normalized onto the
    /// marker shell.
    pub position: Vec3,
    pub scale: f32,
    pub hovered: bool,
}

impl HotspotMarker {
    pub fn new(
        direction: Vec3,
        name: impl Into<String>,
        target: impl Into<String>,
        target_image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            target_image: target_image.into(),
            position: direction.normalize() * MARKER_ORBIT_RADIUS,
            scale: MARKER_BASE_SCALE,
            hovered: false,
        }
    }

    /// Radius of the bounding sphere used for ray picking.
    pub fn pick_radius(&self) -> f32 {
        self.scale * 0.5
    }
}

/// What a pick ray hit. Replaces dynamic type-name checks with an
/// explicit tagged kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneObjectKind {
    Sphere,
    Marker(usize),
}

// --- Tour description -----------------------------------------------------

/// One marker as declared in a tour file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerDef {
    pub name: String,
    /// Id of the destination panorama.
    pub target: String,
    /// Direction from the viewer toward the marker; magnitude is ignored.
    pub direction: [f32; 3],
}

/// One panorama and the markers visible while it is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanoramaDef {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub markers: Vec<MarkerDef>,
}

/// A walkable set of panoramas. Marker-to-panorama association is an
/// explicit relation here: each marker belongs to the panorama that
/// declares it, and only that panorama's markers are active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub start: String,
    pub panoramas: Vec<PanoramaDef>,
}

impl Tour {
    /// The built-in two-room demo.
    pub fn demo() -> Self {
        Self {
            start: "room1".into(),
            panoramas: vec![
                PanoramaDef {
                    id: "room1".into(),
                    image: "resources/room1.jpeg".into(),
                    markers: vec![MarkerDef {
                        name: "room2".into(),
                        target: "room2".into(),
                        direction: [32.0, -1.5, 37.6],
                    }],
                },
                PanoramaDef {
                    id: "room2".into(),
                    image: "resources/room2.jpeg".into(),
                    markers: vec![MarkerDef {
                        name: "room1".into(),
                        target: "room1".into(),
                        direction: [-32.0, -1.5, -37.6],
                    }],
                },
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let tour: Tour =
            serde_json::from_str(&text).map_err(|source| AssetError::TourParse {
                path: path.to_path_buf(),
                source,
            })?;
        tour.validate()?;
        Ok(tour)
    }

    /// Checks referential integrity: the start panorama exists, every
    /// marker targets a known panorama, and marker names are unique
    /// within their panorama.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.panoramas.is_empty() {
            return Err(AssetError::TourInvalid("tour has no panoramas".into()));
        }
        let ids: HashSet<&str> = self.panoramas.iter().map(|p| p.id.as_str()).collect();
        if ids.len() != self.panoramas.len() {
            return Err(AssetError::TourInvalid("duplicate panorama id".into()));
        }
        if !ids.contains(self.start.as_str()) {
            return Err(AssetError::TourInvalid(format!(
                "start panorama {:?} is not defined",
                self.start
            )));
        }
        for pano in &self.panoramas {
            let mut names = HashSet::new();
            for marker in &pano.markers {
                if !names.insert(marker.name.as_str()) {
                    return Err(AssetError::TourInvalid(format!(
                        "panorama {:?} has duplicate marker {:?}",
                        pano.id, marker.name
                    )));
                }
                if !ids.contains(marker.target.as_str()) {
                    return Err(AssetError::TourInvalid(format!(
                        "marker {:?} targets unknown panorama {:?}",
                        marker.name, marker.target
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn panorama(&self, id: &str) -> Option<&PanoramaDef> {
        self.panoramas.iter().find(|p| p.id == id)
    }

    /// Builds the runtime marker roster for one panorama, resolving each
    /// marker's target image.
    pub fn markers_for(&self, id: &str) -> Vec<HotspotMarker> {
        let Some(pano) = self.panorama(id) else {
            return Vec::new();
        };
        pano.markers
            .iter()
            .filter_map(|m| {
                let target = self.panorama(&m.target)?;
                Some(HotspotMarker::new(
                    Vec3::from_array(m.direction),
                    &m.name,
                    &m.target,
                    &target.image,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_tour_is_valid() {
        assert!(Tour::demo().validate().is_ok());
    }

    #[test]
    fn markers_sit_on_the_marker_shell() {
        let markers = Tour::demo().markers_for("room1");
        assert_eq!(markers.len(), 1);
        assert!((markers[0].position.length() - MARKER_ORBIT_RADIUS).abs() < 1e-3);
        assert_eq!(markers[0].target_image, "resources/room2.jpeg");
    }

    #[test]
    fn markers_are_scoped_to_their_panorama() {
        let tour = Tour::demo();
        let room1: Vec<_> = tour.markers_for("room1").iter().map(|m| m.name.clone()).collect();
        let room2: Vec<_> = tour.markers_for("room2").iter().map(|m| m.name.clone()).collect();
        assert_eq!(room1, vec!["room2"]);
        assert_eq!(room2, vec!["room1"]);
    }

    #[test]
    fn parse_round_trips_through_json() {
        let text = serde_json::to_string(&Tour::demo()).unwrap();
        let tour: Tour = serde_json::from_str(&text).unwrap();
        assert_eq!(tour.start, "room1");
        assert_eq!(tour.panoramas.len(), 2);
    }

    #[test]
    fn validate_rejects_unknown_marker_target() {
        let mut tour = Tour::demo();
        tour.panoramas[0].markers[0].target = "attic".into();
        assert!(tour.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_start() {
        let mut tour = Tour::demo();
        tour.start = "lobby".into();
        assert!(tour.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_marker_names() {
        let mut tour = Tour::demo();
        let dup = tour.panoramas[0].markers[0].clone();
        tour.panoramas[0].markers.push(dup);
        assert!(tour.validate().is_err());
    }
}
