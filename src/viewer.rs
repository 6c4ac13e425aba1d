// viewer.rs — hover/click state machine and panorama swap sequencing.

use log::{debug, info, warn};

use crate::camera::OrbitCamera;
use crate::picking;
use crate::scene::{
    HotspotMarker, PanoramaSphere, Tour, MARKER_BASE_SCALE, MARKER_HOVER_SCALE,
};
use crate::tween::{Tween, FADE_DURATION, SCALE_DURATION};

/// Where the controller is in the swap sequence. Input that would start
/// a second swap is rejected while any transition is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Old sphere fading 1 -> 0.
    FadeOut,
    /// New sphere exists at opacity 0; its texture is decoding off-thread.
    AwaitTexture,
    /// New sphere fading 0 -> 1.
    FadeIn,
}

/// Screen-space label for the hovered marker.
#[derive(Debug, Clone)]
pub struct Tooltip {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// Requests the controller hands back to the shell from `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Decode this image off-thread and call `texture_ready` when done.
    LoadPanorama(String),
}

/// Owns the camera, the single current sphere, the active marker roster
/// and all transition state. Constructed per window; no globals.
pub struct ViewerController {
    pub camera: OrbitCamera,
    tour: Tour,
    current: String,
    pub sphere: PanoramaSphere,
    pub markers: Vec<HotspotMarker>,
    marker_tweens: Vec<Option<Tween>>,
    hovered: Option<usize>,
    phase: Phase,
    fade: Option<Tween>,
    pending_target: Option<String>,
    pub tooltip: Option<Tooltip>,
    viewport: (f32, f32),
    last_pointer: Option<(f32, f32)>,
}

impl ViewerController {
    pub fn new(tour: Tour, width: u32, height: u32) -> Result<Self, crate::error::AssetError> {
        tour.validate()?;
        let start = tour.start.clone();
        // Validation guarantees the start panorama exists.
        let image = tour
            .panorama(&start)
            .map(|p| p.image.clone())
            .unwrap_or_default();
        let markers = tour.markers_for(&start);
        let tween_slots = markers.len();

        Ok(Self {
            camera: OrbitCamera::new(width.max(1) as f32 / height.max(1) as f32),
            tour,
            current: start,
            sphere: PanoramaSphere::new(image),
            markers,
            marker_tweens: vec![None; tween_slots],
            hovered: None,
            phase: Phase::Idle,
            fade: None,
            pending_target: None,
            tooltip: None,
            viewport: (width as f32, height as f32),
            last_pointer: None,
        })
    }

    pub fn current_panorama(&self) -> &str {
        &self.current
    }

    pub fn current_image(&self) -> &str {
        &self.sphere.image_source
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Whether a finished background decode of `path` belongs to the
    /// current sphere. Decodes outlive clicks and tour reloads, so a
    /// result for anything but the current image is stale and must be
    /// dropped, not uploaded.
    pub fn accepts_texture(&self, path: &std::path::Path) -> bool {
        std::path::Path::new(&self.sphere.image_source) == path
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
        if width > 0 && height > 0 {
            self.viewport = (width as f32, height as f32);
        }
    }

    /// Applies a camera drag in pixels.
    pub fn on_drag(&mut self, dx: f32, dy: f32) {
        let (w, h) = self.viewport;
        self.camera.drag(dx, dy, w, h);
    }

    /// Hover pick. Hits are ignored while a swap is in flight; the hover
    /// is re-evaluated from the last pointer position once the swap
    /// finishes.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.last_pointer = Some((x, y));
        if self.is_transitioning() {
            return;
        }

        let (w, h) = self.viewport;
        match picking::pick_marker(&self.camera, &self.markers, x, y, w, h) {
            Some(i) => {
                if self.hovered != Some(i) {
                    if let Some(prev) = self.hovered.take() {
                        self.demote(prev);
                    }
                    self.promote(i);
                    self.hovered = Some(i);
                }
                if let Some((sx, sy)) = self.camera.project_to_screen(self.markers[i].position, w, h)
                {
                    self.tooltip = Some(Tooltip {
                        x: sx,
                        y: sy,
                        text: self.markers[i].name.clone(),
                    });
                }
            }
            None => {
                if let Some(prev) = self.hovered.take() {
                    self.demote(prev);
                }
                self.tooltip = None;
            }
        }
    }

    /// Click pick. The nearest marker hit starts the swap sequence;
    /// anything else is a no-op.
    pub fn on_click(&mut self, x: f32, y: f32) {
        if self.is_transitioning() {
            debug!("click ignored: panorama swap already in flight");
            return;
        }

        let (w, h) = self.viewport;
        let Some(i) = picking::pick_marker(&self.camera, &self.markers, x, y, w, h) else {
            return;
        };

        let target = self.markers[i].target.clone();
        info!(
            "marker {:?} clicked, swapping to panorama {:?}",
            self.markers[i].name, target
        );

        if let Some(prev) = self.hovered.take() {
            self.demote(prev);
        }
        self.tooltip = None;
        self.pending_target = Some(target);
        self.fade = Some(Tween::new(self.sphere.opacity, 0.0, FADE_DURATION));
        self.phase = Phase::FadeOut;
    }

    /// Advances all in-flight transitions by `dt` seconds. Completion
    /// work happens here, on a later frame than the input that started
    /// the transition.
    pub fn update(&mut self, dt: f32) -> Vec<ViewerEvent> {
        let mut events = Vec::new();

        for (marker, slot) in self.markers.iter_mut().zip(&mut self.marker_tweens) {
            if let Some(tween) = slot {
                marker.scale = tween.step(dt);
                if tween.finished() {
                    *slot = None;
                }
            }
        }

        // The camera may have moved since the pointer last did; keep the
        // tooltip anchored to the marker's current projection.
        if let Some(i) = self.hovered {
            let (w, h) = self.viewport;
            if let Some((sx, sy)) = self.camera.project_to_screen(self.markers[i].position, w, h) {
                if let Some(tip) = &mut self.tooltip {
                    tip.x = sx;
                    tip.y = sy;
                }
            }
        }

        match self.phase {
            Phase::Idle | Phase::AwaitTexture => {}
            Phase::FadeOut => {
                if let Some(mut tween) = self.fade.take() {
                    self.sphere.opacity = tween.step(dt);
                    if tween.finished() {
                        if let Some(event) = self.swap_sphere() {
                            events.push(event);
                        }
                    } else {
                        self.fade = Some(tween);
                    }
                }
            }
            Phase::FadeIn => {
                if let Some(mut tween) = self.fade.take() {
                    self.sphere.opacity = tween.step(dt);
                    if tween.finished() {
                        self.phase = Phase::Idle;
                        if let Some((x, y)) = self.last_pointer {
                            self.on_pointer_move(x, y);
                        }
                    } else {
                        self.fade = Some(tween);
                    }
                }
            }
        }

        events
    }

    /// The shell uploaded the new panorama texture; start the fade-in.
    pub fn texture_ready(&mut self) {
        if self.phase == Phase::AwaitTexture {
            self.fade = Some(Tween::new(self.sphere.opacity, 1.0, FADE_DURATION));
            self.phase = Phase::FadeIn;
        }
    }

    /// The texture failed to decode. The placeholder fades in instead so
    /// opacity still lands at 1 and the controller never wedges.
    pub fn texture_failed(&mut self) {
        if self.phase == Phase::AwaitTexture {
            warn!(
                "panorama {:?} failed to load, fading in placeholder",
                self.sphere.image_source
            );
            self.texture_ready();
        }
    }

    /// Fade-out finished: drop the old sphere, create its replacement at
    /// opacity 0, swap the marker roster, and request the new texture.
    /// A missing target (cannot happen for a validated tour) restores
    /// the current sphere instead of wedging at opacity 0.
    fn swap_sphere(&mut self) -> Option<ViewerEvent> {
        let target = self.pending_target.take();
        let image = target
            .as_deref()
            .and_then(|t| self.tour.panorama(t))
            .map(|p| p.image.clone());
        let (Some(target), Some(image)) = (target, image) else {
            warn!("swap target is not in the tour, keeping the current panorama");
            self.sphere.opacity = 1.0;
            self.phase = Phase::Idle;
            return None;
        };

        self.current = target;
        self.sphere = PanoramaSphere {
            image_source: image.clone(),
            opacity: 0.0,
        };
        self.markers = self.tour.markers_for(&self.current);
        self.marker_tweens = vec![None; self.markers.len()];
        self.hovered = None;
        self.phase = Phase::AwaitTexture;

        Some(ViewerEvent::LoadPanorama(image))
    }

    fn promote(&mut self, i: usize) {
        self.markers[i].hovered = true;
        self.marker_tweens[i] = Some(Tween::new(
            self.markers[i].scale,
            MARKER_HOVER_SCALE,
            SCALE_DURATION,
        ));
    }

    fn demote(&mut self, i: usize) {
        self.markers[i].hovered = false;
        self.marker_tweens[i] = Some(Tween::new(
            self.markers[i].scale,
            MARKER_BASE_SCALE,
            SCALE_DURATION,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MarkerDef, PanoramaDef};

    const W: u32 = 800;
    const H: u32 = 600;
    const CENTER: (f32, f32) = (400.0, 300.0);
    const OFF: (f32, f32) = (400.0, 40.0);

    /// Two rooms linked both ways, markers dead ahead of the default
    /// camera so the screen center hits them.
    fn test_tour() -> Tour {
        Tour {
            start: "a".into(),
            panoramas: vec![
                PanoramaDef {
                    id: "a".into(),
                    image: "a.jpeg".into(),
                    markers: vec![MarkerDef {
                        name: "to-b".into(),
                        target: "b".into(),
                        direction: [0.0, 0.0, -1.0],
                    }],
                },
                PanoramaDef {
                    id: "b".into(),
                    image: "b.jpeg".into(),
                    markers: vec![MarkerDef {
                        name: "to-a".into(),
                        target: "a".into(),
                        direction: [0.0, 0.0, -1.0],
                    }],
                },
            ],
        }
    }

    fn controller() -> ViewerController {
        ViewerController::new(test_tour(), W, H).unwrap()
    }

    #[test]
    fn pointer_off_markers_stays_idle() {
        let mut v = controller();
        v.on_pointer_move(OFF.0, OFF.1);
        assert_eq!(v.hovered(), None);
        assert!(v.tooltip.is_none());
        assert!(!v.is_transitioning());
    }

    #[test]
    fn hover_scales_marker_and_shows_tooltip() {
        let mut v = controller();
        v.on_pointer_move(CENTER.0, CENTER.1);
        assert_eq!(v.hovered(), Some(0));

        let tip = v.tooltip.clone().expect("tooltip shown");
        assert_eq!(tip.text, "to-b");
        assert!((tip.x - 400.0).abs() < 5.0, "tooltip x = {}", tip.x);
        assert!((tip.y - 300.0).abs() < 5.0, "tooltip y = {}", tip.y);

        v.update(SCALE_DURATION);
        assert_eq!(v.markers[0].scale, MARKER_HOVER_SCALE);
    }

    #[test]
    fn leaving_a_marker_restores_base_scale() {
        let mut v = controller();
        v.on_pointer_move(CENTER.0, CENTER.1);
        v.update(SCALE_DURATION);

        v.on_pointer_move(OFF.0, OFF.1);
        assert_eq!(v.hovered(), None);
        assert!(v.tooltip.is_none());
        v.update(SCALE_DURATION);
        assert_eq!(v.markers[0].scale, MARKER_BASE_SCALE);
    }

    #[test]
    fn hover_switches_between_markers_exclusively() {
        let mut tour = test_tour();
        tour.panoramas[0].markers.push(MarkerDef {
            name: "to-b-east".into(),
            target: "b".into(),
            direction: [0.3, 0.0, -1.0],
        });
        let mut v = ViewerController::new(tour, W, H).unwrap();

        v.on_pointer_move(CENTER.0, CENTER.1);
        assert_eq!(v.hovered(), Some(0));
        v.update(SCALE_DURATION);

        // Aim exactly at the second marker's projection.
        let (sx, sy) = v
            .camera
            .project_to_screen(v.markers[1].position, W as f32, H as f32)
            .unwrap();
        v.on_pointer_move(sx, sy);
        assert_eq!(v.hovered(), Some(1));
        assert_eq!(v.tooltip.as_ref().unwrap().text, "to-b-east");

        v.update(SCALE_DURATION);
        assert_eq!(v.markers[0].scale, MARKER_BASE_SCALE);
        assert_eq!(v.markers[1].scale, MARKER_HOVER_SCALE);
        let at_hover = v
            .markers
            .iter()
            .filter(|m| m.scale >= MARKER_HOVER_SCALE - 1e-3)
            .count();
        assert_eq!(at_hover, 1);
    }

    #[test]
    fn click_fades_out_then_swaps_then_fades_in() {
        let mut v = controller();
        v.on_pointer_move(CENTER.0, CENTER.1);
        v.on_click(CENTER.0, CENTER.1);

        assert!(v.is_transitioning());
        assert!(v.tooltip.is_none(), "tooltip hides on click");

        // Halfway through the fade-out.
        assert!(v.update(FADE_DURATION / 2.0).is_empty());
        assert!((v.sphere.opacity - 0.5).abs() < 1e-4);

        // Fade-out completes: old sphere replaced at opacity 0, new
        // roster active, texture requested.
        let events = v.update(FADE_DURATION / 2.0);
        assert_eq!(events, vec![ViewerEvent::LoadPanorama("b.jpeg".into())]);
        assert_eq!(v.current_image(), "b.jpeg");
        assert_eq!(v.sphere.opacity, 0.0);
        assert_eq!(v.markers.len(), 1);
        assert_eq!(v.markers[0].name, "to-a");

        v.texture_ready();
        v.update(FADE_DURATION);
        assert_eq!(v.sphere.opacity, 1.0);
        assert_eq!(v.current_panorama(), "b");
    }

    #[test]
    fn click_on_empty_space_is_a_noop() {
        let mut v = controller();
        v.on_click(OFF.0, OFF.1);
        assert!(!v.is_transitioning());
        assert_eq!(v.current_panorama(), "a");
    }

    #[test]
    fn click_during_transition_is_rejected() {
        let mut v = controller();
        v.on_click(CENTER.0, CENTER.1);
        v.update(0.1);
        let opacity = v.sphere.opacity;

        // A second click mid-fade must not restart or stack a fade.
        v.on_click(CENTER.0, CENTER.1);
        assert!((v.sphere.opacity - opacity).abs() < 1e-6);

        // The original fade still completes on its original schedule.
        let events = v.update(FADE_DURATION - 0.1);
        assert_eq!(events.len(), 1);
        assert_eq!(v.sphere.opacity, 0.0);
    }

    #[test]
    fn hover_is_suppressed_while_transitioning() {
        let mut v = controller();
        v.on_click(CENTER.0, CENTER.1);
        v.on_pointer_move(CENTER.0, CENTER.1);
        assert_eq!(v.hovered(), None);
        assert!(v.tooltip.is_none());
    }

    #[test]
    fn hover_is_reevaluated_after_the_swap_completes() {
        let mut v = controller();
        v.on_pointer_move(CENTER.0, CENTER.1);
        v.on_click(CENTER.0, CENTER.1);
        v.update(FADE_DURATION);
        v.texture_ready();
        v.update(FADE_DURATION);

        // Room b's marker is also dead ahead, so the still-centered
        // pointer hovers it as soon as the fade-in ends.
        assert_eq!(v.hovered(), Some(0));
        assert_eq!(v.tooltip.as_ref().unwrap().text, "to-a");
    }

    #[test]
    fn failed_texture_still_fades_in_and_unlocks_input() {
        let mut v = controller();
        v.on_click(CENTER.0, CENTER.1);
        v.update(FADE_DURATION);
        v.texture_failed();
        v.update(FADE_DURATION);
        assert_eq!(v.sphere.opacity, 1.0);
        assert!(!v.is_transitioning());
    }

    #[test]
    fn stale_decode_results_are_not_accepted() {
        use std::path::Path;

        let mut v = controller();
        v.on_click(CENTER.0, CENTER.1);
        v.update(FADE_DURATION);

        // Waiting on b.jpeg: only a decode of b.jpeg may be applied. A
        // late result for the previous panorama must be dropped.
        assert!(v.accepts_texture(Path::new("b.jpeg")));
        assert!(!v.accepts_texture(Path::new("a.jpeg")));

        // Replacing the controller (tour reload) invalidates in-flight
        // decodes for the old tour outright.
        let v = controller();
        assert!(v.accepts_texture(Path::new("a.jpeg")));
        assert!(!v.accepts_texture(Path::new("b.jpeg")));
    }

    #[test]
    fn tooltip_tracks_the_marker_when_the_camera_moves() {
        let mut v = controller();
        v.on_pointer_move(CENTER.0, CENTER.1);
        let before = v.tooltip.clone().unwrap();

        v.on_drag(60.0, 0.0);
        v.update(0.0);

        let after = v.tooltip.clone().unwrap();
        let (sx, sy) = v
            .camera
            .project_to_screen(v.markers[0].position, W as f32, H as f32)
            .unwrap();
        assert!((after.x - sx).abs() < 1e-3);
        assert!((after.y - sy).abs() < 1e-3);
        assert!(
            (after.x - before.x).abs() > 1.0,
            "tooltip did not move with the camera"
        );
    }

    #[test]
    fn missing_swap_target_recovers_to_idle() {
        let mut v = controller();
        v.on_click(CENTER.0, CENTER.1);
        // Corrupt the tour under the in-flight swap: the target panorama
        // disappears before the fade-out lands.
        v.tour.panoramas.retain(|p| p.id != "b");

        let events = v.update(FADE_DURATION);
        assert!(events.is_empty());
        assert!(!v.is_transitioning());
        assert_eq!(v.sphere.opacity, 1.0);
        assert_eq!(v.current_panorama(), "a");
    }

    #[test]
    fn resize_updates_camera_aspect_idempotently() {
        let mut v = controller();
        v.on_resize(1920, 1080);
        v.on_resize(W, H);
        assert!((v.camera.aspect - W as f32 / H as f32).abs() < 1e-6);
    }
}
