// tween.rs — frame-driven scalar interpolation.
//
// Transitions are sampled explicitly from the render loop with the frame
// delta, so progress is deterministic and there are no hidden timers or
// out-of-band completion callbacks.

/// Marker scale transition length in seconds.
pub const SCALE_DURATION: f32 = 0.3;
/// Sphere fade length in seconds, each direction.
pub const FADE_DURATION: f32 = 0.5;

/// A linear interpolation from `from` to `to` over `duration` seconds.
/// `step` clamps at the end, so the final sampled value is exactly `to`.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advances by `dt` seconds and returns the current value.
    pub fn step(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = self.elapsed / self.duration;
        self.from + (self.to - self.from) * t
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_linearly() {
        let mut t = Tween::new(1.0, 0.0, 0.5);
        assert!((t.step(0.25) - 0.5).abs() < 1e-6);
        assert!(!t.finished());
    }

    #[test]
    fn ends_exactly_at_target() {
        let mut t = Tween::new(0.0, 1.0, 0.5);
        t.step(0.3);
        t.step(0.3);
        assert!(t.finished());
        assert_eq!(t.value(), 1.0);
    }

    #[test]
    fn overshoot_is_clamped() {
        let mut t = Tween::new(2.0, 3.0, 0.3);
        assert_eq!(t.step(10.0), 3.0);
        assert!(t.finished());
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut t = Tween::new(0.0, 1.0, 0.0);
        assert_eq!(t.step(0.0), 1.0);
        assert!(t.finished());
    }

    #[test]
    fn negative_dt_does_not_rewind() {
        let mut t = Tween::new(0.0, 1.0, 1.0);
        t.step(0.5);
        let v = t.step(-0.5);
        assert!((v - 0.5).abs() < 1e-6);
    }
}
