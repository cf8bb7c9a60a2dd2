use crate::math::Vec3;

/// Idle yaw added per display frame.
pub const ROTATION_SPEED: f64 = 0.0005;
const DRAG_SENSITIVITY: f64 = 0.005;
const PITCH_LIMIT: f64 = 1.2;
const ZOOM_SENSITIVITY: f64 = 0.002;
const CAMERA_MIN: f64 = 1.5;
const CAMERA_MAX: f64 = 5.0;
const CAMERA_START: f64 = 2.8;

/// Orientation of the globe and the drag state that suspends idle rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeView {
    pub yaw: f64,
    pub pitch: f64,
    pub camera_distance: f64,
    dragging: bool,
    last_pointer: Option<(f64, f64)>,
}

impl Default for GlobeView {
    fn default() -> Self {
        Self {
            // Opens over the Caribbean / Atlantic.
            yaw: std::f64::consts::PI * 0.4,
            pitch: 0.0,
            camera_distance: CAMERA_START,
            dragging: false,
            last_pointer: None,
        }
    }
}

impl GlobeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Idle rotation for one display frame; skipped while dragging.
    pub fn frame_tick(&mut self, speed: f64) -> bool {
        if self.dragging {
            return false;
        }
        self.yaw += speed;
        true
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.dragging = true;
        self.last_pointer = Some((x, y));
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
        self.last_pointer = None;
    }

    /// Rotates by the pointer delta while a drag is active.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !self.dragging {
            return;
        }
        if let Some((px, py)) = self.last_pointer {
            self.yaw += (x - px) * DRAG_SENSITIVITY;
            self.pitch = (self.pitch + (y - py) * DRAG_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.last_pointer = Some((x, y));
    }

    pub fn zoom(&mut self, delta: f64) {
        self.camera_distance =
            (self.camera_distance + delta * ZOOM_SENSITIVITY).clamp(CAMERA_MIN, CAMERA_MAX);
    }

    /// Screen radius of the unit sphere relative to the starting camera.
    pub fn scale(&self) -> f64 {
        CAMERA_START / self.camera_distance
    }

    /// Applies yaw then pitch to a globe-space point.
    pub fn rotate(&self, point: Vec3) -> Vec3 {
        let (sin_y, cos_y) = self.yaw.sin_cos();
        let x = point.x * cos_y + point.z * sin_y;
        let z = -point.x * sin_y + point.z * cos_y;
        let (sin_p, cos_p) = self.pitch.sin_cos();
        let y = point.y * cos_p - z * sin_p;
        let z = point.y * sin_p + z * cos_p;
        Vec3::new(x, y, z)
    }

    /// Orthographic projection to unit screen space scaled by camera distance.
    ///
    /// Returns `None` for points on the far hemisphere.
    pub fn project(&self, point: Vec3) -> Option<(f64, f64)> {
        let rotated = self.rotate(point);
        if rotated.z < 0.0 {
            return None;
        }
        let scale = self.scale();
        Some((rotated.x * scale, -rotated.y * scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_rotation_pauses_while_dragging() {
        let mut view = GlobeView::new();
        let start = view.yaw;
        assert!(view.frame_tick(ROTATION_SPEED));
        assert!((view.yaw - start - ROTATION_SPEED).abs() < 1e-12);

        view.pointer_down(10.0, 10.0);
        assert!(view.is_dragging());
        let held = view.yaw;
        assert!(!view.frame_tick(ROTATION_SPEED));
        assert_eq!(view.yaw, held);

        view.pointer_up();
        assert!(!view.is_dragging());
        assert!(view.frame_tick(ROTATION_SPEED));
    }

    #[test]
    fn drag_pitch_is_clamped() {
        let mut view = GlobeView::new();
        view.pointer_down(0.0, 0.0);
        view.pointer_moved(0.0, 10_000.0);
        assert_eq!(view.pitch, 1.2);
        view.pointer_moved(0.0, -20_000.0);
        assert_eq!(view.pitch, -1.2);
    }

    #[test]
    fn moves_without_drag_are_ignored() {
        let mut view = GlobeView::new();
        let before = view.clone();
        view.pointer_moved(50.0, 50.0);
        assert_eq!(view, before);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = GlobeView::new();
        view.zoom(10_000.0);
        assert_eq!(view.camera_distance, 5.0);
        view.zoom(-10_000.0);
        assert_eq!(view.camera_distance, 1.5);
    }

    #[test]
    fn far_side_points_are_hidden() {
        let view = GlobeView {
            yaw: 0.0,
            ..GlobeView::new()
        };
        assert!(view.project(Vec3::new(0.0, 0.0, 1.0)).is_some());
        assert!(view.project(Vec3::new(0.0, 0.0, -1.0)).is_none());
    }
}
