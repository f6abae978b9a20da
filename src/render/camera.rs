use glam::{Mat4, Vec3};

const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
const Z_NEAR: f32 = 0.05;
const ORBIT_SENSITIVITY: f32 = 0.008;
const PAN_SENSITIVITY: f32 = 0.0015;
const ZOOM_STEP: f32 = 0.1;
const MIN_DISTANCE: f32 = 0.2;
const MAX_DISTANCE: f32 = 200.0;
const PITCH_LIMIT: f32 = 1.45;

/// Pointer gesture currently steering the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragGesture {
    Orbit,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct CameraPose {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
}

/// Orbit rig: yaw/pitch/distance around a target point, with drag
/// orbit/pan, wheel zoom, and a stored home pose for reset.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    home: CameraPose,
    drag: Option<DragGesture>,
}

impl OrbitCamera {
    pub fn new() -> Self {
        let pose = CameraPose {
            target: Vec3::new(0.0, 1.0, 0.0),
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: -0.3,
            distance: 4.0,
        };
        Self {
            target: pose.target,
            yaw: pose.yaw,
            pitch: pose.pitch,
            distance: pose.distance,
            home: pose,
            drag: None,
        }
    }

    /// Re-targets the rig to frame the given bounds, keeping the current
    /// orientation, and records the result as the new home pose.
    pub fn frame_bounds(&mut self, center: Vec3, half_extent: Vec3) {
        let radius = half_extent.x.max(half_extent.y).max(half_extent.z);
        self.target = center;
        self.distance = if radius > 0.0 { radius * 3.0 } else { 3.0 };
        self.home = self.pose();
    }

    pub fn reset(&mut self) {
        let home = self.home;
        self.target = home.target;
        self.yaw = home.yaw;
        self.pitch = home.pitch;
        self.distance = home.distance;
    }

    pub fn begin_drag(&mut self, gesture: DragGesture) {
        self.drag = Some(gesture);
    }

    /// Ends the active gesture; returns whether one was in progress.
    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Applies a pointer delta (pixels) to the active gesture.
    pub fn drag_by(&mut self, dx: f32, dy: f32) {
        match self.drag {
            Some(DragGesture::Orbit) => {
                self.yaw -= dx * ORBIT_SENSITIVITY;
                self.pitch = (self.pitch + dy * ORBIT_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
                self.yaw = wrap_angle(self.yaw);
            }
            Some(DragGesture::Pan) => {
                let (_, right, up) = self.basis();
                let scale = self.distance * PAN_SENSITIVITY;
                self.target -= right * (dx * scale);
                self.target += up * (dy * scale);
            }
            None => {}
        }
    }

    /// Wheel zoom in discrete steps; positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * (1.0 - steps * ZOOM_STEP)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn eye(&self) -> Vec3 {
        let (forward, _, _) = self.basis();
        self.target - forward * self.distance
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let far = (self.distance * 20.0).max(200.0);
        let projection = Mat4::perspective_rh(FOV_Y, aspect.max(1e-3), Z_NEAR, far);
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        projection * view
    }

    fn pose(&self) -> CameraPose {
        CameraPose {
            target: self.target,
            yaw: self.yaw,
            pitch: self.pitch,
            distance: self.distance,
        }
    }

    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let cos_pitch = self.pitch.cos();
        let forward = Vec3::new(
            self.yaw.cos() * cos_pitch,
            self.pitch.sin(),
            self.yaw.sin() * cos_pitch,
        );
        let right = Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos());
        let up = right.cross(forward).normalize_or_zero();
        (forward, right, up)
    }
}

fn wrap_angle(angle: f32) -> f32 {
    const TWO_PI: f32 = std::f32::consts::TAU;
    if angle.is_finite() {
        (angle + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{DragGesture, OrbitCamera, MAX_DISTANCE, MIN_DISTANCE, PITCH_LIMIT};
    use glam::Vec3;

    #[test]
    fn default_pose_is_finite() {
        let camera = OrbitCamera::new();
        let vp = camera.view_proj(16.0 / 9.0);
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
        assert!(camera.eye().is_finite());
    }

    #[test]
    fn orbit_drag_clamps_pitch_and_wraps_yaw() {
        let mut camera = OrbitCamera::new();
        camera.begin_drag(DragGesture::Orbit);
        camera.drag_by(10_000.0, 10_000.0);
        assert!(camera.pitch <= PITCH_LIMIT);
        assert!(camera.yaw.abs() <= std::f32::consts::PI + 1e-3);
        assert!(camera.end_drag());
    }

    #[test]
    fn pan_drag_moves_the_target_only() {
        let mut camera = OrbitCamera::new();
        let yaw = camera.yaw;
        let distance = camera.distance;
        camera.begin_drag(DragGesture::Pan);
        camera.drag_by(50.0, -30.0);
        assert_ne!(camera.target, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.yaw, yaw);
        assert_eq!(camera.distance, distance);
    }

    #[test]
    fn zoom_stays_within_the_distance_clamp() {
        let mut camera = OrbitCamera::new();
        for _ in 0..200 {
            camera.zoom(1.0);
        }
        assert!(camera.distance >= MIN_DISTANCE);
        for _ in 0..200 {
            camera.zoom(-1.0);
        }
        assert!(camera.distance <= MAX_DISTANCE);
    }

    #[test]
    fn reset_returns_to_the_framed_home() {
        let mut camera = OrbitCamera::new();
        camera.frame_bounds(Vec3::new(0.0, 1.2, 0.0), Vec3::new(0.4, 0.9, 0.3));
        let framed_target = camera.target;
        let framed_distance = camera.distance;

        camera.begin_drag(DragGesture::Orbit);
        camera.drag_by(120.0, -40.0);
        camera.end_drag();
        camera.zoom(3.0);

        camera.reset();
        assert_eq!(camera.target, framed_target);
        assert_eq!(camera.distance, framed_distance);
        assert_eq!(camera.pitch, -0.3);
    }

    #[test]
    fn drag_without_a_gesture_is_inert() {
        let mut camera = OrbitCamera::new();
        let before = camera.view_proj(1.0);
        camera.drag_by(25.0, 25.0);
        assert_eq!(before, camera.view_proj(1.0));
        assert!(!camera.end_drag());
    }
}
