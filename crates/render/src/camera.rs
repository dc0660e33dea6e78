use glam::{Mat4, Vec3};

/// Orbit camera circling a target point, with damped rotation and zoom.
///
/// Camera motion lives outside the simulation: it is never stepped by the
/// physics world and never reset by a lab rebuild unless the lab replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Angle around the Y axis, radians.
    pub yaw: f32,
    /// Elevation above the XZ plane, radians.
    pub pitch: f32,
    /// Vertical field of view, degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    pub damping: Option<f32>,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

impl OrbitCamera {
    const MIN_DISTANCE: f32 = 0.5;
    const PITCH_LIMIT: f32 = 1.55;

    /// Camera at `eye` looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(Self::MIN_DISTANCE);
        Self {
            target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            sensitivity: 0.005,
            damping: Some(0.05),
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let horizontal = self.distance * self.pitch.cos();
        self.target
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.distance * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    /// Queue a drag of `dx`, `dy` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_yaw -= dx * self.sensitivity;
        self.pending_pitch += dy * self.sensitivity;
    }

    /// Queue a zoom; positive moves closer.
    pub fn zoom(&mut self, amount: f32) {
        self.pending_zoom += amount;
    }

    /// Apply queued motion. Call once per frame.
    ///
    /// With damping, only a fraction of the queued motion is applied and the
    /// rest decays, giving the camera inertia.
    pub fn update(&mut self) {
        let factor = self.damping.unwrap_or(1.0);
        self.yaw += self.pending_yaw * factor;
        self.pitch = (self.pitch + self.pending_pitch * factor)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.distance = (self.distance - self.pending_zoom * factor).max(Self::MIN_DISTANCE);

        let keep = 1.0 - factor;
        self.pending_yaw *= keep;
        self.pending_pitch *= keep;
        self.pending_zoom *= keep;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_at(Vec3::new(-3.0, 3.0, 3.0), Vec3::ZERO)
    }
}
