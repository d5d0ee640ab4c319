use crate::config::CameraConfig;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::f32::consts::{PI, TAU};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;
const POLAR_EPSILON: f32 = 1e-6;
/// Damping factors are expressed per frame at this rate.
const DAMPING_REFERENCE_HZ: f32 = 60.0;

/// Perspective camera looking at the diorama.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.eye(), config.target(), config.fov_y_degrees.to_radians(), config.near, config.far)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: PhysicalSize<u32>) -> Mat4 {
        self.projection_matrix(aspect_of(viewport)) * self.view_matrix()
    }

    /// World-space ray from the camera through a point in normalized device coordinates.
    pub fn ndc_ray(&self, ndc: Vec2, aspect: f32) -> Option<(Vec3, Vec3)> {
        let clip = Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let inv_view_proj = (self.projection_matrix(aspect) * self.view_matrix()).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let dir = ((world.truncate() / world.w) - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        Some((self.position, dir))
    }

    /// Generates a world-space ray originating from the camera through a screen-space position.
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        let ndc = screen_to_ndc(screen, viewport)?;
        self.ndc_ray(ndc, aspect_of(viewport))
    }

    pub fn project_point(&self, point: Vec3, viewport: PhysicalSize<u32>) -> Option<Vec2> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let clip = self.view_projection(viewport) * point.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * viewport.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * viewport.height as f32;
        Some(Vec2::new(x, y))
    }
}

pub fn aspect_of(viewport: PhysicalSize<u32>) -> f32 {
    if viewport.height > 0 {
        viewport.width as f32 / viewport.height as f32
    } else {
        1.0
    }
}

/// Pointer position in window pixels to NDC: `x = cx / w * 2 - 1`, `y = -cy / h * 2 + 1`.
pub fn screen_to_ndc(screen: Vec2, viewport: PhysicalSize<u32>) -> Option<Vec2> {
    if viewport.width == 0 || viewport.height == 0 {
        return None;
    }
    Some(Vec2::new(
        screen.x / viewport.width as f32 * 2.0 - 1.0,
        -(screen.y / viewport.height as f32) * 2.0 + 1.0,
    ))
}

/// Damped orbit around a fixed target. Drag feeds angular velocity, the wheel feeds a pending
/// zoom scale, and `update` integrates both with polar angle and distance clamped.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    pending_scale: f32,
    min_polar: f32,
    max_polar: f32,
    min_distance: f32,
    max_distance: f32,
    damping: f32,
    rotate_speed: f32,
    zoom_speed: f32,
}

impl OrbitControls {
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut controls = Self {
            target: config.target(),
            radius: 1.0,
            theta: 0.0,
            phi: 0.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pending_scale: 1.0,
            min_polar: config.min_polar.min(config.max_polar),
            max_polar: config.max_polar.max(config.min_polar),
            min_distance: config.min_distance.min(config.max_distance),
            max_distance: config.max_distance.max(config.min_distance),
            damping: config.damping.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
        };
        controls.look_from(config.eye());
        controls
    }

    /// Re-derives the orbit from an eye position, applying the usual clamps. Pending motion is
    /// kept so a drag started during a scripted move still resolves afterwards.
    pub fn look_from(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON || !radius.is_finite() {
            return;
        }
        self.radius = radius;
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        self.clamp();
    }

    /// Pointer drag in pixels; a drag across the full viewport height turns a full circle.
    pub fn drag(&mut self, delta: Vec2, viewport_height: u32) {
        if viewport_height == 0 {
            return;
        }
        let height = viewport_height as f32;
        self.delta_theta -= TAU * delta.x / height * self.rotate_speed;
        self.delta_phi -= TAU * delta.y / height * self.rotate_speed;
    }

    /// Wheel steps; positive values move the eye away from the target.
    pub fn zoom(&mut self, steps: f32) {
        if !steps.is_finite() || steps == 0.0 {
            return;
        }
        let step_scale = 0.95_f32.powf(self.zoom_speed);
        let per_step = if steps > 0.0 { 1.0 / step_scale } else { step_scale };
        self.pending_scale *= per_step.powf(steps.abs());
    }

    pub fn update(&mut self, dt: f32) {
        let frames = (dt.max(0.0) * DAMPING_REFERENCE_HZ).max(1.0);
        let applied = if self.damping > 0.0 { 1.0 - (1.0 - self.damping).powf(frames) } else { 1.0 };
        self.theta = (self.theta + self.delta_theta * applied) % TAU;
        self.phi += self.delta_phi * applied;
        self.delta_theta *= 1.0 - applied;
        self.delta_phi *= 1.0 - applied;
        self.radius *= self.pending_scale;
        self.pending_scale = 1.0;
        self.clamp();
    }

    fn clamp(&mut self) {
        self.phi = self.phi.clamp(self.min_polar, self.max_polar).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);
    }

    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    pub fn polar_angle(&self) -> f32 {
        self.phi
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < 1e-5 && self.delta_phi.abs() < 1e-5 && self.pending_scale == 1.0
    }

    pub fn apply_to(&self, camera: &mut Camera3D) {
        camera.position = self.eye();
        camera.target = self.target;
    }
}
