use crate::ecs::types::{Firefly, SceneElapsed, Transform3D};
use crate::config::FireflyConfig;
use bevy_ecs::prelude::{Query, Res, Resource};
use glam::Vec3;

/// Parameters of the firefly loop. Every member follows the same circle, offset outward by
/// its 1-based position in the group.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FireflyPath {
    pub angle: f32,
    pub radius_step: f32,
    pub speed: f32,
    pub height: f32,
}

impl FireflyPath {
    pub fn from_config(config: &FireflyConfig) -> Self {
        Self { angle: config.angle, radius_step: config.radius_step, speed: config.speed, height: config.height }
    }

    /// Position of the member at 0-based `index` after `elapsed` seconds.
    pub fn position(&self, elapsed: f32, index: usize) -> Vec3 {
        let radius = self.radius(index);
        let phase = elapsed * self.speed;
        Vec3::new(radius + self.angle * phase.cos(), self.height, -radius + self.angle * phase.sin())
    }

    pub fn radius(&self, index: usize) -> f32 {
        self.radius_step * (index + 1) as f32
    }
}

impl Default for FireflyPath {
    fn default() -> Self {
        Self::from_config(&FireflyConfig::default())
    }
}

pub fn sys_drive_fireflies(
    elapsed: Res<SceneElapsed>,
    path: Res<FireflyPath>,
    mut fireflies: Query<(&Firefly, &mut Transform3D)>,
) {
    for (firefly, mut transform) in &mut fireflies {
        transform.translation = path.position(elapsed.0, firefly.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn neighbouring_members_differ_by_one_radius_step() {
        let path = FireflyPath::default();
        assert_eq!(path.radius(1) - path.radius(0), path.radius_step);
        assert_eq!(path.radius(0), 3.0);
    }

    #[test]
    fn start_position_matches_reference_loop() {
        let path = FireflyPath::default();
        let p = path.position(0.0, 0);
        assert!((p.x - (3.0 + PI * 0.3)).abs() < 1e-5);
        assert_eq!(p.y, 0.5);
        assert!((p.z + 3.0).abs() < 1e-5);
    }

    #[test]
    fn position_is_a_pure_function_of_time_and_index() {
        let path = FireflyPath::default();
        let a = path.position(42.5, 1);
        let _ = path.position(3.0, 1);
        assert_eq!(a, path.position(42.5, 1));
        let period = 2.0 * PI / path.speed;
        assert!((path.position(10.0 + period, 0) - path.position(10.0, 0)).length() < 1e-3);
    }
}
