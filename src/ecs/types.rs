use crate::color::rgb_from_hex;
use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform3D {
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation, scale: Vec3::ONE }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn ground_position(&self) -> Vec2 {
        Vec2::new(self.translation.x, self.translation.z)
    }

    pub fn set_ground_position(&mut self, ground: Vec2) {
        self.translation.x = ground.x;
        self.translation.z = ground.y;
    }
}

/// Kind of scattered prop. Also names the pile the prop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropCategory {
    Log,
    Gypsum,
    Brick,
}

impl PropCategory {
    pub const ALL: [PropCategory; 3] = [PropCategory::Log, PropCategory::Gypsum, PropCategory::Brick];

    pub fn label(self) -> &'static str {
        match self {
            PropCategory::Log => "Log",
            PropCategory::Gypsum => "Gypsum",
            PropCategory::Brick => "Brick",
        }
    }

    pub fn base_color(self) -> Vec3 {
        match self {
            PropCategory::Log => rgb_from_hex(0xcc8d48),
            PropCategory::Gypsum => rgb_from_hex(0xffffff),
            PropCategory::Brick => rgb_from_hex(0xed6327),
        }
    }

    /// Bounding shape used for picking, in the prop's local space.
    pub fn pick_shape(self) -> PickShape {
        match self {
            // Cylinder r=0.1 h=0.7 along local Y.
            PropCategory::Log => PickShape::Box { half_extents: Vec3::new(0.1, 0.35, 0.1) },
            PropCategory::Gypsum => PickShape::Sphere { radius: 0.15 },
            PropCategory::Brick => PickShape::Box { half_extents: Vec3::new(0.2, 0.1, 0.05) },
        }
    }
}

impl fmt::Display for PropCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prop {
    pub category: PropCategory,
}

/// Props that take part in hovering and relocation.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Interactive;

/// Static pieces stacked around a pile anchor. Never pickable.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PileDecoration;

/// Live material color, the value tweens write to.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct MaterialColor(pub Vec3);

/// Color snapshot taken when the prop was created.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct BaseColor(pub Vec3);

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub enum PickShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

/// Member of the ambient light group; `index` is 0-based and phases the motion path.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Firefly {
    pub index: usize,
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
}

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneElapsed(pub f32);
