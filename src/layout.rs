//! Static dressing of the diorama: props scattered on a ring in front of the cabin and the
//! three piles they can be carried to. Placement draws from an injected RNG so a seed
//! reproduces the same scene.

use crate::config::{AppConfig, RelocationConfig, ScatterConfig};
use crate::ecs::PropCategory;
use glam::{EulerRot, Quat, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropPlacement {
    pub category: PropCategory,
    pub translation: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DioramaLayout {
    pub props: Vec<PropPlacement>,
    pub pile_pieces: Vec<PropPlacement>,
    pub firefly_count: usize,
}

impl DioramaLayout {
    pub fn scatter<R: Rng + ?Sized>(
        scatter: &ScatterConfig,
        relocation: &RelocationConfig,
        firefly_count: usize,
        rng: &mut R,
    ) -> Self {
        let mut layout = Self { firefly_count, ..Self::default() };
        for category in PropCategory::ALL {
            for _ in 0..scatter.props_per_category {
                let radius = scatter.ring_inner_radius + rng.gen::<f32>() * scatter.ring_width;
                let angle = rng.gen::<f32>() * PI - 1.6;
                let ground = Vec2::new(angle.sin() * radius, angle.cos() * radius);
                layout.props.push(place(category, ground, rng));
            }
        }
        for category in PropCategory::ALL {
            let Some(anchor) = relocation.anchor(category) else {
                continue;
            };
            let (inner, spread) = pile_spread(category);
            for _ in 0..scatter.pile_count(category) {
                let radius = inner + rng.gen::<f32>() * spread;
                let angle = rng.gen::<f32>() * TAU;
                let ground = anchor + Vec2::new(angle.sin() * radius, angle.cos() * radius);
                layout.pile_pieces.push(place(category, ground, rng));
            }
        }
        layout
    }

    pub fn seeded(config: &AppConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::scatter(&config.scatter, &config.relocation, config.fireflies.count, &mut rng)
    }

    pub fn props_of(&self, category: PropCategory) -> impl Iterator<Item = &PropPlacement> + '_ {
        self.props.iter().filter(move |placement| placement.category == category)
    }
}

fn pile_spread(category: PropCategory) -> (f32, f32) {
    match category {
        PropCategory::Log => (0.07, 0.5),
        PropCategory::Gypsum => (0.04, 0.4),
        PropCategory::Brick => (0.01, 0.2),
    }
}

fn place<R: Rng + ?Sized>(category: PropCategory, ground: Vec2, rng: &mut R) -> PropPlacement {
    let (height, rotation) = match category {
        PropCategory::Brick => {
            let height = 0.01 + rng.gen::<f32>() / 10.0;
            let yaw = (rng.gen::<f32>() - 0.5) * 0.3;
            let pitch = (rng.gen::<f32>() - 0.5) * 0.2;
            let roll = (rng.gen::<f32>() - 0.5) * 0.15;
            (height, Quat::from_euler(EulerRot::XYZ, pitch, yaw, roll))
        }
        // Lying on their side, spun at random around their long axis.
        PropCategory::Log | PropCategory::Gypsum => {
            let spin = rng.gen::<f32>() * TAU;
            (0.1, Quat::from_euler(EulerRot::XYZ, FRAC_PI_2, 0.0, spin))
        }
    };
    PropPlacement { category, translation: Vec3::new(ground.x, height, ground.y), rotation }
}
