use super::HoverState;
use crate::config::RelocationConfig;
use crate::ecs::{DioramaWorld, PropCategory};
use crate::events::{DioramaEvent, SkipReason};
use crate::tween::{TweenChannel, TweenHandle, TweenOptions};
use bevy_ecs::prelude::Entity;
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelocationOutcome {
    Started { entity: Entity, category: PropCategory, anchor: Vec2, handle: TweenHandle },
    Skipped(SkipReason),
}

impl RelocationOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, RelocationOutcome::Started { .. })
    }
}

/// Carries the hovered prop to the pile of its category on confirm.
#[derive(Debug, Clone)]
pub struct RelocationController {
    config: RelocationConfig,
}

impl RelocationController {
    pub fn new(config: RelocationConfig) -> Self {
        Self { config }
    }

    pub fn anchor(&self, category: PropCategory) -> Option<Vec2> {
        self.config.anchor(category)
    }

    pub fn confirm(&self, hover: &HoverState, world: &mut DioramaWorld) -> RelocationOutcome {
        let outcome = self.try_start(hover, world);
        let event = match outcome {
            RelocationOutcome::Started { entity, category, anchor, .. } => {
                log::debug!("Relocating {category} entity {} to ({}, {})", entity.index(), anchor.x, anchor.y);
                DioramaEvent::RelocationStarted { entity, category, anchor }
            }
            RelocationOutcome::Skipped(reason) => {
                log::debug!("Relocation skipped: {reason}");
                DioramaEvent::RelocationSkipped { reason }
            }
        };
        world.push_event(event);
        outcome
    }

    fn try_start(&self, hover: &HoverState, world: &mut DioramaWorld) -> RelocationOutcome {
        let Some(entity) = hover.entity() else {
            return RelocationOutcome::Skipped(SkipReason::NoHover);
        };
        let (Some(category), Some(current)) = (world.prop_category(entity), world.prop_translation(entity)) else {
            return RelocationOutcome::Skipped(SkipReason::StaleReference);
        };
        let Some(anchor) = self.anchor(category) else {
            return RelocationOutcome::Skipped(SkipReason::MissingAnchor(category));
        };
        let target = Vec3::new(anchor.x, current.y, anchor.y);
        let options = TweenOptions::new(self.config.duration).with_ease(self.config.ease);
        let handle = world.start_tween(entity, TweenChannel::GroundPosition, target, options);
        RelocationOutcome::Started { entity, category, anchor, handle }
    }
}
