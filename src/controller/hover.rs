use crate::config::HoverConfig;
use crate::ecs::DioramaWorld;
use crate::events::DioramaEvent;
use crate::tween::{TweenChannel, TweenOptions};
use bevy_ecs::prelude::Entity;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HoverState {
    #[default]
    None,
    /// `saved_color` is the prop's base color, the value restored on exit.
    Hovering { entity: Entity, saved_color: Vec3 },
}

/// What a hover update did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTransition {
    Unchanged,
    Entered(Entity),
    Switched { from: Entity, to: Entity },
    Exited(Entity),
}

impl HoverState {
    pub fn entity(&self) -> Option<Entity> {
        match self {
            HoverState::None => None,
            HoverState::Hovering { entity, .. } => Some(*entity),
        }
    }

    pub fn saved_color(&self) -> Option<Vec3> {
        match self {
            HoverState::None => None,
            HoverState::Hovering { saved_color, .. } => Some(*saved_color),
        }
    }

    pub fn is_hovering(&self) -> bool {
        matches!(self, HoverState::Hovering { .. })
    }

    /// Feeds this frame's pick result into the state machine. A hit on an entity that no longer
    /// exists counts as no hit, and a hovered entity that vanished is cleared without touching it.
    pub fn update(&mut self, hit: Option<Entity>, world: &mut DioramaWorld, config: &HoverConfig) -> HoverTransition {
        let hit = hit.filter(|entity| world.entity_exists(*entity));

        let mut vanished = None;
        if let HoverState::Hovering { entity, .. } = *self {
            if !world.entity_exists(entity) {
                log::debug!("Hovered entity {} disappeared; clearing hover", entity.index());
                *self = HoverState::None;
                world.push_event(DioramaEvent::HoverExited { entity });
                vanished = Some(entity);
            }
        }

        let options = TweenOptions::new(config.duration).with_ease(config.ease);
        match (*self, hit) {
            (HoverState::Hovering { entity, .. }, Some(target)) if entity == target => HoverTransition::Unchanged,
            (previous, Some(target)) => {
                let switched_from = match previous {
                    HoverState::Hovering { entity, saved_color } => {
                        world.tweens_mut().cancel(entity, TweenChannel::Color);
                        world.set_prop_color(entity, saved_color);
                        world.push_event(DioramaEvent::HoverExited { entity });
                        Some(entity)
                    }
                    HoverState::None => None,
                };
                let Some(saved_color) = world.base_color(target) else {
                    *self = HoverState::None;
                    return switched_from.map_or(HoverTransition::Unchanged, HoverTransition::Exited);
                };
                world.start_tween(target, TweenChannel::Color, config.highlight_color.rgb(), options);
                *self = HoverState::Hovering { entity: target, saved_color };
                if let Some(category) = world.prop_category(target) {
                    log::debug!("Hover entered {category} entity {}", target.index());
                    world.push_event(DioramaEvent::HoverEntered { entity: target, category });
                }
                match switched_from {
                    Some(from) => HoverTransition::Switched { from, to: target },
                    None => HoverTransition::Entered(target),
                }
            }
            (HoverState::Hovering { entity, saved_color }, None) => {
                world.start_tween(entity, TweenChannel::Color, saved_color, options);
                *self = HoverState::None;
                log::debug!("Hover exited entity {}", entity.index());
                world.push_event(DioramaEvent::HoverExited { entity });
                HoverTransition::Exited(entity)
            }
            (HoverState::None, None) => vanished.map_or(HoverTransition::Unchanged, HoverTransition::Exited),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::PropCategory;
    use glam::Quat;

    fn setup() -> (DioramaWorld, Entity, Entity, HoverConfig) {
        let mut world = DioramaWorld::default();
        let log = world.spawn_prop(PropCategory::Log, Vec3::new(1.0, 0.1, 6.0), Quat::IDENTITY);
        let brick = world.spawn_prop(PropCategory::Brick, Vec3::new(-1.0, 0.05, 6.0), Quat::IDENTITY);
        (world, log, brick, HoverConfig::default())
    }

    fn settle_at(world: &mut DioramaWorld, t: f32) {
        world.set_elapsed(t);
        world.settle();
    }

    #[test]
    fn repeated_hits_do_not_restart_highlight() {
        let (mut world, log, _, config) = setup();
        let mut hover = HoverState::None;
        assert_eq!(hover.update(Some(log), &mut world, &config), HoverTransition::Entered(log));
        let first = world.tweens().get(log, TweenChannel::Color).map(|tween| tween.started_at());
        settle_at(&mut world, 0.1);
        assert_eq!(hover.update(Some(log), &mut world, &config), HoverTransition::Unchanged);
        let second = world.tweens().get(log, TweenChannel::Color).map(|tween| tween.started_at());
        assert_eq!(first, second);
        assert_eq!(hover.saved_color(), Some(PropCategory::Log.base_color()));
    }

    #[test]
    fn switching_restores_previous_color_immediately() {
        let (mut world, log, brick, config) = setup();
        let mut hover = HoverState::None;
        hover.update(Some(log), &mut world, &config);
        settle_at(&mut world, 0.1);
        assert_ne!(world.prop_color(log), Some(PropCategory::Log.base_color()));

        let transition = hover.update(Some(brick), &mut world, &config);
        assert_eq!(transition, HoverTransition::Switched { from: log, to: brick });
        assert_eq!(world.prop_color(log), Some(PropCategory::Log.base_color()));
        assert!(world.tweens().get(log, TweenChannel::Color).is_none());
        assert_eq!(hover.entity(), Some(brick));
    }

    #[test]
    fn exit_mid_highlight_restores_base_color() {
        let (mut world, log, _, config) = setup();
        let mut hover = HoverState::None;
        hover.update(Some(log), &mut world, &config);
        settle_at(&mut world, 0.05);
        assert_eq!(hover.update(None, &mut world, &config), HoverTransition::Exited(log));
        settle_at(&mut world, 0.1);
        settle_at(&mut world, 0.5);
        assert_eq!(world.prop_color(log), Some(PropCategory::Log.base_color()));
        assert!(!hover.is_hovering());
    }

    #[test]
    fn despawned_hover_target_is_cleared() {
        let (mut world, log, _, config) = setup();
        let mut hover = HoverState::None;
        hover.update(Some(log), &mut world, &config);
        world.despawn_entity(log);
        world.drain_events();
        assert_eq!(hover.update(Some(log), &mut world, &config), HoverTransition::Exited(log));
        assert_eq!(hover, HoverState::None);
        assert_eq!(world.drain_events(), vec![DioramaEvent::HoverExited { entity: log }]);
    }
}
