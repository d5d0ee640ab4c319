use crate::ecs::PropCategory;
use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec2;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoHover,
    MissingAnchor(PropCategory),
    StaleReference,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoHover => f.write_str("nothing hovered"),
            SkipReason::MissingAnchor(category) => write!(f, "no pile anchor for {category}"),
            SkipReason::StaleReference => f.write_str("hovered prop no longer exists"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DioramaEvent {
    HoverEntered { entity: Entity, category: PropCategory },
    HoverExited { entity: Entity },
    RelocationStarted { entity: Entity, category: PropCategory, anchor: Vec2 },
    RelocationSkipped { reason: SkipReason },
    TimelineFinished { elapsed: f32 },
}

impl fmt::Display for DioramaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DioramaEvent::HoverEntered { entity, category } => {
                write!(f, "HoverEntered entity={} category={}", entity.index(), category)
            }
            DioramaEvent::HoverExited { entity } => write!(f, "HoverExited entity={}", entity.index()),
            DioramaEvent::RelocationStarted { entity, category, anchor } => write!(
                f,
                "RelocationStarted entity={} category={} anchor=({:.2}, {:.2})",
                entity.index(),
                category,
                anchor.x,
                anchor.y
            ),
            DioramaEvent::RelocationSkipped { reason } => write!(f, "RelocationSkipped reason={reason}"),
            DioramaEvent::TimelineFinished { elapsed } => write!(f, "TimelineFinished elapsed={elapsed:.2}"),
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<DioramaEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: DioramaEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<DioramaEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
