//! Time-indexed property tweens on scene entities.
//!
//! Tweens are keyed by `(entity, channel)`: starting a tween on a channel that is already
//! being driven supersedes the running one. Nothing here owns a thread or a timer; the
//! settle pass samples every tween against the shared scene clock once per frame.

use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ease {
    #[serde(rename = "linear")]
    Linear,
    #[default]
    #[serde(rename = "power1.out")]
    Power1Out,
    #[serde(rename = "power3.out")]
    Power3Out,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t).powi(2),
            Ease::Power3Out => 1.0 - (1.0 - t).powi(4),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Ease::Linear => "linear",
            Ease::Power1Out => "power1.out",
            Ease::Power3Out => "power3.out",
        }
    }
}

/// Property of an entity a tween can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenChannel {
    /// Live material color (RGB).
    Color,
    /// Ground-plane position; x and z are driven, height is left alone.
    GroundPosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenOptions {
    pub duration: f32,
    pub delay: f32,
    pub ease: Ease,
}

impl TweenOptions {
    pub fn new(duration: f32) -> Self {
        Self { duration, delay: 0.0, ease: Ease::default() }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenHandle {
    pub entity: Entity,
    pub channel: TweenChannel,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub to: Vec3,
    pub options: TweenOptions,
    from: Option<Vec3>,
    started_at: f32,
    generation: u64,
}

impl Tween {
    pub fn started_at(&self) -> f32 {
        self.started_at
    }

    fn begins_at(&self) -> f32 {
        self.started_at + self.options.delay
    }

    fn progress(&self, now: f32) -> f32 {
        if self.options.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.begins_at()) / self.options.duration).clamp(0.0, 1.0)
    }
}

/// Result of sampling one tween at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenSample {
    /// Still inside its delay window; the property is untouched.
    Pending,
    Value(Vec3),
    /// Final value; the tween has been retired.
    Finished(Vec3),
}

#[derive(Resource, Default)]
pub struct TweenScheduler {
    active: HashMap<(Entity, TweenChannel), Tween>,
    next_generation: u64,
}

impl TweenScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a tween toward `to`. Any tween already driving the same channel
    /// of the same entity is dropped.
    pub fn start(
        &mut self,
        entity: Entity,
        channel: TweenChannel,
        to: Vec3,
        options: TweenOptions,
        now: f32,
    ) -> TweenHandle {
        self.next_generation = self.next_generation.wrapping_add(1);
        let generation = self.next_generation;
        self.active.insert((entity, channel), Tween { to, options, from: None, started_at: now, generation });
        TweenHandle { entity, channel, generation }
    }

    pub fn cancel(&mut self, entity: Entity, channel: TweenChannel) -> bool {
        self.active.remove(&(entity, channel)).is_some()
    }

    pub fn forget_entity(&mut self, entity: Entity) {
        self.active.retain(|(owner, _), _| *owner != entity);
    }

    pub fn is_active(&self, handle: TweenHandle) -> bool {
        self.active
            .get(&(handle.entity, handle.channel))
            .is_some_and(|tween| tween.generation == handle.generation)
    }

    pub fn get(&self, entity: Entity, channel: TweenChannel) -> Option<&Tween> {
        self.active.get(&(entity, channel))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn keys(&self) -> Vec<(Entity, TweenChannel)> {
        self.active.keys().copied().collect()
    }

    /// Samples the tween on `(entity, channel)` at `now`. `current` is read lazily the first
    /// time the tween leaves its delay window and becomes the start value.
    pub fn sample(
        &mut self,
        entity: Entity,
        channel: TweenChannel,
        now: f32,
        current: impl FnOnce() -> Vec3,
    ) -> Option<TweenSample> {
        let tween = self.active.get_mut(&(entity, channel))?;
        if now < tween.begins_at() {
            return Some(TweenSample::Pending);
        }
        let from = *tween.from.get_or_insert_with(current);
        let progress = tween.progress(now);
        if progress >= 1.0 {
            let to = tween.to;
            self.active.remove(&(entity, channel));
            return Some(TweenSample::Finished(to));
        }
        let eased = tween.options.ease.apply(progress);
        Some(TweenSample::Value(from.lerp(tween.to, eased)))
    }
}
