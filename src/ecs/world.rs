use super::*;
use crate::config::AppConfig;
use crate::environment::{EnvironmentState, EnvironmentTimeline};
use crate::events::{DioramaEvent, EventBus};
use crate::layout::DioramaLayout;
use crate::tween::{TweenChannel, TweenHandle, TweenOptions, TweenScheduler};
use bevy_ecs::prelude::{Entity, Schedule, With, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};
use glam::{Mat4, Quat, Vec3};

/// Per-instance data the renderer needs for one prop or pile piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropInstance {
    pub entity: Entity,
    pub category: PropCategory,
    pub model: Mat4,
    pub color: Vec3,
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireflyLight {
    pub index: usize,
    pub position: Vec3,
    pub light: PointLight,
}

// ---------- World container ----------
pub struct DioramaWorld {
    pub world: World,
    schedule_ambient: Schedule,
    schedule_settle: Schedule,
}

impl Default for DioramaWorld {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl DioramaWorld {
    pub fn new(config: &AppConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(SceneElapsed::default());
        world.insert_resource(TweenScheduler::default());
        world.insert_resource(FireflyPath::from_config(&config.fireflies));
        let timeline = EnvironmentTimeline::dusk(&config.timeline, &config.camera);
        world.insert_resource(timeline.initial());
        world.insert_resource(timeline);
        world.insert_resource(EventBus::default());

        // Frame order matters more than parallelism here; both schedules run on the caller's thread.
        let mut schedule_ambient = Schedule::default();
        schedule_ambient.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule_ambient.add_systems((sys_drive_fireflies,));

        let mut schedule_settle = Schedule::default();
        schedule_settle.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule_settle.add_systems((sys_advance_tweens, sys_sample_environment).chain());

        Self { world, schedule_ambient, schedule_settle }
    }

    fn emit(&mut self, event: DioramaEvent) {
        self.world.resource_mut::<EventBus>().push(event);
    }

    pub fn drain_events(&mut self) -> Vec<DioramaEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    pub fn push_event(&mut self, event: DioramaEvent) {
        self.emit(event);
    }

    pub fn spawn_prop(&mut self, category: PropCategory, translation: Vec3, rotation: Quat) -> Entity {
        let color = category.base_color();
        self.world
            .spawn((
                Transform3D::from_translation_rotation(translation, rotation),
                Prop { category },
                Interactive,
                MaterialColor(color),
                BaseColor(color),
                category.pick_shape(),
            ))
            .id()
    }

    pub fn spawn_pile_piece(&mut self, category: PropCategory, translation: Vec3, rotation: Quat) -> Entity {
        let color = category.base_color();
        self.world
            .spawn((
                Transform3D::from_translation_rotation(translation, rotation),
                Prop { category },
                PileDecoration,
                MaterialColor(color),
                BaseColor(color),
            ))
            .id()
    }

    pub fn spawn_firefly(&mut self, index: usize, light: PointLight) -> Entity {
        let elapsed = self.elapsed();
        let position = self.world.resource::<FireflyPath>().position(elapsed, index);
        self.world
            .spawn((Transform3D::from_translation_rotation(position, Quat::IDENTITY), Firefly { index }, light))
            .id()
    }

    /// Spawns everything in `layout`. Returns the interactive props in spawn order.
    pub fn populate(&mut self, layout: &DioramaLayout, firefly_light: PointLight) -> Vec<Entity> {
        let props = layout
            .props
            .iter()
            .map(|placement| self.spawn_prop(placement.category, placement.translation, placement.rotation))
            .collect();
        for piece in &layout.pile_pieces {
            self.spawn_pile_piece(piece.category, piece.translation, piece.rotation);
        }
        for index in 0..layout.firefly_count {
            self.spawn_firefly(index, firefly_light);
        }
        props
    }

    pub fn elapsed(&self) -> f32 {
        self.world.resource::<SceneElapsed>().0
    }

    pub fn set_elapsed(&mut self, elapsed: f32) {
        self.world.resource_mut::<SceneElapsed>().0 = elapsed;
    }

    /// Time-driven ambience that does not depend on input (firefly loop).
    pub fn drive_ambient(&mut self) {
        self.schedule_ambient.run(&mut self.world);
    }

    /// Applies tweens and the environment timeline for the current elapsed time. Runs last
    /// in a frame so the renderer sees every change made by input handling.
    pub fn settle(&mut self) {
        self.schedule_settle.run(&mut self.world);
    }

    /// Nearest interactive prop of one of `candidates` hit by the ray, if any.
    pub fn pick_prop(&mut self, origin: Vec3, direction: Vec3, candidates: &[PropCategory]) -> Option<Entity> {
        let dir = direction.normalize_or_zero();
        if dir.length_squared() <= f32::EPSILON {
            return None;
        }
        let mut query = self.world.query_filtered::<(Entity, &Transform3D, &Prop, &PickShape), With<Interactive>>();
        let mut closest: Option<(Entity, f32)> = None;
        for (entity, transform, prop, shape) in query.iter(&self.world) {
            if !candidates.contains(&prop.category) {
                continue;
            }
            let Some(distance) = ray_hit_shape(origin, dir, transform, shape) else {
                continue;
            };
            match closest {
                Some((_, best)) if distance >= best => {}
                _ => closest = Some((entity, distance)),
            }
        }
        closest.map(|(entity, _)| entity)
    }

    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    pub fn despawn_entity(&mut self, entity: Entity) -> bool {
        self.world.resource_mut::<TweenScheduler>().forget_entity(entity);
        self.world.despawn(entity)
    }

    pub fn prop_category(&self, entity: Entity) -> Option<PropCategory> {
        self.world.get::<Prop>(entity).map(|prop| prop.category)
    }

    pub fn prop_color(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<MaterialColor>(entity).map(|color| color.0)
    }

    pub fn base_color(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<BaseColor>(entity).map(|color| color.0)
    }

    pub fn prop_translation(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Transform3D>(entity).map(|transform| transform.translation)
    }

    pub fn set_prop_color(&mut self, entity: Entity, color: Vec3) -> bool {
        if let Some(mut material) = self.world.get_mut::<MaterialColor>(entity) {
            material.0 = color;
            true
        } else {
            false
        }
    }

    pub fn tweens(&self) -> &TweenScheduler {
        self.world.resource::<TweenScheduler>()
    }

    pub fn tweens_mut(&mut self) -> bevy_ecs::prelude::Mut<'_, TweenScheduler> {
        self.world.resource_mut::<TweenScheduler>()
    }

    /// Starts a tween that begins at the current scene time.
    pub fn start_tween(
        &mut self,
        entity: Entity,
        channel: TweenChannel,
        to: Vec3,
        options: TweenOptions,
    ) -> TweenHandle {
        let now = self.elapsed();
        self.tweens_mut().start(entity, channel, to, options, now)
    }

    pub fn environment(&self) -> EnvironmentState {
        *self.world.resource::<EnvironmentState>()
    }

    pub fn timeline(&self) -> &EnvironmentTimeline {
        self.world.resource::<EnvironmentTimeline>()
    }

    pub fn prop_instances(&mut self) -> Vec<PropInstance> {
        let mut query = self.world.query::<(Entity, &Prop, &Transform3D, &MaterialColor, Option<&Interactive>)>();
        query
            .iter(&self.world)
            .map(|(entity, prop, transform, color, interactive)| PropInstance {
                entity,
                category: prop.category,
                model: transform.matrix(),
                color: color.0,
                interactive: interactive.is_some(),
            })
            .collect()
    }

    pub fn firefly_lights(&mut self) -> Vec<FireflyLight> {
        let mut query = self.world.query::<(&Firefly, &Transform3D, &PointLight)>();
        let mut lights: Vec<FireflyLight> = query
            .iter(&self.world)
            .map(|(firefly, transform, light)| FireflyLight {
                index: firefly.index,
                position: transform.translation,
                light: *light,
            })
            .collect();
        lights.sort_by_key(|light| light.index);
        lights
    }
}
