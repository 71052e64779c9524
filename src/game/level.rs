//! A playable level: entity registry, the player and the fixed per-frame sweep order.

use std::time::Duration;

use rand::seq::IndexedRandom;

use super::{
    collision::{
        Collider,
        CollisionWorld
    },
    enemies::{
        Projectile,
        ProjectileSpawn,
        Shooter,
        ShooterKind,
        Tooth
    },
    entity::{
        CollisionGroups,
        Entity,
        EntityBody,
        EntityId,
        FrameContext,
        Tile,
        ZLayer
    },
    input::InputSnapshot,
    items::{
        Pickup,
        PickupKind
    },
    math::{
        Rect2F,
        Vector2F
    },
    moving::{
        MovingPlatform,
        RadialHazard
    },
    player::Player,
    progress::{
        ProgressData,
        ProgressEvent
    }
};
use crate::{
    levels::{
        LevelDescriptor,
        SpawnDescriptor
    },
    rendering::{
        RenderFrame,
        RenderItem
    }
};

pub const SAW_SIZE: Vector2F = Vector2F { x: 64.0, y: 64.0 };
pub const SPIKE_SIZE: Vector2F = Vector2F { x: 48.0, y: 48.0 };
const SAW_FRAMES: usize = 8;
const PLATFORM_FRAMES: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("Entity {0} does not exist")]
    EntityNotExist(EntityId),
    #[error("Level '{0}' has no player spawn")]
    MissingPlayerSpawn(String),
    #[error("Level '{name}' is invalid, reason='{reason}'")]
    InvalidDescriptor {
        name: String,
        reason: String,
    },
    #[error("Could not parse level, reason='{0}'")]
    Json(#[from] serde_json::Error),
    #[error("IoError, reason='{0}'")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Projectile shattered on terrain or on the player.
    ProjectileBurst,
    PickupSparkle,
}

/// Ways a level ends, raised at most once per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    GoalReached {
        unlock: u32,
    },
    FellOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    Effect {
        kind: EffectKind,
        position: Vector2F,
    },
    Progress(ProgressEvent),
    Transition(Transition),
}

#[derive(Debug)]
pub struct Level {
    name: String,
    new_entity_id: EntityId,
    entities: Vec<Entity>,
    player: Player,
    clock: Duration,
    width: f32,
    bottom: f32,
    finish: Rect2F,
    level_unlock: u32,
    finished: bool,
}

impl Level {
    pub fn new<S: AsRef<str>>(name: S, width: f32, bottom: f32, finish: Rect2F, level_unlock: u32, player_spawn: Vector2F) -> Self {
        log::info!("Level '{}' created", name.as_ref());
        Self {
            name: name.as_ref().to_string(),
            new_entity_id: 0,
            entities: vec![],
            player: Player::new(player_spawn),
            clock: Duration::ZERO,
            width,
            bottom,
            finish,
            level_unlock,
            finished: false,
        }
    }

    pub fn from_descriptor(descriptor: &LevelDescriptor) -> Result<Self, LevelError> {
        descriptor.validate()?;
        let player_spawn = descriptor.player_spawn()
            .ok_or_else(|| LevelError::MissingPlayerSpawn(descriptor.name.clone()))?;

        let mut level = Self::new(
            &descriptor.name,
            descriptor.width,
            descriptor.bottom,
            descriptor.finish,
            descriptor.level_unlock,
            player_spawn
        );

        for rect in descriptor.solids.iter() {
            level.create_solid(*rect);
        }
        for rect in descriptor.semi_solids.iter() {
            level.create_semi_solid(*rect);
        }
        for spawn in descriptor.spawns.iter() {
            level.create_from_spawn(spawn);
        }

        log::debug!("Level '{}' populated with {} entities", level.name, level.entities.len());
        Ok(level)
    }

    fn create_from_spawn(&mut self, spawn: &SpawnDescriptor) {
        match spawn {
            SpawnDescriptor::Player { .. } => {},
            SpawnDescriptor::MovingPlatform { size, start, end, speed, solid, flip } => {
                let _ = self.create_moving_platform(*size, *start, *end, *speed, *solid, *flip);
            },
            SpawnDescriptor::Saw { start, end, speed } => {
                let _ = self.create_saw(*start, *end, *speed);
            },
            SpawnDescriptor::Spike { center, radius, speed, start_angle, end_angle } => {
                let end_angle = if *end_angle < 0.0 { None } else { Some(*end_angle) };
                let _ = self.create_spike(*center, *radius, *speed, *start_angle, end_angle);
            },
            SpawnDescriptor::Tooth { top_left, reverse } => {
                let direction = match reverse {
                    Some(true) => -1.0,
                    Some(false) => 1.0,
                    None => [-1.0, 1.0].choose(&mut rand::rng()).copied().unwrap_or(1.0),
                };
                let _ = self.create_tooth(*top_left, direction);
            },
            SpawnDescriptor::Shooter { shooter, top_left, reverse } => {
                let _ = self.create_shooter(*shooter, *top_left, *reverse);
            },
            SpawnDescriptor::Item { item, center } => {
                let _ = self.create_pickup(*item, *center);
            },
        }
    }

    pub fn create_entity(&mut self, sprite: &'static str, z: ZLayer, groups: CollisionGroups, body: EntityBody) -> EntityId {
        let new_id = self.new_entity_id;
        self.new_entity_id += 1;

        log::trace!("Entity {new_id} '{sprite}' created in {groups:?}");
        self.entities.push(Entity {
            id: new_id,
            sprite,
            z,
            groups,
            body,
        });
        new_id
    }

    pub fn create_solid(&mut self, rect: Rect2F) -> EntityId {
        self.create_entity("terrain", ZLayer::BgTiles, CollisionGroups::SOLID, EntityBody::Tile(Tile { rect }))
    }

    pub fn create_semi_solid(&mut self, rect: Rect2F) -> EntityId {
        self.create_entity("platform", ZLayer::BgTiles, CollisionGroups::SEMI_SOLID, EntityBody::Tile(Tile { rect }))
    }

    pub fn create_moving_platform(&mut self, size: Vector2F, start: Vector2F, end: Vector2F, speed: f32, solid: bool, flip: bool) -> EntityId {
        let (sprite, frames) = if flip { ("helicopter", PLATFORM_FRAMES) } else { ("boat", 1) };
        let groups = if solid { CollisionGroups::SOLID } else { CollisionGroups::SEMI_SOLID };
        let platform = MovingPlatform::new(size, start, end, speed, frames, flip);
        self.create_entity(sprite, ZLayer::Main, groups | CollisionGroups::MOVING, EntityBody::MovingPlatform(platform))
    }

    pub fn create_saw(&mut self, start: Vector2F, end: Vector2F, speed: f32) -> EntityId {
        let saw = MovingPlatform::new(SAW_SIZE, start, end, speed, SAW_FRAMES, false);
        self.create_entity("saw", ZLayer::Main, CollisionGroups::DAMAGE | CollisionGroups::MOVING, EntityBody::MovingPlatform(saw))
    }

    pub fn create_spike(&mut self, center: Vector2F, radius: f32, speed: f32, start_angle: f32, end_angle: Option<f32>) -> EntityId {
        let spike = RadialHazard::new(SPIKE_SIZE, center, radius, speed, start_angle, end_angle);
        self.create_entity("spike", ZLayer::Main, CollisionGroups::DAMAGE | CollisionGroups::MOVING, EntityBody::RadialHazard(spike))
    }

    pub fn create_tooth(&mut self, top_left: Vector2F, direction: f32) -> EntityId {
        let tooth = Tooth::new(top_left, direction);
        self.create_entity("tooth", ZLayer::Main, CollisionGroups::DAMAGE | CollisionGroups::TOOTH, EntityBody::Tooth(tooth))
    }

    pub fn create_shooter(&mut self, kind: ShooterKind, top_left: Vector2F, facing_left: bool) -> EntityId {
        let shooter = Shooter::new(kind, top_left, facing_left);
        self.create_entity(kind.sprite(), ZLayer::Main, CollisionGroups::SOLID | CollisionGroups::SHOOTER, EntityBody::Shooter(shooter))
    }

    pub fn create_pickup(&mut self, kind: PickupKind, center: Vector2F) -> EntityId {
        let pickup = Pickup::new(kind, center);
        self.create_entity(kind.sprite(), ZLayer::Main, CollisionGroups::PICKUP, EntityBody::Pickup(pickup))
    }

    fn spawn_projectile(&mut self, spawn: &ProjectileSpawn) -> EntityId {
        let projectile = Projectile::new(spawn, self.clock);
        self.create_entity(
            spawn.kind.sprite(),
            ZLayer::Main,
            CollisionGroups::DAMAGE | CollisionGroups::PROJECTILE,
            EntityBody::Projectile(projectile)
        )
    }

    pub fn remove_entity(&mut self, entity_id: EntityId) -> Result<(), LevelError> {
        let position = self.entities.iter()
            .position(|e| e.id == entity_id)
            .ok_or(LevelError::EntityNotExist(entity_id))?;
        let _ = self.entities.remove(position);
        Ok(())
    }

    pub fn get_entity_by_id(&self, entity_id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == entity_id)
    }

    pub fn get_entity_by_id_mut(&mut self, entity_id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == entity_id)
    }

    pub fn iter_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn handle_input(&mut self, input: InputSnapshot) {
        self.player.handle_input(input);
    }

    pub fn collision_world(&self) -> CollisionWorld {
        let mut world = CollisionWorld::default();
        for entity in self.entities.iter() {
            let collider = Collider {
                id: entity.id,
                rect: entity.rect(),
                old_rect: entity.old_rect(),
                velocity: entity.velocity(),
            };
            if entity.is_in(CollisionGroups::SOLID) {
                world.solids.push(collider);
            } else if entity.is_in(CollisionGroups::SEMI_SOLID) {
                world.semi_solids.push(collider);
            }
        }
        world
    }

    fn solid_rects(&self) -> Vec<Rect2F> {
        self.entities.iter()
            .filter(|e| e.is_in(CollisionGroups::SOLID))
            .map(|e| e.rect())
            .collect()
    }

    /// Advances the level by `dt` seconds.
    ///
    /// Entities move first, then the player, then projectile, damage, pickup
    /// and attack sweeps run against the new positions, and the bounds check
    /// comes last. A player standing on a moving platform follows the distance
    /// that platform moved in this same step. A finished level does not step anymore.
    pub fn step(&mut self, dt: f32, progress: &mut ProgressData) -> Vec<LevelEvent> {
        if self.finished {
            return vec![];
        }

        self.clock += Duration::from_secs_f32(dt.max(0.0));
        let ctx = FrameContext { dt, now: self.clock };
        log::trace!("Level '{}' step, now={:?}", self.name, ctx.now);

        let mut events = vec![];
        self.update_entities(&ctx);
        self.player.update(&ctx, &self.collision_world());
        self.projectile_terrain_collision(&mut events);
        self.damage_collision(progress, &mut events);
        self.pickup_collision(progress, &mut events);
        self.attack_collision();
        self.check_constraints(&mut events);
        events
    }

    fn update_entities(&mut self, ctx: &FrameContext) {
        let terrain = self.solid_rects();
        let player_center = self.player.hitbox.center();
        let mut spawns = vec![];
        let mut expired = vec![];

        for entity in self.entities.iter_mut() {
            match &mut entity.body {
                EntityBody::Tile(_) => {},
                EntityBody::MovingPlatform(platform) => platform.update(ctx),
                EntityBody::RadialHazard(hazard) => hazard.update(ctx),
                EntityBody::Tooth(tooth) => tooth.update(ctx, &terrain),
                EntityBody::Shooter(shooter) => {
                    if let Some(spawn) = shooter.update(ctx, player_center) {
                        spawns.push(spawn);
                    }
                },
                EntityBody::Projectile(projectile) => {
                    if !projectile.update(ctx) {
                        expired.push(entity.id);
                    }
                },
                EntityBody::Pickup(pickup) => pickup.update(ctx),
            }
        }

        if !expired.is_empty() {
            log::trace!("Projectiles expired: {expired:?}");
            self.entities.retain(|e| !expired.contains(&e.id));
        }
        for spawn in spawns.iter() {
            let id = self.spawn_projectile(spawn);
            log::debug!("Projectile {id} {:?} fired from {}", spawn.kind, spawn.origin);
        }
    }

    fn projectile_terrain_collision(&mut self, events: &mut Vec<LevelEvent>) {
        let terrain = self.solid_rects();
        self.entities.retain(|e| {
            if !e.is_in(CollisionGroups::PROJECTILE) {
                return true;
            }
            let rect = e.rect();
            if terrain.iter().any(|t| t.intersects(&rect)) {
                events.push(LevelEvent::Effect { kind: EffectKind::ProjectileBurst, position: rect.center() });
                false
            } else {
                true
            }
        });
    }

    fn damage_collision(&mut self, progress: &mut ProgressData, events: &mut Vec<LevelEvent>) {
        let now = self.clock;
        let player = &mut self.player;
        self.entities.retain(|e| {
            if !e.is_in(CollisionGroups::DAMAGE) {
                return true;
            }
            let rect = e.rect();
            if !rect.intersects(&player.hitbox) {
                return true;
            }

            events.extend(player.get_damage(now, progress).into_iter().map(LevelEvent::Progress));
            if e.is_in(CollisionGroups::PROJECTILE) {
                events.push(LevelEvent::Effect { kind: EffectKind::ProjectileBurst, position: rect.center() });
                false
            } else {
                true
            }
        });
    }

    fn pickup_collision(&mut self, progress: &mut ProgressData, events: &mut Vec<LevelEvent>) {
        let hitbox = self.player.hitbox;
        self.entities.retain(|e| {
            let EntityBody::Pickup(pickup) = &e.body else {
                return true;
            };
            if !pickup.rect.intersects(&hitbox) {
                return true;
            }

            log::debug!("Picked up {:?}", pickup.kind);
            events.extend(pickup.activate(progress).into_iter().map(LevelEvent::Progress));
            events.push(LevelEvent::Effect { kind: EffectKind::PickupSparkle, position: pickup.rect.center() });
            false
        });
    }

    fn attack_collision(&mut self) {
        if !self.player.is_attacking() {
            return;
        }

        let now = self.clock;
        let player = &self.player;
        let targets = self.entities.iter_mut()
            .filter(|e| e.is_in(CollisionGroups::PROJECTILE | CollisionGroups::TOOTH));
        for entity in targets {
            let rect = entity.rect();
            if rect.intersects(&player.rect) && player.is_facing(&rect) && entity.reverse(now) {
                log::debug!("Entity {} '{}' reversed by attack", entity.id, entity.sprite);
            }
        }
    }

    fn check_constraints(&mut self, events: &mut Vec<LevelEvent>) {
        self.player.clamp_horizontal(self.width);

        if self.player.hitbox.bottom() > self.bottom {
            self.finish_with(Transition::FellOut, events);
        } else if self.player.hitbox.intersects(&self.finish) {
            self.finish_with(Transition::GoalReached { unlock: self.level_unlock }, events);
        }
    }

    fn finish_with(&mut self, transition: Transition, events: &mut Vec<LevelEvent>) {
        if self.finished {
            return;
        }
        log::info!("Level '{}' finished: {transition:?}", self.name);
        self.finished = true;
        events.push(LevelEvent::Transition(transition));
    }

    pub fn render_frame(&self) -> RenderFrame {
        let mut items: Vec<RenderItem> = self.entities.iter().map(Entity::render_item).collect();
        items.push(RenderItem {
            entity: None,
            sprite: "player",
            sequence: self.player.state().name(),
            frame: self.player.frame(),
            rect: self.player.rect,
            z: ZLayer::Main,
            flip: !self.player.is_facing_right(),
        });

        let mut frame = RenderFrame {
            items,
            camera_position: self.player.rect.center(),
            player_flicker: self.player.is_invulnerable(),
        };
        frame.sort_by_layer();
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::enemies::ProjectileKind;

    const DT: f32 = 1.0 / 60.0;

    /// Flat ground at y=400 spanning the whole level, player standing on it.
    fn flat_level() -> Level {
        let mut level = Level::new(
            "Test",
            2000.0,
            600.0,
            Rect2F::new(1900.0, 300.0, 64.0, 100.0),
            3,
            Vector2F::new(100.0, 370.0)
        );
        level.create_solid(Rect2F::new(0.0, 400.0, 2000.0, 64.0));
        level
    }

    fn run(level: &mut Level, progress: &mut ProgressData, frames: usize) -> Vec<LevelEvent> {
        let mut events = vec![];
        for _ in 0..frames {
            events.extend(level.step(DT, progress));
        }
        events
    }

    #[test]
    fn test_level_entity_ids_increase() {
        let mut level = flat_level();
        let a = level.create_pickup(PickupKind::Gold, Vector2F::new(500.0, 380.0));
        let b = level.create_pickup(PickupKind::Gold, Vector2F::new(600.0, 380.0));
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(level.get_entity_by_id(b).unwrap().sprite, "gold");
    }

    #[test]
    fn test_level_remove_missing_entity_fails() {
        let mut level = flat_level();
        let id = level.create_solid(Rect2F::new(0.0, 0.0, 10.0, 10.0));
        level.remove_entity(id).unwrap();
        assert!(matches!(level.remove_entity(id), Err(LevelError::EntityNotExist(i)) if i == id));
    }

    #[test]
    fn test_level_collision_world_partitions_groups() {
        let mut level = flat_level();
        level.create_semi_solid(Rect2F::new(0.0, 200.0, 100.0, 10.0));
        level.create_shooter(ShooterKind::Shell, Vector2F::new(800.0, 336.0), false);
        level.create_tooth(Vector2F::new(300.0, 360.0), 1.0);

        let world = level.collision_world();
        assert_eq!(world.solids.len(), 2);
        assert_eq!(world.semi_solids.len(), 1);
    }

    #[test]
    fn test_level_pickup_is_collected_once() {
        let mut level = flat_level();
        let mut progress = ProgressData::new();
        level.create_pickup(PickupKind::Diamond, Vector2F::new(100.0, 380.0));

        let events = run(&mut level, &mut progress, 2);
        assert_eq!(progress.coins(), 20);
        assert!(events.contains(&LevelEvent::Progress(ProgressEvent::CoinsChanged { coins: 20 })));
        assert!(events.iter().any(|e| matches!(e, LevelEvent::Effect { kind: EffectKind::PickupSparkle, .. })));
        assert!(!level.iter_entities().any(|e| e.is_in(CollisionGroups::PICKUP)));
    }

    #[test]
    fn test_level_hazard_damage_respects_hit_stun() {
        let mut level = flat_level();
        let mut progress = ProgressData::new();
        level.create_spike(Vector2F::new(100.0, 370.0), 0.0, 0.0, 0.0, None);

        run(&mut level, &mut progress, 10);
        assert_eq!(progress.health(), 4);
        assert!(level.render_frame().player_flicker);

        // Hit-stun lasts 750 ms.
        run(&mut level, &mut progress, 50);
        assert_eq!(progress.health(), 3);
    }

    #[test]
    fn test_level_projectile_bursts_on_terrain() {
        let mut level = flat_level();
        let mut progress = ProgressData::new();
        level.create_solid(Rect2F::new(1000.0, 300.0, 64.0, 100.0));
        let spawn = ProjectileSpawn {
            kind: ProjectileKind::Pearl,
            origin: Vector2F::new(900.0, 340.0),
            direction: 1.0,
        };
        level.spawn_projectile(&spawn);

        let events = run(&mut level, &mut progress, 60);
        assert!(events.iter().any(|e| matches!(e, LevelEvent::Effect { kind: EffectKind::ProjectileBurst, .. })));
        assert!(!level.iter_entities().any(|e| e.is_in(CollisionGroups::PROJECTILE)));
        assert_eq!(progress.health(), 5);
    }

    #[test]
    fn test_level_goal_is_reported_once() {
        let mut level = Level::new(
            "Goal",
            2000.0,
            600.0,
            Rect2F::new(80.0, 300.0, 64.0, 100.0),
            3,
            Vector2F::new(100.0, 370.0)
        );
        level.create_solid(Rect2F::new(0.0, 400.0, 2000.0, 64.0));
        let mut progress = ProgressData::new();

        let events = run(&mut level, &mut progress, 30);
        let goals: Vec<_> = events.iter()
            .filter(|e| matches!(e, LevelEvent::Transition(_)))
            .collect();
        assert_eq!(goals, vec![&LevelEvent::Transition(Transition::GoalReached { unlock: 3 })]);
        assert!(level.is_finished());
    }

    /// Empty level without ground, the player spawned standing on top of `platform_top`.
    fn open_level(player_x: f32, platform_top: f32) -> Level {
        Level::new(
            "Open",
            2000.0,
            2000.0,
            Rect2F::new(1900.0, 0.0, 64.0, 100.0),
            1,
            Vector2F::new(player_x, platform_top - 30.0)
        )
    }

    #[test]
    fn test_level_player_rides_lift_down_and_up() {
        let mut level = open_level(100.0, 290.0);
        let mut progress = ProgressData::new();
        let lift = level.create_moving_platform(
            Vector2F::new(200.0, 20.0),
            Vector2F::new(100.0, 300.0),
            Vector2F::new(100.0, 1300.0),
            200.0,
            true,
            false
        );
        let lift_top = |level: &Level| level.get_entity_by_id(lift).unwrap().rect().top();

        // The lift starts down at full speed, the player catches up with it in free fall.
        run(&mut level, &mut progress, 60);

        let mut lowest = lift_top(&level);
        let mut rose = 0;
        for frame in 0..700 {
            let before = lift_top(&level);
            level.step(DT, &mut progress);
            let top = lift_top(&level);
            if top < before {
                rose += 1;
            }
            lowest = lowest.max(top);

            let player = level.player();
            assert!(player.contact().floor, "frame {frame}: airborne on the lift");
            assert_eq!(player.contact().platform, Some(lift));
            assert!((player.hitbox.bottom() - top).abs() <= 2.0, "frame {frame}: bottom={} top={top}", player.hitbox.bottom());
        }
        assert_eq!(lowest, 1280.0);
        assert!(rose > 250, "rose={rose}");
        assert!(!level.is_finished());
    }

    #[test]
    fn test_level_player_rides_boat_both_ways() {
        let mut level = open_level(300.0, 290.0);
        let mut progress = ProgressData::new();
        let boat = level.create_moving_platform(
            Vector2F::new(200.0, 20.0),
            Vector2F::new(300.0, 300.0),
            Vector2F::new(900.0, 300.0),
            150.0,
            false,
            false
        );
        let boat_rect = |level: &Level| level.get_entity_by_id(boat).unwrap().rect();

        run(&mut level, &mut progress, 10);
        let offset = level.player().hitbox.center().x - boat_rect(&level).center().x;

        let mut went_left = false;
        for frame in 0..400 {
            let before = boat_rect(&level).left();
            level.step(DT, &mut progress);
            let rect = boat_rect(&level);
            went_left |= rect.left() < before;

            let player = level.player();
            assert!(player.contact().floor, "frame {frame}: airborne on the boat");
            assert!((player.hitbox.bottom() - rect.top()).abs() <= 2.0);
            assert!((player.hitbox.center().x - rect.center().x - offset).abs() < 0.1, "frame {frame}: slid on the boat");
        }
        assert!(went_left);
    }

    #[test]
    fn test_level_render_frame_is_layered() {
        let mut level = flat_level();
        level.create_pickup(PickupKind::Gold, Vector2F::new(500.0, 380.0));
        level.create_solid(Rect2F::new(0.0, 0.0, 10.0, 10.0));

        let frame = level.render_frame();
        assert_eq!(frame.items.len(), 4);
        assert!(frame.items.windows(2).all(|w| w[0].z <= w[1].z));
        assert!(frame.items.iter().any(|i| i.sprite == "player" && i.entity.is_none()));
    }
}
