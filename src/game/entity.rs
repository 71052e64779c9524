use std::time::Duration;

use serde::{
    Deserialize,
    Serialize
};

use super::{
    enemies::{
        Projectile,
        Shooter,
        Tooth
    },
    items::Pickup,
    math::{
        Rect2F,
        Vector2F
    },
    moving::{
        MovingPlatform,
        RadialHazard
    }
};
use crate::rendering::RenderItem;

pub type EntityId = u32;

/// Animation frames advanced per second of game time.
pub const ANIMATION_SPEED: f32 = 6.0;

/// Explicit per-frame context, there is no global clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Game clock of the owning level, timers compare against it.
    pub now: Duration,
}

/// Draw order, lower layers are drawn first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZLayer {
    BgTiles,
    BgDetails,
    Main,
    Fg,
}

bitflags::bitflags! {
    /// Sweeps an entity takes part in. One entity may sit in several.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionGroups: u16 {
        const SOLID      = 1 << 0;
        const SEMI_SOLID = 1 << 1;
        const DAMAGE     = 1 << 2;
        const PROJECTILE = 1 << 3;
        const TOOTH      = 1 << 4;
        const SHOOTER    = 1 << 5;
        const PICKUP     = 1 << 6;
        const MOVING     = 1 << 7;
    }
}

/// Fractional cursor over a frame sequence of known length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    frame_count: usize,
    cursor: f32,
}

impl Animation {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count: frame_count.max(1),
            cursor: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.cursor += ANIMATION_SPEED * dt;
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Looping frame index.
    pub fn frame(&self) -> usize {
        self.cursor as usize % self.frame_count
    }
}

/// Static terrain or decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub rect: Rect2F,
}

#[derive(Debug)]
pub enum EntityBody {
    Tile(Tile),
    MovingPlatform(MovingPlatform),
    RadialHazard(RadialHazard),
    Tooth(Tooth),
    Shooter(Shooter),
    Projectile(Projectile),
    Pickup(Pickup),
}

#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,
    pub sprite: &'static str,
    pub z: ZLayer,
    pub groups: CollisionGroups,
    pub body: EntityBody,
}

impl Entity {
    pub fn rect(&self) -> Rect2F {
        match &self.body {
            EntityBody::Tile(tile) => tile.rect,
            EntityBody::MovingPlatform(platform) => platform.rect,
            EntityBody::RadialHazard(hazard) => hazard.rect,
            EntityBody::Tooth(tooth) => tooth.rect,
            EntityBody::Shooter(shooter) => shooter.rect,
            EntityBody::Projectile(projectile) => projectile.rect,
            EntityBody::Pickup(pickup) => pickup.rect,
        }
    }

    /// Rectangle at the start of the current frame.
    pub fn old_rect(&self) -> Rect2F {
        match &self.body {
            EntityBody::MovingPlatform(platform) => platform.old_rect,
            EntityBody::RadialHazard(hazard) => hazard.old_rect,
            _ => self.rect(),
        }
    }

    /// Per-second displacement of path-following entities.
    pub fn velocity(&self) -> Option<Vector2F> {
        match &self.body {
            EntityBody::MovingPlatform(platform) => Some(platform.velocity()),
            _ => None,
        }
    }

    pub fn is_in(&self, groups: CollisionGroups) -> bool {
        self.groups.intersects(groups)
    }

    /// Deflects the entity if it supports it. Returns whether it did.
    pub fn reverse(&mut self, now: Duration) -> bool {
        match &mut self.body {
            EntityBody::Tooth(tooth) => tooth.reverse(now),
            EntityBody::Projectile(projectile) => projectile.reverse(now),
            _ => false,
        }
    }

    pub fn render_item(&self) -> RenderItem {
        let (sequence, frame, flip) = match &self.body {
            EntityBody::Tile(_) => ("static", 0, false),
            EntityBody::MovingPlatform(platform) => ("idle", platform.animation.frame(), platform.is_flipped()),
            EntityBody::RadialHazard(_) => ("idle", 0, false),
            EntityBody::Tooth(tooth) => ("run", tooth.animation.frame(), tooth.direction() < 0.0),
            EntityBody::Shooter(shooter) => (shooter.state().name(), shooter.frame(), shooter.facing() < 0.0),
            EntityBody::Projectile(projectile) => ("fly", 0, projectile.direction() < 0.0),
            EntityBody::Pickup(pickup) => ("idle", pickup.animation.frame(), false),
        };

        RenderItem {
            entity: Some(self.id),
            sprite: self.sprite,
            sequence,
            frame,
            rect: self.rect(),
            z: self.z,
            flip,
        }
    }
}

#[test]
fn test_animation_loops_over_frames() {
    let mut animation = Animation::new(4);
    animation.advance(0.5);
    assert_eq!(animation.frame(), 3);
    animation.advance(0.5);
    assert_eq!(animation.frame(), 2);
}

#[test]
fn test_animation_never_has_zero_frames() {
    let animation = Animation::new(0);
    assert_eq!(animation.frame_count(), 1);
    assert_eq!(animation.frame(), 0);
}

#[test]
fn test_groups_membership_is_a_set() {
    let groups = CollisionGroups::DAMAGE | CollisionGroups::PROJECTILE;
    assert!(groups.contains(CollisionGroups::DAMAGE));
    assert!(groups.intersects(CollisionGroups::PROJECTILE | CollisionGroups::TOOTH));
    assert!(!groups.contains(CollisionGroups::SOLID));
}
