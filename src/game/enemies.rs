use std::time::Duration;

use serde::{
    Deserialize,
    Serialize
};

use super::{
    entity::{
        Animation,
        FrameContext,
        ANIMATION_SPEED
    },
    math::{
        Rect2F,
        Vector2F
    },
    timer::Timer
};

pub const TOOTH_SIZE: Vector2F = Vector2F { x: 64.0, y: 40.0 };
pub const TOOTH_SPEED: f32 = 200.0;
const TOOTH_FRAMES: usize = 4;
const TOOTH_REVERSE_DEBOUNCE_MS: u64 = 500;

pub const SHOOTER_SIZE: Vector2F = Vector2F { x: 64.0, y: 64.0 };
pub const SHOOTER_RANGE: f32 = 500.0;
pub const SHOOTER_VERTICAL_TOLERANCE: f32 = 30.0;
const SHOOTER_COOLDOWN_MS: u64 = 3000;

const PROJECTILE_LIFETIME_MS: u64 = 5000;
const PROJECTILE_REVERSE_DEBOUNCE_MS: u64 = 500;

/// Walks along a ledge, turning at walls and drop-offs.
#[derive(Debug, Clone)]
pub struct Tooth {
    pub rect: Rect2F,
    direction: f32,
    speed: f32,
    pub animation: Animation,
    hit_timer: Timer,
}

impl Tooth {
    pub fn new(top_left: Vector2F, direction: f32) -> Self {
        Self {
            rect: Rect2F::new(top_left.x, top_left.y, TOOTH_SIZE.x, TOOTH_SIZE.y),
            direction: if direction < 0.0 { -1.0 } else { 1.0 },
            speed: TOOTH_SPEED,
            animation: Animation::new(TOOTH_FRAMES),
            hit_timer: Timer::from_millis(TOOTH_REVERSE_DEBOUNCE_MS),
        }
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// Deflection from a player attack, at most once per debounce window.
    pub fn reverse(&mut self, now: Duration) -> bool {
        if self.hit_timer.is_active() {
            return false;
        }
        self.direction *= -1.0;
        self.hit_timer.start(now);
        true
    }

    pub fn update(&mut self, ctx: &FrameContext, terrain: &[Rect2F]) {
        self.hit_timer.update(ctx.now);
        self.animation.advance(ctx.dt);

        self.rect.pos.x += self.direction * self.speed * ctx.dt;

        let floor_ahead_right = Rect2F::new(self.rect.right(), self.rect.bottom(), 1.0, 1.0);
        let floor_ahead_left = Rect2F::new(self.rect.left() - 1.0, self.rect.bottom(), 1.0, 1.0);
        let wall_band = Rect2F::new(self.rect.left() - 1.0, self.rect.top(), self.rect.size.x + 2.0, 2.0);

        let hits = |probe: &Rect2F| terrain.iter().any(|r| r.intersects(probe));

        let ledge_right = self.direction > 0.0 && !hits(&floor_ahead_right);
        let ledge_left = self.direction < 0.0 && !hits(&floor_ahead_left);
        if ledge_right || ledge_left || hits(&wall_band) {
            self.direction *= -1.0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShooterKind {
    Shell,
    Cannon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Pearl,
    Cannonball,
}

impl ShooterKind {
    pub fn sprite(&self) -> &'static str {
        match self {
            ShooterKind::Shell => "shell",
            ShooterKind::Cannon => "cannon",
        }
    }

    pub fn projectile(&self) -> ProjectileKind {
        match self {
            ShooterKind::Shell => ProjectileKind::Pearl,
            ShooterKind::Cannon => ProjectileKind::Cannonball,
        }
    }

    /// Frame of the fire animation on which the projectile leaves.
    pub fn fire_frame(&self) -> usize {
        match self {
            ShooterKind::Shell => 3,
            ShooterKind::Cannon => 5,
        }
    }

    fn frame_count(&self, state: ShooterState) -> usize {
        match (self, state) {
            (ShooterKind::Shell, ShooterState::Idle) => 7,
            (ShooterKind::Shell, ShooterState::Fire) => 6,
            (ShooterKind::Cannon, ShooterState::Idle) => 4,
            (ShooterKind::Cannon, ShooterState::Fire) => 8,
        }
    }
}

impl ProjectileKind {
    pub fn sprite(&self) -> &'static str {
        match self {
            ProjectileKind::Pearl => "pearl",
            ProjectileKind::Cannonball => "cannonball",
        }
    }

    pub fn size(&self) -> Vector2F {
        match self {
            ProjectileKind::Pearl => Vector2F::new(16.0, 16.0),
            ProjectileKind::Cannonball => Vector2F::new(20.0, 20.0),
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            ProjectileKind::Pearl => 150.0,
            ProjectileKind::Cannonball => 200.0,
        }
    }

    /// Offset from the shooter's center, x is mirrored by the launch direction.
    fn muzzle_offset(&self) -> Vector2F {
        match self {
            ProjectileKind::Pearl => Vector2F::new(45.0, 7.0),
            ProjectileKind::Cannonball => Vector2F::new(49.0, -5.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShooterState {
    Idle,
    Fire,
}

impl ShooterState {
    pub fn name(&self) -> &'static str {
        match self {
            ShooterState::Idle => "idle",
            ShooterState::Fire => "fire",
        }
    }
}

/// Request raised by a shooter, the level turns it into a projectile entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    pub kind: ProjectileKind,
    pub origin: Vector2F,
    pub direction: f32,
}

/// Stationary turret firing along its facing when the player lines up.
#[derive(Debug, Clone)]
pub struct Shooter {
    pub kind: ShooterKind,
    pub rect: Rect2F,
    facing: f32,
    state: ShooterState,
    frame_cursor: f32,
    shoot_timer: Timer,
    has_fired: bool,
}

impl Shooter {
    pub fn new(kind: ShooterKind, top_left: Vector2F, facing_left: bool) -> Self {
        Self {
            kind,
            rect: Rect2F::new(top_left.x, top_left.y, SHOOTER_SIZE.x, SHOOTER_SIZE.y),
            facing: if facing_left { -1.0 } else { 1.0 },
            state: ShooterState::Idle,
            frame_cursor: 0.0,
            shoot_timer: Timer::from_millis(SHOOTER_COOLDOWN_MS),
            has_fired: false,
        }
    }

    pub fn state(&self) -> ShooterState {
        self.state
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn frame(&self) -> usize {
        let count = self.kind.frame_count(self.state);
        (self.frame_cursor as usize).min(count - 1)
    }

    fn player_in_sight(&self, player_center: Vector2F) -> bool {
        let center = self.rect.center();
        let near = center.distance_to(player_center) < SHOOTER_RANGE;
        let in_front = if self.facing > 0.0 {
            center.x < player_center.x
        } else {
            center.x > player_center.x
        };
        let level = (center.y - player_center.y).abs() < SHOOTER_VERTICAL_TOLERANCE;
        near && in_front && level
    }

    pub fn update(&mut self, ctx: &FrameContext, player_center: Vector2F) -> Option<ProjectileSpawn> {
        self.shoot_timer.update(ctx.now);

        if self.player_in_sight(player_center) && !self.shoot_timer.is_active() {
            log::debug!("{} opens fire", self.kind.sprite());
            self.state = ShooterState::Fire;
            self.frame_cursor = 0.0;
            self.shoot_timer.start(ctx.now);
        }

        let mut spawn = None;
        self.frame_cursor += ANIMATION_SPEED * ctx.dt;

        // The fire animation plays once, it does not loop.
        if self.frame_cursor < self.kind.frame_count(self.state) as f32 {
            if self.state == ShooterState::Fire && self.frame_cursor as usize >= self.kind.fire_frame() && !self.has_fired {
                spawn = Some(ProjectileSpawn {
                    kind: self.kind.projectile(),
                    origin: self.rect.center(),
                    direction: self.facing,
                });
                self.has_fired = true;
            }
        } else {
            self.frame_cursor = 0.0;
            if self.state == ShooterState::Fire {
                self.state = ShooterState::Idle;
                self.has_fired = false;
            }
        }

        spawn
    }
}

/// Pearl or cannonball flying straight along its launch direction.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub rect: Rect2F,
    direction: f32,
    speed: f32,
    lifetime: Timer,
    reverse_timer: Timer,
}

impl Projectile {
    pub fn new(spawn: &ProjectileSpawn, now: Duration) -> Self {
        let offset = spawn.kind.muzzle_offset();
        let center = spawn.origin + Vector2F::new(offset.x * spawn.direction, offset.y);
        let mut lifetime = Timer::from_millis(PROJECTILE_LIFETIME_MS);
        lifetime.start(now);

        Self {
            kind: spawn.kind,
            rect: Rect2F::from_center(center, spawn.kind.size()),
            direction: spawn.direction,
            speed: spawn.kind.speed(),
            lifetime,
            reverse_timer: Timer::from_millis(PROJECTILE_REVERSE_DEBOUNCE_MS),
        }
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn reverse(&mut self, now: Duration) -> bool {
        if self.reverse_timer.is_active() {
            return false;
        }
        self.direction *= -1.0;
        self.reverse_timer.start(now);
        true
    }

    /// Moves the projectile, returns `false` once its lifetime ran out.
    pub fn update(&mut self, ctx: &FrameContext) -> bool {
        self.lifetime.update(ctx.now);
        self.reverse_timer.update(ctx.now);

        self.rect.pos.x += self.direction * self.speed * ctx.dt;
        self.lifetime.is_active()
    }
}
