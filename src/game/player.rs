//! Player movement state machine.
//!
//! One call to [`Player::update`] runs the whole frame in a fixed order:
//! timers, input, platform carry, horizontal move and resolve, vertical
//! integration, jump, vertical resolve, contact probes, state and animation.
//!
//! Colliders have already moved when the player updates. The platform carry
//! comes before the resolve, so the previous hitbox and the platform's previous
//! rectangle stay in the same frame of reference.

use std::time::Duration;

use serde::{
    Deserialize,
    Serialize
};

use super::{
    collision::{
        self,
        Axis,
        CollisionWorld,
        Contact
    },
    entity::{
        FrameContext,
        ANIMATION_SPEED
    },
    input::InputSnapshot,
    math::{
        Rect2F,
        Vector2F
    },
    progress::{
        ProgressData,
        ProgressEvent
    },
    timer::Timer
};

pub const PLAYER_SIZE: Vector2F = Vector2F { x: 128.0, y: 96.0 };
/// Hitbox is the visual rectangle shrunk by this much on each axis.
pub const HITBOX_INSET: Vector2F = Vector2F { x: 76.0, y: 36.0 };

pub const PLAYER_SPEED: f32 = 300.0;
pub const GRAVITY: f32 = 900.0;
pub const JUMP_HEIGHT: f32 = 800.0;

const WALL_JUMP_MS: u64 = 200;
const WALL_SLIDE_BLOCK_MS: u64 = 250;
const PLATFORM_SKIP_MS: u64 = 100;
const ATTACK_BLOCK_MS: u64 = 500;
const HIT_MS: u64 = 750;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Run,
    Jump,
    Fall,
    Wall,
    Attack,
    AirAttack,
}

impl PlayerState {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Run => "run",
            PlayerState::Jump => "jump",
            PlayerState::Fall => "fall",
            PlayerState::Wall => "wall",
            PlayerState::Attack => "attack",
            PlayerState::AirAttack => "air_attack",
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            PlayerState::Idle => 5,
            PlayerState::Run => 6,
            PlayerState::Jump => 3,
            PlayerState::Fall => 1,
            PlayerState::Wall => 2,
            PlayerState::Attack => 4,
            PlayerState::AirAttack => 4,
        }
    }

    /// Display state derived from contact flags, never stored as truth.
    pub fn derive(contact: &Contact, horizontal: f32, velocity_y: f32, attacking: bool) -> Self {
        if contact.floor {
            if attacking {
                PlayerState::Attack
            } else if horizontal == 0.0 {
                PlayerState::Idle
            } else {
                PlayerState::Run
            }
        } else if attacking {
            PlayerState::AirAttack
        } else if contact.any_wall() {
            PlayerState::Wall
        } else if velocity_y < 0.0 {
            PlayerState::Jump
        } else {
            PlayerState::Fall
        }
    }
}

#[derive(Debug, Clone)]
struct PlayerTimers {
    wall_jump: Timer,
    wall_slide_block: Timer,
    platform_skip: Timer,
    attack_block: Timer,
    hit: Timer,
}

impl PlayerTimers {
    fn new() -> Self {
        Self {
            wall_jump: Timer::from_millis(WALL_JUMP_MS),
            wall_slide_block: Timer::from_millis(WALL_SLIDE_BLOCK_MS),
            platform_skip: Timer::from_millis(PLATFORM_SKIP_MS),
            attack_block: Timer::from_millis(ATTACK_BLOCK_MS),
            hit: Timer::from_millis(HIT_MS),
        }
    }

    fn update(&mut self, now: Duration) {
        self.wall_jump.update(now);
        self.wall_slide_block.update(now);
        self.platform_skip.update(now);
        self.attack_block.update(now);
        self.hit.update(now);
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub rect: Rect2F,
    pub hitbox: Rect2F,
    old_hitbox: Rect2F,
    /// `x` is the unit move direction, `y` is vertical speed.
    velocity: Vector2F,
    contact: Contact,
    timers: PlayerTimers,
    held: InputSnapshot,
    jump_requested: bool,
    attacking: bool,
    facing_right: bool,
    state: PlayerState,
    frame_cursor: f32,
}

impl Player {
    pub fn new(center: Vector2F) -> Self {
        let rect = Rect2F::from_center(center, PLAYER_SIZE);
        let hitbox = rect.inflate(-HITBOX_INSET.x, -HITBOX_INSET.y);
        Self {
            rect,
            hitbox,
            old_hitbox: hitbox,
            velocity: Vector2F::zero(),
            contact: Contact::default(),
            timers: PlayerTimers::new(),
            held: InputSnapshot::default(),
            jump_requested: false,
            attacking: false,
            facing_right: true,
            state: PlayerState::Idle,
            frame_cursor: 0.0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn contact(&self) -> Contact {
        self.contact
    }

    pub fn velocity(&self) -> Vector2F {
        self.velocity
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn is_facing_right(&self) -> bool {
        self.facing_right
    }

    /// True while hit-stun grants invulnerability, the renderer flickers on it.
    pub fn is_invulnerable(&self) -> bool {
        self.timers.hit.is_active()
    }

    pub fn frame(&self) -> usize {
        self.frame_cursor as usize % self.state.frame_count()
    }

    /// Stores held buttons; a jump press stays latched until a frame consumes it.
    pub fn handle_input(&mut self, input: InputSnapshot) {
        self.held = input;
        if input.jump {
            self.jump_requested = true;
        }
    }

    /// Facing test used by the attack sweep.
    pub fn is_facing(&self, target: &Rect2F) -> bool {
        let own_x = self.rect.center().x;
        let target_x = target.center().x;
        (own_x < target_x && self.facing_right) || (own_x > target_x && !self.facing_right)
    }

    fn read_input(&mut self, now: Duration) {
        // A wall jump commits to its arc, horizontal control is locked out.
        if !self.timers.wall_jump.is_active() {
            if self.held.right {
                self.facing_right = true;
            }
            if self.held.left {
                self.facing_right = false;
            }
            if self.held.down {
                self.timers.platform_skip.start(now);
            }
            if self.held.attack {
                self.attack(now);
            }
            self.velocity.x = self.held.horizontal();
        }

        if self.held.jump {
            self.jump_requested = true;
        }
    }

    fn attack(&mut self, now: Duration) {
        if !self.timers.attack_block.is_active() {
            self.attacking = true;
            self.frame_cursor = 0.0;
            self.timers.attack_block.start(now);
        }
    }

    fn jump(&mut self, now: Duration) {
        if self.contact.floor {
            self.velocity.y = -JUMP_HEIGHT;
            self.timers.wall_slide_block.start(now);
            // Lifts off a platform that is moving down this same frame.
            self.hitbox.pos.y -= 1.0;
        } else if self.contact.left != self.contact.right && !self.timers.wall_slide_block.is_active() {
            self.timers.wall_jump.start(now);
            // Leaving the wall must not be caught again by the slide check.
            self.timers.wall_slide_block.start(now);
            self.velocity.y = -JUMP_HEIGHT;
            self.velocity.x = if self.contact.left { 1.0 } else { -1.0 };
        }
        self.jump_requested = false;
    }

    fn move_body(&mut self, ctx: &FrameContext, world: &CollisionWorld) {
        let dt = ctx.dt;

        self.hitbox.pos.x += self.velocity.x * PLAYER_SPEED * dt;
        collision::resolve_solids(Axis::Horizontal, &mut self.hitbox, &self.old_hitbox, &mut self.velocity.y, &world.solids);

        let wall_sliding = !self.contact.floor
            && self.contact.any_wall()
            && !self.timers.wall_slide_block.is_active();

        if wall_sliding {
            self.velocity.y = 0.0;
            self.hitbox.pos.y += GRAVITY / 10.0 * dt;
        } else {
            // Two half steps around the move, the jump arc is tuned on it.
            self.velocity.y += GRAVITY / 2.0 * dt;
            self.hitbox.pos.y += self.velocity.y * dt;
            self.velocity.y += GRAVITY / 2.0 * dt;
        }

        if self.jump_requested {
            self.jump(ctx.now);
        }

        collision::resolve_solids(Axis::Vertical, &mut self.hitbox, &self.old_hitbox, &mut self.velocity.y, &world.solids);
        collision::resolve_semi_solids(
            &mut self.hitbox,
            &self.old_hitbox,
            &mut self.velocity.y,
            &world.semi_solids,
            self.timers.platform_skip.is_active()
        );

        self.rect.set_center(self.hitbox.center());
    }

    /// Follows the platform stood on last frame by the distance it moved this frame.
    fn ride_platform(&mut self, world: &CollisionWorld) {
        if let Some(platform) = self.contact.platform.and_then(|id| world.find(id)) {
            self.hitbox.translate(platform.displacement());
        }
    }

    fn animate(&mut self, dt: f32) {
        self.frame_cursor += ANIMATION_SPEED * dt;
        if self.attacking && self.frame_cursor > self.state.frame_count() as f32 {
            self.attacking = false;
        }
    }

    pub fn update(&mut self, ctx: &FrameContext, world: &CollisionWorld) {
        self.old_hitbox = self.hitbox;
        self.timers.update(ctx.now);

        self.read_input(ctx.now);
        self.ride_platform(world);
        self.move_body(ctx, world);
        self.contact = collision::check_contact(&self.hitbox, self.velocity.y, world);

        self.state = PlayerState::derive(&self.contact, self.velocity.x, self.velocity.y, self.attacking);
        self.animate(ctx.dt);
    }

    /// Costs one health unless hit-stun is still running.
    pub fn get_damage(&mut self, now: Duration, progress: &mut ProgressData) -> Vec<ProgressEvent> {
        if self.timers.hit.is_active() {
            return vec![];
        }
        log::debug!("Player hit, health {} -> {}", progress.health(), progress.health() - 1);
        self.timers.hit.start(now);
        progress.add_health(-1)
    }

    /// Pushes the player back inside `[0, width]` horizontally.
    pub fn clamp_horizontal(&mut self, width: f32) {
        if self.hitbox.left() <= 0.0 {
            self.hitbox.set_left(0.0);
        }
        if self.hitbox.right() >= width {
            self.hitbox.set_right(width);
        }
        self.rect.set_center(self.hitbox.center());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::Collider;

    const DT: f32 = 1.0 / 60.0;

    struct Harness {
        player: Player,
        world: CollisionWorld,
        now: Duration,
    }

    impl Harness {
        fn new(center: Vector2F, world: CollisionWorld) -> Self {
            Self { player: Player::new(center), world, now: Duration::ZERO }
        }

        fn step(&mut self, input: InputSnapshot) {
            self.now += Duration::from_secs_f32(DT);
            self.player.handle_input(input);
            self.player.update(&FrameContext { dt: DT, now: self.now }, &self.world);
        }

        fn settle(&mut self, frames: usize) {
            for _ in 0..frames {
                self.step(InputSnapshot::default());
            }
        }

        /// Moves a solid the way the level does before the player updates.
        fn move_solid(&mut self, index: usize, offset: Vector2F) {
            let solid = &mut self.world.solids[index];
            solid.old_rect = solid.rect;
            solid.rect.translate(offset);
        }
    }

    fn ground_world() -> CollisionWorld {
        CollisionWorld {
            solids: vec![Collider::fixed(1, Rect2F::new(-1000.0, 200.0, 3000.0, 64.0))],
            semi_solids: vec![],
        }
    }

    #[test]
    fn test_hitbox_is_inset_from_rect() {
        let player = Player::new(Vector2F::new(0.0, 0.0));
        assert_eq!(player.hitbox.size, Vector2F::new(52.0, 60.0));
        assert_eq!(player.hitbox.center(), player.rect.center());
    }

    #[test]
    fn test_falls_and_lands_idle() {
        let mut harness = Harness::new(Vector2F::new(0.0, 100.0), ground_world());
        harness.settle(90);
        assert_eq!(harness.player.hitbox.bottom(), 200.0);
        assert!(harness.player.contact().floor);
        assert_eq!(harness.player.state(), PlayerState::Idle);
    }

    #[test]
    fn test_runs_and_faces_left() {
        let mut harness = Harness::new(Vector2F::new(0.0, 100.0), ground_world());
        harness.settle(90);
        let start_x = harness.player.hitbox.left();
        for _ in 0..30 {
            harness.step(InputSnapshot { left: true, ..Default::default() });
        }
        assert!(harness.player.hitbox.left() < start_x - 100.0);
        assert!(!harness.player.is_facing_right());
        assert_eq!(harness.player.state(), PlayerState::Run);
    }

    #[test]
    fn test_jump_from_ground_rises_then_lands() {
        let mut harness = Harness::new(Vector2F::new(0.0, 100.0), ground_world());
        harness.settle(90);

        harness.step(InputSnapshot { jump: true, ..Default::default() });
        assert!(harness.player.velocity().y < 0.0);
        harness.step(InputSnapshot::default());
        assert_eq!(harness.player.state(), PlayerState::Jump);

        let mut apex = harness.player.hitbox.bottom();
        for _ in 0..200 {
            harness.step(InputSnapshot::default());
            apex = apex.min(harness.player.hitbox.bottom());
        }
        assert!(apex < 200.0 - 300.0);
        assert_eq!(harness.player.hitbox.bottom(), 200.0);
    }

    #[test]
    fn test_jump_request_latched_until_consumed() {
        let mut harness = Harness::new(Vector2F::new(0.0, 100.0), ground_world());
        harness.settle(90);

        harness.player.handle_input(InputSnapshot { jump: true, ..Default::default() });
        harness.player.handle_input(InputSnapshot::default());
        harness.now += Duration::from_secs_f32(DT);
        let ctx = FrameContext { dt: DT, now: harness.now };
        harness.player.update(&ctx, &harness.world);
        assert!(harness.player.velocity().y < 0.0);
    }

    #[test]
    fn test_wall_slide_is_slow() {
        let mut world = ground_world();
        world.solids.push(Collider::fixed(2, Rect2F::new(100.0, -2000.0, 64.0, 2200.0)));
        // Hitbox right edge flush with the wall, high above the ground.
        let mut harness = Harness::new(Vector2F::new(74.0, -1500.0), world);
        harness.step(InputSnapshot { right: true, ..Default::default() });
        harness.step(InputSnapshot { right: true, ..Default::default() });
        assert!(harness.player.contact().right);

        let before = harness.player.hitbox.top();
        harness.step(InputSnapshot { right: true, ..Default::default() });
        let fallen = harness.player.hitbox.top() - before;
        assert!((fallen - GRAVITY / 10.0 * DT).abs() < 0.01, "fallen={fallen}");
        assert_eq!(harness.player.state(), PlayerState::Wall);
    }

    #[test]
    fn test_wall_jump_pushes_away_and_locks_input() {
        let mut world = ground_world();
        world.solids.push(Collider::fixed(2, Rect2F::new(100.0, -2000.0, 64.0, 2200.0)));
        let mut harness = Harness::new(Vector2F::new(74.0, -1500.0), world);
        for _ in 0..3 {
            harness.step(InputSnapshot { right: true, ..Default::default() });
        }
        assert!(harness.player.contact().right);

        harness.step(InputSnapshot { right: true, jump: true, ..Default::default() });
        assert_eq!(harness.player.velocity().x, -1.0);
        assert!(harness.player.velocity().y < 0.0);

        // Holding toward the wall does not cancel the committed arc
        let x_before = harness.player.hitbox.left();
        harness.step(InputSnapshot { right: true, ..Default::default() });
        assert!(harness.player.hitbox.left() < x_before);
        assert!(harness.player.velocity().y < 0.0);
    }

    #[test]
    fn test_drops_through_semi_solid_when_skipping() {
        let world = CollisionWorld {
            solids: vec![Collider::fixed(1, Rect2F::new(-1000.0, 600.0, 3000.0, 64.0))],
            semi_solids: vec![Collider::fixed(5, Rect2F::new(-200.0, 200.0, 400.0, 16.0))],
        };
        let mut harness = Harness::new(Vector2F::new(0.0, 100.0), world);
        harness.settle(90);
        assert_eq!(harness.player.hitbox.bottom(), 200.0);
        assert!(harness.player.contact().floor);

        for _ in 0..5 {
            harness.step(InputSnapshot { down: true, ..Default::default() });
        }
        harness.settle(90);
        assert_eq!(harness.player.hitbox.bottom(), 600.0);
    }

    #[test]
    fn test_rides_moving_platform() {
        let velocity = Vector2F::new(60.0, -90.0);
        let mut lift = Collider::fixed(3, Rect2F::new(-100.0, 200.0, 200.0, 16.0));
        lift.velocity = Some(velocity);
        let world = CollisionWorld { solids: vec![lift], semi_solids: vec![] };
        let mut harness = Harness::new(Vector2F::new(0.0, 100.0), world);
        harness.settle(90);
        assert_eq!(harness.player.contact().platform, Some(3));

        let x_before = harness.player.hitbox.left();
        for _ in 0..30 {
            harness.move_solid(0, velocity * DT);
            harness.step(InputSnapshot::default());
            assert!(harness.player.contact().floor);
            assert!((harness.player.hitbox.bottom() - harness.world.solids[0].rect.top()).abs() < 0.01);
        }
        assert!((harness.player.hitbox.left() - (x_before + 60.0 * DT * 30.0)).abs() < 0.01);

        // Same on the way down, faster than the first frames of a free fall.
        for _ in 0..30 {
            harness.move_solid(0, -velocity * DT);
            harness.step(InputSnapshot::default());
            assert!(harness.player.contact().floor);
            assert!((harness.player.hitbox.bottom() - harness.world.solids[0].rect.top()).abs() < 0.01);
        }
        assert!((harness.player.hitbox.left() - x_before).abs() < 0.01);
    }

    #[test]
    fn test_attack_gated_and_clears() {
        let mut harness = Harness::new(Vector2F::new(0.0, 100.0), ground_world());
        harness.settle(90);

        harness.step(InputSnapshot { attack: true, ..Default::default() });
        assert!(harness.player.is_attacking());
        assert_eq!(harness.player.state(), PlayerState::Attack);

        // Attack animation is 4 frames at 6 fps, so it ends after ~40 ticks.
        harness.settle(45);
        assert!(!harness.player.is_attacking());
        harness.step(InputSnapshot::default());
        assert_eq!(harness.player.state(), PlayerState::Idle);
    }

    #[test]
    fn test_damage_grants_invulnerability() {
        let mut player = Player::new(Vector2F::new(0.0, 0.0));
        let mut progress = ProgressData::new();
        let health = progress.health();

        assert_eq!(player.get_damage(Duration::from_millis(0), &mut progress).len(), 1);
        assert!(player.get_damage(Duration::from_millis(100), &mut progress).is_empty());
        assert_eq!(progress.health(), health - 1);
        assert!(player.is_invulnerable());
    }

    #[test]
    fn test_clamp_horizontal() {
        let mut player = Player::new(Vector2F::new(5.0, 0.0));
        player.clamp_horizontal(1000.0);
        assert_eq!(player.hitbox.left(), 0.0);

        let mut player = Player::new(Vector2F::new(995.0, 0.0));
        player.clamp_horizontal(1000.0);
        assert_eq!(player.hitbox.right(), 1000.0);
    }
}
