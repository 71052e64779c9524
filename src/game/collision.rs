//! Axis-separated rectangle collision.
//!
//! Direction of penetration is inferred from the ordering of edges in the
//! previous frame against the current one, never from velocity sign.

use super::{
    entity::EntityId,
    math::{
        Rect2F,
        Vector2F
    }
};

/// Extra push applied when the head hits the underside of a moving collider.
pub const MOVING_CEILING_NUDGE: f32 = 6.0;
/// Thickness of the contact probes cast around the hitbox.
pub const PROBE_THICKNESS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Frame snapshot of something the player can collide with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub id: EntityId,
    pub rect: Rect2F,
    pub old_rect: Rect2F,
    /// Per-second displacement, set only for colliders travelling a path.
    pub velocity: Option<Vector2F>,
}

impl Collider {
    pub fn fixed(id: EntityId, rect: Rect2F) -> Self {
        Self { id, rect, old_rect: rect, velocity: None }
    }

    pub fn is_moving(&self) -> bool {
        self.velocity.is_some()
    }

    /// Distance travelled since the start of the frame.
    pub fn displacement(&self) -> Vector2F {
        self.rect.pos - self.old_rect.pos
    }
}

/// Solid and semi-solid colliders the player resolves against this frame.
#[derive(Debug, Default, Clone)]
pub struct CollisionWorld {
    pub solids: Vec<Collider>,
    pub semi_solids: Vec<Collider>,
}

impl CollisionWorld {
    pub fn find(&self, id: EntityId) -> Option<&Collider> {
        self.solids.iter()
            .chain(self.semi_solids.iter())
            .find(|c| c.id == id)
    }
}

/// Contact flags computed from probes around the hitbox.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub floor: bool,
    pub left: bool,
    pub right: bool,
    pub platform: Option<EntityId>,
}

impl Contact {
    pub fn any_wall(&self) -> bool {
        self.left || self.right
    }
}

// Sub-unit drift between frames must not flip the edge ordering.
fn settled(v: f32) -> f32 {
    v.trunc()
}

/// Resolves the hitbox against solid colliders along one axis.
///
/// Any vertical overlap zeroes `velocity_y`, landing or bumping alike.
pub fn resolve_solids(
    axis: Axis,
    hitbox: &mut Rect2F,
    old_hitbox: &Rect2F,
    velocity_y: &mut f32,
    solids: &[Collider]
) {
    for solid in solids {
        if !solid.rect.intersects(hitbox) {
            continue;
        }

        match axis {
            Axis::Horizontal => {
                // Moving left into the obstacle's right edge
                if hitbox.left() <= solid.rect.right() && settled(old_hitbox.left()) >= settled(solid.old_rect.right()) {
                    hitbox.set_left(solid.rect.right());
                }
                // Moving right into the obstacle's left edge
                if hitbox.right() >= solid.rect.left() && settled(old_hitbox.right()) <= settled(solid.old_rect.left()) {
                    hitbox.set_right(solid.rect.left());
                }
            },
            Axis::Vertical => {
                // Head against the underside
                if hitbox.top() <= solid.rect.bottom() && settled(old_hitbox.top()) >= settled(solid.old_rect.bottom()) {
                    hitbox.set_top(solid.rect.bottom());
                    if solid.is_moving() {
                        hitbox.set_top(hitbox.top() + MOVING_CEILING_NUDGE);
                    }
                }
                // Feet onto the top surface
                if hitbox.bottom() >= solid.rect.top() && settled(old_hitbox.bottom()) <= settled(solid.old_rect.top()) {
                    hitbox.set_bottom(solid.rect.top());
                }
                *velocity_y = 0.0;
            },
        }
    }
}

/// One-way platforms: only stop a fall through the top surface.
pub fn resolve_semi_solids(
    hitbox: &mut Rect2F,
    old_hitbox: &Rect2F,
    velocity_y: &mut f32,
    semi_solids: &[Collider],
    skip_active: bool
) {
    if skip_active {
        return;
    }

    for platform in semi_solids {
        if !platform.rect.intersects(hitbox) {
            continue;
        }
        if hitbox.bottom() >= platform.rect.top() && settled(old_hitbox.bottom()) <= settled(platform.old_rect.top()) {
            hitbox.set_bottom(platform.rect.top());
            if *velocity_y > 0.0 {
                *velocity_y = 0.0;
            }
        }
    }
}

/// Probes below the feet and at mid-height on both sides.
pub fn check_contact(hitbox: &Rect2F, velocity_y: f32, world: &CollisionWorld) -> Contact {
    let height = hitbox.size.y;
    let floor_probe = Rect2F::new(hitbox.left(), hitbox.bottom(), hitbox.size.x, PROBE_THICKNESS);
    let left_probe = Rect2F::new(hitbox.left() - PROBE_THICKNESS, hitbox.top() + height / 4.0, PROBE_THICKNESS, height / 2.0);
    let right_probe = Rect2F::new(hitbox.right(), hitbox.top() + height / 4.0, PROBE_THICKNESS, height / 2.0);

    let hits = |probe: &Rect2F, colliders: &[Collider]| colliders.iter().any(|c| c.rect.intersects(probe));

    let floor = hits(&floor_probe, &world.solids)
        || (hits(&floor_probe, &world.semi_solids) && velocity_y >= 0.0);

    let platform = world.solids.iter()
        .chain(world.semi_solids.iter())
        .filter(|c| c.is_moving() && c.rect.intersects(&floor_probe))
        .last()
        .map(|c| c.id);

    Contact {
        floor,
        left: hits(&left_probe, &world.solids),
        right: hits(&right_probe, &world.solids),
        platform,
    }
}
