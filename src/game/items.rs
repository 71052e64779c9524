use serde::{
    Deserialize,
    Serialize
};

use super::{
    entity::{
        Animation,
        FrameContext
    },
    math::{
        Rect2F,
        Vector2F
    },
    progress::{
        ProgressData,
        ProgressEvent
    }
};

pub const PICKUP_SIZE: Vector2F = Vector2F { x: 32.0, y: 32.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Gold,
    Silver,
    Diamond,
    Skull,
    Potion,
}

impl PickupKind {
    pub fn sprite(&self) -> &'static str {
        match self {
            PickupKind::Gold => "gold",
            PickupKind::Silver => "silver",
            PickupKind::Diamond => "diamond",
            PickupKind::Skull => "skull",
            PickupKind::Potion => "potion",
        }
    }

    fn frame_count(&self) -> usize {
        match self {
            PickupKind::Potion => 5,
            _ => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub kind: PickupKind,
    pub rect: Rect2F,
    pub animation: Animation,
}

impl Pickup {
    pub fn new(kind: PickupKind, center: Vector2F) -> Self {
        Self {
            kind,
            rect: Rect2F::from_center(center, PICKUP_SIZE),
            animation: Animation::new(kind.frame_count()),
        }
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        self.animation.advance(ctx.dt);
    }

    pub fn activate(&self, progress: &mut ProgressData) -> Vec<ProgressEvent> {
        match self.kind {
            PickupKind::Gold => progress.add_coins(5),
            PickupKind::Silver => progress.add_coins(1),
            PickupKind::Diamond => progress.add_coins(20),
            PickupKind::Skull => progress.add_coins(50),
            PickupKind::Potion => progress.add_health(1),
        }
    }
}

#[test]
fn test_pickup_effects() {
    let mut progress = ProgressData::new();
    let center = Vector2F::new(0.0, 0.0);

    Pickup::new(PickupKind::Gold, center).activate(&mut progress);
    Pickup::new(PickupKind::Silver, center).activate(&mut progress);
    Pickup::new(PickupKind::Diamond, center).activate(&mut progress);
    assert_eq!(progress.coins(), 26);

    let health = progress.health();
    let events = Pickup::new(PickupKind::Potion, center).activate(&mut progress);
    assert_eq!(progress.health(), health + 1);
    assert_eq!(events, vec![ProgressEvent::HealthChanged { health: health + 1 }]);

    Pickup::new(PickupKind::Skull, center).activate(&mut progress);
    Pickup::new(PickupKind::Skull, center).activate(&mut progress);
    assert_eq!(progress.coins(), 26);
    assert_eq!(progress.health(), health + 2);
}
