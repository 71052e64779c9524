use serde::Serialize;

use crate::game::{
    entity::{
        EntityId,
        ZLayer
    },
    math::{
        Rect2F,
        Vector2F
    }
};

/// One sprite to draw, in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderItem {
    /// `None` for the player and overworld decorations.
    pub entity: Option<EntityId>,
    pub sprite: &'static str,
    pub sequence: &'static str,
    pub frame: usize,
    pub rect: Rect2F,
    pub z: ZLayer,
    pub flip: bool,
}

/// Everything a presentation layer needs for one frame, drawn in `items` order.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub items: Vec<RenderItem>,
    pub camera_position: Vector2F,
    /// Player sprite blinks while hit-stun lasts.
    pub player_flicker: bool,
}

impl RenderFrame {
    /// Stable sort, items on one layer keep their insertion order.
    pub fn sort_by_layer(&mut self) {
        self.items.sort_by_key(|item| item.z);
    }
}

#[test]
fn test_sort_keeps_insertion_order_within_layer() {
    let item = |sprite, z| RenderItem {
        entity: None,
        sprite,
        sequence: "idle",
        frame: 0,
        rect: Rect2F::new(0.0, 0.0, 1.0, 1.0),
        z,
        flip: false,
    };
    let mut frame = RenderFrame {
        items: vec![
            item("fg", ZLayer::Fg),
            item("a", ZLayer::Main),
            item("tiles", ZLayer::BgTiles),
            item("b", ZLayer::Main),
        ],
        ..Default::default()
    };
    frame.sort_by_layer();
    let order: Vec<_> = frame.items.iter().map(|i| i.sprite).collect();
    assert_eq!(order, vec!["tiles", "a", "b", "fg"]);
}
