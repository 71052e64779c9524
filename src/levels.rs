//! Level geometry and spawn descriptors, consumed once when a level is built.

use std::path::Path;

use serde::{
    Deserialize,
    Serialize
};

use crate::game::{
    enemies::ShooterKind,
    items::PickupKind,
    level::LevelError,
    math::{
        Rect2F,
        Vector2F
    }
};

pub const TILE_SIZE: f32 = 64.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnDescriptor {
    Player {
        center: Vector2F,
    },
    MovingPlatform {
        size: Vector2F,
        start: Vector2F,
        end: Vector2F,
        speed: f32,
        /// Full solid instead of a one-way platform.
        #[serde(default)]
        solid: bool,
        #[serde(default)]
        flip: bool,
    },
    Saw {
        start: Vector2F,
        end: Vector2F,
        speed: f32,
    },
    Spike {
        center: Vector2F,
        radius: f32,
        speed: f32,
        start_angle: f32,
        /// `-1` spins a full circle.
        end_angle: f32,
    },
    Tooth {
        top_left: Vector2F,
        /// Walk left first. Unset picks a random direction.
        #[serde(default)]
        reverse: Option<bool>,
    },
    Shooter {
        shooter: ShooterKind,
        top_left: Vector2F,
        /// Face and fire to the left.
        #[serde(default)]
        reverse: bool,
    },
    Item {
        item: PickupKind,
        center: Vector2F,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    pub width: f32,
    /// Falling below this line loses a life.
    pub bottom: f32,
    pub finish: Rect2F,
    /// Level unlocked when the finish is reached, `0` unlocks nothing.
    #[serde(default)]
    pub level_unlock: u32,
    #[serde(default)]
    pub solids: Vec<Rect2F>,
    #[serde(default)]
    pub semi_solids: Vec<Rect2F>,
    #[serde(default)]
    pub spawns: Vec<SpawnDescriptor>,
}

impl LevelDescriptor {
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let descriptor: Self = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn player_spawn(&self) -> Option<Vector2F> {
        self.spawns.iter().find_map(|s| match s {
            SpawnDescriptor::Player { center } => Some(*center),
            _ => None,
        })
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        let invalid = |reason: &str| LevelError::InvalidDescriptor {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.width <= 0.0 || self.bottom <= 0.0 {
            return Err(invalid("level must have positive width and bottom"));
        }

        let players = self.spawns.iter()
            .filter(|s| matches!(s, SpawnDescriptor::Player { .. }))
            .count();
        match players {
            0 => return Err(LevelError::MissingPlayerSpawn(self.name.clone())),
            1 => {},
            _ => return Err(invalid("more than one player spawn")),
        }

        let bad_rect = self.solids.iter()
            .chain(self.semi_solids.iter())
            .chain(std::iter::once(&self.finish))
            .any(|r| r.size.x <= 0.0 || r.size.y <= 0.0);
        if bad_rect {
            return Err(invalid("rectangles must have a positive size"));
        }

        for spawn in &self.spawns {
            match spawn {
                SpawnDescriptor::MovingPlatform { speed, .. } | SpawnDescriptor::Saw { speed, .. } if *speed < 0.0 => {
                    return Err(invalid("path speed must not be negative"));
                },
                SpawnDescriptor::Spike { radius, .. } if *radius < 0.0 => {
                    return Err(invalid("spike radius must not be negative"));
                },
                _ => {},
            }
        }

        Ok(())
    }
}

fn tiles(col: u32, row: u32, cols: u32, rows: u32) -> Rect2F {
    Rect2F::new(
        col as f32 * TILE_SIZE,
        row as f32 * TILE_SIZE,
        cols as f32 * TILE_SIZE,
        rows as f32 * TILE_SIZE
    )
}

fn tile_center(col: u32, row: u32) -> Vector2F {
    Vector2F::new((col as f32 + 0.5) * TILE_SIZE, (row as f32 + 0.5) * TILE_SIZE)
}

fn tile_top_left(col: u32, row: u32) -> Vector2F {
    Vector2F::new(col as f32 * TILE_SIZE, row as f32 * TILE_SIZE)
}

/// Levels shipped with the game, in overworld order.
pub fn builtin_levels() -> Vec<LevelDescriptor> {
    vec![
        LevelDescriptor {
            name: "Palm Beach".to_string(),
            width: 40.0 * TILE_SIZE,
            bottom: 12.0 * TILE_SIZE,
            finish: tiles(38, 7, 1, 2),
            level_unlock: 1,
            solids: vec![
                tiles(0, 9, 14, 3),
                tiles(17, 9, 23, 3),
                tiles(24, 7, 2, 2),
            ],
            semi_solids: vec![
                tiles(13, 6, 5, 1),
            ],
            spawns: vec![
                SpawnDescriptor::Player { center: tile_center(2, 7) },
                SpawnDescriptor::Item { item: PickupKind::Silver, center: tile_center(6, 8) },
                SpawnDescriptor::Item { item: PickupKind::Silver, center: tile_center(7, 8) },
                SpawnDescriptor::Item { item: PickupKind::Gold, center: tile_center(15, 5) },
                SpawnDescriptor::Tooth { top_left: Vector2F::new(19.0 * TILE_SIZE, 9.0 * TILE_SIZE - 40.0), reverse: None },
                SpawnDescriptor::Shooter { shooter: ShooterKind::Shell, top_left: tile_top_left(33, 8), reverse: true },
                SpawnDescriptor::Item { item: PickupKind::Potion, center: tile_center(30, 8) },
            ],
        },
        LevelDescriptor {
            name: "Crow's Nest".to_string(),
            width: 48.0 * TILE_SIZE,
            bottom: 14.0 * TILE_SIZE,
            finish: tiles(46, 5, 1, 2),
            level_unlock: 2,
            solids: vec![
                tiles(0, 11, 10, 3),
                tiles(22, 11, 8, 3),
                tiles(38, 7, 10, 7),
            ],
            semi_solids: vec![],
            spawns: vec![
                SpawnDescriptor::Player { center: tile_center(2, 9) },
                SpawnDescriptor::MovingPlatform {
                    size: Vector2F::new(2.0 * TILE_SIZE, 0.5 * TILE_SIZE),
                    start: Vector2F::new(10.0 * TILE_SIZE, 10.5 * TILE_SIZE),
                    end: Vector2F::new(22.0 * TILE_SIZE, 10.5 * TILE_SIZE),
                    speed: 150.0,
                    solid: false,
                    flip: true,
                },
                SpawnDescriptor::Saw {
                    start: Vector2F::new(24.0 * TILE_SIZE, 8.0 * TILE_SIZE),
                    end: Vector2F::new(24.0 * TILE_SIZE, 10.5 * TILE_SIZE),
                    speed: 120.0,
                },
                SpawnDescriptor::MovingPlatform {
                    size: Vector2F::new(2.0 * TILE_SIZE, 0.5 * TILE_SIZE),
                    start: Vector2F::new(33.0 * TILE_SIZE, 7.0 * TILE_SIZE),
                    end: Vector2F::new(33.0 * TILE_SIZE, 11.0 * TILE_SIZE),
                    speed: 100.0,
                    solid: true,
                    flip: false,
                },
                SpawnDescriptor::Spike {
                    center: tile_center(42, 4),
                    radius: 96.0,
                    speed: 120.0,
                    start_angle: 0.0,
                    end_angle: -1.0,
                },
                SpawnDescriptor::Shooter { shooter: ShooterKind::Cannon, top_left: tile_top_left(27, 10), reverse: false },
                SpawnDescriptor::Item { item: PickupKind::Diamond, center: tile_center(16, 8) },
                SpawnDescriptor::Item { item: PickupKind::Skull, center: tile_center(44, 6) },
            ],
        },
        LevelDescriptor {
            name: "Skull Island".to_string(),
            width: 30.0 * TILE_SIZE,
            bottom: 12.0 * TILE_SIZE,
            finish: tiles(28, 7, 1, 2),
            level_unlock: 0,
            solids: vec![
                tiles(0, 9, 30, 3),
                tiles(12, 5, 1, 4),
            ],
            semi_solids: vec![
                tiles(9, 6, 3, 1),
            ],
            spawns: vec![
                SpawnDescriptor::Player { center: tile_center(2, 7) },
                SpawnDescriptor::Tooth { top_left: Vector2F::new(16.0 * TILE_SIZE, 9.0 * TILE_SIZE - 40.0), reverse: Some(true) },
                SpawnDescriptor::Tooth { top_left: Vector2F::new(22.0 * TILE_SIZE, 9.0 * TILE_SIZE - 40.0), reverse: Some(false) },
                SpawnDescriptor::Shooter { shooter: ShooterKind::Shell, top_left: tile_top_left(26, 8), reverse: true },
                SpawnDescriptor::Item { item: PickupKind::Gold, center: tile_center(10, 5) },
            ],
        },
    ]
}
