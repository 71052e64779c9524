pub mod collision;
pub mod enemies;
pub mod entity;
pub mod input;
pub mod items;
pub mod level;
pub mod math;
pub mod moving;
pub mod overworld;
pub mod player;
pub mod progress;
pub mod timer;
