pub mod driver;
pub mod game;
pub mod levels;
pub mod rendering;
pub mod session;

pub const DEFAULT_FPS: u32 = 60;
