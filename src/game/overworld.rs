//! Level-select map: a row of nodes, the cursor walks over the unlocked ones.

use std::time::Duration;

use super::{
    entity::ZLayer,
    input::InputSnapshot,
    math::{
        Rect2F,
        Vector2F
    },
    progress::ProgressData,
    timer::Timer
};
use crate::rendering::{
    RenderFrame,
    RenderItem
};

const MOVE_COOLDOWN_MS: u64 = 250;
const NODE_SPACING: f32 = 192.0;
const NODE_ORIGIN: Vector2F = Vector2F { x: 160.0, y: 360.0 };
const NODE_SIZE: Vector2F = Vector2F { x: 96.0, y: 96.0 };
const ICON_SIZE: Vector2F = Vector2F { x: 48.0, y: 48.0 };

#[derive(Debug)]
pub struct Overworld {
    cursor: u32,
    last_level: u32,
    clock: Duration,
    move_timer: Timer,
    held: InputSnapshot,
    confirm_requested: bool,
}

impl Overworld {
    /// `level_count` nodes, cursor starting on `current_level`.
    pub fn new(current_level: u32, level_count: u32) -> Self {
        let last_level = level_count.saturating_sub(1);
        Self {
            cursor: current_level.min(last_level),
            last_level,
            clock: Duration::ZERO,
            move_timer: Timer::from_millis(MOVE_COOLDOWN_MS),
            held: InputSnapshot::default(),
            confirm_requested: false,
        }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn handle_input(&mut self, input: InputSnapshot) {
        self.held = input;
        if input.confirm {
            self.confirm_requested = true;
        }
    }

    /// Moves the cursor, returns the selected level once confirmed.
    pub fn step(&mut self, dt: f32, progress: &mut ProgressData) -> Option<u32> {
        self.clock += Duration::from_secs_f32(dt.max(0.0));
        self.move_timer.update(self.clock);

        let reachable = progress.unlocked_level().min(self.last_level);
        if !self.move_timer.is_active() {
            let horizontal = self.held.horizontal();
            if horizontal > 0.0 && self.cursor < reachable {
                self.cursor += 1;
                self.move_timer.start(self.clock);
            } else if horizontal < 0.0 && self.cursor > 0 {
                self.cursor -= 1;
                self.move_timer.start(self.clock);
            }
        }
        progress.set_current_level(self.cursor);

        if self.confirm_requested {
            self.confirm_requested = false;
            log::info!("Overworld selected level {}", self.cursor);
            return Some(self.cursor);
        }
        None
    }

    fn node_center(index: u32) -> Vector2F {
        NODE_ORIGIN + Vector2F::new(index as f32 * NODE_SPACING, 0.0)
    }

    pub fn render_frame(&self, progress: &ProgressData) -> RenderFrame {
        let mut items: Vec<RenderItem> = (0..=self.last_level)
            .map(|index| RenderItem {
                entity: None,
                sprite: "node",
                sequence: if index <= progress.unlocked_level() { "unlocked" } else { "locked" },
                frame: 0,
                rect: Rect2F::from_center(Self::node_center(index), NODE_SIZE),
                z: ZLayer::BgDetails,
                flip: false,
            })
            .collect();

        let icon_center = Self::node_center(self.cursor);
        items.push(RenderItem {
            entity: None,
            sprite: "icon",
            sequence: "idle",
            frame: 0,
            rect: Rect2F::from_center(icon_center, ICON_SIZE),
            z: ZLayer::Main,
            flip: false,
        });

        let mut frame = RenderFrame {
            items,
            camera_position: icon_center,
            player_flicker: false,
        };
        frame.sort_by_layer();
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn press(overworld: &mut Overworld, progress: &mut ProgressData, input: InputSnapshot, frames: usize) -> Option<u32> {
        let mut selected = None;
        for _ in 0..frames {
            overworld.handle_input(input);
            selected = selected.or(overworld.step(DT, progress));
        }
        selected
    }

    #[test]
    fn test_cursor_stops_at_unlocked_level() {
        let mut progress = ProgressData::new();
        progress.unlock_level(1);
        let mut overworld = Overworld::new(0, 3);

        let right = InputSnapshot { right: true, ..Default::default() };
        press(&mut overworld, &mut progress, right, 120);
        assert_eq!(overworld.cursor(), 1);
        assert_eq!(progress.current_level(), 1);
    }

    #[test]
    fn test_cursor_moves_once_per_cooldown() {
        let mut progress = ProgressData::new();
        progress.unlock_level(2);
        let mut overworld = Overworld::new(0, 3);

        let right = InputSnapshot { right: true, ..Default::default() };
        press(&mut overworld, &mut progress, right, 1);
        assert_eq!(overworld.cursor(), 1);
        press(&mut overworld, &mut progress, right, 5);
        assert_eq!(overworld.cursor(), 1);
    }

    #[test]
    fn test_confirm_selects_cursor() {
        let mut progress = ProgressData::new();
        let mut overworld = Overworld::new(0, 3);

        let confirm = InputSnapshot { confirm: true, ..Default::default() };
        assert_eq!(press(&mut overworld, &mut progress, confirm, 1), Some(0));
        assert_eq!(press(&mut overworld, &mut progress, InputSnapshot::default(), 1), None);
    }

    #[test]
    fn test_render_marks_locked_nodes() {
        let progress = ProgressData::new();
        let overworld = Overworld::new(0, 2);
        let frame = overworld.render_frame(&progress);
        let sequences: Vec<_> = frame.items.iter().filter(|i| i.sprite == "node").map(|i| i.sequence).collect();
        assert_eq!(sequences, vec!["unlocked", "locked"]);
    }
}
