use serde::{
    Deserialize,
    Serialize
};

use super::math::Vector2F;

/// Buttons held during a frame, sampled by the frame driver.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump: bool,
    pub attack: bool,
    /// Overworld selection.
    pub confirm: bool,
}

impl InputSnapshot {
    /// Horizontal axis in {-1, 0, 1}; opposite directions cancel out.
    pub fn horizontal(&self) -> f32 {
        let mut axis = Vector2F::zero();
        if self.right {
            axis.x += 1.0;
        }
        if self.left {
            axis.x -= 1.0;
        }
        axis.normal().x
    }
}

#[test]
fn test_horizontal_axis() {
    let both = InputSnapshot { left: true, right: true, ..Default::default() };
    let left = InputSnapshot { left: true, ..Default::default() };
    assert_eq!(both.horizontal(), 0.0);
    assert_eq!(left.horizontal(), -1.0);
    assert_eq!(InputSnapshot::default().horizontal(), 0.0);
}
