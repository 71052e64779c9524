//! Geometry travelling a fixed path: lifts, saws and orbiting spikes.

use super::{
    entity::{
        Animation,
        FrameContext
    },
    math::{
        Rect2F,
        Vector2F
    }
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAxis {
    Horizontal,
    Vertical,
}

/// Shuttles back and forth between two waypoints along one axis.
///
/// The waypoints bound the rectangle edges: on a horizontal path the left edge
/// never goes past `start.x` and the right edge never past `end.x`.
#[derive(Debug, Clone)]
pub struct MovingPlatform {
    pub rect: Rect2F,
    pub old_rect: Rect2F,
    start: Vector2F,
    end: Vector2F,
    axis: PathAxis,
    direction: Vector2F,
    speed: f32,
    flip_with_direction: bool,
    pub animation: Animation,
}

impl MovingPlatform {
    pub fn new(size: Vector2F, start: Vector2F, end: Vector2F, speed: f32, frame_count: usize, flip_with_direction: bool) -> Self {
        let axis = if (end.x - start.x).abs() >= (end.y - start.y).abs() {
            PathAxis::Horizontal
        } else {
            PathAxis::Vertical
        };
        let direction = match axis {
            PathAxis::Horizontal => Vector2F::new(1.0, 0.0),
            PathAxis::Vertical => Vector2F::new(0.0, 1.0),
        };
        let rect = Rect2F::from_center(start, size);

        Self {
            rect,
            old_rect: rect,
            start,
            end,
            axis,
            direction,
            speed,
            flip_with_direction,
            animation: Animation::new(frame_count),
        }
    }

    pub fn axis(&self) -> PathAxis {
        self.axis
    }

    pub fn velocity(&self) -> Vector2F {
        self.direction * self.speed
    }

    /// Mirrored while travelling left or up.
    pub fn is_flipped(&self) -> bool {
        self.flip_with_direction && (self.direction.x < 0.0 || self.direction.y < 0.0)
    }

    fn check_border(&mut self) {
        match self.axis {
            PathAxis::Horizontal => {
                if self.rect.right() >= self.end.x && self.direction.x > 0.0 {
                    self.direction.x = -1.0;
                    self.rect.set_right(self.end.x);
                }
                if self.rect.left() <= self.start.x && self.direction.x < 0.0 {
                    self.direction.x = 1.0;
                    self.rect.set_left(self.start.x);
                }
            },
            PathAxis::Vertical => {
                if self.rect.bottom() >= self.end.y && self.direction.y > 0.0 {
                    self.direction.y = -1.0;
                    self.rect.set_bottom(self.end.y);
                }
                if self.rect.top() <= self.start.y && self.direction.y < 0.0 {
                    self.direction.y = 1.0;
                    self.rect.set_top(self.start.y);
                }
            },
        }
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        self.old_rect = self.rect;
        self.rect.translate(self.direction * self.speed * ctx.dt);
        self.check_border();
        self.animation.advance(ctx.dt);
    }
}

/// Orbits a center point. Without an end angle it spins a full circle,
/// otherwise it swings between the two angles.
#[derive(Debug, Clone)]
pub struct RadialHazard {
    pub rect: Rect2F,
    pub old_rect: Rect2F,
    center: Vector2F,
    radius: f32,
    /// Degrees per second.
    speed: f32,
    start_angle: f32,
    end_angle: Option<f32>,
    angle: f32,
    direction: f32,
}

impl RadialHazard {
    pub fn new(size: Vector2F, center: Vector2F, radius: f32, speed: f32, start_angle: f32, end_angle: Option<f32>) -> Self {
        let mut hazard = Self {
            rect: Rect2F::from_center(center, size),
            old_rect: Rect2F::from_center(center, size),
            center,
            radius,
            speed,
            start_angle,
            end_angle,
            angle: start_angle,
            direction: 1.0,
        };
        hazard.place();
        hazard.old_rect = hazard.rect;
        hazard
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    fn place(&mut self) {
        let radians = self.angle.to_radians();
        let position = Vector2F::new(
            self.center.x + radians.cos() * self.radius,
            self.center.y + radians.sin() * self.radius,
        );
        self.rect.set_center(position);
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        self.old_rect = self.rect;
        self.angle += self.direction * self.speed * ctx.dt;

        if let Some(end_angle) = self.end_angle {
            if self.angle >= end_angle {
                self.direction = -1.0;
            }
            if self.angle < self.start_angle {
                self.direction = 1.0;
            }
        }

        self.place();
    }
}
