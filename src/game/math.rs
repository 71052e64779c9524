use serde::{
    Deserialize,
    Serialize
};

pub type Vector2F = Vector2X<f32>;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vector2X<T> {
    pub x: T,
    pub y: T,
}

pub type Rect2F = Rect2X<f32>;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rect2X<T> {
    pub pos: Vector2X<T>,
    pub size: Vector2X<T>,
}

impl<T: std::fmt::Display> std::fmt::Display for Vector2X<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Rect2X<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[({},{}), ({},{})]", self.pos.x, self.pos.y, self.size.x, self.size.y)
    }
}

impl<T> Vector2X<T>
where
    T: Default
{
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: T::default(), y: T::default() }
    }
}

impl<T> Vector2X<T>
where
    T: Into<f32> + Copy
{
    pub fn length_squared(&self) -> f32 {
        let xf: f32 = T::into(self.x);
        let yf: f32 = T::into(self.y);
        xf.powi(2) + yf.powi(2)
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, zero vector stays zero.
    pub fn normal(&self) -> Vector2X<f32> {
        let len = self.length();
        if len == 0.0 {
            return Vector2X { x: 0.0, y: 0.0 };
        }
        Vector2X {
            x: T::into(self.x) / len,
            y: T::into(self.y) / len,
        }
    }
}

impl Vector2X<f32>
{
    pub fn distance_to(&self, other: Self) -> f32 {
        (other - *self).length()
    }
}

impl<T> std::ops::Add for Vector2X<T>
where
    T: std::ops::Add<Output = T>
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y
        }

    }
}

impl<T> std::ops::AddAssign for Vector2X<T>
where
    T: std::ops::AddAssign
{
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T> std::ops::Neg for Vector2X<T>
where
    T: std::ops::Neg<Output = T>
{
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self {
            x: T::neg(self.x),
            y: T::neg(self.y),
        }
    }
}

impl<T> std::ops::Mul<T> for Vector2X<T>
where
    T: std::ops::Mul<Output = T> + Copy
{
    type Output = Self;
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs
        }
    }
}

impl<T> std::ops::Sub for Vector2X<T>
where
    T: std::ops::Sub<Output = T>
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: T::sub(self.x, rhs.x),
            y: T::sub(self.y, rhs.y)
        }
    }
}

impl<T> Rect2X<T> {
    pub fn new(x: T, y: T, w: T, h: T) -> Self {
        Self { pos: Vector2X { x, y }, size: Vector2X { x: w, y: h } }
    }
}

impl<T> Rect2X<T>
where
    T: PartialOrd + std::ops::Add<Output = T> + Copy
{
    /// Strict overlap test, rectangles sharing only an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && other.pos.x < self.pos.x + self.size.x
            && self.pos.y < other.pos.y + other.size.y
            && other.pos.y < self.pos.y + self.size.y
    }
}

/// Edge accessors. Setters move the rectangle, size is never changed.
impl Rect2F {
    pub fn from_center(center: Vector2F, size: Vector2F) -> Self {
        Self::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
    }

    pub fn left(&self) -> f32 {
        self.pos.x
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn set_left(&mut self, x: f32) {
        self.pos.x = x;
    }

    pub fn set_right(&mut self, x: f32) {
        self.pos.x = x - self.size.x;
    }

    pub fn set_top(&mut self, y: f32) {
        self.pos.y = y;
    }

    pub fn set_bottom(&mut self, y: f32) {
        self.pos.y = y - self.size.y;
    }

    pub fn center(&self) -> Vector2F {
        Vector2F::new(self.pos.x + self.size.x / 2.0, self.pos.y + self.size.y / 2.0)
    }

    pub fn set_center(&mut self, center: Vector2F) {
        self.pos = Vector2F::new(center.x - self.size.x / 2.0, center.y - self.size.y / 2.0);
    }

    /// Grows (or shrinks, for negative amounts) around the same center.
    pub fn inflate(&self, dw: f32, dh: f32) -> Self {
        let size = Vector2F::new((self.size.x + dw).max(0.0), (self.size.y + dh).max(0.0));
        Self::from_center(self.center(), size)
    }

    pub fn translate(&mut self, offset: Vector2F) {
        self.pos += offset;
    }
}

#[test]
fn test_vector_creation() {
    let v1 = Vector2X::<f32>::new(1.0, 2.0);
    assert_eq!(v1.x, 1.0);
    assert_eq!(v1.y, 2.0);
}

#[test]
fn test_vector_add_assign() {
    let v1 = Vector2X::<i32>::new(1, 2);
    let mut v2 = Vector2X::<i32>::new(10, 20);
    v2 += v1;
    assert_eq!(v2.x, 11);
    assert_eq!(v2.y, 22);
}

#[test]
fn test_vector_negation() {
    let v1 = Vector2X::<i32>::new(1, 2);
    let v1_neg = -v1;
    assert_eq!(v1_neg.x, -v1.x);
    assert_eq!(v1_neg.y, -v1.y);
}

#[test]
fn test_vector_mul_scalar() {
    let v1 = Vector2X::<i32>::new(1, 2);
    let scalar = 5;
    let v1_multiplied = v1 * scalar;
    assert_eq!(v1_multiplied.x, v1.x * scalar);
    assert_eq!(v1_multiplied.y, v1.y * scalar);
}

#[test]
fn test_vector_normal_of_zero_is_zero() {
    let v = Vector2F::zero().normal();
    assert_eq!(v, Vector2F::zero());
}

#[test]
fn test_vector_normal_of_horizontal_input() {
    let v = Vector2F::new(-3.0, 0.0).normal();
    assert_eq!(v, Vector2F::new(-1.0, 0.0));
}

#[test]
fn test_rect_touching_edges_do_not_intersect() {
    let a = Rect2F::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect2F::new(10.0, 0.0, 10.0, 10.0);
    let c = Rect2F::new(9.5, 9.5, 10.0, 10.0);
    assert!(!a.intersects(&b));
    assert!(a.intersects(&c));
    assert!(c.intersects(&b));
}

#[test]
fn test_rect_edge_setters() {
    let mut rect = Rect2F::new(0.0, 0.0, 4.0, 6.0);
    rect.set_right(10.0);
    rect.set_bottom(20.0);
    assert_eq!(rect.left(), 6.0);
    assert_eq!(rect.top(), 14.0);
    assert_eq!(rect.size, Vector2F::new(4.0, 6.0));
}

#[test]
fn test_rect_inflate_keeps_center() {
    let rect = Rect2F::new(0.0, 0.0, 128.0, 96.0);
    let hitbox = rect.inflate(-76.0, -36.0);
    assert_eq!(hitbox.size, Vector2F::new(52.0, 60.0));
    assert_eq!(hitbox.center(), rect.center());
}
