use kurbo::Vec2;

/// Integer 2D coordinate.
///
/// Coordinates are rounded to the nearest integer at construction; equality
/// is exact after rounding.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: i32,
    /// Vertical coordinate in pixels.
    pub y: i32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Build a point from fractional coordinates, rounding to the nearest integer.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }

    /// Build a point from already-integer coordinates.
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `other - self`.
    pub fn delta(self, other: Point) -> Point {
        Point {
            x: other.x - self.x,
            y: other.y - self.y,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        f64::from(self.distance_x(other)).hypot(f64::from(self.distance_y(other)))
    }

    /// Absolute horizontal distance to `other`.
    pub fn distance_x(self, other: Point) -> u32 {
        self.x.abs_diff(other.x)
    }

    /// Absolute vertical distance to `other`.
    pub fn distance_y(self, other: Point) -> u32 {
        self.y.abs_diff(other.y)
    }

    /// Point halfway between `self` and `other` (rounded).
    pub fn midpoint(self, other: Point) -> Point {
        Point::new(
            f64::from(self.x) + f64::from(other.x - self.x) / 2.0,
            f64::from(self.y) + f64::from(other.y - self.y) / 2.0,
        )
    }

    /// The point as a [`kurbo::Vec2`], for affine math.
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(f64::from(self.x), f64::from(self.y))
    }
}

/// Width/height pair in pixels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Dimension {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimension {
    /// Build a dimension value.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of the diagonal.
    pub fn diagonal(self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }
}
