use crate::foundation::color::Color;
use crate::foundation::geom::Point;
use crate::surface::Surface;

/// A pixel chosen along a ray, with the color sampled there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RayPixel {
    /// Where the pixel sits on the source surface.
    pub point: Point,
    /// The sampled color.
    pub color: Color,
}

/// A maximal run of exactly-opaque pixels along a ray path.
///
/// Indices are positions into the ray's pixel path, both ends inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// First path index of the run.
    pub start: usize,
    /// Last path index of the run.
    pub end: usize,
}

impl Segment {
    /// Number of pixels in the run.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; a segment covers at least one pixel.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A probe line from a surface's center to one border point.
///
/// The integer pixel path is computed once at construction by Bresenham
/// stepping. Analysis walks the path to find opaque segments and the
/// outermost pixel meeting the outline threshold; both stay unset until
/// [`Ray::analyze`] runs.
#[derive(Clone, Debug)]
pub struct Ray {
    start: Point,
    end: Point,
    path: Vec<Point>,
    pixel: Option<RayPixel>,
    segments: Option<Vec<Segment>>,
}

impl Ray {
    /// Build the ray and its pixel path from `start` to `end`.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            path: bresenham_path(start, end),
            pixel: None,
            segments: None,
        }
    }

    /// The ray origin (surface center).
    pub fn start(&self) -> Point {
        self.start
    }

    /// The border point the ray is cast toward.
    pub fn end(&self) -> Point {
        self.end
    }

    /// The integer pixel coordinates from start to end, in order.
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Whether [`Ray::analyze`] has run.
    pub fn is_analyzed(&self) -> bool {
        self.segments.is_some()
    }

    /// The chosen outline pixel, if analysis found one.
    pub fn pixel(&self) -> Option<RayPixel> {
        self.pixel
    }

    /// The opaque segments, once analyzed.
    pub fn segments(&self) -> Option<&[Segment]> {
        self.segments.as_deref()
    }

    /// Classify the path's pixels against `source`.
    ///
    /// Pixels with alpha of at least `opaque_alpha` form the maximal opaque
    /// segments. Among pixels with alpha of at least `minimum_alpha`, the
    /// chosen pixel is the most opaque one; on equal alpha the later pixel
    /// wins, so the outermost maximal-alpha pixel along the ray is kept.
    pub fn analyze(&mut self, source: &Surface, opaque_alpha: u8, minimum_alpha: u8) {
        let mut segments = Vec::new();
        let mut run_start: Option<usize> = None;

        for (index, point) in self.path.iter().enumerate() {
            let color = source.pixel(point.x, point.y).unwrap_or_default();

            if color.is_opaque_at(opaque_alpha) {
                run_start.get_or_insert(index);
            } else if let Some(start) = run_start.take() {
                segments.push(Segment {
                    start,
                    end: index - 1,
                });
            }

            if color.is_opaque_at(minimum_alpha)
                && self.pixel.is_none_or(|chosen| chosen.color.alpha <= color.alpha)
            {
                self.pixel = Some(RayPixel {
                    point: *point,
                    color,
                });
            }
        }

        if let Some(start) = run_start {
            segments.push(Segment {
                start,
                end: self.path.len() - 1,
            });
        }

        self.segments = Some(segments);
    }
}

/// Integer line stepping from `start` to `end`, both endpoints included.
fn bresenham_path(start: Point, end: Point) -> Vec<Point> {
    let mut pixels = Vec::new();
    let mut x = start.x;
    let mut y = start.y;
    let dx = (end.x - x).abs();
    let sx = if x < end.x { 1 } else { -1 };
    let dy = -(end.y - y).abs();
    let sy = if y < end.y { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        pixels.push(Point::from_ints(x, y));
        if x == end.x && y == end.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    pixels
}

#[cfg(test)]
#[path = "../../tests/unit/mask/ray.rs"]
mod tests;
