use kurbo::BezPath;

use crate::foundation::color::Color;
use crate::foundation::error::{TokenforgeError, TokenforgeResult};
use crate::foundation::geom::Point;
use crate::mask::ray::Ray;
use crate::surface::Surface;

/// Options controlling radial silhouette synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SynthesizerOptions {
    /// Analyze every n-th border ray eagerly; the rest only on backfill.
    pub sample_stride: usize,
    /// Soft alpha threshold a pixel must meet to qualify for the outline.
    pub minimum_alpha: u8,
    /// Exact alpha threshold for opaque-segment classification.
    pub opaque_alpha: u8,
}

impl Default for SynthesizerOptions {
    fn default() -> Self {
        Self {
            sample_stride: 5,
            minimum_alpha: 255,
            opaque_alpha: 255,
        }
    }
}

/// Derives a filled silhouette mask from a source surface by casting rays
/// from the center to every border pixel.
#[derive(Clone, Copy, Debug)]
pub struct MaskSynthesizer {
    opts: SynthesizerOptions,
}

impl MaskSynthesizer {
    /// The fill color of synthesized masks. Only alpha matters downstream.
    const FILL: Color = Color::OPAQUE_BLACK;

    /// Build a synthesizer with validated options.
    pub fn new(opts: SynthesizerOptions) -> TokenforgeResult<Self> {
        if opts.sample_stride == 0 {
            return Err(TokenforgeError::validation("sample_stride must be >= 1"));
        }
        Ok(Self { opts })
    }

    /// Build a synthesizer with the default options.
    pub fn with_defaults() -> Self {
        Self {
            opts: SynthesizerOptions::default(),
        }
    }

    /// The options in effect.
    pub fn options(&self) -> SynthesizerOptions {
        self.opts
    }

    /// Produce a filled silhouette approximating the opaque region of
    /// `source`, with the same dimensions.
    #[tracing::instrument(skip(self, source))]
    pub fn synthesize(&self, source: &Surface) -> TokenforgeResult<Surface> {
        let width = source.width();
        let height = source.height();
        if width == 0 || height == 0 {
            return Err(TokenforgeError::geometry(
                "mask synthesis requires a non-empty source surface",
            ));
        }

        let center = Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
        let rays = self.cast_rays(source, center, width, height);

        let outline: Vec<Point> = rays
            .iter()
            .filter_map(|ray| ray.pixel())
            .map(|pixel| pixel.point)
            .collect();

        let mut distances: Vec<f64> = outline
            .iter()
            .map(|point| point.distance(center))
            .collect();
        distances.sort_by(|a, b| a.total_cmp(b));

        let min = distances.first().copied().unwrap_or(0.0);
        let max = distances.last().copied().unwrap_or(0.0);
        let midpoint_rank = (distances.len() as f64 / 2.0).round() as usize;
        // Midpoint-rank statistic, not a true median; for very short lists
        // the rank can fall just past the end and contributes 0.
        let mean = distances.get(midpoint_rank).copied().unwrap_or(0.0);

        tracing::debug!(
            rays = rays.len(),
            outline = outline.len(),
            min,
            mean,
            max,
            "silhouette outline collected"
        );

        let mut output = Surface::new(width, height)?;
        if min == 0.0 && mean == 0.0 && max == 0.0 {
            // Nothing measurable beyond the center: treat the source as a
            // full-bleed image and mask everything.
            output.fill(Self::FILL)?;
            return Ok(output);
        }

        output.fill_circle(center, max, Self::FILL)?;
        if let Some((first, rest)) = outline.split_first() {
            let mut polygon = BezPath::new();
            polygon.move_to((f64::from(first.x), f64::from(first.y)));
            for point in rest {
                polygon.line_to((f64::from(point.x), f64::from(point.y)));
            }
            polygon.close_path();
            output.fill_path(&polygon, Self::FILL)?;
        }

        Ok(output)
    }

    /// Cast a ray to every border point, analyzing every `sample_stride`-th
    /// one. When a sampled ray finds no outline pixel, the immediately
    /// preceding unanalyzed rays are analyzed until one yields a pixel or
    /// the unsampled run is exhausted.
    fn cast_rays(&self, source: &Surface, center: Point, width: u32, height: u32) -> Vec<Ray> {
        let count = (2 * width + 2 * height.saturating_sub(2)) as usize;
        let mut rays: Vec<Ray> = Vec::with_capacity(count);

        for index in 0..count {
            let mut ray = Ray::new(center, border_point(width, height, index));
            if index.is_multiple_of(self.opts.sample_stride) {
                ray.analyze(source, self.opts.opaque_alpha, self.opts.minimum_alpha);

                if ray.pixel().is_none() {
                    let mut back = index;
                    while back > 0 {
                        back -= 1;
                        if rays[back].is_analyzed() {
                            break;
                        }
                        rays[back].analyze(
                            source,
                            self.opts.opaque_alpha,
                            self.opts.minimum_alpha,
                        );
                        if rays[back].pixel().is_some() {
                            break;
                        }
                    }
                }
            }
            rays.push(ray);
        }

        rays
    }
}

/// Coordinate of the n-th border pixel, clockwise from the top-left corner.
fn border_point(width: u32, height: u32, index: usize) -> Point {
    let w = width as i64;
    let h = height as i64;
    let mut pos = index as i64;

    if pos < w - 1 {
        return Point::from_ints(pos as i32, 0);
    }
    pos -= w - 1;
    if pos < h - 1 {
        return Point::from_ints((w - 1) as i32, pos as i32);
    }
    pos -= h - 1;
    if pos < w {
        return Point::from_ints((w - 1 - pos) as i32, (h - 1) as i32);
    }
    pos -= w - 1;
    Point::from_ints(0, (h - 1 - pos) as i32)
}

#[cfg(test)]
#[path = "../../tests/unit/mask/synthesizer.rs"]
mod tests;
