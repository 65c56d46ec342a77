//! Raster surfaces and the compositing kernels that combine them.

use std::fmt;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Circle, PathEl, Rect, Shape};

use crate::foundation::color::Color;
use crate::foundation::error::{TokenforgeError, TokenforgeResult};
use crate::foundation::geom::{Dimension, Point};

mod composite;

pub use composite::{BlendMode, CompositeMode, LAYER_BLEND_IDENTIFIERS, LayerBlend};

pub(crate) use composite::premultiply_rgba8_in_place;

/// Widest/tallest surface the rasterizer can address.
const MAX_EDGE: u32 = u16::MAX as u32;

/// Flattening tolerance when converting circles to fill paths.
const PATH_TOLERANCE: f64 = 0.1;

/// A fixed-size premultiplied-RGBA8 pixel buffer with a drawing context.
///
/// Surfaces are never resized after creation; producing a different size
/// means creating a new surface and drawing into it.
pub struct Surface {
    pixmap: vello_cpu::Pixmap,
    width: u32,
    height: u32,
}

impl Surface {
    /// Create a transparent surface. Zero-area and over-limit dimensions are rejected.
    pub fn new(width: u32, height: u32) -> TokenforgeResult<Self> {
        if width == 0 || height == 0 {
            return Err(TokenforgeError::geometry(format!(
                "surface dimensions must be non-zero (got {width}x{height})"
            )));
        }
        if width > MAX_EDGE || height > MAX_EDGE {
            return Err(TokenforgeError::geometry(format!(
                "surface dimensions exceed the rasterizer limit of {MAX_EDGE} (got {width}x{height})"
            )));
        }
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(width as u16, height as u16),
            width,
            height,
        })
    }

    /// Create a surface from straight-alpha RGBA8 bytes (row-major, 4 bytes per pixel).
    pub fn from_rgba8(width: u32, height: u32, rgba8: &[u8]) -> TokenforgeResult<Self> {
        let mut premul = rgba8.to_vec();
        premultiply_rgba8_in_place(&mut premul);
        Self::from_premul_rgba8(width, height, &premul)
    }

    /// Create a surface from premultiplied RGBA8 bytes.
    pub(crate) fn from_premul_rgba8(
        width: u32,
        height: u32,
        premul: &[u8],
    ) -> TokenforgeResult<Self> {
        let mut surface = Self::new(width, height)?;
        let expected = (width as usize) * (height as usize) * 4;
        if premul.len() != expected {
            return Err(TokenforgeError::render(format!(
                "pixel buffer length {} does not match {width}x{height}",
                premul.len()
            )));
        }
        surface.pixmap = pixmap_from_premul(premul, width, height);
        Ok(surface)
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width/height as a [`Dimension`].
    pub fn dimension(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }

    /// Reset every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    /// Sample one pixel as a straight-alpha color. `None` outside bounds.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let data = self.pixmap.data_as_u8_slice();
        let mut px = [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]];
        composite::unpremultiply_rgba8_in_place(&mut px);
        Some(Color::new(px[0], px[1], px[2], px[3]))
    }

    /// Full straight-alpha readback of the pixel buffer.
    pub fn pixels(&self) -> SurfacePixels {
        let mut rgba8 = self.pixmap.data_as_u8_slice().to_vec();
        composite::unpremultiply_rgba8_in_place(&mut rgba8);
        SurfacePixels {
            width: self.width,
            height: self.height,
            rgba8,
        }
    }

    /// Draw `src` under `transform` and combine with a Porter-Duff operator
    /// and global opacity.
    pub fn draw_surface(
        &mut self,
        src: &Surface,
        transform: Affine,
        mode: CompositeMode,
        opacity: f32,
    ) -> TokenforgeResult<()> {
        let scratch = self.rasterize_image(src, transform);
        composite::composite_premul(
            self.pixmap.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
            mode,
            opacity,
        )
    }

    /// Draw `src` under `transform` and combine with a separable blend mode
    /// and global opacity.
    pub fn draw_surface_blended(
        &mut self,
        src: &Surface,
        transform: Affine,
        blend: BlendMode,
        opacity: f32,
    ) -> TokenforgeResult<()> {
        let scratch = self.rasterize_image(src, transform);
        composite::blend_premul(
            self.pixmap.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
            blend,
            opacity,
        )
    }

    /// Draw `src` with a per-layer blend choice.
    pub fn draw_surface_layered(
        &mut self,
        src: &Surface,
        transform: Affine,
        blend: LayerBlend,
        opacity: f32,
    ) -> TokenforgeResult<()> {
        match blend {
            LayerBlend::Composite(mode) => self.draw_surface(src, transform, mode, opacity),
            LayerBlend::Blend(mode) => self.draw_surface_blended(src, transform, mode, opacity),
        }
    }

    /// Fill a path (non-zero winding) with `color`, source-over.
    pub fn fill_path(&mut self, path: &BezPath, color: Color) -> TokenforgeResult<()> {
        let scratch = self.rasterize(|ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r,
                color.g,
                color.b,
                color.alpha,
            ));
            ctx.fill_path(&bezpath_to_cpu(path));
        });
        composite::composite_premul(
            self.pixmap.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
            CompositeMode::SourceOver,
            1.0,
        )
    }

    /// Fill a disk centered at `center` with `color`, source-over.
    pub fn fill_circle(
        &mut self,
        center: Point,
        radius: f64,
        color: Color,
    ) -> TokenforgeResult<()> {
        let circle = Circle::new(
            (f64::from(center.x), f64::from(center.y)),
            radius.max(0.0),
        );
        let mut path = BezPath::new();
        for el in circle.path_elements(PATH_TOLERANCE) {
            path.push(el);
        }
        self.fill_path(&path, color)
    }

    /// Fill the whole surface with `color`, source-over.
    pub fn fill(&mut self, color: Color) -> TokenforgeResult<()> {
        let rect = Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height));
        self.fill_path(&rect.to_path(PATH_TOLERANCE), color)
    }

    fn rasterize_image(&self, src: &Surface, transform: Affine) -> vello_cpu::Pixmap {
        let paint = src.as_image_paint();
        let (w, h) = (f64::from(src.width), f64::from(src.height));
        self.rasterize(|ctx| {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        })
    }

    fn rasterize(&self, f: impl FnOnce(&mut vello_cpu::RenderContext)) -> vello_cpu::Pixmap {
        let mut ctx = vello_cpu::RenderContext::new(self.width as u16, self.height as u16);
        let mut scratch = vello_cpu::Pixmap::new(self.width as u16, self.height as u16);
        f(&mut ctx);
        ctx.flush();
        ctx.render_to_pixmap(&mut scratch);
        scratch
    }

    fn as_image_paint(&self) -> vello_cpu::Image {
        let pixmap = pixmap_from_premul(self.pixmap.data_as_u8_slice(), self.width, self.height);
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }
}

impl Clone for Surface {
    fn clone(&self) -> Self {
        Self {
            pixmap: pixmap_from_premul(self.pixmap.data_as_u8_slice(), self.width, self.height),
            width: self.width,
            height: self.height,
        }
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Straight-alpha RGBA8 readback of a surface.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfacePixels {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major straight-alpha RGBA8 bytes.
    pub rgba8: Vec<u8>,
}

fn pixmap_from_premul(bytes: &[u8], width: u32, height: u32) -> vello_cpu::Pixmap {
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    vello_cpu::Pixmap::from_parts_with_opacity(pixels, width as u16, height as u16, true)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/surface/surface.rs"]
mod tests;
