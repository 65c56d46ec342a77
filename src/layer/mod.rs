//! Layers: cached source art plus a derived silhouette mask, drawn through
//! a position/rotation/zoom/flip transform.

use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::Affine;

use crate::assets::decode::decode_image;
use crate::foundation::color::Color;
use crate::foundation::error::{TokenforgeError, TokenforgeResult};
use crate::foundation::geom::{Dimension, Point};
use crate::mask::synthesizer::MaskSynthesizer;
use crate::surface::{CompositeMode, Surface, SurfacePixels};

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a layer for its lifetime.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(u64);

impl LayerId {
    fn next() -> Self {
        Self(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Origin of a layer's content.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Image supplied by the user's machine.
    LocalImage,
    /// Image fetched from a third-party host.
    RemoteImage,
    /// Image stored on the game server.
    ServerImage,
    /// Solid color fill.
    Tint,
    /// Unspecified origin.
    #[default]
    Unknown,
}

/// Rule determining a layer's default zoom and position.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FitPolicy {
    /// Scale so the whole source fits inside the destination square.
    #[default]
    Contain,
    /// Scale so the source fully covers the destination square, centered.
    Cover,
}

/// Construction options for a layer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayerOptions {
    /// Display name.
    pub name: String,
    /// Content origin tag.
    pub kind: LayerKind,
    /// Default-transform fit rule.
    pub fit: FitPolicy,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            kind: LayerKind::Unknown,
            fit: FitPolicy::Contain,
        }
    }
}

/// Which of a layer's live surfaces a thumbnail is taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailTarget {
    /// The transformed content surface.
    Canvas,
    /// The transformed mask surface.
    Mask,
}

/// Thumbnail pair included in a layer snapshot.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Thumbnails {
    /// Scaled-down content surface.
    pub canvas: SurfacePixels,
    /// Scaled-down mask surface.
    pub mask: SurfacePixels,
}

/// Serializable snapshot of one layer's content state.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerData {
    /// Layer identity.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Content origin tag.
    pub kind: LayerKind,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Translation offset.
    pub position: Point,
    /// Zoom factor.
    pub zoom: f64,
    /// Tint color for tint layers, otherwise the derived border color, as hex.
    pub color: String,
    /// 32-pixel thumbnails of the live surfaces.
    pub thumbnails: Thumbnails,
    /// Whether the transform differs from the fit-policy default.
    pub is_transformed: bool,
    /// Foreign-mask reference, if any.
    pub foreign_mask: Option<LayerId>,
}

struct DefaultTransform {
    position: Point,
    zoom: f64,
    rotation: f64,
}

/// A stack entry's content: cached original art and silhouette mask plus
/// the live, transform-applied surfaces.
#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    name: String,
    kind: LayerKind,
    fit: FitPolicy,
    natural_size: Dimension,
    cache_canvas: Surface,
    cache_mask: Surface,
    canvas: Surface,
    mask: Surface,
    center: Point,
    position: Point,
    zoom_factor: f64,
    rotation: f64,
    flip: f64,
    foreign_mask: Option<LayerId>,
    border_color: Color,
    color: Option<Color>,
}

impl Layer {
    /// Edge length of the square canvas backing tint layers.
    pub const DEFAULT_TINT_SIZE: u32 = 480;

    /// Edge length of snapshot thumbnails.
    pub const THUMBNAIL_SIZE: u32 = 32;

    const BORDER_STRIPE: u32 = 10;

    /// Create a layer from encoded image bytes.
    ///
    /// The decoded image is centered on a square canvas whose edge is the
    /// image diagonal, so any rotation stays inside the canvas. Decode
    /// failures are returned and no layer is created.
    pub fn from_image_bytes(bytes: &[u8], options: LayerOptions) -> TokenforgeResult<Self> {
        let image = decode_image(bytes)?;
        Self::from_surface(image, options)
    }

    /// Create a layer from an already-decoded source surface.
    pub fn from_surface(image: Surface, options: LayerOptions) -> TokenforgeResult<Self> {
        let natural = image.dimension();
        let edge = natural.diagonal().round().max(1.0) as u32;
        let mut canvas = Surface::new(edge, edge)?;
        let offset = kurbo::Vec2::new(
            (f64::from(edge) - f64::from(natural.width)) / 2.0,
            (f64::from(edge) - f64::from(natural.height)) / 2.0,
        );
        canvas.draw_surface(
            &image,
            Affine::translate(offset),
            CompositeMode::SourceOver,
            1.0,
        )?;
        Self::from_canvas(canvas, natural, options, None)
    }

    /// Create a solid tint layer.
    pub fn from_color(color: Color, options: LayerOptions) -> TokenforgeResult<Self> {
        let edge = Self::DEFAULT_TINT_SIZE;
        let mut canvas = Surface::new(edge, edge)?;
        canvas.fill(color)?;
        let options = LayerOptions {
            kind: LayerKind::Tint,
            ..options
        };
        Self::from_canvas(canvas, Dimension::new(edge, edge), options, Some(color))
    }

    fn from_canvas(
        canvas: Surface,
        natural_size: Dimension,
        options: LayerOptions,
        color: Option<Color>,
    ) -> TokenforgeResult<Self> {
        let cache_mask = MaskSynthesizer::with_defaults().synthesize(&canvas)?;
        let border_color = Self::border_color_of(&canvas, natural_size);
        let center = Point::new(
            f64::from(canvas.width()) / 2.0,
            f64::from(canvas.height()) / 2.0,
        );
        let live_canvas = Surface::new(canvas.width(), canvas.height())?;
        let live_mask = live_canvas.clone();

        let mut layer = Self {
            id: LayerId::next(),
            name: options.name,
            kind: options.kind,
            fit: options.fit,
            natural_size,
            cache_canvas: canvas,
            cache_mask,
            canvas: live_canvas,
            mask: live_mask,
            center,
            position: Point::ZERO,
            zoom_factor: 0.0,
            rotation: 0.0,
            flip: 1.0,
            foreign_mask: None,
            border_color,
            color,
        };

        let defaults = layer.default_transform();
        layer.position = defaults.position;
        layer.zoom_factor = defaults.zoom;
        layer.rotation = defaults.rotation;
        layer.draw(None)?;
        Ok(layer)
    }

    /// Layer identity.
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content origin tag.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// The fit rule chosen at creation.
    pub fn fit(&self) -> FitPolicy {
        self.fit
    }

    /// Natural (pre-placement) size of the source image.
    pub fn natural_size(&self) -> Dimension {
        self.natural_size
    }

    /// The live, transform-applied content surface.
    pub fn canvas(&self) -> &Surface {
        &self.canvas
    }

    /// The live, transform-applied mask surface.
    pub fn mask(&self) -> &Surface {
        &self.mask
    }

    /// Current translation offset.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Current zoom factor.
    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Current rotation in degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Horizontal flip sign (`1` or `-1`).
    pub fn flip(&self) -> f64 {
        self.flip
    }

    /// The referenced foreign-mask layer, if any.
    pub fn foreign_mask(&self) -> Option<LayerId> {
        self.foreign_mask
    }

    /// Average border color derived from the source at construction.
    pub fn border_color(&self) -> Color {
        self.border_color
    }

    /// Tint color, for tint layers.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Shift the layer by `delta` pixels.
    pub fn translate(&mut self, delta: Point) {
        if delta != Point::ZERO {
            self.position = Point::from_ints(self.position.x + delta.x, self.position.y + delta.y);
        }
    }

    /// Shift the layer by a percentage of its canvas edge per axis.
    pub fn translate_percent(&mut self, dx_percent: f64, dy_percent: f64) {
        self.translate(Point::new(
            dx_percent * f64::from(self.canvas.width()) / 100.0,
            dy_percent * f64::from(self.canvas.height()) / 100.0,
        ));
    }

    /// Rotate by `delta` degrees.
    pub fn rotate(&mut self, delta: f64) {
        if delta != 0.0 {
            self.rotation += delta;
        }
    }

    /// Adjust zoom; each unit of `delta` removes 0.01 from the zoom factor.
    pub fn zoom(&mut self, delta: f64) {
        if delta != 0.0 {
            self.zoom_factor -= 0.01 * delta;
        }
    }

    /// Toggle the horizontal flip.
    pub fn mirror(&mut self) {
        self.flip = -self.flip;
    }

    /// Restore the fit-policy default position, zoom and rotation.
    ///
    /// The flip sign is deliberately left alone.
    pub fn reset(&mut self) {
        let defaults = self.default_transform();
        self.position = defaults.position;
        self.zoom_factor = defaults.zoom;
        self.rotation = defaults.rotation;
    }

    /// Whether position, zoom or rotation differ from the fit-policy default.
    pub fn is_transformed(&self) -> bool {
        let defaults = self.default_transform();
        self.rotation != defaults.rotation
            || self.position != defaults.position
            || self.zoom_factor != defaults.zoom
    }

    /// Point a foreign-mask reference at another layer.
    pub fn set_foreign_mask(&mut self, id: LayerId) {
        self.foreign_mask = Some(id);
    }

    /// Clear the foreign-mask reference.
    pub fn remove_foreign_mask(&mut self) {
        self.foreign_mask = None;
    }

    /// Replace the cached mask surface (the mask-editor hand-off).
    pub fn set_mask_surface(&mut self, mask: Surface) -> TokenforgeResult<()> {
        if mask.dimension() != self.cache_canvas.dimension() {
            return Err(TokenforgeError::validation(format!(
                "replacement mask must be {}x{}",
                self.cache_canvas.width(),
                self.cache_canvas.height()
            )));
        }
        self.cache_mask = mask;
        Ok(())
    }

    /// Recolor a tint layer and re-derive its mask.
    pub fn set_color(&mut self, color: Color) -> TokenforgeResult<()> {
        if self.kind != LayerKind::Tint {
            return Err(TokenforgeError::validation(
                "only tint layers can be recolored",
            ));
        }
        self.cache_canvas.fill(color)?;
        self.cache_mask = MaskSynthesizer::with_defaults().synthesize(&self.cache_canvas)?;
        self.color = Some(color);
        Ok(())
    }

    /// Deep copy with a fresh identity.
    pub fn duplicate(&self) -> Layer {
        let mut copy = self.clone();
        copy.id = LayerId::next();
        copy
    }

    /// Scaled-down copy of a live surface.
    pub fn thumbnail(&self, target: ThumbnailTarget, size: u32) -> TokenforgeResult<Surface> {
        let src = match target {
            ThumbnailTarget::Canvas => &self.canvas,
            ThumbnailTarget::Mask => &self.mask,
        };
        let mut out = Surface::new(size, size)?;
        let scale = Affine::scale_non_uniform(
            f64::from(size) / f64::from(src.width()),
            f64::from(size) / f64::from(src.height()),
        );
        out.draw_surface(src, scale, CompositeMode::SourceOver, 1.0)?;
        Ok(out)
    }

    /// Snapshot of the layer's content state.
    pub fn data(&self) -> TokenforgeResult<LayerData> {
        let color = self.color.unwrap_or(self.border_color);
        Ok(LayerData {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            rotation: self.rotation,
            position: self.position,
            zoom: self.zoom_factor,
            color: color.to_string(),
            thumbnails: Thumbnails {
                canvas: self
                    .thumbnail(ThumbnailTarget::Canvas, Self::THUMBNAIL_SIZE)?
                    .pixels(),
                mask: self
                    .thumbnail(ThumbnailTarget::Mask, Self::THUMBNAIL_SIZE)?
                    .pixels(),
            },
            is_transformed: self.is_transformed(),
            foreign_mask: self.foreign_mask,
        })
    }

    /// Recompute both live surfaces from the cached originals.
    ///
    /// The content pass applies the rotation/flip about the canvas center,
    /// then (when a foreign mask is supplied) draws the mask scaled to the
    /// canvas and switches to source-in so only the masked region of the
    /// placed content survives. The mask pass never applies a foreign mask.
    pub fn draw(&mut self, foreign_mask: Option<&Surface>) -> TokenforgeResult<()> {
        let placement = self.placement();

        let intermediate = self.rotated(&self.cache_canvas)?;
        Self::place(&mut self.canvas, &intermediate, placement, foreign_mask)?;

        let intermediate = self.rotated(&self.cache_mask)?;
        Self::place(&mut self.mask, &intermediate, placement, None)
    }

    fn rotated(&self, cache: &Surface) -> TokenforgeResult<Surface> {
        let mut out = Surface::new(cache.width(), cache.height())?;
        let c = self.center.to_vec2();
        let transform = Affine::translate(c)
            * Affine::scale_non_uniform(self.flip, 1.0)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::translate(-c);
        out.draw_surface(cache, transform, CompositeMode::SourceOver, 1.0)?;
        Ok(out)
    }

    fn placement(&self) -> Affine {
        let c = self.center.to_vec2();
        Affine::translate(c)
            * Affine::scale(self.zoom_factor)
            * Affine::translate(-c)
            * Affine::translate(self.position.to_vec2())
    }

    fn place(
        live: &mut Surface,
        content: &Surface,
        placement: Affine,
        foreign_mask: Option<&Surface>,
    ) -> TokenforgeResult<()> {
        live.clear();
        let mode = match foreign_mask {
            Some(mask) => {
                let scale = Affine::scale_non_uniform(
                    f64::from(live.width()) / f64::from(mask.width()),
                    f64::from(live.height()) / f64::from(mask.height()),
                );
                live.draw_surface(mask, scale, CompositeMode::SourceOver, 1.0)?;
                CompositeMode::SourceIn
            }
            None => CompositeMode::SourceOver,
        };
        live.draw_surface(content, placement, mode, 1.0)
    }

    fn default_transform(&self) -> DefaultTransform {
        let edge = f64::from(self.cache_canvas.width());
        let natural_w = f64::from(self.natural_size.width);
        let natural_h = f64::from(self.natural_size.height);

        match self.fit {
            FitPolicy::Contain => DefaultTransform {
                position: Point::ZERO,
                zoom: edge / natural_w.max(natural_h),
                rotation: 0.0,
            },
            FitPolicy::Cover => {
                let zoom = edge / natural_w.min(natural_h);
                let height = f64::from(self.cache_canvas.height());
                DefaultTransform {
                    position: Point::new(
                        -(edge - natural_w * zoom).round() / 2.0,
                        -(height - natural_h * zoom).round() / 2.0,
                    ),
                    zoom,
                    rotation: 0.0,
                }
            }
        }
    }

    /// Average of the fully opaque pixels in a 10-px stripe around the
    /// source region; opaque black when the stripe has none.
    fn border_color_of(canvas: &Surface, natural: Dimension) -> Color {
        let off_x = (i64::from(canvas.width()) - i64::from(natural.width)) / 2;
        let off_y = (i64::from(canvas.height()) - i64::from(natural.height)) / 2;
        let w = i64::from(natural.width);
        let h = i64::from(natural.height);
        let stripe = i64::from(Self::BORDER_STRIPE);

        let mut colors = Vec::new();
        let mut sample = |x: i64, y: i64| {
            let px = (off_x + x).try_into().ok();
            let py = (off_y + y).try_into().ok();
            if let (Some(px), Some(py)) = (px, py)
                && let Some(color) = canvas.pixel(px, py)
            {
                colors.push(color);
            }
        };

        for x in 0..w {
            for y in 0..stripe {
                sample(x, y);
                sample(x, h - y);
            }
        }
        for y in stripe..(h - stripe) {
            for x in 0..stripe {
                sample(x, y);
                sample(w - x, y);
            }
        }

        let opaque: Vec<Color> = colors.into_iter().filter(|c| c.is_opaque()).collect();
        Color::average(&opaque).unwrap_or(Color::OPAQUE_BLACK)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/layer.rs"]
mod tests;
