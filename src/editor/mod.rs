//! The editor: an ordered layer stack composited into one destination
//! surface.

use kurbo::Affine;

use crate::assets::decode::encode_png;
use crate::foundation::color::Color;
use crate::foundation::error::{TokenforgeError, TokenforgeResult};
use crate::layer::{Layer, LayerData, LayerId, LayerKind, LayerOptions};
use crate::surface::{LAYER_BLEND_IDENTIFIERS, LayerBlend, Surface};

/// Per-layer render options applied while compositing.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderOptions {
    /// Layer opacity in `[0, 1]`.
    pub alpha: f64,
    /// Compositing mode used when drawing the layer.
    pub blend: LayerBlend,
    /// Locked layers are skipped by pointer-gesture transforms.
    pub locked: bool,
    /// Invisible layers are skipped while compositing.
    pub visible: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            blend: LayerBlend::default(),
            locked: false,
            visible: true,
        }
    }
}

/// One stack entry: a layer plus its render options.
#[derive(Clone, Debug)]
pub struct LayerEntry {
    /// The layer content.
    pub layer: Layer,
    /// Render options for this entry.
    pub options: RenderOptions,
}

/// Reference to a stack entry, either by layer id or by current index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerRef {
    /// Stable layer identity.
    Id(LayerId),
    /// Current stack position (0 = topmost).
    Index(usize),
}

impl From<LayerId> for LayerRef {
    fn from(id: LayerId) -> Self {
        Self::Id(id)
    }
}

impl From<usize> for LayerRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Direction of a stack move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward the top of the stack (index 0).
    Up,
    /// Toward the bottom of the stack.
    Down,
}

/// A transform applied to every unlocked layer at once (pointer gestures).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformOp {
    /// Shift by a percentage of each layer's canvas edge.
    TranslatePercent {
        /// Horizontal shift in percent.
        dx: f64,
        /// Vertical shift in percent.
        dy: f64,
    },
    /// Rotate by degrees.
    Rotate(f64),
    /// Adjust zoom in wheel steps.
    Zoom(f64),
}

/// Serializable snapshot of one stack entry.
#[derive(Clone, Debug, serde::Serialize)]
pub struct LayerSnapshot {
    /// Content state of the layer.
    #[serde(flatten)]
    pub layer: LayerData,
    /// Ordinal label of the referenced foreign-mask layer, `"Z"` when none.
    pub foreign_mask_label: String,
    /// Opacity as an integer percentage.
    pub alpha_percent: u8,
    /// Compositing mode identifier.
    pub blend: LayerBlend,
    /// Whether the layer is locked.
    pub is_locked: bool,
    /// Whether the layer is visible.
    pub is_visible: bool,
}

/// Serializable snapshot of the whole editor.
#[derive(Clone, Debug, serde::Serialize)]
pub struct EditorData {
    /// Destination edge length.
    pub size: u32,
    /// Per-layer snapshots, topmost first.
    pub layers: Vec<LayerSnapshot>,
}

/// Ordered layer stack plus the square destination surface it composites
/// into. Entry 0 is the topmost layer; new layers are inserted on top.
#[derive(Debug)]
pub struct Editor {
    size: u32,
    destination: Surface,
    layers: Vec<LayerEntry>,
}

impl Editor {
    /// Default destination edge length.
    pub const DEFAULT_SIZE: u32 = 480;

    const ORDINAL_GLYPHS: [&'static str; 21] = [
        "⓿", "❶", "❷", "❸", "❹", "❺", "❻", "❼", "❽", "❾", "❿", "⓫", "⓬", "⓭", "⓮", "⓯",
        "⓰", "⓱", "⓲", "⓳", "⓴",
    ];

    /// Create an editor with a `size`x`size` destination surface.
    pub fn new(size: u32) -> TokenforgeResult<Self> {
        Ok(Self {
            size,
            destination: Surface::new(size, size)?,
            layers: Vec::new(),
        })
    }

    /// Destination edge length.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The composited destination surface.
    pub fn destination(&self) -> &Surface {
        &self.destination
    }

    /// The stack entries, topmost first.
    pub fn entries(&self) -> &[LayerEntry] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The closed set of recognized blend-mode identifiers.
    pub fn blend_mode_identifiers() -> &'static [&'static str] {
        LAYER_BLEND_IDENTIFIERS
    }

    /// Resolve a layer reference to its current stack index.
    pub fn find_layer_index(&self, layer: impl Into<LayerRef>) -> Option<usize> {
        match layer.into() {
            LayerRef::Id(id) => self.index_of_id(id),
            LayerRef::Index(index) => (index < self.layers.len()).then_some(index),
        }
    }

    /// The layer behind a reference, if present.
    pub fn layer(&self, layer: impl Into<LayerRef>) -> Option<&Layer> {
        self.find_layer_index(layer).map(|i| &self.layers[i].layer)
    }

    /// The render options of a referenced layer, if present.
    pub fn layer_options(&self, layer: impl Into<LayerRef>) -> Option<RenderOptions> {
        self.find_layer_index(layer).map(|i| self.layers[i].options)
    }

    /// Decode `bytes` into a new layer and add it on top of the stack with
    /// default render options.
    pub fn add_image_bytes(
        &mut self,
        bytes: &[u8],
        options: LayerOptions,
    ) -> TokenforgeResult<EditorData> {
        let layer = Layer::from_image_bytes(bytes, options)?;
        self.add_layer(layer, RenderOptions::default())
    }

    /// Add a solid tint layer on top of the stack.
    pub fn add_tint(&mut self, color: Color) -> TokenforgeResult<EditorData> {
        let options = LayerOptions {
            name: color.to_string(),
            kind: LayerKind::Tint,
            ..LayerOptions::default()
        };
        let layer = Layer::from_color(color, options)?;
        self.add_layer(layer, RenderOptions::default())
    }

    /// Insert `layer` as the topmost stack entry.
    pub fn add_layer(
        &mut self,
        layer: Layer,
        options: RenderOptions,
    ) -> TokenforgeResult<EditorData> {
        if self.index_of_id(layer.id()).is_some() {
            return Err(TokenforgeError::validation(
                "layer id is already present in this editor",
            ));
        }
        self.layers.insert(0, LayerEntry { layer, options });
        self.refresh_layer(0)?;
        self.finish()
    }

    /// Remove a layer, clearing any foreign-mask references to it first.
    pub fn remove_layer(&mut self, layer: impl Into<LayerRef>) -> TokenforgeResult<EditorData> {
        let Some(index) = self.find_layer_index(layer) else {
            return self.finish();
        };
        let removed_id = self.layers[index].layer.id();

        let dependents: Vec<LayerId> = self
            .layers
            .iter()
            .filter(|e| e.layer.id() != removed_id && e.layer.foreign_mask() == Some(removed_id))
            .map(|e| e.layer.id())
            .collect();
        for id in &dependents {
            if let Some(i) = self.index_of_id(*id) {
                self.layers[i].layer.remove_foreign_mask();
            }
        }

        self.layers.remove(index);
        for id in dependents {
            if let Some(i) = self.index_of_id(id) {
                self.redraw_layer_at(i)?;
            }
        }
        self.finish()
    }

    /// Exchange two stack positions. Self-inverse.
    pub fn swap_layers(
        &mut self,
        a: impl Into<LayerRef>,
        b: impl Into<LayerRef>,
    ) -> TokenforgeResult<EditorData> {
        let (Some(ai), Some(bi)) = (self.find_layer_index(a), self.find_layer_index(b)) else {
            return self.finish();
        };
        self.layers.swap(ai, bi);
        self.finish()
    }

    /// Move a layer toward the top or bottom, clamped at the stack bounds.
    /// A move that does not change the index is a no-op redraw.
    pub fn move_layer(
        &mut self,
        layer: impl Into<LayerRef>,
        direction: Direction,
        steps: usize,
    ) -> TokenforgeResult<EditorData> {
        let Some(index) = self.find_layer_index(layer) else {
            return self.finish();
        };
        let target = match direction {
            Direction::Up => index.saturating_sub(steps),
            Direction::Down => (index + steps).min(self.layers.len() - 1),
        };
        if target != index {
            self.layers.swap(index, target);
        }
        self.finish()
    }

    /// Flip a layer's visibility flag.
    pub fn toggle_layer_visibility(
        &mut self,
        layer: impl Into<LayerRef>,
    ) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            let options = &mut self.layers[index].options;
            options.visible = !options.visible;
        }
        self.finish()
    }

    /// Make a layer visible.
    pub fn show_layer(&mut self, layer: impl Into<LayerRef>) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            self.layers[index].options.visible = true;
        }
        self.finish()
    }

    /// Hide a layer from the composite.
    pub fn hide_layer(&mut self, layer: impl Into<LayerRef>) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            self.layers[index].options.visible = false;
        }
        self.finish()
    }

    /// Flip a layer's lock flag.
    pub fn toggle_layer_lock(
        &mut self,
        layer: impl Into<LayerRef>,
    ) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            let options = &mut self.layers[index].options;
            options.locked = !options.locked;
        }
        self.finish()
    }

    /// Set a layer's opacity, clamped to `[0, 1]`.
    pub fn set_layer_alpha(
        &mut self,
        layer: impl Into<LayerRef>,
        alpha: f64,
    ) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            self.layers[index].options.alpha = alpha.clamp(0.0, 1.0);
        }
        self.finish()
    }

    /// Set a layer's blend mode from an identifier.
    ///
    /// Identifiers outside the recognized set are ignored and the previous
    /// value is retained.
    pub fn set_layer_blend_mode(
        &mut self,
        layer: impl Into<LayerRef>,
        identifier: &str,
    ) -> TokenforgeResult<EditorData> {
        match LayerBlend::parse(identifier) {
            Some(blend) => {
                if let Some(index) = self.find_layer_index(layer) {
                    self.layers[index].options.blend = blend;
                }
            }
            None => tracing::debug!(identifier, "ignoring unrecognized blend mode"),
        }
        self.finish()
    }

    /// Recolor a tint layer.
    pub fn set_layer_color(
        &mut self,
        layer: impl Into<LayerRef>,
        color: Color,
    ) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            self.layers[index].layer.set_color(color)?;
            self.refresh_layer(index)?;
        }
        self.finish()
    }

    /// Restore a layer's fit-policy default transform.
    pub fn reset_layer(&mut self, layer: impl Into<LayerRef>) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            self.layers[index].layer.reset();
            self.refresh_layer(index)?;
        }
        self.finish()
    }

    /// Duplicate a layer; the copy lands on top with the same render options.
    pub fn clone_layer(&mut self, layer: impl Into<LayerRef>) -> TokenforgeResult<EditorData> {
        let Some(index) = self.find_layer_index(layer) else {
            return self.finish();
        };
        let copy = self.layers[index].layer.duplicate();
        let options = self.layers[index].options;
        self.add_layer(copy, options)
    }

    /// Toggle a layer's horizontal flip.
    pub fn mirror_layer(&mut self, layer: impl Into<LayerRef>) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            self.layers[index].layer.mirror();
            self.refresh_layer(index)?;
        }
        self.finish()
    }

    /// Point a layer's foreign-mask reference at another layer.
    pub fn set_foreign_mask(
        &mut self,
        layer: impl Into<LayerRef>,
        mask_layer: impl Into<LayerRef>,
    ) -> TokenforgeResult<EditorData> {
        let (Some(index), Some(mask_index)) = (
            self.find_layer_index(layer),
            self.find_layer_index(mask_layer),
        ) else {
            return self.finish();
        };
        let mask_id = self.layers[mask_index].layer.id();
        self.layers[index].layer.set_foreign_mask(mask_id);
        self.refresh_layer(index)?;
        self.finish()
    }

    /// Clear a layer's foreign-mask reference.
    pub fn remove_foreign_mask(
        &mut self,
        layer: impl Into<LayerRef>,
    ) -> TokenforgeResult<EditorData> {
        if let Some(index) = self.find_layer_index(layer) {
            self.layers[index].layer.remove_foreign_mask();
            self.refresh_layer(index)?;
        }
        self.finish()
    }

    /// Advance a layer's foreign-mask reference one position toward the top,
    /// starting at the bottom layer and wrapping to "no mask" past the top.
    pub fn cycle_foreign_mask(
        &mut self,
        layer: impl Into<LayerRef>,
    ) -> TokenforgeResult<EditorData> {
        let Some(index) = self.find_layer_index(layer) else {
            return self.finish();
        };

        let current = self.layers[index]
            .layer
            .foreign_mask()
            .and_then(|id| self.index_of_id(id));
        let next = match current {
            None => Some(self.layers.len() - 1),
            Some(0) => None,
            Some(mask_index) => Some(mask_index - 1),
        };

        match next {
            Some(mask_index) => {
                let mask_id = self.layers[mask_index].layer.id();
                self.layers[index].layer.set_foreign_mask(mask_id);
            }
            None => self.layers[index].layer.remove_foreign_mask(),
        }
        self.refresh_layer(index)?;
        self.finish()
    }

    /// Display ordinal of a layer counted from the bottom of the stack
    /// (bottom layer is ❶), `"Z"` for an unresolvable reference.
    ///
    /// Derived from the current order on every call; never stored.
    pub fn layer_ordinal(&self, layer: impl Into<LayerRef>) -> String {
        match self.find_layer_index(layer) {
            None => "Z".to_string(),
            Some(index) => {
                let rank = (self.layers.len() - index).min(Self::ORDINAL_GLYPHS.len() - 1);
                Self::ORDINAL_GLYPHS[rank].to_string()
            }
        }
    }

    /// Apply a transform to every unlocked layer (pointer gestures fan out
    /// over the whole stack).
    pub fn transform_unlocked(&mut self, op: TransformOp) -> TokenforgeResult<EditorData> {
        let targets: Vec<usize> = self
            .layers
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.options.locked)
            .map(|(i, _)| i)
            .collect();

        for &index in &targets {
            let layer = &mut self.layers[index].layer;
            match op {
                TransformOp::TranslatePercent { dx, dy } => layer.translate_percent(dx, dy),
                TransformOp::Rotate(delta) => layer.rotate(delta),
                TransformOp::Zoom(delta) => layer.zoom(delta),
            }
        }
        for &index in &targets {
            self.refresh_layer(index)?;
        }
        self.finish()
    }

    /// Composite the stack into the destination surface, bottom to top,
    /// skipping invisible entries.
    ///
    /// Idempotent; no state is accumulated beyond the destination pixels.
    #[tracing::instrument(skip(self))]
    pub fn draw(&mut self) -> TokenforgeResult<()> {
        self.destination.clear();
        let size = f64::from(self.size);

        for entry in self.layers.iter().rev() {
            if !entry.options.visible {
                continue;
            }
            let canvas = entry.layer.canvas();
            let scale = Affine::scale_non_uniform(
                size / f64::from(canvas.width()),
                size / f64::from(canvas.height()),
            );
            self.destination.draw_surface_layered(
                canvas,
                scale,
                entry.options.blend,
                entry.options.alpha as f32,
            )?;
        }
        Ok(())
    }

    /// Snapshot of the editor state for the UI.
    pub fn data(&self) -> TokenforgeResult<EditorData> {
        let layers = self
            .layers
            .iter()
            .map(|entry| {
                let layer = entry.layer.data()?;
                let foreign_mask_label = match entry.layer.foreign_mask() {
                    Some(id) => self.layer_ordinal(id),
                    None => "Z".to_string(),
                };
                Ok(LayerSnapshot {
                    layer,
                    foreign_mask_label,
                    alpha_percent: (entry.options.alpha * 100.0).round() as u8,
                    blend: entry.options.blend,
                    is_locked: entry.options.locked,
                    is_visible: entry.options.visible,
                })
            })
            .collect::<TokenforgeResult<Vec<_>>>()?;
        Ok(EditorData {
            size: self.size,
            layers,
        })
    }

    /// The final composite encoded as PNG bytes.
    pub fn blob(&self) -> TokenforgeResult<Vec<u8>> {
        encode_png(&self.destination)
    }

    fn finish(&mut self) -> TokenforgeResult<EditorData> {
        self.draw()?;
        self.data()
    }

    fn index_of_id(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|e| e.layer.id() == id)
    }

    fn redraw_layer_at(&mut self, index: usize) -> TokenforgeResult<()> {
        let foreign = match self.layers[index].layer.foreign_mask() {
            Some(id) => match self.index_of_id(id) {
                Some(mask_index) => Some(self.layers[mask_index].layer.mask().clone()),
                None => {
                    tracing::debug!(?id, "foreign mask layer not present; drawing unmasked");
                    None
                }
            },
            None => None,
        };
        self.layers[index].layer.draw(foreign.as_ref())
    }

    /// Redraw one layer and every layer whose foreign mask references it.
    fn refresh_layer(&mut self, index: usize) -> TokenforgeResult<()> {
        self.redraw_layer_at(index)?;
        let id = self.layers[index].layer.id();
        let dependents: Vec<usize> = self
            .layers
            .iter()
            .enumerate()
            .filter(|(i, e)| *i != index && e.layer.foreign_mask() == Some(id))
            .map(|(i, _)| i)
            .collect();
        for dependent in dependents {
            self.redraw_layer_at(dependent)?;
        }
        Ok(())
    }
}

/// Last path segment of a URL, without any query string; `"Unknown"` when
/// the URL has no usable segment. Used to derive layer display names.
pub fn extract_filename_from_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or("");
    if let Some(idx) = path.rfind('/')
        && idx >= 1
        && idx + 1 < path.len()
    {
        return path[idx + 1..].to_string();
    }
    "Unknown".to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/editor/editor.rs"]
mod tests;
