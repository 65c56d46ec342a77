//! Tokenforge is a layer compositing and silhouette-mask engine for
//! virtual-tabletop token images.
//!
//! A token is composed from an ordered stack of layers (character art,
//! decorative frames, color tints). Each layer carries its original art, a
//! silhouette mask derived from it, and a position/rotation/zoom/flip
//! transform; the editor composites the stack deterministically into one
//! square destination surface and exports it as PNG bytes.
//!
//! # Pipeline overview
//!
//! 1. **Ingest**: [`decode_image`] turns encoded bytes into a premultiplied
//!    RGBA8 [`Surface`]; [`Layer`] factories place the art on a square
//!    working canvas and derive its mask.
//! 2. **Mask**: [`MaskSynthesizer`] casts rays from the surface center to
//!    every border pixel and fills the resulting silhouette.
//! 3. **Transform**: [`Layer::draw`] re-applies the current transform (and
//!    an optional foreign mask) to the cached originals.
//! 4. **Composite**: [`Editor::draw`] renders visible layers bottom to top
//!    with per-layer blend modes and opacity; [`Editor::blob`] encodes the
//!    result.
//!
//! The engine is fully synchronous and deterministic: every stack-mutating
//! editor operation performs its redraw before returning. External IO is
//! limited to the caller-supplied image bytes.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod editor;
mod foundation;
mod layer;
mod mask;
mod surface;

pub use assets::decode::{decode_image, encode_png};
pub use editor::{
    Direction, Editor, EditorData, LayerEntry, LayerRef, LayerSnapshot, RenderOptions,
    TransformOp, extract_filename_from_url,
};
pub use foundation::color::Color;
pub use foundation::error::{TokenforgeError, TokenforgeResult};
pub use foundation::geom::{Dimension, Point};
pub use layer::{
    FitPolicy, Layer, LayerData, LayerId, LayerKind, LayerOptions, ThumbnailTarget, Thumbnails,
};
pub use mask::ray::{Ray, RayPixel, Segment};
pub use mask::synthesizer::{MaskSynthesizer, SynthesizerOptions};
pub use surface::{
    BlendMode, CompositeMode, LAYER_BLEND_IDENTIFIERS, LayerBlend, Surface, SurfacePixels,
};
