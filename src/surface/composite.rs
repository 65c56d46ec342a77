use crate::foundation::error::{TokenforgeError, TokenforgeResult};

/// Porter-Duff operator used when combining a drawn source with a destination.
///
/// Operands are premultiplied RGBA8; the operator picks the per-pixel
/// coefficients applied to source and destination.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeMode {
    /// Source over destination (the default painter's model).
    #[default]
    SourceOver,
    /// Source kept only where the destination is opaque.
    SourceIn,
    /// Source kept only where the destination is transparent.
    SourceOut,
    /// Source atop the destination's own coverage.
    SourceAtop,
    /// Destination over source.
    DestinationOver,
    /// Destination kept only where the source is opaque.
    DestinationIn,
    /// Destination kept only where the source is transparent.
    DestinationOut,
    /// Destination atop the source's coverage.
    DestinationAtop,
    /// Additive (plus-lighter).
    Lighter,
    /// Source replaces the destination entirely.
    Copy,
    /// Coverage exclusive-or.
    Xor,
}

/// Separable blend function applied to unpremultiplied channels while
/// alpha composites as source-over.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Plain source-over, no channel mixing.
    #[default]
    Normal,
    /// `s * d`
    Multiply,
    /// `s + d - s * d`
    Screen,
    /// Multiply or screen, split on the destination channel.
    Overlay,
    /// `min(s, d)`
    Darken,
    /// `max(s, d)`
    Lighten,
    /// Brightens the destination toward the source.
    ColorDodge,
    /// Darkens the destination toward the source.
    ColorBurn,
    /// Soft variant of hard-light.
    SoftLight,
    /// Multiply or screen, split on the source channel.
    HardLight,
    /// `|d - s|`
    Difference,
    /// `d + s - 2 * d * s`
    Exclusion,
}

/// Per-layer compositing choice: a Porter-Duff operator or a separable blend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum LayerBlend {
    /// A Porter-Duff compositing operator.
    Composite(CompositeMode),
    /// A separable blend function.
    Blend(BlendMode),
}

impl Default for LayerBlend {
    fn default() -> Self {
        Self::Composite(CompositeMode::SourceOver)
    }
}

/// The closed set of recognized layer blend identifiers.
pub const LAYER_BLEND_IDENTIFIERS: &[&str] = &[
    "source-over",
    "source-in",
    "source-out",
    "source-atop",
    "destination-over",
    "destination-in",
    "destination-out",
    "destination-atop",
    "lighter",
    "copy",
    "xor",
    "multiply",
    "screen",
    "overlay",
    "darken",
    "lighten",
    "color-dodge",
    "color-burn",
    "hard-light",
    "soft-light",
    "difference",
    "exclusion",
];

impl LayerBlend {
    /// Parse a recognized identifier; `None` for anything outside the closed set.
    pub fn parse(identifier: &str) -> Option<Self> {
        use BlendMode as B;
        use CompositeMode as C;
        let mode = match identifier {
            "source-over" => Self::Composite(C::SourceOver),
            "source-in" => Self::Composite(C::SourceIn),
            "source-out" => Self::Composite(C::SourceOut),
            "source-atop" => Self::Composite(C::SourceAtop),
            "destination-over" => Self::Composite(C::DestinationOver),
            "destination-in" => Self::Composite(C::DestinationIn),
            "destination-out" => Self::Composite(C::DestinationOut),
            "destination-atop" => Self::Composite(C::DestinationAtop),
            "lighter" => Self::Composite(C::Lighter),
            "copy" => Self::Composite(C::Copy),
            "xor" => Self::Composite(C::Xor),
            "multiply" => Self::Blend(B::Multiply),
            "screen" => Self::Blend(B::Screen),
            "overlay" => Self::Blend(B::Overlay),
            "darken" => Self::Blend(B::Darken),
            "lighten" => Self::Blend(B::Lighten),
            "color-dodge" => Self::Blend(B::ColorDodge),
            "color-burn" => Self::Blend(B::ColorBurn),
            "hard-light" => Self::Blend(B::HardLight),
            "soft-light" => Self::Blend(B::SoftLight),
            "difference" => Self::Blend(B::Difference),
            "exclusion" => Self::Blend(B::Exclusion),
            _ => return None,
        };
        Some(mode)
    }

    /// The canonical identifier of this mode.
    pub fn identifier(self) -> &'static str {
        use BlendMode as B;
        use CompositeMode as C;
        match self {
            Self::Composite(C::SourceOver) | Self::Blend(B::Normal) => "source-over",
            Self::Composite(C::SourceIn) => "source-in",
            Self::Composite(C::SourceOut) => "source-out",
            Self::Composite(C::SourceAtop) => "source-atop",
            Self::Composite(C::DestinationOver) => "destination-over",
            Self::Composite(C::DestinationIn) => "destination-in",
            Self::Composite(C::DestinationOut) => "destination-out",
            Self::Composite(C::DestinationAtop) => "destination-atop",
            Self::Composite(C::Lighter) => "lighter",
            Self::Composite(C::Copy) => "copy",
            Self::Composite(C::Xor) => "xor",
            Self::Blend(B::Multiply) => "multiply",
            Self::Blend(B::Screen) => "screen",
            Self::Blend(B::Overlay) => "overlay",
            Self::Blend(B::Darken) => "darken",
            Self::Blend(B::Lighten) => "lighten",
            Self::Blend(B::ColorDodge) => "color-dodge",
            Self::Blend(B::ColorBurn) => "color-burn",
            Self::Blend(B::HardLight) => "hard-light",
            Self::Blend(B::SoftLight) => "soft-light",
            Self::Blend(B::Difference) => "difference",
            Self::Blend(B::Exclusion) => "exclusion",
        }
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255(u16::from(px[0]), a);
        px[1] = mul_div255(u16::from(px[1]), a);
        px[2] = mul_div255(u16::from(px[2]), a);
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        let unpremul = |c: u8| -> u8 {
            let v = (u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a);
            v.min(255) as u8
        };
        px[0] = unpremul(px[0]);
        px[1] = unpremul(px[1]);
        px[2] = unpremul(px[2]);
    }
}

/// Combine `src` into `dst` with a Porter-Duff operator and a global opacity.
///
/// Both buffers are premultiplied RGBA8 of equal length.
pub(crate) fn composite_premul(
    dst: &mut [u8],
    src: &[u8],
    mode: CompositeMode,
    opacity: f32,
) -> TokenforgeResult<()> {
    check_buffers(dst, src)?;

    // Operator dispatch happens once per call; the coefficient closures
    // monomorphize a specialized per-pixel kernel.
    match mode {
        CompositeMode::SourceOver => over_premul(dst, src, opacity),
        CompositeMode::SourceIn => composite_coeff(dst, src, opacity, |_, da| da, |_, _| 0.0),
        CompositeMode::SourceOut => {
            composite_coeff(dst, src, opacity, |_, da| 1.0 - da, |_, _| 0.0)
        }
        CompositeMode::SourceAtop => {
            composite_coeff(dst, src, opacity, |_, da| da, |sa, _| 1.0 - sa)
        }
        CompositeMode::DestinationOver => {
            composite_coeff(dst, src, opacity, |_, da| 1.0 - da, |_, _| 1.0)
        }
        CompositeMode::DestinationIn => composite_coeff(dst, src, opacity, |_, _| 0.0, |sa, _| sa),
        CompositeMode::DestinationOut => {
            composite_coeff(dst, src, opacity, |_, _| 0.0, |sa, _| 1.0 - sa)
        }
        CompositeMode::DestinationAtop => {
            composite_coeff(dst, src, opacity, |_, da| 1.0 - da, |sa, _| sa)
        }
        CompositeMode::Lighter => composite_coeff(dst, src, opacity, |_, _| 1.0, |_, _| 1.0),
        CompositeMode::Copy => composite_coeff(dst, src, opacity, |_, _| 1.0, |_, _| 0.0),
        CompositeMode::Xor => {
            composite_coeff(dst, src, opacity, |_, da| 1.0 - da, |sa, _| 1.0 - sa)
        }
    }
    Ok(())
}

/// Combine `src` into `dst` with a separable blend function under
/// source-over alpha compositing.
pub(crate) fn blend_premul(
    dst: &mut [u8],
    src: &[u8],
    blend: BlendMode,
    opacity: f32,
) -> TokenforgeResult<()> {
    check_buffers(dst, src)?;

    match blend {
        BlendMode::Normal => over_premul(dst, src, opacity),
        BlendMode::Multiply => blend_separable(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => blend_separable(dst, src, opacity, |s, d| s + d - s * d),
        BlendMode::Overlay => blend_separable(dst, src, opacity, |s, d| {
            if d <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::Darken => blend_separable(dst, src, opacity, |s, d| s.min(d)),
        BlendMode::Lighten => blend_separable(dst, src, opacity, |s, d| s.max(d)),
        BlendMode::ColorDodge => blend_separable(dst, src, opacity, |s, d| {
            if s >= 1.0 { 1.0 } else { (d / (1.0 - s)).min(1.0) }
        }),
        BlendMode::ColorBurn => blend_separable(dst, src, opacity, |s, d| {
            if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - d) / s).min(1.0)
            }
        }),
        BlendMode::SoftLight => blend_separable(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d <= 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }),
        BlendMode::HardLight => blend_separable(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::Difference => blend_separable(dst, src, opacity, |s, d| (d - s).abs()),
        BlendMode::Exclusion => blend_separable(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
    }
    Ok(())
}

fn check_buffers(dst: &[u8], src: &[u8]) -> TokenforgeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TokenforgeError::render(
            "compositing expects equal-length rgba8 buffers",
        ));
    }
    Ok(())
}

/// Integer source-over fast path.
fn over_premul(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);

        d[3] = mul_div255(u16::from(s[3]), op).saturating_add(mul_div255(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255(u16::from(s[c]), op);
            let dc = mul_div255(u16::from(d[c]), inv);
            d[c] = sc.saturating_add(dc);
        }
    }
}

fn composite_coeff<FA, FB>(dst: &mut [u8], src: &[u8], opacity: f32, fa: FA, fb: FB)
where
    FA: Fn(f32, f32) -> f32,
    FB: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sp = [
            s[0] as f32 / 255.0 * opacity,
            s[1] as f32 / 255.0 * opacity,
            s[2] as f32 / 255.0 * opacity,
            s[3] as f32 / 255.0 * opacity,
        ];
        let dp = [
            d[0] as f32 / 255.0,
            d[1] as f32 / 255.0,
            d[2] as f32 / 255.0,
            d[3] as f32 / 255.0,
        ];

        let ca = fa(sp[3], dp[3]);
        let cb = fb(sp[3], dp[3]);
        for i in 0..4 {
            let v = (sp[i] * ca + dp[i] * cb).clamp(0.0, 1.0);
            d[i] = (v * 255.0).round() as u8;
        }
    }
}

fn blend_separable<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F)
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // Source-over with the blend applied to unpremultiplied channels:
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = s[3] as f32 / 255.0 * opacity;
        let da = d[3] as f32 / 255.0;
        let out_a = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);

        for i in 0..3 {
            let sp = s[i] as f32 / 255.0 * opacity;
            let dp = d[i] as f32 / 255.0;
            let sc = if sa > 0.0 { (sp / sa).clamp(0.0, 1.0) } else { 0.0 };
            let dc = if da > 0.0 { (dp / da).clamp(0.0, 1.0) } else { 0.0 };
            let b = blend_fn(sc, dc).clamp(0.0, 1.0);

            let out = (sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da).clamp(0.0, 1.0);
            d[i] = (out * 255.0).round() as u8;
        }
        d[3] = (out_a * 255.0).round() as u8;
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
