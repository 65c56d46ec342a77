use std::io::Cursor;

use crate::foundation::error::{TokenforgeError, TokenforgeResult};
use crate::surface::Surface;

/// Decode encoded image bytes (PNG, JPEG, WebP, ...) into a [`Surface`].
///
/// Decode failures are surfaced to the caller; no placeholder surface is
/// produced.
pub fn decode_image(bytes: &[u8]) -> TokenforgeResult<Surface> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| TokenforgeError::decode(format!("image bytes could not be decoded: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Surface::from_rgba8(width, height, rgba.as_raw())
}

/// Encode a surface as PNG bytes, the final "blob" export.
pub fn encode_png(surface: &Surface) -> TokenforgeResult<Vec<u8>> {
    let pixels = surface.pixels();
    let img = image::RgbaImage::from_raw(pixels.width, pixels.height, pixels.rgba8)
        .ok_or_else(|| TokenforgeError::render("surface readback has unexpected length"))?;

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| TokenforgeError::render(format!("png encoding failed: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
