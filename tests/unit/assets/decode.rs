use super::*;
use crate::foundation::error::TokenforgeError;

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[test]
fn decode_reads_dimensions_and_pixels() {
    let surface = decode_image(&png_bytes(5, 3, [10, 20, 30, 255])).unwrap();
    assert_eq!(surface.width(), 5);
    assert_eq!(surface.height(), 3);
    let px = surface.pixel(2, 1).unwrap();
    assert_eq!((px.r, px.g, px.b, px.alpha), (10, 20, 30, 255));
}

#[test]
fn decode_rejects_garbage() {
    assert!(matches!(
        decode_image(b"not an image"),
        Err(TokenforgeError::Decode(_))
    ));
    assert!(matches!(decode_image(&[]), Err(TokenforgeError::Decode(_))));
}

#[test]
fn encode_then_decode_roundtrips_opaque_pixels() {
    let original = decode_image(&png_bytes(4, 4, [200, 100, 50, 255])).unwrap();
    let png = encode_png(&original).unwrap();
    let back = decode_image(&png).unwrap();

    assert_eq!(back.width(), 4);
    assert_eq!(back.height(), 4);
    assert_eq!(back.pixel(1, 1).unwrap(), original.pixel(1, 1).unwrap());
}

#[test]
fn encode_preserves_transparency() {
    let surface = crate::surface::Surface::new(6, 6).unwrap();
    let png = encode_png(&surface).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(3, 3).0[3], 0);
}
