use super::*;

fn solid(width: u32, height: u32, color: Color) -> Surface {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        rgba.extend_from_slice(&[color.r, color.g, color.b, color.alpha]);
    }
    Surface::from_rgba8(width, height, &rgba).unwrap()
}

#[test]
fn new_rejects_degenerate_dimensions() {
    assert!(matches!(
        Surface::new(0, 10),
        Err(TokenforgeError::Geometry(_))
    ));
    assert!(matches!(
        Surface::new(10, 0),
        Err(TokenforgeError::Geometry(_))
    ));
    assert!(matches!(
        Surface::new(70_000, 10),
        Err(TokenforgeError::Geometry(_))
    ));
}

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(4, 3).unwrap();
    assert_eq!(s.width(), 4);
    assert_eq!(s.height(), 3);
    for y in 0..3 {
        for x in 0..4 {
            assert_eq!(s.pixel(x, y).unwrap().alpha, 0);
        }
    }
}

#[test]
fn from_rgba8_reads_back_opaque_pixels() {
    let s = solid(2, 2, Color::opaque(10, 20, 30));
    assert_eq!(s.pixel(1, 1).unwrap(), Color::opaque(10, 20, 30));
}

#[test]
fn from_rgba8_rejects_length_mismatch() {
    assert!(Surface::from_rgba8(2, 2, &[0u8; 4]).is_err());
}

#[test]
fn pixel_outside_bounds_is_none() {
    let s = Surface::new(4, 4).unwrap();
    assert!(s.pixel(-1, 0).is_none());
    assert!(s.pixel(0, -1).is_none());
    assert!(s.pixel(4, 0).is_none());
    assert!(s.pixel(0, 4).is_none());
}

#[test]
fn clear_resets_to_transparent() {
    let mut s = solid(3, 3, Color::opaque(255, 0, 0));
    s.clear();
    assert_eq!(s.pixel(1, 1).unwrap().alpha, 0);
}

#[test]
fn clone_is_independent() {
    let mut a = solid(3, 3, Color::opaque(255, 0, 0));
    let b = a.clone();
    a.clear();
    assert_eq!(a.pixel(1, 1).unwrap().alpha, 0);
    assert_eq!(b.pixel(1, 1).unwrap(), Color::opaque(255, 0, 0));
}

#[test]
fn draw_surface_translates() {
    let mut dst = Surface::new(16, 16).unwrap();
    let src = solid(4, 4, Color::opaque(255, 0, 0));
    dst.draw_surface(
        &src,
        Affine::translate((5.0, 5.0)),
        CompositeMode::SourceOver,
        1.0,
    )
    .unwrap();

    assert_eq!(dst.pixel(6, 6).unwrap(), Color::opaque(255, 0, 0));
    assert_eq!(dst.pixel(0, 0).unwrap().alpha, 0);
    assert_eq!(dst.pixel(12, 12).unwrap().alpha, 0);
}

#[test]
fn draw_surface_scales() {
    let mut dst = Surface::new(8, 8).unwrap();
    let src = solid(2, 2, Color::opaque(0, 255, 0));
    dst.draw_surface(&src, Affine::scale(4.0), CompositeMode::SourceOver, 1.0)
        .unwrap();
    assert_eq!(dst.pixel(4, 4).unwrap(), Color::opaque(0, 255, 0));
}

#[test]
fn source_in_keeps_content_only_inside_existing_coverage() {
    let mut dst = Surface::new(8, 8).unwrap();
    let mask = solid(4, 4, Color::OPAQUE_BLACK);
    dst.draw_surface(&mask, Affine::IDENTITY, CompositeMode::SourceOver, 1.0)
        .unwrap();

    let content = solid(8, 8, Color::opaque(255, 0, 0));
    dst.draw_surface(&content, Affine::IDENTITY, CompositeMode::SourceIn, 1.0)
        .unwrap();

    assert_eq!(dst.pixel(1, 1).unwrap(), Color::opaque(255, 0, 0));
    assert_eq!(dst.pixel(6, 6).unwrap().alpha, 0);
}

#[test]
fn draw_surface_applies_global_alpha() {
    let mut dst = Surface::new(2, 2).unwrap();
    let src = solid(2, 2, Color::opaque(255, 0, 0));
    dst.draw_surface(&src, Affine::IDENTITY, CompositeMode::SourceOver, 0.5)
        .unwrap();
    let alpha = dst.pixel(0, 0).unwrap().alpha;
    assert!(alpha.abs_diff(128) <= 2, "alpha was {alpha}");
}

#[test]
fn fill_circle_covers_inside_only() {
    let mut s = Surface::new(20, 20).unwrap();
    s.fill_circle(Point::from_ints(10, 10), 5.0, Color::OPAQUE_BLACK)
        .unwrap();
    assert_eq!(s.pixel(10, 10).unwrap().alpha, 255);
    assert!(s.pixel(10, 13).unwrap().alpha > 200);
    assert_eq!(s.pixel(1, 1).unwrap().alpha, 0);
    assert_eq!(s.pixel(10, 17).unwrap().alpha, 0);
}

#[test]
fn fill_covers_every_pixel() {
    let mut s = Surface::new(9, 7).unwrap();
    s.fill(Color::opaque(0, 0, 255)).unwrap();
    for y in 0..7 {
        for x in 0..9 {
            assert_eq!(s.pixel(x, y).unwrap(), Color::opaque(0, 0, 255));
        }
    }
}

#[test]
fn draw_surface_blended_multiplies() {
    let mut dst = solid(2, 2, Color::opaque(0, 255, 0));
    let src = solid(2, 2, Color::opaque(255, 0, 0));
    dst.draw_surface_blended(&src, Affine::IDENTITY, BlendMode::Multiply, 1.0)
        .unwrap();
    assert_eq!(dst.pixel(0, 0).unwrap(), Color::opaque(0, 0, 0));
}

#[test]
fn pixels_readback_shape() {
    let s = solid(3, 2, Color::opaque(9, 8, 7));
    let px = s.pixels();
    assert_eq!(px.width, 3);
    assert_eq!(px.height, 2);
    assert_eq!(px.rgba8.len(), 3 * 2 * 4);
    assert_eq!(&px.rgba8[0..4], &[9, 8, 7, 255]);
}
