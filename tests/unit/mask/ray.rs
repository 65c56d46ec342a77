use super::*;

/// A 1-pixel-tall strip whose alpha per column is given by `alphas`.
fn strip(alphas: &[u8]) -> Surface {
    let mut rgba = Vec::with_capacity(alphas.len() * 4);
    for &a in alphas {
        rgba.extend_from_slice(&[255, 0, 0, a]);
    }
    Surface::from_rgba8(alphas.len() as u32, 1, &rgba).unwrap()
}

#[test]
fn path_covers_both_endpoints() {
    let ray = Ray::new(Point::from_ints(0, 0), Point::from_ints(4, 0));
    let xs: Vec<i32> = ray.path().iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0, 1, 2, 3, 4]);

    let ray = Ray::new(Point::from_ints(2, 2), Point::from_ints(2, 2));
    assert_eq!(ray.path(), &[Point::from_ints(2, 2)]);
}

#[test]
fn diagonal_path_steps_both_axes() {
    let ray = Ray::new(Point::from_ints(0, 0), Point::from_ints(3, 3));
    assert_eq!(
        ray.path(),
        &[
            Point::from_ints(0, 0),
            Point::from_ints(1, 1),
            Point::from_ints(2, 2),
            Point::from_ints(3, 3),
        ]
    );
}

#[test]
fn path_supports_negative_directions() {
    let ray = Ray::new(Point::from_ints(3, 0), Point::from_ints(0, 0));
    let xs: Vec<i32> = ray.path().iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![3, 2, 1, 0]);
}

#[test]
fn analyze_finds_maximal_opaque_segments() {
    let source = strip(&[0, 255, 255, 0, 0, 255, 0, 255, 255]);
    let mut ray = Ray::new(Point::from_ints(0, 0), Point::from_ints(8, 0));
    assert!(!ray.is_analyzed());

    ray.analyze(&source, 255, 255);
    assert!(ray.is_analyzed());
    assert_eq!(
        ray.segments().unwrap(),
        &[
            Segment { start: 1, end: 2 },
            Segment { start: 5, end: 5 },
            Segment { start: 7, end: 8 },
        ]
    );
}

#[test]
fn chosen_pixel_is_the_outermost_fully_opaque_one() {
    let source = strip(&[0, 255, 255, 0, 0, 255, 0, 0, 0]);
    let mut ray = Ray::new(Point::from_ints(0, 0), Point::from_ints(8, 0));
    ray.analyze(&source, 255, 255);
    assert_eq!(ray.pixel().unwrap().point, Point::from_ints(5, 0));
}

#[test]
fn soft_threshold_prefers_highest_alpha() {
    let source = strip(&[0, 200, 255, 200, 0]);
    let mut ray = Ray::new(Point::from_ints(0, 0), Point::from_ints(4, 0));
    ray.analyze(&source, 255, 150);
    // the alpha-255 pixel wins over the later alpha-200 one
    let chosen = ray.pixel().unwrap();
    assert_eq!(chosen.point, Point::from_ints(2, 0));
    assert_eq!(chosen.color.alpha, 255);
}

#[test]
fn no_qualifying_pixel_leaves_pixel_unset() {
    let source = strip(&[0, 100, 0]);
    let mut ray = Ray::new(Point::from_ints(0, 0), Point::from_ints(2, 0));
    ray.analyze(&source, 255, 255);
    assert!(ray.pixel().is_none());
    assert_eq!(ray.segments().unwrap().len(), 0);
}

#[test]
fn out_of_bounds_path_pixels_read_as_transparent() {
    let source = strip(&[255, 255]);
    let mut ray = Ray::new(Point::from_ints(0, 0), Point::from_ints(5, 0));
    ray.analyze(&source, 255, 255);
    assert_eq!(ray.pixel().unwrap().point, Point::from_ints(1, 0));
    assert_eq!(ray.segments().unwrap(), &[Segment { start: 0, end: 1 }]);
}

#[test]
fn segment_len_is_inclusive() {
    let seg = Segment { start: 3, end: 5 };
    assert_eq!(seg.len(), 3);
    assert!(!seg.is_empty());
}
