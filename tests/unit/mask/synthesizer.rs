use super::*;

fn surface_from_alpha(width: u32, height: u32, alpha_at: impl Fn(u32, u32) -> u8) -> Surface {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let a = alpha_at(x, y);
            rgba.extend_from_slice(&[255, 255, 255, a]);
        }
    }
    Surface::from_rgba8(width, height, &rgba).unwrap()
}

fn alpha_of(mask: &Surface, x: i32, y: i32) -> u8 {
    mask.pixel(x, y).unwrap().alpha
}

#[test]
fn stride_zero_is_rejected() {
    let opts = SynthesizerOptions {
        sample_stride: 0,
        ..SynthesizerOptions::default()
    };
    assert!(MaskSynthesizer::new(opts).is_err());
}

#[test]
fn default_options_are_exposed() {
    let synth = MaskSynthesizer::with_defaults();
    assert_eq!(synth.options().sample_stride, 5);
    assert_eq!(synth.options().minimum_alpha, 255);
    assert_eq!(synth.options().opaque_alpha, 255);
}

#[test]
fn border_walk_is_clockwise_from_top_left() {
    // 4x3 border: 2*4 + 2*1 = 10 points
    let expected = [
        (0, 0),
        (1, 0),
        (2, 0),
        (3, 0),
        (3, 1),
        (3, 2),
        (2, 2),
        (1, 2),
        (0, 2),
        (0, 1),
    ];
    for (index, (x, y)) in expected.iter().enumerate() {
        assert_eq!(
            border_point(4, 3, index),
            Point::from_ints(*x, *y),
            "index {index}"
        );
    }
}

#[test]
fn fully_opaque_source_yields_fully_filled_mask() {
    let source = surface_from_alpha(60, 60, |_, _| 255);
    let mask = MaskSynthesizer::with_defaults().synthesize(&source).unwrap();

    assert_eq!(mask.dimension(), source.dimension());
    assert_eq!(alpha_of(&mask, 30, 30), 255);
    for (x, y) in [(0, 0), (59, 0), (0, 59), (59, 59), (30, 0), (0, 30)] {
        assert!(
            alpha_of(&mask, x, y) >= 128,
            "pixel ({x},{y}) was {}",
            alpha_of(&mask, x, y)
        );
    }
}

#[test]
fn fully_transparent_source_falls_back_to_full_fill() {
    let source = surface_from_alpha(50, 50, |_, _| 0);
    let mask = MaskSynthesizer::with_defaults().synthesize(&source).unwrap();

    for y in 0..50 {
        for x in 0..50 {
            assert_eq!(alpha_of(&mask, x, y), 255, "pixel ({x},{y})");
        }
    }
}

#[test]
fn soft_pixels_below_threshold_also_fall_back_to_full_fill() {
    // alpha 150 never reaches the default 255 outline threshold
    let source = surface_from_alpha(40, 40, |x, y| {
        let dx = f64::from(x) - 20.0;
        let dy = f64::from(y) - 20.0;
        if dx * dx + dy * dy <= 100.0 { 150 } else { 0 }
    });
    let mask = MaskSynthesizer::with_defaults().synthesize(&source).unwrap();
    assert_eq!(alpha_of(&mask, 1, 1), 255);
    assert_eq!(alpha_of(&mask, 38, 38), 255);
}

#[test]
fn soft_threshold_recovers_translucent_silhouettes() {
    let source = surface_from_alpha(40, 40, |x, y| {
        let dx = f64::from(x) - 20.0;
        let dy = f64::from(y) - 20.0;
        if dx * dx + dy * dy <= 100.0 { 150 } else { 0 }
    });
    let opts = SynthesizerOptions {
        minimum_alpha: 100,
        ..SynthesizerOptions::default()
    };
    let mask = MaskSynthesizer::new(opts).unwrap().synthesize(&source).unwrap();

    assert_eq!(alpha_of(&mask, 20, 20), 255);
    assert!(alpha_of(&mask, 25, 20) > 200);
    assert_eq!(alpha_of(&mask, 35, 20), 0);
    assert_eq!(alpha_of(&mask, 2, 2), 0);
}

#[test]
fn centered_disk_radius_is_recovered_within_stride_tolerance() {
    let source = surface_from_alpha(100, 100, |x, y| {
        let dx = f64::from(x) - 50.0;
        let dy = f64::from(y) - 50.0;
        if dx * dx + dy * dy <= 900.0 { 255 } else { 0 }
    });
    let mask = MaskSynthesizer::with_defaults().synthesize(&source).unwrap();

    // filled out to roughly the disk radius of 30
    for (x, y) in [(75, 50), (50, 75), (25, 50), (50, 25), (68, 68)] {
        assert!(
            alpha_of(&mask, x, y) > 200,
            "pixel ({x},{y}) was {}",
            alpha_of(&mask, x, y)
        );
    }
    for (x, y) in [(86, 50), (50, 86), (10, 10), (95, 95)] {
        assert!(
            alpha_of(&mask, x, y) < 30,
            "pixel ({x},{y}) was {}",
            alpha_of(&mask, x, y)
        );
    }
}

#[test]
fn small_centered_square_limits_the_fill_radius() {
    let source = surface_from_alpha(100, 100, |x, y| {
        if (45..55).contains(&x) && (45..55).contains(&y) {
            255
        } else {
            0
        }
    });
    let mask = MaskSynthesizer::with_defaults().synthesize(&source).unwrap();

    // outline distance peaks near the square corners (about 7 px)
    assert_eq!(alpha_of(&mask, 50, 50), 255);
    assert!(alpha_of(&mask, 53, 50) > 200);
    assert_eq!(alpha_of(&mask, 60, 50), 0);
    assert_eq!(alpha_of(&mask, 50, 62), 0);
    assert_eq!(alpha_of(&mask, 5, 5), 0);
}

#[test]
fn backfill_recovers_features_between_sampled_rays() {
    // a 3x3 blob well off-center; most sampled rays miss it entirely
    let source = surface_from_alpha(100, 100, |x, y| {
        if (59..62).contains(&x) && (49..52).contains(&y) {
            255
        } else {
            0
        }
    });
    let mask = MaskSynthesizer::with_defaults().synthesize(&source).unwrap();

    assert_eq!(alpha_of(&mask, 55, 50), 255);
    assert!(alpha_of(&mask, 80, 50) < 30);
    assert!(alpha_of(&mask, 5, 5) < 30);
}

#[test]
fn mask_dimensions_match_source() {
    let source = surface_from_alpha(33, 21, |_, _| 255);
    let mask = MaskSynthesizer::with_defaults().synthesize(&source).unwrap();
    assert_eq!(mask.width(), 33);
    assert_eq!(mask.height(), 21);
}
