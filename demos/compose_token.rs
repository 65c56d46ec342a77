use std::io::Cursor;

use tokenforge::{Color, Editor, FitPolicy, LayerOptions, TokenforgeResult, TransformOp};

/// Build a ring-frame PNG in memory: opaque between the two radii,
/// transparent everywhere else.
fn ring_png(size: u32, outer: f64, inner: f64, rgba: [u8; 4]) -> Vec<u8> {
    let c = f64::from(size) / 2.0;
    let img = image::RgbaImage::from_fn(size, size, |x, y| {
        let dx = f64::from(x) - c;
        let dy = f64::from(y) - c;
        let d2 = dx * dx + dy * dy;
        if d2 <= outer * outer && d2 >= inner * inner {
            image::Rgba(rgba)
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode ring png");
    out.into_inner()
}

fn main() -> TokenforgeResult<()> {
    tracing_subscriber::fmt().init();

    let mut editor = Editor::new(256)?;

    // bottom: a warm tint that will shine through the frame opening
    editor.add_tint("#2d6a4f".parse::<Color>()?)?;

    // top: a decorative ring frame
    let frame = ring_png(200, 96.0, 72.0, [212, 175, 55, 255]);
    editor.add_image_bytes(
        &frame,
        LayerOptions {
            name: "ring-frame.png".to_string(),
            fit: FitPolicy::Contain,
            ..LayerOptions::default()
        },
    )?;

    // mask the tint with the frame's silhouette and nudge the frame a bit
    let frame_id = editor.entries()[0].layer.id();
    let tint_id = editor.entries()[1].layer.id();
    editor.set_foreign_mask(tint_id, frame_id)?;
    editor.transform_unlocked(TransformOp::Rotate(15.0))?;

    let data = editor.data()?;
    for snapshot in &data.layers {
        println!(
            "layer {} '{}' mask={} alpha={}%",
            snapshot.layer.id,
            snapshot.layer.name,
            snapshot.foreign_mask_label,
            snapshot.alpha_percent
        );
    }

    let blob = editor.blob()?;
    std::fs::write("demo_token.png", &blob)
        .map_err(|e| tokenforge::TokenforgeError::render(format!("write demo_token.png: {e}")))?;
    println!("wrote demo_token.png ({} bytes)", blob.len());
    Ok(())
}
