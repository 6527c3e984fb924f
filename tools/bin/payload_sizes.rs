use std::path::PathBuf;

use clap::Parser;
use food_nutrition_analyzer::config::config::{
    MAX_DIMENSION_RANGE, MAX_DIMENSION_STEP, QUALITY_RANGE, QUALITY_STEP,
};
use food_nutrition_analyzer::session::read_upload;
use food_nutrition_analyzer::{EncodingSettings, ImagePreparer};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Report upload sizes across every max-size / quality combination the
/// `nutrition` CLI accepts, so the trade-off is visible before sending.
#[derive(Parser, Debug)]
#[command(name = "payload_sizes")]
struct Args {
    /// Photo to measure. A synthetic 1920x1080 plate is used when omitted.
    image: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (label, bytes) = match &args.image {
        Some(path) => (path.display().to_string(), read_upload(path)?),
        None => ("synthetic 1920x1080".to_string(), synthetic_plate(1920, 1080)?),
    };

    println!("📏 Payload sizes for {}", label);
    println!("================================================");
    println!("MaxSide\tQuality\tOutput\t\tJPEG KB\tBase64 KB");

    let mut preparer = ImagePreparer::new();
    for settings in settings_grid() {
        let prepared = preparer.prepare(&bytes, settings)?;
        println!(
            "{}\t{}\t{}\t{:.1}\t{:.1}",
            settings.max_dimension,
            settings.quality,
            prepared.processed_size,
            prepared.jpeg.len() as f64 / 1024.0,
            prepared.payload.len() as f64 / 1024.0
        );
    }

    println!("\n💡 Base64 inflates the JPEG by about a third; the model sees the Base64 size.");
    Ok(())
}

/// Every max-size / quality pair the CLI's range checks accept.
fn settings_grid() -> Vec<EncodingSettings> {
    let (min_side, max_side) = MAX_DIMENSION_RANGE;
    let (min_q, max_q) = QUALITY_RANGE;
    (min_side..=max_side)
        .step_by(MAX_DIMENSION_STEP as usize)
        .flat_map(|side| {
            (min_q..=max_q)
                .step_by(QUALITY_STEP as usize)
                .map(move |quality| EncodingSettings::new(side, quality))
        })
        .collect()
}

/// Render a plate-like test photo: warm radial gradient with some texture.
fn synthetic_plate(width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = cx.min(cy);
    let img = RgbImage::from_fn(width, height, |x, y| {
        let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt() / radius;
        let noise = ((x * 31 + y * 17) % 23) as f32;
        if d < 0.9 {
            Rgb([
                (200.0 - d * 60.0 + noise) as u8,
                (120.0 - d * 40.0 + noise) as u8,
                (60.0 + noise) as u8,
            ])
        } else {
            Rgb([235, 235, 230])
        }
    });

    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
