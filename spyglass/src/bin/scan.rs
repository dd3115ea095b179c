//! Batch scanner: walk a directory of images, run detection on each one and
//! write feature records plus debug overlays.
//!
//! Images whose feature file already exists are skipped, so interrupted
//! scans resume where they left off. When a model directory is supplied the
//! scanner also classifies each image and writes the structured pipeline
//! output next to the features.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use spyglass::aggregate::aggregate;
use spyglass::classify::classify;
use spyglass::image_ops::array_to_gray_image;
use spyglass::preprocess::preprocess;
use spyglass::render::{render_classified, render_detections};
use spyglass::{ModelContext, Pipeline, PipelineConfig, RawImage};

const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "tif", "tiff"];

/// Command line arguments for the batch scanner
#[derive(Parser, Debug)]
#[command(author, version, about = "Batch object detection over an image directory")]
struct Args {
    /// Directory to scan recursively for images
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory; features land in <output>/features, overlays in
    /// <output>/debug_images
    #[arg(short, long)]
    output: PathBuf,

    /// Model artifact directory; enables classification when present
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Re-process images even when their feature file already exists
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Also save the contrast-enhanced map each image was segmented from
    #[arg(long, default_value_t = false)]
    save_maps: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let features_dir = args.output.join("features");
    let debug_dir = args.output.join("debug_images");
    fs::create_dir_all(&features_dir)?;
    fs::create_dir_all(&debug_dir)?;

    let model = match &args.models {
        Some(dir) => Some(
            ModelContext::load(dir)
                .with_context(|| format!("loading model artifacts from {}", dir.display()))?,
        ),
        None => None,
    };

    // Detection runs the same with or without a model; classification is
    // applied per image below when artifacts were supplied
    let pipeline = Pipeline::new(PipelineConfig::default());

    let mut images = Vec::new();
    collect_images(&args.input, &args.output, &mut images)?;
    images.sort();
    info!(count = images.len(), input = %args.input.display(), "scanning");

    let mut processed = 0usize;
    let mut skipped_existing = 0usize;

    for path in &images {
        let base_name = flat_name(&args.input, path);
        let features_path = features_dir.join(format!("{base_name}_features.json"));

        if features_path.exists() && !args.force {
            skipped_existing += 1;
            continue;
        }

        let rgb = match image::open(path) {
            Ok(decoded) => decoded.to_rgb8(),
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to decode image");
                continue;
            }
        };

        info!(path = %path.display(), "processing");
        let raw = RawImage::new(rgb);
        let detection = pipeline.detect(&raw);

        if args.save_maps {
            let map = preprocess(&raw, pipeline.config());
            array_to_gray_image(&map.0)
                .save(debug_dir.join(format!("{base_name}_map.png")))
                .with_context(|| format!("writing processed map for {base_name}"))?;
        }

        let json = serde_json::to_string_pretty(&detection.features)?;
        fs::write(&features_path, json)
            .with_context(|| format!("writing {}", features_path.display()))?;

        let overlay = match &model {
            Some(context) if !detection.features.is_empty() => {
                let predictions = classify(&detection.features, context)?;
                let output = aggregate(&detection.features, predictions, detection.skipped);

                let output_path = features_dir.join(format!("{base_name}_predictions.json"));
                fs::write(&output_path, serde_json::to_string_pretty(&output)?)?;

                render_classified(raw.rgb(), &detection.candidates, &output.predictions)
            }
            _ => render_detections(raw.rgb(), &detection.candidates),
        };

        overlay
            .save(debug_dir.join(format!("{base_name}_debug.jpg")))
            .with_context(|| format!("writing overlay for {base_name}"))?;

        processed += 1;
    }

    info!(processed, skipped_existing, "scan finished");
    Ok(())
}

/// Recursively collect supported image paths, leaving the output tree alone
/// in case it nests inside the input directory.
fn collect_images(dir: &Path, output: &Path, images: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path == output {
            continue;
        }
        if path.is_dir() {
            collect_images(&path, output, images)?;
        } else if is_supported(&path) {
            images.push(path);
        }
    }
    Ok(())
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Flatten a path relative to the scan root into a single file-name stem.
fn flat_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let stem = relative.with_extension("");
    stem.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("_")
}
