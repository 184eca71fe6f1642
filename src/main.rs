use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, ImageReader};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use pcbinspect::annotation::load_annotation;
use pcbinspect::detection::{difference, localize, single};
use pcbinspect::report::{save_result_image, ResultLog};
use pcbinspect::{DebugConfig, InspectConfig, KernelShape, LocalizeOutcome, ThresholdMode};

#[derive(Parser)]
#[command(name = "pcbinspect")]
#[command(about = "Flag candidate defects on PCB images with classical image processing")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Threshold-and-contour detection on a single image
    Detect {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Fixed binarization threshold (50-200)
        #[arg(long)]
        threshold: Option<u8>,

        /// Minimum defect area in pixels (10-500)
        #[arg(long)]
        min_area: Option<f64>,

        /// Treat dark regions as foreground
        #[arg(long)]
        inverted: bool,

        #[command(flatten)]
        kernel: KernelArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Compare a test board against a golden template
    Diff {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        #[arg(value_name = "TEST")]
        test: PathBuf,

        #[command(flatten)]
        kernel: KernelArgs,

        /// Also save a 3x2 overview of every stage
        #[arg(long)]
        overview: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Draw and crop ground-truth boxes from a VOC XML annotation
    Localize {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        #[arg(value_name = "XML")]
        annotation: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct KernelArgs {
    /// Structuring element size
    #[arg(long)]
    kernel_size: Option<u32>,

    #[arg(long, value_enum)]
    kernel_shape: Option<KernelShape>,
}

#[derive(Args)]
struct CommonArgs {
    /// JSON config file; explicit flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Working width
    #[arg(long)]
    width: Option<u32>,

    /// Working height
    #[arg(long)]
    height: Option<u32>,

    /// Directory for result images
    #[arg(long, value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Append one record per run to this log
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Save every intermediate stage to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl CommonArgs {
    fn base_config(&self, default: InspectConfig) -> anyhow::Result<InspectConfig> {
        let mut config = match &self.config {
            Some(path) => InspectConfig::from_json_file(path)?,
            None => default,
        };
        if let Some(width) = self.width {
            config.working_size.width = width;
        }
        if let Some(height) = self.height {
            config.working_size.height = height;
        }
        Ok(config)
    }

    fn debug_config(&self) -> anyhow::Result<Option<DebugConfig>> {
        Ok(match &self.debug_out {
            Some(dir) => Some(DebugConfig::new(dir.clone())?),
            None => None,
        })
    }
}

impl KernelArgs {
    fn apply(&self, config: &mut InspectConfig) {
        if let Some(size) = self.kernel_size {
            config.morphology.size = size;
        }
        if let Some(shape) = self.kernel_shape {
            config.morphology.shape = shape;
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pcbinspect={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    info!("Loading image: {}", path.display());
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))?;
    debug!("Image loaded: {}x{}", img.width(), img.height());
    Ok(img)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Detect { image, threshold, min_area, inverted, kernel, common } => {
            let mut config = common.base_config(InspectConfig::single_image())?;
            if let Some(t) = threshold {
                config.threshold.value = t;
            }
            if let Some(a) = min_area {
                config.min_area = a;
            }
            if inverted {
                config.threshold.mode = ThresholdMode::BinaryInverted;
            }
            kernel.apply(&mut config);
            run_detect(&image, &config, &common)
        }
        Command::Diff { template, test, kernel, overview, common } => {
            let mut config = common.base_config(InspectConfig::template_difference())?;
            kernel.apply(&mut config);
            run_diff(&template, &test, &config, overview, &common)
        }
        Command::Localize { image, annotation, common } => {
            let config = common.base_config(InspectConfig::single_image())?;
            run_localize(&image, &annotation, &config, &common)
        }
    }
}

fn run_detect(path: &Path, config: &InspectConfig, common: &CommonArgs) -> anyhow::Result<()> {
    let debug_cfg = common.debug_config()?;
    let img = load_image(path)?;

    let output = single::detect(&img, config)?;
    let result = &output.result;
    info!(
        "Detection finished: {} ({} defects, confidence {:.1}% {})",
        result.status, result.count, result.confidence_score, result.confidence
    );
    if output.skipped > 0 {
        warn!("Skipped {} contour(s) with zero perimeter", output.skipped);
    }

    // Persistence failures are reported but do not fail the run
    match save_result_image(&common.output_dir, &output.annotated) {
        Ok(saved) => info!("Result image saved to {}", saved.display()),
        Err(e) => warn!("{}", e),
    }
    if let Some(log_file) = &common.log_file {
        if let Err(e) = ResultLog::new(log_file).append_result(result) {
            warn!("{}", e);
        }
    }
    if let Some(debug_cfg) = &debug_cfg {
        match debug_cfg.save_artifacts(&output.artifacts) {
            Ok(paths) => info!(
                "Debug: saved {} images to {}",
                paths.len(),
                debug_cfg.output_dir.display()
            ),
            Err(e) => warn!("{}", e),
        }
    }

    if common.json {
        return print_json(result);
    }

    println!("\n=== PCB Defect Detection Results ===");
    println!("Status: {}", result.status);
    println!("Defects: {}", result.count);
    println!("Confidence: {:.1}% ({})", result.confidence_score, result.confidence);
    for (i, defect) in result.defects.iter().enumerate() {
        println!(
            "  Defect {} at ({}, {}) {}x{} - {} circularity={:.2}",
            i + 1,
            defect.bbox.x,
            defect.bbox.y,
            defect.bbox.width,
            defect.bbox.height,
            defect.label(),
            defect.circularity
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct DiffSummary {
    otsu_level: u8,
    diff_stats: difference::DiffStats,
    defect_pixels_raw: u64,
    defect_pixels: u64,
    noise_pixels_removed: u64,
    defect_percentage: f64,
    regions: Vec<pcbinspect::BoundingBox>,
}

fn run_diff(
    template: &Path,
    test: &Path,
    config: &InspectConfig,
    overview: bool,
    common: &CommonArgs,
) -> anyhow::Result<()> {
    let debug_cfg = common.debug_config()?;
    let template_img = load_image(template)?;
    let test_img = load_image(test)?;

    let output = difference::detect_difference(&template_img, &test_img, config)?;
    info!(
        "Otsu threshold {}; defect pixels {} -> {} after cleaning",
        output.otsu_level, output.defect_pixels_raw, output.defect_pixels
    );

    match save_result_image(&common.output_dir, &output.annotated) {
        Ok(saved) => info!("Result image saved to {}", saved.display()),
        Err(e) => warn!("{}", e),
    }
    if overview {
        match save_result_image(&common.output_dir, &difference::overview(&output)) {
            Ok(saved) => info!("Overview saved to {}", saved.display()),
            Err(e) => warn!("{}", e),
        }
    }
    if let Some(debug_cfg) = &debug_cfg {
        if let Err(e) = debug_cfg.save_artifacts(&output.artifacts) {
            warn!("{}", e);
        }
    }

    let summary = DiffSummary {
        otsu_level: output.otsu_level,
        diff_stats: output.diff_stats,
        defect_pixels_raw: output.defect_pixels_raw,
        defect_pixels: output.defect_pixels,
        noise_pixels_removed: output.noise_pixels_removed(),
        defect_percentage: output.defect_percentage,
        regions: output.regions.iter().map(|r| r.bbox).collect(),
    };

    if common.json {
        return print_json(&summary);
    }

    println!("\n=== Template Difference Results ===");
    println!(
        "Difference map: min={} max={} mean={:.2}",
        summary.diff_stats.min, summary.diff_stats.max, summary.diff_stats.mean
    );
    println!("Otsu threshold: {}", summary.otsu_level);
    println!("Defect pixels: {} ({:.2}%)", summary.defect_pixels, summary.defect_percentage);
    println!("Noise removed: {} pixels", summary.noise_pixels_removed);
    println!("Regions: {}", summary.regions.len());
    Ok(())
}

#[derive(Serialize)]
struct LocalizeSummary {
    scale: (f64, f64),
    boxes: Vec<pcbinspect::AnnotationBox>,
    contours: Vec<localize::ContourStats>,
    mask_percentage: f64,
    rois: usize,
    skipped: Vec<usize>,
}

fn run_localize(
    path: &Path,
    annotation: &Path,
    config: &InspectConfig,
    common: &CommonArgs,
) -> anyhow::Result<()> {
    config.validate()?;
    let debug_cfg = common.debug_config()?;
    let img = load_image(path)?;
    let boxes = load_annotation(annotation)?;
    info!("Found {} defect(s) in annotation", boxes.len());

    let loc = match localize::localize(&img, &boxes, config.working_size)? {
        LocalizeOutcome::NoBoxes => {
            println!("No defects to localize in {}", annotation.display());
            return Ok(());
        }
        LocalizeOutcome::Localized(loc) => loc,
    };

    for number in &loc.skipped {
        warn!("ROI {} is empty, skipping", number);
    }

    match save_result_image(&common.output_dir, &loc.annotated) {
        Ok(saved) => info!("Result image saved to {}", saved.display()),
        Err(e) => warn!("{}", e),
    }
    if let Some(debug_cfg) = &debug_cfg {
        let saved = debug_cfg
            .save_artifacts(&loc.artifacts)
            .and_then(|_| debug_cfg.save_rois(loc.rois.iter().map(|r| (r.number, &r.image))));
        if let Err(e) = saved {
            warn!("{}", e);
        }
    }

    let summary = LocalizeSummary {
        scale: loc.scale,
        boxes: loc.scaled_boxes.clone(),
        contours: loc.contours.clone(),
        mask_percentage: loc.mask_percentage,
        rois: loc.rois.len(),
        skipped: loc.skipped.clone(),
    };

    if common.json {
        return print_json(&summary);
    }

    println!("\n=== Defect Localization Results ===");
    println!("Scale: {:.3} x {:.3}", summary.scale.0, summary.scale.1);
    for (i, b) in summary.boxes.iter().enumerate() {
        println!("  Defect {}: ({}, {}) to ({}, {})", i + 1, b.x_min, b.y_min, b.x_max, b.y_max);
    }
    for (i, c) in summary.contours.iter().enumerate() {
        println!("  Contour {}: Area={:.0}px, Perimeter={:.0}px", i + 1, c.area, c.perimeter);
    }
    println!("Defect area: {:.2}% of the image", summary.mask_percentage);
    println!("ROIs extracted: {} (skipped {})", summary.rois, summary.skipped.len());
    Ok(())
}
