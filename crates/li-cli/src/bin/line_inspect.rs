use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, GrayImage};
use line_inspect::{
    BatchItem, BatchOutcome, BatchSummary, ChannelPeak, CropWindow, Defect, Image, InspectConfig,
    Orientation, Roi, Verdict, crop_window, inspect_batch, inspect_restored, line_window, restore,
    roi_profiles,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "tif", "tiff", "bmp"];

#[derive(Parser, Debug)]
#[command(name = "line_inspect")]
#[command(about = "Detect row and column line defects in multi-channel sensor images")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect one image and write a report, line profiles and optional crops
    #[command(name = "inspect")]
    Inspect(InspectArgs),
    /// Write row and column profiles of a sub-rectangle
    #[command(name = "roi")]
    Roi(RoiArgs),
    /// Inspect every image in a directory
    #[command(name = "batch")]
    Batch(BatchArgs),
    /// Crop the same target lines out of every image in a directory
    #[command(name = "snap")]
    Snap(SnapArgs),
    /// Print or write the default configuration
    #[command(name = "config")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct InspectArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    /// JSON configuration; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "out")]
    out: PathBuf,
    /// Save a normalized 8-bit crop around every defect
    #[arg(long)]
    crops: bool,
    /// Lines kept on each side of a defect in crops
    #[arg(long, default_value_t = 20)]
    crop_pad: usize,
}

#[derive(Args, Debug, Clone)]
struct RoiArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long)]
    x: usize,
    #[arg(long)]
    y: usize,
    #[arg(long)]
    width: usize,
    #[arg(long)]
    height: usize,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "out/roi_profile.csv")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct BatchArgs {
    /// Directory scanned (non-recursively) for .png, .tif, .tiff and .bmp files
    #[arg(long, required = true)]
    input: PathBuf,
    /// Only inspect files whose name contains this substring
    #[arg(long)]
    filter: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "out/batch")]
    out: PathBuf,
    /// Save crops of every defect of failing images under FAIL_Images/<stem>
    #[arg(long)]
    crops: bool,
    #[arg(long, default_value_t = 20)]
    crop_pad: usize,
}

#[derive(Args, Debug, Clone)]
struct SnapArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    /// Only use files whose name contains this substring (case-insensitive)
    #[arg(long)]
    filter: Option<String>,
    /// Target line index; a row unless --vertical is given
    #[arg(long, required_unless_present = "targets", conflicts_with = "targets")]
    index: Option<usize>,
    #[arg(long, requires = "index")]
    vertical: bool,
    /// CSV of targets, one `index[,H|V]` per line
    #[arg(long)]
    targets: Option<PathBuf>,
    /// Lines kept on each side of the target
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(10..=2000))]
    pad: u32,
    #[arg(long, default_value = "out/snap")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Destination file; prints to stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct InspectReport<'a> {
    input: String,
    width: usize,
    height: usize,
    verdict: Verdict,
    elapsed_ms: f64,
    config: &'a InspectConfig,
    defects: &'a [Defect],
    channels: &'a [ChannelPeak],
    crops: Vec<CropDto>,
}

#[derive(Debug, Clone, Serialize)]
struct CropDto {
    file: String,
    window: CropWindow,
}

#[derive(Debug, Clone, Serialize)]
struct BatchRowDto {
    file: String,
    result: &'static str,
    defects: usize,
    seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct BatchReport<'a> {
    input: String,
    config: &'a InspectConfig,
    summary: BatchSummary,
    items: Vec<BatchRowDto>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Inspect(args) => run_inspect(args),
        Command::Roi(args) => run_roi(args),
        Command::Batch(args) => run_batch(args),
        Command::Snap(args) => run_snap(args),
        Command::Config(args) => run_config(args),
    }
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    ensure_file_exists(&args.input, "input")?;
    let cfg = load_config(args.config.as_deref())?;
    let img = load_input_u16(&args.input)?;
    if img.is_empty() {
        bail!("input image {} has no pixels", args.input.display());
    }
    create_dir(&args.out)?;

    let t0 = Instant::now();
    let restored = restore(&img.as_view(), cfg.effective_bits);
    let res = inspect_restored(&restored.as_view(), &cfg)
        .with_context(|| format!("inspecting {}", args.input.display()))?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    info!(
        "{}: {:?}, {} defects ({elapsed_ms:.2} ms)",
        args.input.display(),
        res.verdict(),
        res.defects.len()
    );

    write_profile_csv(
        args.out.join("row_profile.csv"),
        &res.profiles.row_avg,
        &res.profiles.row_diff,
    )?;
    write_profile_csv(
        args.out.join("col_profile.csv"),
        &res.profiles.col_avg,
        &res.profiles.col_diff,
    )?;

    let crops = if args.crops {
        save_crops(
            &args.out.join("crops"),
            &restored,
            &res.defects,
            args.crop_pad,
            cfg.block_qty,
        )?
    } else {
        Vec::new()
    };

    write_json(
        args.out.join("report.json"),
        &InspectReport {
            input: args.input.display().to_string(),
            width: img.width(),
            height: img.height(),
            verdict: res.verdict(),
            elapsed_ms,
            config: &cfg,
            defects: &res.defects,
            channels: &res.channels,
            crops,
        },
    )?;

    info!("report written to {}", args.out.display());
    Ok(())
}

fn run_roi(args: RoiArgs) -> Result<()> {
    ensure_file_exists(&args.input, "input")?;
    let cfg = load_config(args.config.as_deref())?;
    let img = load_input_u16(&args.input)?;

    let roi = Roi::new(args.x, args.y, args.width, args.height);
    let prof = roi_profiles(&img.as_view(), roi, &cfg).with_context(|| {
        format!(
            "ROI {}x{} at ({}, {}) in {}x{} image",
            roi.width,
            roi.height,
            roi.x,
            roi.y,
            img.width(),
            img.height()
        )
    })?;

    if let Some(dir) = args.out.parent()
        && !dir.as_os_str().is_empty()
    {
        create_dir(dir)?;
    }

    let mut file =
        fs::File::create(&args.out).with_context(|| format!("creating {}", args.out.display()))?;
    writeln!(file, "axis,index,avg,diff").context("writing csv header")?;
    for (i, (avg, diff)) in prof.row_avg.iter().zip(&prof.row_diff).enumerate() {
        writeln!(file, "row,{},{avg},{diff}", roi.y + i).context("writing csv row")?;
    }
    for (i, (avg, diff)) in prof.col_avg.iter().zip(&prof.col_diff).enumerate() {
        writeln!(file, "col,{},{avg},{diff}", roi.x + i).context("writing csv row")?;
    }

    info!("ROI profiles written to {}", args.out.display());
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let files = scan_images(&args.input, args.filter.as_deref())?;
    if files.is_empty() {
        warn!("no matching images in {}", args.input.display());
    }
    create_dir(&args.out)?;

    info!("inspecting {} images from {}", files.len(), args.input.display());
    let items = inspect_batch(files, &cfg, |path: &PathBuf| load_input_u16(path))?;

    let summary = BatchSummary::from_items(&items);
    write_batch_csvs(&args.out, &items)?;
    if args.crops {
        save_fail_crops(&args.out, &items, &cfg, args.crop_pad)?;
    }
    write_json(
        args.out.join("summary.json"),
        &BatchReport {
            input: args.input.display().to_string(),
            config: &cfg,
            summary,
            items: items.iter().map(batch_row).collect(),
        },
    )?;

    info!(
        "{} images: {} pass, {} fail, {} errors; results in {}",
        summary.total(),
        summary.passed,
        summary.failed,
        summary.errors,
        args.out.display()
    );
    Ok(())
}

fn save_fail_crops(
    out: &Path,
    items: &[BatchItem<PathBuf>],
    cfg: &InspectConfig,
    pad: usize,
) -> Result<()> {
    for item in items {
        let BatchOutcome::Inspected {
            defects,
            verdict: Verdict::Fail,
            ..
        } = &item.outcome
        else {
            continue;
        };

        let img = match load_input_u16(&item.source) {
            Ok(img) => img,
            Err(e) => {
                warn!("no crops for {}: {e:#}", item.source.display());
                continue;
            }
        };
        let restored = restore(&img.as_view(), cfg.effective_bits);
        let dir = fail_crop_dir(out, &item.source);
        let crops = save_crops(&dir, &restored, defects, pad, cfg.block_qty)?;
        debug!("{}: {} crops in {}", item.source.display(), crops.len(), dir.display());
    }
    Ok(())
}

fn fail_crop_dir(out: &Path, source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    out.join("FAIL_Images").join(stem)
}

fn run_snap(args: SnapArgs) -> Result<()> {
    let targets = match (&args.targets, args.index) {
        (Some(path), _) => {
            ensure_file_exists(path, "targets")?;
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_snap_targets(&text)
        }
        (None, Some(index)) => {
            let orientation = if args.vertical {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            };
            vec![(index, orientation)]
        }
        (None, None) => bail!("either --index or --targets is required"),
    };
    if targets.is_empty() {
        bail!("no valid targets");
    }

    let files = scan_images(&args.input, args.filter.as_deref())?;
    if files.is_empty() {
        warn!("no matching images in {}", args.input.display());
    }
    create_dir(&args.out)?;

    let index_path = args.out.join("snap_index.csv");
    let mut index = fs::File::create(&index_path)
        .with_context(|| format!("creating {}", index_path.display()))?;
    writeln!(index, "file,target,crop").context("writing csv header")?;

    let pad = args.pad as usize;
    let mut saved = 0usize;
    for path in &files {
        let img = match load_input_u16(path) {
            Ok(img) => img,
            Err(e) => {
                warn!("skipping {}: {e:#}", path.display());
                continue;
            }
        };
        let stem = path.file_stem().unwrap_or(path.as_os_str());
        let dir = args.out.join(stem);
        create_dir(&dir)?;

        for &(target, orientation) in &targets {
            let label = format!("{}{target}", orientation.tag());
            let window = line_window(orientation, target, img.width(), img.height(), pad);
            if window.is_empty() {
                warn!("{}: target {label} lies outside the image", path.display());
                continue;
            }

            let crop = dir.join(format!("{label}.png"));
            write_crop(&crop, &img, window)?;
            writeln!(
                index,
                "{},{},{}",
                csv_field(&file_label(path)),
                label,
                csv_field(&crop.display().to_string())
            )
            .context("writing csv row")?;
            saved += 1;
        }
    }

    info!(
        "{saved} crops of {} targets from {} images written to {}",
        targets.len(),
        files.len(),
        args.out.display()
    );
    Ok(())
}

/// Parses `index[,orientation]` lines.
///
/// The index may be written as a float and is truncated. The second field
/// selects a column when it contains `V` or `COL` (any case); rows are the
/// default. Lines without a usable index are skipped.
fn parse_snap_targets(text: &str) -> Vec<(usize, Orientation)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut targets = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let mut fields = line.split(',').map(|f| f.trim().trim_matches('"'));
        let Some(first) = fields.next() else {
            continue;
        };
        let index = match first.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => v as usize,
            _ => {
                debug!("targets line {}: skipped {line:?}", n + 1);
                continue;
            }
        };
        let kind = fields.next().unwrap_or_default().to_ascii_uppercase();
        let orientation = if kind.contains('V') || kind.contains("COL") {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        };
        targets.push((index, orientation));
    }
    targets
}

fn run_config(args: ConfigArgs) -> Result<()> {
    let cfg = InspectConfig::default();
    match args.out {
        Some(path) => {
            write_json(path.clone(), &cfg)?;
            info!("default configuration written to {}", path.display());
        }
        None => {
            let text = serde_json::to_string_pretty(&cfg).context("serializing json")?;
            println!("{text}");
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<InspectConfig> {
    let cfg = match path {
        Some(path) => {
            ensure_file_exists(path, "config")?;
            read_json(path)?
        }
        None => InspectConfig::default(),
    };
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

/// Decodes a grayscale image into the 16-bit container.
///
/// 8-bit data is widened without rescaling; colour images are converted to
/// 16-bit luma.
fn load_input_u16(path: &Path) -> Result<Image<u16>> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let (w, h) = (dyn_img.width() as usize, dyn_img.height() as usize);

    let data: Vec<u16> = match dyn_img {
        DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(u16::from).collect(),
        DynamicImage::ImageLuma16(buf) => buf.into_raw(),
        other => {
            debug!("{}: {:?} converted to 16-bit luma", path.display(), other.color());
            other.to_luma16().into_raw()
        }
    };

    Image::from_vec(w, h, data)
        .with_context(|| format!("constructing li-core image from {}", path.display()))
}

fn scan_images(dir: &Path, filter: Option<&str>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("input path is not a directory: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        if !path.is_file() || !has_image_extension(&path) {
            continue;
        }
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        if filter.is_some_and(|f| !name_matches(&name, f)) {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Case-insensitive substring match of a file name against a filter.
fn name_matches(name: &str, filter: &str) -> bool {
    name.to_lowercase().contains(&filter.to_lowercase())
}

fn save_crops(
    dir: &Path,
    img: &Image<u16>,
    defects: &[Defect],
    pad: usize,
    block_qty: usize,
) -> Result<Vec<CropDto>> {
    create_dir(dir)?;

    let mut crops = Vec::with_capacity(defects.len());
    for (n, d) in defects.iter().enumerate() {
        let window = crop_window(d, img.width(), img.height(), pad, block_qty);
        if window.is_empty() {
            warn!("defect {n} at {}{} has an empty crop", d.orientation.tag(), d.index);
            continue;
        }

        let name = format!(
            "D{n}_{}{}_diff{}.png",
            d.orientation.tag(),
            d.index,
            d.diff as i64
        );
        write_crop(&dir.join(&name), img, window)?;
        crops.push(CropDto { file: name, window });
    }
    Ok(crops)
}

/// Saves `window` of `img` as a min-max normalized 8-bit PNG, rotated
/// counter-clockwise for column windows.
fn write_crop(path: &Path, img: &Image<u16>, window: CropWindow) -> Result<()> {
    let patch = img
        .as_view()
        .subview(window.x0, window.y0, window.width(), window.height())
        .context("cropping window")?
        .to_owned_image();
    let values: Vec<f32> = patch.data().iter().map(|&v| f32::from(v)).collect();
    let vis = f32_to_u8_vis(&values);
    let gray = GrayImage::from_raw(window.width() as u32, window.height() as u32, vis)
        .context("constructing GrayImage from raw bytes")?;
    let gray = if window.rotate_ccw {
        image::imageops::rotate270(&gray)
    } else {
        gray
    };
    gray.save(path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn f32_to_u8_vis(data: &[f32]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }

    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    for &v in data {
        if v < min_v {
            min_v = v;
        }
        if v > max_v {
            max_v = v;
        }
    }

    if (max_v - min_v).abs() < 1e-12 {
        return vec![0u8; data.len()];
    }

    let scale = 255.0 / (max_v - min_v);
    data.iter()
        .map(|&v| ((v - min_v) * scale).round().clamp(0.0, 255.0) as u8)
        .collect()
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "PASS",
        Verdict::Fail => "FAIL",
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn batch_row(item: &BatchItem<PathBuf>) -> BatchRowDto {
    let file = file_label(&item.source);
    match &item.outcome {
        BatchOutcome::Inspected {
            defects,
            verdict,
            elapsed,
        } => BatchRowDto {
            file,
            result: verdict_label(*verdict),
            defects: defects.len(),
            seconds: elapsed.as_secs_f64(),
            reason: None,
        },
        BatchOutcome::Failed { reason } => BatchRowDto {
            file,
            result: "ERROR",
            defects: 0,
            seconds: 0.0,
            reason: Some(reason.clone()),
        },
    }
}

fn write_batch_csvs(out: &Path, items: &[BatchItem<PathBuf>]) -> Result<()> {
    let summary_path = out.join("summary.csv");
    let mut summary = fs::File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    writeln!(summary, "file,result,defects,seconds").context("writing csv header")?;

    let details_path = out.join("details.csv");
    let mut details = fs::File::create(&details_path)
        .with_context(|| format!("creating {}", details_path.display()))?;
    writeln!(details, "file,index,type,mode,channel,diff").context("writing csv header")?;

    for item in items {
        let row = batch_row(item);
        let file = csv_field(&row.file);
        writeln!(
            summary,
            "{file},{},{},{:.3}",
            row.result, row.defects, row.seconds
        )
        .context("writing csv row")?;

        if let BatchOutcome::Inspected { defects, .. } = &item.outcome {
            for d in defects {
                writeln!(
                    details,
                    "{file},{},{},{},{},{:.3}",
                    d.index,
                    d.orientation,
                    csv_field(&d.mode.to_string()),
                    d.channel,
                    d.diff
                )
                .context("writing csv row")?;
            }
        }
    }
    Ok(())
}

/// Quotes a CSV field, doubling embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn write_profile_csv(path: PathBuf, avg: &[f32], diff: &[f32]) -> Result<()> {
    let mut file =
        fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "index,avg,diff").context("writing csv header")?;
    for (i, (a, d)) in avg.iter().zip(diff).enumerate() {
        writeln!(file, "{i},{a},{d}").context("writing csv row")?;
    }
    Ok(())
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
