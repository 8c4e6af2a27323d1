//! Example: inspect one sensor image and dump per-channel peak scores.
//!
//! 8-bit inputs are widened without rescaling; 16-bit inputs are taken as
//! packed sensor samples and restored according to `--bits`. Channels whose
//! peak exceeds `--thresh` are marked with `*`.
//!
//! Run from the workspace root:
//!   cargo run -p line-inspect --example channel_peaks -- --help
//!   cargo run -p line-inspect --example channel_peaks -- --input data/panel_0.png

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use image::ImageReader;
use line_inspect::{BitDepth, ChannelPeak, Defect, Image, InspectConfig, Verdict, inspect};
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Inspect one image and report per-channel peak line scores")]
struct Args {
    #[arg(long, default_value = "data/panel_0.png")]
    input: PathBuf,

    /// Effective sensor bit depth (8, 10, 12, 14 or 16)
    #[arg(long, default_value_t = 16)]
    bits: u8,

    /// Interleaved channel count (perfect square)
    #[arg(long, default_value_t = 4)]
    channels: usize,

    /// Global threshold for both orientations
    #[arg(long, default_value_t = 20.0)]
    thresh: f32,

    /// Output JSON path (default: <input stem>_peaks.json next to input)
    #[arg(long)]
    out: Option<PathBuf>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PeakReport<'a> {
    input: String,
    width: usize,
    height: usize,
    elapsed_ms: f64,
    verdict: Verdict,
    thresh: f32,
    channels: &'a [ChannelPeak],
    defects: &'a [Defect],
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_gray_u16(path: &Path) -> Result<Image<u16>> {
    let decoded = ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?;
    let (w, h) = (decoded.width() as usize, decoded.height() as usize);
    let data: Vec<u16> = match decoded {
        image::DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(u16::from).collect(),
        other => other.into_luma16().into_raw(),
    };
    Image::from_vec(w, h, data).context("building Image")
}

fn default_out(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let dir = input.parent().unwrap_or(Path::new("."));
    dir.join(format!("{stem}_peaks.json"))
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    let out_path = args.out.clone().unwrap_or_else(|| default_out(&args.input));

    let img = load_gray_u16(&args.input)?;
    let cfg = InspectConfig {
        effective_bits: BitDepth::try_from(args.bits)?,
        channel_count: args.channels,
        thresh_global_h: args.thresh,
        thresh_global_v: args.thresh,
        ..InspectConfig::default()
    };

    println!(
        "loaded {}: {}x{}, bits={}, channels={}",
        args.input.display(),
        img.width(),
        img.height(),
        args.bits,
        args.channels
    );

    let t0 = Instant::now();
    let res = inspect(&img.as_view(), &cfg)
        .with_context(|| format!("inspecting {}", args.input.display()))?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    println!("  ch  phase   row_peak  col_peak");
    for peak in &res.channels {
        let flag = if peak.row_peak > args.thresh || peak.col_peak > args.thresh {
            "  *"
        } else {
            ""
        };
        println!(
            "  {:>2}  ({},{})  {:>8.2}  {:>8.2}{flag}",
            peak.channel, peak.y_off, peak.x_off, peak.row_peak, peak.col_peak
        );
    }
    for d in &res.defects {
        println!(
            "  {} {} {} ch{} diff={:.2}",
            d.mode, d.orientation, d.index, d.channel, d.diff
        );
    }
    println!(
        "{:?}, {} defects ({elapsed_ms:.2} ms)",
        res.verdict(),
        res.defects.len()
    );

    let report = PeakReport {
        input: args.input.display().to_string(),
        width: img.width(),
        height: img.height(),
        elapsed_ms,
        verdict: res.verdict(),
        thresh: args.thresh,
        channels: &res.channels,
        defects: &res.defects,
    };
    let out_file = std::fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    serde_json::to_writer_pretty(out_file, &report)
        .with_context(|| format!("writing JSON to {}", out_path.display()))?;

    println!("report written to {}", out_path.display());
    Ok(())
}
