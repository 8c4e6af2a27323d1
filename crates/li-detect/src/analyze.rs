use std::ops::Range;

use li_core::{Channel, ImageView, decompose};
use li_profile::{
    DiffParams, block_row_means, col_means, merge_max_strided, neighbor_diff, peak, row_means,
    scatter_strided, suppress_strip, zero_non_finite,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::InspectConfig;
use crate::defect::{Defect, DetectMode, Orientation};

/// Global candidates kept per channel and orientation, in scan order.
pub const MAX_GLOBAL_PER_CHANNEL: usize = 100;

/// Smallest block side (channel pixels) that still gives the kernel enough context.
pub const MIN_BLOCK_SIDE: usize = 8;

/// Full-image row and column profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineProfiles {
    /// Strongest channel diff per image row (length = height).
    pub row_diff: Vec<f32>,
    /// Channel row mean per image row (length = height).
    pub row_avg: Vec<f32>,
    /// Strongest channel diff per image column (length = width).
    pub col_diff: Vec<f32>,
    /// Channel column mean per image column (length = width).
    pub col_avg: Vec<f32>,
}

impl LineProfiles {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            row_diff: vec![0.0; height],
            row_avg: vec![0.0; height],
            col_diff: vec![0.0; width],
            col_avg: vec![0.0; width],
        }
    }

    /// Folds one channel's local profiles into the full-image profiles.
    fn absorb(&mut self, y_off: usize, x_off: usize, stride: usize, local: &ChannelProfiles) {
        merge_max_strided(&mut self.row_diff, &local.row_diff, stride, y_off);
        scatter_strided(&mut self.row_avg, &local.row_avg, stride, y_off);
        merge_max_strided(&mut self.col_diff, &local.col_diff, stride, x_off);
        scatter_strided(&mut self.col_avg, &local.col_avg, stride, x_off);
    }
}

/// Strongest row and column diff of one channel after strip suppression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelPeak {
    pub channel: usize,
    pub y_off: usize,
    pub x_off: usize,
    pub row_peak: f32,
    pub col_peak: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelProfiles {
    pub row_avg: Vec<f32>,
    pub row_diff: Vec<f32>,
    pub col_avg: Vec<f32>,
    pub col_diff: Vec<f32>,
}

/// Everything one channel contributes to an inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAnalysis {
    pub peak: ChannelPeak,
    pub profiles: ChannelProfiles,
    pub candidates: Vec<Defect>,
}

/// Merged profiles, per-channel peaks and unmerged candidates of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub profiles: LineProfiles,
    pub channels: Vec<ChannelPeak>,
    pub candidates: Vec<Defect>,
}

/// Line means and kernel diffs of a channel, without suppression or thresholds.
pub fn channel_profiles(ch: &Channel<'_, u16>, params: &DiffParams) -> ChannelProfiles {
    let row_avg = row_means(ch);
    let col_avg = col_means(ch);
    let mut row_diff = neighbor_diff(&row_avg, params);
    let mut col_diff = neighbor_diff(&col_avg, params);

    let bad = zero_non_finite(&mut row_diff) + zero_non_finite(&mut col_diff);
    if bad > 0 {
        warn!(
            "channel {}: {} non-finite line scores replaced with 0",
            ch.id(),
            bad
        );
    }

    ChannelProfiles {
        row_avg,
        row_diff,
        col_avg,
        col_diff,
    }
}

/// Runs Global and Part detection on one non-empty channel.
pub fn analyze_channel(ch: &Channel<'_, u16>, cfg: &InspectConfig) -> ChannelAnalysis {
    let params = cfg.diff_params();
    let stride = ch.stride();
    let strip_rows = cfg.strip_h / stride;
    let strip_cols = cfg.strip_v / stride;

    let mut profiles = channel_profiles(ch, &params);
    suppress_strip(&mut profiles.row_diff, strip_rows);
    suppress_strip(&mut profiles.col_diff, strip_cols);

    let mut candidates = Vec::new();
    global_candidates(
        ch,
        &profiles.row_diff,
        Orientation::Horizontal,
        cfg.thresh_global_h,
        &mut candidates,
    );
    global_candidates(
        ch,
        &profiles.col_diff,
        Orientation::Vertical,
        cfg.thresh_global_v,
        &mut candidates,
    );
    part_candidates(ch, cfg, &params, strip_rows, &mut candidates);

    debug!(
        "channel {} ({}x{} at y_off={}, x_off={}): {} candidates",
        ch.id(),
        ch.width(),
        ch.height(),
        ch.y_off(),
        ch.x_off(),
        candidates.len()
    );

    ChannelAnalysis {
        peak: ChannelPeak {
            channel: ch.id(),
            y_off: ch.y_off(),
            x_off: ch.x_off(),
            row_peak: peak(&profiles.row_diff),
            col_peak: peak(&profiles.col_diff),
        },
        profiles,
        candidates,
    }
}

fn global_candidates(
    ch: &Channel<'_, u16>,
    diff: &[f32],
    orientation: Orientation,
    thresh: f32,
    out: &mut Vec<Defect>,
) {
    let mut hits = diff.iter().enumerate().filter(|&(_, &d)| d > thresh);

    for (i, &d) in hits.by_ref().take(MAX_GLOBAL_PER_CHANNEL) {
        out.push(Defect {
            channel: ch.id(),
            orientation,
            mode: DetectMode::Global,
            index: global_index(ch, orientation, i),
            diff: d,
        });
    }

    let dropped = hits.count();
    if dropped > 0 {
        debug!(
            "channel {}: {} {} candidates beyond the first {} dropped",
            ch.id(),
            dropped,
            orientation,
            MAX_GLOBAL_PER_CHANNEL
        );
    }
}

/// Block-local row scores. Each block averages its rows over the block's
/// columns, so a defect spanning only part of a row still stands out.
fn part_candidates(
    ch: &Channel<'_, u16>,
    cfg: &InspectConfig,
    params: &DiffParams,
    strip_rows: usize,
    out: &mut Vec<Defect>,
) {
    let n = cfg.block_qty;
    if n == 0 {
        return;
    }

    let bh = ch.height() / n;
    let bw = ch.width() / n;
    if bh < MIN_BLOCK_SIDE || bw < MIN_BLOCK_SIDE {
        debug!(
            "channel {}: {}x{} blocks too small for local detection",
            ch.id(),
            bw,
            bh
        );
        return;
    }

    for by in 0..n {
        let rows = by * bh..(by + 1) * bh;
        if inside_strip(&rows, strip_rows, ch.height()) {
            continue;
        }
        for bx in 0..n {
            let cols = bx * bw..(bx + 1) * bw;
            let avg = block_row_means(ch, rows.clone(), cols);
            for (si, diff) in block_hits(ch, &avg, params, cfg.thresh_part_h) {
                out.push(Defect {
                    channel: ch.id(),
                    orientation: Orientation::Horizontal,
                    mode: DetectMode::Part { by, bx },
                    index: ch.global_row(rows.start + si),
                    diff,
                });
            }
        }
    }
}

/// Block-local kernel scores above `thresh`, as `(local index, diff)`.
fn block_hits(
    ch: &Channel<'_, u16>,
    avg: &[f32],
    params: &DiffParams,
    thresh: f32,
) -> Vec<(usize, f32)> {
    let mut diff = neighbor_diff(avg, params);
    if zero_non_finite(&mut diff) > 0 {
        warn!("channel {}: non-finite block scores skipped", ch.id());
    }
    diff.into_iter()
        .enumerate()
        .filter(|&(_, d)| d > thresh)
        .collect()
}

/// True when `span` lies entirely within the leading or trailing suppressed band.
fn inside_strip(span: &Range<usize>, strip: usize, len: usize) -> bool {
    strip > 0 && (span.end <= strip || span.start >= len.saturating_sub(strip))
}

fn global_index(ch: &Channel<'_, u16>, orientation: Orientation, local: usize) -> usize {
    match orientation {
        Orientation::Horizontal => ch.global_row(local),
        Orientation::Vertical => ch.global_col(local),
    }
}

fn map_channels<'a, R, F>(channels: &[Channel<'a, u16>], f: F) -> Vec<R>
where
    R: Send,
    F: Fn(&Channel<'a, u16>) -> R + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        channels.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        channels.iter().map(f).collect()
    }
}

/// Per-channel detection over a restored image, reduced to full-image form.
///
/// An invalid channel layout yields zero profiles and no candidates.
pub fn analyze(img: &ImageView<'_, u16>, cfg: &InspectConfig) -> Analysis {
    let mut profiles = LineProfiles::zeros(img.width(), img.height());
    let Some(layout) = cfg.layout() else {
        warn!(
            "channel_count {} is not a perfect square; nothing analyzed",
            cfg.channel_count
        );
        return Analysis {
            profiles,
            channels: Vec::new(),
            candidates: Vec::new(),
        };
    };

    let channels = decompose(img, layout);
    let results = map_channels(&channels, |ch| {
        (!ch.is_empty()).then(|| analyze_channel(ch, cfg))
    });

    let stride = layout.stride();
    let mut peaks = Vec::with_capacity(channels.len());
    let mut candidates = Vec::new();
    for (ch, res) in channels.iter().zip(results) {
        match res {
            Some(res) => {
                profiles.absorb(ch.y_off(), ch.x_off(), stride, &res.profiles);
                peaks.push(res.peak);
                candidates.extend(res.candidates);
            }
            None => {
                debug!("channel {} is empty; skipped", ch.id());
                peaks.push(ChannelPeak {
                    channel: ch.id(),
                    y_off: ch.y_off(),
                    x_off: ch.x_off(),
                    row_peak: 0.0,
                    col_peak: 0.0,
                });
            }
        }
    }

    Analysis {
        profiles,
        channels: peaks,
        candidates,
    }
}

/// Merged line profiles of a restored image, without strip suppression or thresholds.
pub fn line_profiles(img: &ImageView<'_, u16>, cfg: &InspectConfig) -> LineProfiles {
    let mut profiles = LineProfiles::zeros(img.width(), img.height());
    let Some(layout) = cfg.layout() else {
        return profiles;
    };

    let params = cfg.diff_params();
    let channels = decompose(img, layout);
    let results = map_channels(&channels, |ch| {
        (!ch.is_empty()).then(|| channel_profiles(ch, &params))
    });

    for (ch, local) in channels.iter().zip(results) {
        if let Some(local) = local {
            profiles.absorb(ch.y_off(), ch.x_off(), layout.stride(), &local);
        }
    }
    profiles
}
