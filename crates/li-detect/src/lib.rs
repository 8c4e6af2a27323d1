//! Line-defect detection on interleaved multi-channel sensor images.
//!
//! Pipeline:
//! - Restore packed samples to their effective bit depth.
//! - Split the image into `stride x stride` sub-sampled channels.
//! - Score every row and column mean against its neighbors, per channel
//!   (Global) and per block of a channel grid (Part).
//! - Merge candidates into one defect per image line.
//!
//! [`inspect`] runs the whole pipeline. [`roi_profiles`], [`inspect_batch`]
//! and [`crop_window`] cover the surrounding workflow; [`line_window`]
//! frames an arbitrary target line.

mod analyze;
mod batch;
mod config;
mod crop;
mod defect;
mod inspect;
mod merge;
mod roi;

pub use analyze::{
    Analysis, ChannelAnalysis, ChannelPeak, ChannelProfiles, LineProfiles, MAX_GLOBAL_PER_CHANNEL,
    MIN_BLOCK_SIDE, analyze, analyze_channel, channel_profiles, line_profiles,
};
pub use batch::{BatchItem, BatchOutcome, BatchSummary, inspect_batch};
pub use config::InspectConfig;
pub use crop::{CropWindow, crop_window, line_window};
pub use defect::{Defect, DetectMode, Orientation};
pub use inspect::{Inspection, Verdict, inspect, inspect_restored, inspect_u8};
pub use merge::{merge_candidates, outranks};
pub use roi::{Roi, roi_profiles};
