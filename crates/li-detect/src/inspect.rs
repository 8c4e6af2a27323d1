use li_core::{Error, ImageView, restore, widen_u8};
use serde::Serialize;
use tracing::debug;

use crate::analyze::{ChannelPeak, LineProfiles, analyze};
use crate::config::InspectConfig;
use crate::defect::Defect;
use crate::merge::merge_candidates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Result of inspecting one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    /// One defect per line, Global before Part, each by ascending index.
    pub defects: Vec<Defect>,
    pub profiles: LineProfiles,
    /// Peak scores per channel in channel id order.
    pub channels: Vec<ChannelPeak>,
}

impl Inspection {
    pub fn verdict(&self) -> Verdict {
        if self.defects.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Restores packed samples and inspects the image.
///
/// Fails only for an empty image or an invalid configuration.
pub fn inspect(img: &ImageView<'_, u16>, cfg: &InspectConfig) -> Result<Inspection, Error> {
    check_input(img, cfg)?;
    let restored = restore(img, cfg.effective_bits);
    Ok(run(&restored.as_view(), cfg))
}

/// Inspects an 8-bit image; samples are widened without rescaling.
pub fn inspect_u8(img: &ImageView<'_, u8>, cfg: &InspectConfig) -> Result<Inspection, Error> {
    check_input(img, cfg)?;
    let widened = widen_u8(img);
    inspect(&widened.as_view(), cfg)
}

/// Inspects an image whose samples were already restored; `effective_bits` is ignored.
pub fn inspect_restored(
    img: &ImageView<'_, u16>,
    cfg: &InspectConfig,
) -> Result<Inspection, Error> {
    check_input(img, cfg)?;
    Ok(run(img, cfg))
}

fn check_input<T>(img: &ImageView<'_, T>, cfg: &InspectConfig) -> Result<(), Error> {
    if img.is_empty() {
        return Err(Error::InvalidInput("image has zero width or height"));
    }
    cfg.validate()
}

fn run(img: &ImageView<'_, u16>, cfg: &InspectConfig) -> Inspection {
    let analysis = analyze(img, cfg);
    let raw = analysis.candidates.len();
    let defects = merge_candidates(analysis.candidates);
    debug!(
        "{}x{} image: {} candidates merged into {} defects",
        img.width(),
        img.height(),
        raw,
        defects.len()
    );

    Inspection {
        defects,
        profiles: analysis.profiles,
        channels: analysis.channels,
    }
}
