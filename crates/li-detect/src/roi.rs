use li_core::{Error, ImageView, restore};
use serde::{Deserialize, Serialize};

use crate::analyze::{LineProfiles, line_profiles};
use crate::config::InspectConfig;

/// Axis-aligned rectangle in full-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Roi {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Line profiles of a sub-rectangle, indexed relative to the ROI origin.
///
/// Samples are restored first; channel phase follows the ROI origin, so an odd
/// `x` or `y` swaps channels relative to the full image.
pub fn roi_profiles(
    img: &ImageView<'_, u16>,
    roi: Roi,
    cfg: &InspectConfig,
) -> Result<LineProfiles, Error> {
    if roi.width == 0 || roi.height == 0 {
        return Err(Error::InvalidInput("ROI has zero width or height"));
    }
    cfg.validate()?;

    let sub = img.subview(roi.x, roi.y, roi.width, roi.height)?;
    let restored = restore(&sub, cfg.effective_bits);
    Ok(line_profiles(&restored.as_view(), cfg))
}
