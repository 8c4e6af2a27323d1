use serde::Serialize;

use crate::defect::{Defect, DetectMode, Orientation};

/// Half-open pixel window `[x0, x1) x [y0, y1)` around a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropWindow {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
    /// Vertical defects are shown rotated 90 degrees counter-clockwise so the
    /// line runs horizontally like a row defect.
    pub rotate_ccw: bool,
}

impl CropWindow {
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

/// Window covering `pad` lines on each side of line `index`, spanning the
/// whole image along the line.
pub fn line_window(
    orientation: Orientation,
    index: usize,
    width: usize,
    height: usize,
    pad: usize,
) -> CropWindow {
    let across = |len: usize| {
        let lo = index.saturating_sub(pad).min(len);
        let hi = index.saturating_add(pad).min(len);
        (lo, hi)
    };

    match orientation {
        Orientation::Horizontal => {
            let (y0, y1) = across(height);
            CropWindow {
                x0: 0,
                y0,
                x1: width,
                y1,
                rotate_ccw: false,
            }
        }
        Orientation::Vertical => {
            let (x0, x1) = across(width);
            CropWindow {
                x0,
                y0: 0,
                x1,
                y1: height,
                rotate_ccw: true,
            }
        }
    }
}

/// Window covering `pad` lines on each side of the defect.
///
/// Global defects span the whole image along the line. Part defects are
/// narrowed to their image-level block when `block_qty > 0`.
pub fn crop_window(
    defect: &Defect,
    width: usize,
    height: usize,
    pad: usize,
    block_qty: usize,
) -> CropWindow {
    let mut window = line_window(defect.orientation, defect.index, width, height, pad);
    let DetectMode::Part { by, bx } = defect.mode else {
        return window;
    };
    if block_qty == 0 {
        return window;
    }

    let block = |len: usize, i: usize| {
        let side = len / block_qty;
        ((i * side).min(len), ((i + 1) * side).min(len))
    };
    match defect.orientation {
        Orientation::Horizontal => (window.x0, window.x1) = block(width, bx),
        Orientation::Vertical => (window.y0, window.y1) = block(height, by),
    }
    window
}
