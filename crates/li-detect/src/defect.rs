use core::fmt;

use serde::{Serialize, Serializer};

/// Direction of a defective line: a row is `Horizontal`, a column `Vertical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
        }
    }

    /// Single-letter tag used in file names and CSV exports.
    pub fn tag(self) -> char {
        match self {
            Self::Horizontal => 'H',
            Self::Vertical => 'V',
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity at which a defect was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetectMode {
    /// Whole-channel line profile.
    Global,
    /// Block `(by, bx)` of the channel's block grid.
    Part { by: usize, bx: usize },
}

impl DetectMode {
    pub fn is_global(self) -> bool {
        matches!(self, Self::Global)
    }

    /// Output ordering class: Global lines are listed before Part lines.
    pub fn rank(self) -> u8 {
        match self {
            Self::Global => 0,
            Self::Part { .. } => 1,
        }
    }
}

impl fmt::Display for DetectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("Global"),
            Self::Part { by, bx } => write!(f, "Part({by},{bx})"),
        }
    }
}

impl Serialize for Orientation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for DetectMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defect {
    /// Channel id (`y_off * stride + x_off`) that produced the detection.
    pub channel: usize,
    pub orientation: Orientation,
    pub mode: DetectMode,
    /// Full-image row (Horizontal) or column (Vertical).
    pub index: usize,
    /// Weighted deviation from the neighbor baseline; never negative.
    pub diff: f32,
}

impl Defect {
    /// Deduplication key.
    pub fn key(&self) -> (Orientation, usize) {
        (self.orientation, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::{Defect, DetectMode, Orientation};

    #[test]
    fn mode_labels_and_ordering() {
        assert_eq!(DetectMode::Global.to_string(), "Global");
        assert_eq!(DetectMode::Part { by: 2, bx: 7 }.to_string(), "Part(2,7)");
        assert!(DetectMode::Global < DetectMode::Part { by: 0, bx: 0 });
        assert!(Orientation::Horizontal < Orientation::Vertical);
    }

    #[test]
    fn defect_serializes_with_readable_labels() {
        let d = Defect {
            channel: 3,
            orientation: Orientation::Vertical,
            mode: DetectMode::Part { by: 1, bx: 0 },
            index: 41,
            diff: 12.5,
        };
        let json = serde_json::to_value(&d).expect("serializable");
        assert_eq!(json["orientation"], "Vertical");
        assert_eq!(json["mode"], "Part(1,0)");
        assert_eq!(json["index"], 41);
        assert_eq!(json["diff"], 12.5);
    }
}
