use li_core::{BitDepth, ChannelLayout, Error};
use li_profile::DiffParams;
use serde::{Deserialize, Serialize};

/// Inspection settings. Missing fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Effective sensor bit depth of the 16-bit container samples.
    pub effective_bits: BitDepth,
    /// Number of interleaved sensor channels; a perfect square.
    pub channel_count: usize,
    pub use_robust: bool,
    /// Weight multiplier for lines with fewer than eight neighbors.
    pub edge_gain: f32,
    pub thresh_global_h: f32,
    pub thresh_global_v: f32,
    /// Threshold for block-local row scores.
    pub thresh_part_h: f32,
    /// Read and written with the configuration; local detection is row-only.
    pub thresh_part_v: f32,
    /// Blocks per channel side for local detection; `0` disables it.
    pub block_qty: usize,
    /// Rows (full-image pixels) ignored at the top and bottom.
    pub strip_h: usize,
    /// Columns (full-image pixels) ignored at the left and right.
    pub strip_v: usize,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            effective_bits: BitDepth::Sixteen,
            channel_count: 4,
            use_robust: true,
            edge_gain: 1.0,
            thresh_global_h: 20.0,
            thresh_global_v: 20.0,
            thresh_part_h: 10.0,
            thresh_part_v: 10.0,
            block_qty: 10,
            strip_h: 0,
            strip_v: 0,
        }
    }
}

impl InspectConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.edge_gain.is_finite() || self.edge_gain <= 0.0 {
            return Err(Error::InvalidConfig {
                field: "edge_gain",
                reason: format!("must be finite and > 0, got {}", self.edge_gain),
            });
        }

        let thresholds = [
            ("thresh_global_h", self.thresh_global_h),
            ("thresh_global_v", self.thresh_global_v),
            ("thresh_part_h", self.thresh_part_h),
            ("thresh_part_v", self.thresh_part_v),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() {
                return Err(Error::InvalidConfig {
                    field,
                    reason: format!("must be finite, got {value}"),
                });
            }
        }

        Ok(())
    }

    /// Channel lattice, or `None` when `channel_count` is not a perfect square.
    pub fn layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channel_count)
    }

    pub fn diff_params(&self) -> DiffParams {
        DiffParams {
            edge_gain: self.edge_gain,
            use_robust: self.use_robust,
        }
    }
}

#[cfg(test)]
mod tests {
    use li_core::{BitDepth, Error};

    use super::InspectConfig;

    #[test]
    fn defaults_are_valid() {
        let cfg = InspectConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.layout().map(|l| l.stride()), Some(2));
    }

    #[test]
    fn rejects_bad_edge_gain_and_thresholds() {
        let cfg = InspectConfig {
            edge_gain: 0.0,
            ..InspectConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(Error::InvalidConfig {
                field: "edge_gain",
                ..
            })
        ));

        let cfg = InspectConfig {
            thresh_part_v: f32::NAN,
            ..InspectConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(Error::InvalidConfig {
                field: "thresh_part_v",
                ..
            })
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: InspectConfig =
            serde_json::from_str(r#"{ "effective_bits": 12, "channel_count": 16, "strip_h": 8 }"#)
                .expect("valid json");

        assert_eq!(cfg.effective_bits, BitDepth::Twelve);
        assert_eq!(cfg.channel_count, 16);
        assert_eq!(cfg.strip_h, 8);
        assert_eq!(cfg.block_qty, 10);
        assert!(cfg.use_robust);
    }

    #[test]
    fn unsupported_bit_depth_is_rejected_on_load() {
        let res: Result<InspectConfig, _> = serde_json::from_str(r#"{ "effective_bits": 11 }"#);
        assert!(res.is_err());
    }

    #[test]
    fn json_round_trip_keeps_bit_depth_numeric() {
        let cfg = InspectConfig {
            effective_bits: BitDepth::Ten,
            ..InspectConfig::default()
        };
        let json = serde_json::to_value(&cfg).expect("serializable");
        assert_eq!(json["effective_bits"], 10);
    }
}
