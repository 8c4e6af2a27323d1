/// Offsets of the comparison window around each line.
///
/// Only same-parity neighbors are used so that an alternating tap pattern left
/// in a profile does not leak into the baseline.
pub const NEIGHBOR_OFFSETS: [isize; 8] = [-8, -6, -4, -2, 2, 4, 6, 8];

/// Number of neighbors available away from the signal boundaries.
pub const FULL_WINDOW: usize = NEIGHBOR_OFFSETS.len();

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffParams {
    /// Multiplier on the weight of lines with an incomplete window.
    pub edge_gain: f32,
    /// Drop the min and max neighbor from the baseline when more than two are available.
    pub use_robust: bool,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self {
            edge_gain: 1.0,
            use_robust: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub value: f32,
    pub count: usize,
}

impl Baseline {
    /// Confidence weight of the estimate.
    pub fn weight(&self, edge_gain: f32) -> f32 {
        let w = self.count as f32 / FULL_WINDOW as f32;
        if self.count < FULL_WINDOW {
            w * edge_gain
        } else {
            w
        }
    }
}

/// Neighbor baseline of `signal[i]`, or `None` when no neighbor lies inside the signal.
pub fn neighbor_baseline(signal: &[f32], i: usize, use_robust: bool) -> Option<Baseline> {
    let n = signal.len() as isize;
    let mut sum = 0.0f64;
    let mut count = 0usize;
    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;

    for off in NEIGHBOR_OFFSETS {
        let idx = i as isize + off;
        if idx < 0 || idx >= n {
            continue;
        }
        let v = signal[idx as usize];
        sum += f64::from(v);
        count += 1;
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    if count == 0 {
        return None;
    }

    let value = if use_robust && count > 2 {
        (sum - f64::from(min_v) - f64::from(max_v)) / (count - 2) as f64
    } else {
        sum / count as f64
    };

    Some(Baseline {
        value: value as f32,
        count,
    })
}

/// Per-line deviation strength of `signal`.
pub fn neighbor_diff(signal: &[f32], params: &DiffParams) -> Vec<f32> {
    let mut out = vec![0.0f32; signal.len()];
    neighbor_diff_into(signal, params, &mut out);
    out
}

pub fn neighbor_diff_into(signal: &[f32], params: &DiffParams, out: &mut [f32]) {
    assert_eq!(out.len(), signal.len(), "out must match signal length");

    for (i, out_i) in out.iter_mut().enumerate() {
        *out_i = match neighbor_baseline(signal, i, params.use_robust) {
            Some(base) => (signal[i] - base.value).abs() * base.weight(params.edge_gain),
            None => 0.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::{DiffParams, neighbor_baseline, neighbor_diff};

    fn flat_with_spike(len: usize, level: f32, spike_at: usize, spike: f32) -> Vec<f32> {
        let mut sig = vec![level; len];
        sig[spike_at] = spike;
        sig
    }

    #[test]
    fn output_length_matches_input() {
        let params = DiffParams::default();
        for n in 0..40 {
            let sig: Vec<f32> = (0..n).map(|i| (i * 7 % 5) as f32).collect();
            assert_eq!(neighbor_diff(&sig, &params).len(), n);
        }
    }

    #[test]
    fn robust_baseline_drops_min_and_max() {
        // Index 0 of a length-7 signal sees offsets +2, +4, +6 only.
        let sig = [100.0, 0.0, 1.0, 0.0, 5.0, 0.0, 9.0];
        let base = neighbor_baseline(&sig, 0, true).expect("has neighbors");
        assert_eq!(base.count, 3);
        assert!((base.value - 5.0).abs() < 1e-6);

        let plain = neighbor_baseline(&sig, 0, false).expect("has neighbors");
        assert!((plain.value - 5.0).abs() < 1e-6);

        let skewed = [100.0, 0.0, 1.0, 0.0, 2.0, 0.0, 30.0];
        let robust = neighbor_baseline(&skewed, 0, true).expect("has neighbors");
        let plain = neighbor_baseline(&skewed, 0, false).expect("has neighbors");
        assert!((robust.value - 2.0).abs() < 1e-6);
        assert!((plain.value - 11.0).abs() < 1e-6);
    }

    #[test]
    fn two_neighbors_fall_back_to_plain_mean() {
        let sig = [0.0, 0.0, 4.0, 0.0, 8.0];
        let base = neighbor_baseline(&sig, 0, true).expect("has neighbors");
        assert_eq!(base.count, 2);
        assert!((base.value - 6.0).abs() < 1e-6);
    }

    #[test]
    fn first_index_has_four_neighbors_and_scaled_weight() {
        let sig = vec![10.0f32; 20];
        let base = neighbor_baseline(&sig, 0, true).expect("has neighbors");
        assert_eq!(base.count, 4);
        assert!((base.weight(1.0) - 0.5).abs() < 1e-6);
        assert!((base.weight(0.4) - 0.2).abs() < 1e-6);

        let interior = neighbor_baseline(&sig, 10, true).expect("has neighbors");
        assert_eq!(interior.count, 8);
        assert!((interior.weight(0.4) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn single_sample_has_no_neighbors() {
        let out = neighbor_diff(&[42.0], &DiffParams::default());
        assert_eq!(out, vec![0.0]);

        let out = neighbor_diff(&[42.0, 7.0], &DiffParams::default());
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn isolated_spike_is_scored_and_neighbors_stay_quiet() {
        let sig = flat_with_spike(40, 50.0, 20, 250.0);
        let diff = neighbor_diff(&sig, &DiffParams::default());

        assert!((diff[20] - 200.0).abs() < 1e-4);
        for (i, &d) in diff.iter().enumerate() {
            if i != 20 {
                assert!(d.abs() < 1e-4, "line {i} scored {d}");
            }
        }
    }

    #[test]
    fn plain_mean_lets_spike_bleed_into_neighbors() {
        let sig = flat_with_spike(40, 50.0, 20, 250.0);
        let diff = neighbor_diff(
            &sig,
            &DiffParams {
                edge_gain: 1.0,
                use_robust: false,
            },
        );
        // Line 22 has the spike among its 8 neighbors: baseline 75.
        assert!((diff[22] - 25.0).abs() < 1e-4);
        assert!(diff[21].abs() < 1e-4);
    }

    #[test]
    fn edge_gain_only_affects_incomplete_windows() {
        let mut sig = vec![0.0f32; 30];
        sig[1] = 16.0;
        sig[15] = 16.0;

        let unit = neighbor_diff(&sig, &DiffParams::default());
        let damped = neighbor_diff(
            &sig,
            &DiffParams {
                edge_gain: 0.5,
                use_robust: true,
            },
        );

        // Line 1 sees offsets +2..+8 only (4 neighbors).
        assert!((unit[1] - 8.0).abs() < 1e-5);
        assert!((damped[1] - 4.0).abs() < 1e-5);
        assert!((unit[15] - 16.0).abs() < 1e-5);
        assert!((damped[15] - 16.0).abs() < 1e-5);
    }
}
