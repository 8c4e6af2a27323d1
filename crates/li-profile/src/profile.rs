//! Helpers for moving per-channel profiles into full-image coordinates.

/// Zeroes the first and last `strip` entries of `diff`.
///
/// Applied only when both bands fit with at least one line between them;
/// returns whether suppression happened.
pub fn suppress_strip(diff: &mut [f32], strip: usize) -> bool {
    if strip == 0 || 2 * strip >= diff.len() {
        return false;
    }
    let n = diff.len();
    diff[..strip].fill(0.0);
    diff[n - strip..].fill(0.0);
    true
}

/// Writes `local[i]` into `full[i*stride + offset]` keeping the larger value.
pub fn merge_max_strided(full: &mut [f32], local: &[f32], stride: usize, offset: usize) {
    for (dst, &v) in full.iter_mut().skip(offset).step_by(stride).zip(local) {
        if v > *dst {
            *dst = v;
        }
    }
}

/// Writes `local[i]` into `full[i*stride + offset]`, overwriting.
pub fn scatter_strided(full: &mut [f32], local: &[f32], stride: usize, offset: usize) {
    for (dst, &v) in full.iter_mut().skip(offset).step_by(stride).zip(local) {
        *dst = v;
    }
}

/// Largest value of a profile, `0.0` when empty.
pub fn peak(profile: &[f32]) -> f32 {
    profile.iter().copied().fold(0.0f32, f32::max)
}

/// Replaces non-finite entries with zero, returning how many were replaced.
pub fn zero_non_finite(profile: &mut [f32]) -> usize {
    let mut replaced = 0;
    for v in profile.iter_mut().filter(|v| !v.is_finite()) {
        *v = 0.0;
        replaced += 1;
    }
    replaced
}
