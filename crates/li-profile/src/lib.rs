//! 1D line-profile primitives for line-defect inspection.
//!
//! Coordinates follow the channel convention: `profile[i]` describes local
//! line `i` of a channel, i.e. full-image line `i*stride + offset`.
//!
//! The central primitive is [`neighbor_diff`]: every line is compared with a
//! baseline built from up to eight same-parity neighbors at distance 2..=8.
//! With `use_robust` the largest and smallest neighbor are discarded first,
//! so an adjacent defective line neither masks nor mimics a defect. Lines
//! close to the ends of a profile have fewer neighbors; their score is scaled
//! by `count/8` and by `edge_gain`.

pub mod diff;
pub mod means;
pub mod profile;

pub use diff::{
    Baseline, DiffParams, FULL_WINDOW, NEIGHBOR_OFFSETS, neighbor_baseline, neighbor_diff,
    neighbor_diff_into,
};
pub use means::{block_col_means, block_row_means, col_means, row_means};
pub use profile::{merge_max_strided, peak, scatter_strided, suppress_strip, zero_non_finite};
