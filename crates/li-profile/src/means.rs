use std::ops::Range;

use li_core::Channel;

/// Mean of every channel row. Empty channels yield an empty profile.
pub fn row_means<T: Copy + Into<f64>>(ch: &Channel<'_, T>) -> Vec<f32> {
    block_row_means(ch, 0..ch.height(), 0..ch.width())
}

/// Mean of every channel column. Empty channels yield an empty profile.
pub fn col_means<T: Copy + Into<f64>>(ch: &Channel<'_, T>) -> Vec<f32> {
    block_col_means(ch, 0..ch.height(), 0..ch.width())
}

/// Row means restricted to the block `rows × cols` (local channel coordinates).
///
/// One value per row in `rows`; each averages the samples in `cols`.
pub fn block_row_means<T: Copy + Into<f64>>(
    ch: &Channel<'_, T>,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Vec<f32> {
    assert!(rows.end <= ch.height(), "row range out of channel bounds");
    assert!(cols.end <= ch.width(), "col range out of channel bounds");
    if rows.is_empty() || cols.is_empty() {
        return Vec::new();
    }

    let n = cols.len() as f64;
    rows.map(|y| {
        let sum: f64 = ch
            .row(y)
            .skip(cols.start)
            .take(cols.len())
            .map(Into::<f64>::into)
            .sum();
        (sum / n) as f32
    })
    .collect()
}

/// Column means restricted to the block `rows × cols` (local channel coordinates).
pub fn block_col_means<T: Copy + Into<f64>>(
    ch: &Channel<'_, T>,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Vec<f32> {
    assert!(rows.end <= ch.height(), "row range out of channel bounds");
    assert!(cols.end <= ch.width(), "col range out of channel bounds");
    if rows.is_empty() || cols.is_empty() {
        return Vec::new();
    }

    // Accumulate row by row so the parent rows are read contiguously.
    let mut sums = vec![0.0f64; cols.len()];
    for y in rows.clone() {
        for (acc, v) in sums
            .iter_mut()
            .zip(ch.row(y).skip(cols.start).take(cols.len()))
        {
            *acc += Into::<f64>::into(v);
        }
    }

    let n = rows.len() as f64;
    sums.into_iter().map(|s| (s / n) as f32).collect()
}
