/// Index of the largest value, the lowest index winning ties
///
/// Returns `None` for an empty slice. NaNs never win.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_nan() && best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// The largest value, `-inf` for an empty slice
pub fn max(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Column-wise mean of equal-length rows
pub fn column_means(rows: &[Vec<f32>]) -> Vec<f32> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Vec::new();
    };
    let mut sums = vec![0.0; width];
    for row in rows {
        for (sum, v) in sums.iter_mut().zip(row) {
            *sum += v;
        }
    }
    sums.iter().map(|s| s / rows.len() as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 2.0, 2.0]), Some(1), "first maximum wins");
        assert_eq!(argmax(&[1.0, 1.0, 1.0]), Some(0), "all equal");
        assert_eq!(argmax(&[-3.0, f32::NAN, -1.0]), Some(2), "NaN skipped");
        assert_eq!(argmax(&[]), None, "empty");
    }

    #[test]
    fn column_means_functional() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 6.0]];
        assert_eq!(column_means(&rows), [2.0, 4.0]);
        assert!(column_means(&[]).is_empty());
        assert_eq!(max(&[0.1, 0.7, 0.3]), 0.7);
    }
}
