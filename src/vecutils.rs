//! Vector utility functions like roll() and elementwise sums.

/// Roll vector or array forward by k. It modifies the collection in-place.
///
/// The last `k` elements move to the front. `k` larger than the length wraps.
pub fn roll<T>(v: &mut [T], k: usize) {
    if v.is_empty() {
        return;
    }
    let k = k % v.len();
    v.rotate_right(k);
}

/// Elementwise sum of equally long series.
///
/// Returns `None` if the lengths differ. An empty input sums to an empty vector.
pub fn sum_series(series: &[&[f64]]) -> Option<Vec<f64>> {
    let Some(first) = series.first() else {
        return Some(Vec::new());
    };
    let mut total = first.to_vec();
    for s in &series[1..] {
        if s.len() != total.len() {
            return None;
        }
        for (acc, x) in total.iter_mut().zip(s.iter()) {
            *acc += x;
        }
    }
    Some(total)
}

/// Checks if two arrays or vectors are almost equal.
///
/// Elements in both containers must be in the same order.
pub fn almost_equal(a: &[f64], b: &[f64], eps: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(&x, &y)| (x - y).abs() <= eps)
}
