/// Linear-interpolated percentile over an ascending-sorted slice.
///
/// `p` is in [0, 100]. The rank is `(p / 100) * (n - 1)`; when it lands on an
/// index the element is returned as-is, otherwise the two neighbors are
/// interpolated.
///
/// Panics if `sorted` is empty — callers guard.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "percentile of an empty slice");
    let idx = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    sorted[lower] + (sorted[upper] - sorted[lower]) * (idx - lower as f64)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
