//! Turning a prediction vector into a single verdict.

/// Most frequent value in `predictions`; ties go to the value seen first.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn majority(predictions: &[f64]) -> Option<f64> {
    // (value, count) in first-seen order
    let mut tally: Vec<(f64, usize)> = Vec::new();
    for &p in predictions {
        match tally.iter_mut().find(|(v, _)| *v == p) {
            Some((_, count)) => *count += 1,
            None => tally.push((p, 1)),
        }
    }
    let mut best: Option<(f64, usize)> = None;
    for (value, count) in tally {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Arithmetic mean of `predictions`, or `None` for an empty slice.
#[must_use]
pub fn mean(predictions: &[f64]) -> Option<f64> {
    if predictions.is_empty() {
        return None;
    }
    Some(predictions.iter().sum::<f64>() / predictions.len() as f64)
}
