//! Local-maximum detection and zero-crossing integration.

/// Indices of local maxima in `y`.
///
/// A maximum is a sample strictly above its left neighbour, followed by zero
/// or more equal samples and then a strictly lower one. Flat tops report
/// their middle index (rounded down). The first and last samples are never
/// maxima.
pub fn local_maxima(y: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if y.len() < 3 {
        return maxima;
    }

    let i_max = y.len() - 1;
    let mut i = 1;
    while i < i_max {
        if y[i - 1] < y[i] {
            let mut ahead = i + 1;
            while ahead < i_max && y[ahead] == y[i] {
                ahead += 1;
            }
            if y[ahead] < y[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Local maxima whose height is at least `threshold`.
pub fn find_peaks(y: &[f64], threshold: f64) -> Vec<usize> {
    local_maxima(y)
        .into_iter()
        .filter(|&p| y[p] >= threshold)
        .collect()
}

/// Walk outwards from `peak` while samples stay strictly positive.
///
/// Returns `(left, right)`. Each bound is the first non-positive sample
/// reached, or the trace edge.
pub fn zero_crossings(y: &[f64], peak: usize) -> (usize, usize) {
    let mut left = peak;
    while left > 0 && y[left] > 0.0 {
        left -= 1;
    }
    let mut right = peak;
    while right + 1 < y.len() && y[right] > 0.0 {
        right += 1;
    }
    (left, right)
}

/// Sum of `y[left..=right]`, bounds included.
pub fn integrate(y: &[f64], left: usize, right: usize) -> f64 {
    y[left..=right].iter().sum()
}
