use crate::aggregate::group::GroupIndex;

/// Bubble-size metric: how far the observed count rose above the threshold,
/// in units of the threshold's margin over the expected count.
///
/// Computes `max((observed - upper) / (upper - expected), 0)`. When
/// `upper == expected` the margin is zero and the result is 0.0; NaN inputs
/// also give 0.0, so the result is never negative.
pub fn normalized_excess(observed: f64, upper_bound: f64, expected: f64) -> f64 {
    let margin = upper_bound - expected;
    if margin == 0.0 {
        return 0.0;
    }
    let value = (observed - upper_bound) / margin;
    if value > 0.0 { value } else { 0.0 }
}

/// Whether a week's observed count is strictly above its threshold.
pub fn exceeds(observed: f64, upper_bound: f64) -> bool {
    observed > upper_bound
}

/// Counts the `true` flags in each group, in ascending key order.
pub fn count_exceeding<K>(flags: &[bool], groups: &GroupIndex<K>) -> Vec<usize> {
    let mut counts = vec![0; groups.len()];
    for (id, flag) in groups.ids().iter().zip(flags) {
        if *flag {
            counts[*id] += 1;
        }
    }
    counts
}
