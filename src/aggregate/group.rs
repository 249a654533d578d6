use crate::aggregate::series::{lag_ratio, moving_sum};
use std::collections::BTreeMap;

/// Assignment of every row to a group, with groups numbered in ascending key
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupIndex<K> {
    ids: Vec<usize>,
    keys: Vec<K>,
}

impl<K> GroupIndex<K> {
    /// Group id of each row, in row order.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Distinct keys; `keys()[id]` is the key of group `id`.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Number of distinct groups.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Reduction applied to each group's values.
#[derive(Debug, Clone, Copy)]
pub enum ReduceOp<'a> {
    /// Total of the group.
    Sum,
    /// Trailing window sum ending at the group's last row.
    MovingSum(usize),
    /// [`lag_ratio`] of the group's values over the matching rows of
    /// `denominator`, taken at the group's last row.
    LagRatio { denominator: &'a [f64], lag: usize },
}

/// Gives each row the id of its key. Two rows share an id iff their keys are
/// equal.
pub fn group_key<K: Ord + Clone>(keys: &[K]) -> GroupIndex<K> {
    let mut distinct: BTreeMap<&K, usize> = keys.iter().map(|k| (k, 0)).collect();
    for (id, slot) in distinct.values_mut().enumerate() {
        *slot = id;
    }

    let ids = keys.iter().map(|k| distinct[k]).collect();
    let keys = distinct.into_keys().cloned().collect();

    GroupIndex { ids, keys }
}

/// Splits `values` into one sequence per group, preserving row order.
///
/// Rows beyond the shorter of `values` and the index are ignored.
pub fn split<K>(values: &[f64], groups: &GroupIndex<K>) -> Vec<Vec<f64>> {
    let mut out = vec![Vec::new(); groups.len()];
    for (id, v) in groups.ids.iter().zip(values) {
        out[*id].push(*v);
    }
    out
}

/// Reduces each group's values with `op`, one output per group in ascending
/// key order.
pub fn reduce<K>(values: &[f64], groups: &GroupIndex<K>, op: ReduceOp<'_>) -> Vec<f64> {
    let per_group = split(values, groups);

    match op {
        ReduceOp::Sum => per_group.iter().map(|g| g.iter().sum()).collect(),
        ReduceOp::MovingSum(window) => per_group
            .iter()
            .map(|g| moving_sum(g, window).last().copied().unwrap_or(0.0))
            .collect(),
        ReduceOp::LagRatio { denominator, lag } => {
            let denominators = split(denominator, groups);
            per_group
                .iter()
                .zip(&denominators)
                .map(|(n, d)| lag_ratio(n, d, lag).last().copied().unwrap_or(0.0))
                .collect()
        }
    }
}

/// Sums `values` per distinct key, returned as `(key, total)` in ascending
/// key order.
pub fn sum_by_key<K: Ord + Clone>(keys: &[K], values: &[f64]) -> Vec<(K, f64)> {
    let groups = group_key(keys);
    let totals = reduce(values, &groups, ReduceOp::Sum);
    groups.keys.into_iter().zip(totals).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_equal_keys_share_id() {
        let groups = group_key(&["b", "a", "b", "c", "a"]);
        assert_eq!(groups.keys(), ["a", "b", "c"]);
        assert_eq!(groups.ids(), [1, 0, 1, 2, 0]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_single_key_sums_everything() {
        let values = [3.0, 4.5, 10.0, 0.5];
        let groups = group_key(&["TX"; 4]);
        let totals = reduce(&values, &groups, ReduceOp::Sum);
        assert_eq!(totals, vec![18.0]);
    }

    #[test]
    fn test_reduce_sum_ascending_key_order() {
        let keys = [2021, 2020, 2021, 2020];
        let values = [1.0, 10.0, 2.0, 20.0];
        assert_eq!(sum_by_key(&keys, &values), vec![(2020, 30.0), (2021, 3.0)]);
    }

    #[test]
    fn test_reduce_moving_sum_takes_last_window() {
        let keys = ["a", "a", "a", "b"];
        let values = [1.0, 2.0, 4.0, 7.0];
        let groups = group_key(&keys);
        assert_eq!(reduce(&values, &groups, ReduceOp::MovingSum(2)), vec![6.0, 7.0]);
    }

    #[test]
    fn test_reduce_lag_ratio_per_group() {
        let keys = ["a", "b", "a", "b", "a", "b"];
        let deaths = [0.0, 0.0, 0.0, 0.0, 10.0, 5.0];
        let cases = [5.0, 10.0, 5.0, 10.0, 5.0, 10.0];
        let groups = group_key(&keys);
        let op = ReduceOp::LagRatio {
            denominator: &cases,
            lag: 2,
        };
        assert_eq!(reduce(&deaths, &groups, op), vec![200.0, 50.0]);
    }

    #[test]
    fn test_empty_input() {
        let groups = group_key::<u8>(&[]);
        assert!(groups.is_empty());
        assert!(reduce(&[], &groups, ReduceOp::Sum).is_empty());
    }
}
