//! Quicksort-based sorting and arg-reductions.
//!
//! Sorting uses Hoare partitioning with the first element as pivot. The
//! sort is not stable: equal keys may come out in either relative order.

use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2, Axis};

/// Sort `keys` ascending in place, applying the same swaps to `perm`.
fn quicksort(keys: &mut [f64], perm: &mut [usize]) {
    let mut lo = 0;
    let mut hi = keys.len();
    // Recurse into the smaller half and loop on the larger one so the stack
    // stays logarithmic on already sorted input.
    while hi - lo > 1 {
        let split = hoare_partition(&mut keys[lo..hi], &mut perm[lo..hi]) + lo;
        if split + 1 - lo < hi - split - 1 {
            quicksort(&mut keys[lo..=split], &mut perm[lo..=split]);
            lo = split + 1;
        } else {
            quicksort(&mut keys[split + 1..hi], &mut perm[split + 1..hi]);
            hi = split + 1;
        }
    }
}

/// Returns `j` such that every key in `..=j` is `<=` every key in `j + 1..`.
/// `j` is always strictly less than `keys.len() - 1`.
fn hoare_partition(keys: &mut [f64], perm: &mut [usize]) -> usize {
    let pivot = keys[0];
    let mut i = 0;
    let mut j = keys.len() - 1;
    loop {
        while keys[i] < pivot {
            i += 1;
        }
        while keys[j] > pivot {
            j -= 1;
        }
        if i >= j {
            return j;
        }
        keys.swap(i, j);
        perm.swap(i, j);
        i += 1;
        j -= 1;
    }
}

fn sort_lane(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut keys = values.to_vec();
    let mut perm: Vec<usize> = (0..values.len()).collect();
    quicksort(&mut keys, &mut perm);
    (keys, perm)
}

/// Ascending copy of `values`.
pub fn sort(values: &Array1<f64>) -> Array1<f64> {
    Array1::from_vec(sort_lane(values.as_slice()).0)
}

/// Indices that would sort `values` ascending.
pub fn argsort(values: &Array1<f64>) -> Array1<usize> {
    Array1::from_vec(sort_lane(values.as_slice()).1)
}

/// Collect lane `k` of `m` (column `k` for `Axis(0)`, row `k` for `Axis(1)`).
fn lane(m: &Array2<f64>, axis: Axis, k: usize) -> Vec<f64> {
    if axis.0 == 0 {
        m.column(k).into_vec()
    } else {
        m.row_slice(k).to_vec()
    }
}

fn lane_count(m: &Array2<f64>, axis: Axis) -> usize {
    if axis.0 == 0 {
        m.ncols()
    } else {
        m.nrows()
    }
}

fn sort_lanes<T, F>(m: &Array2<f64>, axis: Axis, mut pick: F) -> Result<Array2<T>>
where
    T: Clone + num_traits::Zero,
    F: FnMut((Vec<f64>, Vec<usize>)) -> Vec<T>,
{
    let axis = axis.check()?;
    let mut out = Array2::<T>::zeros(m.nrows(), m.ncols());
    for k in 0..lane_count(m, axis) {
        let sorted = pick(sort_lane(&lane(m, axis, k)));
        for (pos, value) in sorted.into_iter().enumerate() {
            let idx = if axis.0 == 0 { (pos, k) } else { (k, pos) };
            out[idx] = value;
        }
    }
    Ok(out)
}

/// Sort every column (`Axis(0)`) or every row (`Axis(1)`) independently.
pub fn sort_axis(m: &Array2<f64>, axis: Axis) -> Result<Array2<f64>> {
    sort_lanes(m, axis, |(keys, _)| keys)
}

/// Per-lane argsort; each output lane holds indices into the matching input lane.
pub fn argsort_axis(m: &Array2<f64>, axis: Axis) -> Result<Array2<usize>> {
    sort_lanes(m, axis, |(_, perm)| perm)
}

fn extreme(values: &[f64], better: fn(f64, f64) -> bool) -> Result<usize> {
    let mut iter = values.iter().enumerate();
    let (mut best_idx, mut best) = match iter.next() {
        Some((i, &v)) => (i, v),
        None => return Err(LearnError::EmptyInput),
    };
    for (i, &v) in iter {
        if better(v, best) {
            best = v;
            best_idx = i;
        }
    }
    Ok(best_idx)
}

/// Index of the smallest value; ties resolve to the lowest index.
pub fn argmin(values: &Array1<f64>) -> Result<usize> {
    extreme(values.as_slice(), |a, b| a < b)
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &Array1<f64>) -> Result<usize> {
    extreme(values.as_slice(), |a, b| a > b)
}

fn arg_axis(m: &Array2<f64>, axis: Axis, better: fn(f64, f64) -> bool) -> Result<Array1<usize>> {
    let axis = axis.check()?;
    if m.is_empty() {
        return Err(LearnError::EmptyInput);
    }
    (0..lane_count(m, axis))
        .map(|k| extreme(&lane(m, axis, k), better))
        .collect::<Result<Vec<_>>>()
        .map(Array1::from_vec)
}

/// Per-lane [`argmin`]: one index per column (`Axis(0)`) or per row (`Axis(1)`).
pub fn argmin_axis(m: &Array2<f64>, axis: Axis) -> Result<Array1<usize>> {
    arg_axis(m, axis, |a, b| a < b)
}

/// Per-lane [`argmax`]: one index per column (`Axis(0)`) or per row (`Axis(1)`).
pub fn argmax_axis(m: &Array2<f64>, axis: Axis) -> Result<Array1<usize>> {
    arg_axis(m, axis, |a, b| a > b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(perm: &[usize]) -> bool {
        let mut seen = vec![false; perm.len()];
        for &p in perm {
            if p >= perm.len() || seen[p] {
                return false;
            }
            seen[p] = true;
        }
        true
    }

    #[test]
    fn sorts_small_array() {
        let a = Array1::from_vec(vec![-5.0, 3.0, 10.0, 2.0, 1.0, -1.0]);
        assert_eq!(sort(&a).to_vec(), vec![-5.0, -1.0, 1.0, 2.0, 3.0, 10.0]);
        assert_eq!(argsort(&a).to_vec(), vec![0, 5, 4, 3, 1, 2]);
    }

    #[test]
    fn argsort_is_consistent_with_sort_on_duplicates() {
        let a = Array1::from_vec(vec![3.0, 1.0, 3.0, 1.0, 2.0, 3.0, 0.0, 2.0, 2.0]);
        let sorted = sort(&a);
        let order = argsort(&a);
        assert!(is_permutation(order.as_slice()));
        assert_eq!(a.select(order.as_slice()), sorted);
        assert!(sorted.as_slice().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn handles_sorted_and_reversed_input() {
        let up: Array1<f64> = (0..2000).map(|x| x as f64).collect();
        assert_eq!(sort(&up), up);
        let down: Array1<f64> = (0..2000).rev().map(|x| x as f64).collect();
        assert_eq!(sort(&down), up);
        let flat = Array1::from_elem(500, 1.5);
        assert_eq!(sort(&flat), flat);
    }

    #[test]
    fn empty_and_singleton() {
        let empty: Array1<f64> = Array1::from_vec(vec![]);
        assert!(sort(&empty).is_empty());
        assert_eq!(argsort(&Array1::from_vec(vec![7.0])).to_vec(), vec![0]);
    }

    #[test]
    fn sort_axis_per_column_and_row() {
        let m = Array2::from_rows(vec![vec![3.0, 1.0], vec![2.0, 4.0], vec![1.0, 0.0]]).unwrap();
        let cols = sort_axis(&m, Axis(0)).unwrap();
        assert_eq!(cols.to_rows(), vec![vec![1.0, 0.0], vec![2.0, 1.0], vec![3.0, 4.0]]);
        let rows = argsort_axis(&m, Axis(1)).unwrap();
        assert_eq!(rows.to_rows(), vec![vec![1, 0], vec![0, 1], vec![1, 0]]);
        assert_eq!(sort_axis(&m, Axis(3)), Err(LearnError::UnknownAxis(3)));
    }

    #[test]
    fn arg_extremes_prefer_lowest_index() {
        let a = Array1::from_vec(vec![2.0, 5.0, 1.0, 5.0, 1.0]);
        assert_eq!(argmax(&a).unwrap(), 1);
        assert_eq!(argmin(&a).unwrap(), 2);
        let empty: Array1<f64> = Array1::from_vec(vec![]);
        assert_eq!(argmin(&empty), Err(LearnError::EmptyInput));
    }

    #[test]
    fn arg_extremes_along_axes() {
        let m = Array2::from_rows(vec![vec![1.0, 9.0, 3.0], vec![7.0, 2.0, 3.0]]).unwrap();
        assert_eq!(argmax_axis(&m, Axis(1)).unwrap().to_vec(), vec![1, 0]);
        assert_eq!(argmin_axis(&m, Axis(0)).unwrap().to_vec(), vec![0, 1, 0]);
    }
}
