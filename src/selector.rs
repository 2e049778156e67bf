//! A deterministic k-th order statistic selector ("intro-select").
//!
//! Quickselect with median-of-3 pivoting normally runs in expected linear time,
//! but its worst case is quadratic. This selector watches its own progress and
//! falls back to median-of-medians-of-5 (which is worst-case linear) whenever a
//! run of pivot choices fails to shrink the active span fast enough, giving a
//! selector that is linear in the worst case without paying the median-of-medians
//! constant factor on well-behaved inputs.

/// Spans at or below this length are insertion-sorted directly rather than partitioned.
const INSERTION_NUM: usize = 5;

/// Number of consecutive quickselect rounds allowed before checking whether
/// progress has stalled.
const INTRO_K: usize = 5;

/// Partition `a[lo..=hi]` so that `a[lo..k]` are all ≤ `a[k]` and `a[k+1..=hi]`
/// are all ≥ `a[k]`. Pivot values are never altered, only reordered; the
/// multiset of `a[lo..=hi]` is unchanged. Requires `lo <= k <= hi < a.len()`.
pub fn select(a: &mut [f32], lo: usize, hi: usize, k: usize) {
    debug_assert!(lo <= k && k <= hi && hi < a.len());

    let mut lo = lo;
    let mut hi = hi;
    let mut span_before = hi - lo + 1;
    let mut rounds_since_check = 0usize;
    let mut quickselect = true;

    loop {
        if lo >= hi {
            return;
        }

        if hi - lo + 1 <= INSERTION_NUM {
            insertion_sort(a, lo, hi);
            return;
        }

        if quickselect {
            rounds_since_check += 1;
            if rounds_since_check == INTRO_K {
                let span_now = hi - lo + 1;
                if span_now * 2 > span_before {
                    quickselect = false;
                }
                span_before = span_now;
                rounds_since_check = 0;
            }
        }

        let pivot_idx = if quickselect {
            median_of_first_mid_last(a, lo, hi)
        } else {
            median_of_medians(a, lo, hi)
        };
        a.swap(lo, pivot_idx);

        let s = hoare_partition(a, lo, hi);

        if s == k {
            return;
        } else if s < k {
            lo = s + 1;
        } else {
            hi = s - 1;
        }
    }
}

/// Hoare partition around `a[lo]`, returning the pivot's final index.
fn hoare_partition(a: &mut [f32], lo: usize, hi: usize) -> usize {
    let pivot = a[lo];
    let mut left = lo + 1;
    let mut right = hi;

    loop {
        while left < right && pivot >= a[left] {
            left += 1;
        }
        while left < right && pivot <= a[right] {
            right -= 1;
        }
        if left >= right {
            break;
        }
        a.swap(left, right);
    }

    let s = if a[left] < pivot { left } else { left - 1 };
    a.swap(lo, s);
    s
}

fn insertion_sort(a: &mut [f32], lo: usize, hi: usize) {
    for i in lo + 1..=hi {
        let mut j = i;
        while j > lo && a[j - 1] > a[j] {
            a.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn median_of_first_mid_last(a: &[f32], lo: usize, hi: usize) -> usize {
    let mid = (lo + hi) / 2;
    if a[lo] < a[hi] {
        if a[mid] < a[lo] {
            lo
        } else if a[mid] < a[hi] {
            mid
        } else {
            hi
        }
    } else if a[mid] < a[hi] {
        hi
    } else if a[mid] < a[lo] {
        mid
    } else {
        lo
    }
}

fn median_of_three(a: &[f32], st: usize) -> usize {
    if a[st] < a[st + 2] {
        if a[st + 1] < a[st] {
            st
        } else if a[st + 1] < a[st + 2] {
            st + 1
        } else {
            st + 2
        }
    } else if a[st + 1] < a[st + 2] {
        st + 2
    } else if a[st + 1] < a[st] {
        st + 1
    } else {
        st
    }
}

/// Median of 5 elements starting at `st`, found with 6 comparisons. Reorders
/// `a[st..st+5]` in the process (this is harmless: the caller only cares about
/// which index holds the median).
fn median_of_five(a: &mut [f32], st: usize) -> usize {
    if a[st] > a[st + 1] {
        a.swap(st, st + 1);
    }
    if a[st + 2] > a[st + 3] {
        a.swap(st + 2, st + 3);
    }

    if a[st] < a[st + 2] {
        let tmp = a[st + 4];
        a[st + 4] = a[st];
        if tmp < a[st + 1] {
            a[st] = tmp;
        } else {
            a[st] = a[st + 1];
            a[st + 1] = tmp;
        }
    } else {
        let tmp = a[st + 4];
        a[st + 4] = a[st + 2];
        if tmp < a[st + 3] {
            a[st + 2] = tmp;
        } else {
            a[st + 2] = a[st + 3];
            a[st + 3] = tmp;
        }
    }

    if a[st] < a[st + 2] {
        if a[st + 1] < a[st + 2] {
            st + 1
        } else {
            st + 2
        }
    } else if a[st] < a[st + 3] {
        st
    } else {
        st + 3
    }
}

/// Recursive median-of-medians-of-5: groups `a[lo..=hi]` into blocks of 5,
/// moves each block's median to the front, then recurses on the medians.
fn median_of_medians(a: &mut [f32], lo: usize, hi: usize) -> usize {
    let len = hi - lo + 1;
    let mut num_groups = len / 5;
    if len % 5 != 0 {
        num_groups += 1;
    }

    let mut group_start = lo;
    let mut i = 0;
    while i < num_groups.saturating_sub(1) {
        let med = median_of_five(a, group_start);
        a.swap(lo + i, med);
        group_start += 5;
        i += 1;
    }

    // Last (possibly partial) group.
    let remaining = hi - group_start + 1;
    let med = match remaining {
        3 | 4 => median_of_three(a, group_start),
        5 => median_of_five(a, group_start),
        _ => group_start,
    };
    a.swap(lo + i, med);

    if num_groups > 5 {
        median_of_medians(a, lo, lo + num_groups - 1)
    } else {
        match num_groups {
            3 | 4 => median_of_three(a, lo),
            5 => median_of_five(a, lo),
            _ => lo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(a: &[f32], lo: usize, hi: usize, k: usize) {
        let pivot = a[k];
        for &x in &a[lo..k] {
            assert!(x <= pivot, "{x} should be <= pivot {pivot}");
        }
        for &x in &a[k + 1..=hi] {
            assert!(x >= pivot, "{x} should be >= pivot {pivot}");
        }
    }

    #[test]
    fn select_small() {
        let mut a = [5.0f32, 2.0, 8.0, 1.0, 9.0, 3.0];
        let hi = a.len() - 1;
        select(&mut a, 0, hi, 2);
        assert_partition(&a, 0, hi, 2);
    }

    #[test]
    fn select_all_equal() {
        let mut a = [4.0f32; 23];
        select(&mut a, 0, 22, 10);
        assert_partition(&a, 0, 22, 10);
    }

    #[test]
    fn select_sorted_and_reverse() {
        let mut asc: Vec<f32> = (0..1000).map(|x| x as f32).collect();
        select(&mut asc, 0, 999, 500);
        assert_partition(&asc, 0, 999, 500);

        let mut desc: Vec<f32> = (0..1000).rev().map(|x| x as f32).collect();
        select(&mut desc, 0, 999, 500);
        assert_partition(&desc, 0, 999, 500);
    }

    #[test]
    fn select_stress_random_k() {
        let mut state: u64 = 0x1234_5678_9abc_def0;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        for trial in 0..30 {
            let n = 200 + (trial * 37) % 500;
            let mut a: Vec<f32> = (0..n).map(|_| (next() % 1000) as f32).collect();
            let k = (next() as usize) % n;
            select(&mut a, 0, n - 1, k);
            assert_partition(&a, 0, n - 1, k);
        }
    }

    #[test]
    fn select_preserves_multiset() {
        let mut a = vec![9.0f32, 1.0, 5.0, 5.0, 3.0, 7.0, 2.0];
        let mut expected = a.clone();
        expected.sort_by(|x, y| x.partial_cmp(y).unwrap());
        let hi = a.len() - 1;
        select(&mut a, 0, hi, 3);
        let mut sorted = a.clone();
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(sorted, expected);
    }
}
