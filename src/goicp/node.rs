//! Branch-and-bound search nodes for the rotation and translation cubes.
//!
//! Both node types are ordered so that a `std::collections::BinaryHeap`
//! pops the node with the smallest lower bound first (ties broken by the
//! largest cube half-width), matching the strict weak order the reference
//! search relies on. `BinaryHeap` is a max-heap, so the `Ord` impl below is
//! deliberately inverted relative to "smaller lb is better."

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
pub struct RotNode {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub w: f32,
    pub ub: f32,
    pub lb: f32,
    pub l: i32,
}

impl PartialEq for RotNode {
    fn eq(&self, other: &Self) -> bool {
        self.lb == other.lb && self.w == other.w
    }
}
impl Eq for RotNode {}

impl PartialOrd for RotNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RotNode {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.lb != other.lb {
            other.lb.partial_cmp(&self.lb).unwrap()
        } else {
            self.w.partial_cmp(&other.w).unwrap()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransNode {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub ub: f32,
    pub lb: f32,
}

impl PartialEq for TransNode {
    fn eq(&self, other: &Self) -> bool {
        self.lb == other.lb && self.w == other.w
    }
}
impl Eq for TransNode {}

impl PartialOrd for TransNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TransNode {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.lb != other.lb {
            other.lb.partial_cmp(&self.lb).unwrap()
        } else {
            self.w.partial_cmp(&other.w).unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn heap_pops_smallest_lower_bound_first() {
        let mut heap = BinaryHeap::new();
        heap.push(RotNode { a: 0.0, b: 0.0, c: 0.0, w: 1.0, ub: 0.0, lb: 5.0, l: 0 });
        heap.push(RotNode { a: 0.0, b: 0.0, c: 0.0, w: 1.0, ub: 0.0, lb: 1.0, l: 0 });
        heap.push(RotNode { a: 0.0, b: 0.0, c: 0.0, w: 1.0, ub: 0.0, lb: 3.0, l: 0 });

        let order: Vec<f32> = std::iter::from_fn(|| heap.pop().map(|n| n.lb)).collect();
        assert_eq!(order, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn heap_breaks_ties_on_largest_width() {
        let mut heap = BinaryHeap::new();
        heap.push(TransNode { x: 0.0, y: 0.0, z: 0.0, w: 0.5, ub: 0.0, lb: 2.0 });
        heap.push(TransNode { x: 0.0, y: 0.0, z: 0.0, w: 2.0, ub: 0.0, lb: 2.0 });

        let top = heap.pop().unwrap();
        assert_eq!(top.w, 2.0);
    }
}
