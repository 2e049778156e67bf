//! A recursive, one-point-per-node k-d tree over 3D points, used by local
//! ICP to answer nearest-neighbour queries against the model cloud in
//! expected `O(log n)` time instead of a brute-force linear scan.
//!
//! This departs from the bucketed-leaf k-d tree nanoflann would build (which
//! groups several points per leaf); a single-point-per-node tree is the shape
//! a plain recursive k-d tree construction naturally produces and is what the
//! rest of this codebase's own k-nearest-neighbour tree already looks like.

use crate::geometry::point::Point3;

struct Node {
    point: Point3,
    index: usize,
    axis: usize,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

pub struct KdTree {
    root: Option<Box<Node>>,
}

impl KdTree {
    pub fn build(points: &[Point3]) -> Self {
        let mut items: Vec<(Point3, usize)> = points.iter().copied().zip(0..).collect();
        let root = build_recursive(&mut items, 0);
        KdTree { root }
    }

    /// Returns `(index_into_original_points, squared_distance)` of the
    /// nearest neighbour to `query`.
    pub fn nearest(&self, query: &Point3) -> Option<(usize, f32)> {
        let root = self.root.as_deref()?;
        let mut best_index = root.index;
        let mut best_dist = root.point.squared_distance(query);
        search(root, query, &mut best_index, &mut best_dist);
        Some((best_index, best_dist))
    }
}

fn build_recursive(items: &mut [(Point3, usize)], depth: usize) -> Option<Box<Node>> {
    if items.is_empty() {
        return None;
    }
    let axis = depth % 3;
    items.sort_by(|a, b| a.0.coord(axis).partial_cmp(&b.0.coord(axis)).unwrap());
    let mid = items.len() / 2;
    let (point, index) = items[mid];

    let (left_items, rest) = items.split_at_mut(mid);
    let right_items = &mut rest[1..];

    Some(Box::new(Node {
        point,
        index,
        axis,
        left: build_recursive(left_items, depth + 1),
        right: build_recursive(right_items, depth + 1),
    }))
}

fn search(node: &Node, query: &Point3, best_index: &mut usize, best_dist: &mut f32) {
    let d = node.point.squared_distance(query);
    if d < *best_dist {
        *best_dist = d;
        *best_index = node.index;
    }

    let diff = query.coord(node.axis) - node.point.coord(node.axis);
    let (near, far) = if diff < 0.0 {
        (&node.left, &node.right)
    } else {
        (&node.right, &node.left)
    };

    if let Some(near) = near {
        search(near, query, best_index, best_dist);
    }
    if diff * diff < *best_dist {
        if let Some(far) = far {
            search(far, query, best_index, best_dist);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_nearest(points: &[Point3], query: &Point3) -> (usize, f32) {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.squared_distance(query)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap()
    }

    #[test]
    fn matches_brute_force_on_random_points() {
        let mut state: u64 = 0xdead_beef_1234_5678;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 1000) as f32 / 10.0
        };
        let points: Vec<Point3> = (0..200)
            .map(|_| Point3::new(next(), next(), next()))
            .collect();
        let tree = KdTree::build(&points);

        for _ in 0..20 {
            let q = Point3::new(next(), next(), next());
            let (expected_idx, expected_dist) = brute_force_nearest(&points, &q);
            let (got_idx, got_dist) = tree.nearest(&q).unwrap();
            assert!((got_dist - expected_dist).abs() < 1e-4);
            // Ties are possible; compare distances, and only the index when unique.
            if points.iter().filter(|p| p.squared_distance(&q) == expected_dist).count() == 1 {
                assert_eq!(got_idx, expected_idx);
            }
        }
    }

    #[test]
    fn single_point_tree() {
        let points = vec![Point3::new(1.0, 2.0, 3.0)];
        let tree = KdTree::build(&points);
        let (idx, dist) = tree.nearest(&Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(idx, 0);
        assert!((dist - 14.0).abs() < 1e-5);
    }
}
