//! Outer branch-and-bound: searches the rotation cube, delegating to
//! [`GoIcp::inner_bnb`] for the translation half of each candidate pose and
//! re-running local ICP whenever a new incumbent is found.

use std::collections::BinaryHeap;

use log::debug;

use super::{GoIcp, RotNode};
use crate::geometry::point::Point3;
use crate::geometry::{rodrigues, MatrixKernel};
use crate::utils::{PI, SQRT3};

fn rotate(r: &MatrixKernel, points: &[Point3]) -> Vec<Point3> {
    points
        .iter()
        .map(|p| {
            let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);
            Point3::new(
                (r[[0, 0]] * x + r[[0, 1]] * y + r[[0, 2]] * z) as f32,
                (r[[1, 0]] * x + r[[1, 1]] * y + r[[1, 2]] * z) as f32,
                (r[[2, 0]] * x + r[[2, 1]] * y + r[[2, 2]] * z) as f32,
            )
        })
        .collect()
}

impl GoIcp {
    pub(crate) fn outer_bnb(&mut self) -> f64 {
        // Initial error: untransformed data cloud against the distance transform.
        let mut min_dis: Vec<f32> = self
            .data
            .iter()
            .map(|p| self.dt.distance(p.x as f64, p.y as f64, p.z as f64))
            .collect();
        if self.do_trim {
            let hi = min_dis.len() - 1;
            crate::selector::select(&mut min_dis, 0, hi, self.inlier_num - 1);
        }
        self.opt_error = min_dis[..self.inlier_num]
            .iter()
            .map(|d| (*d as f64) * (*d as f64))
            .sum();
        debug!("initial error: {}", self.opt_error);

        // Run ICP once from the identity pose before entering the search.
        let mut r_icp = self.opt_r.clone();
        let mut t_icp = self.opt_t.clone();
        let error = self.icp(&mut r_icp, &mut t_icp);
        if error < self.opt_error {
            self.opt_error = error;
            self.opt_r = r_icp;
            self.opt_t = t_icp;
            debug!("error improved by initial ICP: {}", self.opt_error);
        }

        let mut queue: BinaryHeap<RotNode> = BinaryHeap::new();
        queue.push(self.init_node_rot);

        loop {
            let parent = match queue.pop() {
                Some(n) => n,
                None => {
                    debug!("rotation queue empty, final error {}", self.opt_error);
                    break;
                }
            };

            if self.opt_error - parent.lb as f64 <= self.sse_thresh {
                debug!("converged: error={} lb={}", self.opt_error, parent.lb);
                break;
            }

            let w = parent.w / 2.0;
            let level = parent.l + 1;

            for j in 0u32..8 {
                let a = parent.a + ((j & 1) as f32) * w;
                let b = parent.b + (((j >> 1) & 1) as f32) * w;
                let c = parent.c + (((j >> 2) & 1) as f32) * w;

                let v1 = a + w / 2.0;
                let v2 = b + w / 2.0;
                let v3 = c + w / 2.0;

                if ((v1 * v1 + v2 * v2 + v3 * v3).sqrt() - SQRT3 as f32 * w / 2.0) as f64 > PI {
                    continue;
                }

                let r = rodrigues([v1 as f64, v2 as f64, v3 as f64]);
                let data_temp = rotate(&r, &self.data);

                let mut node_trans = self.init_node_trans;
                let ub = self.inner_bnb(&data_temp, None, Some(&mut node_trans));

                if ub < self.opt_error {
                    self.opt_error = ub;
                    self.opt_node_rot = RotNode { a, b, c, w, ub: ub as f32, lb: parent.lb, l: level };
                    self.opt_node_trans = node_trans;

                    self.opt_r = r.clone();
                    self.opt_t = MatrixKernel::zeros(3, 1);
                    self.opt_t[[0, 0]] = (node_trans.x + node_trans.w / 2.0) as f64;
                    self.opt_t[[1, 0]] = (node_trans.y + node_trans.w / 2.0) as f64;
                    self.opt_t[[2, 0]] = (node_trans.z + node_trans.w / 2.0) as f64;

                    debug!("incumbent improved: error={}", self.opt_error);

                    let mut r_icp = self.opt_r.clone();
                    let mut t_icp = self.opt_t.clone();
                    let error = self.icp(&mut r_icp, &mut t_icp);
                    if error < self.opt_error {
                        self.opt_error = error;
                        self.opt_r = r_icp;
                        self.opt_t = t_icp;
                        debug!("incumbent improved by ICP: error={}", self.opt_error);
                    }

                    let mut survivors = Vec::with_capacity(queue.len());
                    while let Some(node) = queue.pop() {
                        if (node.lb as f64) < self.opt_error {
                            survivors.push(node);
                        } else {
                            break;
                        }
                    }
                    queue = survivors.into_iter().collect();
                }

                let lb = self.inner_bnb(&data_temp, Some(&self.max_rot_dis[level as usize]), None);
                if lb >= self.opt_error {
                    continue;
                }

                queue.push(RotNode { a, b, c, w, ub: ub as f32, lb: lb as f32, l: level });
            }
        }

        self.opt_error
    }
}
