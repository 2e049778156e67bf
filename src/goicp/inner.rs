//! Inner branch-and-bound: searches the translation cube for a fixed (or
//! fixed-with-uncertainty) rotation.

use std::collections::BinaryHeap;

use super::{GoIcp, TransNode};
use crate::geometry::point::Point3;
use crate::utils::SQRT3;

impl GoIcp {
    /// Searches the translation cube, starting from `init_node_trans`, for
    /// the best upper bound on squared registration error given
    /// `data_temp` (the data cloud already rotated by the outer search's
    /// candidate rotation).
    ///
    /// `max_rot_dis_l` is `Some(per_point_radius)` when computing a lower
    /// bound under rotation uncertainty, or `None` when computing an upper
    /// bound for an exact (zero-uncertainty) rotation. When it's `None` and
    /// `node_trans_out` is `Some`, the best translation node found is
    /// written back so the caller can record the overall incumbent pose.
    pub(crate) fn inner_bnb(
        &self,
        data_temp: &[Point3],
        max_rot_dis_l: Option<&[f64]>,
        mut node_trans_out: Option<&mut TransNode>,
    ) -> f64 {
        let mut opt_error_t = self.opt_error;

        let mut queue: BinaryHeap<TransNode> = BinaryHeap::new();
        queue.push(self.init_node_trans);

        let mut min_dis = vec![0.0f32; data_temp.len()];

        loop {
            let parent = match queue.pop() {
                Some(n) => n,
                None => break,
            };

            if opt_error_t - parent.lb as f64 < self.sse_thresh {
                break;
            }

            let w = parent.w / 2.0;
            let max_trans_dis = (SQRT3 as f32) / 2.0 * w;

            for j in 0u32..8 {
                let x = parent.x + ((j & 1) as f32) * w;
                let y = parent.y + (((j >> 1) & 1) as f32) * w;
                let z = parent.z + (((j >> 2) & 1) as f32) * w;

                let trans_x = x + w / 2.0;
                let trans_y = y + w / 2.0;
                let trans_z = z + w / 2.0;

                for (i, p) in data_temp.iter().enumerate() {
                    let mut d = self.dt.distance(
                        (p.x + trans_x) as f64,
                        (p.y + trans_y) as f64,
                        (p.z + trans_z) as f64,
                    );
                    if let Some(rot_dis) = max_rot_dis_l {
                        d -= rot_dis[i] as f32;
                    }
                    if d < 0.0 {
                        d = 0.0;
                    }
                    min_dis[i] = d;
                }

                if self.do_trim {
                    let hi = min_dis.len() - 1;
                    crate::selector::select(&mut min_dis, 0, hi, self.inlier_num - 1);
                }

                let mut ub = 0.0f64;
                for d in &min_dis[..self.inlier_num] {
                    ub += (*d as f64) * (*d as f64);
                }

                let mut lb = 0.0f64;
                for d in &min_dis[..self.inlier_num] {
                    let rem = d - max_trans_dis;
                    if rem > 0.0 {
                        lb += (rem as f64) * (rem as f64);
                    }
                }

                if ub < opt_error_t {
                    opt_error_t = ub;
                    if let Some(out) = node_trans_out.as_deref_mut() {
                        *out = TransNode { x, y, z, w, ub: 0.0, lb: 0.0 };
                    }
                }

                if lb >= opt_error_t {
                    continue;
                }

                queue.push(TransNode {
                    x,
                    y,
                    z,
                    w,
                    ub: ub as f32,
                    lb: lb as f32,
                });
            }
        }

        opt_error_t
    }
}
