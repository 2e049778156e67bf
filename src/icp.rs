//! Local (non-global) iterative closest point, used both stand-alone at a
//! branch-and-bound node's starting pose and repeatedly as the refinement
//! step inside the rotation search.

use log::trace;

use crate::geometry::point::Point3;
use crate::geometry::MatrixKernel;
use crate::kdtree::KdTree;

struct PointRef {
    dist: f64,
    id_data: usize,
    id_model: usize,
}

/// Local ICP against a fixed model point cloud.
pub struct Icp3D {
    model: Vec<Point3>,
    tree: KdTree,
    pub max_iter: usize,
    pub err_diff: f64,
    pub trim_fraction: f64,
    pub do_trim: bool,
}

impl Icp3D {
    pub fn build(model: &[Point3]) -> Self {
        Icp3D {
            model: model.to_vec(),
            tree: KdTree::build(model),
            max_iter: 10000,
            err_diff: 0.000_001,
            trim_fraction: 0.0,
            do_trim: true,
        }
    }

    /// Refines `r`/`t` (a 3x3 rotation and 3x1 translation, composed as
    /// `model_point ~= r * data_point + t`) in place against `data`, running
    /// until convergence or `max_iter` is reached. Returns the final
    /// (possibly trimmed) sum of squared nearest-neighbour distances.
    pub fn run(&self, data: &[Point3], r: &mut MatrixKernel, t: &mut MatrixKernel) -> f64 {
        let n = data.len();
        let num = if self.do_trim {
            ((n as f64) * (1.0 - self.trim_fraction)) as usize
        } else {
            n
        };

        let mut err = -1.0f64;
        let mut err_new = 0.0f64;

        // `mu_m`/`mu_d` are accumulators that live across iterations, never
        // reset to zero: each iteration's correspondence sums are added on
        // top of the previous iteration's already-normalized (`/n`) centroid,
        // compounding a shrinking bias into the centroid used for alignment.
        // This mirrors `mu_m`/`mu_d` in the reference implementation, which
        // are declared once before the loop and never cleared either.
        let mut mu_m = [0.0f64; 3];
        let mut mu_d = [0.0f64; 3];

        for iter in 0..self.max_iter {
            let r00 = r[[0, 0]];
            let r01 = r[[0, 1]];
            let r02 = r[[0, 2]];
            let r10 = r[[1, 0]];
            let r11 = r[[1, 1]];
            let r12 = r[[1, 2]];
            let r20 = r[[2, 0]];
            let r21 = r[[2, 1]];
            let r22 = r[[2, 2]];
            let t0 = t[[0, 0]];
            let t1 = t[[1, 0]];
            let t2 = t[[2, 0]];

            let transform = |p: &Point3| -> [f64; 3] {
                let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);
                [
                    r00 * x + r01 * y + r02 * z + t0,
                    r10 * x + r11 * y + r12 * z + t1,
                    r20 * x + r21 * y + r22 * z + t2,
                ]
            };

            let mut refs: Vec<PointRef> = Vec::with_capacity(n);
            err_new = 0.0;
            for (i, p) in data.iter().enumerate() {
                let q = transform(p);
                let query = Point3::new(q[0] as f32, q[1] as f32, q[2] as f32);
                let (id_model, dist_sqr) = self
                    .tree
                    .nearest(&query)
                    .expect("model point cloud must be non-empty");
                refs.push(PointRef {
                    dist: dist_sqr as f64,
                    id_data: i,
                    id_model,
                });
            }

            if self.do_trim {
                refs.sort_by(|a, b| a.dist.partial_cmp(&b.dist).unwrap());
            }

            let mut p_m = MatrixKernel::zeros(num, 3);
            let mut p_d = MatrixKernel::zeros(num, 3);

            for i in 0..num {
                let pref = &refs[i];
                let m = self.model[pref.id_model];
                p_m[[i, 0]] = m.x as f64;
                p_m[[i, 1]] = m.y as f64;
                p_m[[i, 2]] = m.z as f64;
                mu_m[0] += m.x as f64;
                mu_m[1] += m.y as f64;
                mu_m[2] += m.z as f64;

                let d = transform(&data[pref.id_data]);
                p_d[[i, 0]] = d[0];
                p_d[[i, 1]] = d[1];
                p_d[[i, 2]] = d[2];
                mu_d[0] += d[0];
                mu_d[1] += d[1];
                mu_d[2] += d[2];

                err_new += pref.dist;
            }

            if err > 0.0 && err - err_new < self.err_diff * num as f64 {
                trace!("icp converged after {iter} iterations, err={err_new}");
                break;
            }
            err = err_new;

            // NOTE: means are divided by the *total* point count `n`, not the
            // trimmed `num`, even though only `num` points were summed above.
            // This mirrors the reference implementation's own behaviour.
            for axis in mu_m.iter_mut().chain(mu_d.iter_mut()) {
                *axis /= n as f64;
            }

            let mut q_m = MatrixKernel::zeros(num, 3);
            let mut q_t = MatrixKernel::zeros(num, 3);
            for i in 0..num {
                for axis in 0..3 {
                    q_m[[i, axis]] = p_m[[i, axis]] - mu_m[axis];
                    q_t[[i, axis]] = p_d[[i, axis]] - mu_d[axis];
                }
            }

            let h = &q_t.transpose() * &q_m;
            let (u, _s, v) = h.svd();
            let mut r_ = &v * &u.transpose();

            let det = r_.det();
            let mut sign = MatrixKernel::eye(3);
            sign[[2, 2]] = det;
            r_ = &(&v * &sign) * &u.transpose();

            let mut t_ = MatrixKernel::zeros(3, 1);
            for axis in 0..3 {
                let r_mu_d = (0..3).map(|k| r_[[axis, k]] * mu_d[k]).sum::<f64>();
                t_[[axis, 0]] = mu_m[axis] - r_mu_d;
            }

            *r = &r_ * &*r;
            *t = &(&r_ * &*t) + &t_;
        }

        err_new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_pose() -> (MatrixKernel, MatrixKernel) {
        (MatrixKernel::eye(3), MatrixKernel::zeros(3, 1))
    }

    #[test]
    fn converges_on_identical_clouds() {
        let model = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let icp = Icp3D::build(&model);
        let (mut r, mut t) = identity_pose();
        let err = icp.run(&model, &mut r, &mut t);
        assert!(err < 1e-6);
    }

    #[test]
    fn recovers_pure_translation() {
        let model = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(2.0, 2.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
        ];
        let offset = [0.5, -0.3, 0.2];
        let data: Vec<Point3> = model
            .iter()
            .map(|p| Point3::new(p.x - offset[0] as f32, p.y - offset[1] as f32, p.z - offset[2] as f32))
            .collect();

        let icp = Icp3D::build(&model);
        let (mut r, mut t) = identity_pose();
        let err = icp.run(&data, &mut r, &mut t);

        assert!(err < 1e-6);
        assert!((t[[0, 0]] - offset[0]).abs() < 1e-3);
        assert!((t[[1, 0]] - offset[1]).abs() < 1e-3);
        assert!((t[[2, 0]] - offset[2]).abs() < 1e-3);
    }

    #[test]
    fn trimming_tolerates_outliers() {
        let model = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let mut data = model.clone();
        data.push(Point3::new(500.0, 500.0, 500.0));

        let mut icp = Icp3D::build(&model);
        icp.do_trim = true;
        icp.trim_fraction = 0.2;
        let (mut r, mut t) = identity_pose();
        let err = icp.run(&data, &mut r, &mut t);
        assert!(err < 1e-6);
    }
}
