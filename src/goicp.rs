//! Globally optimal rigid registration: a nested branch-and-bound search
//! over SE(3), with local ICP as the refinement step and a 3D distance
//! transform standing in for expensive per-candidate nearest-neighbour
//! queries.

mod inner;
mod node;
mod outer;

pub use node::{RotNode, TransNode};

use log::info;

use crate::distance_transform::DistanceTransform3D;
use crate::geometry::point::Point3;
use crate::geometry::MatrixKernel;
use crate::icp::Icp3D;
use crate::utils::{PI, SQRT3};

const MAXROTLEVEL: usize = 20;

/// Configuration knobs for a registration run, mirroring what the reference
/// tool reads out of its config file.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub mse_thresh: f64,
    pub rot_min: [f64; 3],
    pub rot_width: f64,
    pub trans_min: [f64; 3],
    pub trans_width: f64,
    pub trim_fraction: f64,
    pub dist_trans_size: usize,
    pub dist_trans_expand_factor: f64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        RegistrationConfig {
            mse_thresh: 0.001,
            rot_min: [-PI, -PI, -PI],
            rot_width: 2.0 * PI,
            trans_min: [-0.5, -0.5, -0.5],
            trans_width: 1.0,
            trim_fraction: 0.0,
            dist_trans_size: 300,
            dist_trans_expand_factor: 2.0,
        }
    }
}

/// The outcome of a registration run: the best rigid transform found and its
/// trimmed sum-of-squared-error.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub opt_r: MatrixKernel,
    pub opt_t: MatrixKernel,
    pub opt_error: f64,
}

pub struct GoIcp {
    model: Vec<Point3>,
    data: Vec<Point3>,

    mse_thresh: f64,
    trim_fraction: f64,
    do_trim: bool,

    init_node_rot: RotNode,
    init_node_trans: TransNode,

    dt: DistanceTransform3D,
    icp3d: Icp3D,

    norm_data: Vec<f64>,
    max_rot_dis: Vec<Vec<f64>>,

    opt_error: f64,
    opt_r: MatrixKernel,
    opt_t: MatrixKernel,
    opt_node_rot: RotNode,
    opt_node_trans: TransNode,

    inlier_num: usize,
    sse_thresh: f64,
}

impl GoIcp {
    /// Builds the distance transform, the local-ICP kd-tree, and every
    /// precomputed table the search needs, then leaves the search ready to
    /// run via [`GoIcp::register`].
    pub fn new(model: Vec<Point3>, data: Vec<Point3>, config: &RegistrationConfig) -> Self {
        let dt = DistanceTransform3D::build(&model, config.dist_trans_size, config.dist_trans_expand_factor);

        let mut icp3d = Icp3D::build(&model);
        icp3d.err_diff = config.mse_thresh / 10000.0;
        icp3d.trim_fraction = config.trim_fraction;
        icp3d.do_trim = config.trim_fraction > 0.0;
        let do_trim = icp3d.do_trim;

        let norm_data: Vec<f64> = data
            .iter()
            .map(|p| ((p.x * p.x + p.y * p.y + p.z * p.z) as f64).sqrt())
            .collect();

        let init_node_rot = RotNode {
            a: config.rot_min[0] as f32,
            b: config.rot_min[1] as f32,
            c: config.rot_min[2] as f32,
            w: config.rot_width as f32,
            ub: 0.0,
            lb: 0.0,
            l: 0,
        };
        let init_node_trans = TransNode {
            x: config.trans_min[0] as f32,
            y: config.trans_min[1] as f32,
            z: config.trans_min[2] as f32,
            w: config.trans_width as f32,
            ub: 0.0,
            lb: 0.0,
        };

        let mut max_rot_dis = vec![vec![0.0f64; data.len()]; MAXROTLEVEL];
        for (level, row) in max_rot_dis.iter_mut().enumerate() {
            let sigma = init_node_rot.w as f64 / 2f64.powi(level as i32) / 2.0;
            let mut max_angle = SQRT3 * sigma;
            if max_angle > PI {
                max_angle = PI;
            }
            for (j, norm) in norm_data.iter().enumerate() {
                row[j] = 2.0 * (max_angle / 2.0).sin() * norm;
            }
        }

        let inlier_num = if do_trim {
            ((data.len() as f64) * (1.0 - config.trim_fraction)) as usize
        } else {
            data.len()
        };
        let sse_thresh = config.mse_thresh * inlier_num as f64;

        GoIcp {
            model,
            data,
            mse_thresh: config.mse_thresh,
            trim_fraction: config.trim_fraction,
            do_trim,
            init_node_rot,
            init_node_trans,
            dt,
            icp3d,
            norm_data,
            max_rot_dis,
            opt_error: 0.0,
            opt_r: MatrixKernel::eye(3),
            opt_t: MatrixKernel::zeros(3, 1),
            opt_node_rot: init_node_rot,
            opt_node_trans: init_node_trans,
            inlier_num,
            sse_thresh,
        }
    }

    /// Runs local ICP from `r_icp`/`t_icp`, then re-scores the refined pose
    /// against the distance transform (trimmed, if configured) rather than
    /// ICP's own kd-tree based error, since the two are used for different
    /// purposes (ICP wants a cheap correspondence metric; the search wants
    /// a bound comparable to the rest of the bnb error values).
    fn icp(&self, r_icp: &mut MatrixKernel, t_icp: &mut MatrixKernel) -> f64 {
        self.icp3d.run(&self.data, r_icp, t_icp);

        let r00 = r_icp[[0, 0]];
        let r01 = r_icp[[0, 1]];
        let r02 = r_icp[[0, 2]];
        let r10 = r_icp[[1, 0]];
        let r11 = r_icp[[1, 1]];
        let r12 = r_icp[[1, 2]];
        let r20 = r_icp[[2, 0]];
        let r21 = r_icp[[2, 1]];
        let r22 = r_icp[[2, 2]];
        let t0 = t_icp[[0, 0]];
        let t1 = t_icp[[1, 0]];
        let t2 = t_icp[[2, 0]];

        let mut min_dis = vec![0.0f32; self.data.len()];
        let mut error = 0.0f64;
        for (i, p) in self.data.iter().enumerate() {
            let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);
            let tx = r00 * x + r01 * y + r02 * z + t0;
            let ty = r10 * x + r11 * y + r12 * z + t1;
            let tz = r20 * x + r21 * y + r22 * z + t2;

            if !self.do_trim {
                let dis = self.dt.distance(tx, ty, tz) as f64;
                error += dis * dis;
            } else {
                min_dis[i] = self.dt.distance(tx, ty, tz);
            }
        }

        if self.do_trim {
            let hi = min_dis.len() - 1;
            crate::selector::select(&mut min_dis, 0, hi, self.inlier_num - 1);
            for d in &min_dis[..self.inlier_num] {
                error += (*d as f64) * (*d as f64);
            }
        }

        error
    }

    /// Runs the full nested branch-and-bound search and returns the best
    /// transform found.
    pub fn register(&mut self) -> RegistrationOutcome {
        info!(
            "starting registration: {} model points, {} data points, mse_thresh={}",
            self.model.len(),
            self.data.len(),
            self.mse_thresh
        );
        let opt_error = self.outer_bnb();
        RegistrationOutcome {
            opt_r: self.opt_r.clone(),
            opt_t: self.opt_t.clone(),
            opt_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_corners() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ]
    }

    fn test_config() -> RegistrationConfig {
        RegistrationConfig {
            mse_thresh: 1e-3,
            dist_trans_size: 50,
            ..RegistrationConfig::default()
        }
    }

    #[test]
    fn identity_clouds_register_to_identity() {
        let model = cube_corners();
        let data = model.clone();
        let mut goicp = GoIcp::new(model, data, &test_config());
        let outcome = goicp.register();

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((outcome.opt_r[[i, j]] - expected).abs() < 0.05);
            }
            assert!(outcome.opt_t[[i, 0]].abs() < 0.05);
        }
    }

    #[test]
    fn recovers_pure_translation() {
        let model = cube_corners();
        let offset = [0.2, -0.1, 0.05];
        let data: Vec<Point3> = model
            .iter()
            .map(|p| Point3::new(p.x - offset[0] as f32, p.y - offset[1] as f32, p.z - offset[2] as f32))
            .collect();

        let mut goicp = GoIcp::new(model, data, &test_config());
        let outcome = goicp.register();

        assert!((outcome.opt_t[[0, 0]] - offset[0]).abs() < 0.05);
        assert!((outcome.opt_t[[1, 0]] - offset[1]).abs() < 0.05);
        assert!((outcome.opt_t[[2, 0]] - offset[2]).abs() < 0.05);
    }

    #[test]
    fn recovers_quarter_turn_about_z() {
        let model = cube_corners();
        let r = crate::geometry::rodrigues([0.0, 0.0, std::f64::consts::FRAC_PI_2]);
        let data: Vec<Point3> = model
            .iter()
            .map(|p| {
                let (x, y, z) = (p.x as f64, p.y as f64, p.z as f64);
                Point3::new(
                    (r[[0, 0]] * x + r[[0, 1]] * y + r[[0, 2]] * z) as f32,
                    (r[[1, 0]] * x + r[[1, 1]] * y + r[[1, 2]] * z) as f32,
                    (r[[2, 0]] * x + r[[2, 1]] * y + r[[2, 2]] * z) as f32,
                )
            })
            .collect();

        let mut goicp = GoIcp::new(model, data, &test_config());
        let outcome = goicp.register();

        assert!(outcome.opt_error < 0.05);
    }

    #[test]
    fn trimming_recovers_pose_despite_outliers() {
        let model = cube_corners();
        let mut data = model.clone();
        data.push(Point3::new(500.0, 500.0, 500.0));

        let config = RegistrationConfig {
            trim_fraction: 0.2,
            ..test_config()
        };
        let mut goicp = GoIcp::new(model, data, &config);
        let outcome = goicp.register();

        for i in 0..3 {
            assert!(outcome.opt_t[[i, 0]].abs() < 0.05);
        }
    }
}
