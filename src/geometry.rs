pub mod matrix;
pub mod point;

pub use matrix::MatrixKernel;
pub use point::Point3;

/// Converts an axis-angle rotation vector (Rodrigues vector, magnitude in
/// radians) into a 3x3 rotation matrix.
pub fn rodrigues(r: [f64; 3]) -> MatrixKernel {
    let theta = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
    if theta < crate::utils::EPS {
        return MatrixKernel::eye(3);
    }

    let (x, y, z) = (r[0] / theta, r[1] / theta, r[2] / theta);
    let (c, s) = (theta.cos(), theta.sin());
    let t = 1.0 - c;

    MatrixKernel::from_rows(vec![
        vec![t * x * x + c, t * x * y - s * z, t * x * z + s * y],
        vec![t * x * y + s * z, t * y * y + c, t * y * z - s * x],
        vec![t * x * z - s * y, t * y * z + s * x, t * z * z + c],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rotation_is_identity() {
        let r = rodrigues([0.0, 0.0, 0.0]);
        assert_eq!(r, MatrixKernel::eye(3));
    }

    #[test]
    fn rotation_is_orthogonal() {
        let r = rodrigues([0.3, -0.8, 1.1]);
        let rt = r.transpose();
        let prod = &r * &rt;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((prod[[i, j]] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn quarter_turn_about_z_maps_x_to_y() {
        let r = rodrigues([0.0, 0.0, std::f64::consts::FRAC_PI_2]);
        // R * [1,0,0]^T should be approximately [0,1,0]^T
        assert!((r[[0, 0]]).abs() < 1e-9);
        assert!((r[[1, 0]] - 1.0).abs() < 1e-9);
    }
}
