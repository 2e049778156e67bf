//! A small dense-matrix wrapper in the row-of-rows style, used by the local
//! ICP step to build the cross-covariance matrix and recover its SVD.
//!
//! The storage and indexing are hand-rolled (`Vec<Vec<f64>>`) to keep the call
//! sites reading like the textbook linear algebra they implement, but the
//! actual singular value decomposition is delegated to `nalgebra`, which
//! already implements a numerically stable Golub-Reinsch SVD; reimplementing
//! that by hand would just be a worse copy of what the dependency gives us.

use std::fmt;
use std::ops::{Add, Index, IndexMut, Mul, Sub};

use nalgebra::DMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixKernel {
    data: Vec<Vec<f64>>,
}

impl MatrixKernel {
    pub fn from_rows(data: Vec<Vec<f64>>) -> Self {
        let cols = data.first().map_or(0, |r| r.len());
        debug_assert!(data.iter().all(|r| r.len() == cols), "ragged matrix");
        MatrixKernel { data }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        MatrixKernel {
            data: vec![vec![0.0; cols]; rows],
        }
    }

    pub fn eye(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[[i, i]] = 1.0;
        }
        m
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        MatrixKernel {
            data: vec![vec![1.0; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.data.len()
    }

    pub fn cols(&self) -> usize {
        self.data.first().map_or(0, |r| r.len())
    }

    pub fn transpose(&self) -> MatrixKernel {
        let (r, c) = (self.rows(), self.cols());
        let mut out = MatrixKernel::zeros(c, r);
        for i in 0..r {
            for j in 0..c {
                out[[j, i]] = self[[i, j]];
            }
        }
        out
    }

    /// Singular value decomposition `self = U * diag(s) * V^T`.
    pub fn svd(&self) -> (MatrixKernel, Vec<f64>, MatrixKernel) {
        let (r, c) = (self.rows(), self.cols());
        let flat: Vec<f64> = (0..c)
            .flat_map(|j| (0..r).map(move |i| (i, j)))
            .map(|(i, j)| self[[i, j]])
            .collect();
        let dm = DMatrix::from_column_slice(r, c, &flat);
        let svd = dm.svd(true, true);
        let u = svd.u.expect("svd requested u");
        let v_t = svd.v_t.expect("svd requested v_t");

        let to_kernel = |m: &DMatrix<f64>| {
            let (mr, mc) = m.shape();
            let mut out = MatrixKernel::zeros(mr, mc);
            for i in 0..mr {
                for j in 0..mc {
                    out[[i, j]] = m[(i, j)];
                }
            }
            out
        };

        (to_kernel(&u), svd.singular_values.as_slice().to_vec(), to_kernel(&v_t.transpose()))
    }

    /// Determinant of a square matrix via nalgebra's LU-based computation.
    pub fn det(&self) -> f64 {
        debug_assert_eq!(self.rows(), self.cols(), "determinant requires a square matrix");
        let n = self.rows();
        let flat: Vec<f64> = (0..n)
            .flat_map(|j| (0..n).map(move |i| (i, j)))
            .map(|(i, j)| self[[i, j]])
            .collect();
        DMatrix::from_column_slice(n, n, &flat).determinant()
    }
}

impl Index<[usize; 2]> for MatrixKernel {
    type Output = f64;
    fn index(&self, idx: [usize; 2]) -> &f64 {
        &self.data[idx[0]][idx[1]]
    }
}

impl IndexMut<[usize; 2]> for MatrixKernel {
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut f64 {
        &mut self.data[idx[0]][idx[1]]
    }
}

impl Add for &MatrixKernel {
    type Output = MatrixKernel;
    fn add(self, rhs: &MatrixKernel) -> MatrixKernel {
        debug_assert_eq!((self.rows(), self.cols()), (rhs.rows(), rhs.cols()));
        let mut out = self.clone();
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                out[[i, j]] += rhs[[i, j]];
            }
        }
        out
    }
}

impl Sub for &MatrixKernel {
    type Output = MatrixKernel;
    fn sub(self, rhs: &MatrixKernel) -> MatrixKernel {
        debug_assert_eq!((self.rows(), self.cols()), (rhs.rows(), rhs.cols()));
        let mut out = self.clone();
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                out[[i, j]] -= rhs[[i, j]];
            }
        }
        out
    }
}

impl Mul for &MatrixKernel {
    type Output = MatrixKernel;
    fn mul(self, rhs: &MatrixKernel) -> MatrixKernel {
        debug_assert_eq!(self.cols(), rhs.rows());
        let mut out = MatrixKernel::zeros(self.rows(), rhs.cols());
        for i in 0..self.rows() {
            for k in 0..self.cols() {
                let lik = self[[i, k]];
                if lik == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols() {
                    out[[i, j]] += lik * rhs[[k, j]];
                }
            }
        }
        out
    }
}

impl fmt::Display for MatrixKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self[[i, j]])?;
            }
            if i + 1 < self.rows() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: &MatrixKernel, b: &MatrixKernel, eps: f64) -> bool {
        a.rows() == b.rows()
            && a.cols() == b.cols()
            && (0..a.rows()).all(|i| (0..a.cols()).all(|j| (a[[i, j]] - b[[i, j]]).abs() < eps))
    }

    #[test]
    fn eye_is_multiplicative_identity() {
        let m = MatrixKernel::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let i = MatrixKernel::eye(2);
        let prod = &m * &i;
        assert!(approx_eq(&prod, &m, 1e-12));
    }

    #[test]
    fn transpose_twice_is_identity() {
        let m = MatrixKernel::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert!(approx_eq(&m.transpose().transpose(), &m, 1e-12));
    }

    #[test]
    fn svd_reconstructs_matrix() {
        let m = MatrixKernel::from_rows(vec![
            vec![2.0, 0.0, 0.0],
            vec![0.0, 3.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]);
        let (u, s, v) = m.svd();
        let mut sigma = MatrixKernel::zeros(3, 3);
        for (i, sv) in s.iter().enumerate() {
            sigma[[i, i]] = *sv;
        }
        let reconstructed = &(&u * &sigma) * &v.transpose();
        assert!(approx_eq(&reconstructed, &m, 1e-9));
    }

    #[test]
    fn det_of_identity_is_one() {
        assert!((MatrixKernel::eye(4).det() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ones_fills_every_entry() {
        let m = MatrixKernel::ones(2, 3);
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(m[[i, j]], 1.0);
            }
        }
    }

    #[test]
    fn display_writes_space_separated_rows() {
        let m = MatrixKernel::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(format!("{m}"), "1 2\n3 4");
    }
}
