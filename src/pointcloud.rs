//! Point cloud file I/O.
//!
//! Files are plain ASCII: a point count on the first line, followed by that
//! many whitespace-delimited `x y z` triples (one per line or not, whitespace
//! is not otherwise significant).

use std::fs;
use std::path::Path;

use crate::error::{GoIcpError, Result};
use crate::geometry::point::Point3;

pub fn load(path: impl AsRef<Path>) -> Result<Vec<Point3>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| GoIcpError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tokens = text.split_whitespace();
    let n: usize = tokens
        .next()
        .ok_or_else(|| GoIcpError::PointCloudParse {
            path: path.to_path_buf(),
            offset: 0,
            reason: "empty file, expected a point count".into(),
        })?
        .parse()
        .map_err(|_| GoIcpError::PointCloudParse {
            path: path.to_path_buf(),
            offset: 0,
            reason: "first token is not a valid point count".into(),
        })?;

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let mut next_coord = || {
            tokens
                .next()
                .ok_or_else(|| GoIcpError::PointCloudParse {
                    path: path.to_path_buf(),
                    offset: i,
                    reason: format!("truncated file: expected {n} points, ran out at point {i}"),
                })
                .and_then(|t| {
                    t.parse::<f32>().map_err(|_| GoIcpError::PointCloudParse {
                        path: path.to_path_buf(),
                        offset: i,
                        reason: format!("'{t}' is not a valid coordinate"),
                    })
                })
        };
        let x = next_coord()?;
        let y = next_coord()?;
        let z = next_coord()?;
        points.push(Point3::new(x, y, z));
    }

    Ok(points)
}

/// Writes a point cloud back out in the same `N` then `x y z` triples format.
pub fn save(path: impl AsRef<Path>, points: &[Point3]) -> Result<()> {
    let path = path.as_ref();
    let mut out = String::with_capacity(points.len() * 24 + 8);
    out.push_str(&points.len().to_string());
    out.push('\n');
    for p in points {
        out.push_str(&format!("{} {} {}\n", p.x, p.y, p.z));
    }
    fs::write(path, out).map_err(|source| GoIcpError::Io {
        path: path.to_path_buf(),
        source,
    })
}
