pub(crate) const EPS: f64 = 1e-6;

/// Max value for a signed 16-bit integer, used as the Go-ICP "unreachable" sentinel
/// in both the distance transform's integer component fields and its rescaled
/// Euclidean distance.
pub(crate) const INFTY: f32 = 32767.0;

pub(crate) const PI: f64 = std::f64::consts::PI;
pub(crate) const SQRT3: f64 = 1.732_050_808;
