// Swing-twist decomposition
//
// Splits an orientation into a rotation about the commutator axis (twist)
// and the remaining tilt of that axis (swing). Only the twist angle is kept.

use std::f64::consts::{PI, TAU};

use crate::config::ConfigError;
use crate::messages::Orientation;

/// Axis of the commutator, expressed in the sensor frame.
///
/// Any non-zero length is accepted; the projection divides by `|axis|²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAxis {
    x: f64,
    y: f64,
    z: f64,
    norm_squared: f64,
}

impl RotationAxis {
    pub const UNIT_Z: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
        norm_squared: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, ConfigError> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(ConfigError::NonFiniteAxis([x, y, z]));
        }
        let norm_squared = x * x + y * y + z * z;
        if norm_squared == 0.0 {
            return Err(ConfigError::ZeroAxis);
        }
        Ok(Self {
            x,
            y,
            z,
            norm_squared,
        })
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Same axis, pointing the other way
    pub fn reversed(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            norm_squared: self.norm_squared,
        }
    }

    fn dot(&self, x: f64, y: f64, z: f64) -> f64 {
        self.x * x + self.y * y + self.z * z
    }
}

impl Default for RotationAxis {
    fn default() -> Self {
        Self::UNIT_Z
    }
}

/// Angle of rotation of `orientation` about `axis`, in `(-π, π]`.
///
/// Returns `NaN` when the twist is undefined, i.e. the orientation is a half
/// turn about an axis perpendicular to `axis` (or the sample is not finite).
/// Callers treat that as a degenerate sample.
pub fn extract_twist(orientation: &Orientation, axis: &RotationAxis) -> f64 {
    let dot = axis.dot(orientation.x, orientation.y, orientation.z);
    let scale = dot / axis.norm_squared;

    // Twist quaternion: projection of the vector part onto the axis, same scalar part
    let (px, py, pz) = (axis.x * scale, axis.y * scale, axis.z * scale);
    let norm = (orientation.w * orientation.w + px * px + py * py + pz * pz).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return f64::NAN;
    }

    // q and -q are the same rotation; pick the one whose twist agrees with the axis direction
    let mut w = orientation.w / norm;
    if dot < 0.0 {
        w = -w;
    }

    let angle = 2.0 * w.clamp(-1.0, 1.0).acos();
    // acos gives [0, π], so angle is in [0, 2π]; fold it into (-π, π]
    if angle > PI { angle - TAU } else { angle }
}
