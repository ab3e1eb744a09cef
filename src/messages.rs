// Define message types carried over zenoh

use serde::{Deserialize, Serialize};

// Orientation sample from the sensor -> runtime
// A unit quaternion, scalar part `w` and vector part `(x, y, z)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Orientation {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Orientation {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians about the (not necessarily unit) `axis`.
    pub fn from_axis_angle(axis: [f64; 3], angle: f64) -> Self {
        let norm = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        let (sin, cos) = (angle / 2.0).sin_cos();
        let k = sin / norm;
        Self {
            w: cos,
            x: axis[0] * k,
            y: axis[1] * k,
            z: axis[2] * k,
        }
    }

    /// Hamilton product `self * other`
    pub fn compose(&self, other: &Orientation) -> Orientation {
        Orientation {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }
}

// Enable / indicator change from a control surface -> runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StateChange {
    pub on: bool,
}

/// Session status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SessionHealth {
    Streaming,
    Stopped,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_json() {
        let q: Orientation = serde_json::from_str(r#"{"w":1.0,"x":0.0,"y":0.0,"z":0.0}"#).unwrap();
        assert_eq!(q, Orientation::IDENTITY);
    }

    #[test]
    fn test_health_is_snake_case() {
        let json = serde_json::to_string(&SessionHealth::Streaming).unwrap();
        assert_eq!(json, "\"streaming\"");
    }

    #[test]
    fn test_axis_angle_product() {
        // Two quarter turns about Z compose to a half turn
        let quarter = Orientation::from_axis_angle([0.0, 0.0, 2.0], std::f64::consts::FRAC_PI_2);
        let half = quarter.compose(&quarter);
        assert!(half.w.abs() < 1e-12);
        assert!((half.z - 1.0).abs() < 1e-12);
    }
}
