//! Pure mapping from sampled input to tilt/glare values, plus the textual
//! presentation descriptors written to the target.

use crate::constants::*;
use crate::settings::{Axis, TiltSettings};
use glam::DVec2;
use serde::Serialize;
use std::fmt;

/// Bounding box of the target in the same coordinate space as pointer samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl Geometry {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            left,
            top,
        }
    }

    #[inline]
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.left, self.top)
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        self.origin() + self.size() * 0.5
    }

    /// Position relative to the box in \[0, 1\] per axis. A degenerate axis
    /// (zero or negative extent) maps to the neutral 0.5.
    pub fn normalize(&self, point: DVec2) -> DVec2 {
        let rel = point - self.origin();
        let axis = |offset: f64, extent: f64| {
            if extent > 0.0 && offset.is_finite() {
                (offset / extent).clamp(0.0, 1.0)
            } else {
                0.5
            }
        };
        DVec2::new(axis(rel.x, self.width), axis(rel.y, self.height))
    }
}

/// Output of one value computation; also the payload of change notifications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TiltValues {
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub percentage_x: f64,
    pub percentage_y: f64,
    pub angle: f64,
}

impl TiltValues {
    /// Glare opacity for these values under a given ceiling.
    #[inline]
    pub fn glare_opacity(&self, max_glare: f64) -> f64 {
        self.percentage_y * max_glare / 100.0
    }
}

/// Computes tilt and glare values for a pointer sample against a geometry snapshot.
pub fn compute(pointer: DVec2, geometry: &Geometry, settings: &TiltSettings) -> TiltValues {
    let n = geometry.normalize(pointer);
    let max = settings.max;
    let sign = settings.reverse_sign();

    let tilt_x = round2(sign * (max / 2.0 - n.x * max));
    let tilt_y = round2(sign * (n.y * max - max / 2.0));

    TiltValues {
        tilt_x,
        tilt_y,
        percentage_x: n.x * 100.0,
        percentage_y: n.y * 100.0,
        angle: sweep_angle(pointer, geometry),
    }
}

/// Glare sweep angle in degrees, measured from the target center to the
/// pointer with 0 pointing up. Exactly at the center the angle is 0.
pub fn sweep_angle(pointer: DVec2, geometry: &Geometry) -> f64 {
    let d = pointer - geometry.center();
    if (d.x == 0.0 && d.y == 0.0) || !d.is_finite() {
        return 0.0;
    }
    d.x.atan2(-d.y).to_degrees()
}

/// Rounds to two decimals and folds `-0.0` into `0.0`.
#[inline]
pub fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

#[inline]
pub fn map_range(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Wrap applied to raw orientation angles: anything below -90 becomes +90.
/// Values above 90 pass through untouched and are clamped later by normalization.
#[inline]
pub fn wrap_gyro(angle: f64) -> f64 {
    if angle < GYRO_RANGE_MIN {
        GYRO_RANGE_MAX
    } else {
        angle
    }
}

/// Maps (already wrapped) gamma/beta onto the target's pixel space.
pub fn gyro_to_pointer(gamma: f64, beta: f64, geometry: &Geometry) -> DVec2 {
    DVec2::new(
        map_range(gamma, GYRO_RANGE_MIN, GYRO_RANGE_MAX, 0.0, geometry.width) + geometry.left,
        map_range(beta, GYRO_RANGE_MIN, GYRO_RANGE_MAX, 0.0, geometry.height) + geometry.top,
    )
}

/// 3D transform written to the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub perspective: f64,
    pub rotate_x: f64,
    pub rotate_y: f64,
    pub scale: f64,
}

impl Transform {
    pub fn from_values(values: &TiltValues, settings: &TiltSettings) -> Self {
        Self {
            perspective: settings.perspective,
            rotate_x: if settings.axis == Axis::X {
                0.0
            } else {
                values.tilt_y
            },
            rotate_y: if settings.axis == Axis::Y {
                0.0
            } else {
                values.tilt_x
            },
            scale: settings.scale,
        }
    }

    pub fn neutral(settings: &TiltSettings) -> Self {
        Self {
            perspective: settings.perspective,
            rotate_x: 0.0,
            rotate_y: 0.0,
            scale: 1.0,
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "perspective({}px) rotateX({}deg) rotateY({}deg) scale3d({s}, {s}, {s})",
            self.perspective,
            self.rotate_x,
            self.rotate_y,
            s = self.scale
        )
    }
}

/// Rotation and opacity written to the glare inner layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlareState {
    pub rotation: f64,
    pub opacity: f64,
}

impl GlareState {
    pub const NEUTRAL: GlareState = GlareState {
        rotation: NEUTRAL_GLARE_ROTATION_DEG,
        opacity: NEUTRAL_GLARE_OPACITY,
    };

    pub fn from_values(values: &TiltValues, settings: &TiltSettings) -> Self {
        Self {
            rotation: values.angle,
            opacity: values.glare_opacity(settings.max_glare),
        }
    }

    pub fn transform_css(&self) -> String {
        format!("rotate({}deg) translate(-50%, -50%)", self.rotation)
    }
}

/// Duration/easing pair. `property` limits it to one CSS property (glare uses opacity).
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub property: Option<&'static str>,
    pub duration_ms: u32,
    pub easing: String,
}

impl Transition {
    pub fn for_target(settings: &TiltSettings) -> Self {
        Self {
            property: None,
            duration_ms: settings.speed_ms,
            easing: settings.easing.clone(),
        }
    }

    pub fn for_glare(settings: &TiltSettings) -> Self {
        Self {
            property: Some("opacity"),
            ..Self::for_target(settings)
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(property) = self.property {
            write!(f, "{property} ")?;
        }
        write!(f, "{}ms {}", self.duration_ms, self.easing)
    }
}
