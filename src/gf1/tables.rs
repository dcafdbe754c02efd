//! Volume and pan lookup tables
//!
//! The GF1 stores envelope positions as logarithmic indices; the volume
//! table converts them to linear scalars in 0.0235 dB steps. Panning uses
//! sixteen constant-power positions on a quarter sine/cosine arc, so the
//! combined left/right output power is held at 1.0 for every position.

use std::f64::consts::PI;

use super::constants::{PAN_POSITIONS, VOLUME_POSITIONS, VOLUME_SCALE_DIV};

/// One stereo sample pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoFrame {
    /// Left-side amplitude
    pub left: f32,
    /// Right-side amplitude
    pub right: f32,
}

/// Build the logarithmic-to-linear volume table.
///
/// Index 4095 maps to full scale and each step down divides by
/// [`VOLUME_SCALE_DIV`]; index 0 is forced to silence.
pub fn volume_scalars() -> Box<[f32; VOLUME_POSITIONS]> {
    let mut scalars = Box::new([0.0f32; VOLUME_POSITIONS]);
    let mut out = 1.0f64;
    for i in (1..VOLUME_POSITIONS).rev() {
        scalars[i] = out as f32;
        out /= VOLUME_SCALE_DIV;
    }
    scalars[0] = 0.0;
    scalars
}

/// Build the constant-power pan table.
///
/// Positions normalize to [-1.0, 1.0] (the off-center divisor differs for
/// the left and right halves because 7 is the forward position), then map
/// onto a 0..90-degree arc: left = cos, right = sin.
pub fn pan_scalars() -> [StereoFrame; PAN_POSITIONS] {
    let mut scalars = [StereoFrame::default(); PAN_POSITIONS];
    for (pos, frame) in scalars.iter_mut().enumerate() {
        let norm = (pos as f64 - 7.0) / if pos < 7 { 7.0 } else { 8.0 };
        let angle = (norm + 1.0) * PI / 4.0;
        frame.left = angle.cos() as f32;
        frame.right = angle.sin() as f32;
    }
    scalars
}
