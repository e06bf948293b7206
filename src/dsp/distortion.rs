//! Distortion / Waveshaping
//!
//! Distortion adds harmonics by reshaping the waveform. The "drive" parameter
//! controls how aggressively the signal is pushed into the nonlinear region.
//!
//! # How Waveshaping Works
//!
//! A waveshaper applies a transfer function to each sample:
//!   output = f(input * drive)
//!
//! # Transfer Functions
//!
//! Soft Clip:
//!   f(x) = x / (1 + |x|)
//!   - Smooth saturation, output never reaches ±1
//!
//! Hard Clip:
//!   f(x) = clamp(x, -threshold, threshold)
//!   - Buzzy, rich in odd harmonics
//!
//! Foldback:
//!   Past the threshold the signal reflects back toward zero, as many times
//!   as it takes to land inside [-threshold, threshold].
//!   - Complex, metallic harmonics
//!
//! # Drive Values
//!
//!   1.0  = Clean
//!   2-4  = Warm saturation
//!   5-10 = Obvious distortion

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaperKind {
    #[default]
    Soft,
    Hard,
    Foldback,
}

#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

#[inline]
pub fn hard_clip(sample: f32, drive: f32, threshold: f32) -> f32 {
    let x = sample * drive;
    x.clamp(-threshold, threshold)
}

/// Foldback as a triangle wave of period 4·threshold, so the cost is constant
/// however hard the input is driven.
#[inline]
pub fn foldback(sample: f32, drive: f32, threshold: f32) -> f32 {
    if threshold <= 0.0 {
        return 0.0;
    }
    let x = sample * drive;
    let folded = (x - threshold).rem_euclid(4.0 * threshold);
    (folded - 2.0 * threshold).abs() - threshold
}

#[inline]
pub fn shape(kind: ShaperKind, sample: f32, drive: f32, threshold: f32) -> f32 {
    match kind {
        ShaperKind::Soft => soft_clip(sample, drive),
        ShaperKind::Hard => hard_clip(sample, drive, threshold),
        ShaperKind::Foldback => foldback(sample, drive, threshold),
    }
}

/// Shape a buffer in place, then scale by `output_gain`.
pub fn shape_buffer(
    buffer: &mut [f32],
    kind: ShaperKind,
    drive: f32,
    threshold: f32,
    output_gain: f32,
) {
    for sample in buffer.iter_mut() {
        *sample = shape(kind, *sample, drive, threshold) * output_gain;
    }
}
