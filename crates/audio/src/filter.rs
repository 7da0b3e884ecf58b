//! IIR filtering primitives.
//!
//! [`lfilter`] follows the usual direct form II transposed recursion
//! `a[0] y[n] = sum b[k] x[n-k] - sum a[k] y[n-k]`, computed in `f64` and
//! stored back as `f32`. Designs are first-order Butterworth prototypes
//! mapped with the bilinear transform and frequency prewarping.

use std::f64::consts::PI;

/// Filter `x` with numerator `b` and denominator `a`.
///
/// Coefficients are normalised by `a[0]`, which must be non-zero. Initial
/// state is zero.
pub fn lfilter(b: &[f64], a: &[f64], x: &[f32]) -> Vec<f32> {
    debug_assert!(!a.is_empty() && a[0] != 0.0, "lfilter: a[0] must be non-zero");
    let order = b.len().max(a.len());
    let norm = a[0];
    let bn: Vec<f64> = (0..order)
        .map(|i| b.get(i).copied().unwrap_or(0.0) / norm)
        .collect();
    let an: Vec<f64> = (0..order)
        .map(|i| a.get(i).copied().unwrap_or(0.0) / norm)
        .collect();

    let mut state = vec![0.0_f64; order];
    let mut y = Vec::with_capacity(x.len());
    for &sample in x {
        let xn = sample as f64;
        let yn = bn[0] * xn + state[0];
        for k in 1..order {
            let next = if k + 1 < order { state[k] } else { 0.0 };
            state[k - 1] = bn[k] * xn - an[k] * yn + next;
        }
        y.push(yn as f32);
    }
    y
}

/// Second-order (or lower) section with normalised coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Apply the section to one channel.
    pub fn apply(&self, x: &[f32]) -> Vec<f32> {
        lfilter(&self.b, &self.a, x)
    }

    /// First-order Butterworth low-pass at `cutoff` Hz.
    ///
    /// Returns `None` when the cutoff is not strictly inside `(0, sr/2)`.
    pub fn butter_lowpass(cutoff: f64, sample_rate: f64) -> Option<Self> {
        let t = prewarp(cutoff, sample_rate)?;
        let k = 1.0 / (1.0 + t);
        Some(Self {
            b: [t * k, t * k, 0.0],
            a: [1.0, (t - 1.0) * k, 0.0],
        })
    }

    /// First-order Butterworth band-pass between `low` and `high` Hz.
    ///
    /// Returns `None` unless `0 < low < high < sr/2`.
    pub fn butter_bandpass(low: f64, high: f64, sample_rate: f64) -> Option<Self> {
        if low >= high {
            return None;
        }
        // analog edges on the unit bilinear scale (K = 1)
        let w1 = prewarp(low, sample_rate)?;
        let w2 = prewarp(high, sample_rate)?;
        let bw = w2 - w1;
        let w0_sq = w1 * w2;
        let a0 = 1.0 + bw + w0_sq;
        Some(Self {
            b: [bw / a0, 0.0, -bw / a0],
            a: [1.0, 2.0 * (w0_sq - 1.0) / a0, (1.0 - bw + w0_sq) / a0],
        })
    }

    /// Second-order allpass with a pole pair at `radius * e^{±j omega}`.
    ///
    /// Magnitude response is exactly 1; only phase is altered.
    pub fn allpass(omega: f64, radius: f64) -> Self {
        let re = radius * omega.cos();
        let mag_sq = radius * radius;
        Self {
            b: [mag_sq, -2.0 * re, 1.0],
            a: [1.0, -2.0 * re, mag_sq],
        }
    }
}

/// `tan(pi f / sr)`: the prewarped analog frequency divided by `2 sr`.
fn prewarp(freq: f64, sample_rate: f64) -> Option<f64> {
    if !(freq > 0.0 && freq < sample_rate / 2.0) {
        return None;
    }
    Some((PI * freq / sample_rate).tan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfilter_fir_difference() {
        let y = lfilter(&[0.5, -0.5], &[1.0], &[1.0, 1.0, 3.0]);
        assert_eq!(y, vec![0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_lfilter_normalises_by_a0() {
        let scaled = lfilter(&[1.0, -1.0], &[2.0, -1.0], &[1.0, 0.0, 0.0, 0.5]);
        let unit = lfilter(&[0.5, -0.5], &[1.0, -0.5], &[1.0, 0.0, 0.0, 0.5]);
        assert_eq!(scaled, unit);
    }

    #[test]
    fn test_lfilter_one_pole() {
        // y[n] = x[n] + 0.5 y[n-1]
        let y = lfilter(&[1.0], &[1.0, -0.5], &[1.0, 0.0, 0.0]);
        assert_eq!(y, vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let lp = Biquad::butter_lowpass(1000.0, 44100.0).unwrap();
        let y = lp.apply(&vec![1.0; 4000]);
        assert!((y[3999] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_lowpass_above_nyquist() {
        assert!(Biquad::butter_lowpass(20000.0, 24000.0).is_none());
    }

    #[test]
    fn test_bandpass_blocks_dc() {
        let bp = Biquad::butter_bandpass(400.0, 900.0, 44100.0).unwrap();
        let y = bp.apply(&vec![1.0; 8000]);
        assert!(y[7999].abs() < 1e-3);
    }

    #[test]
    fn test_allpass_preserves_energy() {
        let ap = Biquad::allpass(2.0 * PI * 300.0 / 24000.0, 0.99);
        let mut x = vec![0.0_f32; 8192];
        x[0] = 1.0;
        let y = ap.apply(&x);
        let energy: f32 = y.iter().map(|v| v * v).sum();
        assert!((energy - 1.0).abs() < 1e-2);
    }
}
