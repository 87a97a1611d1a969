//! Welch power spectral density estimation.
//!
//! Parameters are pinned to the usual estimator defaults: periodic Hann
//! window, 50% overlap, `nfft == nperseg`, per-segment mean removal,
//! one-sided density scaling and a plain mean over full segments.

use realfft::RealFftPlanner;
use realfft::num_complex::Complex;
use tracing::warn;

use crate::error::Result;
use crate::types::PsdCurve;

/// Two seconds worth of samples, giving 0.5 Hz bins at any sampling rate.
pub fn segment_length(freq: f64) -> usize {
    ((freq * 2.0).round() as usize).max(1)
}

/// Periodic Hann window of length `n`.
pub fn hann(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| {
            let n_f = i as f64;
            0.5 - 0.5 * ((2.0 * std::f64::consts::PI * n_f) / n as f64).cos()
        })
        .collect()
}

/// Welch estimator; keeps its FFT planner so plans are reused across files.
pub struct Welch {
    planner: RealFftPlanner<f64>,
}

impl Default for Welch {
    fn default() -> Self {
        Welch::new()
    }
}

impl Welch {
    pub fn new() -> Welch {
        Welch {
            planner: RealFftPlanner::new(),
        }
    }

    /// PSD of `signal` sampled at `fs` Hz using segments of `nperseg` samples.
    pub fn estimate(&mut self, signal: &[f64], fs: f64, nperseg: usize) -> Result<PsdCurve> {
        if signal.is_empty() {
            return Ok(PsdCurve {
                frequencies: Vec::new(),
                power: Vec::new(),
            });
        }

        let mut nperseg = nperseg.max(1);
        if nperseg > signal.len() {
            warn!(
                "segment length {} exceeds signal length {}, using {}",
                nperseg,
                signal.len(),
                signal.len()
            );
            nperseg = signal.len();
        }
        let noverlap = nperseg / 2;
        let hop = nperseg - noverlap;
        let segments = (signal.len() - noverlap) / hop;

        let r2c = self.planner.plan_fft_forward(nperseg);
        let mut input: Vec<f64> = r2c.make_input_vec();
        let mut spectrum: Vec<Complex<f64>> = r2c.make_output_vec();
        let mut scratch = r2c.make_scratch_vec();

        let window = hann(nperseg);
        let scale = 1.0 / (fs * window.iter().map(|w| w * w).sum::<f64>());

        let num_bins = spectrum.len(); // == nperseg/2 + 1
        let mut power = vec![0.0f64; num_bins];

        for segment in signal.windows(nperseg).step_by(hop).take(segments) {
            // constant detrend, then window
            let mean = segment.iter().sum::<f64>() / nperseg as f64;
            for i in 0..nperseg {
                input[i] = (segment[i] - mean) * window[i];
            }

            r2c.process_with_scratch(&mut input, &mut spectrum, &mut scratch)?;

            for (acc, c) in power.iter_mut().zip(spectrum.iter()) {
                *acc += (c.re * c.re + c.im * c.im) * scale;
            }
        }

        // fold the negative frequencies in; DC and Nyquist have no mirror
        let mirrored_end = if nperseg % 2 == 0 {
            num_bins - 1
        } else {
            num_bins
        };
        for p in power.iter_mut().take(mirrored_end).skip(1) {
            *p *= 2.0;
        }

        let segments = segments as f64;
        for p in power.iter_mut() {
            *p /= segments;
        }

        let frequencies = (0..num_bins)
            .map(|k| k as f64 * fs / nperseg as f64)
            .collect();

        Ok(PsdCurve { frequencies, power })
    }
}
