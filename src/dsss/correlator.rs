//! Correlation-based symbol detection
//!
//! Every reference waveform is slid across the received signal ("same" mode:
//! the output has the signal's length and is centred on the full correlation,
//! starting `(reference_len - 1) / 2` samples in). Each trace is then cut into
//! one segment per symbol and the code with the highest peak in a segment wins.

use std::iter::repeat;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::Serialize;

use crate::dsss::config::{CorrelationMethod, LinkGeometry};
use crate::dsss::modulator::Waveform;
use crate::error::{Result, SimError};
use crate::utils::consts::CODE_COUNT;

/// Correlation of the received signal against each reference, with time axis
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CorrelationTraces {
    pub time: Vec<f64>,
    /// One trace per code, indexed by symbol value
    pub traces: Vec<Vec<f64>>,
}

impl CorrelationTraces {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

fn same_offset(reference_len: usize) -> usize {
    reference_len.saturating_sub(1) / 2
}

/// Brute-force "same" mode correlation
pub fn correlate_direct(signal: &[f64], reference: &[f64]) -> Vec<f64> {
    let m = signal.len();
    let n = reference.len();
    if m == 0 || n == 0 {
        return vec![0.0; m];
    }
    let offset = same_offset(n);

    (0..m)
        .map(|i| {
            // full[k] = sum_j signal[j] * reference[j + n - 1 - k]
            let k = i + offset;
            let lo = k.saturating_sub(n - 1);
            let hi = k.min(m - 1);
            (lo..=hi)
                .map(|j| signal[j] * reference[j + n - 1 - k])
                .sum()
        })
        .collect()
}

/// One-off FFT "same" mode correlation
pub fn correlate_fft(signal: &[f64], reference: &[f64]) -> Vec<f64> {
    if signal.is_empty() || reference.is_empty() {
        return vec![0.0; signal.len()];
    }
    let correlator = FftCorrelator::new(signal.len(), &[reference]);
    correlator
        .correlate(signal)
        .map(|mut traces| traces.swap_remove(0))
        .unwrap_or_default()
}

fn pad_signal(signal: &[f64], size: usize) -> Vec<Complex<f64>> {
    let mut padded: Vec<Complex<f64>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .collect();
    padded.extend(repeat(Complex::new(0.0, 0.0)).take(size - signal.len()));
    padded
}

/// Correlator with FFT plans and reference spectra prepared for a fixed
/// signal length
pub struct FftCorrelator {
    signal_len: usize,
    reference_len: usize,
    fft_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    reference_spectra: Vec<Vec<Complex<f64>>>,
}

impl FftCorrelator {
    /// All references must share one non-zero length
    fn new(signal_len: usize, references: &[&[f64]]) -> Self {
        let reference_len = references.first().map_or(0, |r| r.len());
        let fft_len = (signal_len + reference_len)
            .saturating_sub(1)
            .max(1)
            .next_power_of_two();

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let reference_spectra = references
            .iter()
            .map(|reference| {
                let reversed: Vec<f64> = reference
                    .iter()
                    .rev()
                    .copied()
                    .collect();
                let mut spectrum = pad_signal(&reversed, fft_len);
                forward.process(&mut spectrum);
                spectrum
            })
            .collect();

        Self {
            signal_len,
            reference_len,
            fft_len,
            forward,
            inverse,
            reference_spectra,
        }
    }

    fn correlate(&self, signal: &[f64]) -> Result<Vec<Vec<f64>>> {
        if signal.len() != self.signal_len {
            return Err(SimError::LengthMismatch {
                expected: self.signal_len,
                actual: signal.len(),
            });
        }

        let mut signal_spectrum = pad_signal(signal, self.fft_len);
        self.forward.process(&mut signal_spectrum);

        let offset = same_offset(self.reference_len);
        let scale = self.fft_len as f64;

        Ok(self
            .reference_spectra
            .iter()
            .map(|reference_spectrum| {
                let mut product: Vec<Complex<f64>> = signal_spectrum
                    .iter()
                    .zip(reference_spectrum)
                    .map(|(&a, &b)| a * b)
                    .collect();
                self.inverse.process(&mut product);
                product[offset..offset + self.signal_len]
                    .iter()
                    .map(|c| c.re / scale)
                    .collect()
            })
            .collect())
    }
}

enum Engine {
    Fft(FftCorrelator),
    Direct(Vec<Vec<f64>>),
}

/// Detects one symbol per code period by correlating against the four
/// reference waveforms
pub struct CorrelationDetector {
    engine: Engine,
    sample_rate: f64,
    signal_len: usize,
    segment_len: usize,
}

impl CorrelationDetector {
    pub fn new(
        geometry: &LinkGeometry,
        references: &[Waveform],
        method: CorrelationMethod,
    ) -> Result<Self> {
        if references.len() != CODE_COUNT {
            return Err(SimError::LengthMismatch {
                expected: CODE_COUNT,
                actual: references.len(),
            });
        }
        if let Some(bad) = references
            .iter()
            .find(|r| r.len() != geometry.segment_len)
        {
            return Err(SimError::LengthMismatch {
                expected: geometry.segment_len,
                actual: bad.len(),
            });
        }

        let engine = match method {
            CorrelationMethod::Fft => {
                let slices: Vec<&[f64]> = references
                    .iter()
                    .map(|r| r.samples.as_slice())
                    .collect();
                Engine::Fft(FftCorrelator::new(geometry.sample_count, &slices))
            }
            CorrelationMethod::Direct => Engine::Direct(
                references
                    .iter()
                    .map(|r| r.samples.clone())
                    .collect(),
            ),
        };

        Ok(Self {
            engine,
            sample_rate: geometry.sampling_frequency_hz,
            signal_len: geometry.sample_count,
            segment_len: geometry.segment_len,
        })
    }

    pub fn method(&self) -> CorrelationMethod {
        match self.engine {
            Engine::Fft(_) => CorrelationMethod::Fft,
            Engine::Direct(_) => CorrelationMethod::Direct,
        }
    }

    /// Correlate the received samples against every reference
    pub fn correlate(&self, signal: &[f64]) -> Result<CorrelationTraces> {
        if signal.len() != self.signal_len {
            return Err(SimError::LengthMismatch {
                expected: self.signal_len,
                actual: signal.len(),
            });
        }

        let traces = match &self.engine {
            Engine::Fft(correlator) => correlator.correlate(signal)?,
            Engine::Direct(references) => references
                .iter()
                .map(|reference| correlate_direct(signal, reference))
                .collect(),
        };
        let time = (0..signal.len())
            .map(|n| n as f64 / self.sample_rate)
            .collect();

        Ok(CorrelationTraces { time, traces })
    }

    /// Pick the strongest code in every segment
    pub fn detect(&self, correlation: &CorrelationTraces) -> Result<Vec<u8>> {
        if let Some(bad) = correlation
            .traces
            .iter()
            .find(|t| t.len() != self.signal_len)
        {
            return Err(SimError::LengthMismatch {
                expected: self.signal_len,
                actual: bad.len(),
            });
        }
        let maxima: Vec<Vec<f64>> = correlation
            .traces
            .iter()
            .map(|trace| segment_maxima(trace, self.segment_len))
            .collect();
        Ok(pick_symbols(&maxima))
    }
}

/// Maximum of each `segment_len` chunk; a trailing partial chunk is ignored
pub fn segment_maxima(trace: &[f64], segment_len: usize) -> Vec<f64> {
    if segment_len == 0 {
        return Vec::new();
    }
    trace
        .chunks_exact(segment_len)
        .map(|segment| {
            segment
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}

/// Per-segment argmax across codes; ties go to the lowest code index
pub fn pick_symbols(maxima: &[Vec<f64>]) -> Vec<u8> {
    let segments = maxima
        .iter()
        .map(Vec::len)
        .min()
        .unwrap_or(0);
    (0..segments)
        .map(|segment| {
            let mut best = 0usize;
            for code in 1..maxima.len() {
                if maxima[code][segment] > maxima[best][segment] {
                    best = code;
                }
            }
            best as u8
        })
        .collect()
}
