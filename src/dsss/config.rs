use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SimError};
use crate::utils::consts::*;

/// How the detector computes the sliding correlation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Zero-padded FFT product
    #[default]
    Fft,
    /// Brute-force sum of products
    Direct,
}

/// Scalar parameters of one simulated link
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub sampling_frequency_khz: f64,
    /// Message length in bits, must be even
    pub sequence_length: usize,
    /// Chips per second
    pub baud_rate: u32,
    pub carrier_frequency_khz: f64,
    pub snr_db: f64,
    pub enable_noise: bool,
    #[serde(default)]
    pub correlation_method: CorrelationMethod,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            sampling_frequency_khz: DEFAULT_SAMPLING_FREQUENCY_KHZ,
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            baud_rate: DEFAULT_BAUD_RATE,
            carrier_frequency_khz: DEFAULT_CARRIER_FREQUENCY_KHZ,
            snr_db: DEFAULT_SNR_DB,
            enable_noise: true,
            correlation_method: CorrelationMethod::Fft,
        }
    }
}

/// Sizes derived from a validated [`LinkConfig`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkGeometry {
    pub sampling_frequency_hz: f64,
    pub carrier_frequency_hz: f64,
    pub samples_per_chip: usize,
    pub symbol_count: usize,
    /// Chips in the spread message
    pub chip_count: usize,
    /// Samples in the transmitted waveform and in every correlation trace
    pub sample_count: usize,
    /// Samples per code period, one detection segment per symbol
    pub segment_len: usize,
}

impl LinkConfig {
    pub fn sampling_frequency_hz(&self) -> f64 {
        self.sampling_frequency_khz * 1000.0
    }

    pub fn carrier_frequency_hz(&self) -> f64 {
        self.carrier_frequency_khz * 1000.0
    }

    /// Check every invariant and compute buffer sizes.
    ///
    /// Nothing is allocated here, so a bad configuration is rejected before
    /// any symbol is drawn or any waveform is built.
    pub fn validate(&self) -> Result<LinkGeometry> {
        if !self.sampling_frequency_khz.is_finite() || self.sampling_frequency_khz <= 0.0 {
            return Err(SimError::config(
                "sampling_frequency_khz",
                format!("must be a positive number, got {}", self.sampling_frequency_khz),
            ));
        }
        if !self.carrier_frequency_khz.is_finite() || self.carrier_frequency_khz <= 0.0 {
            return Err(SimError::config(
                "carrier_frequency_khz",
                format!("must be a positive number, got {}", self.carrier_frequency_khz),
            ));
        }
        if self.baud_rate == 0 {
            return Err(SimError::config("baud_rate", "must be greater than zero"));
        }
        if self.sequence_length < 2 {
            return Err(SimError::config(
                "sequence_length",
                format!("must be at least 2 bits, got {}", self.sequence_length),
            ));
        }
        if self.sequence_length % 2 != 0 {
            return Err(SimError::config(
                "sequence_length",
                format!("must be even (two bits per symbol), got {}", self.sequence_length),
            ));
        }
        if !self.snr_db.is_finite() {
            return Err(SimError::config(
                "snr_db",
                format!("must be finite, got {}", self.snr_db),
            ));
        }

        let sampling_frequency_hz = self.sampling_frequency_hz();
        let carrier_frequency_hz = self.carrier_frequency_hz();

        let ratio = sampling_frequency_hz / self.baud_rate as f64;
        let rounded = ratio.round();
        if rounded < 1.0 {
            return Err(SimError::config(
                "baud_rate",
                format!(
                    "{} chips/s exceeds the sampling frequency of {} Hz",
                    self.baud_rate, sampling_frequency_hz
                ),
            ));
        }
        if (ratio - rounded).abs() > SAMPLES_PER_CHIP_TOLERANCE * rounded {
            return Err(SimError::config(
                "sampling_frequency_khz",
                format!(
                    "{} Hz / {} chips/s = {} is not an integer number of samples per chip",
                    sampling_frequency_hz, self.baud_rate, ratio
                ),
            ));
        }
        let samples_per_chip = rounded as usize;

        let symbol_count = self.sequence_length / 2;
        let chip_count = symbol_count
            .checked_mul(CODE_LENGTH)
            .ok_or_else(|| SimError::config("sequence_length", "chip count overflows"))?;
        if chip_count % CODE_LENGTH != 0 {
            return Err(SimError::config(
                "sequence_length",
                format!("{chip_count} chips is not a multiple of the code length {CODE_LENGTH}"),
            ));
        }

        let segment_len = CODE_LENGTH * samples_per_chip;
        let sample_count = chip_count
            .checked_mul(samples_per_chip)
            .ok_or_else(|| SimError::config("sequence_length", "sample count overflows"))?;
        if sample_count % segment_len != 0 {
            return Err(SimError::config(
                "sequence_length",
                format!("{sample_count} samples do not split into segments of {segment_len}"),
            ));
        }

        if carrier_frequency_hz >= sampling_frequency_hz / 2.0 {
            warn!(
                "Carrier {} Hz is at or above Nyquist ({} Hz); the waveform will alias",
                carrier_frequency_hz,
                sampling_frequency_hz / 2.0
            );
        }

        Ok(LinkGeometry {
            sampling_frequency_hz,
            carrier_frequency_hz,
            samples_per_chip,
            symbol_count,
            chip_count,
            sample_count,
            segment_len,
        })
    }
}
