//! Chip expansion, upsampling and carrier modulation

use std::f64::consts::PI;

use serde::Serialize;

use crate::dsss::codes::SpreadingCodeSet;
use crate::dsss::config::LinkGeometry;
use crate::error::{Result, SimError};

/// Sampled signal with its time axis in seconds
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Waveform {
    pub time: Vec<f64>,
    pub samples: Vec<f64>,
}

impl Waveform {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean squared amplitude, `None` for an empty waveform
    pub fn mean_power(&self) -> Option<f64> {
        mean_power(&self.samples)
    }
}

pub(crate) fn mean_power(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64)
}

/// Replace each symbol with its spreading code
pub fn spread(symbols: &[u8], codes: &SpreadingCodeSet) -> Result<Vec<u8>> {
    let mut chips = Vec::with_capacity(symbols.len() * codes.code_length());
    for &symbol in symbols {
        let code = codes
            .code(symbol)
            .ok_or(SimError::InvalidSymbol(symbol))?;
        chips.extend_from_slice(code);
    }
    Ok(chips)
}

pub struct SpreadModulator {
    sample_rate: f64,
    carrier_freq: f64,
    samples_per_chip: usize,
}

impl SpreadModulator {
    pub fn new(sample_rate: f64, carrier_freq: f64, samples_per_chip: usize) -> Self {
        Self {
            sample_rate,
            carrier_freq,
            samples_per_chip,
        }
    }

    pub fn from_geometry(geometry: &LinkGeometry) -> Self {
        Self::new(
            geometry.sampling_frequency_hz,
            geometry.carrier_frequency_hz,
            geometry.samples_per_chip,
        )
    }

    pub fn samples_per_chip(&self) -> usize {
        self.samples_per_chip
    }

    /// Upsample chips and put them on the carrier.
    ///
    /// Chip value b shifts the carrier phase by `pi * b`; the output sample is
    /// the mean of the sine and cosine of that phase.
    pub fn modulate(&self, chips: &[u8]) -> Waveform {
        let len = chips.len() * self.samples_per_chip;
        let step = 1.0 / self.sample_rate;
        let omega = 2.0 * PI * self.carrier_freq;

        let mut time = Vec::with_capacity(len);
        let mut samples = Vec::with_capacity(len);
        for (chip_idx, &chip) in chips.iter().enumerate() {
            let phase_offset = PI * chip as f64;
            for sample_idx in 0..self.samples_per_chip {
                let t = (chip_idx * self.samples_per_chip + sample_idx) as f64 * step;
                let phase = omega * t + phase_offset;
                time.push(t);
                samples.push((phase.sin() + phase.cos()) / 2.0);
            }
        }

        Waveform { time, samples }
    }

    /// Spread and modulate a symbol sequence
    pub fn transmit(&self, symbols: &[u8], codes: &SpreadingCodeSet) -> Result<Waveform> {
        let chips = spread(symbols, codes)?;
        Ok(self.modulate(&chips))
    }

    /// One modulated code period per code, used as correlation templates
    pub fn references(&self, codes: &SpreadingCodeSet) -> Vec<Waveform> {
        codes
            .iter()
            .map(|code| self.modulate(code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsss::codes::CodeGenerator;
    use crate::utils::consts::CODE_LENGTH;

    fn modulator() -> SpreadModulator {
        SpreadModulator::new(6000.0, 100.0, 60)
    }

    #[test]
    fn spread_concatenates_codes_in_symbol_order() {
        let codes = CodeGenerator::standard().generate().unwrap();
        let chips = spread(&[2, 0, 3], &codes).unwrap();
        assert_eq!(chips.len(), 3 * CODE_LENGTH);
        assert_eq!(&chips[..CODE_LENGTH], &codes.codes()[2][..]);
        assert_eq!(&chips[CODE_LENGTH..2 * CODE_LENGTH], &codes.codes()[0][..]);
        assert_eq!(&chips[2 * CODE_LENGTH..], &codes.codes()[3][..]);
    }

    #[test]
    fn spread_rejects_unknown_symbol() {
        let codes = CodeGenerator::standard().generate().unwrap();
        assert_eq!(spread(&[1, 4], &codes), Err(SimError::InvalidSymbol(4)));
    }

    #[test]
    fn modulation_matches_phase_formula() {
        let waveform = modulator().modulate(&[0, 1]);
        assert_eq!(waveform.len(), 120);
        assert_eq!(waveform.time.len(), 120);
        assert_eq!(waveform.time[0], 0.0);
        // sin(0) + cos(0) over two
        assert!((waveform.samples[0] - 0.5).abs() < 1e-12);
        // second chip starts at t = 60 / 6000 with a pi phase offset
        let t = 60.0 * (1.0 / 6000.0);
        let phase = 2.0 * PI * 100.0 * t + PI;
        let expected = (phase.sin() + phase.cos()) / 2.0;
        assert!((waveform.time[60] - t).abs() < 1e-15);
        assert!((waveform.samples[60] - expected).abs() < 1e-12);
    }

    #[test]
    fn opposite_chips_are_antipodal() {
        let m = modulator();
        let zero = m.modulate(&[0]);
        let one = m.modulate(&[1]);
        for (a, b) in zero.samples.iter().zip(&one.samples) {
            assert!((a + b).abs() < 1e-12);
        }
    }

    #[test]
    fn references_cover_one_code_period() {
        let codes = CodeGenerator::standard().generate().unwrap();
        let refs = modulator().references(&codes);
        assert_eq!(refs.len(), 4);
        for reference in &refs {
            assert_eq!(reference.len(), CODE_LENGTH * 60);
            assert_eq!(reference.time[0], 0.0);
        }
    }

    #[test]
    fn mean_power_of_modulated_carrier() {
        // (sin + cos) / 2 has mean power 1/4 over whole carrier periods
        let waveform = modulator().modulate(&[0; CODE_LENGTH]);
        let power = waveform.mean_power().unwrap();
        assert!((power - 0.25).abs() < 1e-9, "power = {power}");
        assert_eq!(Waveform::default().mean_power(), None);
    }
}
