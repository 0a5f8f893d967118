//! One end-to-end pass over the link: symbols in, bit error rate out

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::dsss::ber::{bit_error_rate, count_bit_errors};
use crate::dsss::codes::{CodeGenerator, SpreadingCodeSet};
use crate::dsss::config::{LinkConfig, LinkGeometry};
use crate::dsss::correlator::{CorrelationDetector, CorrelationTraces};
use crate::dsss::modulator::{SpreadModulator, Waveform};
use crate::dsss::noise::NoiseInjector;
use crate::dsss::symbols::random_symbols;
use crate::error::{Result, SimError};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RunnerState {
    /// Codes and references are ready, no trial since the last SNR change
    Configured,
    TrialComplete { ber: f64 },
}

/// Everything one trial produced
#[derive(Clone, Debug, Serialize)]
pub struct TrialResult {
    pub snr_db: f64,
    pub noise_enabled: bool,
    pub symbols: Vec<u8>,
    pub decoded: Vec<u8>,
    pub bit_errors: usize,
    pub ber: f64,
    /// Transmitted waveform after noise
    pub transmitted: Waveform,
    pub correlation: CorrelationTraces,
}

/// Owns the spreading codes and everything derived from them, and runs
/// trials against a caller-supplied random generator.
///
/// A configuration that fails validation never produces a runner, so there is
/// no runtime "invalid" state to check.
pub struct TrialRunner {
    config: LinkConfig,
    geometry: LinkGeometry,
    codes: SpreadingCodeSet,
    modulator: SpreadModulator,
    references: Vec<Waveform>,
    detector: CorrelationDetector,
    state: RunnerState,
}

impl TrialRunner {
    pub fn new(config: LinkConfig) -> Result<Self> {
        Self::with_generator(config, &CodeGenerator::standard())
    }

    pub fn with_generator(config: LinkConfig, generator: &CodeGenerator) -> Result<Self> {
        let geometry = config.validate()?;
        let codes = generator.generate()?;

        let modulator = SpreadModulator::from_geometry(&geometry);
        let references = modulator.references(&codes);
        let detector =
            CorrelationDetector::new(&geometry, &references, config.correlation_method)?;

        info!(
            "Link ready: {} symbols, {} samples/chip, {} samples per trial, {:?} correlation",
            geometry.symbol_count,
            geometry.samples_per_chip,
            geometry.sample_count,
            config.correlation_method
        );

        Ok(Self {
            config,
            geometry,
            codes,
            modulator,
            references,
            detector,
            state: RunnerState::Configured,
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn geometry(&self) -> &LinkGeometry {
        &self.geometry
    }

    pub fn codes(&self) -> &SpreadingCodeSet {
        &self.codes
    }

    /// Modulated code periods used as correlation templates
    pub fn reference_waveforms(&self) -> &[Waveform] {
        &self.references
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Change the SNR for later trials; codes are kept
    pub fn set_snr(&mut self, snr_db: f64) -> Result<()> {
        if !snr_db.is_finite() {
            return Err(SimError::config(
                "snr_db",
                format!("must be finite, got {snr_db}"),
            ));
        }
        self.config.snr_db = snr_db;
        self.state = RunnerState::Configured;
        Ok(())
    }

    pub fn set_noise_enabled(&mut self, enabled: bool) {
        self.config.enable_noise = enabled;
        self.state = RunnerState::Configured;
    }

    /// Run a trial at the configured SNR
    pub fn run_trial<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TrialResult> {
        let result = self.run_trial_at(self.config.snr_db, rng)?;
        self.state = RunnerState::TrialComplete { ber: result.ber };
        Ok(result)
    }

    /// Run a trial at `snr_db` without touching the runner, so one runner can
    /// serve many threads
    pub fn run_trial_at<R: Rng + ?Sized>(&self, snr_db: f64, rng: &mut R) -> Result<TrialResult> {
        if !snr_db.is_finite() {
            return Err(SimError::config(
                "snr_db",
                format!("must be finite, got {snr_db}"),
            ));
        }

        let symbols = random_symbols(self.geometry.symbol_count, rng);
        let mut transmitted = self.modulator.transmit(&symbols, &self.codes)?;

        NoiseInjector::new(snr_db, self.config.enable_noise)
            .apply(&mut transmitted.samples, rng)?;

        let correlation = self.detector.correlate(&transmitted.samples)?;
        let decoded = self.detector.detect(&correlation)?;
        let bit_errors = count_bit_errors(&symbols, &decoded)?;
        let ber = bit_error_rate(&symbols, &decoded)?;

        debug!(
            "Trial at {} dB: {} bit errors over {} symbols, BER {:.4}",
            snr_db,
            bit_errors,
            symbols.len(),
            ber
        );

        Ok(TrialResult {
            snr_db,
            noise_enabled: self.config.enable_noise,
            symbols,
            decoded,
            bit_errors,
            ber,
            transmitted,
            correlation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsss::config::CorrelationMethod;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noiseless() -> LinkConfig {
        LinkConfig {
            enable_noise: false,
            ..LinkConfig::default()
        }
    }

    #[test]
    fn noiseless_trial_is_lossless() {
        let mut runner = TrialRunner::new(noiseless()).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..5 {
            let result = runner.run_trial(&mut rng).unwrap();
            assert_eq!(result.decoded, result.symbols);
            assert_eq!(result.bit_errors, 0);
            assert_eq!(result.ber, 0.0);
        }
    }

    #[test]
    fn state_follows_trials_and_snr_changes() {
        let mut runner = TrialRunner::new(noiseless()).unwrap();
        assert_eq!(runner.state(), RunnerState::Configured);

        runner.run_trial(&mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(runner.state(), RunnerState::TrialComplete { ber: 0.0 });

        let codes_before = runner.codes().clone();
        runner.set_snr(-5.0).unwrap();
        assert_eq!(runner.state(), RunnerState::Configured);
        assert_eq!(runner.config().snr_db, -5.0);
        assert_eq!(runner.codes(), &codes_before);
    }

    #[test]
    fn invalid_configuration_never_builds_a_runner() {
        let config = LinkConfig {
            sequence_length: 7,
            ..LinkConfig::default()
        };
        assert!(matches!(
            TrialRunner::new(config),
            Err(SimError::InvalidConfiguration { field: "sequence_length", .. })
        ));
    }

    #[test]
    fn non_finite_snr_is_refused() {
        let mut runner = TrialRunner::new(LinkConfig::default()).unwrap();
        assert!(runner.set_snr(f64::NAN).is_err());
        assert!(
            runner
                .run_trial_at(f64::INFINITY, &mut StdRng::seed_from_u64(0))
                .is_err()
        );
    }

    #[test]
    fn trial_shapes_follow_geometry() {
        let runner = TrialRunner::new(LinkConfig::default()).unwrap();
        let result = runner
            .run_trial_at(0.0, &mut StdRng::seed_from_u64(8))
            .unwrap();
        let geometry = runner.geometry();
        assert_eq!(result.symbols.len(), geometry.symbol_count);
        assert_eq!(result.decoded.len(), geometry.symbol_count);
        assert_eq!(result.transmitted.len(), geometry.sample_count);
        assert_eq!(result.correlation.traces.len(), 4);
        for trace in &result.correlation.traces {
            assert_eq!(trace.len(), geometry.chip_count * geometry.samples_per_chip);
        }
        assert!((0.0..=1.0).contains(&result.ber));
        assert_eq!(runner.reference_waveforms().len(), 4);
    }

    #[test]
    fn direct_method_decodes_like_fft() {
        let config = LinkConfig {
            sequence_length: 4,
            correlation_method: CorrelationMethod::Direct,
            ..LinkConfig::default()
        };
        let direct = TrialRunner::new(config.clone()).unwrap();
        let fft = TrialRunner::new(LinkConfig {
            correlation_method: CorrelationMethod::Fft,
            ..config
        })
        .unwrap();

        let a = direct
            .run_trial_at(5.0, &mut StdRng::seed_from_u64(77))
            .unwrap();
        let b = fft
            .run_trial_at(5.0, &mut StdRng::seed_from_u64(77))
            .unwrap();
        assert_eq!(a.symbols, b.symbols);
        assert_eq!(a.transmitted, b.transmitted);
        for (x, y) in a.correlation.traces.iter().zip(&b.correlation.traces) {
            for (p, q) in x.iter().zip(y) {
                assert!((p - q).abs() < 1e-8);
            }
        }
    }
}
