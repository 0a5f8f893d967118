//! Additive white Gaussian noise calibrated to a target SNR

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::dsss::modulator::mean_power;
use crate::error::{Result, SimError};

/// Noise standard deviation that puts `signal_power` at `snr_db`
pub fn noise_std(signal_power: f64, snr_db: f64) -> Result<f64> {
    if !signal_power.is_finite() || signal_power <= 0.0 {
        return Err(SimError::NumericDegeneracy(format!(
            "signal power {signal_power} cannot be scaled to an SNR"
        )));
    }
    let noise_power = signal_power / 10f64.powf(snr_db / 10.0);
    if !noise_power.is_finite() {
        return Err(SimError::NumericDegeneracy(format!(
            "noise power for {snr_db} dB SNR is not finite"
        )));
    }
    Ok(noise_power.sqrt())
}

/// Adds noise in place, or does nothing when disabled
#[derive(Clone, Copy, Debug)]
pub struct NoiseInjector {
    pub snr_db: f64,
    pub enabled: bool,
}

impl NoiseInjector {
    pub fn new(snr_db: f64, enabled: bool) -> Self {
        Self { snr_db, enabled }
    }

    pub fn apply<R: Rng + ?Sized>(&self, samples: &mut [f64], rng: &mut R) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let signal_power = mean_power(samples).ok_or_else(|| {
            SimError::NumericDegeneracy("cannot add noise to an empty waveform".to_string())
        })?;
        let std = noise_std(signal_power, self.snr_db)?;
        let normal = Normal::new(0.0, std)
            .map_err(|err| SimError::NumericDegeneracy(format!("noise distribution: {err}")))?;

        debug!(
            "Noise: signal power {:.4}, SNR {} dB, std {:.4}",
            signal_power, self.snr_db, std
        );

        for sample in samples.iter_mut() {
            *sample += normal.sample(rng);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn disabled_injector_passes_through() {
        let mut samples = vec![0.5, -0.5, 0.25];
        let original = samples.clone();
        NoiseInjector::new(-10.0, false)
            .apply(&mut samples, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(samples, original);
    }

    #[test]
    fn noise_power_tracks_snr() {
        let mut rng = StdRng::seed_from_u64(3);
        let clean: Vec<f64> = (0..200_000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let mut noisy = clean.clone();
        NoiseInjector::new(10.0, true).apply(&mut noisy, &mut rng).unwrap();

        let noise_power = noisy
            .iter()
            .zip(&clean)
            .map(|(n, c)| (n - c) * (n - c))
            .sum::<f64>()
            / clean.len() as f64;
        // signal power 1.0 at 10 dB -> noise power 0.1
        assert!((noise_power - 0.1).abs() < 0.005, "noise power = {noise_power}");
    }

    #[test]
    fn zero_power_signal_is_degenerate() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut silent = vec![0.0; 16];
        assert!(matches!(
            NoiseInjector::new(0.0, true).apply(&mut silent, &mut rng),
            Err(SimError::NumericDegeneracy(_))
        ));

        let mut empty: Vec<f64> = Vec::new();
        assert!(matches!(
            NoiseInjector::new(0.0, true).apply(&mut empty, &mut rng),
            Err(SimError::NumericDegeneracy(_))
        ));
    }

    #[test]
    fn noise_std_formula() {
        let std = noise_std(0.25, 0.0).unwrap();
        assert!((std - 0.5).abs() < 1e-12);
        let std = noise_std(1.0, 20.0).unwrap();
        assert!((std - 0.1).abs() < 1e-12);
    }
}
