use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::dsss::config::LinkConfig;
use crate::dsss::correlator::CorrelationTraces;
use crate::dsss::trial::TrialResult;
use crate::sweep::{SweepParams, SweepReport};

/// What a single-trial plot needs
#[derive(Serialize)]
pub struct TrialDump<'a> {
    pub config: &'a LinkConfig,
    pub seed: u64,
    pub symbols: &'a [u8],
    pub decoded: &'a [u8],
    pub bit_errors: usize,
    pub ber: f64,
    pub correlation: &'a CorrelationTraces,
}

impl<'a> TrialDump<'a> {
    pub fn new(config: &'a LinkConfig, seed: u64, result: &'a TrialResult) -> Self {
        Self {
            config,
            seed,
            symbols: &result.symbols,
            decoded: &result.decoded,
            bit_errors: result.bit_errors,
            ber: result.ber,
            correlation: &result.correlation,
        }
    }
}

/// The (snr, ber) series with the parameters that produced it
#[derive(Serialize)]
pub struct SweepDump<'a> {
    pub config: &'a LinkConfig,
    pub params: &'a SweepParams,
    pub seed: u64,
    pub report: &'a SweepReport,
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("{err}")))?;
    writer.flush()
}

/// 16-bit mono WAV, samples clipped to [-1, 1]
pub fn write_to_wav(signal: &[f64], sample_rate: u32, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("{err}")))?;
    let amplitude = i16::MAX as f64;
    for &sample in signal {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * amplitude) as i16)
            .map_err(|err| {
                io::Error::new(io::ErrorKind::Other, format!("{err}"))
            })?;
    }
    writer
        .finalize()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("{err}")))?;
    Ok(())
}
