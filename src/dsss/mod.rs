/// Quaternary direct-sequence spread-spectrum link
pub mod ber;
pub mod codes;
pub mod config;
pub mod correlator;
pub mod modulator;
pub mod noise;
pub mod symbols;
pub mod trial;

pub use codes::{CodeGenerator, SpreadingCodeSet};
pub use config::{CorrelationMethod, LinkConfig, LinkGeometry};
pub use correlator::{CorrelationDetector, CorrelationTraces};
pub use modulator::{SpreadModulator, Waveform};
pub use noise::NoiseInjector;
pub use trial::{RunnerState, TrialResult, TrialRunner};
