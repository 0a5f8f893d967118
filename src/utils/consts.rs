/// Log level (overridable with RUST_LOG)
pub const LOG_LEVEL: &str = "info";

// ============================================================================
// Link defaults
// ============================================================================

/// Sampling frequency (kHz)
pub const DEFAULT_SAMPLING_FREQUENCY_KHZ: f64 = 6.0;

/// Message length in bits, two bits per quaternary symbol
pub const DEFAULT_SEQUENCE_LENGTH: usize = 16;

/// Chip rate (chips per second)
pub const DEFAULT_BAUD_RATE: u32 = 100;

/// Carrier frequency (kHz)
pub const DEFAULT_CARRIER_FREQUENCY_KHZ: f64 = 0.1;

/// Target SNR (dB)
pub const DEFAULT_SNR_DB: f64 = 10.0;

// ============================================================================
// Spreading codes
// ============================================================================

/// LFSR register width
pub const LFSR_DEGREE: usize = 5;

/// Chips per spreading code (2^5 - 1)
pub const CODE_LENGTH: usize = (1 << LFSR_DEGREE) - 1;

/// Number of codes, one per quaternary symbol value
pub const CODE_COUNT: usize = 4;

/// Feedback taps of the base sequence, x^5 + x^3 + 1
pub const BASE_TAPS: [usize; 2] = [5, 3];

/// Feedback taps of the shifted sequence, x^5 + x^4 + x^3 + x^2 + 1
pub const SHIFTED_TAPS: [usize; 4] = [5, 4, 3, 2];

// ============================================================================
// Sweep defaults
// ============================================================================

pub const DEFAULT_SWEEP_FROM_DB: f64 = -30.0;
pub const DEFAULT_SWEEP_TO_DB: f64 = 10.0;
pub const DEFAULT_SWEEP_STEP_DB: f64 = 2.0;
pub const DEFAULT_REPEAT_COUNT: usize = 100;

/// Base seed when none is given on the command line
pub const DEFAULT_SEED: u64 = 0x5eed_0f_90_1d;

/// Ratio tolerance when checking that fs / baud is an integer
pub const SAMPLES_PER_CHIP_TOLERANCE: f64 = 1e-6;
