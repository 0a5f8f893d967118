//! Spreading code generation from a pair of maximal-length LFSR sequences

use tracing::debug;

use crate::error::{Result, SimError};
use crate::utils::consts::{BASE_TAPS, CODE_COUNT, CODE_LENGTH, LFSR_DEGREE, SHIFTED_TAPS};

/// One spreading code, chips are 0 or 1
pub type Code = [u8; CODE_LENGTH];

/// Fibonacci linear-feedback shift register.
///
/// Each step emits the last cell, XORs the tapped cells (1-indexed) into a
/// feedback bit, rotates the register one cell towards the end and stores the
/// feedback in cell 0.
#[derive(Clone, Debug)]
pub struct Lfsr {
    state: Vec<u8>,
    taps: Vec<usize>,
}

impl Lfsr {
    pub fn new(initial_state: &[u8], taps: &[usize]) -> Result<Self> {
        let degree = initial_state.len();
        if degree == 0 {
            return Err(SimError::InvalidCodeConfiguration(
                "LFSR state is empty".to_string(),
            ));
        }
        if initial_state.iter().any(|&bit| bit > 1) {
            return Err(SimError::InvalidCodeConfiguration(format!(
                "LFSR state must contain only 0 and 1, got {initial_state:?}"
            )));
        }
        if initial_state.iter().all(|&bit| bit == 0) {
            return Err(SimError::InvalidCodeConfiguration(
                "LFSR state is all zeros and would never leave it".to_string(),
            ));
        }
        if taps.is_empty() {
            return Err(SimError::InvalidCodeConfiguration(
                "LFSR needs at least one feedback tap".to_string(),
            ));
        }
        if let Some(&tap) = taps.iter().find(|&&tap| tap == 0 || tap > degree) {
            return Err(SimError::InvalidCodeConfiguration(format!(
                "tap {tap} is outside a register of {degree} cells"
            )));
        }
        Ok(Self {
            state: initial_state.to_vec(),
            taps: taps.to_vec(),
        })
    }

    pub fn degree(&self) -> usize {
        self.state.len()
    }

    pub fn state(&self) -> &[u8] {
        &self.state
    }

    /// Advance one step and return the output bit
    pub fn step(&mut self) -> u8 {
        let out = self.state[self.state.len() - 1];
        let feedback = self
            .taps
            .iter()
            .fold(0u8, |acc, &tap| acc ^ self.state[tap - 1]);
        self.state.rotate_right(1);
        self.state[0] = feedback;
        out
    }

    /// Run one full maximal-length period (2^n - 1 steps).
    ///
    /// Fails unless the register returns to its starting state after exactly
    /// 2^n - 1 steps and not earlier.
    pub fn full_period(initial_state: &[u8], taps: &[usize]) -> Result<Vec<u8>> {
        let mut lfsr = Self::new(initial_state, taps)?;
        let expected = (1usize << lfsr.degree()) - 1;
        let mut sequence = Vec::with_capacity(expected);
        for step in 1..=expected {
            sequence.push(lfsr.step());
            if lfsr.state() == initial_state && step != expected {
                return Err(SimError::InvalidCodeConfiguration(format!(
                    "taps {taps:?} repeat after {step} steps, expected a period of {expected}"
                )));
            }
        }
        if lfsr.state() != initial_state {
            return Err(SimError::InvalidCodeConfiguration(format!(
                "taps {taps:?} do not return to the initial state within {expected} steps"
            )));
        }
        Ok(sequence)
    }
}

impl Iterator for Lfsr {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step())
    }
}

/// The four codes that spread symbols 0..=3
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadingCodeSet {
    codes: [Code; CODE_COUNT],
}

impl SpreadingCodeSet {
    /// Code for a symbol value in 0..=3
    pub fn code(&self, symbol: u8) -> Option<&Code> {
        self.codes.get(symbol as usize)
    }

    pub fn codes(&self) -> &[Code; CODE_COUNT] {
        &self.codes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Code> {
        self.codes.iter()
    }

    pub fn code_length(&self) -> usize {
        CODE_LENGTH
    }
}

/// Gold-style code generator: `seq1 XOR rotate_left(seq2, i)` for i in 0..4
#[derive(Clone, Debug)]
pub struct CodeGenerator {
    initial_state: Vec<u8>,
    base_taps: Vec<usize>,
    shifted_taps: Vec<usize>,
}

impl CodeGenerator {
    pub fn new(initial_state: Vec<u8>, base_taps: Vec<usize>, shifted_taps: Vec<usize>) -> Self {
        Self {
            initial_state,
            base_taps,
            shifted_taps,
        }
    }

    /// Degree-5 pair with all-ones registers
    pub fn standard() -> Self {
        Self::new(
            vec![1; LFSR_DEGREE],
            BASE_TAPS.to_vec(),
            SHIFTED_TAPS.to_vec(),
        )
    }

    pub fn generate(&self) -> Result<SpreadingCodeSet> {
        if self.initial_state.len() != LFSR_DEGREE {
            return Err(SimError::InvalidCodeConfiguration(format!(
                "only {}-cell registers ({} chip codes) are supported, got {} cells",
                LFSR_DEGREE,
                CODE_LENGTH,
                self.initial_state.len()
            )));
        }

        let seq1 = Lfsr::full_period(&self.initial_state, &self.base_taps)?;
        let seq2 = Lfsr::full_period(&self.initial_state, &self.shifted_taps)?;

        let mut codes = [[0u8; CODE_LENGTH]; CODE_COUNT];
        for (shift, code) in codes.iter_mut().enumerate() {
            for (i, chip) in code.iter_mut().enumerate() {
                *chip = seq1[i] ^ seq2[(i + shift) % CODE_LENGTH];
            }
        }

        for i in 0..CODE_COUNT {
            for j in (i + 1)..CODE_COUNT {
                if codes[i] == codes[j] {
                    return Err(SimError::InvalidCodeConfiguration(format!(
                        "codes {i} and {j} are identical"
                    )));
                }
            }
        }

        debug!("Generated {} spreading codes of {} chips", CODE_COUNT, CODE_LENGTH);
        Ok(SpreadingCodeSet { codes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sequences_have_full_period_and_balance() {
        for taps in [&BASE_TAPS[..], &SHIFTED_TAPS[..]] {
            let seq = Lfsr::full_period(&[1; LFSR_DEGREE], taps).unwrap();
            assert_eq!(seq.len(), CODE_LENGTH);
            // m-sequences carry one more 1 than 0
            let ones = seq.iter().filter(|&&b| b == 1).count();
            assert_eq!(ones, 16);
        }
    }

    #[test]
    fn lfsr_iterator_is_periodic() {
        let lfsr = Lfsr::new(&[1; LFSR_DEGREE], &BASE_TAPS).unwrap();
        let bits: Vec<u8> = lfsr.take(2 * CODE_LENGTH).collect();
        assert_eq!(bits[..CODE_LENGTH], bits[CODE_LENGTH..]);
        // first output of an all-ones register
        assert_eq!(bits[0], 1);
    }

    #[test]
    fn codes_are_deterministic() {
        let a = CodeGenerator::standard().generate().unwrap();
        let b = CodeGenerator::standard().generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn codes_are_pairwise_distinct() {
        let set = CodeGenerator::standard().generate().unwrap();
        assert_eq!(set.iter().count(), CODE_COUNT);
        for i in 0..CODE_COUNT {
            assert_eq!(set.codes()[i].len(), CODE_LENGTH);
            for j in (i + 1)..CODE_COUNT {
                assert_ne!(set.codes()[i], set.codes()[j]);
            }
        }
    }

    #[test]
    fn codes_follow_xor_with_rotation() {
        let seq1 = Lfsr::full_period(&[1; LFSR_DEGREE], &BASE_TAPS).unwrap();
        let seq2 = Lfsr::full_period(&[1; LFSR_DEGREE], &SHIFTED_TAPS).unwrap();
        let set = CodeGenerator::standard().generate().unwrap();

        let mut rotated = seq2.clone();
        for shift in 0..CODE_COUNT {
            let expected: Vec<u8> = seq1.iter().zip(&rotated).map(|(a, b)| a ^ b).collect();
            assert_eq!(set.code(shift as u8).unwrap().to_vec(), expected);
            rotated.rotate_left(1);
        }
        assert!(set.code(4).is_none());
    }

    #[test]
    fn reducible_polynomial_is_rejected() {
        let generator = CodeGenerator::new(vec![1; LFSR_DEGREE], vec![5, 4], SHIFTED_TAPS.to_vec());
        assert!(matches!(
            generator.generate(),
            Err(SimError::InvalidCodeConfiguration(_))
        ));
    }

    #[test]
    fn out_of_range_tap_is_rejected() {
        assert!(Lfsr::new(&[1; LFSR_DEGREE], &[6, 3]).is_err());
        assert!(Lfsr::new(&[1; LFSR_DEGREE], &[0]).is_err());
        assert!(Lfsr::new(&[0; LFSR_DEGREE], &BASE_TAPS).is_err());
    }

    #[test]
    fn other_code_lengths_are_rejected() {
        let generator = CodeGenerator::new(vec![1; 7], vec![7, 3, 2, 1], vec![7, 5, 4, 3, 2, 1]);
        assert!(matches!(
            generator.generate(),
            Err(SimError::InvalidCodeConfiguration(_))
        ));
    }
}
