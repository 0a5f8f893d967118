use crate::error::{Result, SimError};

/// Count mismatching bits, treating each symbol as the pair (v & 1, v & 2)
pub fn count_bit_errors(sent: &[u8], decoded: &[u8]) -> Result<usize> {
    if sent.len() != decoded.len() {
        return Err(SimError::LengthMismatch {
            expected: sent.len(),
            actual: decoded.len(),
        });
    }
    Ok(sent
        .iter()
        .zip(decoded)
        .map(|(&a, &b)| usize::from(a & 1 != b & 1) + usize::from(a & 2 != b & 2))
        .sum())
}

/// Fraction of wrong bits, two bits per symbol
pub fn bit_error_rate(sent: &[u8], decoded: &[u8]) -> Result<f64> {
    let errors = count_bit_errors(sent, decoded)?;
    if sent.is_empty() {
        return Err(SimError::NumericDegeneracy(
            "bit error rate of an empty sequence".to_string(),
        ));
    }
    Ok(errors as f64 / (2 * sent.len()) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_have_no_errors() {
        assert_eq!(bit_error_rate(&[0, 1, 2, 3], &[0, 1, 2, 3]).unwrap(), 0.0);
    }

    #[test]
    fn bits_are_scored_independently() {
        // 0 vs 3 flips both bits, 1 vs 3 flips one, 2 vs 0 flips one
        assert_eq!(count_bit_errors(&[0, 1, 2], &[3, 3, 0]).unwrap(), 4);
        let ber = bit_error_rate(&[0, 1, 2], &[3, 3, 0]).unwrap();
        assert!((ber - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn all_bits_wrong_gives_one() {
        assert_eq!(bit_error_rate(&[0, 3, 1, 2], &[3, 0, 2, 1]).unwrap(), 1.0);
    }

    #[test]
    fn mismatched_lengths_and_empty_input_are_errors() {
        assert!(matches!(
            bit_error_rate(&[0, 1], &[0]),
            Err(SimError::LengthMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            bit_error_rate(&[], &[]),
            Err(SimError::NumericDegeneracy(_))
        ));
    }
}
