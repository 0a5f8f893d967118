use rand::Rng;

use crate::utils::consts::CODE_COUNT;

/// Draw `count` uniform quaternary symbols
pub fn random_symbols<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<u8> {
    (0..count)
        .map(|_| rng.random_range(0..CODE_COUNT as u8))
        .collect()
}
