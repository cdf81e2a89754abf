use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{GwError, Result};

pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// `n` independent zero-mean Gaussian samples with standard deviation `std`.
pub fn white_noise(n: usize, std: f64, rng: &mut ChaCha8Rng) -> Result<Vec<f64>> {
    let normal = Normal::new(0.0, std)
        .map_err(|e| GwError::InvalidInput(format!("noise std {}: {}", std, e)))?;
    Ok((0..n).map(|_| normal.sample(rng)).collect())
}

pub fn add_white_noise(signal: &mut [f64], std: f64, rng: &mut ChaCha8Rng) -> Result<()> {
    let noise = white_noise(signal.len(), std, rng)?;
    for (s, n) in signal.iter_mut().zip(noise) {
        *s += n;
    }
    Ok(())
}
