//! Jitter sources for the bot affect update.
//!
//! The jitter is tiny and exists only so that identical inputs do not
//! produce bit-identical trajectories. Tests use [`NoNoise`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

pub trait NoiseSource: Send + Sync + Debug {
    /// Uniform sample in [-amplitude / 2, amplitude / 2).
    fn jitter(&self, amplitude: f32) -> f32;
}

/// Deterministic: always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn jitter(&self, _amplitude: f32) -> f32 {
        0.0
    }
}

/// Draws from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadNoise;

impl NoiseSource for ThreadNoise {
    fn jitter(&self, amplitude: f32) -> f32 {
        (rand::thread_rng().gen::<f32>() - 0.5) * amplitude
    }
}

/// Reproducible jitter from a seeded RNG.
#[derive(Debug)]
pub struct SeededNoise {
    rng: Mutex<StdRng>,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn jitter(&self, amplitude: f32) -> f32 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (rng.gen::<f32>() - 0.5) * amplitude
    }
}

/// Pick the jitter source for an optional seed.
pub fn from_seed(seed: Option<u64>) -> Box<dyn NoiseSource> {
    match seed {
        Some(seed) => Box::new(SeededNoise::new(seed)),
        None => Box::new(ThreadNoise),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_noise_is_zero() {
        assert_eq!(NoNoise.jitter(1.0), 0.0);
    }

    #[test]
    fn test_thread_noise_bounded() {
        for _ in 0..1000 {
            let j = ThreadNoise.jitter(0.02);
            assert!(j >= -0.01 && j < 0.01, "jitter out of range: {}", j);
        }
    }

    #[test]
    fn test_seeded_noise_reproducible() {
        let a = SeededNoise::new(42);
        let b = SeededNoise::new(42);
        for _ in 0..50 {
            assert_eq!(a.jitter(0.02), b.jitter(0.02));
        }
    }

    #[test]
    fn test_seeded_noise_differs_by_seed() {
        let a = SeededNoise::new(1);
        let b = SeededNoise::new(2);
        let sa: Vec<f32> = (0..10).map(|_| a.jitter(1.0)).collect();
        let sb: Vec<f32> = (0..10).map(|_| b.jitter(1.0)).collect();
        assert_ne!(sa, sb);
    }
}
