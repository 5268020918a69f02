//! xorshift64* random number generator
//!
//! Fast, deterministic PRNG used by every stochastic collaborator. Each model
//! instance owns its own generator; nothing is shared or global.
//!
//! # Determinism
//!
//! Same seed → same arrival trace, same lengths of stay, same outcomes. Runs
//! that compare policies rely on this to see identical demand.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use hospital_sim_core::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let gap = rng.exponential(30.0);
/// assert!(gap >= 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed (zero is mapped to one)
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Independent generator for a named sub-stream of a run seed
    ///
    /// Lets the arrival source and the outcome model draw from separate
    /// streams, so changing one does not perturb the other.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        // splitmix64 finalizer over the combined seed
        let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Self::new(z ^ (z >> 31))
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Random f64 in [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Random integer in [min, max)
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// True with probability `p`
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Exponentially distributed sample with the given mean
    ///
    /// # Panics
    /// Panics if `mean` is not positive
    pub fn exponential(&mut self, mean: f64) -> f64 {
        assert!(mean > 0.0, "exponential mean must be positive");
        // 1 - u lies in (0, 1], so ln is finite
        let u = 1.0 - self.next_f64();
        -u.ln() * mean
    }

    /// Index drawn proportionally to `weights`
    ///
    /// Returns `None` if the weights are empty or sum to zero.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().sum();
        if weights.is_empty() || total <= 0.0 {
            return None;
        }
        let target = self.next_f64() * total;
        let mut cumulative = 0.0;
        for (index, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if target < cumulative {
                return Some(index);
            }
        }
        // Rounding can leave target == total; fall back to the last positive weight
        weights.iter().rposition(|w| *w > 0.0)
    }

    /// Current RNG state
    pub fn get_state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let rng = RngManager::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn test_range_invalid_bounds() {
        let mut rng = RngManager::new(12345);
        rng.range(100, 50);
    }

    #[test]
    fn test_next_f64_in_range() {
        let mut rng = RngManager::new(12345);
        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!((0.0..1.0).contains(&val), "next_f64() produced {}", val);
        }
    }

    #[test]
    fn test_exponential_mean_is_plausible() {
        let mut rng = RngManager::new(7);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| rng.exponential(10.0)).sum::<f64>() / n as f64;
        assert!((mean - 10.0).abs() < 0.5, "sample mean {} too far from 10", mean);
    }

    #[test]
    fn test_streams_are_independent_and_deterministic() {
        let mut a1 = RngManager::for_stream(42, 1);
        let mut a2 = RngManager::for_stream(42, 1);
        let mut b = RngManager::for_stream(42, 2);

        let first = a1.next();
        assert_eq!(first, a2.next());
        assert_ne!(first, b.next());
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut rng = RngManager::new(99);
        for _ in 0..200 {
            assert_eq!(rng.weighted_index(&[0.0, 1.0, 0.0]), Some(1));
        }
        assert_eq!(rng.weighted_index(&[]), None);
        assert_eq!(rng.weighted_index(&[0.0, 0.0]), None);
    }
}
