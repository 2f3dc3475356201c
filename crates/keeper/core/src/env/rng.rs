//! RNG oracle for the creature AI.
//!
//! Every random decision a handler makes goes through [`RngOracle`], which is
//! injected through the simulation context. Given the same seed and the same
//! world, a run replays identically.

/// Stateful random source.
///
/// Implementors only provide [`next_f64`](Self::next_f64); every other roll is
/// derived from it so scripted oracles can drive tests precisely.
pub trait RngOracle: Send {
    /// Uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    fn next_u32(&mut self) -> u32 {
        (self.next_f64() * f64::from(u32::MAX)) as u32
    }

    /// Uniform value in `[min, max)`; returns `min` for an empty range.
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f64()
    }

    /// Uniform integer in `[min, max]` inclusive.
    fn int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.next_f64() * span) as i64;
        min + offset.min(max - min)
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Normally distributed value (Box-Muller).
    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + z * std_dev
    }

    /// Uniform index into a collection of `len` elements. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.int(0, len as i64 - 1) as usize
    }
}

/// Fisher-Yates shuffle driven by the oracle.
pub fn shuffle<T>(rng: &mut dyn RngOracle, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.int(0, i as i64) as usize;
        items.swap(i, j);
    }
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// Uses the PCG-XSH-RR variant: 64-bit state, 32-bit output.
#[derive(Clone, Copy, Debug)]
pub struct PcgRng {
    state: u64,
}

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 0 };
        rng.step();
        rng.state = rng.state.wrapping_add(seed);
        rng.step();
        rng
    }

    #[inline]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
    }

    /// XSH-RR output permutation.
    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    pub fn next_raw(&mut self) -> u32 {
        let old = self.state;
        self.step();
        Self::output(old)
    }
}

impl Default for PcgRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RngOracle for PcgRng {
    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_raw()) / (f64::from(u32::MAX) + 1.0)
    }

    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }
}

/// Oracle replaying a fixed list of `[0, 1)` values in a loop.
///
/// Fixtures use it to force a specific branch of a random decision.
#[derive(Clone, Debug)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RngOracle for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        let Some(value) = self.values.get(self.cursor % self.values.len().max(1)) else {
            return 0.0;
        };
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcg_is_deterministic_per_seed() {
        let mut a = PcgRng::new(42);
        let mut b = PcgRng::new(42);
        let mut c = PcgRng::new(43);
        let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        let zs: Vec<u32> = (0..8).map(|_| c.next_u32()).collect();
        assert_eq!(xs, ys);
        assert_ne!(xs, zs);
    }

    #[test]
    fn derived_rolls_stay_in_range() {
        let mut rng = PcgRng::new(7);
        for _ in 0..1000 {
            let u = rng.uniform(10.0, 30.0);
            assert!((10.0..30.0).contains(&u));
            let i = rng.int(3, 8);
            assert!((3..=8).contains(&i));
            assert!(rng.index(5) < 5);
        }
    }

    #[test]
    fn shuffle_keeps_elements() {
        let mut rng = PcgRng::new(1);
        let mut items = [1, 2, 3, 4, 5, 6];
        shuffle(&mut rng, &mut items);
        let mut sorted = items;
        sorted.sort_unstable();
        assert_eq!(sorted, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn scripted_values_cycle() {
        let mut rng = ScriptedRng::new(vec![0.1, 0.9]);
        assert!(rng.chance(0.2));
        assert!(!rng.chance(0.2));
        assert!(rng.chance(0.2));
        assert_eq!(ScriptedRng::new(Vec::new()).next_f64(), 0.0);
    }
}
