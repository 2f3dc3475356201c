//! Runtime implementations of the services the creature AI consumes.
//!
//! The core only sees the [`RngOracle`] trait; the runtime seeds a
//! [`SmallRngOracle`] from its configuration. Static species content lives in
//! [`SpeciesCatalog`].
mod species;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use keeper_core::RngOracle;

pub use species::SpeciesCatalog;

/// [`RngOracle`] backed by `rand`'s small fast generator.
#[derive(Debug, Clone)]
pub struct SmallRngOracle {
    rng: SmallRng,
}

impl SmallRngOracle {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RngOracle for SmallRngOracle {
    fn next_f64(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    fn next_u32(&mut self) -> u32 {
        self.rng.r#gen::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_rolls() {
        let mut a = SmallRngOracle::seeded(42);
        let mut b = SmallRngOracle::seeded(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        let roll = a.uniform(10.0, 30.0);
        assert!((10.0..30.0).contains(&roll));
        assert_eq!(roll, b.uniform(10.0, 30.0));
    }

    #[test]
    fn int_stays_inclusive() {
        let mut rng = SmallRngOracle::seeded(7);
        for _ in 0..200 {
            let v = rng.int(1, 3);
            assert!((1..=3).contains(&v));
        }
    }
}
