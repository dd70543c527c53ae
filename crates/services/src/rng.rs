use rand::SeedableRng;
use rand::rngs::StdRng;

/// Where question generation draws its randomness from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomSource {
    #[default]
    Entropy,
    /// Reproducible sequence, for tests and replayable sessions.
    Seeded(u64),
}

impl RandomSource {
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or(Self::Entropy, Self::Seeded)
    }

    #[must_use]
    pub fn rng(self) -> StdRng {
        match self {
            RandomSource::Entropy => StdRng::from_os_rng(),
            RandomSource::Seeded(seed) => StdRng::seed_from_u64(seed),
        }
    }
}
