use chia_bls::{PublicKey, SecretKey};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A deterministic BLS key pair derived from a numeric seed.
#[derive(Debug, Clone)]
pub struct BlsPair {
    pub sk: SecretKey,
    pub pk: PublicKey,
}

impl Default for BlsPair {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BlsPair {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sk = SecretKey::from_seed(&rng.gen::<[u8; 32]>());
        let pk = sk.public_key();
        Self { sk, pk }
    }

    pub fn range<const N: usize>() -> [Self; N] {
        Self::range_with_seed(0)
    }

    pub fn range_with_seed<const N: usize>(seed: u64) -> [Self; N] {
        std::array::from_fn(|i| Self::new(seed + i as u64))
    }

    pub fn range_vec(length: usize) -> Vec<Self> {
        (0..length as u64).map(Self::new).collect()
    }
}
