use std::str::FromStr;

use bip39::Mnemonic;
use chia_bls::{master_to_wallet_unhardened_intermediate, DerivableKey, PublicKey, SecretKey};
use chia_puzzle_types::{standard::DEFAULT_HIDDEN_PUZZLE_HASH, DeriveSynthetic};

use crate::SignerError;

/// Source of the synthetic wallet keys used by standard puzzles.
pub trait KeyStore {
    /// The synthetic public key at a derivation index.
    fn public_key(&self, index: u32) -> PublicKey;

    /// The synthetic secret key at a derivation index, if this store holds secrets.
    fn secret_key(&self, index: u32) -> Option<SecretKey>;
}

/// Derives unhardened wallet keys from a root secret key.
#[derive(Debug, Clone)]
pub struct SecretKeyStore {
    root_key: SecretKey,
    intermediate_key: SecretKey,
    hidden_puzzle_hash: [u8; 32],
}

impl SecretKeyStore {
    pub fn new(root_key: SecretKey) -> Self {
        Self {
            intermediate_key: master_to_wallet_unhardened_intermediate(&root_key),
            root_key,
            hidden_puzzle_hash: DEFAULT_HIDDEN_PUZZLE_HASH,
        }
    }

    #[must_use]
    pub fn with_hidden_puzzle_hash(mut self, hidden_puzzle_hash: [u8; 32]) -> Self {
        self.hidden_puzzle_hash = hidden_puzzle_hash;
        self
    }

    pub fn root_key(&self) -> &SecretKey {
        &self.root_key
    }

    pub fn root_public_key(&self) -> PublicKey {
        self.root_key.public_key()
    }

    /// The unhardened key at an index, before the synthetic offset is applied.
    pub fn unhardened_key(&self, index: u32) -> SecretKey {
        self.intermediate_key.derive_unhardened(index)
    }

    fn synthetic_key(&self, index: u32) -> SecretKey {
        self.unhardened_key(index)
            .derive_synthetic_hidden(&self.hidden_puzzle_hash)
    }
}

impl KeyStore for SecretKeyStore {
    fn public_key(&self, index: u32) -> PublicKey {
        self.synthetic_key(index).public_key()
    }

    fn secret_key(&self, index: u32) -> Option<SecretKey> {
        Some(self.synthetic_key(index))
    }
}

/// Derives synthetic public keys without access to any secret.
#[derive(Debug, Clone, Copy)]
pub struct PublicKeyStore {
    intermediate_key: PublicKey,
    hidden_puzzle_hash: [u8; 32],
}

impl PublicKeyStore {
    pub fn new(root_public_key: &PublicKey) -> Self {
        Self {
            intermediate_key: master_to_wallet_unhardened_intermediate(root_public_key),
            hidden_puzzle_hash: DEFAULT_HIDDEN_PUZZLE_HASH,
        }
    }
}

impl KeyStore for PublicKeyStore {
    fn public_key(&self, index: u32) -> PublicKey {
        self.intermediate_key
            .derive_unhardened(index)
            .derive_synthetic_hidden(&self.hidden_puzzle_hash)
    }

    fn secret_key(&self, _index: u32) -> Option<SecretKey> {
        None
    }
}

/// Derives the root secret key from a BIP-39 mnemonic phrase.
pub fn secret_key_from_mnemonic(phrase: &str, passphrase: &str) -> Result<SecretKey, SignerError> {
    let mnemonic = Mnemonic::from_str(phrase.trim())?;
    let seed = mnemonic.to_seed(passphrase);
    Ok(SecretKey::from_seed(&seed))
}
