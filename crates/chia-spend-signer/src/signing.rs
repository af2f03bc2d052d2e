use std::collections::HashMap;

use chia_bls::{aggregate_verify, sign, verify, PublicKey, SecretKey, Signature};
use tracing::debug;

use crate::{RequiredSignature, SignerError};

/// Signs a single requirement. Signing is deterministic, so the same key
/// and message always produce the same signature.
pub fn sign_required(secret_key: &SecretKey, required: &RequiredSignature) -> Signature {
    sign(secret_key, required.message())
}

/// Signs every requirement with the matching key from `secret_keys`.
///
/// Each requirement yields exactly one component signature. A requirement
/// whose public key has no secret key fails the whole operation rather than
/// being skipped.
pub fn sign_all(
    required_signatures: &[RequiredSignature],
    secret_keys: &[SecretKey],
) -> Result<Vec<Signature>, SignerError> {
    let key_pairs = secret_keys
        .iter()
        .map(|sk| (sk.public_key(), sk))
        .collect::<HashMap<PublicKey, &SecretKey>>();

    required_signatures
        .iter()
        .map(|required| {
            let sk = key_pairs
                .get(&required.public_key)
                .ok_or_else(|| SignerError::MissingKey(required.public_key))?;
            Ok(sign_required(sk, required))
        })
        .collect()
}

/// Combines one component signature per requirement into an aggregate.
pub fn aggregate_signatures(
    required_signatures: &[RequiredSignature],
    signatures: &[Signature],
) -> Result<Signature, SignerError> {
    if required_signatures.len() != signatures.len() {
        return Err(SignerError::SignatureCount {
            expected: required_signatures.len(),
            actual: signatures.len(),
        });
    }

    debug!(count = signatures.len(), "aggregating signatures");

    let mut aggregated_signature = Signature::default();
    for signature in signatures {
        aggregated_signature += signature;
    }
    Ok(aggregated_signature)
}

/// Signs and aggregates every requirement in one step.
pub fn sign_and_aggregate(
    required_signatures: &[RequiredSignature],
    secret_keys: &[SecretKey],
) -> Result<Signature, SignerError> {
    let signatures = sign_all(required_signatures, secret_keys)?;
    aggregate_signatures(required_signatures, &signatures)
}

pub fn verify_signature(required: &RequiredSignature, signature: &Signature) -> bool {
    verify(signature, &required.public_key, required.message())
}

/// Checks an aggregate signature against every requirement it should cover.
pub fn verify_aggregate(required_signatures: &[RequiredSignature], signature: &Signature) -> bool {
    let messages = required_signatures
        .iter()
        .map(RequiredSignature::message)
        .collect::<Vec<_>>();

    aggregate_verify(
        signature,
        required_signatures
            .iter()
            .zip(&messages)
            .map(|(required, message)| (&required.public_key, message.as_slice())),
    )
}
