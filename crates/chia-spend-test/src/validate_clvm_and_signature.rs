use chia_bls::{aggregate_verify_gt, hash_to_g2};
use chia_consensus::{
    allocator::make_allocator, consensus_constants::ConsensusConstants,
    owned_conditions::OwnedSpendBundleConditions, spendbundle_conditions::run_spendbundle,
    validation_error::ErrorCode,
};
use chia_protocol::SpendBundle;
use clvmr::LIMIT_HEAP;

/// Runs every puzzle in the bundle, checks the conditions they output, and
/// verifies the aggregate signature against every `AGG_SIG_*` they require.
pub fn validate_clvm_and_signature(
    spend_bundle: &SpendBundle,
    max_cost: u64,
    constants: &ConsensusConstants,
    flags: u32,
) -> Result<OwnedSpendBundleConditions, ErrorCode> {
    let mut a = make_allocator(LIMIT_HEAP);
    let (sbc, pkm_pairs) =
        run_spendbundle(&mut a, spend_bundle, max_cost, flags, constants).map_err(|e| e.1)?;
    let conditions = OwnedSpendBundleConditions::from(&a, sbc);

    let mut pairings = Vec::with_capacity(pkm_pairs.len());
    let mut aug_msg = Vec::<u8>::new();

    for (pk, msg) in pkm_pairs {
        aug_msg.clear();
        aug_msg.extend_from_slice(&pk.to_bytes());
        aug_msg.extend(&*msg);
        pairings.push(hash_to_g2(&aug_msg).pair(&pk));
    }

    if !aggregate_verify_gt(&spend_bundle.aggregated_signature, pairings.iter()) {
        return Err(ErrorCode::BadAggregateSignature);
    }

    Ok(conditions)
}
