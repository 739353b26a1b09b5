use crate::{
    errors::{BuildError, BuildResult},
    AddressFinder, AttestationBlob, FeedId,
};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};
use std::ops::Range;

/// Receiver instruction tag for posting a price update.
const POST_PRICE_UPDATE_TAG: u8 = 2;

/// One feed's update, bound to its attestation byte range and destination
/// shard account. Cycle-scoped.
#[derive(Debug, Clone)]
pub struct UpdateOperation {
    pub feed_id: FeedId,
    pub range: Range<usize>,
    pub instruction: Instruction,
}

/// Build the receiver instruction writing one feed's attested update to its
/// shard account.
///
/// Returns the instruction together with the derived feed account so callers
/// can log or prefetch it.
pub fn build_post_price_update_ix(
    payer: &Pubkey,
    shard_id: u16,
    feed_id: &FeedId,
    attestation: &[u8],
    finder: &AddressFinder,
) -> (Instruction, Pubkey) {
    let (feed_account, _) = finder.find_feed_address(shard_id, feed_id);

    let mut data = Vec::with_capacity(1 + 2 + 4 + attestation.len());
    data.push(POST_PRICE_UPDATE_TAG);
    data.extend_from_slice(&shard_id.to_le_bytes());
    data.extend_from_slice(&(attestation.len() as u32).to_le_bytes());
    data.extend_from_slice(attestation);

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(feed_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    let instruction = Instruction {
        program_id: finder.program_id,
        accounts,
        data,
    };

    (instruction, feed_account)
}

/// Turn a round's feed ids and attestation blob into one update operation per
/// feed, in input order.
///
/// Fails on the first feed the blob has no range for; a partially mapped
/// round must abort rather than silently push a subset.
pub fn build_update_operations(
    feed_ids: &[FeedId],
    blob: &AttestationBlob,
    finder: &AddressFinder,
    payer: &Pubkey,
    shard_id: u16,
) -> BuildResult<Vec<UpdateOperation>> {
    let mut operations = Vec::with_capacity(feed_ids.len());

    for feed_id in feed_ids {
        let range = blob
            .range_for(feed_id)
            .ok_or(BuildError::MissingAttestation(*feed_id))?;
        if range.is_empty() {
            return Err(BuildError::EmptyAttestation(*feed_id));
        }

        // range_for and slice come from the same index, so the slice is
        // always present here
        let attestation = blob
            .slice(range.clone())
            .ok_or(BuildError::MissingAttestation(*feed_id))?;

        let (instruction, _) =
            build_post_price_update_ix(payer, shard_id, feed_id, attestation, finder);

        operations.push(UpdateOperation {
            feed_id: *feed_id,
            range,
            instruction,
        });
    }

    Ok(operations)
}
