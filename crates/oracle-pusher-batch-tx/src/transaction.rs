use crate::{chunk::TransactionBundle, error::SubmitError, SubmitResult};
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    system_instruction,
    transaction::VersionedTransaction,
};

/// Build and sign one versioned transaction for a bundle of update
/// operations.
///
/// Compute-budget instructions come first: the unit limit always, the unit
/// price only when the direct strategy supplies the cycle's fee. A tip
/// transfer, when present, goes last so the relay can verify the payment
/// after the updates.
pub fn build_bundle_transaction(
    bundle: &TransactionBundle,
    payer: &Keypair,
    compute_unit_limit: u32,
    compute_unit_price: Option<u64>,
    tip: Option<(Pubkey, u64)>,
    lookup_tables: &[AddressLookupTableAccount],
    recent_blockhash: Hash,
) -> SubmitResult<VersionedTransaction> {
    let mut instructions: Vec<Instruction> = Vec::with_capacity(bundle.len() + 3);

    instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(
        compute_unit_limit,
    ));
    if let Some(micro_lamports) = compute_unit_price {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(
            micro_lamports,
        ));
    }
    instructions.extend(bundle.operations.iter().map(|op| op.instruction.clone()));
    if let Some((tip_account, lamports)) = tip {
        instructions.push(system_instruction::transfer(
            &payer.pubkey(),
            &tip_account,
            lamports,
        ));
    }

    let message = v0::Message::try_compile(
        &payer.pubkey(),
        &instructions,
        lookup_tables,
        recent_blockhash,
    )
    .map_err(|e| SubmitError::Compile(e.to_string()))?;

    let transaction = VersionedTransaction::try_new(VersionedMessage::V0(message), &[payer])
        .map_err(|e| SubmitError::Signing(e.to_string()))?;

    let size = bincode::serde::encode_to_vec(&transaction, bincode::config::legacy())
        .map_err(|e| SubmitError::Compile(e.to_string()))?
        .len();
    if size > PACKET_DATA_SIZE {
        return Err(SubmitError::TransactionTooLarge {
            size,
            max: PACKET_DATA_SIZE,
        });
    }

    Ok(transaction)
}
