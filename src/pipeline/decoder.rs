//! Instruction decoder for pool-creation transactions.
//!
//! Scans a transaction envelope for the first instruction issued by the
//! watched DEX program and extracts the new mint and pool accounts from fixed
//! positions in the instruction's account list. The layout is specific to one
//! known instruction shape; anything else is ignored, not rejected.

use crate::config::InstructionLayout;
use crate::types::TransactionEnvelope;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

/// Extract `(mint, pool)` from the first matching instruction.
///
/// Returns `None` when no instruction belongs to `program_id`, when the
/// matching instruction carries no data, or when any account index is out of
/// range. Indexing failures never propagate.
pub fn extract_candidate(
    envelope: &TransactionEnvelope,
    program_id: &Pubkey,
    layout: InstructionLayout,
) -> Option<(Pubkey, Pubkey)> {
    for instruction in &envelope.instructions {
        let owner = envelope
            .static_account_keys
            .get(instruction.program_id_index as usize)?;
        if owner != program_id || instruction.data.is_empty() {
            continue;
        }

        let resolve = |position: usize| -> Option<Pubkey> {
            let key_index = *instruction.account_key_indexes.get(position)?;
            envelope
                .static_account_keys
                .get(key_index as usize)
                .copied()
        };

        let mint = resolve(layout.mint_account_position);
        let pool = resolve(layout.pool_account_position);
        return match (mint, pool) {
            (Some(mint), Some(pool)) => Some((mint, pool)),
            _ => {
                debug!("pool-init instruction with out-of-range account index");
                None
            }
        };
    }
    None
}
