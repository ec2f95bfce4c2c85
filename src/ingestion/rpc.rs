//! JSON-RPC ledger source for the monitored contract's events.

use alloy::primitives::Address;
use alloy::rpc::types::eth::{Filter, Log};
use alloy::sol;
use alloy::sol_types::SolEvent;
use std::collections::HashMap;
use std::future::Future;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::BlockchainError;
use crate::events::EventCategory;
use crate::ingestion::ledger::{LedgerError, LedgerSource, RawLogEntry};

sol! {
    /// Emitted when a sponsor's position is liquidated.
    #[derive(Debug)]
    event LiquidationCreated(
        address indexed sponsor,
        address indexed liquidator,
        uint256 indexed liquidationId,
        uint256 tokensOutstanding,
        uint256 lockedCollateral,
        uint256 liquidatedCollateral
    );

    /// Emitted when a liquidation is disputed.
    #[derive(Debug)]
    event LiquidationDisputed(
        address indexed sponsor,
        address indexed liquidator,
        address indexed disputer,
        uint256 liquidationId,
        uint256 disputeBondAmount
    );

    /// Emitted when the oracle resolves a dispute.
    #[derive(Debug)]
    event DisputeSettled(
        address indexed caller,
        address indexed sponsor,
        address indexed liquidator,
        address disputer,
        uint256 liquidationId,
        bool DisputeSucceeded
    );
}

/// Ledger source backed by [`BlockchainClient`] log queries.
#[derive(Debug, Clone)]
pub struct ContractLedger {
    client: BlockchainClient,
}

impl ContractLedger {
    pub fn new(client: BlockchainClient) -> Self {
        Self { client }
    }

    /// Topic-0 signature for a category.
    pub fn signature(category: EventCategory) -> &'static str {
        match category {
            EventCategory::LiquidationCreated => LiquidationCreated::SIGNATURE,
            EventCategory::LiquidationDisputed => LiquidationDisputed::SIGNATURE,
            EventCategory::DisputeSettled => DisputeSettled::SIGNATURE,
        }
    }
}

impl LedgerSource for ContractLedger {
    async fn get_events(
        &self,
        contract: Address,
        category: EventCategory,
        from_block: u64,
    ) -> Result<Vec<RawLogEntry>, LedgerError> {
        let filter = Filter::new()
            .address(contract)
            .from_block(from_block)
            .event(Self::signature(category));

        let logs = self.client.get_logs(&filter).await?;

        tracing::trace!(
            category = %category,
            from_block,
            count = logs.len(),
            "Fetched contract logs"
        );

        let mut entries = logs
            .iter()
            .map(|log| decode_log(category, log))
            .collect::<Result<Vec<_>, _>>()?;
        fill_block_timestamps(&mut entries, |block| self.client.get_block_timestamp(block)).await?;
        Ok(entries)
    }
}

/// Fill in timestamps the node left out of the logs, one header lookup per block.
async fn fill_block_timestamps<F, Fut>(entries: &mut [RawLogEntry], mut lookup: F) -> Result<(), LedgerError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<u64, BlockchainError>>,
{
    let mut known: HashMap<u64, u64> = HashMap::new();
    for entry in entries.iter_mut().filter(|e| e.block_timestamp.is_none()) {
        let Some(block) = entry.block_number else {
            continue;
        };
        let timestamp = match known.get(&block) {
            Some(timestamp) => *timestamp,
            None => {
                let timestamp = lookup(block).await?;
                known.insert(block, timestamp);
                timestamp
            }
        };
        entry.block_timestamp = Some(timestamp);
    }
    Ok(())
}

/// Decode one log into its raw key/value form.
///
/// A log that does not match the category's ABI fails the whole batch.
fn decode_log(category: EventCategory, log: &Log) -> Result<RawLogEntry, LedgerError> {
    let decode_err = |e: alloy::sol_types::Error| LedgerError::Decode {
        category,
        reason: e.to_string(),
    };

    let fields = match category {
        EventCategory::LiquidationCreated => {
            let event = log.log_decode::<LiquidationCreated>().map_err(decode_err)?.inner.data;
            vec![
                ("sponsor", event.sponsor.to_string()),
                ("liquidator", event.liquidator.to_string()),
                ("liquidationId", event.liquidationId.to_string()),
                ("tokensOutstanding", event.tokensOutstanding.to_string()),
                ("lockedCollateral", event.lockedCollateral.to_string()),
                ("liquidatedCollateral", event.liquidatedCollateral.to_string()),
            ]
        }
        EventCategory::LiquidationDisputed => {
            let event = log.log_decode::<LiquidationDisputed>().map_err(decode_err)?.inner.data;
            vec![
                ("sponsor", event.sponsor.to_string()),
                ("liquidator", event.liquidator.to_string()),
                ("disputer", event.disputer.to_string()),
                ("liquidationId", event.liquidationId.to_string()),
                ("disputeBondAmount", event.disputeBondAmount.to_string()),
            ]
        }
        EventCategory::DisputeSettled => {
            let event = log.log_decode::<DisputeSettled>().map_err(decode_err)?.inner.data;
            vec![
                ("caller", event.caller.to_string()),
                ("sponsor", event.sponsor.to_string()),
                ("liquidator", event.liquidator.to_string()),
                ("disputer", event.disputer.to_string()),
                ("liquidationId", event.liquidationId.to_string()),
                ("DisputeSucceeded", event.DisputeSucceeded.to_string()),
            ]
        }
    };

    Ok(RawLogEntry {
        transaction_hash: log.transaction_hash.map(|h| h.to_string()),
        block_number: log.block_number,
        log_index: log.log_index,
        block_timestamp: log.block_timestamp,
        fields: fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    })
}
