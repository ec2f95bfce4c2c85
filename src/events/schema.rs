//! Declarative normalization of raw ledger logs.
//!
//! Each category owns an [`EventSchema`]: a table of ledger field names, the
//! canonical name they map to, their kind and whether they are required.
//! Validation and parsing are driven entirely by the table; only the final
//! assembly into a typed record is category specific.

use alloy::primitives::{Address, U256};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

use crate::events::types::{
    DisputeEvent, DisputeSettlementEvent, EventCategory, EventRecord, LiquidationEvent,
};
use crate::ingestion::ledger::RawLogEntry;

/// How a raw string value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 20-byte account address, any hex case.
    Address,
    /// Unsigned 256-bit integer given as a base-10 string.
    Amount,
    /// Boolean (`true`/`false`/`1`/`0`).
    Flag,
}

/// One entry of a category schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name in the ledger payload.
    pub source: &'static str,
    /// Canonical field name on the record.
    pub canonical: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(source: &'static str, canonical: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { source, canonical, kind, required: true }
}

const fn optional(source: &'static str, canonical: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { source, canonical, kind, required: false }
}

/// Field mapping for one event category.
#[derive(Debug)]
pub struct EventSchema {
    pub category: EventCategory,
    pub fields: &'static [FieldSpec],
}

static LIQUIDATION_CREATED: EventSchema = EventSchema {
    category: EventCategory::LiquidationCreated,
    fields: &[
        required("sponsor", "sponsor", FieldKind::Address),
        required("liquidator", "liquidator", FieldKind::Address),
        required("liquidationId", "liquidation_id", FieldKind::Amount),
        required("tokensOutstanding", "tokens_outstanding", FieldKind::Amount),
        required("lockedCollateral", "locked_collateral", FieldKind::Amount),
        optional("liquidatedCollateral", "liquidated_collateral", FieldKind::Amount),
    ],
};

static LIQUIDATION_DISPUTED: EventSchema = EventSchema {
    category: EventCategory::LiquidationDisputed,
    fields: &[
        required("sponsor", "sponsor", FieldKind::Address),
        required("liquidator", "liquidator", FieldKind::Address),
        required("disputer", "disputer", FieldKind::Address),
        required("liquidationId", "liquidation_id", FieldKind::Amount),
        required("disputeBondAmount", "dispute_bond_amount", FieldKind::Amount),
    ],
};

static DISPUTE_SETTLED: EventSchema = EventSchema {
    category: EventCategory::DisputeSettled,
    fields: &[
        required("caller", "caller", FieldKind::Address),
        required("sponsor", "sponsor", FieldKind::Address),
        required("liquidator", "liquidator", FieldKind::Address),
        required("disputer", "disputer", FieldKind::Address),
        required("liquidationId", "liquidation_id", FieldKind::Amount),
        required("DisputeSucceeded", "dispute_succeeded", FieldKind::Flag),
    ],
};

/// A record that could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("{category} event is missing its transaction hash")]
    MissingTransactionHash { category: EventCategory },

    #[error("{category} event {tx_hash} is missing its block number")]
    MissingBlockNumber { category: EventCategory, tx_hash: String },

    #[error("{category} event {tx_hash} is missing required field `{field}`")]
    MissingField {
        category: EventCategory,
        tx_hash: String,
        field: &'static str,
    },

    #[error("{category} event {tx_hash} has invalid `{field}` value {value:?}")]
    InvalidField {
        category: EventCategory,
        tx_hash: String,
        field: &'static str,
        value: String,
    },
}

impl NormalizeError {
    /// Transaction hash of the offending record, when known.
    pub fn transaction_hash(&self) -> Option<&str> {
        match self {
            NormalizeError::MissingTransactionHash { .. } => None,
            NormalizeError::MissingBlockNumber { tx_hash, .. }
            | NormalizeError::MissingField { tx_hash, .. }
            | NormalizeError::InvalidField { tx_hash, .. } => Some(tx_hash),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldValue {
    Address(Address),
    Amount(U256),
    Flag(bool),
}

/// Parsed payload keyed by canonical field name.
struct Fields<'a> {
    category: EventCategory,
    tx_hash: &'a str,
    values: HashMap<&'static str, FieldValue>,
}

impl Fields<'_> {
    fn missing(&self, field: &'static str) -> NormalizeError {
        NormalizeError::MissingField {
            category: self.category,
            tx_hash: self.tx_hash.to_string(),
            field,
        }
    }

    fn address(&self, field: &'static str) -> Result<Address, NormalizeError> {
        match self.values.get(field) {
            Some(FieldValue::Address(a)) => Ok(*a),
            _ => Err(self.missing(field)),
        }
    }

    fn amount(&self, field: &'static str) -> Result<U256, NormalizeError> {
        self.optional_amount(field).ok_or_else(|| self.missing(field))
    }

    fn optional_amount(&self, field: &'static str) -> Option<U256> {
        match self.values.get(field) {
            Some(FieldValue::Amount(v)) => Some(*v),
            _ => None,
        }
    }

    fn flag(&self, field: &'static str) -> Result<bool, NormalizeError> {
        match self.values.get(field) {
            Some(FieldValue::Flag(b)) => Ok(*b),
            _ => Err(self.missing(field)),
        }
    }
}

impl EventSchema {
    /// Schema for a category.
    pub fn for_category(category: EventCategory) -> &'static EventSchema {
        match category {
            EventCategory::LiquidationCreated => &LIQUIDATION_CREATED,
            EventCategory::LiquidationDisputed => &LIQUIDATION_DISPUTED,
            EventCategory::DisputeSettled => &DISPUTE_SETTLED,
        }
    }

    /// Normalize a raw ledger entry into a typed record.
    pub fn normalize(&self, raw: &RawLogEntry) -> Result<EventRecord, NormalizeError> {
        let category = self.category;
        let tx_hash = raw
            .transaction_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(NormalizeError::MissingTransactionHash { category })?;
        let block_number = raw.block_number.ok_or_else(|| NormalizeError::MissingBlockNumber {
            category,
            tx_hash: tx_hash.to_string(),
        })?;

        let mut values = HashMap::with_capacity(self.fields.len());
        for field_spec in self.fields {
            let Some(text) = raw.fields.get(field_spec.source) else {
                if field_spec.required {
                    return Err(NormalizeError::MissingField {
                        category,
                        tx_hash: tx_hash.to_string(),
                        field: field_spec.canonical,
                    });
                }
                continue;
            };
            let value = parse_value(field_spec.kind, text).ok_or_else(|| NormalizeError::InvalidField {
                category,
                tx_hash: tx_hash.to_string(),
                field: field_spec.canonical,
                value: text.clone(),
            })?;
            values.insert(field_spec.canonical, value);
        }

        let fields = Fields { category, tx_hash, values };
        let transaction_hash = tx_hash.to_string();
        let log_index = raw.log_index;
        let block_timestamp = raw.block_timestamp;

        let record = match category {
            EventCategory::LiquidationCreated => EventRecord::LiquidationCreated(LiquidationEvent {
                transaction_hash,
                block_number,
                log_index,
                block_timestamp,
                sponsor: fields.address("sponsor")?,
                liquidator: fields.address("liquidator")?,
                liquidation_id: fields.amount("liquidation_id")?,
                tokens_outstanding: fields.amount("tokens_outstanding")?,
                locked_collateral: fields.amount("locked_collateral")?,
                liquidated_collateral: fields.optional_amount("liquidated_collateral"),
            }),
            EventCategory::LiquidationDisputed => EventRecord::LiquidationDisputed(DisputeEvent {
                transaction_hash,
                block_number,
                log_index,
                block_timestamp,
                sponsor: fields.address("sponsor")?,
                liquidator: fields.address("liquidator")?,
                disputer: fields.address("disputer")?,
                liquidation_id: fields.amount("liquidation_id")?,
                dispute_bond_amount: fields.amount("dispute_bond_amount")?,
            }),
            EventCategory::DisputeSettled => EventRecord::DisputeSettled(DisputeSettlementEvent {
                transaction_hash,
                block_number,
                log_index,
                block_timestamp,
                caller: fields.address("caller")?,
                sponsor: fields.address("sponsor")?,
                liquidator: fields.address("liquidator")?,
                disputer: fields.address("disputer")?,
                liquidation_id: fields.amount("liquidation_id")?,
                dispute_succeeded: fields.flag("dispute_succeeded")?,
            }),
        };

        Ok(record)
    }
}

fn parse_value(kind: FieldKind, text: &str) -> Option<FieldValue> {
    let text = text.trim();
    match kind {
        FieldKind::Address => Address::from_str(text).ok().map(FieldValue::Address),
        FieldKind::Amount => U256::from_str_radix(text, 10).ok().map(FieldValue::Amount),
        FieldKind::Flag => match text.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(FieldValue::Flag(true)),
            "false" | "0" => Some(FieldValue::Flag(false)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const SPONSOR: &str = "0x34D7b4d6C38db204b19Fe040F4Ae4246417Dd718";
    const LIQUIDATOR: &str = "0x6e4400769c2cf2296b7071768d8769ebe06daa92";

    fn liquidation_entry() -> RawLogEntry {
        let mut fields = BTreeMap::new();
        fields.insert("sponsor".to_string(), SPONSOR.to_string());
        fields.insert("liquidator".to_string(), LIQUIDATOR.to_string());
        fields.insert("liquidationId".to_string(), "0".to_string());
        fields.insert("tokensOutstanding".to_string(), "50000000000000000000".to_string());
        fields.insert("lockedCollateral".to_string(), "10000000000000000000".to_string());
        RawLogEntry {
            transaction_hash: Some("0xa".to_string()),
            block_number: Some(10),
            log_index: Some(0),
            block_timestamp: None,
            fields,
        }
    }

    #[test]
    fn test_normalize_liquidation() {
        let schema = EventSchema::for_category(EventCategory::LiquidationCreated);
        let record = schema.normalize(&liquidation_entry()).unwrap();

        let EventRecord::LiquidationCreated(event) = record else {
            panic!("wrong variant");
        };
        assert_eq!(event.transaction_hash, "0xa");
        assert_eq!(event.block_number, 10);
        assert_eq!(event.sponsor, Address::from_str(SPONSOR).unwrap());
        assert_eq!(event.tokens_outstanding, U256::from(50_000_000_000_000_000_000u128));
        assert_eq!(event.liquidated_collateral, None);
    }

    #[test]
    fn test_missing_required_field() {
        let mut entry = liquidation_entry();
        entry.fields.remove("lockedCollateral");

        let err = EventSchema::for_category(EventCategory::LiquidationCreated)
            .normalize(&entry)
            .unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                category: EventCategory::LiquidationCreated,
                tx_hash: "0xa".to_string(),
                field: "locked_collateral",
            }
        );
        assert_eq!(err.transaction_hash(), Some("0xa"));
    }

    #[test]
    fn test_invalid_amount() {
        let mut entry = liquidation_entry();
        entry.fields.insert("tokensOutstanding".to_string(), "12.5".to_string());

        let err = EventSchema::for_category(EventCategory::LiquidationCreated)
            .normalize(&entry)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidField { field: "tokens_outstanding", .. }));
    }

    #[test]
    fn test_missing_transaction_hash() {
        let mut entry = liquidation_entry();
        entry.transaction_hash = None;

        let err = EventSchema::for_category(EventCategory::LiquidationCreated)
            .normalize(&entry)
            .unwrap_err();
        assert_eq!(err.transaction_hash(), None);
    }

    #[test]
    fn test_settlement_flag_parsing() {
        let mut fields = BTreeMap::new();
        for key in ["caller", "sponsor", "liquidator", "disputer"] {
            fields.insert(key.to_string(), SPONSOR.to_string());
        }
        fields.insert("liquidationId".to_string(), "3".to_string());
        fields.insert("DisputeSucceeded".to_string(), "False".to_string());
        let entry = RawLogEntry {
            transaction_hash: Some("0xb".to_string()),
            block_number: Some(7),
            log_index: None,
            block_timestamp: Some(1_600_000_000),
            fields,
        };

        let record = EventSchema::for_category(EventCategory::DisputeSettled)
            .normalize(&entry)
            .unwrap();
        let EventRecord::DisputeSettled(event) = record else {
            panic!("wrong variant");
        };
        assert!(!event.dispute_succeeded);
        assert_eq!(event.liquidation_id, U256::from(3u64));
        assert_eq!(event.block_timestamp, Some(1_600_000_000));
    }
}
