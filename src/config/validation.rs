//! Configuration validation.
//!
//! Returns every problem at once so an operator can fix a file in one pass.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::config::schema::MonitorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if url::Url::parse(&config.blockchain.rpc_url).is_err() {
        errors.push(ValidationError::new("blockchain.rpc_url", "not a valid URL"));
    }
    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be greater than 0"));
    }

    if Address::from_str(&config.contract.address).is_err() {
        errors.push(ValidationError::new("contract.address", "not a valid address"));
    }
    if config.contract.polling_interval_secs == 0 {
        errors.push(ValidationError::new("contract.polling_interval_secs", "must be greater than 0"));
    }

    let rules = &config.monitor;
    if rules.check_interval_secs == 0 {
        errors.push(ValidationError::new("monitor.check_interval_secs", "must be greater than 0"));
    }
    for (field, addresses) in [
        ("monitor.monitored_liquidators", &rules.monitored_liquidators),
        ("monitor.monitored_disputers", &rules.monitored_disputers),
    ] {
        for address in addresses {
            if Address::from_str(address).is_err() {
                errors.push(ValidationError::new(field, format!("'{}' is not a valid address", address)));
            }
        }
    }
    if rules.amount_decimals > 77 {
        errors.push(ValidationError::new("monitor.amount_decimals", "must be at most 77"));
    }
    match Decimal::from_str(&rules.price) {
        Ok(price) if price > Decimal::ZERO => {}
        _ => errors.push(ValidationError::new("monitor.price", "must be a positive decimal")),
    }
    if url::Url::parse(&rules.explorer_url).is_err() {
        errors.push(ValidationError::new("monitor.explorer_url", "not a valid URL"));
    }

    if let Some(webhook) = &config.alerts.webhook_url {
        if url::Url::parse(webhook).is_err() {
            errors.push(ValidationError::new("alerts.webhook_url", "not a valid URL"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a valid socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
