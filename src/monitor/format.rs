//! Number and link formatting for alert bodies.

use alloy::primitives::{Address, U256};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Collateralization ratio as a percentage, truncated to two decimals.
///
/// `locked_collateral / (tokens_outstanding * price) * 100`. Returns `None`
/// when the debt value is zero or an operand does not fit a `Decimal`.
pub fn collateralization_ratio(locked_collateral: U256, tokens_outstanding: U256, price: Decimal) -> Option<Decimal> {
    let collateral = Decimal::from_str(&locked_collateral.to_string()).ok()?;
    let tokens = Decimal::from_str(&tokens_outstanding.to_string()).ok()?;

    let debt_value = tokens.checked_mul(price)?;
    if debt_value.is_zero() {
        return None;
    }

    let ratio = collateral
        .checked_mul(Decimal::ONE_HUNDRED)?
        .checked_div(debt_value)?
        .round_dp_with_strategy(2, RoundingStrategy::ToZero);
    Some(ratio)
}

/// `"388.88%"`, or `"N/A"` when no ratio could be computed.
pub fn format_ratio(ratio: Option<Decimal>) -> String {
    match ratio {
        Some(mut r) => {
            r.rescale(2);
            format!("{}%", r)
        }
        None => "N/A".to_string(),
    }
}

/// Render a base-unit amount with `decimals` decimals, truncated to two places.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);

    let mut cents: String = fraction.chars().take(2).collect();
    while cents.len() < 2 {
        cents.push('0');
    }
    format!("{}.{}", whole, cents)
}

/// `0x6e44...Aa92` form of a checksummed address or hash.
pub fn shorten(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 12 {
        return text.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Markdown link to an address on the block explorer.
pub fn address_link(explorer_url: &str, address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("<{}/address/{}|{}>", explorer_url.trim_end_matches('/'), full, shorten(&full))
}

/// Markdown link to a transaction on the block explorer.
pub fn tx_link(explorer_url: &str, tx_hash: &str) -> String {
    format!("<{}/tx/{}|{}>", explorer_url.trim_end_matches('/'), tx_hash, shorten(tx_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio_exact() {
        let ratio = collateralization_ratio(U256::from(150u64), U256::from(50u64), dec!(1));
        assert_eq!(format_ratio(ratio), "300.00%");
    }

    #[test]
    fn test_ratio_truncates() {
        let ratio = collateralization_ratio(U256::from(175u64), U256::from(45u64), dec!(1));
        assert_eq!(ratio, Some(dec!(388.88)));
        assert_eq!(format_ratio(ratio), "388.88%");
    }

    #[test]
    fn test_ratio_with_price_and_wei_amounts() {
        let collateral = U256::from(10_000_000_000_000_000_000u128);
        let tokens = U256::from(50_000_000_000_000_000_000u128);
        assert_eq!(format_ratio(collateralization_ratio(collateral, tokens, dec!(1))), "20.00%");
        assert_eq!(format_ratio(collateralization_ratio(collateral, tokens, dec!(0.5))), "40.00%");
    }

    #[test]
    fn test_ratio_zero_debt() {
        assert_eq!(collateralization_ratio(U256::from(1u64), U256::ZERO, dec!(1)), None);
        assert_eq!(format_ratio(None), "N/A");
    }

    #[test]
    fn test_ratio_overflow_is_none() {
        assert_eq!(collateralization_ratio(U256::MAX, U256::from(1u64), dec!(1)), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(U256::from(10_000_000_000_000_000_000u128), 18), "10.00");
        assert_eq!(format_amount(U256::from(1_239_000_000_000_000_000u128), 18), "1.23");
        assert_eq!(format_amount(U256::from(5u64), 18), "0.00");
        assert_eq!(format_amount(U256::from(150u64), 0), "150.00");
        assert_eq!(format_amount(U256::from(1505u64), 2), "15.05");
    }

    #[test]
    fn test_links() {
        let address = Address::from_str("0x6e4400769c2cf2296b7071768d8769ebe06daa92").unwrap();
        let link = address_link("https://etherscan.io/", &address);
        assert_eq!(
            link,
            "<https://etherscan.io/address/0x6e4400769c2Cf2296b7071768d8769eBE06DAa92|0x6e44...Aa92>"
        );

        let tx = "0x26fd295691795e24590980bafd4cde2259b26a1c957a8c10af70fedc79ba02e6";
        assert_eq!(
            tx_link("https://etherscan.io", tx),
            format!("<https://etherscan.io/tx/{}|0x26fd...02e6>", tx)
        );
        assert_eq!(shorten("0xA"), "0xA");
    }

    #[test]
    fn test_shorten_counts_characters() {
        assert_eq!(shorten("0xéééééééééééé"), "0xéééé...éééé");
        assert_eq!(shorten("0x🦀🦀🦀🦀🦀🦀🦀🦀🦀🦀🦀"), "0x🦀🦀🦀🦀...🦀🦀🦀🦀");
    }
}
