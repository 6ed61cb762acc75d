//! Conversion between the decimal ether amounts people type and the wei
//! amounts the contract stores.

use crate::error::{
    Result,
    StorefrontError,
};
use alloy::primitives::{
    U256,
    utils::{
        format_units,
        parse_units,
    },
};
use card_abi::PRICE_DECIMALS;

/// Parses a non-negative decimal ether amount into wei.
pub fn to_smallest_unit(text: &str) -> Result<U256> {
    let raw = text.trim();
    if raw.is_empty() {
        return Err(StorefrontError::InvalidInput("price is required".into()));
    }
    if raw.starts_with('-') || raw.starts_with('+') {
        return Err(StorefrontError::InvalidInput(format!(
            "price must be a plain unsigned number, got {raw:?}"
        )));
    }
    if let Some((_, fraction)) = raw.split_once('.')
        && fraction.len() > PRICE_DECIMALS as usize
    {
        return Err(StorefrontError::InvalidInput(format!(
            "price {raw:?} has more than {PRICE_DECIMALS} decimal places"
        )));
    }
    let parsed = parse_units(raw, PRICE_DECIMALS).map_err(|e| {
        StorefrontError::InvalidInput(format!("price {raw:?} is not a number: {e}"))
    })?;
    Ok(parsed.into())
}

/// Formats wei as ether without trailing zeros, e.g. `1.2` or `3`.
pub fn from_smallest_unit(wei: U256) -> String {
    let formatted = format_units(wei, PRICE_DECIMALS)
        .unwrap_or_else(|_| wei.to_string());
    trim_decimal(&formatted)
}

fn trim_decimal(s: &str) -> String {
    match s.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;

    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn to_smallest_unit__half_ether__scales_by_18_decimals() {
        assert_eq!(to_smallest_unit("0.5"), Ok(U256::from(ONE_ETHER / 2)));
    }

    #[test]
    fn to_smallest_unit__one_point_two__is_exact() {
        assert_eq!(
            to_smallest_unit("1.2"),
            Ok(U256::from(1_200_000_000_000_000_000u128))
        );
    }

    #[test]
    fn to_smallest_unit__surrounding_whitespace__is_ignored() {
        assert_eq!(to_smallest_unit("  2 "), Ok(U256::from(2 * ONE_ETHER)));
    }

    #[test]
    fn to_smallest_unit__zero__is_allowed() {
        assert_eq!(to_smallest_unit("0"), Ok(U256::ZERO));
        assert_eq!(to_smallest_unit("0.000"), Ok(U256::ZERO));
    }

    #[test]
    fn to_smallest_unit__rejects_empty_negative_and_garbage() {
        for input in ["", "   ", "-1", "+1", "abc", "1.2.3"] {
            let result = to_smallest_unit(input);
            assert!(
                matches!(result, Err(StorefrontError::InvalidInput(_))),
                "{input:?} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn to_smallest_unit__too_many_decimals__is_rejected() {
        // given
        let input = "0.0000000000000000001";

        // when
        let result = to_smallest_unit(input);

        // then
        assert!(matches!(result, Err(StorefrontError::InvalidInput(_))));
    }

    #[test]
    fn to_smallest_unit__smallest_amount__is_one_wei() {
        assert_eq!(to_smallest_unit("0.000000000000000001"), Ok(U256::from(1)));
    }

    #[test]
    fn from_smallest_unit__trims_trailing_zeros() {
        assert_eq!(from_smallest_unit(U256::from(1_200_000_000_000_000_000u128)), "1.2");
        assert_eq!(from_smallest_unit(U256::from(3 * ONE_ETHER)), "3");
        assert_eq!(from_smallest_unit(U256::ZERO), "0");
        assert_eq!(from_smallest_unit(U256::from(1)), "0.000000000000000001");
    }

    proptest! {
        #[test]
        fn displayed_price_converts_back_to_the_same_wei(wei in any::<u128>()) {
            let shown = from_smallest_unit(U256::from(wei));
            prop_assert_eq!(to_smallest_unit(&shown), Ok(U256::from(wei)));
        }
    }
}
