//! Wallet Lookups
//!
//! On-chain balances for tracked addresses. Only a placeholder lookup ships:
//! it validates the address and reports an empty ETH position.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{CashError, Result};
use crate::model::Holding;

#[async_trait]
pub trait WalletLookup: Send + Sync {
    async fn holdings(&self, address: &str) -> Result<Vec<Holding>>;
}

/// Reports a zero ETH balance for every well-formed address
pub struct PlaceholderWallets;

#[async_trait]
impl WalletLookup for PlaceholderWallets {
    async fn holdings(&self, address: &str) -> Result<Vec<Holding>> {
        let address = address.trim();
        validate_address(address)?;
        tracing::info!(wallet = %abbreviate(address), "Checking wallet");

        Ok(vec![Holding::new(
            "ETH",
            Decimal::ZERO,
            Decimal::ZERO,
            format!("wallet:{}", abbreviate(address)),
        )])
    }
}

fn validate_address(address: &str) -> Result<()> {
    let invalid = |message: &str| CashError::Wallet {
        address: address.to_string(),
        message: message.to_string(),
    };

    if address.len() < 14 {
        return Err(invalid("address too short"));
    }
    if !address.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("address contains invalid characters"));
    }
    Ok(())
}

/// `0x123456...abcdef` form: first 8 and last 6 characters
pub fn abbreviate(address: &str) -> String {
    match (address.get(..8), address.get(address.len().saturating_sub(6)..)) {
        (Some(head), Some(tail)) if address.len() > 14 => format!("{head}...{tail}"),
        _ => address.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[tokio::test]
    async fn test_placeholder_holding() {
        let holdings = PlaceholderWallets.holdings(ADDRESS).await.unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].asset, "ETH");
        assert_eq!(holdings[0].value_usd, Decimal::ZERO);
        assert_eq!(holdings[0].source, "wallet:0x123456...345678");
    }

    #[tokio::test]
    async fn test_malformed_address_rejected() {
        for bad in ["", "0x12", "0x1234 5678 90ab cdef"] {
            let err = PlaceholderWallets.holdings(bad).await.unwrap_err();
            assert!(matches!(err, CashError::Wallet { .. }), "{bad:?} accepted");
        }
    }
}
