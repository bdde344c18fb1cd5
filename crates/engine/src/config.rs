//! Business-rule configuration.
//!
//! Everything tunable lives here: fee rate, amount limits, resolution
//! delays and outcome probabilities, pagination and network timeout. The
//! defaults mirror the product rules; tests pin the probabilities to 0.0
//! or 1.0 to force an outcome.

use std::time::Duration;

use crate::{Money, ResultWallet, WalletError};

#[derive(Clone, Debug, PartialEq)]
pub struct WalletConfig {
    /// Transfer fee, as a percentage of the amount (2.0 = 2%).
    pub fee_percentage: f64,
    pub min_transfer: Money,
    pub max_transfer: Money,
    pub min_deposit: Money,
    pub max_deposit: Money,
    pub items_per_page: usize,
    /// Gateway call timeout.
    pub network_timeout: Duration,
    pub deposit_resolve_delay: Duration,
    pub transfer_resolve_delay: Duration,
    pub retry_resolve_delay: Duration,
    /// Probability a transfer resolution fails.
    pub transfer_failure_probability: f64,
    /// Probability a retry resolution succeeds.
    pub retry_success_probability: f64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            fee_percentage: 2.0,
            min_transfer: Money::new(1_00),
            max_transfer: Money::new(10_000_00),
            min_deposit: Money::new(1_00),
            max_deposit: Money::new(100_000_00),
            items_per_page: 10,
            network_timeout: Duration::from_secs(10),
            deposit_resolve_delay: Duration::from_millis(1500),
            transfer_resolve_delay: Duration::from_millis(2000),
            retry_resolve_delay: Duration::from_millis(1500),
            transfer_failure_probability: 0.1,
            retry_success_probability: 0.8,
        }
    }
}

impl WalletConfig {
    /// Computes the transfer fee for `amount`, rounded to 2 decimals.
    #[must_use]
    pub fn calculate_fee(&self, amount: Money) -> Money {
        Money::new((amount.cents() as f64 * self.fee_percentage / 100.0).round() as i64)
    }

    /// Amount plus its fee.
    #[must_use]
    pub fn total_with_fee(&self, amount: Money) -> Money {
        amount + self.calculate_fee(amount)
    }

    /// Caller-side deposit check against the configured limits.
    ///
    /// The engine itself only checks positivity; presentation calls this
    /// before invoking `deposit`.
    pub fn validate_deposit_amount(&self, amount: Money) -> ResultWallet<()> {
        if !amount.is_positive() {
            return Err(WalletError::Validation(
                "Amount must be greater than 0".to_string(),
            ));
        }
        if amount < self.min_deposit {
            return Err(WalletError::Validation(format!(
                "Minimum amount is {}",
                self.min_deposit
            )));
        }
        if amount > self.max_deposit {
            return Err(WalletError::Validation(format!(
                "Maximum amount is {}",
                self.max_deposit
            )));
        }
        Ok(())
    }

    /// Caller-side transfer check: limits plus affordability of
    /// amount + fee at the current balance.
    pub fn validate_transfer_amount(&self, amount: Money, balance: Money) -> ResultWallet<()> {
        if !amount.is_positive() {
            return Err(WalletError::Validation(
                "Please enter a valid amount".to_string(),
            ));
        }
        if amount < self.min_transfer {
            return Err(WalletError::Validation(format!(
                "Minimum transfer amount is {}",
                self.min_transfer
            )));
        }
        if amount > self.max_transfer {
            return Err(WalletError::Validation(format!(
                "Maximum transfer limit is {}",
                self.max_transfer
            )));
        }
        let total = self.total_with_fee(amount);
        if total > balance {
            return Err(WalletError::Validation(format!(
                "Insufficient balance. Required: {total}, Available: {balance}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_two_percent_rounded() {
        let config = WalletConfig::default();
        assert_eq!(config.calculate_fee(Money::from_major(500.50)), Money::new(10_01));
        assert_eq!(config.calculate_fee(Money::from_major(1000.0)), Money::new(20_00));
        assert_eq!(config.total_with_fee(Money::from_major(1000.0)), Money::new(1020_00));
    }

    #[test]
    fn transfer_validation_enforces_limits() {
        let config = WalletConfig::default();
        let balance = Money::from_major(5000.0);

        assert!(config.validate_transfer_amount(Money::from_major(100.0), balance).is_ok());
        assert_eq!(
            config.validate_transfer_amount(Money::from_major(0.5), balance),
            Err(WalletError::Validation(
                "Minimum transfer amount is ₹1.00".to_string()
            ))
        );
        assert_eq!(
            config.validate_transfer_amount(Money::from_major(10_001.0), balance),
            Err(WalletError::Validation(
                "Maximum transfer limit is ₹10000.00".to_string()
            ))
        );
    }

    #[test]
    fn transfer_validation_requires_amount_plus_fee() {
        let config = WalletConfig::default();
        // 1000 + 2% fee = 1020, one paisa short.
        let result =
            config.validate_transfer_amount(Money::from_major(1000.0), Money::new(1019_99));
        assert_eq!(
            result,
            Err(WalletError::Validation(
                "Insufficient balance. Required: ₹1020.00, Available: ₹1019.99".to_string()
            ))
        );
    }

    #[test]
    fn deposit_validation_enforces_limits() {
        let config = WalletConfig::default();

        assert!(config.validate_deposit_amount(Money::from_major(1.0)).is_ok());
        assert!(config.validate_deposit_amount(Money::from_major(100_000.0)).is_ok());
        assert!(config.validate_deposit_amount(Money::from_major(0.5)).is_err());
        assert!(config.validate_deposit_amount(Money::from_major(100_001.0)).is_err());
    }
}
