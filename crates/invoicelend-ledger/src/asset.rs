//! External asset ledger capability.
//!
//! The lending ledger moves stablecoin only through [`AssetLedger`]:
//! `balance` to check coverage and `transfer` to move funds. Transfers are
//! synchronous sub-calls inside the caller's transaction; a failure anywhere
//! reverts them, newest first, through [`AssetLedger::revert_transfer`].
//!
//! [`MemoryAssetLedger`] is the in-process implementation used by tests and
//! simulations. It tracks per-(token, holder) balances and the minted supply
//! of each token, and can verify that transfers conserve supply.

use std::collections::HashMap;

use invoicelend_types::{Address, Amount, InvoiceLendError, Result};

/// Stablecoin transfer capability exposed by an external asset ledger.
pub trait AssetLedger {
    /// Balance of `holder` in `token`.
    fn balance(&self, token: &Address, holder: &Address) -> Amount;

    /// Move `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` cannot cover `amount`, or
    /// `InvalidAmount` for a non-positive amount.
    fn transfer(&mut self, token: &Address, from: &Address, to: &Address, amount: Amount)
    -> Result<()>;

    /// Undo a transfer this ledger accepted earlier in the same transaction.
    /// Called newest first during rollback.
    ///
    /// # Errors
    /// Propagates the ledger's rejection of the compensating transfer.
    fn revert_transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        self.transfer(token, to, from, amount)
    }
}

/// In-memory asset ledger with supply tracking.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetLedger {
    /// Per-(token, holder) balances.
    balances: HashMap<(Address, Address), Amount>,
    /// Total minted per token.
    minted: HashMap<Address, Amount>,
}

impl MemoryAssetLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue new `token` to `to` (the issuer side of the stablecoin).
    ///
    /// # Errors
    /// Returns `InvalidAmount` for a non-positive amount and
    /// `ArithmeticOverflow` if a balance would overflow.
    pub fn mint(&mut self, token: &Address, to: &Address, amount: Amount) -> Result<()> {
        if !amount.is_positive() {
            return Err(InvoiceLendError::InvalidAmount(amount));
        }
        let overflow = || InvoiceLendError::ArithmeticOverflow {
            context: "asset mint",
        };
        let supply = self.minted.entry(*token).or_default();
        *supply = supply.checked_add(amount).ok_or_else(overflow)?;
        let entry = self.balances.entry((*token, *to)).or_default();
        *entry = entry.checked_add(amount).ok_or_else(overflow)?;
        Ok(())
    }

    /// Sum of all holders' balances of `token`.
    #[must_use]
    pub fn total_supply(&self, token: &Address) -> Amount {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .fold(Amount::ZERO, |acc, (_, bal)| {
                Amount::from_raw(acc.raw().saturating_add(bal.raw()))
            })
    }

    /// Check that holders' balances add up to what was minted.
    ///
    /// # Errors
    /// Returns `SupplyMismatch` describing the drift.
    pub fn verify_supply(&self, token: &Address) -> Result<()> {
        let expected = self.minted.get(token).copied().unwrap_or_default();
        let actual = self.total_supply(token);
        if actual != expected {
            return Err(InvoiceLendError::SupplyMismatch {
                token: *token,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl AssetLedger for MemoryAssetLedger {
    fn balance(&self, token: &Address, holder: &Address) -> Amount {
        self.balances
            .get(&(*token, *holder))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        if !amount.is_positive() {
            return Err(InvoiceLendError::InvalidAmount(amount));
        }
        let available = self.balance(token, from);
        if available < amount {
            return Err(InvoiceLendError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let credited = self
            .balance(token, to)
            .checked_add(amount)
            .ok_or(InvoiceLendError::ArithmeticOverflow {
                context: "asset transfer",
            })?;

        // Self-transfers are a no-op once coverage is established.
        if from == to {
            return Ok(());
        }
        let debited = Amount::from_raw(available.raw() - amount.raw());
        self.balances.insert((*token, *from), debited);
        self.balances.insert((*token, *to), credited);
        Ok(())
    }
}
