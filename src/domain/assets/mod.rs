//! Asset ledger domain - balances and allowances the cycle moves funds through

use crate::shared::errors::LedgerError;
use crate::shared::types::{AccountId, Amount, AssetId};

/// Token ledger shared by the executor, the lender and the venues.
///
/// Mirrors the ERC20 surface the flash-loan pattern relies on: plain
/// transfers, allowances, and allowance-based pulls.
pub trait AssetLedger: Send + Sync {
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Amount;

    fn allowance(&self, owner: &AccountId, spender: &AccountId, asset: &AssetId) -> Amount;

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Set (not increase) the allowance of `spender` over `owner`'s `asset`
    fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to`, consuming `spender`'s allowance
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}
