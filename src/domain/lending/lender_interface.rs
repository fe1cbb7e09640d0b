//! Flash lender and borrower interfaces

use crate::shared::errors::{ExecutionError, LendingError};
use crate::shared::types::{AccountId, Amount, AssetId};

/// Flash-loan provider.
///
/// `flash_loan` transfers `amount` to the receiver, invokes
/// [`FlashBorrower::on_loan_received`], then collects `amount + fee`.
/// If the callback fails or repayment falls short, every ledger effect
/// of the call is undone before the error is returned.
pub trait FlashLender: Send + Sync {
    fn address(&self) -> &AccountId;

    fn flash_fee(&self, asset: &AssetId, amount: Amount) -> Result<Amount, LendingError>;

    fn flash_loan(
        &self,
        receiver: &dyn FlashBorrower,
        asset: &AssetId,
        amount: Amount,
        params: &[u8],
    ) -> Result<(), ExecutionError>;
}

/// Receiver side of a flash loan
pub trait FlashBorrower: Send + Sync {
    fn address(&self) -> &AccountId;

    /// Invoked by the lender with the funds already transferred in.
    /// `Ok(())` signals the loan can be collected; an error reverts it.
    fn on_loan_received(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        params: &[u8],
    ) -> Result<(), ExecutionError>;
}
