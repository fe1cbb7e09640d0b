//! Liquidity-pool flash lender
//!
//! Lends from its own ledger balance, calls the borrower back, then pulls
//! `amount + fee` through the borrower's allowance. Every failure after
//! the snapshot restores the ledger, so a cycle either settles in full or
//! leaves no trace.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use super::bank::Bank;
use crate::domain::assets::AssetLedger;
use crate::domain::lending::{compute_flash_fee, FeeRounding, FlashBorrower, FlashLender};
use crate::shared::errors::{ExecutionError, LendingError};
use crate::shared::types::{AccountId, Amount, AssetId};

pub struct PoolLender {
    address: AccountId,
    bank: Arc<Bank>,
    fee_bps: u16,
    rounding: FeeRounding,
    lock: Mutex<()>,
}

impl PoolLender {
    pub fn new(address: AccountId, bank: Arc<Bank>, fee_bps: u16, rounding: FeeRounding) -> Self {
        Self {
            address,
            bank,
            fee_bps,
            rounding,
            lock: Mutex::new(()),
        }
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    pub fn rounding(&self) -> FeeRounding {
        self.rounding
    }

    /// Lendable balance of `asset`
    pub fn liquidity(&self, asset: &AssetId) -> Amount {
        self.bank.balance_of(&self.address, asset)
    }

    fn lend_and_collect(
        &self,
        receiver: &dyn FlashBorrower,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        params: &[u8],
        pool_before: Amount,
    ) -> Result<(), ExecutionError> {
        self.bank.transfer(&self.address, receiver.address(), asset, amount)?;

        receiver.on_loan_received(&self.address, asset, amount, fee, params)?;

        let owed = amount.checked_add(fee).ok_or(LendingError::FeeOverflow)?;
        self.bank
            .transfer_from(&self.address, receiver.address(), &self.address, asset, owed)
            .map_err(|source| {
                warn!(error = %source, "flash loan repayment pull failed");
                LendingError::RepaymentFailed { owed, source }
            })?;

        let expected = pool_before.checked_add(fee).ok_or(LendingError::FeeOverflow)?;
        let pool_after = self.liquidity(asset);
        if pool_after < expected {
            return Err(LendingError::NotRepaid {
                expected,
                actual: pool_after,
            }
            .into());
        }
        Ok(())
    }
}

impl FlashLender for PoolLender {
    fn address(&self) -> &AccountId {
        &self.address
    }

    fn flash_fee(&self, _asset: &AssetId, amount: Amount) -> Result<Amount, LendingError> {
        compute_flash_fee(amount, self.fee_bps, self.rounding)
    }

    fn flash_loan(
        &self,
        receiver: &dyn FlashBorrower,
        asset: &AssetId,
        amount: Amount,
        params: &[u8],
    ) -> Result<(), ExecutionError> {
        let _lock = self.lock.try_lock().ok_or(LendingError::Reentrant)?;

        if amount.is_zero() {
            return Err(LendingError::InvalidAmount.into());
        }
        let pool_before = self.liquidity(asset);
        if pool_before < amount {
            return Err(LendingError::InsufficientLiquidity {
                requested: amount,
                available: pool_before,
            }
            .into());
        }
        let fee = self.flash_fee(asset, amount)?;
        if fee.is_zero() && self.fee_bps > 0 {
            return Err(LendingError::FeeRoundsToZero {
                amount,
                fee_bps: self.fee_bps,
            }
            .into());
        }

        debug!(
            lender = %self.address,
            receiver = %receiver.address(),
            %asset,
            %amount,
            %fee,
            "issuing flash loan"
        );

        let snapshot = self.bank.snapshot();
        let result = self.lend_and_collect(receiver, asset, amount, fee, params, pool_before);
        if let Err(e) = &result {
            debug!(error = %e, "flash loan reverted");
            self.bank.restore(snapshot);
        }
        result
    }
}
