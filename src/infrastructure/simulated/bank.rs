//! In-memory asset ledger

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::assets::AssetLedger;
use crate::shared::errors::LedgerError;
use crate::shared::types::{AccountId, Amount, AssetId};

type BalanceKey = (AccountId, AssetId);
type AllowanceKey = (AccountId, AccountId, AssetId);

/// Full ledger state, cheap enough to clone for a rollback point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankState {
    balances: HashMap<BalanceKey, Amount>,
    allowances: HashMap<AllowanceKey, Amount>,
}

/// Token ledger shared by every simulated participant
#[derive(Debug, Default)]
pub struct Bank {
    state: RwLock<BankState>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` out of thin air (environment setup only)
    pub fn mint(
        &self,
        account: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let balance = state
            .balances
            .entry((account.clone(), asset.clone()))
            .or_insert(Amount::ZERO);
        *balance = balance.checked_add(amount).ok_or_else(|| LedgerError::Overflow {
            account: account.clone(),
            asset: asset.clone(),
        })?;
        Ok(())
    }

    pub fn snapshot(&self) -> BankState {
        self.state.read().clone()
    }

    pub fn restore(&self, snapshot: BankState) {
        *self.state.write() = snapshot;
    }

    /// Non-zero balances of `account`, sorted by asset
    pub fn balances_of(&self, account: &AccountId) -> Vec<(AssetId, Amount)> {
        let state = self.state.read();
        let mut balances: Vec<_> = state
            .balances
            .iter()
            .filter(|((owner, _), amount)| owner == account && !amount.is_zero())
            .map(|((_, asset), amount)| (asset.clone(), *amount))
            .collect();
        balances.sort();
        balances
    }

    fn move_funds(
        state: &mut BankState,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let from_key = (from.clone(), asset.clone());
        let available = state.balances.get(&from_key).copied().unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                account: from.clone(),
                asset: asset.clone(),
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }

        let to_key = (to.clone(), asset.clone());
        let credited = state
            .balances
            .get(&to_key)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                account: to.clone(),
                asset: asset.clone(),
            })?;

        state.balances.insert(from_key, remaining);
        state.balances.insert(to_key, credited);
        Ok(())
    }
}

impl AssetLedger for Bank {
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Amount {
        self.state
            .read()
            .balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId, asset: &AssetId) -> Amount {
        self.state
            .read()
            .allowances
            .get(&(owner.clone(), spender.clone(), asset.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        Self::move_funds(&mut self.state.write(), from, to, asset, amount)
    }

    fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let key = (owner.clone(), spender.clone(), asset.clone());
        let mut state = self.state.write();
        if amount.is_zero() {
            state.allowances.remove(&key);
        } else {
            state.allowances.insert(key, amount);
        }
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let key = (from.clone(), spender.clone(), asset.clone());
        let allowed = state.allowances.get(&key).copied().unwrap_or_default();
        let remaining = allowed
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                asset: asset.clone(),
                needed: amount,
                allowed,
            })?;

        Self::move_funds(&mut state, from, to, asset, amount)?;
        if remaining.is_zero() {
            state.allowances.remove(&key);
        } else {
            state.allowances.insert(key, remaining);
        }
        Ok(())
    }
}
