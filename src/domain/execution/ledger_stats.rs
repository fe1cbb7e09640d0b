//! Executor-wide cycle accounting

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::shared::types::{Amount, AssetId};

/// Running totals over successful cycles. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    total_executions: u64,
    volume: BTreeMap<AssetId, u128>,
    profit: BTreeMap<AssetId, u128>,
    fees_paid: BTreeMap<AssetId, u128>,
    last_cycle_at: Option<DateTime<Utc>>,
}

impl LedgerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(
        &mut self,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        profit: Amount,
        at: DateTime<Utc>,
    ) {
        self.total_executions = self.total_executions.saturating_add(1);
        Self::accumulate(&mut self.volume, asset, amount);
        Self::accumulate(&mut self.profit, asset, profit);
        Self::accumulate(&mut self.fees_paid, asset, fee);
        self.last_cycle_at = Some(at);
    }

    fn accumulate(totals: &mut BTreeMap<AssetId, u128>, asset: &AssetId, amount: Amount) {
        let total = totals.entry(asset.clone()).or_insert(0);
        *total = total.saturating_add(amount.value() as u128);
    }

    pub fn total_executions(&self) -> u64 {
        self.total_executions
    }

    pub fn total_volume(&self, asset: &AssetId) -> u128 {
        self.volume.get(asset).copied().unwrap_or(0)
    }

    pub fn total_profit(&self, asset: &AssetId) -> u128 {
        self.profit.get(asset).copied().unwrap_or(0)
    }

    pub fn total_fees_paid(&self, asset: &AssetId) -> u128 {
        self.fees_paid.get(asset).copied().unwrap_or(0)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.volume.keys()
    }

    pub fn last_cycle_at(&self) -> Option<DateTime<Utc>> {
        self.last_cycle_at
    }
}
