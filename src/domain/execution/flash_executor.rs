//! Flash-loan arbitrage executor
//!
//! One cycle: borrow from the configured lender, run the plan hop by hop
//! through authorized venues, prove the loan can be repaid with at least
//! the requested profit, approve the repayment, hand control back to the
//! lender. Any failure aborts the cycle and the lender undoes it.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cycle_guard::{CycleGuard, CyclePhase};
use super::execution_context::{ExecutionContext, HopReceipt};
use super::ledger_stats::LedgerStats;
use crate::domain::assets::AssetLedger;
use crate::domain::events::{EventSink, ExecutorEvent, TracingEventSink};
use crate::domain::lending::{FlashBorrower, FlashLender};
use crate::domain::plan::{quote_path, ArbitragePlan, PathHop, QuotedPlan, SwapStep};
use crate::domain::venue::{SwapRequest, SwapVenue, VenueInfo, VenueRegistry};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::errors::{ExecutionError, LendingError, VenueError};
use crate::shared::types::{AccountId, Amount, AssetId, LoanRequest, VenueId, BPS_DENOMINATOR};

/// Executor limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Absolute profit floor applied to every cycle
    pub min_profit: Amount,
    /// Profit floor relative to the loan amount
    pub min_profit_bps: u16,
    /// Highest lender fee the executor accepts, relative to the loan
    pub max_fee_bps: u16,
    pub max_hops: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            min_profit: Amount::ZERO,
            min_profit_bps: 0,
            max_fee_bps: 100,
            max_hops: 8,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.min_profit_bps as u64 > BPS_DENOMINATOR {
            return Err(ExecutionError::InvalidConfig(format!(
                "min_profit_bps {} exceeds {}",
                self.min_profit_bps, BPS_DENOMINATOR
            )));
        }
        if self.max_fee_bps as u64 > BPS_DENOMINATOR {
            return Err(ExecutionError::InvalidConfig(format!(
                "max_fee_bps {} exceeds {}",
                self.max_fee_bps, BPS_DENOMINATOR
            )));
        }
        if self.max_hops == 0 {
            return Err(ExecutionError::InvalidConfig("max_hops must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Profit the cycle must clear: the caller's figure raised to the
    /// configured absolute and relative floors
    fn effective_min_profit(
        &self,
        loan: Amount,
        requested: Amount,
    ) -> Result<Amount, ExecutionError> {
        let relative = loan
            .mul_bps_ceil(self.min_profit_bps)
            .ok_or(ExecutionError::ArithmeticOverflow)?;
        Ok(requested.max(self.min_profit).max(relative))
    }
}

/// Result of a completed cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReceipt {
    pub cycle_id: Uuid,
    pub asset: AssetId,
    pub amount: Amount,
    pub fee: Amount,
    pub amount_owed: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub profit: Amount,
    pub hops: Vec<HopReceipt>,
    pub completed_at: DateTime<Utc>,
}

/// Opaque parameters carried through the lender to the callback
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CyclePayload {
    cycle_id: Uuid,
    plan: ArbitragePlan,
    min_profit: Amount,
}

/// Loan this executor asked for and is waiting to receive
#[derive(Debug, Clone)]
struct PendingCycle {
    cycle_id: Uuid,
    request: LoanRequest,
    plan: ArbitragePlan,
}

/// Flash-loan arbitrage executor.
///
/// Entry points take `&self` so the executor can be shared; the busy flag
/// rejects every entry point while a cycle runs, and no internal lock is
/// held across a call into a venue or the lender.
pub struct FlashArbExecutor {
    address: AccountId,
    owner: AccountId,
    lender: Arc<dyn FlashLender>,
    lender_address: AccountId,
    ledger: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    config: RwLock<ExecutorConfig>,
    venues: RwLock<VenueRegistry>,
    stats: RwLock<LedgerStats>,
    paused: AtomicBool,
    busy: AtomicBool,
    phase: Mutex<CyclePhase>,
    pending: Mutex<Option<PendingCycle>>,
    staged: Mutex<Option<ExecutionContext>>,
}

impl FlashArbExecutor {
    /// Create an executor bound to `lender` for its whole lifetime
    pub fn new(
        address: AccountId,
        owner: AccountId,
        lender: Arc<dyn FlashLender>,
        ledger: Arc<dyn AssetLedger>,
        config: ExecutorConfig,
    ) -> Result<Self, ExecutionError> {
        config.validate()?;
        let lender_address = lender.address().clone();

        Ok(Self {
            address,
            owner,
            lender,
            lender_address,
            ledger,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
            config: RwLock::new(config),
            venues: RwLock::new(VenueRegistry::new()),
            stats: RwLock::new(LedgerStats::new()),
            paused: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            phase: Mutex::new(CyclePhase::Idle),
            pending: Mutex::new(None),
            staged: Mutex::new(None),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Borrow `request`, run `plan`, and keep at least `min_profit`.
    ///
    /// Only the owner may trigger a cycle. Preconditions are checked before
    /// the lender is contacted; after that every failure is a full rollback
    /// performed by the lender.
    pub fn request_loan(
        &self,
        caller: &AccountId,
        request: LoanRequest,
        plan: ArbitragePlan,
        min_profit: Amount,
    ) -> Result<ExecutionReceipt, ExecutionError> {
        if self.busy.load(Ordering::Acquire) {
            warn!(caller = %caller, "re-entrant request_loan blocked");
            return Err(ExecutionError::ReentrancyBlocked);
        }
        if self.paused.load(Ordering::Acquire) {
            return Err(ExecutionError::Paused);
        }
        if caller != &self.owner {
            return Err(ExecutionError::NotOwner);
        }
        if request.amount.is_zero() {
            return Err(ExecutionError::InvalidAmount);
        }

        let config = self.config.read().clone();
        plan.validate(&request, config.max_hops)?;
        {
            let venues = self.venues.read();
            for venue in plan.venues() {
                venues.resolve(venue)?;
            }
        }
        let min_profit = config.effective_min_profit(request.amount, min_profit)?;

        let _guard = CycleGuard::enter(&self.busy, &self.phase)?;
        let cycle_id = Uuid::new_v4();
        let params = bincode::serialize(&CyclePayload {
            cycle_id,
            plan: plan.clone(),
            min_profit,
        })
        .map_err(|e| ExecutionError::MalformedParams(e.to_string()))?;

        *self.pending.lock() = Some(PendingCycle {
            cycle_id,
            request: request.clone(),
            plan,
        });

        info!(
            %cycle_id,
            asset = %request.asset,
            amount = %request.amount,
            %min_profit,
            lender = %self.lender_address,
            "requesting flash loan"
        );

        let result = self
            .lender
            .flash_loan(self, &request.asset, request.amount, &params);

        self.pending.lock().take();
        let staged = self.staged.lock().take();

        if let Err(e) = result {
            warn!(%cycle_id, error = %e, "cycle aborted");
            return Err(e);
        }

        let context = staged.ok_or(ExecutionError::Lending(LendingError::CallbackSkipped))?;
        self.commit(context)
    }

    /// Record a settled cycle once the lender has collected repayment
    fn commit(&self, context: ExecutionContext) -> Result<ExecutionReceipt, ExecutionError> {
        let outcome = *context
            .outcome()
            .ok_or(ExecutionError::Lending(LendingError::CallbackSkipped))?;
        let completed_at = self.clock.now();

        self.stats.write().record(
            context.asset(),
            context.principal(),
            context.fee(),
            outcome.profit,
            completed_at,
        );

        info!(
            cycle_id = %context.cycle_id(),
            asset = %context.asset(),
            amount = %context.principal(),
            fee = %context.fee(),
            profit = %outcome.profit,
            hops = context.hops().len(),
            "cycle completed"
        );

        self.events.emit(ExecutorEvent::CycleCompleted {
            cycle_id: context.cycle_id(),
            asset: context.asset().clone(),
            amount: context.principal(),
            fee: context.fee(),
            profit: outcome.profit,
            timestamp: completed_at,
        });

        Ok(ExecutionReceipt {
            cycle_id: context.cycle_id(),
            asset: context.asset().clone(),
            amount: context.principal(),
            fee: context.fee(),
            amount_owed: outcome.amount_owed,
            balance_before: context.balance_before(),
            balance_after: outcome.balance_after,
            profit: outcome.profit,
            hops: context.hops().to_vec(),
            completed_at,
        })
    }

    fn advance(&self, phase: CyclePhase) {
        debug!(%phase, "cycle phase");
        *self.phase.lock() = phase;
    }

    /// Execute one hop and return what it realized
    fn execute_step(&self, index: usize, step: &SwapStep) -> Result<HopReceipt, ExecutionError> {
        // Re-checked per hop: an earlier hop handed control to external code
        let venue = self.venues.read().resolve(&step.venue)?;

        if let Some(deadline) = step.deadline {
            let now = self.clock.unix_now();
            if now > deadline {
                return Err(ExecutionError::DeadlineExpired {
                    step: index,
                    deadline,
                    now,
                });
            }
        }

        let available = self.ledger.balance_of(&self.address, &step.token_in);
        if available < step.amount_in {
            return Err(ExecutionError::InsufficientBalance {
                asset: step.token_in.clone(),
                needed: step.amount_in,
                available,
            });
        }

        let out_before = self.ledger.balance_of(&self.address, &step.token_out);
        self.ledger
            .approve(&self.address, venue.address(), &step.token_in, step.amount_in)?;

        let reported = venue
            .swap_exact_input(&SwapRequest {
                payer: self.address.clone(),
                token_in: step.token_in.clone(),
                token_out: step.token_out.clone(),
                amount_in: step.amount_in,
                min_amount_out: step.min_amount_out,
                recipient: self.address.clone(),
                deadline: step.deadline,
            })
            .map_err(|e| Self::map_venue_error(index, e))?;

        self.ledger
            .approve(&self.address, venue.address(), &step.token_in, Amount::ZERO)?;

        let realized = self
            .ledger
            .balance_of(&self.address, &step.token_out)
            .saturating_sub(out_before);

        if realized != reported {
            warn!(
                venue = %step.venue,
                %reported,
                %realized,
                "venue reported output differs from balance change"
            );
        }

        if realized < step.min_amount_out {
            return Err(ExecutionError::SlippageExceeded {
                step: index,
                expected: step.min_amount_out,
                actual: realized,
            });
        }

        debug!(
            step = index,
            venue = %step.venue,
            token_in = %step.token_in,
            token_out = %step.token_out,
            amount_in = %step.amount_in,
            amount_out = %realized,
            "hop executed"
        );

        Ok(HopReceipt {
            venue: step.venue.clone(),
            token_in: step.token_in.clone(),
            token_out: step.token_out.clone(),
            amount_in: step.amount_in,
            amount_out: realized,
        })
    }

    fn map_venue_error(index: usize, error: VenueError) -> ExecutionError {
        match error {
            VenueError::SlippageExceeded { expected, actual } => ExecutionError::SlippageExceeded {
                step: index,
                expected,
                actual,
            },
            VenueError::DeadlineExpired { deadline, now } => ExecutionError::DeadlineExpired {
                step: index,
                deadline,
                now,
            },
            other => ExecutionError::Venue(other),
        }
    }

    // ------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------

    fn ensure_owner(&self, caller: &AccountId) -> Result<(), ExecutionError> {
        if self.busy.load(Ordering::Acquire) {
            return Err(ExecutionError::ReentrancyBlocked);
        }
        if caller != &self.owner {
            return Err(ExecutionError::NotOwner);
        }
        Ok(())
    }

    pub fn authorize_venue(
        &self,
        caller: &AccountId,
        venue: Arc<dyn SwapVenue>,
    ) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        let event = ExecutorEvent::VenueAuthorized {
            venue: venue.id().clone(),
            address: venue.address().clone(),
        };
        self.venues.write().authorize(venue);
        self.events.emit(event);
        Ok(())
    }

    pub fn revoke_venue(&self, caller: &AccountId, venue: &VenueId) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        self.venues.write().revoke(venue)?;
        self.events.emit(ExecutorEvent::VenueRevoked {
            venue: venue.clone(),
        });
        Ok(())
    }

    pub fn set_venue_enabled(
        &self,
        caller: &AccountId,
        venue: &VenueId,
        enabled: bool,
    ) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        self.venues.write().set_enabled(venue, enabled)?;
        self.events.emit(ExecutorEvent::VenueToggled {
            venue: venue.clone(),
            enabled,
        });
        Ok(())
    }

    pub fn set_min_profit(
        &self,
        caller: &AccountId,
        min_profit: Amount,
    ) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        self.config.write().min_profit = min_profit;
        self.events.emit(ExecutorEvent::MinProfitUpdated { min_profit });
        Ok(())
    }

    pub fn set_min_profit_bps(&self, caller: &AccountId, bps: u16) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        self.update_config(|config| config.min_profit_bps = bps)?;
        self.events.emit(ExecutorEvent::MinProfitBpsUpdated { bps });
        Ok(())
    }

    pub fn set_max_fee_bps(&self, caller: &AccountId, bps: u16) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        self.update_config(|config| config.max_fee_bps = bps)?;
        self.events.emit(ExecutorEvent::MaxFeeBpsUpdated { bps });
        Ok(())
    }

    fn update_config(
        &self,
        change: impl FnOnce(&mut ExecutorConfig),
    ) -> Result<(), ExecutionError> {
        let mut config = self.config.write();
        let mut updated = config.clone();
        change(&mut updated);
        updated.validate()?;
        *config = updated;
        Ok(())
    }

    pub fn pause(&self, caller: &AccountId) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        self.paused.store(true, Ordering::Release);
        self.events.emit(ExecutorEvent::Paused { by: caller.clone() });
        Ok(())
    }

    pub fn unpause(&self, caller: &AccountId) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        self.paused.store(false, Ordering::Release);
        self.events.emit(ExecutorEvent::Unpaused { by: caller.clone() });
        Ok(())
    }

    /// Move accumulated profit out of the executor account
    pub fn withdraw(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: Amount,
        to: &AccountId,
    ) -> Result<(), ExecutionError> {
        self.ensure_owner(caller)?;
        if amount.is_zero() {
            return Err(ExecutionError::InvalidAmount);
        }
        self.ledger.transfer(&self.address, to, asset, amount)?;
        info!(asset = %asset, %amount, to = %to, "profit withdrawn");
        self.events.emit(ExecutorEvent::ProfitWithdrawn {
            asset: asset.clone(),
            amount,
            to: to.clone(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read-only
    // ------------------------------------------------------------------

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn lender_address(&self) -> &AccountId {
        &self.lender_address
    }

    pub fn stats(&self) -> LedgerStats {
        self.stats.read().clone()
    }

    pub fn venues(&self) -> Vec<VenueInfo> {
        self.venues.read().list()
    }

    pub fn is_venue_authorized(&self, venue: &VenueId) -> bool {
        self.venues.read().is_authorized(venue)
    }

    pub fn config(&self) -> ExecutorConfig {
        self.config.read().clone()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> CyclePhase {
        *self.phase.lock()
    }

    pub fn balance_of(&self, asset: &AssetId) -> Amount {
        self.ledger.balance_of(&self.address, asset)
    }

    /// Lender fee for borrowing `amount` of `asset`
    pub fn loan_fee(&self, asset: &AssetId, amount: Amount) -> Result<Amount, ExecutionError> {
        Ok(self.lender.flash_fee(asset, amount)?)
    }

    /// Quote a path through the authorized venues into an executable plan
    pub fn quote_path(
        &self,
        loan: &LoanRequest,
        hops: &[PathHop],
        slippage_bps: u16,
        deadline: Option<i64>,
    ) -> Result<QuotedPlan, ExecutionError> {
        let venues = self.venues.read().clone();
        quote_path(&venues, loan, hops, slippage_bps, deadline)
    }

    /// Check a plan against the executor's limits and venue set without
    /// borrowing anything
    pub fn validate_plan(
        &self,
        loan: &LoanRequest,
        plan: &ArbitragePlan,
    ) -> Result<(), ExecutionError> {
        if loan.amount.is_zero() {
            return Err(ExecutionError::InvalidAmount);
        }
        plan.validate(loan, self.config.read().max_hops)?;
        let venues = self.venues.read();
        for venue in plan.venues() {
            venues.resolve(venue)?;
        }
        Ok(())
    }
}

impl FlashBorrower for FlashArbExecutor {
    fn address(&self) -> &AccountId {
        &self.address
    }

    fn on_loan_received(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        params: &[u8],
    ) -> Result<(), ExecutionError> {
        if caller != &self.lender_address {
            warn!(caller = %caller, "loan callback from unexpected caller");
            return Err(ExecutionError::UnauthorizedCallback);
        }

        match self.phase() {
            CyclePhase::LoanRequested => {}
            CyclePhase::Idle => {
                warn!("unsolicited loan callback");
                return Err(ExecutionError::UnauthorizedCallback);
            }
            phase => {
                warn!(%phase, "re-entrant loan callback blocked");
                return Err(ExecutionError::ReentrancyBlocked);
            }
        }

        let pending = self
            .pending
            .lock()
            .clone()
            .ok_or(ExecutionError::UnauthorizedCallback)?;
        let payload: CyclePayload = bincode::deserialize(params)
            .map_err(|e| ExecutionError::MalformedParams(e.to_string()))?;

        if payload.cycle_id != pending.cycle_id
            || payload.plan != pending.plan
            || asset != &pending.request.asset
            || amount != pending.request.amount
        {
            warn!(cycle_id = %pending.cycle_id, "loan callback does not match the pending request");
            return Err(ExecutionError::UnauthorizedCallback);
        }

        let max_fee = amount
            .mul_bps_ceil(self.config.read().max_fee_bps)
            .ok_or(ExecutionError::ArithmeticOverflow)?;
        if fee > max_fee {
            return Err(ExecutionError::FeeTooHigh { fee, max: max_fee });
        }

        self.advance(CyclePhase::FundsReceived);
        let balance_before = self.ledger.balance_of(&self.address, asset);
        let mut context =
            ExecutionContext::open(payload.cycle_id, asset.clone(), amount, fee, balance_before)?;

        for (index, step) in payload.plan.steps().iter().enumerate() {
            self.advance(CyclePhase::Swapping { step: index + 1 });
            let hop = self.execute_step(index, step)?;
            context.record_hop(hop);
        }

        let balance_after = self.ledger.balance_of(&self.address, asset);
        let outcome = context.settle(balance_after, payload.min_profit)?;
        self.advance(CyclePhase::ProfitVerified);

        self.advance(CyclePhase::Repaying);
        self.ledger
            .approve(&self.address, &self.lender_address, asset, outcome.amount_owed)?;

        debug!(
            cycle_id = %context.cycle_id(),
            owed = %outcome.amount_owed,
            profit = %outcome.profit,
            "repayment approved"
        );

        *self.staged.lock() = Some(context);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::SwapStep;

    #[test]
    fn test_config_validation() {
        assert!(ExecutorConfig::default().validate().is_ok());

        let config = ExecutorConfig {
            max_fee_bps: 10_001,
            ..ExecutorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExecutionError::InvalidConfig(_))));

        let config = ExecutorConfig {
            max_hops: 0,
            ..ExecutorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExecutionError::InvalidConfig(_))));
    }

    #[test]
    fn test_effective_min_profit_takes_highest_floor() {
        let config = ExecutorConfig {
            min_profit: Amount::new(4),
            min_profit_bps: 10,
            ..ExecutorConfig::default()
        };
        let loan = Amount::new(10_000);

        // 10 bps of 10_000 is 10
        assert_eq!(config.effective_min_profit(loan, Amount::ZERO).unwrap(), Amount::new(10));
        assert_eq!(config.effective_min_profit(loan, Amount::new(25)).unwrap(), Amount::new(25));
        assert_eq!(
            config.effective_min_profit(Amount::new(100), Amount::ZERO).unwrap(),
            Amount::new(4)
        );
    }

    #[test]
    fn test_payload_keeps_optional_deadlines() {
        let payload = CyclePayload {
            cycle_id: Uuid::new_v4(),
            plan: ArbitragePlan::new(vec![
                SwapStep::new("ab", "A", "B", 1000, 0),
                SwapStep::new("ba", "B", "A", 2000, 1003).with_deadline(42),
            ]),
            min_profit: Amount::new(5),
        };

        let bytes = bincode::serialize(&payload).unwrap();
        let decoded: CyclePayload = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.cycle_id, payload.cycle_id);
        assert_eq!(decoded.plan, payload.plan);
        assert_eq!(decoded.min_profit, payload.min_profit);
    }
}
