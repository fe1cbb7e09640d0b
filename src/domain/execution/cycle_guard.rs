//! Cycle state machine and the re-entrancy guard

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::shared::errors::ExecutionError;

/// Phase of the current borrow-swap-repay cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    LoanRequested,
    FundsReceived,
    /// 1-based hop index
    Swapping { step: usize },
    ProfitVerified,
    Repaying,
}

impl CyclePhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, CyclePhase::Idle)
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclePhase::Idle => write!(f, "idle"),
            CyclePhase::LoanRequested => write!(f, "loan requested"),
            CyclePhase::FundsReceived => write!(f, "funds received"),
            CyclePhase::Swapping { step } => write!(f, "swapping (step {})", step),
            CyclePhase::ProfitVerified => write!(f, "profit verified"),
            CyclePhase::Repaying => write!(f, "repaying"),
        }
    }
}

/// Holds the busy flag for one cycle.
///
/// Dropping the guard returns the executor to `Idle` whichever way the
/// cycle exits, including unwinding.
pub(crate) struct CycleGuard<'a> {
    busy: &'a AtomicBool,
    phase: &'a Mutex<CyclePhase>,
}

impl<'a> CycleGuard<'a> {
    pub(crate) fn enter(
        busy: &'a AtomicBool,
        phase: &'a Mutex<CyclePhase>,
    ) -> Result<Self, ExecutionError> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExecutionError::ReentrancyBlocked)?;
        *phase.lock() = CyclePhase::LoanRequested;
        Ok(Self { busy, phase })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock() = CyclePhase::Idle;
        self.busy.store(false, Ordering::Release);
    }
}
