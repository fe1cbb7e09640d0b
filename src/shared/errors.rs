//! Error handling for the application

use thiserror::Error;

use crate::shared::types::{AccountId, Amount, AssetId, VenueId};

/// Asset ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds: {account} holds {available} {asset}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    #[error(
        "Insufficient allowance: {spender} may move {allowed} {asset} of {owner}, needs {needed}"
    )]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        asset: AssetId,
        needed: Amount,
        allowed: Amount,
    },

    #[error("Balance overflow for {account} in {asset}")]
    Overflow { account: AccountId, asset: AssetId },
}

/// Swap venue errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("Venue {venue} does not trade {token_in} -> {token_out}")]
    UnsupportedPair {
        venue: VenueId,
        token_in: AssetId,
        token_out: AssetId,
    },

    #[error("Swap deadline {deadline} passed (now {now})")]
    DeadlineExpired { deadline: i64, now: i64 },

    #[error("Output {actual} below minimum {expected}")]
    SlippageExceeded { expected: Amount, actual: Amount },

    #[error("Insufficient venue liquidity")]
    InsufficientLiquidity,

    #[error("No scripted output left on venue {0}")]
    ScriptExhausted(VenueId),

    #[error("Swap math overflow")]
    MathOverflow,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Flash lender errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    #[error("Invalid loan amount")]
    InvalidAmount,

    #[error("Insufficient lender liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Amount, available: Amount },

    #[error("Flash loan was not fully repaid: expected {expected}, got {actual}")]
    NotRepaid { expected: Amount, actual: Amount },

    #[error("Could not collect repayment of {owed}: {source}")]
    RepaymentFailed { owed: Amount, source: LedgerError },

    #[error("Loan of {amount} at {fee_bps} bps rounds to a zero fee")]
    FeeRoundsToZero { amount: Amount, fee_bps: u16 },

    #[error("Nested flash loan rejected")]
    Reentrant,

    #[error("Fee calculation overflow")]
    FeeOverflow,

    #[error("Lender returned without running the borrower callback")]
    CallbackSkipped,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Flash-loan cycle errors. Every variant aborts the whole cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Venue not authorized: {0}")]
    UnauthorizedVenue(VenueId),

    #[error("Loan callback not from the configured lender")]
    UnauthorizedCallback,

    #[error("Slippage exceeded at step {step}: expected at least {expected}, got {actual}")]
    SlippageExceeded {
        step: usize,
        expected: Amount,
        actual: Amount,
    },

    #[error("Insufficient repayment: owed {owed}, available {available}")]
    InsufficientRepayment { owed: Amount, available: Amount },

    #[error("Insufficient profit: required {required}, realized {actual}")]
    InsufficientProfit { required: Amount, actual: Amount },

    #[error("Re-entrant call blocked: a cycle is in progress")]
    ReentrancyBlocked,

    #[error("Executor is paused")]
    Paused,

    #[error("Caller is not the owner")]
    NotOwner,

    #[error("Loan amount must be greater than zero")]
    InvalidAmount,

    #[error("Loan fee {fee} exceeds bound {max}")]
    FeeTooHigh { fee: Amount, max: Amount },

    #[error("Step {step} deadline {deadline} passed (now {now})")]
    DeadlineExpired { step: usize, deadline: i64, now: i64 },

    #[error("Insufficient balance of {asset}: needs {needed}, holds {available}")]
    InsufficientBalance {
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed loan parameters: {0}")]
    MalformedParams(String),

    #[error("Lender error: {0}")]
    Lending(#[from] LendingError),

    #[error("Venue error: {0}")]
    Venue(#[from] VenueError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Execution error: {0}")]
    ExecutionError(#[from] ExecutionError),

    #[error("Environment error: {0}")]
    EnvironmentError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::EnvironmentError(err.to_string())
    }
}

impl From<VenueError> for AppError {
    fn from(err: VenueError) -> Self {
        AppError::EnvironmentError(err.to_string())
    }
}
