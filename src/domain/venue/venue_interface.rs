//! Swap venue interface

use crate::shared::errors::VenueError;
use crate::shared::types::{AccountId, Amount, AssetId, UnixTimestamp, VenueId};

/// Exact-input swap order handed to a venue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    /// Account the venue pulls `amount_in` from (via allowance)
    pub payer: AccountId,
    pub token_in: AssetId,
    pub token_out: AssetId,
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    pub recipient: AccountId,
    pub deadline: Option<UnixTimestamp>,
}

/// Common interface for all venue adapters
pub trait SwapVenue: Send + Sync {
    fn id(&self) -> &VenueId;

    /// Ledger account holding the venue's liquidity
    fn address(&self) -> &AccountId;

    /// Short adapter label for listings
    fn kind(&self) -> &'static str;

    /// Expected output for `amount_in`, without moving funds
    fn quote(
        &self,
        token_in: &AssetId,
        token_out: &AssetId,
        amount_in: Amount,
    ) -> Result<Amount, VenueError>;

    /// Pull `amount_in` from the payer, pay the output to the recipient.
    /// Returns the amount the venue reports as paid out.
    fn swap_exact_input(&self, request: &SwapRequest) -> Result<Amount, VenueError>;
}
