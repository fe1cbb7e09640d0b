//! Constant-product (x*y=k) pool venue
//!
//! Reserves are the venue account's ledger balances of its two assets, so
//! they move with every swap and roll back with the ledger.

use std::sync::Arc;
use tracing::debug;

use crate::domain::assets::AssetLedger;
use crate::domain::venue::{SwapRequest, SwapVenue};
use crate::math::constant_product_amount_out;
use crate::shared::clock::Clock;
use crate::shared::errors::VenueError;
use crate::shared::types::{AccountId, Amount, AssetId, VenueId};

pub struct ConstantProductVenue {
    id: VenueId,
    address: AccountId,
    asset_a: AssetId,
    asset_b: AssetId,
    fee_bps: u16,
    ledger: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
}

impl ConstantProductVenue {
    pub fn new(
        id: VenueId,
        address: AccountId,
        asset_a: AssetId,
        asset_b: AssetId,
        fee_bps: u16,
        ledger: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            address,
            asset_a,
            asset_b,
            fee_bps,
            ledger,
            clock,
        }
    }

    /// Current `(reserve_a, reserve_b)`
    pub fn reserves(&self) -> (Amount, Amount) {
        (
            self.ledger.balance_of(&self.address, &self.asset_a),
            self.ledger.balance_of(&self.address, &self.asset_b),
        )
    }

    fn check_pair(&self, token_in: &AssetId, token_out: &AssetId) -> Result<(), VenueError> {
        let forward = token_in == &self.asset_a && token_out == &self.asset_b;
        let backward = token_in == &self.asset_b && token_out == &self.asset_a;
        if forward || backward {
            Ok(())
        } else {
            Err(VenueError::UnsupportedPair {
                venue: self.id.clone(),
                token_in: token_in.clone(),
                token_out: token_out.clone(),
            })
        }
    }
}

impl SwapVenue for ConstantProductVenue {
    fn id(&self) -> &VenueId {
        &self.id
    }

    fn address(&self) -> &AccountId {
        &self.address
    }

    fn kind(&self) -> &'static str {
        "constant_product"
    }

    fn quote(
        &self,
        token_in: &AssetId,
        token_out: &AssetId,
        amount_in: Amount,
    ) -> Result<Amount, VenueError> {
        self.check_pair(token_in, token_out)?;
        let reserve_in = self.ledger.balance_of(&self.address, token_in);
        let reserve_out = self.ledger.balance_of(&self.address, token_out);
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(VenueError::InsufficientLiquidity);
        }
        constant_product_amount_out(amount_in, reserve_in, reserve_out, self.fee_bps)
            .ok_or(VenueError::MathOverflow)
    }

    fn swap_exact_input(&self, request: &SwapRequest) -> Result<Amount, VenueError> {
        if let Some(deadline) = request.deadline {
            let now = self.clock.unix_now();
            if now > deadline {
                return Err(VenueError::DeadlineExpired { deadline, now });
            }
        }

        let amount_out = self.quote(&request.token_in, &request.token_out, request.amount_in)?;
        if amount_out.is_zero() {
            return Err(VenueError::InsufficientLiquidity);
        }
        if amount_out < request.min_amount_out {
            return Err(VenueError::SlippageExceeded {
                expected: request.min_amount_out,
                actual: amount_out,
            });
        }

        self.ledger.transfer_from(
            &self.address,
            &request.payer,
            &self.address,
            &request.token_in,
            request.amount_in,
        )?;
        self.ledger
            .transfer(&self.address, &request.recipient, &request.token_out, amount_out)?;

        debug!(
            venue = %self.id,
            token_in = %request.token_in,
            token_out = %request.token_out,
            amount_in = %request.amount_in,
            %amount_out,
            "constant product swap"
        );
        Ok(amount_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::simulated::Bank;
    use crate::shared::clock::FixedClock;

    fn setup() -> (Arc<Bank>, Arc<FixedClock>, ConstantProductVenue) {
        let bank = Arc::new(Bank::new());
        let clock = Arc::new(FixedClock::new(1_000));
        let pool = AccountId::from("pool-ab");
        bank.mint(&pool, &AssetId::from("A"), Amount::new(1_000_000)).unwrap();
        bank.mint(&pool, &AssetId::from("B"), Amount::new(1_000_000)).unwrap();
        bank.mint(&AccountId::from("trader"), &AssetId::from("A"), Amount::new(5_000)).unwrap();

        let venue = ConstantProductVenue::new(
            VenueId::from("ab"),
            pool,
            AssetId::from("A"),
            AssetId::from("B"),
            30,
            bank.clone(),
            clock.clone(),
        );
        (bank, clock, venue)
    }

    fn request(min_out: u64, deadline: Option<i64>) -> SwapRequest {
        SwapRequest {
            payer: AccountId::from("trader"),
            token_in: AssetId::from("A"),
            token_out: AssetId::from("B"),
            amount_in: Amount::new(1_000),
            min_amount_out: Amount::new(min_out),
            recipient: AccountId::from("trader"),
            deadline,
        }
    }

    #[test]
    fn test_quote_and_swap_move_reserves() {
        let (bank, _clock, venue) = setup();
        let trader = AccountId::from("trader");
        assert_eq!(
            venue.quote(&AssetId::from("A"), &AssetId::from("B"), Amount::new(1_000)).unwrap(),
            Amount::new(996)
        );

        bank.approve(&trader, venue.address(), &AssetId::from("A"), Amount::new(1_000))
            .unwrap();
        let out = venue.swap_exact_input(&request(990, None)).unwrap();

        assert_eq!(out, Amount::new(996));
        assert_eq!(bank.balance_of(&trader, &AssetId::from("B")), Amount::new(996));
        assert_eq!(venue.reserves(), (Amount::new(1_001_000), Amount::new(999_004)));
    }

    #[test]
    fn test_swap_enforces_min_out_and_deadline() {
        let (bank, clock, venue) = setup();
        bank.approve(
            &AccountId::from("trader"),
            venue.address(),
            &AssetId::from("A"),
            Amount::new(1_000),
        )
        .unwrap();

        assert_eq!(
            venue.swap_exact_input(&request(997, None)),
            Err(VenueError::SlippageExceeded {
                expected: Amount::new(997),
                actual: Amount::new(996),
            })
        );

        clock.set(2_000);
        assert_eq!(
            venue.swap_exact_input(&request(0, Some(1_999))),
            Err(VenueError::DeadlineExpired {
                deadline: 1_999,
                now: 2_000,
            })
        );
    }

    #[test]
    fn test_swap_requires_allowance() {
        let (_bank, _clock, venue) = setup();
        assert!(matches!(
            venue.swap_exact_input(&request(0, None)),
            Err(VenueError::Ledger(_))
        ));
    }

    #[test]
    fn test_unsupported_pair() {
        let (_bank, _clock, venue) = setup();
        assert!(matches!(
            venue.quote(&AssetId::from("A"), &AssetId::from("C"), Amount::new(1)),
            Err(VenueError::UnsupportedPair { .. })
        ));
    }
}
