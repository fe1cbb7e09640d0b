//! Venue that pays out pre-programmed amounts
//!
//! Each swap consumes the next scripted output regardless of pair or
//! input size. Used to pin a path's result for deterministic runs.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use crate::domain::assets::AssetLedger;
use crate::domain::venue::{SwapRequest, SwapVenue};
use crate::shared::clock::Clock;
use crate::shared::errors::VenueError;
use crate::shared::types::{AccountId, Amount, AssetId, VenueId};

pub struct ScriptedVenue {
    id: VenueId,
    address: AccountId,
    outputs: Mutex<VecDeque<Amount>>,
    /// Re-queue each output after use
    cycle: bool,
    /// Skip the venue-side minimum-output and deadline checks
    lenient: bool,
    ledger: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
}

impl ScriptedVenue {
    pub fn new(
        id: VenueId,
        address: AccountId,
        outputs: impl IntoIterator<Item = Amount>,
        ledger: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            address,
            outputs: Mutex::new(outputs.into_iter().collect()),
            cycle: false,
            lenient: false,
            ledger,
            clock,
        }
    }

    pub fn cycling(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Leave output bounds to the caller
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.outputs.lock().len()
    }

    fn next_output(&self) -> Result<Amount, VenueError> {
        let mut outputs = self.outputs.lock();
        let next = outputs
            .pop_front()
            .ok_or_else(|| VenueError::ScriptExhausted(self.id.clone()))?;
        if self.cycle {
            outputs.push_back(next);
        }
        Ok(next)
    }
}

impl SwapVenue for ScriptedVenue {
    fn id(&self) -> &VenueId {
        &self.id
    }

    fn address(&self) -> &AccountId {
        &self.address
    }

    fn kind(&self) -> &'static str {
        "scripted"
    }

    fn quote(&self, _: &AssetId, _: &AssetId, _: Amount) -> Result<Amount, VenueError> {
        self.outputs
            .lock()
            .front()
            .copied()
            .ok_or_else(|| VenueError::ScriptExhausted(self.id.clone()))
    }

    fn swap_exact_input(&self, request: &SwapRequest) -> Result<Amount, VenueError> {
        if !self.lenient {
            if let Some(deadline) = request.deadline {
                let now = self.clock.unix_now();
                if now > deadline {
                    return Err(VenueError::DeadlineExpired { deadline, now });
                }
            }
        }

        let amount_out = self.next_output()?;
        if !self.lenient && amount_out < request.min_amount_out {
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

        debug!(venue = %self.id, %amount_out, "scripted swap");
        Ok(amount_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::simulated::Bank;
    use crate::shared::clock::FixedClock;

    fn setup(outputs: &[u64]) -> (Arc<Bank>, ScriptedVenue) {
        let bank = Arc::new(Bank::new());
        bank.mint(&AccountId::from("script"), &AssetId::from("B"), Amount::new(10_000))
            .unwrap();
        bank.mint(&AccountId::from("trader"), &AssetId::from("A"), Amount::new(10_000))
            .unwrap();
        let venue = ScriptedVenue::new(
            VenueId::from("script"),
            AccountId::from("script"),
            outputs.iter().copied().map(Amount::new),
            bank.clone(),
            Arc::new(FixedClock::new(0)),
        );
        (bank, venue)
    }

    fn swap(bank: &Bank, venue: &ScriptedVenue, min_out: u64) -> Result<Amount, VenueError> {
        let trader = AccountId::from("trader");
        bank.approve(&trader, venue.address(), &AssetId::from("A"), Amount::new(100))
            .unwrap();
        venue.swap_exact_input(&SwapRequest {
            payer: trader.clone(),
            token_in: AssetId::from("A"),
            token_out: AssetId::from("B"),
            amount_in: Amount::new(100),
            min_amount_out: Amount::new(min_out),
            recipient: trader,
            deadline: None,
        })
    }

    #[test]
    fn test_outputs_consumed_in_order() {
        let (bank, venue) = setup(&[150, 90]);
        assert_eq!(swap(&bank, &venue, 0), Ok(Amount::new(150)));
        assert_eq!(swap(&bank, &venue, 0), Ok(Amount::new(90)));
        assert_eq!(
            swap(&bank, &venue, 0),
            Err(VenueError::ScriptExhausted(VenueId::from("script")))
        );
        assert_eq!(
            bank.balance_of(&AccountId::from("trader"), &AssetId::from("B")),
            Amount::new(240)
        );
    }

    #[test]
    fn test_cycling_script_repeats() {
        let (bank, venue) = setup(&[7]);
        let venue = venue.cycling();
        assert_eq!(swap(&bank, &venue, 0), Ok(Amount::new(7)));
        assert_eq!(swap(&bank, &venue, 0), Ok(Amount::new(7)));
        assert_eq!(venue.remaining(), 1);
    }

    #[test]
    fn test_lenient_skips_min_out() {
        let (bank, venue) = setup(&[50, 50]);
        assert!(matches!(
            swap(&bank, &venue, 60),
            Err(VenueError::SlippageExceeded { .. })
        ));

        let venue = venue.lenient();
        assert_eq!(swap(&bank, &venue, 60), Ok(Amount::new(50)));
    }
}
