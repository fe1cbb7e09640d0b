//! Builds a complete in-process environment from configuration

use std::sync::Arc;
use tracing::info;

use super::{Bank, ConstantProductVenue, PoolLender, ScriptedVenue};
use crate::domain::events::{EventSink, TracingEventSink};
use crate::domain::execution::{ExecutorConfig, FlashArbExecutor};
use crate::domain::venue::SwapVenue;
use crate::infrastructure::event_sinks::{FanoutEventSink, MemoryEventSink};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::config::{AppConfig, VenueSettings};
use crate::shared::errors::AppError;

/// Ledger, lender, venues and executor wired together
pub struct SimulatedEnvironment {
    pub bank: Arc<Bank>,
    pub lender: Arc<PoolLender>,
    pub executor: Arc<FlashArbExecutor>,
    pub events: Arc<MemoryEventSink>,
    pub clock: Arc<dyn Clock>,
}

impl SimulatedEnvironment {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        config.validate()?;
        let bank = Arc::new(Bank::new());

        for balance in &config.balances {
            bank.mint(&balance.account, &balance.asset, balance.amount)?;
        }

        let lender = Arc::new(PoolLender::new(
            config.lender.address.clone(),
            Arc::clone(&bank),
            config.lender.fee_bps,
            config.lender.rounding,
        ));

        let memory = Arc::new(MemoryEventSink::new());
        let sinks: Vec<Arc<dyn EventSink>> = vec![
            memory.clone() as Arc<dyn EventSink>,
            Arc::new(TracingEventSink),
        ];

        let settings = &config.executor;
        let executor = FlashArbExecutor::new(
            settings.address.clone(),
            settings.owner.clone(),
            lender.clone(),
            bank.clone(),
            ExecutorConfig {
                min_profit: settings.min_profit,
                min_profit_bps: settings.min_profit_bps,
                max_fee_bps: settings.max_fee_bps,
                max_hops: settings.max_hops,
            },
        )?
        .with_clock(Arc::clone(&clock))
        .with_event_sink(Arc::new(FanoutEventSink::new(sinks)));

        for venue_settings in &config.venues {
            let venue = Self::build_venue(venue_settings, &bank, &clock)?;
            executor.authorize_venue(&settings.owner, Arc::clone(&venue))?;
            if !venue_settings.enabled() {
                executor.set_venue_enabled(&settings.owner, venue.id(), false)?;
            }
        }

        if settings.paused {
            executor.pause(&settings.owner)?;
        }

        info!(
            executor = %settings.address,
            lender = %config.lender.address,
            venues = config.venues.len(),
            "simulated environment ready"
        );

        Ok(Self {
            bank,
            lender,
            executor: Arc::new(executor),
            events: memory,
            clock,
        })
    }

    fn build_venue(
        settings: &VenueSettings,
        bank: &Arc<Bank>,
        clock: &Arc<dyn Clock>,
    ) -> Result<Arc<dyn SwapVenue>, AppError> {
        let venue: Arc<dyn SwapVenue> = match settings {
            VenueSettings::ConstantProduct {
                id,
                address,
                asset_a,
                asset_b,
                reserve_a,
                reserve_b,
                fee_bps,
                ..
            } => {
                bank.mint(address, asset_a, *reserve_a)?;
                bank.mint(address, asset_b, *reserve_b)?;
                Arc::new(ConstantProductVenue::new(
                    id.clone(),
                    address.clone(),
                    asset_a.clone(),
                    asset_b.clone(),
                    *fee_bps,
                    bank.clone(),
                    Arc::clone(clock),
                ))
            }
            VenueSettings::Scripted {
                id,
                address,
                outputs,
                funding,
                cycle,
                ..
            } => {
                for fund in funding {
                    bank.mint(address, &fund.asset, fund.amount)?;
                }
                let venue = ScriptedVenue::new(
                    id.clone(),
                    address.clone(),
                    outputs.iter().copied(),
                    bank.clone(),
                    Arc::clone(clock),
                );
                Arc::new(if *cycle { venue.cycling() } else { venue })
            }
        };
        Ok(venue)
    }
}
