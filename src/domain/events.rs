//! Executor events - one per completed cycle and one per admin change

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::shared::types::{AccountId, Amount, AssetId, VenueId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutorEvent {
    CycleCompleted {
        cycle_id: Uuid,
        asset: AssetId,
        amount: Amount,
        fee: Amount,
        profit: Amount,
        timestamp: DateTime<Utc>,
    },
    VenueAuthorized {
        venue: VenueId,
        address: AccountId,
    },
    VenueRevoked {
        venue: VenueId,
    },
    VenueToggled {
        venue: VenueId,
        enabled: bool,
    },
    MinProfitUpdated {
        min_profit: Amount,
    },
    MinProfitBpsUpdated {
        bps: u16,
    },
    MaxFeeBpsUpdated {
        bps: u16,
    },
    Paused {
        by: AccountId,
    },
    Unpaused {
        by: AccountId,
    },
    ProfitWithdrawn {
        asset: AssetId,
        amount: Amount,
        to: AccountId,
    },
}

impl ExecutorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutorEvent::CycleCompleted { .. } => "cycle_completed",
            ExecutorEvent::VenueAuthorized { .. } => "venue_authorized",
            ExecutorEvent::VenueRevoked { .. } => "venue_revoked",
            ExecutorEvent::VenueToggled { .. } => "venue_toggled",
            ExecutorEvent::MinProfitUpdated { .. } => "min_profit_updated",
            ExecutorEvent::MinProfitBpsUpdated { .. } => "min_profit_bps_updated",
            ExecutorEvent::MaxFeeBpsUpdated { .. } => "max_fee_bps_updated",
            ExecutorEvent::Paused { .. } => "paused",
            ExecutorEvent::Unpaused { .. } => "unpaused",
            ExecutorEvent::ProfitWithdrawn { .. } => "profit_withdrawn",
        }
    }
}

/// Destination for executor events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ExecutorEvent);
}

/// Writes every event to the `tracing` log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: ExecutorEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(event = event.name(), %payload, "executor event"),
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "failed to encode executor event")
            }
        }
    }
}
