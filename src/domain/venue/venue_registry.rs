//! Allow-list of venues a cycle may route through

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::SwapVenue;
use crate::shared::errors::ExecutionError;
use crate::shared::types::{AccountId, VenueId};

#[derive(Clone)]
struct VenueEntry {
    handle: Arc<dyn SwapVenue>,
    enabled: bool,
}

/// Venue listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueInfo {
    pub id: VenueId,
    pub address: AccountId,
    pub kind: String,
    pub enabled: bool,
}

/// Authorized venue set. Only handles registered here are ever called.
#[derive(Clone, Default)]
pub struct VenueRegistry {
    venues: BTreeMap<VenueId, VenueEntry>,
}

impl VenueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a venue handle, enabled
    pub fn authorize(&mut self, venue: Arc<dyn SwapVenue>) {
        self.venues.insert(
            venue.id().clone(),
            VenueEntry {
                handle: venue,
                enabled: true,
            },
        );
    }

    pub fn revoke(&mut self, id: &VenueId) -> Result<(), ExecutionError> {
        self.venues
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ExecutionError::UnauthorizedVenue(id.clone()))
    }

    pub fn set_enabled(&mut self, id: &VenueId, enabled: bool) -> Result<(), ExecutionError> {
        let entry = self
            .venues
            .get_mut(id)
            .ok_or_else(|| ExecutionError::UnauthorizedVenue(id.clone()))?;
        entry.enabled = enabled;
        Ok(())
    }

    pub fn is_authorized(&self, id: &VenueId) -> bool {
        self.venues.get(id).map(|entry| entry.enabled).unwrap_or(false)
    }

    /// Resolve an enabled venue handle, or fail with `UnauthorizedVenue`
    pub fn resolve(&self, id: &VenueId) -> Result<Arc<dyn SwapVenue>, ExecutionError> {
        match self.venues.get(id) {
            Some(entry) if entry.enabled => Ok(Arc::clone(&entry.handle)),
            _ => Err(ExecutionError::UnauthorizedVenue(id.clone())),
        }
    }

    pub fn list(&self) -> Vec<VenueInfo> {
        self.venues
            .values()
            .map(|entry| VenueInfo {
                id: entry.handle.id().clone(),
                address: entry.handle.address().clone(),
                kind: entry.handle.kind().to_string(),
                enabled: entry.enabled,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

impl fmt::Debug for VenueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.list()).finish()
    }
}
