//! Common types used across the application

use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis-point denominator (100% = 10_000 bps)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Unix timestamp in seconds
pub type UnixTimestamp = i64;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Asset (token) identifier
    AssetId
}

string_id! {
    /// Swap venue identifier
    VenueId
}

string_id! {
    /// Account identifier in the asset ledger (executor, lender, venue, user)
    AccountId
}

/// Token amount in the asset's smallest unit.
///
/// Arithmetic is checked; anything that could wrap returns `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// `self * bps / 10_000`, truncating
    pub fn mul_bps_floor(self, bps: u16) -> Option<Amount> {
        let scaled = (self.0 as u128) * (bps as u128) / (BPS_DENOMINATOR as u128);
        u64::try_from(scaled).ok().map(Amount)
    }

    /// `self * bps / 10_000`, rounded up
    pub fn mul_bps_ceil(self, bps: u16) -> Option<Amount> {
        let numerator = (self.0 as u128) * (bps as u128);
        let scaled = numerator.div_ceil(BPS_DENOMINATOR as u128);
        u64::try_from(scaled).ok().map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Immutable description of one atomic borrow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub asset: AssetId,
    pub amount: Amount,
}

impl LoanRequest {
    pub fn new(asset: impl Into<AssetId>, amount: u64) -> Self {
        Self {
            asset: asset.into(),
            amount: Amount::new(amount),
        }
    }
}
