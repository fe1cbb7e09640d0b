//! Build a plan from venue quotes

use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;

use super::{ArbitragePlan, SwapStep};
use crate::domain::venue::VenueRegistry;
use crate::math::calculate_min_out;
use crate::shared::errors::ExecutionError;
use crate::shared::types::{Amount, AssetId, LoanRequest, UnixTimestamp, VenueId};

/// One hop of a path to quote: trade on `venue` into `token_out`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHop {
    pub venue: VenueId,
    pub token_out: AssetId,
}

impl FromStr for PathHop {
    type Err = String;

    /// Parses `venue:TOKEN`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((venue, token)) if !venue.is_empty() && !token.is_empty() => Ok(PathHop {
                venue: VenueId::from(venue.trim()),
                token_out: AssetId::from(token.trim()),
            }),
            _ => Err(format!("expected venue:TOKEN, got '{}'", s)),
        }
    }
}

/// Quoted plan together with what the path should return
#[derive(Debug, Clone, Serialize)]
pub struct QuotedPlan {
    pub loan: LoanRequest,
    pub plan: ArbitragePlan,
    /// Final output if every hop fills at its quote
    pub expected_return: Amount,
    /// Final output if every hop fills exactly at its minimum
    pub worst_case_return: Amount,
}

/// Walk `hops` through venue quotes starting from the loan.
///
/// Each hop's `min_amount_out` is its quote reduced by `slippage_bps`, and
/// the next hop spends exactly that minimum so the plan stays executable
/// whenever every hop meets its bound.
pub fn quote_path(
    venues: &VenueRegistry,
    loan: &LoanRequest,
    hops: &[PathHop],
    slippage_bps: u16,
    deadline: Option<UnixTimestamp>,
) -> Result<QuotedPlan, ExecutionError> {
    if loan.amount.is_zero() {
        return Err(ExecutionError::InvalidAmount);
    }
    if hops.is_empty() {
        return Err(ExecutionError::InvalidPlan("path has no hops".to_string()));
    }
    // Quotes read live reserves, so a second hop on the same venue would
    // ignore the first hop's price impact
    let mut seen = HashSet::with_capacity(hops.len());
    if let Some(repeated) = hops.iter().find(|hop| !seen.insert(&hop.venue)) {
        return Err(ExecutionError::InvalidPlan(format!(
            "venue {} appears more than once in the path",
            repeated.venue
        )));
    }

    let mut steps = Vec::with_capacity(hops.len());
    let mut token_in = loan.asset.clone();
    let mut amount_in = loan.amount;
    let mut expected = loan.amount;

    for (index, hop) in hops.iter().enumerate() {
        let venue = venues.resolve(&hop.venue)?;
        let quoted = venue.quote(&token_in, &hop.token_out, amount_in)?;
        let min_out = calculate_min_out(quoted, slippage_bps);
        if min_out.is_zero() {
            return Err(ExecutionError::InvalidPlan(format!(
                "hop {} on {} quotes nothing for {} {}",
                index, hop.venue, amount_in, token_in
            )));
        }

        // Scale the optimistic track by the same venue to keep it comparable
        expected = venue.quote(&token_in, &hop.token_out, expected)?;

        steps.push(SwapStep {
            venue: hop.venue.clone(),
            token_in: token_in.clone(),
            token_out: hop.token_out.clone(),
            amount_in,
            min_amount_out: min_out,
            deadline,
        });

        token_in = hop.token_out.clone();
        amount_in = min_out;
    }

    Ok(QuotedPlan {
        loan: loan.clone(),
        plan: ArbitragePlan::new(steps),
        expected_return: expected,
        worst_case_return: amount_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_hop() {
        let hop: PathHop = "alpha:WETH".parse().unwrap();
        assert_eq!(hop.venue, VenueId::from("alpha"));
        assert_eq!(hop.token_out, AssetId::from("WETH"));

        assert!("alpha".parse::<PathHop>().is_err());
        assert!(":WETH".parse::<PathHop>().is_err());
        assert!("alpha:".parse::<PathHop>().is_err());
    }

    #[test]
    fn test_quote_requires_hops() {
        let registry = VenueRegistry::new();
        let loan = LoanRequest::new("A", 100);
        assert!(matches!(
            quote_path(&registry, &loan, &[], 50, None),
            Err(ExecutionError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_quote_rejects_repeated_venue() {
        let registry = VenueRegistry::new();
        let loan = LoanRequest::new("A", 100);
        let hops: Vec<PathHop> = ["alpha:B", "beta:A", "alpha:B", "beta:A"]
            .iter()
            .map(|hop| hop.parse().unwrap())
            .collect();
        match quote_path(&registry, &loan, &hops, 50, None) {
            Err(ExecutionError::InvalidPlan(reason)) => {
                assert!(reason.contains("venue alpha appears more than once"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_quote_rejects_unknown_venue() {
        let registry = VenueRegistry::new();
        let loan = LoanRequest::new("A", 100);
        let hops: Vec<PathHop> = vec!["alpha:B".parse().unwrap()];
        assert_eq!(
            quote_path(&registry, &loan, &hops, 50, None).err(),
            Some(ExecutionError::UnauthorizedVenue(VenueId::from("alpha")))
        );
    }
}
