//! Acceleration factors and the order they are applied in.
//!
//! A factor divides a duration: 2.0 halves it, 0.5 doubles it and
//! exactly 1.0 leaves the graph alone.

use crate::parser::Rank;
use crate::utils::config::NEUTRAL_FACTOR;
use crate::utils::error::BackpropError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a factor is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactorTarget {
    /// Compute speed of one rank
    Hardware { rank: Rank },
    /// Latency of the directed link `from -> to`
    Network { from: Rank, to: Rank },
}

impl fmt::Display for FactorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware { rank } => write!(f, "rank {}", rank),
            Self::Network { from, to } => write!(f, "link {} -> {}", from, to),
        }
    }
}

/// Check that `factor` is usable for `target`
///
/// # Errors
/// * `BackpropError::InvalidFactor` - factor is zero, negative, NaN or infinite
pub fn validate_factor(target: FactorTarget, factor: f64) -> Result<(), BackpropError> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(BackpropError::InvalidFactor {
            factor,
            target: target.to_string(),
        })
    }
}

pub fn is_neutral(factor: f64) -> bool {
    factor == NEUTRAL_FACTOR
}

/// Factors keyed by target; anything not listed is 1.0
///
/// Entries are sparse, so a rank or link id far beyond the trace costs
/// one entry and simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccelerationPlan {
    factors: BTreeMap<FactorTarget, f64>,
}

impl AccelerationPlan {
    /// Build a plan from `hardware[rank]` and `network[from][to]` tables
    pub fn new(hardware: Vec<f64>, network: Vec<Vec<f64>>) -> Self {
        let mut plan = Self::default();
        for (rank, factor) in hardware.into_iter().enumerate() {
            plan.insert(FactorTarget::Hardware { rank: rank as Rank }, factor);
        }
        for (from, row) in network.into_iter().enumerate() {
            for (to, factor) in row.into_iter().enumerate() {
                plan.insert(
                    FactorTarget::Network {
                        from: from as Rank,
                        to: to as Rank,
                    },
                    factor,
                );
            }
        }
        plan
    }

    /// Build a plan from explicit `(rank, factor)` and
    /// `(from, to, factor)` entries; a repeated entry overrides the earlier one
    pub fn from_entries(hardware: &[(Rank, f64)], links: &[(Rank, Rank, f64)]) -> Self {
        let mut plan = Self::default();
        for &(rank, factor) in hardware {
            plan.insert(FactorTarget::Hardware { rank }, factor);
        }
        for &(from, to, factor) in links {
            plan.insert(FactorTarget::Network { from, to }, factor);
        }
        plan
    }

    /// Set the factor for `target`, replacing any earlier one
    pub fn insert(&mut self, target: FactorTarget, factor: f64) {
        self.factors.insert(target, factor);
    }

    pub fn get(&self, target: FactorTarget) -> f64 {
        self.factors.get(&target).copied().unwrap_or(NEUTRAL_FACTOR)
    }

    /// Number of listed entries, neutral ones included
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Every listed entry in application order: ranks ascending, then
    /// links by `(from, to)` ascending
    pub fn entries(&self) -> impl Iterator<Item = (FactorTarget, f64)> + '_ {
        self.factors.iter().map(|(&target, &factor)| (target, factor))
    }

    /// Entries that actually change something
    pub fn steps(&self) -> Vec<(FactorTarget, f64)> {
        self.entries().filter(|&(_, factor)| !is_neutral(factor)).collect()
    }

    /// Reject the plan if any entry is unusable
    pub fn validate(&self) -> Result<(), BackpropError> {
        self.entries()
            .try_for_each(|(target, factor)| validate_factor(target, factor))
    }

    pub fn is_identity(&self) -> bool {
        self.entries().all(|(_, factor)| is_neutral(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_factor() {
        let target = FactorTarget::Hardware { rank: 0 };
        assert!(validate_factor(target, 2.0).is_ok());
        assert!(validate_factor(target, 0.25).is_ok());
        assert!(validate_factor(target, 0.0).is_err());
        assert!(validate_factor(target, -1.0).is_err());
        assert!(validate_factor(target, f64::NAN).is_err());
        assert!(validate_factor(target, f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_entries_defaults_to_neutral() {
        let plan = AccelerationPlan::from_entries(&[(2, 3.0), (2, 4.0)], &[(1, 0, 2.0)]);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.get(FactorTarget::Hardware { rank: 2 }), 4.0);
        assert_eq!(plan.get(FactorTarget::Hardware { rank: 0 }), 1.0);
        assert_eq!(plan.get(FactorTarget::Network { from: 1, to: 0 }), 2.0);
    }

    #[test]
    fn test_far_out_ids_stay_sparse() {
        let plan = AccelerationPlan::from_entries(&[(Rank::MAX, 2.0)], &[(Rank::MAX, Rank::MAX, 0.5)]);

        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.steps(),
            vec![
                (FactorTarget::Hardware { rank: Rank::MAX }, 2.0),
                (FactorTarget::Network { from: Rank::MAX, to: Rank::MAX }, 0.5),
            ]
        );
    }

    #[test]
    fn test_entry_order_does_not_depend_on_input_order() {
        let plan = AccelerationPlan::from_entries(&[(3, 2.0), (1, 2.0)], &[(1, 0, 2.0), (0, 5, 2.0)]);
        let targets: Vec<FactorTarget> = plan.entries().map(|(target, _)| target).collect();

        assert_eq!(
            targets,
            vec![
                FactorTarget::Hardware { rank: 1 },
                FactorTarget::Hardware { rank: 3 },
                FactorTarget::Network { from: 0, to: 5 },
                FactorTarget::Network { from: 1, to: 0 },
            ]
        );
    }

    #[test]
    fn test_steps_order_and_skip_neutral() {
        let plan = AccelerationPlan::new(
            vec![1.0, 2.0, 0.5],
            vec![vec![1.0, 4.0], vec![3.0, 1.0]],
        );

        assert_eq!(
            plan.steps(),
            vec![
                (FactorTarget::Hardware { rank: 1 }, 2.0),
                (FactorTarget::Hardware { rank: 2 }, 0.5),
                (FactorTarget::Network { from: 0, to: 1 }, 4.0),
                (FactorTarget::Network { from: 1, to: 0 }, 3.0),
            ]
        );
    }

    #[test]
    fn test_validate_plan() {
        assert!(AccelerationPlan::new(vec![1.0, 2.0], vec![]).validate().is_ok());
        assert!(AccelerationPlan::new(vec![1.0], vec![vec![1.0, 0.0]]).validate().is_err());
        assert!(AccelerationPlan::default().is_identity());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(FactorTarget::Network { from: 0, to: 3 }.to_string(), "link 0 -> 3");
    }
}
