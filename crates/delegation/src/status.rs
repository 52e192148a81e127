//! Delegation status and the filter used by queries.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DelegationError;

/// The status of a delegation at a given bitcoin height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcDelegationStatus {
    /// Inside its active window but still waiting for a covenant quorum.
    Pending,

    /// Inside its active window with a covenant quorum. Only active delegations have voting power.
    Active,

    /// The staker asked to unbond and the covenant quorum has not signed the unbonding yet.
    Unbonding,

    /// Unbonded, expired or not started yet.
    Unbonded,
}

impl BtcDelegationStatus {
    /// Returns the lowercase name used in queries.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Unbonding => "unbonding",
            Self::Unbonded => "unbonded",
        }
    }
}

impl fmt::Display for BtcDelegationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BtcDelegationStatus {
    type Err = DelegationError;

    /// Parses one of the four concrete statuses. Use [`DelegationStatusFilter`] to also accept
    /// `any`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<DelegationStatusFilter>()? {
            DelegationStatusFilter::Status(status) => Ok(status),
            DelegationStatusFilter::Any => Err(DelegationError::InvalidStatus(s.to_string())),
        }
    }
}

/// Selects delegations by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegationStatusFilter {
    /// Only delegations with the given status.
    Status(BtcDelegationStatus),

    /// Every delegation.
    Any,
}

impl DelegationStatusFilter {
    /// Returns `true` if `status` is selected.
    pub fn matches(&self, status: BtcDelegationStatus) -> bool {
        match self {
            Self::Status(expected) => *expected == status,
            Self::Any => true,
        }
    }
}

impl From<BtcDelegationStatus> for DelegationStatusFilter {
    fn from(status: BtcDelegationStatus) -> Self {
        Self::Status(status)
    }
}

impl fmt::Display for DelegationStatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => status.fmt(f),
            Self::Any => f.write_str("any"),
        }
    }
}

impl FromStr for DelegationStatusFilter {
    type Err = DelegationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "pending" => BtcDelegationStatus::Pending,
            "active" => BtcDelegationStatus::Active,
            "unbonding" => BtcDelegationStatus::Unbonding,
            "unbonded" => BtcDelegationStatus::Unbonded,
            "any" => return Ok(Self::Any),
            _ => return Err(DelegationError::InvalidStatus(s.to_string())),
        };

        Ok(Self::Status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_strings() {
        for status in [
            BtcDelegationStatus::Pending,
            BtcDelegationStatus::Active,
            BtcDelegationStatus::Unbonding,
            BtcDelegationStatus::Unbonded,
        ] {
            assert_eq!(status.to_string().parse::<BtcDelegationStatus>().unwrap(), status);
            assert_eq!(
                status.as_str().parse::<DelegationStatusFilter>().unwrap(),
                DelegationStatusFilter::Status(status)
            );
        }

        assert_eq!(
            "any".parse::<DelegationStatusFilter>().unwrap(),
            DelegationStatusFilter::Any
        );
        assert!(matches!(
            "any".parse::<BtcDelegationStatus>(),
            Err(DelegationError::InvalidStatus(_))
        ));
        assert!(matches!(
            "Active".parse::<DelegationStatusFilter>(),
            Err(DelegationError::InvalidStatus(_))
        ));
    }

    #[test]
    fn filter_matches() {
        assert!(DelegationStatusFilter::Any.matches(BtcDelegationStatus::Unbonded));
        assert!(DelegationStatusFilter::from(BtcDelegationStatus::Active)
            .matches(BtcDelegationStatus::Active));
        assert!(!DelegationStatusFilter::from(BtcDelegationStatus::Active)
            .matches(BtcDelegationStatus::Pending));
    }

    #[test]
    fn serde_is_lowercase() {
        let json = serde_json::to_string(&BtcDelegationStatus::Unbonding).unwrap();
        assert_eq!(json, "\"unbonding\"");
    }
}
