//! Planner kinds

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available planner implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    /// Build the requested images and their descendants, parents first
    #[default]
    Cascade,
    /// Build only the requested images, independently
    Single,
}

impl PlanKind {
    /// Identifier used in settings and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            PlanKind::Cascade => "cascade",
            PlanKind::Single => "single",
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for PlanKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cascade" => Ok(PlanKind::Cascade),
            "single" => Ok(PlanKind::Single),
            other => Err(Error::unknown_plan(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_kind_from_str() {
        assert_eq!("cascade".parse::<PlanKind>().unwrap(), PlanKind::Cascade);
        assert_eq!("single".parse::<PlanKind>().unwrap(), PlanKind::Single);

        let err = "parallel".parse::<PlanKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownPlan { ref id } if id == "parallel"));
    }

    #[test]
    fn test_plan_kind_display_roundtrip() {
        for kind in [PlanKind::Cascade, PlanKind::Single] {
            assert_eq!(kind.to_string().parse::<PlanKind>().unwrap(), kind);
        }
    }
}
