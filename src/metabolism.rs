use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(TrackerError::invalid(format!("unrecognized gender '{}'", other))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// Body parameters used for the metabolic estimate.
/// Age in years, height in cm, weight in kg. Zero means "not given".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhysicalParams {
    pub gender: Option<Gender>,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
}

fn is_given(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl PhysicalParams {
    /// Estimated daily energy requirement in kcal (Harris-Benedict).
    ///
    /// Returns `None` when any parameter is missing or non-positive. Callers
    /// must not read `None` as zero.
    pub fn metabolic_estimate(&self) -> Option<f64> {
        let gender = self.gender?;
        if !(is_given(self.age) && is_given(self.height) && is_given(self.weight)) {
            return None;
        }
        let estimate = match gender {
            Gender::Male => 66.473 + 13.7561 * self.weight + 5.0033 * self.height + 6.755 * self.age,
            Gender::Female => {
                655.0955 + 9.5634 * self.weight + 1.8496 * self.height + 4.6756 * self.age
            }
        };
        Some(estimate)
    }
}
