use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::GlueballError;

/// Reference-axis policies for the cosine-of-theta-star polarization observable.
///
/// Exactly one policy is active in a given analysis; it picks the axis against which
/// the boosted daughter momentum is measured in the pair rest frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolarizationAxis {
    /// The pair's own lab-frame flight direction.
    Helicity,
    /// The normal to the production plane, $`(p_y, -p_x, 0)`$.
    Production,
    /// The fixed beam axis, $`(0, 0, 1)`$.
    Beam,
    /// A uniformly sampled axis drawn from the injected random generator.
    Random,
}

impl Display for PolarizationAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolarizationAxis::Helicity => write!(f, "helicity"),
            PolarizationAxis::Production => write!(f, "production"),
            PolarizationAxis::Beam => write!(f, "beam"),
            PolarizationAxis::Random => write!(f, "random"),
        }
    }
}

impl FromStr for PolarizationAxis {
    type Err = GlueballError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "helicity" | "hx" | "hel" => Ok(Self::Helicity),
            "production" | "prod" => Ok(Self::Production),
            "beam" => Ok(Self::Beam),
            "random" | "rand" => Ok(Self::Random),
            _ => Err(GlueballError::ParseError {
                name: s.to_string(),
                object: "PolarizationAxis".to_string(),
            }),
        }
    }
}

/// Which leg of a two-prong candidate a daughter track belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Leg {
    /// The positively charged daughter.
    Positive,
    /// The negatively charged daughter.
    Negative,
}

impl Leg {
    /// The charge sign expected for tracks on this leg.
    pub fn sign(&self) -> i8 {
        match self {
            Leg::Positive => 1,
            Leg::Negative => -1,
        }
    }
}
