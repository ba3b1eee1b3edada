//! Output link functions.

use std::fmt;
use std::str::FromStr;

use crate::model::ConfigError;

/// Maps a raw score to the reported prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Link {
    /// `x ↦ x`
    #[default]
    Identity,
    /// `x ↦ 1 / (1 + e^{-x})`
    Logistic,
}

impl Link {
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Logistic => 1.0 / (1.0 + (-x).exp()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Logistic => "logistic",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "Identity link function",
            Self::Logistic => "Logistic link function",
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Link {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Self::Identity),
            "logistic" => Ok(Self::Logistic),
            other => Err(ConfigError::UnknownLink(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn apply() {
        assert_eq!(Link::Identity.apply(-3.5), -3.5);
        assert_abs_diff_eq!(Link::Logistic.apply(0.0), 0.5);
        assert_eq!(Link::Logistic.apply(f64::INFINITY), 1.0);
        assert_eq!(Link::Logistic.apply(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn parse() {
        assert_eq!("logistic".parse::<Link>().unwrap(), Link::Logistic);
        assert_eq!("identity".parse::<Link>().unwrap(), Link::Identity);
        assert!("softmax".parse::<Link>().is_err());
        assert_eq!(Link::Logistic.description(), "Logistic link function");
    }
}
