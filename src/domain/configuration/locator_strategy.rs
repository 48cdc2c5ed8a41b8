use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::AppError;

/// Which locator finds insertion points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorStrategy {
    /// Local pattern rules only.
    Pattern,
    /// Ask the text model.
    #[default]
    Assisted,
}

impl LocatorStrategy {
    pub fn label(self) -> &'static str {
        match self {
            LocatorStrategy::Pattern => "pattern",
            LocatorStrategy::Assisted => "assisted",
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LocatorStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pattern" => Ok(LocatorStrategy::Pattern),
            "assisted" => Ok(LocatorStrategy::Assisted),
            _ => Err(AppError::InvalidConfig(format!(
                "Invalid locator strategy '{}'. Expected 'pattern' or 'assisted'.",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_labels() {
        assert_eq!("pattern".parse::<LocatorStrategy>().unwrap(), LocatorStrategy::Pattern);
        assert_eq!("assisted".parse::<LocatorStrategy>().unwrap(), LocatorStrategy::Assisted);
        assert!("regex".parse::<LocatorStrategy>().is_err());
    }
}
