use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrmType {
    Linear,
    Kink,
}

impl fmt::Display for IrmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrmType::Linear => write!(f, "Linear"),
            IrmType::Kink => write!(f, "Kink"),
        }
    }
}

/// Ordering applied to a catalog view.
///
/// Unknown keys map to [`SortKey::Unsorted`], which keeps the table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Highest APY first.
    #[default]
    Apy,
    /// Largest total deposits first.
    Deposits,
    /// Table order.
    Unsorted,
}

impl From<&str> for SortKey {
    fn from(key: &str) -> Self {
        match key {
            "apy" => SortKey::Apy,
            "deposits" => SortKey::Deposits,
            _ => SortKey::Unsorted,
        }
    }
}

impl FromStr for SortKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortKey::from(s))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Apy => write!(f, "apy"),
            SortKey::Deposits => write!(f, "deposits"),
            SortKey::Unsorted => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!(SortKey::from("apy"), SortKey::Apy);
        assert_eq!(SortKey::from("deposits"), SortKey::Deposits);
        assert_eq!(SortKey::from("curator"), SortKey::Unsorted);
        assert_eq!(SortKey::from("APY"), SortKey::Unsorted);
        assert_eq!("".parse::<SortKey>(), Ok(SortKey::Unsorted));
    }
}
