use thiserror::Error;

/// Errors raised while converting between display decimals and raw token units.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Malformed amount: {0}")]
    Malformed(String),

    #[error("Amount has {found} fraction digits, token supports {max}")]
    TooManyDecimals { found: usize, max: u8 },

    #[error("Amount is negative")]
    Negative,

    #[error("Amount overflows the supported range")]
    Overflow,
}
