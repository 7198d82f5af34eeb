use crate::error::AmountError;
use primitive_types::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest scale a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u8 = 28;

/// A raw on-chain token quantity together with the token's decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::zero(), decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Parses a user-entered decimal string into raw units.
    ///
    /// Accepts plain non-negative decimals (`"100"`, `"0.5"`, `".5"`, `"5."`).
    /// Exponents, signs and more fraction digits than `decimals` are rejected.
    pub fn parse(input: &str, decimals: u8) -> Result<Self, AmountError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountError::Negative);
        }

        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if fraction.len() > decimals as usize {
            return Err(AmountError::TooManyDecimals {
                found: fraction.len(),
                max: decimals,
            });
        }

        let digits = format!(
            "{}{:0<width$}",
            whole,
            fraction,
            width = decimals as usize
        );
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::zero(decimals));
        }
        let raw = U256::from_dec_str(digits).map_err(|_| AmountError::Overflow)?;
        Ok(Self::new(raw, decimals))
    }

    /// Converts a display decimal into raw units, truncating extra precision.
    pub fn from_decimal(d: Decimal, decimals: u8) -> Result<Self, AmountError> {
        if d.is_sign_negative() && !d.is_zero() {
            return Err(AmountError::Negative);
        }
        if decimals > MAX_DECIMAL_SCALE {
            return Err(AmountError::Overflow);
        }
        let mut scaled = d.round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
        scaled.rescale(decimals as u32);
        if scaled.scale() != decimals as u32 {
            return Err(AmountError::Overflow);
        }
        let mantissa = u128::try_from(scaled.mantissa()).map_err(|_| AmountError::Negative)?;
        Ok(Self::new(U256::from(mantissa), decimals))
    }

    /// Converts raw units back into a display decimal.
    pub fn to_decimal(&self) -> Result<Decimal, AmountError> {
        if self.raw > U256::from(i128::MAX as u128) || self.decimals > MAX_DECIMAL_SCALE {
            return Err(AmountError::Overflow);
        }
        let raw = self.raw.as_u128() as i128;
        Decimal::try_from_i128_with_scale(raw, self.decimals as u32)
            .map_err(|_| AmountError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Ok(d) => write!(f, "{}", d),
            Err(_) => write!(f, "{}e-{}", self.raw, self.decimals),
        }
    }
}
