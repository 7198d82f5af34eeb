use crate::enums::IrmType;
use crate::value_objects::percentage::Percentage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interest-rate model parameters. Display only; rates are not evaluated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IrmParams {
    /// Rate grows with a single slope from a base.
    Linear { base: Percentage, slope: Percentage },
    /// Two slopes pivoting at the `kink` utilization.
    Kink {
        base: Percentage,
        kink: Percentage,
        low_slope: Percentage,
        high_slope: Percentage,
    },
}

impl IrmParams {
    pub fn irm_type(&self) -> IrmType {
        match self {
            IrmParams::Linear { .. } => IrmType::Linear,
            IrmParams::Kink { .. } => IrmType::Kink,
        }
    }

    /// Label shown under the pool name, e.g. `"Kink IRM"`.
    pub fn label(&self) -> String {
        format!("{} IRM", self.irm_type())
    }
}

impl fmt::Display for IrmParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrmParams::Linear { base, slope } => write!(f, "base {}, slope {}", base, slope),
            IrmParams::Kink {
                base,
                kink,
                low_slope,
                high_slope,
            } => write!(
                f,
                "base {}, kink {}, slopes {} / {}",
                base, kink, low_slope, high_slope
            ),
        }
    }
}
