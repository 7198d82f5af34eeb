use crate::entities::irm::IrmParams;
use crate::enums::IrmType;
use crate::value_objects::amount::Amount;
use crate::value_objects::percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable descriptor of a lending market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Market id passed to the pool contract's `supply` entry point.
    pub id: u64,
    /// Pool contract address.
    pub address: String,
    pub name: String,
    pub curator: String,
    pub loan_token: String,
    pub collateral_token: String,
    /// Precomputed supply APY, display only.
    pub apy: Percentage,
    pub total_deposits: Decimal,
    pub total_borrowed: Decimal,
    /// Liquidation loan-to-value ceiling.
    pub lltv: Percentage,
    pub irm: IrmParams,
}

impl Pool {
    pub fn irm_type(&self) -> IrmType {
        self.irm.irm_type()
    }

    /// Borrowed over deposited, zero for an empty pool.
    pub fn utilization(&self) -> Decimal {
        if self.total_deposits.is_zero() {
            return Decimal::ZERO;
        }
        self.total_borrowed / self.total_deposits
    }

    /// Yearly interest a deposit of `amount` would earn at the current APY.
    pub fn estimated_yearly_earnings(&self, amount: Decimal) -> Decimal {
        amount * self.apy.as_fraction()
    }

    /// Same as [`Pool::estimated_yearly_earnings`] for raw user input; unparseable input earns zero.
    pub fn estimated_yearly_earnings_for(&self, input: &str, decimals: u8) -> Decimal {
        Amount::parse(input, decimals)
            .and_then(|a| a.to_decimal())
            .map(|d| self.estimated_yearly_earnings(d))
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pool(deposits: Decimal, borrowed: Decimal) -> Pool {
        Pool {
            id: 7,
            address: "0xpool".to_string(),
            name: "Test".to_string(),
            curator: "Curator".to_string(),
            loan_token: "USDC".to_string(),
            collateral_token: "WETH".to_string(),
            apy: Percentage::new(dec!(5.85)),
            total_deposits: deposits,
            total_borrowed: borrowed,
            lltv: Percentage::new(dec!(80)),
            irm: IrmParams::Linear {
                base: Percentage::new(dec!(5)),
                slope: Percentage::new(dec!(25)),
            },
        }
    }

    #[test]
    fn test_utilization() {
        assert_eq!(pool(dec!(1000), dec!(250)).utilization(), dec!(0.25));
        assert_eq!(pool(Decimal::ZERO, dec!(10)).utilization(), Decimal::ZERO);
    }

    #[test]
    fn test_estimated_earnings() {
        let p = pool(dec!(100000), Decimal::ZERO);
        assert_eq!(p.estimated_yearly_earnings(dec!(1000)), dec!(58.5));
        assert_eq!(p.estimated_yearly_earnings_for("200", 6), dec!(11.7));
        assert_eq!(p.estimated_yearly_earnings_for("oops", 6), Decimal::ZERO);
        assert_eq!(p.irm_type(), IrmType::Linear);
    }
}
