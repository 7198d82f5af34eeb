//! Static pool and token table of the LendBook deployment.

use crate::entities::{IrmParams, Pool, Token};
use crate::value_objects::percentage::Percentage;
use rust_decimal::Decimal;

/// Mock USDC, the loan token of every listed pool.
pub const LOAN_TOKEN_ADDRESS: &str = "0x55683adB8A326cc7eb0C035f3c64bbf1272c7B0B";

/// Mock WETH, the collateral token of every listed pool.
pub const COLLATERAL_TOKEN_ADDRESS: &str = "0x52a3d539AC082CcdBae14cd2490543Ccb2C50c58";

/// On-chain decimals of the loan token.
pub const LOAN_TOKEN_DECIMALS: u8 = 6;

pub fn loan_token() -> Token {
    Token::new(LOAN_TOKEN_ADDRESS, "USDC", LOAN_TOKEN_DECIMALS, "Mock USD Coin")
}

pub fn collateral_token() -> Token {
    Token::new(COLLATERAL_TOKEN_ADDRESS, "WETH", 18, "Mock Wrapped Ether")
}

fn usdc_weth_pool(
    id: u64,
    address: &str,
    name: &str,
    curator: &str,
    apy: Percentage,
    total_deposits: i64,
    irm: IrmParams,
) -> Pool {
    Pool {
        id,
        address: address.to_string(),
        name: name.to_string(),
        curator: curator.to_string(),
        loan_token: "USDC".to_string(),
        collateral_token: "WETH".to_string(),
        apy,
        total_deposits: Decimal::from(total_deposits),
        total_borrowed: Decimal::ZERO,
        lltv: Percentage::from_bps(8000),
        irm,
    }
}

/// The listed pools, in table order.
pub fn default_pools() -> Vec<Pool> {
    vec![
        usdc_weth_pool(
            0,
            "0x9804Be3066EbbC26b97fe3e223710747314A529f",
            "Conservative Linear",
            "Steakhouse Financial",
            Percentage::from_bps(423),
            478_330,
            IrmParams::Linear {
                base: Percentage::from_bps(200),
                slope: Percentage::from_bps(1300),
            },
        ),
        usdc_weth_pool(
            1,
            "0xf35498dDbA364495b44Aafb67C7C3e5bc60300a2",
            "Aggressive Linear",
            "DeFi Capital",
            Percentage::from_bps(585),
            100_000,
            IrmParams::Linear {
                base: Percentage::from_bps(500),
                slope: Percentage::from_bps(2500),
            },
        ),
        usdc_weth_pool(
            2,
            "0x3dC785aa7d88a90cf7a1F312d0B17BFD9AA7e0e2",
            "Optimal Kink",
            "Gauntlet",
            Percentage::from_bps(312),
            100_000,
            IrmParams::Kink {
                base: Percentage::from_bps(100),
                kink: Percentage::from_bps(8000),
                low_slope: Percentage::from_bps(1125),
                high_slope: Percentage::from_bps(35000),
            },
        ),
        usdc_weth_pool(
            3,
            "0x75288A8156DB6ba8eA902dc318B80FA551F5421E",
            "High Efficiency Kink",
            "Block Analitica",
            Percentage::from_bps(421),
            100_000,
            IrmParams::Kink {
                base: Percentage::from_bps(200),
                kink: Percentage::from_bps(9000),
                low_slope: Percentage::from_bps(1111),
                high_slope: Percentage::from_bps(138000),
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::IrmType;

    #[test]
    fn test_default_pools() {
        let pools = default_pools();
        assert_eq!(pools.len(), 4);
        assert!(pools.iter().enumerate().all(|(i, p)| p.id == i as u64));
        assert_eq!(pools[0].total_deposits, Decimal::from(478_330));
        assert_eq!(pools[2].irm_type(), IrmType::Kink);
        assert_eq!(loan_token().decimals, LOAN_TOKEN_DECIMALS);
    }
}
