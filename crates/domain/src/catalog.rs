//! Pool catalog: a filtered, ranked view over the pool table.
//!
//! Every view is a pure function of `(pools, query, sort key)`; the
//! underlying pools are never reordered or mutated.

use crate::entities::Pool;
use crate::enums::SortKey;
use crate::registry;
use rust_decimal::{Decimal, RoundingStrategy};

/// Read-only collection of pools with search and ranking.
#[derive(Debug, Clone)]
pub struct PoolCatalog {
    pools: Vec<Pool>,
}

impl PoolCatalog {
    /// Creates a catalog over the given pools.
    #[must_use]
    pub fn new(pools: Vec<Pool>) -> Self {
        Self { pools }
    }

    /// All pools in table order.
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Looks up a pool by market id.
    pub fn get(&self, id: u64) -> Option<&Pool> {
        self.pools.iter().find(|p| p.id == id)
    }

    /// Pools whose name or curator contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&Pool> {
        search(&self.pools, query)
    }

    /// All pools ordered by `key`.
    pub fn sort(&self, key: SortKey) -> Vec<&Pool> {
        let mut view: Vec<&Pool> = self.pools.iter().collect();
        sort_pools(&mut view, key);
        view
    }

    /// Filter-then-sort view.
    pub fn view(&self, query: &str, key: SortKey) -> Vec<&Pool> {
        let mut view = self.search(query);
        sort_pools(&mut view, key);
        view
    }
}

impl Default for PoolCatalog {
    fn default() -> Self {
        Self::new(registry::default_pools())
    }
}

/// Case-insensitive substring match on name or curator. An empty query matches all.
pub fn search<'a>(pools: &'a [Pool], query: &str) -> Vec<&'a Pool> {
    let needle = query.to_lowercase();
    pools
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.curator.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Stable descending sort; [`SortKey::Unsorted`] leaves the order untouched.
pub fn sort_pools(pools: &mut [&Pool], key: SortKey) {
    match key {
        SortKey::Apy => pools.sort_by(|a, b| b.apy.cmp(&a.apy)),
        SortKey::Deposits => pools.sort_by(|a, b| b.total_deposits.cmp(&a.total_deposits)),
        SortKey::Unsorted => {}
    }
}

/// Compact dollar amount: `$1.23M`, `$4.56K` or `$7.89`.
pub fn format_amount(n: Decimal) -> String {
    let million = Decimal::from(1_000_000);
    let thousand = Decimal::from(1_000);

    if n >= million {
        format!("${}M", two_places(n / million))
    } else if n >= thousand {
        format!("${}K", two_places(n / thousand))
    } else {
        format!("${}", two_places(n))
    }
}

/// Balance with thousands separators and at most two fraction digits (`1,234.5`).
pub fn format_balance(n: Decimal) -> String {
    let rounded = n
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((&text, ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

fn two_places(n: Decimal) -> String {
    let mut rounded = n.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::IrmParams;
    use crate::value_objects::percentage::Percentage;
    use rust_decimal_macros::dec;

    fn pool(id: u64, name: &str, curator: &str, apy: Decimal, deposits: Decimal) -> Pool {
        Pool {
            id,
            address: format!("0xpool{id}"),
            name: name.to_string(),
            curator: curator.to_string(),
            loan_token: "USDC".to_string(),
            collateral_token: "WETH".to_string(),
            apy: Percentage::new(apy),
            total_deposits: deposits,
            total_borrowed: Decimal::ZERO,
            lltv: Percentage::new(dec!(80)),
            irm: IrmParams::Linear {
                base: Percentage::new(dec!(2)),
                slope: Percentage::new(dec!(13)),
            },
        }
    }

    fn ids(pools: &[&Pool]) -> Vec<u64> {
        pools.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_search_matches_name_or_curator() {
        let catalog = PoolCatalog::default();

        assert_eq!(ids(&catalog.search("kink")), vec![2, 3]);
        assert_eq!(ids(&catalog.search("GAUNTLET")), vec![2]);
        assert_eq!(ids(&catalog.search("")), vec![0, 1, 2, 3]);
        assert!(catalog.search("nothing here").is_empty());

        for query in ["linear", "fi", "a", "Block"] {
            let needle = query.to_lowercase();
            for p in catalog.search(query) {
                assert!(
                    p.name.to_lowercase().contains(&needle)
                        || p.curator.to_lowercase().contains(&needle)
                );
                assert!(catalog.pools().contains(p));
            }
        }
    }

    #[test]
    fn test_sort_by_apy_and_deposits() {
        let catalog = PoolCatalog::default();

        let by_apy = catalog.sort(SortKey::Apy);
        assert_eq!(ids(&by_apy), vec![1, 0, 3, 2]);
        assert!(by_apy.windows(2).all(|w| w[0].apy >= w[1].apy));

        let by_deposits = catalog.sort(SortKey::Deposits);
        assert!(
            by_deposits
                .windows(2)
                .all(|w| w[0].total_deposits >= w[1].total_deposits)
        );
        // Ties keep table order.
        assert_eq!(ids(&by_deposits), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unknown_sort_key_keeps_order() {
        let catalog = PoolCatalog::new(vec![
            pool(5, "B", "x", dec!(1), dec!(10)),
            pool(3, "A", "y", dec!(9), dec!(90)),
            pool(8, "C", "z", dec!(4), dec!(40)),
        ]);

        let view = catalog.sort(SortKey::from("curator"));
        assert_eq!(ids(&view), vec![5, 3, 8]);
        assert_eq!(ids(&catalog.view("", SortKey::from("tvl"))), vec![5, 3, 8]);
    }

    #[test]
    fn test_view_filters_then_sorts() {
        let catalog = PoolCatalog::new(vec![
            pool(0, "Aggressive Linear", "DeFi Capital", dec!(5.85), dec!(100000)),
            pool(1, "Optimal Kink", "Gauntlet", dec!(3.12), dec!(100000)),
            pool(2, "Slow Linear", "Gauntlet", dec!(7.00), dec!(5000)),
        ]);

        assert_eq!(ids(&catalog.view("gauntlet", SortKey::Apy)), vec![2, 1]);
        assert_eq!(ids(&catalog.view("", SortKey::Apy)), vec![2, 0, 1]);
        assert_eq!(ids(&catalog.view("linear", SortKey::Deposits)), vec![0, 2]);
        assert_eq!(catalog.get(1).map(|p| p.name.as_str()), Some("Optimal Kink"));
        assert!(catalog.get(42).is_none());
    }

    #[test]
    fn test_higher_apy_ranks_first() {
        let catalog = PoolCatalog::new(vec![
            pool(2, "Optimal Kink", "Gauntlet", dec!(3.12), dec!(100000)),
            pool(1, "Aggressive Linear", "DeFi Capital", dec!(5.85), dec!(100000)),
        ]);

        assert_eq!(catalog.sort(SortKey::Apy)[0].apy.value(), dec!(5.85));
    }

    #[test]
    fn test_format_amount_boundaries() {
        assert_eq!(format_amount(dec!(0)), "$0.00");
        assert_eq!(format_amount(dec!(999)), "$999.00");
        assert_eq!(format_amount(dec!(1000)), "$1.00K");
        assert_eq!(format_amount(dec!(999999)), "$1000.00K");
        assert_eq!(format_amount(dec!(1000000)), "$1.00M");
        assert_eq!(format_amount(dec!(478330)), "$478.33K");
        assert_eq!(format_amount(dec!(12.345)), "$12.35");
        assert_eq!(format_amount(dec!(2500000)), "$2.50M");
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance(dec!(500.00)), "500");
        assert_eq!(format_balance(dec!(1234.5)), "1,234.5");
        assert_eq!(format_balance(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_balance(dec!(0.004)), "0");
        assert_eq!(format_balance(dec!(999.999)), "1,000");
    }
}
