//! Domain model for the LendBook dashboard.
//!
//! Pure, synchronous types shared by the execution layer and the CLI:
//! - Lending pool descriptors and their interest-rate models
//! - Tokens, raw on-chain amounts and percentages
//! - The static pool table and the catalog (search, sort, formatting)
//! - The wallet session value

/// Pool catalog: filtering, ranking and display formatting.
pub mod catalog;
/// Pools, tokens and interest-rate models.
pub mod entities;
/// Shared enumerations.
pub mod enums;
/// Domain errors.
pub mod error;
/// Static pool and token table.
pub mod registry;
/// Amounts and percentages.
pub mod value_objects;
/// Wallet session state.
pub mod wallet;

pub use catalog::{PoolCatalog, format_amount, format_balance};
pub use entities::{IrmParams, Pool, Token};
pub use enums::{IrmType, SortKey};
pub use error::AmountError;
pub use value_objects::{amount::Amount, percentage::Percentage};
pub use wallet::WalletSession;
