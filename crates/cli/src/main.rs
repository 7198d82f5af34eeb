//! Command Line Interface for the lending pool dashboard.
use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use lendbook_domain::value_objects::amount::Amount;
use lendbook_domain::{PoolCatalog, SortKey, format_amount, format_balance};
use lendbook_execution::prelude::*;
use prettytable::{Table, row};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Account held by the demo wallet.
const DEMO_ACCOUNT: &str = "0x9f8e7d6c5b4a39281706f5e4d3c2b1a098765432";

#[derive(Parser)]
#[command(name = "lendbook")]
#[command(about = "Lending pool dashboard: browse pools and supply liquidity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List lending pools
    Pools {
        /// Case-insensitive filter on pool name or curator
        #[arg(short, long, default_value = "")]
        search: String,

        /// Sort key (apy, deposits); anything else keeps table order
        #[arg(long, default_value = "apy")]
        sort: String,

        /// Print pools as JSON
        #[arg(long)]
        json: bool,
    },
    /// Supply liquidity to a pool against a simulated chain
    Supply {
        /// Pool id
        #[arg(short, long)]
        pool: u64,

        /// Amount to supply
        #[arg(short, long, required_unless_present = "max", conflicts_with = "max")]
        amount: Option<String>,

        /// Supply the whole wallet balance
        #[arg(long)]
        max: bool,

        /// Starting wallet balance of the demo account
        #[arg(long, default_value = "500")]
        balance: Decimal,

        /// Reject the approval prompt
        #[arg(long)]
        reject_approval: bool,

        /// Make the deposit transaction revert
        #[arg(long)]
        revert_supply: bool,

        /// Simulated block confirmation delay in milliseconds
        #[arg(long, default_value_t = 250)]
        confirmation_delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pools { search, sort, json } => list_pools(&search, &sort, json),
        Commands::Supply {
            pool,
            amount,
            max: _,
            balance,
            reject_approval,
            revert_supply,
            confirmation_delay_ms,
        } => {
            let config = SupplyConfig::from_env();
            let gateway = seed_gateway(&config, balance, confirmation_delay_ms).await?;
            if reject_approval {
                gateway
                    .fail_next(FailurePoint::Approve, GatewayError::UserRejected)
                    .await;
            }
            if revert_supply {
                gateway
                    .fail_next(
                        FailurePoint::SupplyConfirmation,
                        GatewayError::TransactionReverted("market paused".to_string()),
                    )
                    .await;
            }
            run_supply(gateway, config, pool, amount).await
        }
    }
}

fn list_pools(search: &str, sort: &str, json: bool) -> Result<()> {
    let catalog = PoolCatalog::default();
    let pools = catalog.view(search, SortKey::from(sort));

    if json {
        println!("{}", serde_json::to_string_pretty(&pools)?);
        return Ok(());
    }

    if pools.is_empty() {
        println!("No pools match \"{search}\"");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row![
        "ID", "Pool", "Curator", "Market", "APY", "Deposits", "Utilization", "LLTV", "IRM"
    ]);
    for pool in pools {
        table.add_row(row![
            pool.id,
            pool.name,
            pool.curator,
            format!("{} / {}", pool.loan_token, pool.collateral_token),
            pool.apy,
            format_amount(pool.total_deposits),
            format!("{:.2}%", pool.utilization() * Decimal::ONE_HUNDRED),
            pool.lltv,
            format!("{} ({})", pool.irm.label(), pool.irm),
        ]);
    }
    table.printstd();
    Ok(())
}

/// Builds a simulated chain holding the demo account's balance.
async fn seed_gateway(
    config: &SupplyConfig,
    balance: Decimal,
    confirmation_delay_ms: u64,
) -> Result<Arc<SimulatedGateway>> {
    let token = &config.loan_token;

    let gateway = Arc::new(SimulatedGateway::new(SimulatedGatewayConfig {
        confirmation_delay_ms,
        ..Default::default()
    }));
    gateway.add_token(&token.address, token.decimals).await;
    for pool in PoolCatalog::default().pools() {
        gateway.add_pool(&pool.address, &token.address).await;
    }
    gateway
        .set_wallet_accounts(vec![DEMO_ACCOUNT.to_string()])
        .await;

    let raw = Amount::from_decimal(balance, token.decimals)?.raw;
    gateway.set_balance(&token.address, DEMO_ACCOUNT, raw).await;
    info!(account = DEMO_ACCOUNT, balance = %balance, "Simulated chain seeded");
    Ok(gateway)
}

async fn run_supply(
    gateway: Arc<SimulatedGateway>,
    config: SupplyConfig,
    pool_id: u64,
    amount: Option<String>,
) -> Result<()> {
    let catalog = PoolCatalog::default();
    let pool = catalog
        .get(pool_id)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown pool id {pool_id}"))?;

    let wallet = Arc::new(WalletManager::new(
        gateway.clone(),
        config.loan_token.clone(),
    ));
    wallet.initialize().await;
    let session = wallet.connect().await?;
    let _listener = wallet.spawn_account_listener();
    println!(
        "🔌 Connected {} with {} {}",
        session.short_address().unwrap_or_default(),
        format_balance(session.balance),
        config.loan_token.symbol
    );

    let mut orchestrator = SupplyOrchestrator::new(gateway, wallet.clone(), config);
    let mut events = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event.tx_hash {
                Some(hash) => println!("  [{}] {} (tx {})", event.to, event.message, hash),
                None => println!("  [{}] {}", event.to, event.message),
            }
        }
    });

    println!(
        "📈 {}: {} APY, {} deposited",
        pool.name,
        pool.apy,
        format_amount(pool.total_deposits)
    );
    orchestrator.select(pool.clone()).await?;
    let entered = match amount {
        Some(amount) => {
            orchestrator.set_amount(amount.clone())?;
            amount
        }
        None => orchestrator.set_max_amount().await?,
    };
    println!(
        "💰 Supplying {} {} (est. {} / year)",
        entered,
        pool.loan_token,
        format_balance(pool.estimated_yearly_earnings_for(&entered, wallet.token().decimals))
    );

    let outcome = orchestrator.submit().await;
    let stats = orchestrator.tracker().get_aggregate_stats().await;
    drop(orchestrator);
    printer.await?;

    match outcome {
        Ok(receipt) => {
            println!(
                "✅ Supplied {} {} to {}",
                format_balance(receipt.amount),
                pool.loan_token,
                receipt.pool_name
            );
            println!("   Approval tx: {}", receipt.approval_tx);
            println!("   Supply tx:   {}", receipt.supply_tx);
            println!(
                "   Balance:     {} {}",
                format_balance(receipt.balance_after),
                pool.loan_token
            );
            println!(
                "   Attempts: {}, total supplied: {}",
                stats.total_attempts,
                format_balance(stats.total_supplied)
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "❌ Balance: {} {}",
                format_balance(wallet.session().await.balance),
                pool.loan_token
            );
            Err(supply_failure(e, &pool.name))
        }
    }
}

/// Error returned from `main`, which prints it once.
fn supply_failure(e: SupplyError, pool: &str) -> anyhow::Error {
    anyhow::Error::new(e).context(format!("Supply to {pool} failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_failure_reports_reason_once() {
        let err = supply_failure(
            SupplyError::Gateway(GatewayError::UserRejected),
            "Optimal Kink",
        );
        let report = format!("{err:#}");

        assert_eq!(report, "Supply to Optimal Kink failed: User rejected the request");
        assert_eq!(report.matches("User rejected").count(), 1);
    }

    #[test]
    fn test_supply_args() {
        let cli = Cli::try_parse_from(["lendbook", "supply", "--pool", "1", "--max"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Supply { pool: 1, amount: None, max: true, .. }
        ));
        assert!(Cli::try_parse_from(["lendbook", "supply", "--pool", "1"]).is_err());
        assert!(
            Cli::try_parse_from(["lendbook", "supply", "--pool", "1", "--max", "--amount", "5"])
                .is_err()
        );
    }
}
