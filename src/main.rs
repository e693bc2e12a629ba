//! pathfinder-swap - execute one Router Pathfinder cross-chain swap
//!
//! Fetches a quote, makes sure the source token allowance covers the amount,
//! then signs and submits the quoted transaction on the configured chain.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

mod allowance;
mod chain;
mod config;
mod error;
mod quote;
mod swap;
mod tx;

use chain::wallet::{load_wallet, resolve_user_address};
use chain::{ChainClient, EvmChainClient};
use config::Settings;
use quote::{PathfinderClient, SwapRequest};
use swap::{ApprovalStatus, SwapExecutor, TransferStatus};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    init_logging();

    info!("Starting pathfinder-swap v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration for {} (chain {})",
        settings.chain.name, settings.chain.chain_id
    );

    let quotes = PathfinderClient::new(&settings.pathfinder)?;
    info!("Quoting via {}", quotes.quote_url());

    // Set up the signing wallet
    let wallet = load_wallet(&settings.wallet, settings.chain.chain_id)?;
    let client = Arc::new(EvmChainClient::connect(settings.chain.clone(), wallet).await?);

    let user_address = resolve_user_address(&settings.wallet, client.address())?;
    let request = SwapRequest::from_config(&settings.swap, user_address)?;

    let executor = SwapExecutor::new(
        quotes,
        client.clone(),
        &settings.execution,
        settings.chain.confirmations,
    );

    let report = match executor
        .execute(&request, settings.swap.approval_address)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            if e.is_fatal_before_chain() {
                error!("Swap aborted before the swap transaction was sent: {}", e);
            } else {
                error!("Swap submission failed on chain {}: {}", client.chain_id(), e);
            }
            return Err(e.into());
        }
    };

    match &report.approval {
        ApprovalStatus::Completed(outcome) => info!("Approval: {:?}", outcome),
        ApprovalStatus::Failed { reason } => warn!("Approval failed: {}", reason),
    }

    match &report.transfer {
        TransferStatus::Confirmed { block } => info!(
            "Swap {:?} to {:?} confirmed in block {:?}",
            report.transfer_hash, report.execution_target, block
        ),
        TransferStatus::Failed { reason } => error!(
            "Swap {:?} to {:?} failed: {}",
            report.transfer_hash, report.execution_target, reason
        ),
    }

    if !report.is_confirmed() {
        anyhow::bail!("Swap {:?} was not confirmed", report.transfer_hash);
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,pathfinder_swap=debug,hyper=warn,reqwest=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
