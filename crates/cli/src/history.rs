use alloy::primitives::Address;
use colored::Colorize;
use fastnum::D128;
use strike_sdk::{
    history::{self, DataWarning},
    indexer::IndexerClient,
    rpc::ChainClient,
    types::{BlockPointer, PortfolioSnapshot, ValueCategory},
};
use tabled::{Table, Tabled, settings::Style};

#[allow(clippy::too_many_arguments)]
pub(crate) async fn render<P: alloy::providers::Provider>(
    indexer: &IndexerClient,
    chain: &ChainClient<P>,
    owner: Address,
    from_block: u64,
    from_timestamp: u64,
    bucket: Option<u64>,
    breakdown: bool,
) -> anyhow::Result<()> {
    let window_start = BlockPointer::new(from_block, from_timestamp);
    let history = history::reconstruct_portfolio_history(
        indexer,
        chain,
        indexer,
        owner,
        window_start,
        bucket,
    )
    .await?;

    for warning in &history.warnings {
        match warning {
            DataWarning::StreamUnavailable { stream, reason } => {
                eprintln!(
                    "{} {:?}: {}",
                    "stream degraded".yellow(),
                    stream,
                    reason
                );
            },
            DataWarning::ImplausibleValue { stream, instant, value } => {
                eprintln!(
                    "{} {:?} at {}: {}",
                    "implausible value".yellow(),
                    stream,
                    instant,
                    value
                );
            },
        }
    }

    let mut table = if breakdown {
        Table::new(history.snapshots.iter().map(BreakdownRow::from))
    } else {
        Table::new(history.snapshots.iter().map(TotalRow::from))
    };
    table.with(Style::sharp());
    println!("{}", table);

    if let Some(present) = history.snapshots.last() {
        println!("\nNow: {:#}", present);
    }

    Ok(())
}

fn signed(value: D128) -> String {
    if value.is_negative() {
        value.to_string().red().to_string()
    } else {
        value.to_string().green().to_string()
    }
}

#[derive(Tabled)]
struct TotalRow {
    #[tabled(rename = "Block")]
    block: u64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Total Value")]
    total: String,
    #[tabled(rename = "Events")]
    events: usize,
}

impl From<&PortfolioSnapshot> for TotalRow {
    fn from(snapshot: &PortfolioSnapshot) -> Self {
        Self {
            block: snapshot.instant.block_number(),
            time: snapshot.instant.to_string(),
            total: signed(snapshot.total_value),
            events: snapshot.events.len(),
        }
    }
}

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Block")]
    block: u64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Base")]
    base: String,
    #[tabled(rename = "Stable")]
    stable: String,
    #[tabled(rename = "Long Options")]
    long_options: String,
    #[tabled(rename = "Short Options")]
    short_options: String,
    #[tabled(rename = "Collateral")]
    collateral: String,
    #[tabled(rename = "Total Value")]
    total: String,
}

impl From<&PortfolioSnapshot> for BreakdownRow {
    fn from(snapshot: &PortfolioSnapshot) -> Self {
        Self {
            block: snapshot.instant.block_number(),
            time: snapshot.instant.to_string(),
            base: snapshot.value(ValueCategory::BaseAsset).to_string(),
            stable: snapshot.value(ValueCategory::StableAsset).to_string(),
            long_options: snapshot.value(ValueCategory::LongOptions).to_string(),
            short_options: signed(snapshot.value(ValueCategory::ShortOptions)),
            collateral: snapshot.value(ValueCategory::Collateral).to_string(),
            total: signed(snapshot.total_value),
        }
    }
}
