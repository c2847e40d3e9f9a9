use alloy::primitives::Address;
use clap::{Parser, Subcommand};

pub(crate) const DEFAULT_RPC_PROVIDER: &str = "https://testnet-rpc.monad.xyz";
pub(crate) const DEFAULT_INDEXER: &str = "https://indexer.strike.exchange/v1";
pub(crate) const DEFAULT_RPC_THROTTLING: u32 = 15;

#[derive(Parser, Debug)]
#[command(name = "strike-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// RPC endpoint to connect to
    #[arg(long, global = true, default_value_t = DEFAULT_RPC_PROVIDER.to_string())]
    pub rpc: String,

    /// RPC throttling (req/sec) [default: 15 for default RPC provider and
    /// none for custom]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// Indexer base URL
    #[arg(long, global = true, default_value_t = DEFAULT_INDEXER.to_string())]
    pub indexer: String,

    /// Vault smart contract address [default: testnet deployment]
    #[arg(long, global = true)]
    pub vault: Option<Address>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconstruct and print an owner's portfolio valuation history
    History {
        /// Owner account address
        #[arg(long)]
        owner: Address,

        /// Block number the window starts at
        #[arg(long)]
        from_block: u64,

        /// Unix timestamp of the window start block
        #[arg(long)]
        from_timestamp: u64,

        /// Resample bucket width in seconds [default: adaptive from span]
        #[arg(long)]
        bucket: Option<u64>,

        /// Print per-category breakdown columns
        #[arg(long, default_value_t = false)]
        breakdown: bool,
    },
}
