pub mod args;
mod history;

use std::time::Duration;

use alloy::{
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use anyhow::Context;
use args::Cli;
use strike_sdk::{Chain, indexer::IndexerClient, rpc::ChainClient};
use tokio_util::sync::CancellationToken;

use crate::args::Commands;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = if cli.rpc == args::DEFAULT_RPC_PROVIDER || cli.rpc_throttle.is_some() {
        // Apply throttling with default RPC
        RpcClient::builder()
            .layer(ThrottleLayer::new(cli.rpc_throttle.unwrap_or(args::DEFAULT_RPC_THROTTLING)))
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    } else {
        RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(&cli.rpc)
            .await
            .context("connecting to RPC")?
    };
    client.set_poll_interval(Duration::from_millis(100));
    let provider = ProviderBuilder::new().connect_client(client);

    let testnet = Chain::testnet();
    let chain = Chain::custom(
        provider.get_chain_id().await?,
        cli.vault.unwrap_or(testnet.vault()),
        testnet.base_token(),
        testnet.quote_token(),
        testnet.deployed_at_block(),
    );

    let chain_client = ChainClient::connect(chain, provider)
        .await
        .context("connecting to vault")?;
    let indexer = IndexerClient::new(&cli.indexer);

    let cancellation_signal = CancellationToken::new();
    let cancellation_token = cancellation_signal.child_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        cancellation_signal.cancel();
    });

    match &cli.command {
        Commands::History { owner, from_block, from_timestamp, bucket, breakdown } => {
            tokio::select! {
                result = history::render(
                    &indexer,
                    &chain_client,
                    *owner,
                    *from_block,
                    *from_timestamp,
                    *bucket,
                    *breakdown,
                ) => result?,
                _ = cancellation_token.cancelled() => (),
            }
        },
    }

    Ok(())
}
