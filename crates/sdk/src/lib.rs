//! [`Strike`] options DEX SDK.
//!
//! # Overview
//!
//! Reads present-time vault/token state over RPC and historical events
//! from the Strike indexer, and reconstructs consistent portfolio
//! valuation time series from them.
//!
//! The chain cannot answer historical state queries, so
//! [`history::reconstruct_portfolio_history`] derives the past from the
//! present: current balances and open positions are replayed backwards
//! through the indexer's event log, the per-stream series are merged with
//! forward-fill semantics, valued against contemporaneous prices and
//! resampled to an even charting interval.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Events not yet indexed at call time are invisible to the engine; the
//!   terminal snapshot still reflects live chain reads.
//!
//! * Positions settled before the call contribute through the collateral
//!   stream only, since their final sizes are no longer readable from the
//!   vault.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for produced series. |
//! | `testing` | yes | Enables [`testing`] module. |
//!
//! # Testing
//!
//! [`testing`] module provides in-memory indexer/chain/oracle doubles
//! with seedable events and per-kind failure injection.
//!
//!
//! [`Strike`]: https://strike.exchange

pub mod abi;
pub mod error;
pub mod history;
pub mod indexer;
pub mod num;
pub mod rpc;
pub mod source;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;

use alloy::primitives::{Address, address};

#[derive(Clone, Debug)]
/// Deployment of the protocol the SDK is pointed at.
pub struct Chain {
    chain_id: u64,
    vault: Address,
    base_token: Address,
    quote_token: Address,
    deployed_at_block: u64,
}

impl Chain {
    pub fn testnet() -> Self {
        Self {
            chain_id: 10143,
            vault: address!("0x1964C32f0bE608E7D29302AFF5E61268E72080cc"),
            base_token: address!("0xDcfCC5d088923a3Bb3b12CC9DfD34810EAe24248"),
            quote_token: address!("0xa9012a055bd4e0eDfF8Ce09f960291C09D5322dC"),
            deployed_at_block: 62953,
        }
    }

    pub fn custom(
        chain_id: u64,
        vault: Address,
        base_token: Address,
        quote_token: Address,
        deployed_at_block: u64,
    ) -> Self {
        Self { chain_id, vault, base_token, quote_token, deployed_at_block }
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    pub fn vault(&self) -> Address { self.vault }

    pub fn base_token(&self) -> Address { self.base_token }

    pub fn quote_token(&self) -> Address { self.quote_token }

    pub fn deployed_at_block(&self) -> u64 { self.deployed_at_block }
}
