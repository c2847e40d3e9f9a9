//! In-memory source implementations for tests.
//!
//! [`TestStore`] plays all three collaborator roles (indexer, chain,
//! oracle) over seeded data, with per-kind failure injection to exercise
//! stream degradation.

use std::sync::RwLock;

use alloy::primitives::Address;
use dashmap::DashMap;
use fastnum::D128;

use crate::{
    error::SdkError,
    source::{ChainState, EventFilter, EventStore, PAGE_SIZE, PriceOracle, Scope},
    types,
};

#[derive(Debug, Default)]
pub struct TestStore {
    latest: RwLock<types::BlockPointer>,
    balances: DashMap<(Address, types::AssetId), D128>,
    positions: DashMap<Address, Vec<types::OpenPosition>>,
    events: RwLock<Vec<types::EventRecord>>,
    failing: DashMap<types::EventKind, ()>,
}

impl TestStore {
    pub fn new(latest: types::BlockPointer) -> Self {
        Self { latest: RwLock::new(latest), ..Default::default() }
    }

    pub fn with_balance(self, owner: Address, asset: types::AssetId, amount: D128) -> Self {
        self.balances.insert((owner, asset), amount);
        self
    }

    pub fn with_position(self, owner: Address, position: types::OpenPosition) -> Self {
        self.positions.entry(owner).or_default().push(position);
        self
    }

    pub fn with_event(self, record: types::EventRecord) -> Self {
        self.push_event(record);
        self
    }

    pub fn with_candle(self, key: types::PriceKey, block: u64, timestamp: u64, price: D128) -> Self {
        self.with_event(types::EventRecord::PriceCandle(types::PriceCandleRecord {
            instant: types::BlockPointer::new(block, timestamp),
            key,
            price,
        }))
    }

    /// All queries of this kind will fail with `SourceUnavailable`.
    pub fn with_failing(self, kind: types::EventKind) -> Self {
        self.failing.insert(kind, ());
        self
    }

    pub fn push_event(&self, record: types::EventRecord) {
        self.events.write().unwrap().push(record);
    }

    pub fn set_latest(&self, latest: types::BlockPointer) {
        *self.latest.write().unwrap() = latest;
    }

    fn page<T>(records: Vec<T>, cursor: u64) -> Vec<T> {
        records
            .into_iter()
            .skip(cursor as usize * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    fn check_available(&self, kind: types::EventKind) -> Result<(), SdkError> {
        if self.failing.contains_key(&kind) {
            return Err(SdkError::SourceUnavailable(format!("simulated {:?} outage", kind)));
        }
        Ok(())
    }
}

fn matches_scope(record: &types::EventRecord, scope: Option<Scope>) -> bool {
    match scope {
        None => true,
        Some(Scope::Asset(asset)) => {
            matches!(record, types::EventRecord::Transfer(t) if t.asset == asset)
        },
        Some(Scope::Position(id)) => match record {
            types::EventRecord::Trade(t) => t.position_id == id,
            types::EventRecord::CollateralWrite(w) => w.position_id == id,
            types::EventRecord::Settle(s) => s.position_id == id,
            _ => false,
        },
    }
}

impl EventStore for TestStore {
    async fn events(
        &self,
        kind: types::EventKind,
        filter: EventFilter,
        cursor: u64,
    ) -> Result<Vec<types::EventRecord>, SdkError> {
        self.check_available(kind)?;
        let mut records: Vec<types::EventRecord> = self
            .events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.kind() == kind)
            .filter(|e| matches_scope(e, filter.scope))
            .filter(|e| {
                (filter.min_block..=filter.max_block).contains(&e.block_number())
            })
            .cloned()
            .collect();
        records.sort_by_key(|e| e.block_number());
        Ok(Self::page(records, cursor))
    }
}

impl ChainState for TestStore {
    async fn latest_block(&self) -> Result<types::BlockPointer, SdkError> {
        Ok(*self.latest.read().unwrap())
    }

    async fn current_balance(
        &self,
        owner: Address,
        asset: types::AssetId,
    ) -> Result<D128, SdkError> {
        Ok(self.balances.get(&(owner, asset)).map(|b| *b).unwrap_or(D128::ZERO))
    }

    async fn open_positions(
        &self,
        owner: Address,
    ) -> Result<Vec<types::OpenPosition>, SdkError> {
        Ok(self.positions.get(&owner).map(|p| p.value().clone()).unwrap_or_default())
    }
}

impl PriceOracle for TestStore {
    async fn candles(
        &self,
        key: types::PriceKey,
        min_block: u64,
        max_block: u64,
        cursor: u64,
    ) -> Result<Vec<types::PriceCandleRecord>, SdkError> {
        self.check_available(types::EventKind::PriceCandle)?;
        let mut candles: Vec<types::PriceCandleRecord> = self
            .events
            .read()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                types::EventRecord::PriceCandle(c) if c.key == key => Some(c.clone()),
                _ => None,
            })
            .filter(|c| (min_block..=max_block).contains(&c.instant.block_number()))
            .collect();
        candles.sort_by_key(|c| c.instant.block_number());
        Ok(Self::page(candles, cursor))
    }
}
