use alloy::primitives::Address;
use fastnum::D128;
use tracing::debug;

use crate::{error::SdkError, types};

/// Records per page the sources are expected to return; a shorter page
/// terminates pagination.
pub const PAGE_SIZE: usize = 1000;

/// Safety bound on the page cursor. Protects against indexers that keep
/// returning full pages for an unbounded range.
pub const MAX_PAGES: u64 = 10_000;

/// Entity an event query is scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Asset(types::AssetId),
    Position(types::PositionId),
}

/// Filter for historical event queries.
#[derive(Clone, Copy, Debug)]
pub struct EventFilter {
    pub owner: Address,
    /// Restricts results to one asset or position; `None` means all
    /// entities of the owner.
    pub scope: Option<Scope>,
    pub min_block: u64,
    pub max_block: u64,
}

/// Paginated historical event source (the external indexer).
///
/// `cursor` is an ascending page index starting at 0; implementations
/// return at most [`PAGE_SIZE`] records per call, ascending by block.
pub trait EventStore {
    async fn events(
        &self,
        kind: types::EventKind,
        filter: EventFilter,
        cursor: u64,
    ) -> Result<Vec<types::EventRecord>, SdkError>;
}

/// Present-time-only chain reads. No historical query capability is
/// assumed from the node.
pub trait ChainState {
    async fn latest_block(&self) -> Result<types::BlockPointer, SdkError>;

    /// Directly-held balance of `asset`, normalized decimal.
    async fn current_balance(
        &self,
        owner: Address,
        asset: types::AssetId,
    ) -> Result<D128, SdkError>;

    /// Currently open positions of `owner`, read from the vault.
    async fn open_positions(&self, owner: Address)
    -> Result<Vec<types::OpenPosition>, SdkError>;
}

/// Historical price candle source, paginated like [`EventStore`].
pub trait PriceOracle {
    async fn candles(
        &self,
        key: types::PriceKey,
        min_block: u64,
        max_block: u64,
        cursor: u64,
    ) -> Result<Vec<types::PriceCandleRecord>, SdkError>;
}

/// Drives a paginated query to exhaustion.
///
/// Terminates when a page comes back shorter than [`PAGE_SIZE`], or fails
/// with [`SdkError::PaginationOverflow`] once the cursor passes
/// [`MAX_PAGES`].
pub async fn fetch_all<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, SdkError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Vec<T>, SdkError>>,
{
    let mut records = Vec::new();
    let mut cursor = 0u64;
    loop {
        let page = fetch(cursor).await?;
        let short = page.len() < PAGE_SIZE;
        records.extend(page);
        if short {
            debug!(pages = cursor + 1, records = records.len(), "pagination complete");
            return Ok(records);
        }
        cursor += 1;
        if cursor >= MAX_PAGES {
            return Err(SdkError::PaginationOverflow(cursor));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_all_stops_on_short_page() {
        let fetched = fetch_all(|cursor| async move {
            if cursor < 2 {
                Ok(vec![cursor as usize; PAGE_SIZE])
            } else {
                Ok(vec![2usize; 3])
            }
        })
        .await
        .unwrap();
        assert_eq!(fetched.len(), 2 * PAGE_SIZE + 3);
        assert_eq!(fetched[fetched.len() - 1], 2);
    }

    #[tokio::test]
    async fn test_fetch_all_empty_first_page() {
        let fetched: Vec<u64> = fetch_all(|_| async { Ok(vec![]) }).await.unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_safety_bound() {
        let result: Result<Vec<usize>, _> =
            fetch_all(|_| async { Ok(vec![0usize; PAGE_SIZE]) }).await;
        assert!(matches!(result, Err(SdkError::PaginationOverflow(_))));
    }
}
