//! HTTP client for the external event indexer.
//!
//! The indexer exposes flat REST endpoints with ascending page cursors;
//! amounts travel as decimal strings and are parsed into [`D128`] here.
//! Indexed data is taken as authoritative for history: the SDK never
//! cross-checks it against freshly decoded chain logs.

use fastnum::D128;
use serde::Deserialize;

use crate::{
    error::SdkError,
    source::{EventFilter, EventStore, PAGE_SIZE, PriceOracle, Scope},
    types,
};

#[derive(Clone, Debug)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Uses a caller-configured [`reqwest::Client`] (timeouts, proxies).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    async fn get_page<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SdkError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http.get(url).query(query).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

impl EventStore for IndexerClient {
    async fn events(
        &self,
        kind: types::EventKind,
        filter: EventFilter,
        cursor: u64,
    ) -> Result<Vec<types::EventRecord>, SdkError> {
        let mut query = vec![
            ("kind", kind_param(kind).to_string()),
            ("owner", filter.owner.to_string()),
            ("min_block", filter.min_block.to_string()),
            ("max_block", filter.max_block.to_string()),
            ("page", cursor.to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ];
        match filter.scope {
            Some(Scope::Asset(asset)) => query.push(("asset", asset_param(asset).to_string())),
            Some(Scope::Position(id)) => query.push(("position", id.to_string())),
            None => (),
        }

        let page: EventsPage = self.get_page("events", &query).await?;
        page.events.into_iter().map(|dto| dto.into_record(kind)).collect()
    }
}

impl PriceOracle for IndexerClient {
    async fn candles(
        &self,
        key: types::PriceKey,
        min_block: u64,
        max_block: u64,
        cursor: u64,
    ) -> Result<Vec<types::PriceCandleRecord>, SdkError> {
        let mut query = vec![
            ("min_block", min_block.to_string()),
            ("max_block", max_block.to_string()),
            ("page", cursor.to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ];
        match key {
            types::PriceKey::Spot(asset) => {
                query.push(("kind", "spot".to_string()));
                query.push(("asset", asset_param(asset).to_string()));
            },
            types::PriceKey::Option(position) => {
                query.push(("kind", "option".to_string()));
                query.push(("position", position.to_string()));
            },
        }

        let page: CandlesPage = self.get_page("prices", &query).await?;
        page.candles
            .into_iter()
            .map(|dto| {
                Ok(types::PriceCandleRecord {
                    instant: types::BlockPointer::new(dto.block_number, dto.timestamp),
                    key,
                    price: parse_decimal(&dto.price)?,
                })
            })
            .collect()
    }
}

fn kind_param(kind: types::EventKind) -> &'static str {
    match kind {
        types::EventKind::Transfer => "transfer",
        types::EventKind::CollateralWrite => "collateral_write",
        types::EventKind::Settle => "settle",
        types::EventKind::Trade => "trade",
        types::EventKind::PriceCandle => "price_candle",
    }
}

fn asset_param(asset: types::AssetId) -> &'static str {
    match asset {
        types::AssetId::Base => "base",
        types::AssetId::Quote => "quote",
    }
}

fn parse_decimal(raw: &str) -> Result<D128, SdkError> {
    raw.parse::<D128>().map_err(|_| SdkError::InvalidDecimal(raw.to_string()))
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    events: Vec<EventDto>,
}

#[derive(Debug, Deserialize)]
struct CandlesPage {
    candles: Vec<CandleDto>,
}

#[derive(Debug, Deserialize)]
struct CandleDto {
    block_number: u64,
    timestamp: u64,
    price: String,
}

/// Superset of all event kinds' fields; the requested kind decides which
/// are required.
#[derive(Debug, Deserialize)]
struct EventDto {
    block_number: u64,
    timestamp: u64,
    #[serde(default)]
    asset: Option<String>,
    #[serde(default)]
    position_id: Option<types::PositionId>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    size_delta: Option<String>,
    #[serde(default)]
    price: Option<String>,
}

impl EventDto {
    fn into_record(self, kind: types::EventKind) -> Result<types::EventRecord, SdkError> {
        let instant = types::BlockPointer::new(self.block_number, self.timestamp);
        let record = match kind {
            types::EventKind::Transfer => types::EventRecord::Transfer(types::TransferRecord {
                instant,
                asset: require(self.asset, "asset")?.parse()?,
                amount: parse_decimal(&require(self.amount, "amount")?)?,
                direction: match require(self.direction, "direction")?.as_str() {
                    "in" => types::Direction::In,
                    "out" => types::Direction::Out,
                    other => {
                        return Err(SdkError::MalformedPayload(format!(
                            "unknown transfer direction: {}",
                            other
                        )));
                    },
                },
            }),
            types::EventKind::CollateralWrite => {
                types::EventRecord::CollateralWrite(types::CollateralWriteRecord {
                    instant,
                    position_id: require(self.position_id, "position_id")?,
                    amount: parse_decimal(&require(self.amount, "amount")?)?,
                })
            },
            types::EventKind::Settle => types::EventRecord::Settle(types::SettleRecord {
                instant,
                position_id: require(self.position_id, "position_id")?,
            }),
            types::EventKind::Trade => types::EventRecord::Trade(types::TradeRecord {
                instant,
                position_id: require(self.position_id, "position_id")?,
                size_delta: parse_decimal(&require(self.size_delta, "size_delta")?)?,
            }),
            types::EventKind::PriceCandle => {
                let key = match (self.asset, self.position_id) {
                    (Some(asset), None) => types::PriceKey::Spot(asset.parse()?),
                    (None, Some(position)) => types::PriceKey::Option(position),
                    _ => {
                        return Err(SdkError::MalformedPayload(
                            "candle needs exactly one of asset/position_id".to_string(),
                        ));
                    },
                };
                types::EventRecord::PriceCandle(types::PriceCandleRecord {
                    instant,
                    key,
                    price: parse_decimal(&require(self.price, "price")?)?,
                })
            },
        };
        Ok(record)
    }
}

fn require<T>(field: Option<T>, name: &str) -> Result<T, SdkError> {
    field.ok_or_else(|| SdkError::MalformedPayload(format!("missing field: {}", name)))
}

#[cfg(test)]
mod tests {
    use fastnum::dec128;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_transfer_dto_conversion() {
        let dto: EventDto = serde_json::from_value(json!({
            "block_number": 100,
            "timestamp": 1_700_000_000u64,
            "asset": "quote",
            "amount": "12.5",
            "direction": "out",
        }))
        .unwrap();

        let record = dto.into_record(types::EventKind::Transfer).unwrap();
        let types::EventRecord::Transfer(t) = record else { panic!("wrong kind") };
        assert_eq!(t.asset, types::AssetId::Quote);
        assert_eq!(t.signed_amount(), dec128!(-12.5));
        assert_eq!(t.instant.block_number(), 100);
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let dto: EventDto = serde_json::from_value(json!({
            "block_number": 1,
            "timestamp": 10,
        }))
        .unwrap();
        let result = dto.into_record(types::EventKind::Trade);
        assert!(matches!(result, Err(SdkError::MalformedPayload(_))));
    }

    #[test]
    fn test_bad_decimal_is_rejected() {
        let dto: EventDto = serde_json::from_value(json!({
            "block_number": 1,
            "timestamp": 10,
            "position_id": 7,
            "size_delta": "not-a-number",
        }))
        .unwrap();
        let result = dto.into_record(types::EventKind::Trade);
        assert!(matches!(result, Err(SdkError::InvalidDecimal(_))));
    }

    #[test]
    fn test_candle_key_resolution() {
        let dto: EventDto = serde_json::from_value(json!({
            "block_number": 5,
            "timestamp": 60,
            "position_id": 3,
            "price": "41.25",
        }))
        .unwrap();
        let record = dto.into_record(types::EventKind::PriceCandle).unwrap();
        let types::EventRecord::PriceCandle(c) = record else { panic!("wrong kind") };
        assert_eq!(c.key, types::PriceKey::Option(3));
        assert_eq!(c.price, dec128!(41.25));
    }
}
