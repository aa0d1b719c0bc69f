//! Parser module for feed messages
//!
//! Turns newline-delimited CLOB and lifecycle messages into typed events.
//! Decimal fields arrive as strings; a level or delta whose numbers do not
//! parse is dropped on its own and the rest of the message is kept.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::events::{BookSnapshot, Event, Level, Market, PriceChange, PriceChangeBatch};
use crate::orderbook::Side;

/// Order summary entry of a `book` message
#[derive(Debug, Clone, Deserialize)]
pub struct WireLevel {
    pub price: String,
    pub size: String,
}

/// Full book message (`event_type: "book"`)
#[derive(Debug, Clone, Deserialize)]
pub struct BookMessage {
    pub asset_id: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub bids: Vec<WireLevel>,
    pub asks: Vec<WireLevel>,
}

/// Entry of a `price_change` message
#[derive(Debug, Clone, Deserialize)]
pub struct WirePriceChange {
    #[serde(default)]
    pub asset_id: Option<String>,
    pub price: String,
    pub size: String,
    pub side: String,
    #[serde(default)]
    pub best_bid: Option<String>,
    #[serde(default)]
    pub best_ask: Option<String>,
}

/// Delta message (`event_type: "price_change"`)
#[derive(Debug, Clone, Deserialize)]
pub struct PriceChangeMessage {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub price_changes: Vec<WirePriceChange>,
}

#[derive(Debug, Clone, Deserialize)]
struct DiscoveredMessage {
    slug: String,
    yes_asset_id: String,
    no_asset_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ExpiredMessage {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct GenericMessage {
    event_type: Option<String>,
}

/// Parsed feed message
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    /// A usable event; `dropped` counts malformed levels or deltas left out
    Event { event: Event, dropped: usize },
    /// Valid JSON of a type the engine does not consume
    Ignored(String),
}

impl ParsedMessage {
    /// Parse one raw feed line
    pub fn parse(raw: &str) -> Result<Self> {
        let generic: GenericMessage = serde_json::from_str(raw)?;

        match generic.event_type.as_deref() {
            Some("book") => {
                let msg: BookMessage = serde_json::from_str(raw)?;
                Ok(parse_book(msg))
            }
            Some("price_change") => {
                let msg: PriceChangeMessage = serde_json::from_str(raw)?;
                Ok(parse_price_change(msg))
            }
            Some("market_discovered") => {
                let msg: DiscoveredMessage = serde_json::from_str(raw)?;
                Ok(ParsedMessage::Event {
                    event: Event::MarketDiscovered(Market {
                        slug: msg.slug,
                        yes_asset_id: msg.yes_asset_id,
                        no_asset_id: msg.no_asset_id,
                    }),
                    dropped: 0,
                })
            }
            Some("market_expired") => {
                let msg: ExpiredMessage = serde_json::from_str(raw)?;
                Ok(ParsedMessage::Event {
                    event: Event::MarketExpired { slug: msg.slug },
                    dropped: 0,
                })
            }
            other => Ok(ParsedMessage::Ignored(
                other.unwrap_or("<untyped>").to_string(),
            )),
        }
    }
}

fn parse_book(msg: BookMessage) -> ParsedMessage {
    let mut dropped = 0;
    let mut levels = |wire: Vec<WireLevel>| -> Vec<Level> {
        wire.into_iter()
            .filter_map(|level| match parse_level(&level) {
                Ok(level) => Some(level),
                Err(e) => {
                    warn!(asset_id = %msg.asset_id, error = %e, "Dropping malformed book level");
                    dropped += 1;
                    None
                }
            })
            .collect()
    };

    let bids = levels(msg.bids);
    let asks = levels(msg.asks);

    ParsedMessage::Event {
        event: Event::BookSnapshot(BookSnapshot {
            asset_id: msg.asset_id,
            bids,
            asks,
        }),
        dropped,
    }
}

fn parse_level(level: &WireLevel) -> Result<Level> {
    Ok(Level {
        price: parse_price("price", &level.price)?,
        size: parse_decimal("size", &level.size)?,
    })
}

fn parse_price_change(msg: PriceChangeMessage) -> ParsedMessage {
    let mut dropped = 0;
    let changes = msg
        .price_changes
        .iter()
        .filter_map(|change| match parse_change(change, msg.asset_id.as_deref()) {
            Ok(change) => Some(change),
            Err(e) => {
                warn!(market = ?msg.market, error = %e, "Dropping malformed price change");
                dropped += 1;
                None
            }
        })
        .collect();

    ParsedMessage::Event {
        event: Event::PriceChangeBatch(PriceChangeBatch {
            timestamp: msg.timestamp.as_deref().and_then(parse_timestamp),
            changes,
        }),
        dropped,
    }
}

fn parse_change(change: &WirePriceChange, fallback_asset: Option<&str>) -> Result<PriceChange> {
    let asset_id = change
        .asset_id
        .as_deref()
        .or(fallback_asset)
        .ok_or_else(|| EngineError::Parse("price change without asset_id".to_string()))?;

    Ok(PriceChange {
        asset_id: asset_id.to_string(),
        price: parse_price("price", &change.price)?,
        size: parse_decimal("size", &change.size)?,
        side: parse_side(&change.side)?,
        best_bid: parse_optional_price("best_bid", change.best_bid.as_deref())?,
        best_ask: parse_optional_price("best_ask", change.best_ask.as_deref())?,
    })
}

/// Strict decimal parse: rejects NaN, empty and negative values
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    let invalid = || EngineError::InvalidNumber {
        field,
        value: raw.to_string(),
    };
    let value = Decimal::from_str(raw.trim()).map_err(|_| invalid())?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid());
    }
    Ok(value)
}

/// Outcome-share price, which always lies in [0, 1]
pub fn parse_price(field: &'static str, raw: &str) -> Result<Decimal> {
    let value = parse_decimal(field, raw)?;
    if value > Decimal::ONE {
        return Err(EngineError::InvalidNumber {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

/// An absent or empty price is `None`; anything else must parse
fn parse_optional_price(field: &'static str, raw: Option<&str>) -> Result<Option<Decimal>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_price(field, raw).map(Some),
    }
}

fn parse_side(raw: &str) -> Result<Side> {
    match raw.to_ascii_uppercase().as_str() {
        "BUY" => Ok(Side::Bid),
        "SELL" => Ok(Side::Ask),
        _ => Err(EngineError::Parse(format!("unknown side {raw:?}"))),
    }
}

/// Epoch milliseconds as a string
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(parsed: ParsedMessage) -> (Event, usize) {
        match parsed {
            ParsedMessage::Event { event, dropped } => (event, dropped),
            other => panic!("Expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_book() {
        let raw = r#"{
            "event_type": "book",
            "asset_id": "yes-token",
            "market": "0xcond",
            "timestamp": "1704067200000",
            "hash": "abc123",
            "bids": [{"price": "0.38", "size": "20"}, {"price": "0.40", "size": "100"}],
            "asks": [{"price": "0.47", "size": "75"}, {"price": "0.45", "size": "50"}]
        }"#;

        let (event, dropped) = event(ParsedMessage::parse(raw).unwrap());
        assert_eq!(dropped, 0);
        if let Event::BookSnapshot(book) = event {
            assert_eq!(book.asset_id, "yes-token");
            assert_eq!(book.best_bid(), Some(&Level::new(dec!(0.40), dec!(100))));
            assert_eq!(book.best_ask(), Some(&Level::new(dec!(0.45), dec!(50))));
        } else {
            panic!("Expected BookSnapshot");
        }
    }

    #[test]
    fn test_malformed_level_dropped() {
        let raw = r#"{
            "event_type": "book",
            "asset_id": "yes-token",
            "bids": [{"price": "NaN", "size": "20"}, {"price": "0.40", "size": "100"}],
            "asks": [{"price": "0.45", "size": "abc"}]
        }"#;

        let (event, dropped) = event(ParsedMessage::parse(raw).unwrap());
        assert_eq!(dropped, 2);
        if let Event::BookSnapshot(book) = event {
            assert_eq!(book.bids.len(), 1);
            assert!(book.asks.is_empty());
        } else {
            panic!("Expected BookSnapshot");
        }
    }

    #[test]
    fn test_parse_price_change() {
        let raw = r#"{
            "event_type": "price_change",
            "market": "0xcond",
            "timestamp": "1704067200000",
            "price_changes": [
                {"asset_id": "yes-token", "price": "0.48", "size": "0", "side": "SELL", "best_bid": "0.46", "best_ask": "0.49"},
                {"asset_id": "no-token", "price": "0.51", "size": "12.5", "side": "BUY"},
                {"asset_id": "no-token", "price": "", "size": "1", "side": "BUY"}
            ]
        }"#;

        let (event, dropped) = event(ParsedMessage::parse(raw).unwrap());
        assert_eq!(dropped, 1);
        if let Event::PriceChangeBatch(batch) = event {
            assert_eq!(batch.timestamp, DateTime::<Utc>::from_timestamp_millis(1_704_067_200_000));
            assert_eq!(batch.changes.len(), 2);
            assert_eq!(batch.changes[0].side, Side::Ask);
            assert_eq!(batch.changes[0].size, dec!(0));
            assert_eq!(batch.changes[0].best_ask, Some(dec!(0.49)));
            assert_eq!(batch.changes[1].side, Side::Bid);
            assert_eq!(batch.changes[1].best_ask, None);
        } else {
            panic!("Expected PriceChangeBatch");
        }
    }

    #[test]
    fn test_price_change_asset_fallback_and_bad_timestamp() {
        let raw = r#"{
            "event_type": "price_change",
            "asset_id": "yes-token",
            "timestamp": "soon",
            "price_changes": [{"price": "0.48", "size": "3", "side": "buy", "best_ask": ""}]
        }"#;

        let (event, _) = event(ParsedMessage::parse(raw).unwrap());
        if let Event::PriceChangeBatch(batch) = event {
            assert_eq!(batch.timestamp, None);
            assert_eq!(batch.changes[0].asset_id, "yes-token");
            assert_eq!(batch.changes[0].best_ask, None);
        } else {
            panic!("Expected PriceChangeBatch");
        }
    }

    #[test]
    fn test_parse_lifecycle() {
        let discovered = r#"{"event_type":"market_discovered","slug":"btc-updown-15m","yes_asset_id":"y","no_asset_id":"n"}"#;
        let (event, _) = event(ParsedMessage::parse(discovered).unwrap());
        assert_eq!(
            event,
            Event::MarketDiscovered(Market {
                slug: "btc-updown-15m".to_string(),
                yes_asset_id: "y".to_string(),
                no_asset_id: "n".to_string(),
            })
        );

        let expired = r#"{"event_type":"market_expired","slug":"btc-updown-15m"}"#;
        let (event, _) = self::event(ParsedMessage::parse(expired).unwrap());
        assert_eq!(
            event,
            Event::MarketExpired {
                slug: "btc-updown-15m".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_and_invalid() {
        let raw = r#"{"event_type":"last_trade_price","price":"0.5"}"#;
        assert_eq!(
            ParsedMessage::parse(raw).unwrap(),
            ParsedMessage::Ignored("last_trade_price".to_string())
        );
        assert!(matches!(ParsedMessage::parse("PONG"), Err(EngineError::Parse(_))));
    }

    #[test]
    fn test_parse_decimal_is_strict() {
        assert_eq!(parse_decimal("price", " 0.55 ").unwrap(), dec!(0.55));
        assert!(parse_decimal("price", "NaN").is_err());
        assert!(parse_decimal("price", "").is_err());
        assert!(parse_decimal("size", "-1").is_err());
        assert_eq!(parse_decimal("size", "0").unwrap(), dec!(0));
    }

    #[test]
    fn test_price_outside_unit_interval_rejected() {
        assert_eq!(parse_price("price", "1").unwrap(), dec!(1));
        assert_eq!(parse_price("price", "0").unwrap(), dec!(0));
        assert!(parse_price("price", "1.01").is_err());
        assert!(parse_price("best_ask", "50000000000000000000000000000").is_err());
    }

    #[test]
    fn test_out_of_range_price_drops_entry() {
        let raw = r#"{
            "event_type": "price_change",
            "price_changes": [
                {"asset_id": "yes-token", "price": "7", "size": "1", "side": "BUY"},
                {"asset_id": "yes-token", "price": "0.48", "size": "3", "side": "SELL", "best_ask": "2"},
                {"asset_id": "no-token", "price": "0.51", "size": "50000000000000000000000000000", "side": "BUY"}
            ]
        }"#;

        let (event, dropped) = event(ParsedMessage::parse(raw).unwrap());
        assert_eq!(dropped, 2);
        if let Event::PriceChangeBatch(batch) = event {
            assert_eq!(batch.changes.len(), 1);
            assert_eq!(batch.changes[0].asset_id, "no-token");
        } else {
            panic!("Expected PriceChangeBatch");
        }
    }
}
