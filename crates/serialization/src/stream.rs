//! Stream batch envelopes.
//!
//! Layout:
//! - Batch: `{"Records": [StreamRecord; n]}`
//! - Record: `{"kinesis": {"partitionKey": <game_id>, "data": <base64 QuoteRecord JSON>}}`
//!
//! A record that fails to decode is reported and skipped; it never fails the
//! rest of the batch.

use crate::{QuoteRecord, RecordError};
use base64::{engine::general_purpose::STANDARD, Engine};
use odds_core::Quote;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A batch of stream records as delivered to a consumer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<StreamRecord>,
}

/// One stream record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    pub kinesis: StreamPayload,
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Payload of a stream record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamPayload {
    #[serde(rename = "partitionKey", default)]
    pub partition_key: Option<String>,
    /// Base64-encoded JSON of a [`QuoteRecord`].
    pub data: String,
    #[serde(rename = "sequenceNumber", default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

/// A record that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeFailure {
    /// Position of the record in the batch.
    pub index: usize,
    pub sequence_number: Option<String>,
    pub reason: String,
}

/// Quotes recovered from a batch plus the records that were skipped.
#[derive(Debug, Clone, Default)]
pub struct DecodedBatch {
    /// Number of records in the envelope.
    pub records: usize,
    pub quotes: Vec<Quote>,
    pub failures: Vec<DecodeFailure>,
}

/// Encoder/decoder for stream batches.
pub struct StreamCodec;

impl StreamCodec {
    /// Decode a batch envelope. Only an unreadable envelope is an error;
    /// bad records are collected in [`DecodedBatch::failures`].
    pub fn decode(json: &str) -> Result<DecodedBatch, RecordError> {
        let batch: StreamBatch = serde_json::from_str(json)?;
        Ok(Self::decode_batch(&batch))
    }

    pub fn decode_batch(batch: &StreamBatch) -> DecodedBatch {
        let mut decoded = DecodedBatch {
            records: batch.records.len(),
            ..Default::default()
        };

        for (index, record) in batch.records.iter().enumerate() {
            match Self::decode_record(record) {
                Ok(quote) => decoded.quotes.push(quote),
                Err(e) => {
                    warn!("Skipping stream record #{}: {}", index, e);
                    decoded.failures.push(DecodeFailure {
                        index,
                        sequence_number: record.kinesis.sequence_number.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        decoded
    }

    pub fn decode_record(record: &StreamRecord) -> Result<Quote, RecordError> {
        let bytes = STANDARD.decode(record.kinesis.data.as_bytes())?;
        let payload = String::from_utf8(bytes)?;
        let quote_record: QuoteRecord = serde_json::from_str(&payload)?;
        quote_record.into_quote()
    }

    /// Wrap a quote in a stream record keyed by its game.
    pub fn encode_record(quote: &Quote) -> Result<StreamRecord, RecordError> {
        let payload = serde_json::to_vec(&QuoteRecord::from_quote(quote))?;
        Ok(StreamRecord {
            kinesis: StreamPayload {
                partition_key: Some(quote.game_id.to_string()),
                data: STANDARD.encode(payload),
                sequence_number: None,
            },
            event_id: None,
        })
    }

    pub fn encode(quotes: &[Quote]) -> Result<String, RecordError> {
        let records = quotes
            .iter()
            .map(Self::encode_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(serde_json::to_string(&StreamBatch { records })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use odds_core::{Bookmaker, GameId, Sport};
    use pretty_assertions::assert_eq;

    fn quote(book: &str, home: Option<i32>, away: Option<i32>) -> Quote {
        Quote::new(
            GameId::new("g1"),
            Sport::nfl(),
            "Kansas City Chiefs",
            "Buffalo Bills",
            Bookmaker::new(book),
            DateTime::from_timestamp(1_705_000_000, 0).unwrap(),
        )
        .with_prices(home, away)
    }

    #[test]
    fn test_encoded_batch_decodes_to_same_quotes() {
        let quotes = vec![quote("fanduel", Some(-150), Some(130)), quote("betmgm", None, Some(125))];

        let json = StreamCodec::encode(&quotes).unwrap();
        let decoded = StreamCodec::decode(&json).unwrap();

        assert_eq!(decoded.records, 2);
        assert!(decoded.failures.is_empty());
        assert_eq!(decoded.quotes, quotes);
    }

    #[test]
    fn test_record_partitioned_by_game() {
        let record = StreamCodec::encode_record(&quote("fanduel", Some(-150), Some(130))).unwrap();
        assert_eq!(record.kinesis.partition_key.as_deref(), Some("g1"));
    }

    #[test]
    fn test_bad_records_are_skipped_not_fatal() {
        let good = StreamCodec::encode_record(&quote("fanduel", Some(-150), Some(130))).unwrap();
        let not_base64 = StreamRecord {
            kinesis: StreamPayload {
                partition_key: None,
                data: "%%%".to_string(),
                sequence_number: Some("49590338271490256608559692538361571095921575989136588898".to_string()),
            },
            event_id: None,
        };
        let not_json = StreamRecord {
            kinesis: StreamPayload {
                partition_key: None,
                data: STANDARD.encode("{not json"),
                sequence_number: None,
            },
            event_id: None,
        };

        let batch = StreamBatch {
            records: vec![not_base64, good, not_json],
        };
        let decoded = StreamCodec::decode_batch(&batch);

        assert_eq!(decoded.records, 3);
        assert_eq!(decoded.quotes.len(), 1);
        assert_eq!(decoded.failures.len(), 2);
        assert_eq!(decoded.failures[0].index, 0);
        assert!(decoded.failures[0].sequence_number.is_some());
        assert!(decoded.failures[0].reason.starts_with("Invalid base64"));
        assert_eq!(decoded.failures[1].index, 2);
        assert!(decoded.failures[1].reason.starts_with("Invalid JSON"));
    }

    #[test]
    fn test_empty_envelope() {
        let decoded = StreamCodec::decode(r#"{"Records": []}"#).unwrap();
        assert_eq!(decoded.records, 0);
        assert!(decoded.quotes.is_empty());

        let decoded = StreamCodec::decode("{}").unwrap();
        assert_eq!(decoded.records, 0);
    }

    #[test]
    fn test_unreadable_envelope_is_an_error() {
        assert!(matches!(StreamCodec::decode("[1, 2"), Err(RecordError::Json(_))));
    }

    #[test]
    fn test_decodes_producer_shaped_record() {
        let payload = r#"{"game_id":"abc","sport":"basketball_nba","home_team":"Denver Nuggets","away_team":"Phoenix Suns","commence_time":"2024-01-15T02:00:00Z","bookmaker":"fanduel","bookmaker_title":"FanDuel","home_odds":-180,"away_odds":152,"last_update":"2024-01-14T21:04:41Z","ingested_at":"2024-01-14T21:05:00.000001"}"#;
        let envelope = serde_json::json!({
            "Records": [{
                "eventID": "shardId-000000000000:1",
                "kinesis": {
                    "partitionKey": "abc",
                    "sequenceNumber": "1",
                    "data": STANDARD.encode(payload),
                }
            }]
        });

        let decoded = StreamCodec::decode(&envelope.to_string()).unwrap();
        assert_eq!(decoded.quotes.len(), 1);
        assert_eq!(decoded.quotes[0].home_price, Some(-180));
        assert_eq!(decoded.quotes[0].bookmaker_name(), "FanDuel");
    }
}
