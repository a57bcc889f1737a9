//! Flat JSON quote record.
//!
//! One record per (game, bookmaker), as produced by the ingestion side:
//!
//! ```json
//! {"game_id": "...", "sport": "basketball_nba", "home_team": "...",
//!  "away_team": "...", "commence_time": "2024-01-15T00:10:00Z",
//!  "bookmaker": "draftkings", "bookmaker_title": "DraftKings",
//!  "home_odds": -110, "away_odds": 100,
//!  "last_update": "2024-01-14T21:04:00Z", "ingested_at": "2024-01-14T21:05:12.503211"}
//! ```

use crate::RecordError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use odds_core::{whole_american_price, Bookmaker, GameId, Quote, Sport};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Wire shape of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub game_id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub commence_time: Option<String>,
    pub bookmaker: String,
    #[serde(default)]
    pub bookmaker_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub home_odds: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub away_odds: Option<i32>,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub ingested_at: Option<String>,
}

impl QuoteRecord {
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            game_id: quote.game_id.to_string(),
            sport: quote.sport.to_string(),
            home_team: quote.home_team.clone(),
            away_team: quote.away_team.clone(),
            commence_time: quote.commence_time.map(format_timestamp),
            bookmaker: quote.bookmaker.to_string(),
            bookmaker_title: quote.bookmaker_title.clone(),
            home_odds: quote.home_price,
            away_odds: quote.away_price,
            last_update: Some(format_timestamp(quote.observed_at)),
            ingested_at: quote.ingested_at.map(format_timestamp),
        }
    }

    /// Validate and convert into a [`Quote`].
    ///
    /// Freshness comes from `last_update`, falling back to `ingested_at`.
    pub fn into_quote(self) -> Result<Quote, RecordError> {
        if self.game_id.is_empty() {
            return Err(RecordError::MissingField("game_id"));
        }
        if self.bookmaker.is_empty() {
            return Err(RecordError::MissingField("bookmaker"));
        }

        let ingested_at = self
            .ingested_at
            .as_deref()
            .map(|v| parse_timestamp("ingested_at", v))
            .transpose()?;
        let observed_at = match self.last_update.as_deref() {
            Some(v) => parse_timestamp("last_update", v)?,
            None => ingested_at.ok_or(RecordError::MissingField("last_update"))?,
        };
        let commence_time = self
            .commence_time
            .as_deref()
            .map(|v| parse_timestamp("commence_time", v))
            .transpose()?;

        let mut quote = Quote::new(
            GameId::new(&self.game_id),
            Sport::new(&self.sport),
            self.home_team,
            self.away_team,
            Bookmaker::new(&self.bookmaker),
            observed_at,
        )
        .with_prices(self.home_odds, self.away_odds);
        quote.bookmaker_title = self.bookmaker_title;
        quote.commence_time = commence_time;
        quote.ingested_at = ingested_at;

        Ok(quote)
    }
}

/// Accept whole-number floats such as `-110.0`; other fractional prices
/// decode as absent.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = Option::<f64>::deserialize(deserializer)?;
    Ok(price.and_then(|p| {
        let whole = whole_american_price(p);
        if whole.is_none() {
            warn!("Dropping non-integral price {}", p);
        }
        whole
    }))
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, RecordError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| RecordError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
