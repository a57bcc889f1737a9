//! Provider payload adapter.
//!
//! Odds providers publish one event per game with a nested list of
//! bookmakers, each carrying markets keyed by type. Only the head-to-head
//! (`h2h`) market is used; its outcomes are keyed by team name.
//!
//! ```json
//! [{"id": "...", "sport_key": "basketball_nba", "commence_time": "...",
//!   "home_team": "Boston Celtics", "away_team": "Miami Heat",
//!   "bookmakers": [{"key": "draftkings", "title": "DraftKings",
//!     "last_update": "...", "markets": [{"key": "h2h",
//!       "outcomes": [{"name": "Boston Celtics", "price": -110}, ...]}]}]}]
//! ```

use crate::FeedError;
use chrono::{DateTime, Utc};
use odds_core::{whole_american_price, Bookmaker, GameId, Quote, Sport};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One game as published by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub id: String,
    pub sport_key: String,
    #[serde(default)]
    pub sport_title: Option<String>,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<ProviderBookmaker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderBookmaker {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<ProviderMarket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<ProviderOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub name: String,
    /// American odds. Some providers send these as floats.
    pub price: f64,
}

impl ProviderMarket {
    /// Price for `team`. A name listed twice resolves to its last entry.
    fn price_for(&self, team: &str) -> Option<f64> {
        self.outcomes
            .iter()
            .rev()
            .find(|o| o.name == team)
            .map(|o| o.price)
    }
}

/// Flattens provider events into one [`Quote`] per (game, bookmaker).
pub struct HeadToHeadAdapter;

impl HeadToHeadAdapter {
    pub const MARKET: &'static str = "h2h";

    /// Parse a provider payload (a JSON array of events).
    pub fn parse_events(json: &str) -> Result<Vec<ProviderEvent>, FeedError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten every event. `ingested_at` stamps each quote and stands in
    /// for a bookmaker's missing `last_update`.
    pub fn flatten(events: &[ProviderEvent], ingested_at: DateTime<Utc>) -> Vec<Quote> {
        events
            .iter()
            .flat_map(|event| Self::flatten_event(event, ingested_at))
            .collect()
    }

    pub fn flatten_event(event: &ProviderEvent, ingested_at: DateTime<Utc>) -> Vec<Quote> {
        let game_id = GameId::new(&event.id);
        let sport = Sport::new(&event.sport_key);
        let mut quotes = Vec::with_capacity(event.bookmakers.len());

        for bookmaker in &event.bookmakers {
            let Some(market) = bookmaker.markets.iter().find(|m| m.key == Self::MARKET) else {
                debug!("{} has no {} market for {}", bookmaker.key, Self::MARKET, event.id);
                continue;
            };

            let home_price = market
                .price_for(&event.home_team)
                .and_then(|p| american_price(&bookmaker.key, p));
            let away_price = market
                .price_for(&event.away_team)
                .and_then(|p| american_price(&bookmaker.key, p));

            let mut quote = Quote::new(
                game_id.clone(),
                sport.clone(),
                event.home_team.as_str(),
                event.away_team.as_str(),
                Bookmaker::new(&bookmaker.key),
                bookmaker.last_update.unwrap_or(ingested_at),
            )
            .with_prices(home_price, away_price);
            quote.bookmaker_title = bookmaker.title.clone();
            quote.commence_time = event.commence_time;
            quote.ingested_at = Some(ingested_at);

            quotes.push(quote);
        }

        quotes
    }
}

fn american_price(bookmaker: &str, price: f64) -> Option<i32> {
    let whole = whole_american_price(price);
    if whole.is_none() {
        warn!("Dropping non-integral price {} from {}", price, bookmaker);
    }
    whole
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"[
        {
            "id": "e912304de2b2ce35b473ce2ecd3d1502",
            "sport_key": "basketball_nba",
            "sport_title": "NBA",
            "commence_time": "2024-01-15T00:10:00Z",
            "home_team": "Boston Celtics",
            "away_team": "Miami Heat",
            "bookmakers": [
                {
                    "key": "draftkings",
                    "title": "DraftKings",
                    "last_update": "2024-01-14T21:04:00Z",
                    "markets": [
                        {"key": "spreads", "outcomes": [{"name": "Boston Celtics", "price": -115}]},
                        {"key": "h2h", "outcomes": [
                            {"name": "Miami Heat", "price": 100},
                            {"name": "Boston Celtics", "price": -110}
                        ]}
                    ]
                },
                {
                    "key": "fanduel",
                    "title": "FanDuel",
                    "last_update": "2024-01-14T21:03:00Z",
                    "markets": [
                        {"key": "h2h", "outcomes": [{"name": "Boston Celtics", "price": 105}]}
                    ]
                },
                {
                    "key": "bovada",
                    "title": "Bovada",
                    "markets": [{"key": "totals", "outcomes": []}]
                }
            ]
        },
        {
            "id": "7f1c",
            "sport_key": "basketball_nba",
            "home_team": "Denver Nuggets",
            "away_team": "Phoenix Suns"
        }
    ]"#;

    fn ingested_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-14T21:05:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_flatten_h2h_markets() {
        let events = HeadToHeadAdapter::parse_events(PAYLOAD).unwrap();
        let quotes = HeadToHeadAdapter::flatten(&events, ingested_at());

        // bovada has no h2h market, the second event has no bookmakers
        assert_eq!(quotes.len(), 2);

        let dk = &quotes[0];
        assert_eq!(dk.game_id.as_str(), "e912304de2b2ce35b473ce2ecd3d1502");
        assert_eq!(dk.sport, Sport::nba());
        assert_eq!(dk.bookmaker.as_str(), "draftkings");
        assert_eq!(dk.bookmaker_name(), "DraftKings");
        assert_eq!(dk.home_price, Some(-110));
        assert_eq!(dk.away_price, Some(100));
        assert_eq!(dk.observed_at.to_rfc3339(), "2024-01-14T21:04:00+00:00");
        assert_eq!(dk.ingested_at, Some(ingested_at()));
        assert!(dk.commence_time.is_some());
    }

    #[test]
    fn test_team_missing_from_outcomes_is_absent_price() {
        let events = HeadToHeadAdapter::parse_events(PAYLOAD).unwrap();
        let quotes = HeadToHeadAdapter::flatten(&events, ingested_at());

        let fd = &quotes[1];
        assert_eq!(fd.home_price, Some(105));
        assert_eq!(fd.away_price, None);
        assert!(!fd.is_complete());
    }

    #[test]
    fn test_missing_last_update_uses_ingestion_time() {
        let json = r#"[{"id": "g", "sport_key": "americanfootball_nfl",
            "home_team": "A", "away_team": "B",
            "bookmakers": [{"key": "betmgm", "markets": [{"key": "h2h", "outcomes": [
                {"name": "A", "price": 120.0}, {"name": "B", "price": -140.5}]}]}]}]"#;
        let events = HeadToHeadAdapter::parse_events(json).unwrap();
        let quotes = HeadToHeadAdapter::flatten(&events, ingested_at());

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].observed_at, ingested_at());
        assert_eq!(quotes[0].home_price, Some(120));
        assert_eq!(quotes[0].away_price, None);
        assert_eq!(quotes[0].bookmaker_name(), "betmgm");
    }

    #[test]
    fn test_duplicate_outcome_resolves_to_last() {
        let market = ProviderMarket {
            key: "h2h".to_string(),
            outcomes: vec![
                ProviderOutcome { name: "A".to_string(), price: 110.0 },
                ProviderOutcome { name: "A".to_string(), price: 125.0 },
            ],
        };
        assert_eq!(market.price_for("A"), Some(125.0));
        assert_eq!(market.price_for("B"), None);
    }

    #[test]
    fn test_malformed_payload() {
        let err = HeadToHeadAdapter::parse_events(r#"{"message": "quota exceeded"}"#).unwrap_err();
        assert!(matches!(err, FeedError::ParseError(_)));
    }
}
