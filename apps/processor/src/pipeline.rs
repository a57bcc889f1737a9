//! Batch processing pipeline.
//!
//! decode -> store quotes -> group by game -> evaluate -> store opportunities

use crate::error::ProcessorError;
use chrono::{DateTime, Utc};
use odds_core::{OpportunityRecord, Quote, Sport};
use odds_engine::{group_by_game, BatchEvaluator, BatchSummary, EvaluatedGame};
use odds_feeds::OddsSource;
use odds_serialization::{QuoteRecord, StreamCodec};
use odds_store::OddsStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one pipeline run, printed by the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    pub records_processed: usize,
    pub games_processed: usize,
    pub arbitrage_found: usize,
    pub rejected: usize,
    pub incomplete: usize,
    pub decode_failures: usize,
}

impl ProcessingSummary {
    fn new(records: usize, decode_failures: usize, batch: BatchSummary) -> Self {
        Self {
            records_processed: records,
            games_processed: batch.games,
            arbitrage_found: batch.opportunities,
            rejected: batch.rejected,
            incomplete: batch.incomplete,
            decode_failures,
        }
    }
}

/// Runs batches through the evaluator and persists the results.
pub struct Pipeline {
    evaluator: BatchEvaluator,
    store: Arc<dyn OddsStore>,
}

impl Pipeline {
    pub fn new(evaluator: BatchEvaluator, store: Arc<dyn OddsStore>) -> Self {
        Self { evaluator, store }
    }

    /// Process a stream batch envelope. Undecodable records are counted and
    /// skipped.
    pub async fn process_records(
        &self,
        json: &str,
        now: DateTime<Utc>,
    ) -> Result<ProcessingSummary, ProcessorError> {
        let decoded = StreamCodec::decode(json)?;
        let failures = decoded.failures.len();
        self.run(decoded.records, failures, decoded.quotes, now).await
    }

    /// Process quotes that are already decoded.
    pub async fn process_quotes(
        &self,
        quotes: Vec<Quote>,
        now: DateTime<Utc>,
    ) -> Result<ProcessingSummary, ProcessorError> {
        self.run(quotes.len(), 0, quotes, now).await
    }

    async fn run(
        &self,
        records: usize,
        decode_failures: usize,
        quotes: Vec<Quote>,
        now: DateTime<Utc>,
    ) -> Result<ProcessingSummary, ProcessorError> {
        self.store.put_quotes(&quotes, now).await?;

        let outcome = self.evaluator.evaluate(group_by_game(quotes));
        for game in outcome.opportunities() {
            let Some(record) = opportunity_record(game, now) else {
                continue;
            };
            warn!(
                "ARBITRAGE FOUND: {} vs {} - {}% profit ({} @ {} / {} @ {})",
                record.home_team,
                record.away_team,
                record.profit_margin_percent(),
                display_or_dash(record.result.best_home_bookmaker()),
                display_or_dash(record.result.best_home.as_ref().map(|b| b.american)),
                display_or_dash(record.result.best_away_bookmaker()),
                display_or_dash(record.result.best_away.as_ref().map(|b| b.american)),
            );
            self.store.put_opportunity(&record).await?;
        }

        let summary = ProcessingSummary::new(records, decode_failures, outcome.summary());
        info!(
            "Processed {} records, {} games, {} arbitrage opportunities ({} rejected, {} incomplete, {} undecodable)",
            summary.records_processed,
            summary.games_processed,
            summary.arbitrage_found,
            summary.rejected,
            summary.incomplete,
            summary.decode_failures
        );
        Ok(summary)
    }
}

/// Fetch quotes for every sport. A sport that fails is logged and skipped.
pub async fn collect_quotes(source: &dyn OddsSource, sports: &[Sport]) -> Vec<Quote> {
    let mut quotes = Vec::new();
    for sport in sports {
        match source.fetch(sport).await {
            Ok(fetched) => quotes.extend(fetched),
            Err(e) => error!("Error fetching {}: {}", sport, e),
        }
    }
    quotes
}

/// Write quotes to `path` as a JSON array of wire records.
pub async fn archive_quotes(path: &Path, quotes: &[Quote]) -> Result<(), ProcessorError> {
    let records: Vec<QuoteRecord> = quotes.iter().map(QuoteRecord::from_quote).collect();
    let json = serde_json::to_vec_pretty(&records)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| ProcessorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Archived {} records to {}", records.len(), path.display());
    Ok(())
}

fn opportunity_record(game: &EvaluatedGame, detected_at: DateTime<Utc>) -> Option<OpportunityRecord> {
    let first = game.game.quotes.first()?;
    Some(OpportunityRecord {
        game_id: game.game.game_id.clone(),
        sport: first.sport.clone(),
        home_team: first.home_team.clone(),
        away_team: first.away_team.clone(),
        commence_time: game.game.commence_time(),
        detected_at,
        result: game.evaluation.result.clone(),
    })
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use odds_core::{Bookmaker, GameId};
    use odds_engine::ArbitrageDetector;
    use odds_feeds::StaticSource;
    use odds_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-14T21:05:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn quote(game: &str, book: &str, home: Option<i32>, away: Option<i32>) -> Quote {
        Quote::new(
            GameId::new(game),
            Sport::nba(),
            format!("{game} Home"),
            format!("{game} Away"),
            Bookmaker::new(book),
            now(),
        )
        .with_prices(home, away)
    }

    fn pipeline(store: &MemoryStore) -> Pipeline {
        Pipeline::new(BatchEvaluator::default(), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_process_records_end_to_end() {
        let store = MemoryStore::default();
        let quotes = vec![
            quote("g1", "BookA", Some(-110), Some(100)),
            quote("g2", "BookA", Some(-150), Some(130)),
            quote("g1", "BookB", Some(105), Some(-130)),
        ];
        let json = StreamCodec::encode(&quotes).unwrap();

        let summary = pipeline(&store).process_records(&json, now()).await.unwrap();

        assert_eq!(
            summary,
            ProcessingSummary {
                records_processed: 3,
                games_processed: 2,
                arbitrage_found: 1,
                rejected: 0,
                incomplete: 0,
                decode_failures: 0,
            }
        );
        assert_eq!(store.quote_count(), 3);

        let opportunities = store.opportunities(now()).await.unwrap();
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].game_id.as_str(), "g1");
        assert_eq!(opportunities[0].home_team, "g1 Home");
        assert_eq!(opportunities[0].detected_at, now());
        assert_eq!(opportunities[0].profit_margin_percent(), dec!(1.22));
    }

    #[tokio::test]
    async fn test_undecodable_records_are_counted() {
        let store = MemoryStore::default();
        let good = StreamCodec::encode(&[quote("g1", "BookA", Some(-110), Some(100))]).unwrap();
        let mut envelope: serde_json::Value = serde_json::from_str(&good).unwrap();
        envelope["Records"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({"kinesis": {"data": "%%%"}}));

        let summary = pipeline(&store)
            .process_records(&envelope.to_string(), now())
            .await
            .unwrap();

        assert_eq!(summary.records_processed, 2);
        assert_eq!(summary.decode_failures, 1);
        assert_eq!(summary.games_processed, 1);
        assert_eq!(summary.arbitrage_found, 0);
    }

    #[tokio::test]
    async fn test_unreadable_envelope_fails() {
        let store = MemoryStore::default();
        let err = pipeline(&store).process_records("nope", now()).await.unwrap_err();
        assert!(matches!(err, ProcessorError::Batch(_)));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = MemoryStore::default();
        let summary = pipeline(&store).process_quotes(Vec::new(), now()).await.unwrap();
        assert_eq!(summary, ProcessingSummary::default());
    }

    #[tokio::test]
    async fn test_invalid_and_incomplete_quotes_reported() {
        let store = MemoryStore::default();
        let quotes = vec![
            quote("g1", "BookA", Some(-110), Some(100)),
            quote("g1", "Bad", Some(0), Some(400)),
            quote("g1", "Half", None, Some(300)),
            quote("g1", "BookB", Some(105), Some(-130)),
        ];

        let summary = pipeline(&store).process_quotes(quotes, now()).await.unwrap();

        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.incomplete, 1);
        assert_eq!(summary.arbitrage_found, 1);
        // every quote is stored, valid or not
        assert_eq!(store.quote_count(), 4);
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let store = MemoryStore::default().with_capacity_limit(1);
        let quotes = vec![
            quote("g1", "BookA", Some(-110), Some(100)),
            quote("g1", "BookB", Some(105), Some(-130)),
        ];
        let err = pipeline(&store).process_quotes(quotes, now()).await.unwrap_err();
        assert!(matches!(err, ProcessorError::Store(_)));
    }

    #[tokio::test]
    async fn test_parallel_pipeline_matches_sequential() {
        let mut quotes = Vec::new();
        for i in 0..20 {
            let game = format!("game-{i}");
            quotes.push(quote(&game, "BookA", Some(-110), Some(100 + i)));
            quotes.push(quote(&game, "BookB", Some(105), Some(-130)));
        }

        let sequential = pipeline(&MemoryStore::default())
            .process_quotes(quotes.clone(), now())
            .await
            .unwrap();
        let parallel_store = MemoryStore::default();
        let parallel = Pipeline::new(
            BatchEvaluator::new(ArbitrageDetector::default(), 4),
            Arc::new(parallel_store.clone()),
        )
        .process_quotes(quotes, now())
        .await
        .unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(parallel_store.opportunity_count(), 20);
    }

    #[tokio::test]
    async fn test_collect_quotes_across_sports() {
        let mut nfl = quote("nfl-1", "BookA", Some(-110), Some(100));
        nfl.sport = Sport::nfl();
        let source = StaticSource::new(vec![quote("nba-1", "BookA", Some(-110), Some(100)), nfl]);

        let quotes = collect_quotes(&source, &Sport::defaults()).await;
        let ids: Vec<&str> = quotes.iter().map(|q| q.game_id.as_str()).collect();
        assert_eq!(ids, vec!["nba-1", "nfl-1"]);
    }

    #[tokio::test]
    async fn test_archive_quotes_writes_wire_records() {
        let path = std::env::temp_dir().join(format!("odds-archive-{}.json", std::process::id()));
        archive_quotes(&path, &[quote("g1", "BookA", Some(-110), Some(100))])
            .await
            .unwrap();

        let written: Vec<QuoteRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].home_odds, Some(-110));
        std::fs::remove_file(path).unwrap();
    }
}
