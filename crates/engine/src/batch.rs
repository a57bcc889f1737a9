//! Batch evaluation.
//!
//! Evaluates every game of a grouped batch. Games are independent, so large
//! batches are split into contiguous chunks and evaluated on scoped worker
//! threads; chunk results are concatenated back in first-appearance order.

use crate::{ArbitrageDetector, GameBatch, GameEvaluation, GameQuoteSet, RejectedQuote};
use serde::Serialize;
use std::any::Any;
use std::panic;
use tracing::{debug, error};

/// A game together with its evaluation.
#[derive(Debug, Clone)]
pub struct EvaluatedGame {
    pub game: GameQuoteSet,
    pub evaluation: GameEvaluation,
}

/// Counters for one evaluated batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub quotes: usize,
    pub games: usize,
    pub opportunities: usize,
    pub rejected: usize,
    pub incomplete: usize,
}

/// Result of evaluating a whole batch, in first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub games: Vec<EvaluatedGame>,
}

impl BatchOutcome {
    /// Games flagged as arbitrage opportunities.
    pub fn opportunities(&self) -> impl Iterator<Item = &EvaluatedGame> {
        self.games
            .iter()
            .filter(|g| g.evaluation.result.has_opportunity)
    }

    /// Every quote excluded across the batch.
    pub fn rejected(&self) -> impl Iterator<Item = &RejectedQuote> {
        self.games.iter().flat_map(|g| g.evaluation.rejected.iter())
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            games: self.games.len(),
            ..Default::default()
        };
        for game in &self.games {
            summary.quotes += game.game.len();
            summary.rejected += game.evaluation.rejected.len();
            summary.incomplete += game.evaluation.incomplete;
            if game.evaluation.result.has_opportunity {
                summary.opportunities += 1;
            }
        }
        summary
    }
}

/// Evaluates grouped batches, optionally in parallel.
#[derive(Debug, Clone)]
pub struct BatchEvaluator {
    detector: ArbitrageDetector,
    workers: usize,
}

impl BatchEvaluator {
    /// `workers` of 0 or 1 evaluates sequentially on the calling thread.
    pub fn new(detector: ArbitrageDetector, workers: usize) -> Self {
        Self {
            detector,
            workers: workers.max(1),
        }
    }

    pub fn sequential(detector: ArbitrageDetector) -> Self {
        Self::new(detector, 1)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn evaluate(&self, batch: GameBatch) -> BatchOutcome {
        let games = batch.into_games();
        let evaluations = self.evaluate_all(&games);

        BatchOutcome {
            games: games
                .into_iter()
                .zip(evaluations)
                .map(|(game, evaluation)| EvaluatedGame { game, evaluation })
                .collect(),
        }
    }

    fn evaluate_all(&self, games: &[GameQuoteSet]) -> Vec<GameEvaluation> {
        if self.workers == 1 || games.len() < 2 {
            return self.evaluate_chunk(games);
        }

        let chunk_size = games.len().div_ceil(self.workers);
        debug!(
            "Evaluating {} games in chunks of {} on {} workers",
            games.len(),
            chunk_size,
            self.workers
        );

        let chunked = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = games
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move |_| self.evaluate_chunk(chunk)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Result<Vec<_>, _>>()
        });

        merge_chunks(chunked)
    }

    fn evaluate_chunk(&self, games: &[GameQuoteSet]) -> Vec<GameEvaluation> {
        games
            .iter()
            .map(|game| self.detector.evaluate(&game.quotes))
            .collect()
    }
}

type PanicPayload = Box<dyn Any + Send + 'static>;

/// Concatenate chunk results in order. A worker panic is re-raised on the
/// calling thread.
fn merge_chunks<T>(
    chunked: Result<Result<Vec<Vec<T>>, PanicPayload>, PanicPayload>,
) -> Vec<T> {
    match chunked {
        Ok(Ok(chunks)) => chunks.into_iter().flatten().collect(),
        Ok(Err(payload)) | Err(payload) => {
            error!("Batch evaluation worker panicked");
            panic::resume_unwind(payload)
        }
    }
}

impl Default for BatchEvaluator {
    fn default() -> Self {
        Self::sequential(ArbitrageDetector::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group_by_game;
    use crate::test_support::quote;
    use odds_core::{ArbitrageResult, GameId, Quote};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_batch() -> Vec<Quote> {
        vec![
            quote("g1", "BookA", Some(-110), Some(100)),
            quote("g2", "BookA", Some(-150), Some(130)),
            quote("g1", "BookB", Some(105), Some(-130)),
            quote("g3", "BookA", Some(0), Some(120)),
            quote("g3", "BookB", Some(-120), None),
            quote("g2", "BookC", Some(-145), Some(125)),
        ]
    }

    fn results_by_game(outcome: &BatchOutcome) -> Vec<(GameId, ArbitrageResult)> {
        let mut results: Vec<_> = outcome
            .games
            .iter()
            .map(|g| (g.game.game_id.clone(), g.evaluation.result.clone()))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    #[test]
    fn test_empty_batch_yields_empty_outcome() {
        let outcome = BatchEvaluator::default().evaluate(group_by_game(Vec::new()));
        assert!(outcome.games.is_empty());
        assert_eq!(outcome.summary(), BatchSummary::default());
    }

    #[test]
    fn test_batch_summary() {
        let outcome = BatchEvaluator::default().evaluate(group_by_game(sample_batch()));

        assert_eq!(
            outcome.summary(),
            BatchSummary {
                quotes: 6,
                games: 3,
                opportunities: 1,
                rejected: 1,
                incomplete: 1,
            }
        );

        let opportunities: Vec<_> = outcome.opportunities().collect();
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].game.game_id.as_str(), "g1");
        assert_eq!(
            opportunities[0].evaluation.result.profit_margin_percent,
            Some(dec!(1.22))
        );

        let rejected: Vec<_> = outcome.rejected().collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].game_id.as_str(), "g3");
    }

    #[test]
    fn test_outcome_keeps_first_appearance_order() {
        let outcome = BatchEvaluator::default().evaluate(group_by_game(sample_batch()));
        let ids: Vec<&str> = outcome.games.iter().map(|g| g.game.game_id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut quotes = Vec::new();
        for i in 0..50 {
            let game = format!("game-{i}");
            quotes.push(quote(&game, "BookA", Some(-110 - i), Some(100 + i)));
            quotes.push(quote(&game, "BookB", Some(105 + i), Some(-130)));
        }

        let sequential = BatchEvaluator::default().evaluate(group_by_game(quotes.clone()));
        let parallel = BatchEvaluator::new(ArbitrageDetector::default(), 4)
            .evaluate(group_by_game(quotes));

        let seq_ids: Vec<_> = sequential.games.iter().map(|g| &g.game.game_id).collect();
        let par_ids: Vec<_> = parallel.games.iter().map(|g| &g.game.game_id).collect();
        assert_eq!(seq_ids, par_ids);
        assert_eq!(results_by_game(&sequential), results_by_game(&parallel));
        assert_eq!(sequential.summary(), parallel.summary());
    }

    #[test]
    fn test_same_batch_in_any_order_gives_same_results() {
        let forward = BatchEvaluator::default().evaluate(group_by_game(sample_batch()));
        let backward = BatchEvaluator::default()
            .evaluate(group_by_game(sample_batch().into_iter().rev()));

        // no ties in the sample, so order cannot change the winners
        assert_eq!(results_by_game(&forward), results_by_game(&backward));
    }

    #[test]
    fn test_merge_keeps_chunk_order() {
        let merged = merge_chunks::<u32>(Ok(Ok(vec![vec![1, 2], vec![3], vec![]])));
        assert_eq!(merged, vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "worker failed")]
    fn test_worker_panic_is_propagated() {
        let payload: PanicPayload = Box::new("worker failed");
        merge_chunks::<u32>(Ok(Err(payload)));
    }

    #[test]
    fn test_zero_workers_is_sequential() {
        assert_eq!(BatchEvaluator::new(ArbitrageDetector::default(), 0).workers(), 1);
    }
}
