//! Batch grouping of quotes by game.

use chrono::{DateTime, Utc};
use odds_core::{GameId, Quote, Sport};
use std::collections::HashMap;

/// All quotes for one game collected within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameQuoteSet {
    pub game_id: GameId,
    pub quotes: Vec<Quote>,
}

impl GameQuoteSet {
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            quotes: Vec::new(),
        }
    }

    /// Sport of the game, taken from the first quote.
    pub fn sport(&self) -> Option<&Sport> {
        self.quotes.first().map(|q| &q.sport)
    }

    /// `(home, away)` team names, taken from the first quote.
    pub fn teams(&self) -> Option<(&str, &str)> {
        self.quotes
            .first()
            .map(|q| (q.home_team.as_str(), q.away_team.as_str()))
    }

    /// Scheduled start, from the first quote that carries one.
    pub fn commence_time(&self) -> Option<DateTime<Utc>> {
        self.quotes.iter().find_map(|q| q.commence_time)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Quotes of one batch grouped by game, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct GameBatch {
    games: Vec<GameQuoteSet>,
    index: HashMap<GameId, usize>,
}

impl GameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a quote to its game, creating the game on first sight.
    pub fn push(&mut self, quote: Quote) {
        let slot = match self.index.get(&quote.game_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.games.len();
                self.index.insert(quote.game_id.clone(), slot);
                self.games.push(GameQuoteSet::new(quote.game_id.clone()));
                slot
            }
        };
        self.games[slot].quotes.push(quote);
    }

    pub fn get(&self, game_id: &GameId) -> Option<&GameQuoteSet> {
        self.index.get(game_id).map(|&slot| &self.games[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameQuoteSet> {
        self.games.iter()
    }

    pub fn game_ids(&self) -> impl Iterator<Item = &GameId> {
        self.games.iter().map(|g| &g.game_id)
    }

    /// Number of games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Total number of quotes across all games.
    pub fn quote_count(&self) -> usize {
        self.games.iter().map(GameQuoteSet::len).sum()
    }

    pub fn into_games(self) -> Vec<GameQuoteSet> {
        self.games
    }
}

impl FromIterator<Quote> for GameBatch {
    fn from_iter<I: IntoIterator<Item = Quote>>(iter: I) -> Self {
        let mut batch = GameBatch::new();
        for quote in iter {
            batch.push(quote);
        }
        batch
    }
}

/// Group quotes by `game_id`, keeping the order in which games first appear.
pub fn group_by_game(quotes: impl IntoIterator<Item = Quote>) -> GameBatch {
    quotes.into_iter().collect()
}
