//! Storage for quotes and detected opportunities.
//!
//! Every stored record carries an expiry; expired records are invisible to
//! reads and removed by `purge_expired`.

pub mod error;
pub mod memory;

pub use error::*;
pub use memory::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use odds_core::{GameId, OpportunityRecord, Quote};

/// Storage seam used by the processing pipeline.
///
/// Quotes are keyed by `(game_id, bookmaker)`, so a newer quote from the
/// same bookmaker replaces the older one. Opportunities are keyed by
/// `(game_id, detected_at)` and accumulate.
#[async_trait]
pub trait OddsStore: Send + Sync {
    /// Upsert quotes, each expiring one TTL after `now`.
    async fn put_quotes(&self, quotes: &[Quote], now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Record a detected opportunity, expiring one TTL after its detection.
    async fn put_opportunity(&self, record: &OpportunityRecord) -> Result<(), StoreError>;

    /// Live quotes for one game, ordered by bookmaker.
    async fn quotes_for_game(
        &self,
        game_id: &GameId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Quote>, StoreError>;

    /// Live opportunities, best margin first.
    async fn opportunities(&self, now: DateTime<Utc>) -> Result<Vec<OpportunityRecord>, StoreError>;

    /// Drop everything expired at `now`. Returns the number of records removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
