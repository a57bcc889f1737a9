//! In-memory store with per-record time-to-live.

use crate::{OddsStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use odds_core::{Bookmaker, GameId, OpportunityRecord, Quote};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Default record lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

type QuoteKey = (GameId, Bookmaker);
type OpportunityKey = (GameId, DateTime<Utc>);

#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T> Expiring<T> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe in-memory [`OddsStore`].
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    quotes: Arc<DashMap<QuoteKey, Expiring<Quote>>>,
    opportunities: Arc<DashMap<OpportunityKey, Expiring<OpportunityRecord>>>,
    ttl: Duration,
    capacity: Option<usize>,
    /// Serializes quote writes so the capacity check and the insert agree.
    writes: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            quotes: Arc::new(DashMap::new()),
            opportunities: Arc::new(DashMap::new()),
            ttl,
            capacity: None,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_ttl_hours(hours: u32) -> Self {
        Self::new(Duration::hours(i64::from(hours)))
    }

    /// Cap the number of stored quotes (builder pattern).
    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity = Some(limit);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored quotes, expired ones included until purged.
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    /// Stored opportunities, expired ones included until purged.
    pub fn opportunity_count(&self) -> usize {
        self.opportunities.len()
    }

    fn expiry(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>, StoreError> {
        from.checked_add_signed(self.ttl)
            .ok_or_else(|| StoreError::ExpiryOutOfRange {
                at: from.to_rfc3339(),
                ttl: self.ttl.to_string(),
            })
    }

    fn insert_quotes(&self, quotes: &[Quote], now: DateTime<Utc>) -> Result<usize, StoreError> {
        let expires_at = self.expiry(now)?;
        let _guard = self
            .writes
            .lock()
            .map_err(|_| StoreError::Unavailable("quote write lock poisoned".to_string()))?;
        self.check_capacity(quotes)?;

        for quote in quotes {
            let key = (quote.game_id.clone(), quote.bookmaker.clone());
            self.quotes.insert(
                key,
                Expiring {
                    value: quote.clone(),
                    expires_at,
                },
            );
        }
        Ok(quotes.len())
    }

    fn check_capacity(&self, quotes: &[Quote]) -> Result<(), StoreError> {
        let Some(limit) = self.capacity else {
            return Ok(());
        };
        let mut new_keys: Vec<QuoteKey> = quotes
            .iter()
            .map(|q| (q.game_id.clone(), q.bookmaker.clone()))
            .filter(|key| !self.quotes.contains_key(key))
            .collect();
        new_keys.sort();
        new_keys.dedup();

        if self.quotes.len() + new_keys.len() > limit {
            return Err(StoreError::CapacityExceeded { limit });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_TTL_HOURS))
    }
}

#[async_trait]
impl OddsStore for MemoryStore {
    async fn put_quotes(&self, quotes: &[Quote], now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.insert_quotes(quotes, now)
    }

    async fn put_opportunity(&self, record: &OpportunityRecord) -> Result<(), StoreError> {
        let expires_at = self.expiry(record.detected_at)?;
        let key = (record.game_id.clone(), record.detected_at);
        self.opportunities.insert(
            key,
            Expiring {
                value: record.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn quotes_for_game(
        &self,
        game_id: &GameId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Quote>, StoreError> {
        let mut quotes: Vec<Quote> = self
            .quotes
            .iter()
            .filter(|entry| &entry.key().0 == game_id && entry.value().is_live(now))
            .map(|entry| entry.value().value.clone())
            .collect();
        quotes.sort_by(|a, b| a.bookmaker.cmp(&b.bookmaker));
        Ok(quotes)
    }

    async fn opportunities(&self, now: DateTime<Utc>) -> Result<Vec<OpportunityRecord>, StoreError> {
        let mut records: Vec<OpportunityRecord> = self
            .opportunities
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .map(|entry| entry.value().value.clone())
            .collect();
        records.sort_by(|a, b| {
            b.profit_margin_percent()
                .cmp(&a.profit_margin_percent())
                .then_with(|| b.detected_at.cmp(&a.detected_at))
                .then_with(|| a.game_id.cmp(&b.game_id))
        });
        Ok(records)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.quotes.retain(|_, entry| {
            let live = entry.is_live(now);
            removed += usize::from(!live);
            live
        });
        self.opportunities.retain(|_, entry| {
            let live = entry.is_live(now);
            removed += usize::from(!live);
            live
        });
        if removed > 0 {
            debug!("Purged {} expired records", removed);
        }
        Ok(removed)
    }
}
