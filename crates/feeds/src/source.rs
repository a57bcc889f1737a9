//! Odds sources.

use crate::{FeedError, HeadToHeadAdapter};
use async_trait::async_trait;
use chrono::Utc;
use odds_core::{Quote, Sport};
use std::path::{Path, PathBuf};
use tracing::info;

/// Something that can produce the current quotes for a sport.
#[async_trait]
pub trait OddsSource: Send + Sync {
    /// Fetch every head-to-head quote currently offered for `sport`.
    async fn fetch(&self, sport: &Sport) -> Result<Vec<Quote>, FeedError>;
}

/// Reads a provider payload saved to disk.
///
/// The file holds a JSON array of provider events. Events whose `sport_key`
/// differs from the requested sport are ignored.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    sports: Vec<Sport>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sports: Vec::new(),
        }
    }

    /// Restrict the sports this source answers for (builder pattern).
    /// An empty list accepts any sport.
    pub fn with_sports(mut self, sports: Vec<Sport>) -> Self {
        self.sports = sports;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn supports(&self, sport: &Sport) -> bool {
        self.sports.is_empty() || self.sports.contains(sport)
    }
}

#[async_trait]
impl OddsSource for FileSource {
    async fn fetch(&self, sport: &Sport) -> Result<Vec<Quote>, FeedError> {
        if !self.supports(sport) {
            return Err(FeedError::UnsupportedSport(sport.to_string()));
        }

        let payload = tokio::fs::read_to_string(&self.path).await?;
        let mut events = HeadToHeadAdapter::parse_events(&payload)?;
        events.retain(|event| event.sport_key == sport.key());

        let quotes = HeadToHeadAdapter::flatten(&events, Utc::now());
        info!(
            "Fetched {} games ({} quotes) for {} from {}",
            events.len(),
            quotes.len(),
            sport,
            self.path.display()
        );
        Ok(quotes)
    }
}

/// Serves a fixed set of quotes. Useful for wiring tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    quotes: Vec<Quote>,
}

impl StaticSource {
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }
}

#[async_trait]
impl OddsSource for StaticSource {
    async fn fetch(&self, sport: &Sport) -> Result<Vec<Quote>, FeedError> {
        Ok(self
            .quotes
            .iter()
            .filter(|q| &q.sport == sport)
            .cloned()
            .collect())
    }
}
