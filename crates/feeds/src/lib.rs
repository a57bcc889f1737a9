//! Odds sources and provider payload adapters.
//!
//! - `provider` - flattens provider events into per-bookmaker quotes
//! - `source` - the `OddsSource` seam and its file-backed implementation

pub mod error;
pub mod provider;
pub mod source;

pub use error::*;
pub use provider::*;
pub use source::*;
