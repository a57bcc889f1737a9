//! Arbitrage detection engine.
//!
//! Converts bookmaker quotes to decimal odds, groups them by game, and
//! decides per game whether the best prices on each side lock in a profit.

pub mod batch;
pub mod detector;
pub mod grouping;
pub mod normalizer;

pub use batch::*;
pub use detector::*;
pub use grouping::*;
pub use normalizer::*;
