//! Core data types for sports odds arbitrage.

pub mod error;
pub mod game;
pub mod odds;
pub mod opportunity;
pub mod quote;

pub use error::*;
pub use game::*;
pub use odds::*;
pub use opportunity::*;
pub use quote::*;
