//! Wire formats for odds quotes.
//!
//! - `record` - the flat JSON shape a quote travels in
//! - `stream` - stream batch envelopes carrying base64-encoded records

pub mod error;
pub mod record;
pub mod stream;

pub use error::*;
pub use record::*;
pub use stream::*;
