//! Safe SQL builder: identifiers always quoted, values always parameters.

mod builder;
mod filter;
pub mod params;
pub use builder::*;
pub use filter::*;
pub use params::*;
