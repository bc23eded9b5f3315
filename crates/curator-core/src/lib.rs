//! Curator Core - Domain types and URL canonicalization for the curator pipeline.

mod types;
pub mod urlnorm;

pub use types::*;
