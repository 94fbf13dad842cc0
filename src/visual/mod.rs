//! Background visuals: lookup, selection, fallback generation and fitting.

/// Fitted visual value types.
pub mod asset;
/// Duration and frame fitting.
pub mod fit;
/// Still image generation seam.
pub mod generate;
/// Footage provider seam.
pub mod provider;
/// Tiered lookup and fit.
pub mod resolver;
/// Candidate selection policies.
pub mod select;
