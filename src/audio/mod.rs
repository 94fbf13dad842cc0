//! Waveforms and the signal chain applied to them.

pub(crate) mod filter;
/// Mastering chain (filters, compressor, peak normalization).
pub mod master;
pub(crate) mod mix;
/// Mono waveform value type.
pub mod segment;
/// Trigger-word sound effect placement.
pub mod sfx;
