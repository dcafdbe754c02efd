//! Shared helper utilities

/// Unsigned division that rounds up instead of truncating.
///
/// The GF1 derives its stepping increments from register values with
/// round-up semantics, so a plain `/` would drift one step low.
#[inline]
pub const fn ceil_udivide(numerator: u32, denominator: u32) -> u32 {
    (numerator + denominator - 1) / denominator
}
