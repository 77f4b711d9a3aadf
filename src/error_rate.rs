//! Phred-score-to-error-rate lookup and average-error computation (spec
//! §4.9, component G). Used by the driver's quality filter, not by the
//! trie itself.

/// Default ASCII offset applied to Phred scores (`!` = 33 = Phred 0).
pub const DEFAULT_PHRED_OFFSET: u8 = 33;

/// Error probability for a single Phred-encoded quality byte.
///
/// `p = 10^(-phred/10)` where `phred = byte - offset`. A byte below the
/// offset clamps to Phred 0 (probability 1.0) rather than panicking, since
/// malformed quality strings should degrade gracefully in a filter, not
/// crash the driver.
pub fn error_rate(quality_byte: u8, offset: u8) -> f64 {
    let phred = quality_byte.saturating_sub(offset) as f64;
    10f64.powf(-phred / 10.0)
}

/// Mean per-base error rate over a quality-scores string.
pub fn average_error_rate(scores: &[u8], offset: u8) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: f64 = scores.iter().map(|&b| error_rate(b, offset)).sum();
    total / scores.len() as f64
}
