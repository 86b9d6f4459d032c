//! Activity-reporting boundary
//!
//! Seam for a third-party watch-activity integration. This crate only
//! supplies the percentage-complete figure; delivery lives behind the
//! [`ActivityReporter`] trait implemented by the integrating component.

use async_trait::async_trait;
use strum::Display;

/// Playback lifecycle events consumed by the tracking integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackEvent {
    Start,
    Pause,
    Stop,
}

/// External watch-activity sink
#[async_trait]
pub trait ActivityReporter: Send + Sync {
    async fn report(
        &self,
        title_identifier: &str,
        percent_complete: f64,
        event: PlaybackEvent,
    ) -> anyhow::Result<()>;
}

/// Percentage complete as `position / duration * 100`, clamped to
/// `0.0..=100.0`; a zero or negative duration reports 0
pub fn percent_complete(position_ms: i64, duration_ms: i64) -> f64 {
    if duration_ms <= 0 {
        return 0.0;
    }
    (position_ms as f64 / duration_ms as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(30_000, 120_000, 25.0)]
    #[case(120_000, 120_000, 100.0)]
    #[case(0, 120_000, 0.0)]
    // Degenerate inputs clamp rather than report nonsense.
    #[case(10_000, 0, 0.0)]
    #[case(-5, 120_000, 0.0)]
    #[case(500_000, 120_000, 100.0)]
    fn percent_complete_is_position_over_duration(
        #[case] position_ms: i64,
        #[case] duration_ms: i64,
        #[case] expected: f64,
    ) {
        assert_eq!(percent_complete(position_ms, duration_ms), expected);
    }
}
