//! Per-character reveal rate.

use std::time::Duration;

use serde::Deserialize;

/// Shortest interval ever scheduled; periodic timers reject zero.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Tuning for the reveal rate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Per-character interval used when the audio duration is unknown.
    pub fallback_per_char_ms: u64,
    /// Lower bound on the probed per-character interval.
    pub min_per_char_ms: u64,
    /// Share of the audio duration the text should take; below 1.0 the text
    /// finishes slightly ahead of the audio.
    pub lead_factor: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            fallback_per_char_ms: 50,
            min_per_char_ms: 30,
            lead_factor: 0.95,
        }
    }
}

/// Where a reveal rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// Derived from the probed audio duration.
    Probed(Duration),
    /// The fixed fallback rate.
    Fallback,
}

/// Interval between revealed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealRate {
    /// Time between two consecutive characters.
    pub per_char: Duration,
    /// How the interval was chosen.
    pub source: RateSource,
}

impl RevealRate {
    /// Computes the rate for `char_count` characters.
    ///
    /// With a non-zero `audio_duration` and non-empty text:
    /// `max(min, round(duration_ms * lead / char_count))`. Otherwise the
    /// fallback rate. Never shorter than `MIN_TICK`, whatever the config.
    #[must_use]
    pub fn compute(
        config: &RevealConfig,
        char_count: usize,
        audio_duration: Option<Duration>,
    ) -> Self {
        match audio_duration {
            Some(duration) if !duration.is_zero() && char_count > 0 => {
                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss
                )]
                let scaled = (duration.as_secs_f64() * 1_000.0 * config.lead_factor
                    / char_count as f64)
                    .round() as u64;
                Self {
                    per_char: Duration::from_millis(scaled.max(config.min_per_char_ms))
                        .max(MIN_TICK),
                    source: RateSource::Probed(duration),
                }
            }
            _ => Self::fallback(config),
        }
    }

    /// The fixed fallback rate.
    #[must_use]
    pub fn fallback(config: &RevealConfig) -> Self {
        Self {
            per_char: Duration::from_millis(config.fallback_per_char_ms).max(MIN_TICK),
            source: RateSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_chars_over_two_seconds_is_190ms() {
        // Arrange
        let config = RevealConfig::default();

        // Act
        let rate = RevealRate::compute(&config, 10, Some(Duration::from_millis(2_000)));

        // Assert
        assert_eq!(rate.per_char, Duration::from_millis(190));
        assert_eq!(rate.source, RateSource::Probed(Duration::from_millis(2_000)));
    }

    #[test]
    fn test_short_audio_is_floored_at_30ms() {
        let rate = RevealRate::compute(&RevealConfig::default(), 100, Some(Duration::from_millis(500)));

        assert_eq!(rate.per_char, Duration::from_millis(30));
    }

    #[test]
    fn test_unknown_duration_uses_fallback_regardless_of_length() {
        let config = RevealConfig::default();

        for len in [1, 10, 1_000] {
            let rate = RevealRate::compute(&config, len, None);
            assert_eq!(rate.per_char, Duration::from_millis(50));
            assert_eq!(rate.source, RateSource::Fallback);
        }
    }

    #[test]
    fn test_zero_duration_uses_fallback() {
        let rate = RevealRate::compute(&RevealConfig::default(), 5, Some(Duration::ZERO));

        assert_eq!(rate.source, RateSource::Fallback);
    }

    #[test]
    fn test_rounding_is_to_nearest() {
        // 1000 * 0.95 / 3 = 316.67
        let rate = RevealRate::compute(&RevealConfig::default(), 3, Some(Duration::from_millis(1_000)));

        assert_eq!(rate.per_char, Duration::from_millis(317));
    }

    #[test]
    fn test_zero_fallback_is_raised_to_min_tick() {
        // Arrange
        let config = RevealConfig {
            fallback_per_char_ms: 0,
            ..RevealConfig::default()
        };

        // Act
        let rate = RevealRate::compute(&config, 12, None);

        // Assert
        assert_eq!(rate.per_char, MIN_TICK);
        assert_eq!(rate.source, RateSource::Fallback);
    }

    #[test]
    fn test_zero_floor_with_long_text_never_yields_zero() {
        let config = RevealConfig {
            min_per_char_ms: 0,
            ..RevealConfig::default()
        };

        // 100 * 0.95 / 10_000 rounds to 0
        let rate = RevealRate::compute(&config, 10_000, Some(Duration::from_millis(100)));

        assert_eq!(rate.per_char, MIN_TICK);
    }
}
