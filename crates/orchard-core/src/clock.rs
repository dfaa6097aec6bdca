//! Derived temporal values computed between snapshots.
//!
//! The server commits growth progress only when it is polled, so between
//! syncs the client projects the current growth stage, the time left in the
//! stage, and the residual lifetime of timed buffs from timestamps and the
//! static per-plant growth rule.
//!
//! # Design Principles
//!
//! - Projections are read-only. Nothing here writes back into a
//!   [`Snapshot`](orchard_types::Snapshot); the next sync is the only source
//!   of committed progress.
//! - A timestamp that cannot be parsed is reported as unavailable, never as
//!   a zero duration.
//! - A plot whose committed stage is already terminal has no countdown.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use orchard_types::PlantType;

/// Text shown for any duration that cannot be rendered.
pub const UNAVAILABLE_COUNTDOWN: &str = "--:--";

/// Naive layouts the server emits for `datetime.isoformat()`.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Minutes between fruit spawn windows on the server.
const SPAWN_WINDOW_MINUTES: u32 = 2;

/// Minutes between global weather rolls on the server.
const WEATHER_WINDOW_MINUTES: u32 = 5;

/// Errors raised while interpreting server timestamps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// The field was present but blank.
    #[error("timestamp is empty")]
    Empty,

    /// The field matched none of the accepted layouts.
    #[error("unrecognised timestamp: {raw:?}")]
    Malformed {
        /// The offending text.
        raw: String,
    },
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339, RFC 2822 (which covers the HTTP-date form the server
/// uses for `planted_at`), and naive ISO-8601 which is taken to be UTC.
///
/// # Errors
///
/// Returns [`TimestampError`] when the text matches none of those.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(trimmed, layout).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError::Malformed {
            raw: trimmed.to_owned(),
        })
}

/// Render a duration as `MM:SS`, or `H:MM:SS` once it reaches an hour.
///
/// Fractions are truncated. Negative and non-finite input renders
/// [`UNAVAILABLE_COUNTDOWN`].
pub fn format_countdown(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return UNAVAILABLE_COUNTDOWN.to_owned();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

/// Static growth parameters of a plant type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthRule {
    /// Seconds of effective growth per stage.
    pub stage_seconds: f64,
    /// Terminal stage.
    pub max_stage: u32,
}

impl GrowthRule {
    /// Extract the rule from a catalog entry.
    pub const fn for_plant(plant: &PlantType) -> Self {
        Self {
            stage_seconds: plant.growth_time_per_stage_seconds,
            max_stage: plant.max_growth_stage,
        }
    }
}

/// Display projection of a planted plot's growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthProjection {
    /// The planting timestamp or rule could not be interpreted.
    Unavailable,
    /// Still growing.
    Growing {
        /// Stage to display, never below the committed stage.
        stage: u32,
        /// Seconds until `stage` is left behind.
        seconds_to_next: f64,
    },
    /// Terminal stage reached; no countdown.
    Mature,
}

impl GrowthProjection {
    /// Countdown text for the plot's growth line.
    pub fn countdown_text(&self) -> String {
        match self {
            Self::Unavailable => "Next Stage: Error".to_owned(),
            Self::Growing {
                seconds_to_next, ..
            } => format!("Next Stage: {}", format_countdown(*seconds_to_next)),
            Self::Mature => "Mature".to_owned(),
        }
    }
}

/// Residual lifetime of a timed buff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuffResidual {
    /// Still running.
    Active {
        /// Seconds until expiry, always positive.
        seconds_left: f64,
    },
    /// Expired locally; hidden even if the snapshot still lists it.
    Expired,
    /// Expiry could not be parsed.
    Unavailable,
}

// ---------------------------------------------------------------------------
// DerivedClock
// ---------------------------------------------------------------------------

/// Derives display-time values against a fixed instant.
///
/// One clock is built per tick so every value in a pass agrees on "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedClock {
    now: DateTime<Utc>,
}

impl DerivedClock {
    /// Clock pinned at `now`.
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// The instant this clock is pinned at.
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Effective growth seconds: wall time since planting plus boost,
    /// never negative.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when `planted_at` is missing or unparseable.
    pub fn effective_elapsed(
        &self,
        planted_at: Option<&str>,
        boost_seconds: f64,
    ) -> Result<f64, TimestampError> {
        let planted = parse_timestamp(planted_at.ok_or(TimestampError::Empty)?)?;
        let wall = self.now.signed_duration_since(planted).as_seconds_f64();
        Ok((wall + boost_seconds.max(0.0)).max(0.0))
    }

    /// Project the growth of a plot.
    ///
    /// `committed_stage` is the stage the server last persisted. The
    /// projection is `max(raw, committed)` capped at the rule's maximum;
    /// once that reaches the maximum the plot is [`GrowthProjection::Mature`].
    pub fn growth(
        &self,
        rule: GrowthRule,
        planted_at: Option<&str>,
        boost_seconds: f64,
        committed_stage: u32,
    ) -> GrowthProjection {
        if committed_stage >= rule.max_stage {
            return GrowthProjection::Mature;
        }
        if !rule.stage_seconds.is_finite() || rule.stage_seconds <= 0.0 {
            return GrowthProjection::Unavailable;
        }
        let Ok(elapsed) = self.effective_elapsed(planted_at, boost_seconds) else {
            return GrowthProjection::Unavailable;
        };

        let completed = (elapsed / rule.stage_seconds).floor();
        let raw = if completed >= f64::from(rule.max_stage) {
            rule.max_stage
        } else {
            // completed is finite, non-negative and below max_stage
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let whole = completed as u32;
            whole.saturating_add(1).clamp(1, rule.max_stage.max(1))
        };

        let stage = raw.max(committed_stage).min(rule.max_stage);
        if stage >= rule.max_stage {
            return GrowthProjection::Mature;
        }
        let seconds_to_next = f64::from(stage).mul_add(rule.stage_seconds, -elapsed).max(0.0);
        GrowthProjection::Growing {
            stage,
            seconds_to_next,
        }
    }

    /// Residual lifetime of a buff expiring at `expiry`.
    pub fn buff(&self, expiry: &str) -> BuffResidual {
        match parse_timestamp(expiry) {
            Ok(at) => {
                let seconds_left = at.signed_duration_since(self.now).as_seconds_f64();
                if seconds_left > 0.0 {
                    BuffResidual::Active { seconds_left }
                } else {
                    BuffResidual::Expired
                }
            }
            Err(_) => BuffResidual::Unavailable,
        }
    }

    /// Seconds until the server's next fruit spawn window (every even
    /// wall-clock minute).
    pub fn seconds_to_next_spawn(&self) -> f64 {
        self.seconds_to_next_window(SPAWN_WINDOW_MINUTES)
    }

    /// Seconds until the server's next global weather roll (every fifth
    /// wall-clock minute).
    pub fn seconds_to_next_weather(&self) -> f64 {
        self.seconds_to_next_window(WEATHER_WINDOW_MINUTES)
    }

    /// Seconds until the next minute that is a multiple of `window`,
    /// strictly after the current minute.
    fn seconds_to_next_window(&self, window: u32) -> f64 {
        let window = window.max(1);
        let minutes_ahead = window.saturating_sub(self.now.minute() % window);
        let into_minute =
            f64::from(self.now.second()) + f64::from(self.now.nanosecond()) / 1_000_000_000.0;
        f64::from(minutes_ahead).mul_add(60.0, -into_minute)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    const RULE: GrowthRule = GrowthRule {
        stage_seconds: 600.0,
        max_stage: 20,
    };

    #[test]
    fn parses_all_server_layouts() {
        let expected = at(10, 0, 0);
        assert_eq!(parse_timestamp("2024-05-01T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T10:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01 10:00:00.000").unwrap(), expected);
        assert_eq!(
            parse_timestamp("Wed, 01 May 2024 10:00:00 GMT").unwrap(),
            expected
        );
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert_eq!(parse_timestamp("  "), Err(TimestampError::Empty));
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TimestampError::Malformed { .. })
        ));
    }

    #[test]
    fn countdown_formats() {
        assert_eq!(format_countdown(0.0), "00:00");
        assert_eq!(format_countdown(65.9), "01:05");
        assert_eq!(format_countdown(3600.0), "1:00:00");
        assert_eq!(format_countdown(3725.0), "1:02:05");
        assert_eq!(format_countdown(-1.0), UNAVAILABLE_COUNTDOWN);
        assert_eq!(format_countdown(f64::NAN), UNAVAILABLE_COUNTDOWN);
    }

    #[test]
    fn growth_stage_from_elapsed_time() {
        let clock = DerivedClock::at(at(10, 25, 0));
        let projection = clock.growth(RULE, Some("2024-05-01T10:00:00"), 0.0, 1);
        assert_eq!(
            projection,
            GrowthProjection::Growing {
                stage: 3,
                seconds_to_next: 300.0
            }
        );
        assert_eq!(projection.countdown_text(), "Next Stage: 05:00");
    }

    #[test]
    fn boost_counts_as_elapsed_time() {
        let clock = DerivedClock::at(at(10, 0, 0));
        let projection = clock.growth(RULE, Some("2024-05-01T10:00:00"), 1500.0, 1);
        assert!(matches!(
            projection,
            GrowthProjection::Growing { stage: 3, .. }
        ));
    }

    #[test]
    fn committed_stage_is_a_floor() {
        let clock = DerivedClock::at(at(10, 0, 30));
        let projection = clock.growth(RULE, Some("2024-05-01T10:00:00"), 0.0, 4);
        assert_eq!(
            projection,
            GrowthProjection::Growing {
                stage: 4,
                seconds_to_next: 2370.0
            }
        );
    }

    #[test]
    fn future_planting_clamps_to_stage_one() {
        let clock = DerivedClock::at(at(9, 0, 0));
        let projection = clock.growth(RULE, Some("2024-05-01T10:00:00"), 0.0, 1);
        assert_eq!(
            projection,
            GrowthProjection::Growing {
                stage: 1,
                seconds_to_next: 600.0
            }
        );
    }

    #[test]
    fn mature_suppresses_countdown() {
        let clock = DerivedClock::at(at(10, 0, 0));
        assert_eq!(
            clock.growth(RULE, Some("2024-05-01T10:00:00"), 0.0, 20),
            GrowthProjection::Mature
        );
        // Projection reaching the last stage is terminal as well.
        let late = DerivedClock::at(at(23, 0, 0));
        assert_eq!(
            late.growth(RULE, Some("2024-05-01T10:00:00"), 0.0, 2),
            GrowthProjection::Mature
        );
        assert_eq!(GrowthProjection::Mature.countdown_text(), "Mature");
    }

    #[test]
    fn malformed_planting_is_unavailable() {
        let clock = DerivedClock::at(at(10, 0, 0));
        assert_eq!(
            clock.growth(RULE, Some("not a date"), 0.0, 1),
            GrowthProjection::Unavailable
        );
        assert_eq!(
            clock.growth(RULE, None, 0.0, 1),
            GrowthProjection::Unavailable
        );
        assert_eq!(
            GrowthProjection::Unavailable.countdown_text(),
            "Next Stage: Error"
        );
    }

    #[test]
    fn buff_residuals() {
        let clock = DerivedClock::at(at(10, 0, 0));
        assert_eq!(
            clock.buff("2024-05-01T10:01:30"),
            BuffResidual::Active { seconds_left: 90.0 }
        );
        assert_eq!(clock.buff("2024-05-01T10:00:00"), BuffResidual::Expired);
        assert_eq!(clock.buff("2024-05-01T09:00:00"), BuffResidual::Expired);
        assert_eq!(clock.buff("soon"), BuffResidual::Unavailable);
    }

    #[test]
    fn server_windows() {
        // Odd minute: next even minute is one minute boundary away.
        let odd = DerivedClock::at(at(10, 3, 20));
        assert!((odd.seconds_to_next_spawn() - 40.0).abs() < 1e-9);
        // Even minute: the window just opened, next one is two minutes out.
        let even = DerivedClock::at(at(10, 4, 0));
        assert!((even.seconds_to_next_spawn() - 120.0).abs() < 1e-9);
        // Weather rolls on fifth minutes, wrapping into the next hour.
        let late = DerivedClock::at(at(10, 57, 30));
        assert!((late.seconds_to_next_weather() - 150.0).abs() < 1e-9);
        let on_roll = DerivedClock::at(at(10, 55, 0));
        assert!((on_roll.seconds_to_next_weather() - 300.0).abs() < 1e-9);
    }
}
