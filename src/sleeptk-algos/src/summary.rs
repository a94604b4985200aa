use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use sleeptk_codec::{ParsedSample, SleepLog};

use crate::helpers::time_math::{mean, round_float};

/// One night condensed into the figures kept across nights.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SleepSummary {
    /// Date the sleeper woke up on.
    pub id: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub min_bpm: Option<u8>,
    pub max_bpm: Option<u8>,
    pub avg_bpm: Option<u8>,
    pub mean_motion: f64,
    pub cycles: f64,
    pub touches: u32,
    pub score: f64,
}

impl SleepSummary {
    const IDEAL_SLEEP: TimeDelta = TimeDelta::hours(8);

    pub fn from_log(log: &SleepLog, cycle_length: TimeDelta) -> Self {
        Self::from_samples(log.start(), &log.samples, cycle_length)
    }

    pub fn from_samples(
        start: NaiveDateTime,
        samples: &[ParsedSample],
        cycle_length: TimeDelta,
    ) -> Self {
        let end = samples.iter().map(|s| s.time).max().unwrap_or(start).max(start);
        let duration = end - start;

        let bpm = samples
            .iter()
            .filter_map(|s| s.heart_rate.bpm())
            .collect::<Vec<_>>();
        let avg_bpm = (!bpm.is_empty()).then(|| {
            let total = bpm.iter().map(|&b| u32::from(b)).sum::<u32>();
            (total / bpm.len() as u32) as u8
        });

        let motion = samples
            .iter()
            .map(|s| s.motion)
            .filter(|m| m.is_finite())
            .collect::<Vec<_>>();

        let cycle_secs = cycle_length.num_seconds().max(1) as f64;

        Self {
            id: end.date(),
            start,
            end,
            min_bpm: bpm.iter().copied().min(),
            max_bpm: bpm.iter().copied().max(),
            avg_bpm,
            mean_motion: round_float(mean(&motion)),
            cycles: round_float(duration.num_seconds() as f64 / cycle_secs),
            touches: samples.iter().filter(|s| s.meta.was_touched()).count() as u32,
            score: Self::sleep_score(duration),
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Share of an eight hour night, in percent, capped at 100.
    pub fn sleep_score(duration: TimeDelta) -> f64 {
        let score = duration.num_seconds() as f64 / Self::IDEAL_SLEEP.num_seconds() as f64 * 100.0;
        round_float(score.clamp(0.0, 100.0))
    }
}
