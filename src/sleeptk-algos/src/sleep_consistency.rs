use std::fmt::{Debug, Display};

use chrono::{NaiveTime, TimeDelta};

use crate::{
    SleepSummary,
    helpers::{
        format_hm::FormatHM,
        time_math::{
            day_fraction_percent, mean, mean_deltas, mean_time, round_float, std_dev,
            std_dev_delta, std_time,
        },
    },
};

#[derive(Default)]
pub struct SleepConsistencyAnalyzer {
    durations: Vec<TimeDelta>,
    start_times: Vec<NaiveTime>,
    end_times: Vec<NaiveTime>,
    midpoints: Vec<NaiveTime>,
    cycles: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SleepMetrics {
    pub nights: usize,
    pub duration: DurationMetric<TimeDelta>,
    pub start_time: DurationMetric<NaiveTime, TimeDelta>,
    pub end_time: DurationMetric<NaiveTime, TimeDelta>,
    pub midpoint: DurationMetric<NaiveTime, TimeDelta>,
    pub cycles: CycleMetric,
    pub score: ConsistencyScore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConsistencyScore {
    pub total_score: f64,
    pub duration_score: f64,
    pub timing_score: f64,
}

/// Mean and spread of a duration or a clock time. Clock time spreads are
/// relative to a whole day, duration spreads to the mean duration.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct DurationMetric<Value, Spread = Value> {
    pub std: Spread,
    pub mean: Value,
    pub cv: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleMetric {
    pub std: f64,
    pub mean: f64,
    pub cv: f64,
}

impl SleepConsistencyAnalyzer {
    pub fn new(summaries: &[SleepSummary]) -> Self {
        let mut analyzer = SleepConsistencyAnalyzer::default();
        analyzer.process_summaries(summaries);
        analyzer
    }

    fn process_summaries(&mut self, summaries: &[SleepSummary]) {
        for summary in summaries {
            let start = summary.start;
            let end = summary.end;

            self.durations.push(end - start);
            self.start_times.push(start.time());
            self.end_times.push(end.time());
            self.midpoints.push((start + ((end - start) / 2)).time());
            self.cycles.push(summary.cycles);
        }
    }

    pub fn calculate_consistency_metrics(&self) -> SleepMetrics {
        if self.durations.is_empty() {
            return SleepMetrics::default();
        }

        let duration = self.duration_metric();
        let start_time = self.time_metric(&self.start_times);
        let end_time = self.time_metric(&self.end_times);
        let midpoint = self.time_metric(&self.midpoints);
        let cycles = self.cycle_metric();

        let duration_score = round_float(f64::max(0.0, 100.0 - duration.cv));

        let get_score =
            |metric: &DurationMetric<NaiveTime, TimeDelta>| f64::max(0.0, 100.0 - metric.cv);

        let timing_scores = [
            get_score(&start_time),
            get_score(&end_time),
            get_score(&midpoint),
        ];

        let timing_score = round_float(mean(&timing_scores));
        let mut total_scores = timing_scores.to_vec();
        total_scores.push(duration_score);
        let overall_score = mean(&total_scores);

        let score = ConsistencyScore {
            total_score: round_float(overall_score),
            duration_score,
            timing_score,
        };

        SleepMetrics {
            nights: self.durations.len(),
            duration,
            start_time,
            end_time,
            midpoint,
            cycles,
            score,
        }
    }

    fn duration_metric(&self) -> DurationMetric<TimeDelta> {
        let durations = &self.durations;
        let mean = mean_deltas(durations);
        let std = std_dev_delta(durations, mean);
        let cv = if mean.num_seconds() > 0 {
            round_float(std.num_seconds() as f64 / mean.num_seconds() as f64 * 100.0)
        } else {
            0.0
        };

        DurationMetric { std, mean, cv }
    }

    fn time_metric(&self, times: &[NaiveTime]) -> DurationMetric<NaiveTime, TimeDelta> {
        let mean = mean_time(times);
        let std = std_time(times, &mean);
        let cv = round_float(day_fraction_percent(std));
        DurationMetric { std, mean, cv }
    }

    fn cycle_metric(&self) -> CycleMetric {
        let mean = mean(&self.cycles);
        let std = std_dev(&self.cycles, mean);
        let cv = if mean > 0.0 { std / mean * 100.0 } else { 0.0 };

        CycleMetric {
            std: round_float(std),
            mean: round_float(mean),
            cv: round_float(cv),
        }
    }
}

impl<Value, Spread> Debug for DurationMetric<Value, Spread>
where
    Value: FormatHM,
    Spread: FormatHM,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurationMetric")
            .field("std", &self.std.format_hm())
            .field("mean", &self.mean.format_hm())
            .field("cv", &self.cv)
            .finish()
    }
}

impl<Value, Spread> Display for DurationMetric<Value, Spread>
where
    Value: FormatHM,
    Spread: FormatHM,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "STD: {}, Mean: {}, CV: {}",
            self.std.format_hm(),
            self.mean.format_hm(),
            self.cv
        ))
    }
}

impl Display for CycleMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "STD: {}, Mean: {}, CV: {}",
            self.std, self.mean, self.cv
        ))
    }
}

impl Display for SleepMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "Nights: {}\nDuration: {}\nStart time: {}\nEnd time: {}\nMidpoint: {}\nCycles: {}\nScores:\n",
            self.nights,
            self.duration,
            self.start_time,
            self.end_time,
            self.midpoint,
            self.cycles,
        ))?;
        f.write_fmt(format_args!(
            "\tDuration score: {}\n\tTiming score: {}\n\tOverall score: {}",
            self.score.duration_score, self.score.timing_score, self.score.total_score,
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn summary(start: NaiveDateTime, end: NaiveDateTime) -> SleepSummary {
        let duration = end - start;
        SleepSummary {
            id: end.date(),
            start,
            end,
            min_bpm: None,
            max_bpm: None,
            avg_bpm: None,
            mean_motion: 0.0,
            cycles: duration.num_minutes() as f64 / 90.0,
            touches: 0,
            score: SleepSummary::sleep_score(duration),
        }
    }

    #[test]
    fn test_empty_sleep() {
        let anal = SleepConsistencyAnalyzer::new(&[]);
        let metrics = anal.calculate_consistency_metrics();

        assert_eq!(metrics.duration, DurationMetric::default());
        assert_eq!(metrics.end_time, DurationMetric::default());
        assert_eq!(metrics.midpoint, DurationMetric::default());
        assert_eq!(metrics.start_time, DurationMetric::default());
        assert_eq!(metrics.cycles, CycleMetric::default());
        assert_eq!(metrics.score, ConsistencyScore::default());
    }

    #[test]
    fn identical_nights_are_perfectly_consistent() {
        let nights = (1..=3)
            .map(|d| summary(at(d, 23, 0), at(d + 1, 6, 30)))
            .collect::<Vec<_>>();
        let metrics = SleepConsistencyAnalyzer::new(&nights).calculate_consistency_metrics();

        assert_eq!(metrics.nights, 3);
        assert_eq!(metrics.duration.mean, TimeDelta::minutes(450));
        assert_eq!(metrics.start_time.mean.format_hm(), "23:00");
        assert_eq!(metrics.midpoint.mean.format_hm(), "02:45");
        assert_eq!(metrics.cycles.mean, 5.0);
        assert_eq!(metrics.score.total_score, 100.0);
    }

    #[test]
    fn start_times_around_midnight_average_correctly() {
        let nights = [
            summary(at(1, 23, 0), at(2, 7, 0)),
            summary(at(3, 1, 0), at(3, 9, 0)),
        ];
        let metrics = SleepConsistencyAnalyzer::new(&nights).calculate_consistency_metrics();

        assert_eq!(metrics.start_time.mean.format_hm(), "00:00");
        assert_eq!(metrics.start_time.std, TimeDelta::hours(1));
        assert_eq!(metrics.start_time.cv, 4.17);
        assert_eq!(metrics.duration.cv, 0.0);
        assert_eq!(metrics.score.duration_score, 100.0);
    }

    #[test]
    fn irregular_durations_lower_the_score() {
        let nights = [
            summary(at(1, 23, 0), at(2, 3, 0)),
            summary(at(2, 23, 0), at(3, 7, 0)),
        ];
        let metrics = SleepConsistencyAnalyzer::new(&nights).calculate_consistency_metrics();

        assert_eq!(metrics.duration.mean, TimeDelta::hours(6));
        assert_eq!(metrics.duration.std, TimeDelta::hours(2));
        assert_eq!(metrics.duration.cv, 33.33);
        assert_eq!(metrics.score.duration_score, 66.67);
        assert!(metrics.cycles.cv > 0.0);
    }
}
