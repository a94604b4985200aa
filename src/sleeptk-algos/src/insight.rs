use std::fmt::Display;

use chrono::{NaiveDateTime, TimeDelta};

use crate::helpers::{format_hm::FormatHM, time_math::round_float};

/// What the watch tells a sleeper who checks the time during the night.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SleepInsight {
    pub slept: TimeDelta,
    pub cycles: f64,
    /// Percent of the way from falling asleep to the alarm.
    pub alarm_progress: Option<u8>,
    /// Only known after half an hour of sleep.
    pub well_rested: Option<bool>,
}

impl SleepInsight {
    const VERDICT_AFTER: TimeDelta = TimeDelta::minutes(30);

    pub fn new(
        start: NaiveDateTime,
        now: NaiveDateTime,
        alarm: Option<NaiveDateTime>,
        cycle_length: TimeDelta,
    ) -> Self {
        let slept = (now - start).max(TimeDelta::zero());
        let cycle_secs = cycle_length.num_seconds().max(1) as f64;
        let cycles = slept.num_seconds() as f64 / cycle_secs;

        let alarm_progress = alarm.map(|alarm| {
            let total = (alarm - start).num_seconds();
            if total <= 0 {
                return 100;
            }
            (slept.num_seconds() as f64 / total as f64 * 100.0).clamp(0.0, 100.0) as u8
        });

        let well_rested = (slept > Self::VERDICT_AFTER).then(|| {
            let fraction = cycles.fract();
            !(0.10..=0.90).contains(&fraction)
        });

        Self {
            slept,
            cycles: round_float(cycles),
            alarm_progress,
            well_rested,
        }
    }
}

impl Display for SleepInsight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Slept {}, {} cycles", self.slept.format_hm(), self.cycles)?;
        if let Some(progress) = self.alarm_progress {
            write!(f, ", {}% to alarm", progress)?;
        }
        match self.well_rested {
            Some(true) => write!(f, ", well rested"),
            Some(false) => write!(f, ", mid-cycle"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap()
    }

    fn after(minutes: i64) -> NaiveDateTime {
        start() + TimeDelta::minutes(minutes)
    }

    #[test]
    fn end_of_cycle_is_well_rested() {
        let insight = SleepInsight::new(start(), after(362), None, TimeDelta::minutes(90));
        assert_eq!(insight.cycles, 4.02);
        assert_eq!(insight.well_rested, Some(true));
        assert_eq!(insight.alarm_progress, None);
    }

    #[test]
    fn mid_cycle_is_not() {
        let insight = SleepInsight::new(start(), after(315), None, TimeDelta::minutes(90));
        assert_eq!(insight.cycles, 3.5);
        assert_eq!(insight.well_rested, Some(false));
    }

    #[test]
    fn no_verdict_in_first_half_hour() {
        let insight = SleepInsight::new(start(), after(5), None, TimeDelta::minutes(90));
        assert_eq!(insight.well_rested, None);
    }

    #[test]
    fn progress_towards_alarm() {
        let insight = SleepInsight::new(start(), after(120), Some(after(480)), TimeDelta::minutes(90));
        assert_eq!(insight.alarm_progress, Some(25));

        let late = SleepInsight::new(start(), after(500), Some(after(480)), TimeDelta::minutes(90));
        assert_eq!(late.alarm_progress, Some(100));
    }

    #[test]
    fn display() {
        let insight = SleepInsight::new(start(), after(450), Some(after(450)), TimeDelta::minutes(90));
        assert_eq!(
            insight.to_string(),
            "Slept 07h30m, 5 cycles, 100% to alarm, well rested"
        );
    }
}
