use std::f64::consts::PI;

use chrono::{NaiveDateTime, TimeDelta};

use crate::helpers::time_math::standardize;

/// Sinusoid of one sleep cycle fitted to the motion of a night. The curve
/// peaks where the sleeper moves most, which is where sleep is lightest.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CycleEstimate {
    pub start: NaiveDateTime,
    pub cycle_length_secs: i64,
    pub phase_secs: i64,
    /// Normalised projection of the standardised motion on the curve, in [-1, 1].
    pub fit: f64,
    pub samples: usize,
}

impl CycleEstimate {
    pub fn cycle_length(&self) -> TimeDelta {
        TimeDelta::seconds(self.cycle_length_secs)
    }

    pub fn phase(&self) -> TimeDelta {
        TimeDelta::seconds(self.phase_secs)
    }

    fn omega(&self) -> f64 {
        2.0 * PI / self.cycle_length_secs as f64
    }

    pub fn curve(&self, time: NaiveDateTime) -> f64 {
        let t = (time - self.start).num_seconds() - self.phase_secs;
        (self.omega() * t as f64).sin()
    }

    /// First curve maximum strictly after `time`.
    pub fn next_peak(&self, time: NaiveDateTime) -> NaiveDateTime {
        let first_peak = self.phase_secs + self.cycle_length_secs / 4;
        let elapsed = (time - self.start).num_seconds();
        let cycles = (elapsed - first_peak).div_euclid(self.cycle_length_secs) + 1;
        self.start + TimeDelta::seconds(first_peak + cycles * self.cycle_length_secs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WakeSuggestion {
    pub alarm: NaiveDateTime,
    pub time: NaiveDateTime,
}

impl WakeSuggestion {
    pub fn earlier_by(&self) -> TimeDelta {
        self.alarm - self.time
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SleepCycleEstimator {
    cycle_length: TimeDelta,
}

impl Default for SleepCycleEstimator {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(90))
    }
}

impl SleepCycleEstimator {
    pub const MIN_SAMPLES: usize = 3;
    /// Resolution of both the phase search and the wake time search.
    pub const STEP: TimeDelta = TimeDelta::minutes(5);

    pub fn new(cycle_length: TimeDelta) -> Self {
        Self { cycle_length }
    }

    /// `samples` are `(seconds since start, motion)` pairs.
    pub fn estimate(&self, start: NaiveDateTime, samples: &[(i64, f64)]) -> Option<CycleEstimate> {
        let cycle = self.cycle_length.num_seconds();
        if cycle <= 0 {
            return None;
        }

        let (offsets, motion): (Vec<i64>, Vec<f64>) = samples
            .iter()
            .copied()
            .filter(|(_, m)| m.is_finite())
            .unzip();

        if offsets.len() < Self::MIN_SAMPLES {
            return None;
        }

        let z = standardize(&motion)?;
        let omega = 2.0 * PI / cycle as f64;
        let step = Self::STEP.num_seconds() as usize;

        let (phase_secs, fit) = (0..cycle)
            .step_by(step)
            .filter_map(|phase| {
                let curve = offsets
                    .iter()
                    .map(|&t| (omega * (t - phase) as f64).sin())
                    .collect::<Vec<_>>();

                let energy = curve.iter().map(|c| c * c).sum::<f64>();
                if energy <= f64::EPSILON {
                    return None;
                }

                let projection = curve.iter().zip(&z).map(|(c, z)| c * z).sum::<f64>();
                Some((phase, projection / (energy * z.len() as f64).sqrt()))
            })
            .fold(None, |best: Option<(i64, f64)>, candidate| match best {
                Some(best) if best.1 >= candidate.1 => Some(best),
                _ => Some(candidate),
            })?;

        debug!(
            "Cycle fit over {} samples: phase {}s, fit {:.3}",
            offsets.len(),
            phase_secs,
            fit
        );

        Some(CycleEstimate {
            start,
            cycle_length_secs: cycle,
            phase_secs,
            fit,
            samples: offsets.len(),
        })
    }

    /// Picks the lightest point of the fitted curve within `window` before
    /// the alarm, never earlier than `now` and never after the alarm.
    pub fn suggest_wake(
        &self,
        estimate: &CycleEstimate,
        alarm: NaiveDateTime,
        now: NaiveDateTime,
        window: TimeDelta,
    ) -> WakeSuggestion {
        let mut best = None;
        let mut best_value = 0_f64;

        let mut candidate = alarm;
        while alarm - candidate < window {
            let value = estimate.curve(candidate);
            if value > best_value {
                best_value = value;
                best = Some(candidate);
            }
            candidate -= Self::STEP;
        }

        let time = best.unwrap_or(alarm).max(now).min(alarm);
        WakeSuggestion { alarm, time }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const CYCLE: i64 = 90 * 60;
    const PHASE: i64 = 25 * 60;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap()
    }

    fn night() -> Vec<(i64, f64)> {
        let omega = 2.0 * PI / CYCLE as f64;
        (0..240)
            .map(|i| {
                let t = i * 120;
                (t, (omega * (t - PHASE) as f64).sin() * 0.4 + 0.1)
            })
            .collect()
    }

    fn estimate() -> CycleEstimate {
        SleepCycleEstimator::default()
            .estimate(start(), &night())
            .unwrap()
    }

    #[test]
    fn recovers_phase_of_synthetic_night() {
        let estimate = estimate();
        assert_eq!(estimate.phase(), TimeDelta::seconds(PHASE));
        assert_eq!(estimate.cycle_length(), TimeDelta::minutes(90));
        assert!(estimate.fit > 0.99, "{}", estimate.fit);
        assert_eq!(estimate.samples, 240);
    }

    #[test]
    fn flat_or_short_nights_have_no_estimate() {
        let estimator = SleepCycleEstimator::default();
        assert!(estimator.estimate(start(), &[(0, 0.1), (120, 0.2)]).is_none());
        let flat = (0..20).map(|i| (i * 120, 0.3)).collect::<Vec<_>>();
        assert!(estimator.estimate(start(), &flat).is_none());
    }

    #[test]
    fn non_finite_motion_is_ignored() {
        let mut samples = night();
        samples.push((240 * 120, f64::NAN));
        let estimate = SleepCycleEstimator::default()
            .estimate(start(), &samples)
            .unwrap();
        assert_eq!(estimate.samples, 240);
    }

    #[test]
    fn next_peak_follows_curve_maximum() {
        let estimate = estimate();
        let first_peak = start() + TimeDelta::seconds(PHASE + CYCLE / 4);
        assert_eq!(estimate.next_peak(start()), first_peak);
        assert_eq!(
            estimate.next_peak(first_peak),
            first_peak + TimeDelta::seconds(CYCLE)
        );
        assert!((estimate.curve(first_peak) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wake_moves_to_preceding_peak() {
        let estimate = estimate();
        let peak = start() + TimeDelta::seconds(PHASE + CYCLE / 4 + 5 * CYCLE);
        let alarm = peak + TimeDelta::minutes(10);

        let suggestion = SleepCycleEstimator::default().suggest_wake(
            &estimate,
            alarm,
            start(),
            TimeDelta::minutes(30),
        );
        assert_eq!(suggestion.time, peak);
        assert_eq!(suggestion.earlier_by(), TimeDelta::minutes(10));
    }

    #[test]
    fn wake_keeps_alarm_without_positive_peak() {
        let estimate = estimate();
        let trough = start() + TimeDelta::seconds(PHASE + 3 * CYCLE / 4 + 4 * CYCLE);
        let suggestion = SleepCycleEstimator::default().suggest_wake(
            &estimate,
            trough,
            start(),
            TimeDelta::minutes(5),
        );
        assert_eq!(suggestion.time, trough);
    }

    #[test]
    fn wake_is_never_in_the_past() {
        let estimate = estimate();
        let peak = start() + TimeDelta::seconds(PHASE + CYCLE / 4 + 5 * CYCLE);
        let alarm = peak + TimeDelta::minutes(10);
        let now = alarm - TimeDelta::minutes(5);

        let suggestion = SleepCycleEstimator::default().suggest_wake(
            &estimate,
            alarm,
            now,
            TimeDelta::minutes(30),
        );
        assert_eq!(suggestion.time, now);
    }
}
