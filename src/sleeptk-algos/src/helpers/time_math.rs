use chrono::{NaiveTime, TimeDelta, Timelike as _};

const SECONDS_PER_DAY: i64 = 86_400;

/// Seconds from midnight with the day pivoting at noon, so that 23:00 and
/// 01:00 are two hours apart rather than twenty-two.
pub fn pivot_seconds(time: &NaiveTime) -> i64 {
    let seconds = i64::from(time.num_seconds_from_midnight());
    if time.hour() > 12 {
        seconds - SECONDS_PER_DAY
    } else {
        seconds
    }
}

fn time_of_day(seconds: i64) -> NaiveTime {
    let seconds = seconds.rem_euclid(SECONDS_PER_DAY) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default()
}

pub fn mean_time(times: &[NaiveTime]) -> NaiveTime {
    if times.is_empty() {
        return NaiveTime::default();
    }

    let total = times.iter().map(pivot_seconds).sum::<i64>();
    time_of_day(total / times.len() as i64)
}

pub fn std_time(times: &[NaiveTime], mean: &NaiveTime) -> TimeDelta {
    if times.is_empty() {
        return TimeDelta::zero();
    }

    let mean = pivot_seconds(mean);
    let variance = times
        .iter()
        .map(|t| (pivot_seconds(t) - mean).pow(2))
        .sum::<i64>()
        / times.len() as i64;

    TimeDelta::seconds(variance.isqrt())
}

pub fn mean_deltas(durations: &[TimeDelta]) -> TimeDelta {
    if durations.is_empty() {
        TimeDelta::zero()
    } else {
        durations.iter().sum::<TimeDelta>() / durations.len() as i32
    }
}

pub fn std_dev_delta(durations: &[TimeDelta], mean: TimeDelta) -> TimeDelta {
    if durations.is_empty() {
        return TimeDelta::zero();
    }

    let variance = durations
        .iter()
        .map(|d| (*d - mean).num_seconds().pow(2))
        .sum::<i64>()
        / durations.len() as i64;

    TimeDelta::seconds(variance.isqrt())
}

/// Share of a day covered by one standard deviation of a clock time.
pub fn day_fraction_percent(spread: TimeDelta) -> f64 {
    spread.num_seconds() as f64 / SECONDS_PER_DAY as f64 * 100.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0_f64
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0_f64;
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Centres on zero and scales to unit variance, `None` for a flat series.
///
/// The float mean of identical values may be off by one ulp, so a spread
/// below `1e-9` of the magnitude counts as flat.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let mean = mean(values);
    let std = std_dev(values, mean);
    if !std.is_finite() || std <= 1e-9 * mean.abs().max(1.0) {
        return None;
    }

    Some(values.iter().map(|v| (v - mean) / std).collect())
}

pub fn round_float(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
