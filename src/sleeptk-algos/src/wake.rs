use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rand::Rng;

use crate::TrackerSettings;

/// Seconds before the alarm at which a short vibration is sent.
pub const GRADUAL_WAKE: [i64; 9] = [30, 60, 90, 120, 180, 240, 300, 420, 600];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WakeEventKind {
    TinyVibration,
    Ring,
    NaturalWake,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WakeEvent {
    pub time: NaiveDateTime,
    pub kind: WakeEventKind,
}

/// Everything the watch does around one alarm, ordered by time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WakePlan {
    pub alarm: NaiveDateTime,
    pub events: Vec<WakeEvent>,
}

impl WakePlan {
    pub fn new(settings: &TrackerSettings, now: NaiveDateTime, alarm: NaiveDateTime) -> Self {
        let mut events = Vec::new();

        if settings.gradual_wake {
            events.extend(
                GRADUAL_WAKE
                    .iter()
                    .map(|&before| alarm - TimeDelta::seconds(before))
                    .filter(|&time| time > now)
                    .map(|time| WakeEvent {
                        time,
                        kind: WakeEventKind::TinyVibration,
                    }),
            );
        }

        events.push(WakeEvent {
            time: alarm,
            kind: if settings.natural_wake {
                WakeEventKind::NaturalWake
            } else {
                WakeEventKind::Ring
            },
        });
        events.sort_by_key(|event| event.time);

        debug!("Wake plan for {}: {} events", alarm, events.len());
        Self { alarm, events }
    }

    pub fn main_event(&self) -> Option<&WakeEvent> {
        self.events
            .iter()
            .rev()
            .find(|event| event.kind != WakeEventKind::TinyVibration)
    }

    /// Moves the main event `snooze` after `now` and drops anything already past.
    pub fn snooze(&mut self, settings: &TrackerSettings, now: NaiveDateTime) -> NaiveDateTime {
        let kind = self
            .main_event()
            .map(|event| event.kind)
            .unwrap_or(WakeEventKind::Ring);
        let time = now + settings.snooze;

        self.events
            .retain(|event| event.kind == WakeEventKind::TinyVibration && event.time > now);
        self.events.push(WakeEvent { time, kind });
        self.events.sort_by_key(|event| event.time);

        info!("Snoozed until {}", time);
        time
    }

    /// Events in `(from, to]`.
    pub fn due(&self, from: NaiveDateTime, to: NaiveDateTime) -> impl Iterator<Item = &WakeEvent> {
        self.events
            .iter()
            .filter(move |event| event.time > from && event.time <= to)
    }
}

/// Next occurrence of `time`, tomorrow when it is not after `now`.
pub fn resolve_alarm(now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(time);
    if today <= now {
        today + TimeDelta::days(1)
    } else {
        today
    }
}

/// `now` plus the sleep goal, seconds dropped and minutes rounded up to a
/// multiple of five.
pub fn suggest_alarm(now: NaiveDateTime, settings: &TrackerSettings) -> NaiveDateTime {
    let target = now + settings.goal();
    let minute_of_day = i64::from(target.num_seconds_from_midnight() / 60);
    let rounded = (minute_of_day + 4) / 5 * 5;
    target.date().and_time(NaiveTime::default()) + TimeDelta::minutes(rounded)
}

/// Time of the next natural wake pulse: the configured interval with a
/// uniform jitter of `natural_wake_jitter` percent either way.
pub fn next_natural_wake<R: Rng + ?Sized>(
    now: NaiveDateTime,
    settings: &TrackerSettings,
    rng: &mut R,
) -> NaiveDateTime {
    let interval = settings.natural_wake_interval.num_milliseconds();
    let jitter = interval * i64::from(settings.natural_wake_jitter) / 100;
    let offset = if jitter > 0 {
        rng.random_range(-jitter..=jitter)
    } else {
        0
    };
    now + TimeDelta::milliseconds(interval + offset)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VibrationPulse {
    /// Motor duty cycle in percent.
    pub duty: u8,
    pub ms: u32,
}

impl VibrationPulse {
    pub const TINY: Self = Self { duty: 80, ms: 100 };
    pub const NATURAL: Self = Self { duty: 3, ms: 50 };

    /// Pulse `n` of the ringing alarm: gets stronger and longer, then plateaus.
    pub fn ringing(n: u32) -> Self {
        let duty = 80_u32.saturating_sub(n).max(20) as u8;
        let ms = (100 + 6 * n.min(100)).min(500);
        Self { duty, ms }
    }
}

/// Counts stop attempts so that a single half-asleep swipe does not end
/// the alarm.
#[derive(Clone, Copy, Debug)]
pub struct StopGuard {
    limit: u8,
    attempts: u8,
}

impl StopGuard {
    pub fn new(limit: u8) -> Self {
        Self {
            limit: limit.max(1),
            attempts: 0,
        }
    }

    /// Returns `true` once enough attempts were made to stop the alarm.
    pub fn attempt(&mut self) -> bool {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts >= self.limit
    }

    pub fn remaining(&self) -> u8 {
        self.limit.saturating_sub(self.attempts)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
