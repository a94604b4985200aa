use chrono::{NaiveDateTime, TimeDelta};
use sleeptk_codec::{CompactRow, LogFileName, Meta};

use crate::{HeartRateSlot, MotionAccumulator, TrackerSettings};

#[derive(Clone, Debug, PartialEq)]
pub enum TrackerEvent {
    /// A row is ready to be appended to the session log.
    Row(CompactRow),
    /// The sensor returned an all-zero reading and should be reset.
    SensorReset,
    /// Battery fell to the threshold. Tracking stopped, the alarm stays.
    BatteryLow,
}

/// Sampling and compaction engine of one tracking session.
///
/// The caller feeds accelerometer readings every `freq` seconds together
/// with heart rate measurements and user interactions, and appends the
/// emitted rows to the session log.
#[derive(Debug)]
pub struct SleepTracker {
    settings: TrackerSettings,
    start: NaiveDateTime,
    tracking: bool,
    motion: MotionAccumulator,
    meta: Meta,
    heart_rate: HeartRateSlot,
    last_heart_rate: NaiveDateTime,
    measuring_since: Option<NaiveDateTime>,
}

impl SleepTracker {
    pub fn start(settings: TrackerSettings, now: NaiveDateTime, first: [f64; 3]) -> Self {
        let settings = settings.normalized();
        info!(
            "Tracking started at {} (movement: {}, heart rate: {})",
            now, settings.movement, settings.heart_rate
        );

        Self {
            last_heart_rate: now + settings.hr_start_delay - settings.hr_freq,
            tracking: true,
            start: now,
            motion: MotionAccumulator::new(first),
            meta: Meta::None,
            heart_rate: HeartRateSlot::default(),
            measuring_since: None,
            settings,
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Name of the log this session writes to, `None` without movement tracking.
    pub fn log_name(&self) -> Option<LogFileName> {
        self.settings.movement.then(|| {
            LogFileName::compact(self.start.and_utc().timestamp(), self.settings.store_freq)
        })
    }

    pub fn on_accel(
        &mut self,
        now: NaiveDateTime,
        xyz: [f64; 3],
        battery: Option<u8>,
    ) -> Vec<TrackerEvent> {
        let mut events = Vec::new();
        if !self.tracking || !self.settings.movement {
            return events;
        }

        if !self.motion.push(xyz) {
            debug!("Discarding all-zero accelerometer reading at {}", now);
            events.push(TrackerEvent::SensorReset);
        }

        if let Some(row) = self.periodic_save(now) {
            events.push(TrackerEvent::Row(row));
        }

        if battery.is_some_and(|level| level <= self.settings.battery_threshold) {
            warn!(
                "Battery below {}%, tracking stopped at {}",
                self.settings.battery_threshold, now
            );
            if let Some(row) = self.stop(now) {
                events.push(TrackerEvent::Row(row));
            }
            events.push(TrackerEvent::BatteryLow);
        }

        events
    }

    pub fn on_touch(&mut self) {
        self.meta = self.meta.touched();
    }

    pub fn on_vibration(&mut self) {
        self.meta = self.meta.vibrated();
    }

    pub fn heart_rate_due(&self, now: NaiveDateTime) -> bool {
        self.tracking
            && self.settings.heart_rate
            && self.measuring_since.is_none()
            && now - self.last_heart_rate > self.settings.hr_freq
    }

    pub fn is_measuring_heart_rate(&self) -> bool {
        self.measuring_since.is_some()
    }

    pub fn begin_heart_rate(&mut self, now: NaiveDateTime) {
        if self.tracking && self.settings.heart_rate {
            self.measuring_since = Some(now);
        }
    }

    /// Returns whether the running measurement completed.
    pub fn record_heart_rate(&mut self, now: NaiveDateTime, bpm: Option<u32>) -> bool {
        if self.measuring_since.is_none() {
            return false;
        }

        let done = self.heart_rate.record(bpm);
        if done {
            debug!("Heart rate {:?} at {}", self.heart_rate.peek(), now);
            self.last_heart_rate = now;
            self.measuring_since = None;
        }
        done
    }

    /// Ends tracking and returns the last row if enough readings are pending.
    pub fn stop(&mut self, now: NaiveDateTime) -> Option<CompactRow> {
        if !self.tracking {
            return None;
        }

        self.measuring_since = None;
        let row = self.periodic_save(now);
        self.tracking = false;
        info!("Tracking stopped at {}", now);
        row
    }

    fn periodic_save(&mut self, now: NaiveDateTime) -> Option<CompactRow> {
        if let Some(since) = self.measuring_since {
            if now - since > self.settings.hr_timeout {
                debug!("Abandoning heart rate measurement started at {}", since);
                self.measuring_since = None;
                self.last_heart_rate = now;
            }
        }

        if self.motion.count() < self.settings.readings_per_row() || self.measuring_since.is_some()
        {
            return None;
        }

        let store_freq = TimeDelta::seconds(i64::from(self.settings.store_freq));
        let index = ((now - self.start).num_seconds() / store_freq.num_seconds()).max(0) as u32;

        Some(CompactRow {
            index,
            motion: self.motion.take()?,
            heart_rate: self.heart_rate.take(),
            meta: std::mem::take(&mut self.meta),
        })
    }
}
