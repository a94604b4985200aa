use chrono::TimeDelta;

/// Tunables of a tracking session. Defaults match the watch application.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerSettings {
    pub alarm: bool,
    pub movement: bool,
    pub heart_rate: bool,
    pub gradual_wake: bool,
    pub natural_wake: bool,
    /// Seconds between accelerometer readings.
    pub freq: u32,
    /// Seconds between stored rows, the `F` of the log name.
    pub store_freq: u32,
    pub hr_freq: TimeDelta,
    /// Heart rate measurement starts this long after tracking starts.
    pub hr_start_delay: TimeDelta,
    /// A heart rate measurement running longer than this is abandoned.
    pub hr_timeout: TimeDelta,
    /// Tracking stops at or below this battery percentage, the alarm stays.
    pub battery_threshold: u8,
    pub snooze: TimeDelta,
    pub stop_limit: u8,
    pub natural_wake_interval: TimeDelta,
    /// Percent of the natural wake interval that is randomised.
    pub natural_wake_jitter: u8,
    pub cycle_length: TimeDelta,
    pub goal_cycles: u32,
    /// How far before the alarm a lighter sleep phase may be picked.
    pub anticipation: TimeDelta,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            alarm: true,
            movement: true,
            heart_rate: true,
            gradual_wake: true,
            natural_wake: false,
            freq: 2,
            store_freq: 120,
            hr_freq: TimeDelta::seconds(300),
            hr_start_delay: TimeDelta::seconds(10),
            hr_timeout: TimeDelta::seconds(60),
            battery_threshold: 20,
            snooze: TimeDelta::seconds(180),
            stop_limit: 10,
            natural_wake_interval: TimeDelta::seconds(60),
            natural_wake_jitter: 30,
            cycle_length: TimeDelta::minutes(90),
            goal_cycles: 5,
            anticipation: TimeDelta::minutes(30),
        }
    }
}

impl TrackerSettings {
    /// Drops combinations the tracker cannot honour: wake features need an
    /// alarm and heart rate rows need movement tracking.
    pub fn normalized(mut self) -> Self {
        if !self.alarm {
            self.gradual_wake = false;
            self.natural_wake = false;
        }
        if !self.movement {
            self.heart_rate = false;
        }
        self.freq = self.freq.max(1);
        self.store_freq = self.store_freq.max(self.freq);
        self
    }

    /// Accelerometer readings folded into one stored row.
    pub fn readings_per_row(&self) -> u32 {
        (self.store_freq / self.freq.max(1)).max(1)
    }

    pub fn goal(&self) -> TimeDelta {
        self.cycle_length * self.goal_cycles as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_features_need_alarm() {
        let settings = TrackerSettings {
            alarm: false,
            natural_wake: true,
            ..Default::default()
        }
        .normalized();
        assert!(!settings.gradual_wake);
        assert!(!settings.natural_wake);
    }

    #[test]
    fn heart_rate_needs_movement() {
        let settings = TrackerSettings {
            movement: false,
            ..Default::default()
        }
        .normalized();
        assert!(!settings.heart_rate);
    }

    #[test]
    fn default_row_covers_sixty_readings() {
        assert_eq!(TrackerSettings::default().readings_per_row(), 60);
    }

    #[test]
    fn goal_is_five_cycles() {
        assert_eq!(TrackerSettings::default().goal(), TimeDelta::minutes(450));
    }
}
