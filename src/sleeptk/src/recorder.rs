use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{NaiveDateTime, TimeDelta};
use csv::{ReaderBuilder, StringRecord, Trim};
use sleeptk_algos::{SleepTracker, TrackerEvent, TrackerSettings};
use sleeptk_codec::LogWriter;

/// One line of a raw capture: `seconds,x,y,z[,bpm][,battery]`.
/// An empty `bpm` field is a failed heart rate reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawReading {
    pub seconds: i64,
    pub xyz: [f64; 3],
    pub bpm: Option<u32>,
    pub battery: Option<u8>,
}

impl TryFrom<&StringRecord> for RawReading {
    type Error = anyhow::Error;

    fn try_from(record: &StringRecord) -> Result<Self, Self::Error> {
        if !(4..=6).contains(&record.len()) {
            return Err(anyhow!("expected 4 to 6 fields, found {}", record.len()));
        }

        let mut xyz = [0_f64; 3];
        for (value, field) in xyz.iter_mut().zip(record.iter().skip(1)) {
            *value = field.parse().with_context(|| format!("invalid axis `{field}`"))?;
        }

        let optional = |index: usize| record.get(index).filter(|f| !f.is_empty());

        Ok(Self {
            seconds: record[0]
                .parse()
                .with_context(|| format!("invalid seconds `{}`", &record[0]))?,
            xyz,
            bpm: optional(4).map(str::parse).transpose()?,
            battery: optional(5).map(str::parse).transpose()?,
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingOutcome {
    /// `None` when movement tracking is off.
    pub path: Option<PathBuf>,
    pub rows: usize,
    pub battery_low: bool,
    pub sensor_resets: usize,
}

/// Replays a raw capture through the tracker and writes the compact log the
/// watch would have written.
pub struct SessionRecorder {
    settings: TrackerSettings,
    start: NaiveDateTime,
    dir: PathBuf,
}

impl SessionRecorder {
    pub fn new(settings: TrackerSettings, start: NaiveDateTime, dir: impl AsRef<Path>) -> Self {
        Self {
            settings,
            start,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Parses a capture, skipping blank lines, `#` comments and a header
    /// line starting with `seconds`.
    pub fn parse_capture(text: &str) -> anyhow::Result<Vec<RawReading>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());

        let lines = text.lines().collect::<Vec<_>>();
        let mut readings = Vec::new();
        for record in reader.records() {
            let record = record?;
            let blank = record.len() == 1 && record[0].is_empty();
            if blank || record.get(0).is_some_and(|f| f.starts_with("seconds")) {
                continue;
            }

            // positions point at the first comment or blank line skipped before the record
            let first = record.position().map_or(1, |p| p.line() as usize).max(1);
            let line = (first..=lines.len())
                .find(|&n| {
                    let line = lines[n - 1];
                    !line.trim().is_empty() && !line.starts_with('#')
                })
                .unwrap_or(first);
            readings.push(RawReading::try_from(&record).with_context(|| format!("line {line}"))?);
        }

        Ok(readings)
    }

    fn time_of(&self, reading: &RawReading) -> anyhow::Result<NaiveDateTime> {
        TimeDelta::try_seconds(reading.seconds)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .ok_or_else(|| anyhow!("Reading at {}s is out of range", reading.seconds))
    }

    pub fn record(&self, readings: &[RawReading]) -> anyhow::Result<RecordingOutcome> {
        let Some(first) = readings.first() else {
            return Err(anyhow!("Capture has no readings"));
        };

        let times = readings
            .iter()
            .map(|reading| self.time_of(reading))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut tracker = SleepTracker::start(self.settings.clone(), times[0], first.xyz);
        let mut writer = tracker
            .log_name()
            .map(|name| LogWriter::create(&self.dir, name))
            .transpose()?;

        let mut outcome = RecordingOutcome {
            path: writer.as_ref().map(|w| w.path().to_path_buf()),
            ..Default::default()
        };

        let mut last = times[0];
        for (reading, &now) in readings.iter().zip(&times).skip(1) {
            last = now;

            if tracker.heart_rate_due(now) {
                tracker.begin_heart_rate(now);
            }
            if tracker.is_measuring_heart_rate() {
                tracker.record_heart_rate(now, reading.bpm);
            }

            for event in tracker.on_accel(now, reading.xyz, reading.battery) {
                match event {
                    TrackerEvent::Row(row) => {
                        if let Some(writer) = writer.as_mut() {
                            writer.append(&row)?;
                            outcome.rows += 1;
                        }
                    }
                    TrackerEvent::SensorReset => outcome.sensor_resets += 1,
                    TrackerEvent::BatteryLow => outcome.battery_low = true,
                }
            }

            if !tracker.is_tracking() {
                break;
            }
        }

        if let Some(row) = tracker.stop(last) {
            if let Some(writer) = writer.as_mut() {
                writer.append(&row)?;
                outcome.rows += 1;
            }
        }

        info!(
            "Recorded {} rows from {} readings",
            outcome.rows,
            readings.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sleeptk_codec::{HeartRate, SleepLog};
    use uuid::Uuid;

    use super::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap()
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sleeptk-{}", Uuid::new_v4()))
    }

    fn capture(until: i64, bpm: Option<u32>) -> Vec<RawReading> {
        (0..=until)
            .step_by(2)
            .map(|seconds| RawReading {
                seconds,
                xyz: [0.1, 0.2, if seconds % 4 == 0 { -0.9 } else { -0.85 }],
                bpm,
                battery: Some(90),
            })
            .collect()
    }

    #[test]
    fn parse_reading_with_optional_fields() {
        let text = "12,0.1,0.2,-0.9,58,77\n14, 0.1, 0.2, -0.9, ,\n16,0.1,0.2,-0.9";
        let readings = SessionRecorder::parse_capture(text).unwrap();
        assert_eq!(readings.len(), 3);

        assert_eq!(readings[0].seconds, 12);
        assert_eq!(readings[0].bpm, Some(58));
        assert_eq!(readings[0].battery, Some(77));

        assert_eq!(readings[1].bpm, None);
        assert_eq!(readings[1].battery, None);

        assert_eq!(readings[2].xyz, [0.1, 0.2, -0.9]);
    }

    #[test]
    fn parse_capture_rejects_field_count() {
        let error = SessionRecorder::parse_capture("0,0.1,0.2").unwrap_err();
        assert!(error.to_string().contains("line 1"), "{error}");
        assert!(format!("{error:#}").contains("expected 4 to 6 fields"), "{error:#}");
    }

    #[test]
    fn parse_capture_reports_bad_line() {
        let text = "seconds,x,y,z,bpm,battery\n# night one\n0,0.1,0.2,-0.9\n\n2,0.1,oops,-0.9";
        let error = SessionRecorder::parse_capture(text).unwrap_err();
        assert!(error.to_string().contains("line 5"), "{error}");
    }

    #[test]
    fn record_writes_log_readable_on_the_cadence() {
        let dir = temp_dir();
        let recorder = SessionRecorder::new(TrackerSettings::default(), start(), &dir);

        let outcome = recorder.record(&capture(600, Some(58))).unwrap();
        assert_eq!(outcome.rows, 5);
        assert!(!outcome.battery_low);

        let path = outcome.path.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("{}_120_1.csv", start().and_utc().timestamp())
        );

        let log = SleepLog::read(&path).unwrap();
        let offsets = log.samples.iter().map(|s| s.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![120, 240, 360, 480, 600]);
        for sample in &log.samples {
            assert_eq!(sample.time, start() + TimeDelta::seconds(sample.offset));
        }
        assert_eq!(log.samples[0].heart_rate, HeartRate::Bpm(58));
        assert_eq!(log.samples[1].heart_rate, HeartRate::Missing);
        assert_eq!(log.samples[2].heart_rate, HeartRate::Bpm(58));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn failed_heart_rate_is_logged_unknown() {
        let dir = temp_dir();
        let recorder = SessionRecorder::new(TrackerSettings::default(), start(), &dir);

        let outcome = recorder.record(&capture(240, None)).unwrap();
        let log = SleepLog::read(outcome.path.unwrap()).unwrap();
        assert_eq!(log.samples[0].heart_rate, HeartRate::Unknown);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn low_battery_ends_recording() {
        let dir = temp_dir();
        let recorder = SessionRecorder::new(TrackerSettings::default(), start(), &dir);

        let mut readings = capture(600, Some(58));
        readings[100].battery = Some(15);
        let outcome = recorder.record(&readings).unwrap();
        assert!(outcome.battery_low);
        assert_eq!(outcome.rows, 1);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn no_log_without_movement() {
        let dir = temp_dir();
        let settings = TrackerSettings {
            movement: false,
            ..Default::default()
        };
        let outcome = SessionRecorder::new(settings, start(), &dir)
            .record(&capture(600, None))
            .unwrap();
        assert!(outcome.path.is_none());
        assert_eq!(outcome.rows, 0);
        assert!(!dir.exists());
    }

    #[test]
    fn out_of_range_seconds_are_an_error() {
        let dir = temp_dir();
        let text = "0,0.1,0.2,-0.9\n9223372036854775807,0.1,0.2,-0.9";
        let readings = SessionRecorder::parse_capture(text).unwrap();

        let error = SessionRecorder::new(TrackerSettings::default(), start(), &dir)
            .record(&readings)
            .unwrap_err();
        assert!(error.to_string().contains("9223372036854775807"), "{error}");
        assert!(!dir.exists());

        let readings = [RawReading {
            seconds: 8_300_000_000_000,
            xyz: [0.1, 0.2, -0.9],
            bpm: None,
            battery: None,
        }];
        let recorder = SessionRecorder::new(TrackerSettings::default(), start(), &dir);
        assert!(recorder.record(&readings).is_err());
        assert!(!dir.exists());
    }

    #[test]
    fn empty_capture_is_an_error() {
        let recorder = SessionRecorder::new(TrackerSettings::default(), start(), temp_dir());
        assert!(recorder.record(&[]).is_err());
    }
}
