use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{LogFileName, LogVersion, SleepLogError, constants::COMPACT_HEADER};

mod row;
pub use row::{CompactRow, HeartRate, LegacyRow, Meta};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisAverages {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A log row placed on the wall clock.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSample {
    pub time: NaiveDateTime,
    /// Seconds since the session started.
    pub offset: i64,
    pub motion: f64,
    pub heart_rate: HeartRate,
    pub meta: Meta,
    pub accel: Option<AxisAverages>,
    pub battery_mv: Option<u32>,
}

/// `start + offset` seconds, `None` when the sum leaves the calendar.
fn wall_clock(name: &LogFileName, offset: i64) -> Option<NaiveDateTime> {
    TimeDelta::try_seconds(offset).and_then(|delta| name.start_time().checked_add_signed(delta))
}

impl ParsedSample {
    fn from_compact(name: &LogFileName, row: CompactRow) -> Result<Self, String> {
        let offset = i64::from(row.index)
            .checked_mul(i64::from(name.frequency))
            .ok_or_else(|| format!("store period {} overflows the offset", row.index))?;

        Ok(Self {
            time: wall_clock(name, offset)
                .ok_or_else(|| format!("offset {offset}s is out of range"))?,
            offset,
            motion: row.motion,
            heart_rate: row.heart_rate,
            meta: row.meta,
            accel: None,
            battery_mv: None,
        })
    }

    fn from_legacy(name: &LogFileName, row: LegacyRow) -> Result<Self, String> {
        let offset = i64::from(row.elapsed);
        let [x, y, z] = row.accel;
        Ok(Self {
            time: wall_clock(name, offset)
                .ok_or_else(|| format!("offset {offset}s is out of range"))?,
            offset,
            motion: row.angle,
            heart_rate: HeartRate::Missing,
            meta: Meta::None,
            accel: Some(AxisAverages { x, y, z }),
            battery_mv: Some(row.battery_mv),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SleepLog {
    pub name: LogFileName,
    pub samples: Vec<ParsedSample>,
}

/// Line a record starts on. The reader positions a record before any blank
/// lines it skipped on the way, so step past those.
fn record_line(lines: &[&str], record: &StringRecord) -> usize {
    let first = record.position().map_or(1, |p| p.line() as usize).max(1);
    (first..=lines.len())
        .find(|&line| !lines[line - 1].trim().is_empty())
        .unwrap_or(first)
}

/// Non-blank records of a log with the line each one starts on.
fn records(text: &str) -> impl Iterator<Item = Result<(usize, StringRecord), csv::Error>> + '_ {
    let lines = text.lines().collect::<Vec<_>>();
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
        .into_records()
        .filter(|record| {
            !record
                .as_ref()
                .is_ok_and(|r| r.len() == 1 && r[0].is_empty())
        })
        .map(move |record| record.map(|r| (record_line(&lines, &r), r)))
}

impl SleepLog {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SleepLogError> {
        let path = path.as_ref();
        let name = LogFileName::parse(&path.to_string_lossy())?;
        let text = std::fs::read_to_string(path)?;
        Self::parse(name, &text)
    }

    pub fn parse(name: LogFileName, text: &str) -> Result<Self, SleepLogError> {
        let mut records = records(text);

        let mut samples = Vec::new();
        match name.version {
            LogVersion::Compact => {
                match records.next().transpose()? {
                    None => return Ok(Self { name, samples }),
                    Some((_, header)) if header.iter().eq(COMPACT_HEADER.split(',')) => {}
                    Some((_, other)) => {
                        return Err(SleepLogError::InvalidHeader(
                            other.iter().collect::<Vec<_>>().join(","),
                        ));
                    }
                }

                let mut previous = None;
                for record in records {
                    let (line, record) = record?;
                    let sample = CompactRow::decode(&record, previous).and_then(|row| {
                        previous = Some(row.index);
                        ParsedSample::from_compact(&name, row)
                    });
                    samples.push(sample.map_err(|reason| SleepLogError::InvalidRow { line, reason })?);
                }
            }
            LogVersion::Legacy => {
                for record in records {
                    let (line, record) = record?;
                    let sample = LegacyRow::decode(&record)
                        .and_then(|row| ParsedSample::from_legacy(&name, row));
                    samples.push(sample.map_err(|reason| SleepLogError::InvalidRow { line, reason })?);
                }
            }
        }

        Ok(Self { name, samples })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.name.start_time()
    }

    pub fn end(&self) -> NaiveDateTime {
        self.samples
            .last()
            .map(|s| s.time)
            .unwrap_or_else(|| self.start())
    }

    pub fn duration(&self) -> TimeDelta {
        self.end() - self.start()
    }

    pub fn motion(&self) -> Vec<(i64, f64)> {
        self.samples.iter().map(|s| (s.offset, s.motion)).collect()
    }

    pub fn heart_rates(&self) -> Vec<u8> {
        self.samples
            .iter()
            .filter_map(|s| s.heart_rate.bpm())
            .collect()
    }
}
