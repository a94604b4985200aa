use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, NaiveDateTime, TimeDelta};

use crate::{
    SleepLogError,
    constants::{COMPACT_VERSION_TAG, LEGACY_FREQUENCY, LOG_EXTENSION},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum LogVersion {
    /// `T.csv`: averaged axes, angle and battery voltage, offsets in seconds.
    Legacy,
    /// `T_F_1.csv`: motion angle, heart rate and meta, offsets in store periods.
    Compact,
}

impl LogVersion {
    pub fn from_tag(tag: u32) -> Result<Self, SleepLogError> {
        match tag {
            COMPACT_VERSION_TAG => Ok(Self::Compact),
            other => Err(SleepLogError::UnsupportedVersion(other)),
        }
    }

    pub fn tag(self) -> Option<u32> {
        match self {
            Self::Legacy => None,
            Self::Compact => Some(COMPACT_VERSION_TAG),
        }
    }
}

/// Name of a session log: `T_F_V.csv` where `T` is the Unix start time,
/// `F` the seconds between stored rows and `V` the format version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogFileName {
    pub start: i64,
    pub frequency: u32,
    pub version: LogVersion,
}

/// Parses a field written by `Display`: plain digits, no sign and no
/// leading zero.
fn canonical<T: FromStr>(field: &str) -> Option<T> {
    let digits = !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit());
    if !digits || (field.len() > 1 && field.starts_with('0')) {
        return None;
    }
    field.parse().ok()
}

impl LogFileName {
    pub fn compact(start: i64, frequency: u32) -> Self {
        Self {
            start,
            frequency,
            version: LogVersion::Compact,
        }
    }

    /// Accepts a bare file name or any path ending in one.
    pub fn parse(name: &str) -> Result<Self, SleepLogError> {
        let invalid = || SleepLogError::InvalidFileName(name.to_owned());

        let file = Path::new(name)
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(invalid)?;

        let stem = file
            .strip_suffix(LOG_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(invalid)?;

        let fields = stem.split('_').collect::<Vec<_>>();
        let parsed = match fields.as_slice() {
            [start] => Self {
                start: canonical(start).ok_or_else(invalid)?,
                frequency: LEGACY_FREQUENCY,
                version: LogVersion::Legacy,
            },
            [start, frequency, version] => {
                let frequency = canonical::<u32>(frequency).ok_or_else(invalid)?;
                if frequency == 0 {
                    return Err(SleepLogError::ZeroFrequency);
                }

                Self {
                    start: canonical(start).ok_or_else(invalid)?,
                    frequency,
                    version: LogVersion::from_tag(canonical(version).ok_or_else(invalid)?)?,
                }
            }
            _ => return Err(invalid()),
        };

        if DateTime::from_timestamp(parsed.start, 0).is_none() {
            return Err(invalid());
        }

        Ok(parsed)
    }

    pub fn start_time(&self) -> NaiveDateTime {
        DateTime::from_timestamp(self.start, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    }

    pub fn frequency(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.frequency))
    }

    pub fn path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(self.to_string())
    }
}

impl fmt::Display for LogFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version.tag() {
            Some(tag) => write!(
                f,
                "{}_{}_{}.{}",
                self.start, self.frequency, tag, LOG_EXTENSION
            ),
            None => write!(f, "{}.{}", self.start, LOG_EXTENSION),
        }
    }
}

impl FromStr for LogFileName {
    type Err = SleepLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
