use csv::StringRecord;

use crate::constants::{LEGACY_FIELD_WIDTH, UNKNOWN_BPM};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeartRate {
    /// No measurement finished during the store period.
    #[default]
    Missing,
    /// A measurement ran but produced no usable value.
    Unknown,
    Bpm(u8),
}

impl HeartRate {
    pub fn bpm(self) -> Option<u8> {
        match self {
            Self::Bpm(bpm) => Some(bpm),
            _ => None,
        }
    }

    pub(crate) fn encode(self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Unknown => UNKNOWN_BPM.to_owned(),
            Self::Bpm(bpm) => bpm.to_string(),
        }
    }

    pub(crate) fn decode(field: &str) -> Result<Self, String> {
        match field {
            "" => Ok(Self::Missing),
            UNKNOWN_BPM => Ok(Self::Unknown),
            bpm => bpm
                .parse()
                .map(Self::Bpm)
                .map_err(|_| format!("invalid heart rate `{bpm}`")),
        }
    }
}

/// What happened on the watch during a store period.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::FromRepr,
)]
#[repr(u8)]
pub enum Meta {
    #[default]
    None = 0,
    /// Screen touched or button pressed, the wearer was awake.
    Touched = 1,
    /// Gradual or natural wake vibration.
    Vibrated = 2,
    TouchedAfterVibration = 3,
}

impl Meta {
    pub fn touched(self) -> Self {
        match self {
            Self::Vibrated | Self::TouchedAfterVibration => Self::TouchedAfterVibration,
            Self::None | Self::Touched => Self::Touched,
        }
    }

    pub fn vibrated(self) -> Self {
        match self {
            Self::Touched | Self::TouchedAfterVibration => Self::TouchedAfterVibration,
            Self::None | Self::Vibrated => Self::Vibrated,
        }
    }

    pub fn was_touched(self) -> bool {
        matches!(self, Self::Touched | Self::TouchedAfterVibration)
    }

    pub(crate) fn encode(self) -> String {
        match self {
            Self::None => String::new(),
            other => (other as u8).to_string(),
        }
    }

    pub(crate) fn decode(field: &str) -> Result<Self, String> {
        if field.is_empty() {
            return Ok(Self::None);
        }

        field
            .parse::<u8>()
            .ok()
            .and_then(Self::from_repr)
            .ok_or_else(|| format!("invalid meta `{field}`"))
    }
}

/// A stored row of a compact log. `index` counts store periods since the
/// session started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompactRow {
    pub index: u32,
    pub motion: f64,
    pub heart_rate: HeartRate,
    pub meta: Meta,
}

impl CompactRow {
    /// `previous` is the index of the row above, `None` for the first row.
    pub(crate) fn decode(record: &StringRecord, previous: Option<u32>) -> Result<Self, String> {
        let [elapsed, motion, bpm, meta] = fields::<4>(record)?;

        let index = if elapsed.is_empty() {
            previous
                .map_or(Some(0), |p| p.checked_add(1))
                .ok_or("elided elapsed count runs past the last store period")?
        } else {
            elapsed
                .parse()
                .map_err(|_| format!("invalid elapsed count `{elapsed}`"))?
        };

        Ok(Self {
            index,
            motion: motion
                .parse()
                .map_err(|_| format!("invalid motion `{motion}`"))?,
            heart_rate: HeartRate::decode(bpm)?,
            meta: Meta::decode(meta)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LegacyRow {
    /// Seconds since the session started.
    pub elapsed: u32,
    pub accel: [f64; 3],
    /// Arm angle in degrees.
    pub angle: f64,
    pub battery_mv: u32,
}

impl LegacyRow {
    pub(crate) fn decode(record: &StringRecord) -> Result<Self, String> {
        let fields = fields::<6>(record)?;
        let mut values = [0_f64; 6];
        for (value, field) in values.iter_mut().zip(fields) {
            *value = field
                .parse()
                .map_err(|_| format!("invalid number `{field}`"))?;
        }

        let [elapsed, x, y, z, angle, battery] = values;
        if elapsed < 0.0 {
            return Err(format!("negative elapsed time `{elapsed}`"));
        }

        Ok(Self {
            elapsed: elapsed.round() as u32,
            accel: [x, y, z],
            angle,
            battery_mv: battery.max(0.0).round() as u32,
        })
    }

    pub fn encode(&self) -> String {
        let [x, y, z] = self.accel;
        let fields = [
            format!("{:?}", f64::from(self.elapsed)),
            format!("{x:?}"),
            format!("{y:?}"),
            format!("{z:?}"),
            format!("{:?}", self.angle),
            format!("{:?}", f64::from(self.battery_mv)),
        ];

        let mut line = fields
            .iter()
            .map(|f| f.chars().take(LEGACY_FIELD_WIDTH).collect::<String>())
            .collect::<Vec<_>>()
            .join(",");
        line.push('\n');
        line
    }
}

fn fields<const N: usize>(record: &StringRecord) -> Result<[&str; N], String> {
    record
        .iter()
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|_| format!("expected {N} fields, found {}", record.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn heart_rate_fields() {
        assert_eq!(HeartRate::decode("").unwrap(), HeartRate::Missing);
        assert_eq!(HeartRate::decode("?").unwrap(), HeartRate::Unknown);
        assert_eq!(HeartRate::decode("58").unwrap(), HeartRate::Bpm(58));
        assert!(HeartRate::decode("fast").is_err());
        assert_eq!(HeartRate::Unknown.encode(), "?");
        assert_eq!(HeartRate::Missing.encode(), "");
    }

    #[test]
    fn meta_touch_then_vibration() {
        assert_eq!(Meta::None.touched(), Meta::Touched);
        assert_eq!(Meta::Vibrated.touched(), Meta::TouchedAfterVibration);
        assert_eq!(Meta::Touched.vibrated(), Meta::TouchedAfterVibration);
        assert_eq!(Meta::None.vibrated(), Meta::Vibrated);
        assert_eq!(Meta::TouchedAfterVibration.touched(), Meta::TouchedAfterVibration);
    }

    #[test]
    fn meta_fields() {
        assert_eq!(Meta::decode("").unwrap(), Meta::None);
        assert_eq!(Meta::decode("3").unwrap(), Meta::TouchedAfterVibration);
        assert!(Meta::decode("4").is_err());
        assert_eq!(Meta::None.encode(), "");
        assert_eq!(Meta::Vibrated.encode(), "2");
    }

    #[test]
    fn compact_row_elided_index_follows_previous() {
        let row = CompactRow::decode(&record(&["", "0.123", "", ""]), Some(4)).unwrap();
        assert_eq!(row.index, 5);
        assert_eq!(row.heart_rate, HeartRate::Missing);
        assert_eq!(row.meta, Meta::None);

        let first = CompactRow::decode(&record(&["", "-0.500", "61", "1"]), None).unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.heart_rate, HeartRate::Bpm(61));
        assert_eq!(first.meta, Meta::Touched);
    }

    #[test]
    fn compact_row_explicit_index() {
        let row = CompactRow::decode(&record(&["12", "1.002", "?", "2"]), Some(4)).unwrap();
        assert_eq!(row.index, 12);
        assert_eq!(row.heart_rate, HeartRate::Unknown);
    }

    #[test]
    fn compact_row_wrong_field_count() {
        let err = CompactRow::decode(&record(&["1", "2"]), None).unwrap_err();
        assert!(err.contains("expected 4"));
    }

    #[test]
    fn compact_row_elided_index_cannot_wrap() {
        let last = record(&["", "0.1", "", ""]);
        assert!(CompactRow::decode(&last, Some(u32::MAX)).is_err());
        assert_eq!(CompactRow::decode(&last, Some(u32::MAX - 1)).unwrap().index, u32::MAX);
    }

    #[test]
    fn legacy_row_decodes_float_fields() {
        let row = LegacyRow::decode(&record(&["300.0", "0.123456", "-0.98765", "0.0", "12.5", "3900.0"])).unwrap();
        assert_eq!(row.elapsed, 300);
        assert_eq!(row.accel, [0.123456, -0.98765, 0.0]);
        assert_eq!(row.battery_mv, 3900);
    }

    #[test]
    fn legacy_row_truncates_fields() {
        let row = LegacyRow {
            elapsed: 300,
            accel: [0.123456789, -1.0, 0.5],
            angle: 12.3456789,
            battery_mv: 3912,
        };
        assert_eq!(row.encode(), "300.0,0.123456,-1.0,0.5,12.34567,3912.0\n");
    }
}
