use sleeptk_codec::HeartRate;

/// Heart rate waiting to be written with the next row.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeartRateSlot {
    value: HeartRate,
}

impl HeartRateSlot {
    /// Readings outside this open range are treated as noise while asleep.
    pub const MIN_BPM: u32 = 40;
    pub const MAX_BPM: u32 = 100;

    /// Records the outcome of one measurement attempt and returns whether
    /// the measurement is complete.
    pub fn record(&mut self, bpm: Option<u32>) -> bool {
        match bpm {
            None => {
                if self.value == HeartRate::Missing {
                    self.value = HeartRate::Unknown;
                }
                false
            }
            Some(bpm) if bpm > Self::MIN_BPM && bpm < Self::MAX_BPM => {
                let bpm = bpm as u8;
                self.value = match self.value {
                    HeartRate::Bpm(pending) => {
                        HeartRate::Bpm(((u16::from(pending) + u16::from(bpm)) / 2) as u8)
                    }
                    HeartRate::Missing | HeartRate::Unknown => HeartRate::Bpm(bpm),
                };
                true
            }
            Some(_) => false,
        }
    }

    pub fn peek(&self) -> HeartRate {
        self.value
    }

    pub fn take(&mut self) -> HeartRate {
        std::mem::take(&mut self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_reading_completes_measurement() {
        let mut slot = HeartRateSlot::default();
        assert!(slot.record(Some(55)));
        assert_eq!(slot.take(), HeartRate::Bpm(55));
        assert_eq!(slot.peek(), HeartRate::Missing);
    }

    #[test]
    fn second_reading_is_averaged() {
        let mut slot = HeartRateSlot::default();
        slot.record(Some(50));
        slot.record(Some(61));
        assert_eq!(slot.take(), HeartRate::Bpm(55));
    }

    #[test]
    fn failed_measurement_marks_unknown() {
        let mut slot = HeartRateSlot::default();
        assert!(!slot.record(None));
        assert_eq!(slot.peek(), HeartRate::Unknown);
    }

    #[test]
    fn failed_measurement_keeps_pending_value() {
        let mut slot = HeartRateSlot::default();
        slot.record(Some(58));
        slot.record(None);
        assert_eq!(slot.peek(), HeartRate::Bpm(58));
    }

    #[test]
    fn out_of_range_readings_are_ignored() {
        let mut slot = HeartRateSlot::default();
        assert!(!slot.record(Some(40)));
        assert!(!slot.record(Some(100)));
        assert!(!slot.record(Some(180)));
        assert_eq!(slot.peek(), HeartRate::Missing);
    }

    #[test]
    fn unknown_is_replaced_by_a_valid_reading() {
        let mut slot = HeartRateSlot::default();
        slot.record(None);
        slot.record(Some(62));
        assert_eq!(slot.take(), HeartRate::Bpm(62));
    }
}
