use chrono::{NaiveTime, TimeDelta, Timelike as _};

pub trait FormatHM {
    fn format_hm(&self) -> String;
}

/// Durations are not wrapped at 24h, a 26h session prints as `26h00m`.
impl FormatHM for TimeDelta {
    fn format_hm(&self) -> String {
        let minutes = self.num_minutes();
        let sign = if minutes < 0 { "-" } else { "" };
        let minutes = minutes.abs();
        format!("{}{:02}h{:02}m", sign, minutes / 60, minutes % 60)
    }
}

impl FormatHM for NaiveTime {
    fn format_hm(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_keeps_hours_past_a_day() {
        assert_eq!(TimeDelta::minutes(26 * 60 + 5).format_hm(), "26h05m");
    }

    #[test]
    fn delta_negative() {
        assert_eq!(TimeDelta::minutes(-90).format_hm(), "-01h30m");
    }

    #[test]
    fn time_of_day() {
        let t = NaiveTime::from_hms_opt(7, 5, 59).unwrap();
        assert_eq!(t.format_hm(), "07:05");
    }
}
