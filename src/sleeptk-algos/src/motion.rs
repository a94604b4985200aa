use std::f64::consts::PI;

/// Folds accelerometer readings into the single motion angle stored per row.
///
/// Each reading adds, per axis, how much the absolute acceleration dropped
/// since the previous reading. The sums are turned into an angle when the
/// row is stored.
#[derive(Clone, Debug)]
pub struct MotionAccumulator {
    previous: [f64; 3],
    buffer: [f64; 3],
    count: u32,
}

impl MotionAccumulator {
    pub fn new(first: [f64; 3]) -> Self {
        Self {
            previous: first,
            buffer: [0.0; 3],
            count: 0,
        }
    }

    /// Returns `false` for an all-zero reading, which the sensor reports
    /// when it needs a reset. Such readings are not accumulated.
    pub fn push(&mut self, xyz: [f64; 3]) -> bool {
        if xyz == [0.0; 3] {
            return false;
        }

        for ((sum, previous), current) in self.buffer.iter_mut().zip(self.previous).zip(xyz) {
            *sum += previous.abs() - current.abs();
        }
        self.previous = xyz;
        self.count += 1;
        true
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn motion(&self) -> Option<f64> {
        (self.count > 0).then(|| motion_angle(self.buffer, self.count))
    }

    /// Returns the motion angle and starts a new row.
    pub fn take(&mut self) -> Option<f64> {
        let motion = self.motion();
        self.buffer = [0.0; 3];
        self.count = 0;
        motion
    }
}

/// Angle, in radians, of the summed difference vector against the
/// horizontal plane, scaled by the number of readings it covers.
pub fn motion_angle(buffer: [f64; 3], readings: u32) -> f64 {
    let factor = 2.0 * PI / 2000.0 / f64::from(readings.max(1)) * 1000.0;
    let [x, y, z] = buffer.map(|v| v * factor);
    (z / (x.powi(2) + y.powi(2) + 0.00001).sqrt()).atan()
}

/// Arm angle, in degrees, of averaged axes as stored by legacy logs.
pub fn legacy_angle(x: f64, y: f64, z: f64) -> f64 {
    (z / (x.powi(2) + y.powi(2) + 0.0000001)).atan().to_degrees()
}
