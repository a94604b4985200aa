#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub(crate) mod settings;
pub use settings::TrackerSettings;

pub(crate) mod motion;
pub use motion::{MotionAccumulator, legacy_angle, motion_angle};

pub(crate) mod heart_rate;
pub use heart_rate::HeartRateSlot;

pub(crate) mod tracker;
pub use tracker::{SleepTracker, TrackerEvent};

pub(crate) mod cycle;
pub use cycle::{CycleEstimate, SleepCycleEstimator, WakeSuggestion};

pub(crate) mod wake;
pub use wake::{
    StopGuard, VibrationPulse, WakeEvent, WakeEventKind, WakePlan, next_natural_wake,
    resolve_alarm, suggest_alarm,
};

pub(crate) mod insight;
pub use insight::SleepInsight;

pub(crate) mod summary;
pub use summary::SleepSummary;

pub(crate) mod sleep_consistency;
pub use sleep_consistency::{SleepConsistencyAnalyzer, SleepMetrics};

pub mod helpers;
