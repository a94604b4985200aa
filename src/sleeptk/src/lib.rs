#[macro_use]
extern crate log;

mod sleeptk;
pub use sleeptk::{ImportReport, NightAnalysis, SleepTk};

mod recorder;
pub use recorder::{RawReading, RecordingOutcome, SessionRecorder};

pub use sleeptk_db::DatabaseHandler;
