#[macro_use]
extern crate serde;

mod error;
pub use error::SleepLogError;

pub mod constants;

mod file_name;
pub use file_name::{LogFileName, LogVersion};

mod sleep_log;
pub use sleep_log::*;

mod writer;
pub use writer::{CompactEncoder, LogWriter};
