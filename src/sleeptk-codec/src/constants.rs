/// Directory on the watch holding one log per tracking session.
pub const LOG_DIR: &str = "logs/sleep";

pub const LOG_EXTENSION: &str = "csv";

pub const COMPACT_HEADER: &str = "Timestamp,Motion,BPM,Meta";

/// Version tag of the compact format in `T_F_V.csv`.
pub const COMPACT_VERSION_TAG: u32 = 1;

/// Seconds between stored rows in logs named only after their start time.
pub const LEGACY_FREQUENCY: u32 = 300;

/// Legacy writers cut every field to this many characters.
pub const LEGACY_FIELD_WIDTH: usize = 8;

pub const UNKNOWN_BPM: &str = "?";
