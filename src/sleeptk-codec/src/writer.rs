use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{CompactRow, LogFileName, LogVersion, SleepLogError, constants::COMPACT_HEADER};

/// Encodes compact rows, leaving the elapsed column empty while rows are
/// stored one period after another.
#[derive(Debug, Default)]
pub struct CompactEncoder {
    latest: Option<u32>,
}

impl CompactEncoder {
    pub fn encode(&mut self, row: &CompactRow) -> String {
        let contiguous = match self.latest {
            Some(latest) => latest.checked_add(1) == Some(row.index),
            None => row.index == 0,
        };
        self.latest = Some(row.index);

        let elapsed = if contiguous {
            String::new()
        } else {
            row.index.to_string()
        };

        format!(
            "\n{},{:.3},{},{}",
            elapsed,
            row.motion,
            row.heart_rate.encode(),
            row.meta.encode()
        )
    }
}

/// Append-only writer for a compact session log.
pub struct LogWriter {
    file: File,
    path: PathBuf,
    encoder: CompactEncoder,
}

impl LogWriter {
    pub fn create(dir: impl AsRef<Path>, name: LogFileName) -> Result<Self, SleepLogError> {
        if name.version != LogVersion::Compact {
            return Err(SleepLogError::ReadOnlyFormat(name.version));
        }

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = name.path_in(dir);
        let mut file = File::create(&path)?;
        file.write_all(COMPACT_HEADER.as_bytes())?;

        Ok(Self {
            file,
            path,
            encoder: CompactEncoder::default(),
        })
    }

    pub fn append(&mut self, row: &CompactRow) -> Result<(), SleepLogError> {
        let line = self.encoder.encode(row);
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
