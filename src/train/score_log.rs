use std::{
    fs::{self, File, OpenOptions},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One finished evaluation episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub episode: u64,
    pub score: u32,
}

/// Append-only CSV log of episode scores
pub struct ScoreLog {
    writer: csv::Writer<File>,
}

impl ScoreLog {
    /// Open `path` for appending, writing the header if the file is new or empty
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let fresh = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(fresh)
            .from_writer(file);
        Ok(Self { writer })
    }

    pub fn record(&mut self, episode: u64, score: u32) -> Result<()> {
        self.writer.serialize(ScoreRecord { episode, score })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Read every record from a log written by [`ScoreLog`]
    pub fn read(path: impl AsRef<Path>) -> Result<Vec<ScoreRecord>> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader.deserialize().collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
