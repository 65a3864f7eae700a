use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    memory::Transition,
};

/// Bumped whenever the layout of [`Checkpoint`] changes
pub const FORMAT_VERSION: u32 = 1;

/// Everything needed to resume training: network weights, replay memory and learning diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format_version: u32,
    /// Rendered network config; weights only load into an identical topology
    pub topology: String,
    /// Opaque weight blob produced by the Q function
    pub weights: Vec<u8>,
    /// Replay memory, oldest first
    pub memory: Vec<Transition>,
    pub push_count: u64,
    pub train_loss: Vec<f32>,
    /// Mean predicted action values recorded at each report
    pub q_history: Vec<Vec<f32>>,
}

impl Checkpoint {
    /// Write the checkpoint to `path`, replacing any previous file only once the new one is complete
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let partial = path.with_extension("partial");
        let mut writer = BufWriter::new(File::create(&partial)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&partial, path)?;
        Ok(())
    }

    /// Read a checkpoint written by [`Checkpoint::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        bincode::deserialize_from(reader).map_err(|e| Error::CorruptStateStore(e.to_string()))
    }
}
