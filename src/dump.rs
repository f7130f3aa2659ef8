//! Dump artifacts
//!
//! Writes a chip-op payload and its FFDC records to disk.
//!
//! ## Layout
//! ```text
//! {dir}/
//!   ├── {name}.bin            (payload)
//!   ├── {name}.ffdc.0.bin     (raw FFDC record, header included)
//!   └── {name}.ffdc.1.bin
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::protocol::FfdcRecord;

/// Files written by [`save_artifacts`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpArtifacts {
    /// Absent when there was no payload
    pub payload_path: Option<PathBuf>,
    pub ffdc_paths: Vec<PathBuf>,
}

/// Save `payload` and each FFDC record under `dir`, creating it if needed
pub fn save_artifacts(
    dir: &Path,
    name: &str,
    payload: &[u8],
    ffdc: &[FfdcRecord],
) -> Result<DumpArtifacts> {
    fs::create_dir_all(dir)?;

    let payload_path = if payload.is_empty() {
        None
    } else {
        let path = dir.join(format!("{}.bin", name));
        write_file(&path, payload)?;
        Some(path)
    };

    let mut ffdc_paths = Vec::with_capacity(ffdc.len());
    for (index, record) in ffdc.iter().enumerate() {
        let path = dir.join(format!("{}.ffdc.{}.bin", name, index));
        write_file(&path, &record.raw_data)?;
        ffdc_paths.push(path);
    }

    tracing::debug!(
        "Saved {} payload bytes and {} FFDC records under {}",
        payload.len(),
        ffdc.len(),
        dir.display()
    );

    Ok(DumpArtifacts {
        payload_path,
        ffdc_paths,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}
