//! Atomic project file writing.
//!
//! The document is encoded first, written to a temporary file next to the
//! destination, synced, and renamed over it. A failure at any point leaves
//! a previous file at the destination untouched.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cutdraft_common::error::WriteError;
use cutdraft_project_model::document::DraftContent;
use tempfile::Builder as TempFileBuilder;

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Encode `document` as pretty JSON and atomically place it at `output_path`.
pub fn write_draft(document: &DraftContent, output_path: &Path) -> Result<WriteReport, WriteError> {
    let encoded = serde_json::to_vec_pretty(document).map_err(WriteError::EncodeFailure)?;

    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if output_path.is_dir() {
        return Err(WriteError::PathNotWritable {
            path: output_path.to_path_buf(),
            source: io::Error::other("destination is a directory"),
        });
    }
    std::fs::create_dir_all(&dir).map_err(|e| classify(output_path, e))?;

    let mut temp = TempFileBuilder::new()
        .prefix(".cutdraft_")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| classify(output_path, e))?;
    temp.write_all(&encoded)
        .and_then(|_| temp.flush())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| classify(output_path, e))?;
    temp.persist(output_path)
        .map_err(|e| classify(output_path, e.error))?;

    tracing::info!(
        path = %output_path.display(),
        bytes = encoded.len(),
        "Wrote draft project"
    );
    Ok(WriteReport {
        path: output_path.to_path_buf(),
        bytes: encoded.len() as u64,
    })
}

fn classify(path: &Path, err: io::Error) -> WriteError {
    if err.kind() == io::ErrorKind::StorageFull {
        return WriteError::DiskFull {
            path: path.to_path_buf(),
        };
    }
    WriteError::PathNotWritable {
        path: path.to_path_buf(),
        source: err,
    }
}
