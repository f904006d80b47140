use crate::{SweepError, SweepResult};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const OUTPUT_EXTENSION: &str = "txt";

/// Picks the file the scan writes to: `.txt` is appended when missing, and an
/// existing file is never reused - `name(1).txt`, `name(2).txt`, ... are tried
/// instead.
pub fn resolve_output_path(requested: &Path) -> PathBuf {
    let mut path = requested.to_path_buf();
    if path.extension().and_then(|e| e.to_str()) != Some(OUTPUT_EXTENSION) {
        let mut name = path.clone().into_os_string();
        name.push(".");
        name.push(OUTPUT_EXTENSION);
        path = PathBuf::from(name);
        tracing::warn!("output does not end in .{OUTPUT_EXTENSION}, writing to {}", path.display());
    }

    if !path.exists() {
        return path;
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let candidate = (1u32..)
        .map(|n| path.with_file_name(format!("{stem}({n}).{OUTPUT_EXTENSION}")))
        .find(|candidate| !candidate.exists())
        .expect("unbounded range always yields a free name");
    tracing::warn!("{} exists already, writing to {}", path.display(), candidate.display());
    candidate
}

pub fn open_output(path: &Path) -> SweepResult<File> {
    OpenOptions::new().create(true).append(true).open(path).map_err(SweepError::Output)
}
