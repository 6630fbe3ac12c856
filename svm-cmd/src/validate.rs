//! Input path checks run before any stage starts computing.

use std::path::Path;
use svm_core::error::VolumeError;

/// The file must exist and be readable.
pub fn require_file(path: &Path) -> Result<(), VolumeError> {
    std::fs::File::open(path)
        .map(|_| ())
        .map_err(|_| VolumeError::MissingInput(path.to_path_buf()))
}

pub fn require_dir(path: &Path) -> Result<(), VolumeError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(VolumeError::InvalidFolder(path.to_path_buf()))
    }
}

/// Check every file and directory, failing on the first bad one.
pub fn require_all(files: &[&Path], dirs: &[&Path]) -> Result<(), VolumeError> {
    for file in files {
        require_file(file)?;
    }
    for dir in dirs {
        require_dir(dir)?;
    }
    Ok(())
}
