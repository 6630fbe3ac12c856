use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or combining river volume tables.
#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("Unable to open {}", .0.display())]
    MissingInput(PathBuf),

    #[error("{} invalid folder path", .0.display())]
    InvalidFolder(PathBuf),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Malformed value {value:?} in column {column}")]
    MalformedValue { column: String, value: String },

    #[error("No MERIT-Basins length for reach {0}")]
    MissingMbLength(i64),

    #[error("No SWORD length for reach {0}")]
    MissingSwordLength(i64),

    #[error("Reach {reach} not present in reference volumes for region {region}")]
    MissingReferenceReach { region: i64, reach: i64 },

    #[error("No {kind} file for region {region} in {}", dir.display())]
    MissingRegionFile {
        kind: String,
        region: i64,
        dir: PathBuf,
    },

    #[error("Region {0} is not part of the region index")]
    UnknownRegion(i64),

    #[error("Time axis mismatch: {0}")]
    TimeAxis(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VolumeError {
    /// True for problems with the paths handed to a stage, which abort the
    /// run before any computation starts.
    pub fn is_input_path(&self) -> bool {
        matches!(self, VolumeError::MissingInput(_) | VolumeError::InvalidFolder(_))
    }

    pub(crate) fn malformed(column: &str, value: &str) -> Self {
        VolumeError::MalformedValue {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Open an input file. Only a path that does not exist is a
/// `MissingInput`; any other failure stays an IO error.
pub fn open_input(path: &Path) -> Result<File, VolumeError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => VolumeError::MissingInput(path.to_path_buf()),
        _ => VolumeError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_input(&dir.path().join("absent.csv")).unwrap_err();
        assert!(err.is_input_path());

        // a file used as a directory is not a missing input
        let file = dir.path().join("volumes.csv");
        std::fs::write(&file, "reach_id\n").unwrap();
        let err = open_input(&file.join("nested.csv")).unwrap_err();
        assert!(matches!(err, VolumeError::Io(_)));
        assert!(!err.is_input_path());
    }
}
