#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use vizier::dataset::{Column, Dataset, normalize_cell};

/// Builds a dataset from (name, cells) pairs, mapping blanks and
/// placeholder tokens to the canonical empty marker.
pub fn dataset_from_columns(name: &str, columns: Vec<(&str, Vec<&str>)>) -> Dataset {
    let columns = columns
        .into_iter()
        .map(|(column_name, values)| {
            Column::new(
                column_name,
                values.iter().map(|v| normalize_cell(v)).collect(),
            )
        })
        .collect();
    Dataset::new(name, columns).expect("valid fixture dataset")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the
    /// path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
